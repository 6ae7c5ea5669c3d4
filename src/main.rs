//! ALFA Faces Vault - CLI
//!
//! Command-line interface for database encryption operations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use alfa_faces_vault::{storage, CodecConfig, KeyStore, RecordCodec, VaultResult};

#[derive(Parser)]
#[command(name = "alfa-faces")]
#[command(author = "Karen Tonoyan")]
#[command(version = alfa_faces_vault::VERSION)]
#[command(about = "ALFA Faces Vault - Encrypted face-embedding database")]
struct Cli {
    /// Name key file
    #[arg(long, default_value = "./name.keys")]
    name_keys: PathBuf,

    /// Embedding key file
    #[arg(long, default_value = "./embed.keys")]
    embed_keys: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a plaintext database (resets both key files)
    Encrypt {
        /// Plaintext database JSON
        input: PathBuf,

        /// Encrypted output JSON
        output: PathBuf,

        /// Leave names unencrypted
        #[arg(long)]
        skip_names: bool,

        /// Leave embeddings unencrypted
        #[arg(long)]
        skip_embeddings: bool,

        /// Store no nonces: output can never be decrypted
        #[arg(long)]
        write_only: bool,
    },

    /// Decrypt an encrypted database
    Decrypt {
        /// Encrypted database JSON
        input: PathBuf,

        /// Plaintext output JSON
        output: PathBuf,

        /// Names were stored unencrypted
        #[arg(long)]
        skip_names: bool,

        /// Embeddings were stored unencrypted
        #[arg(long)]
        skip_embeddings: bool,
    },

    /// Show a key file summary
    Inspect {
        /// Key file path
        key_file: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> VaultResult<()> {
    match cli.command {
        Commands::Encrypt {
            input,
            output,
            skip_names,
            skip_embeddings,
            write_only,
        } => {
            println!("🔐 Encrypting database: {}", input.display());
            let db = storage::load_plain(&input)?;

            let codec = RecordCodec::new(CodecConfig {
                skip_names,
                skip_embeddings,
                decryptable: !write_only,
                name_key_path: cli.name_keys.clone(),
                embed_key_path: cli.embed_keys.clone(),
            });
            let encrypted = codec.encrypt_data(&db)?;
            storage::save_encrypted(&output, &encrypted)?;

            println!(
                "✅ {} records ({} vectors) -> {}",
                db.len(),
                db.vector_count(),
                output.display()
            );
            if write_only {
                println!("⚠️ Write-only mode: no nonces stored, this output cannot be decrypted");
            } else {
                println!(
                    "🔑 Keys: {} / {}",
                    cli.name_keys.display(),
                    cli.embed_keys.display()
                );
            }
        }

        Commands::Decrypt {
            input,
            output,
            skip_names,
            skip_embeddings,
        } => {
            println!("🔓 Decrypting database: {}", input.display());
            let encrypted = storage::load_encrypted(&input)?;

            let codec = RecordCodec::new(CodecConfig {
                skip_names,
                skip_embeddings,
                decryptable: true,
                name_key_path: cli.name_keys.clone(),
                embed_key_path: cli.embed_keys.clone(),
            });
            let db = codec.decrypt_data(&encrypted)?;
            storage::save_plain(&output, &db)?;

            println!("✅ {} records -> {}", db.len(), output.display());
        }

        Commands::Inspect { key_file } => {
            let store = KeyStore::new(&key_file);
            let key = store.key()?;
            let nonces = store.nonce_count()?;

            println!("📊 Key file: {}", key_file.display());
            println!("{:-<40}", "");
            println!("Key fingerprint:  {}…", hex::encode(&key[..4]));
            println!("Nonces stored:    {}", nonces);
        }
    }

    Ok(())
}
