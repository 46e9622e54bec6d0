use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tally::cli;
use tally::config::{EditorPolicy, Environment, SecretsPaths};
use tally::secrets::SecretsStore;

#[derive(Parser)]
#[command(
    name = "tally-secrets",
    version,
    about = "Secrets lifecycle tool for the Tally personal-finance aggregator",
    long_about = "Manages per-environment encrypted secrets: identity keypairs, \
                  encrypted configuration bundles, and ad hoc file encryption. \
                  Encrypted files are safe to commit; identity files are not."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an identity keypair for an environment
    Keygen {
        /// Target environment (development, test, production)
        environment: String,
    },

    /// Create an environment's secrets bundle interactively
    New {
        /// Target environment (development, test, production)
        environment: String,
    },

    /// Edit an environment's existing secrets bundle
    Edit {
        /// Target environment (development, test, production)
        environment: String,
    },

    /// Print the public key for every configured environment
    ShowKey,

    /// Encrypt a file with the default (development) identity
    Encrypt {
        /// Path to the plaintext file
        file: PathBuf,
    },

    /// Decrypt a file with the default (development) identity
    Decrypt {
        /// Path to the encrypted file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let store = SecretsStore::new(SecretsPaths::new()?);
    let editor = EditorPolicy::from_env();

    match args.command {
        Commands::Keygen { environment } => {
            cli::keygen(&store, environment.parse::<Environment>()?)?;
        }
        Commands::New { environment } => {
            cli::new_bundle(&store, &editor, environment.parse::<Environment>()?)?;
        }
        Commands::Edit { environment } => {
            cli::edit_bundle(&store, &editor, environment.parse::<Environment>()?)?;
        }
        Commands::ShowKey => {
            cli::show_keys(&store)?;
        }
        Commands::Encrypt { file } => {
            cli::encrypt_path(&store, &file)?;
        }
        Commands::Decrypt { file } => {
            cli::decrypt_path(&store, &file)?;
        }
    }

    Ok(())
}
