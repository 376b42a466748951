//! simple-kv CLI
//!
//! Command-line interface for inspecting and editing a store.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use simple_kv::{Config, DbmStore, KeyValueStore};
use tracing_subscriber::{fmt, EnvFilter};

/// simple-kv CLI
#[derive(Parser, Debug)]
#[command(name = "simple-kv")]
#[command(about = "CLI for the simple-kv key-value store")]
#[command(version)]
struct Args {
    /// Database path (the file is <DB>.db)
    #[arg(short, long, default_value = "./simple_kv")]
    db: PathBuf,

    /// Fail instead of creating a missing database
    #[arg(long)]
    no_create: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List all keys
    Keys,

    /// Rewrite the database file without dead records
    Compact,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .path(&args.db)
        .create_if_missing(!args.no_create)
        .build();

    let mut store = match DbmStore::with_config(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", args.db.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Commands::Get { key } => match store.get(key.as_str()) {
            Some(value) => {
                println!("{}", String::from_utf8_lossy(&value));
                Ok(())
            }
            None => {
                eprintln!("(nil)");
                return ExitCode::FAILURE;
            }
        },
        Commands::Set { key, value } => store.try_put(&key, value.as_bytes()),
        Commands::Del { key } => store.try_delete(&key),
        Commands::Keys => {
            for key in &store {
                println!("{key}");
            }
            Ok(())
        }
        Commands::Compact => {
            let reclaimable = store.reclaimable_bytes();
            store.compact().map(|()| {
                tracing::info!("Reclaimed {} bytes", reclaimable);
            })
        }
    };

    if let Err(e) = result.and_then(|()| store.close()) {
        tracing::error!("{}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
