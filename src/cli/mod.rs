use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod guest;
pub mod init;
pub mod migrate;
pub mod serve;

use crate::core::AppConfig;
use guest::GuestAction;

#[derive(Subcommand)]
enum Command {
    /// Create the database, apply the schema and seed the model catalog
    Init {
        #[arg(long, action, default_value = "false")]
        db: bool,
    },
    /// Migrate the db schema
    Migrate {
        #[arg(long, action, default_value = "false")]
        db: bool,
    },
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Act as a guest against the local guest storage
    Guest {
        #[command(subcommand)]
        action: GuestAction,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    let config = AppConfig::default();

    // Handle each sub command
    match args.command {
        Some(Command::Init { db }) => {
            init::run(db, &config.db_path).await?;
        }
        Some(Command::Migrate { db }) => {
            migrate::run(db, &config.db_path).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port, config).await?;
        }
        Some(Command::Guest { action }) => {
            guest::run(action, &config)?;
        }
        None => {}
    }

    Ok(())
}
