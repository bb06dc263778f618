//! CLI command implementations

use clap::{Parser, Subcommand};

pub mod error;
pub mod run;
pub mod sprite;

pub use error::CliError;
pub use run::RunArgs;
pub use sprite::SpriteArgs;

/// Battle Stats ETL CLI
#[derive(Parser, Debug)]
#[command(name = "battle-stats-etl")]
#[command(about = "Extract battles and roster from the API and derive win-rate tables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full extraction and write every table
    Run(RunArgs),

    /// Print the sprite URL for a participant
    Sprite(SpriteArgs),
}
