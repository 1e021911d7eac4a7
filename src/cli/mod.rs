//! Command-line interface
//!
//! Provides CLI commands for the gold tracker.

pub mod db;
pub mod fetch;
pub mod serve;

use clap::{Parser, Subcommand};

/// Gold Tracker CLI
#[derive(Parser)]
#[command(name = "gold-tracker")]
#[command(about = "Scrapes and serves Kim Ngan Phuc precious-metals prices")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the price service
    Serve(serve::ServeArgs),
    /// Run one fetch cycle and exit
    Fetch(fetch::FetchArgs),
    /// Database operations
    #[command(subcommand)]
    Db(db::DbCommands),
}
