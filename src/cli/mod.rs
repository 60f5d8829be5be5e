//! CLI module for Contabil API
//!
//! - `serve`: run the HTTP API
//! - `migrate`: apply storage migrations and exit
//! - `client`: provision and inspect client accounts

pub mod client;
pub mod migrate;
pub mod serve;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// Contabil API - metered expense categorization for client companies
#[derive(Parser)]
#[command(name = "contabil-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,

    /// Apply pending storage migrations
    Migrate,

    /// Manage client accounts
    #[command(subcommand)]
    Client(client::ClientCommand),
}

/// `.env`, then the layered configuration. A malformed value aborts the
/// command instead of falling back to defaults.
pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();
    AppConfig::load().context("Failed to load configuration")
}
