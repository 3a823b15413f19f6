//! Command-line interface definition

use crate::commands::Commands;
use clap::Parser;

/// Terminal front-end for the tokengate rate limiter.
///
/// Drives the three HTTP surfaces: admission checks, policy
/// administration, and bucket cache refresh. Service locations default
/// to the local-development ports and can be pointed anywhere with the
/// global URL options.
#[derive(Debug, Parser)]
#[command(
    name = "tokengate-cli",
    version,
    about = "Terminal front-end for the tokengate rate limiter"
)]
pub struct Cli {
    /// Admission service base URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:50051")]
    pub admission_url: String,

    /// Admin service base URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:8082")]
    pub admin_url: String,

    /// Refresh service base URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:8081")]
    pub refresh_url: String,

    #[command(subcommand)]
    pub command: Commands,
}
