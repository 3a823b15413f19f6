//! Admission check commands

use crate::client::ServiceClient;
use crate::errors::{CliError, Result as CliResult};
use async_trait::async_trait;
use clap::Subcommand;
use colored::Colorize;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::Command;

#[derive(Debug, Deserialize)]
struct CheckResponse {
    allowed: bool,
    remaining_tokens: i64,
}

#[derive(Debug, Subcommand)]
pub enum CheckCommands {
    /// Check one admission
    Once {
        /// Client to check
        #[arg(short = 'c', long)]
        client_id: String,
        /// Tokens the request consumes
        #[arg(short = 't', long, default_value_t = 1)]
        tokens: i64,
    },
    /// Read client ids from stdin, one admission per line
    Stream {
        /// Tokens each request consumes
        #[arg(short = 't', long, default_value_t = 1)]
        tokens: i64,
    },
}

#[async_trait]
impl Command for CheckCommands {
    async fn execute(&self, client: &ServiceClient) -> CliResult<()> {
        match self {
            CheckCommands::Once { client_id, tokens } => {
                check_one(client, client_id, *tokens).await
            }
            CheckCommands::Stream { tokens } => stream_checks(client, *tokens).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CheckCommands::Once { .. } => "check-once",
            CheckCommands::Stream { .. } => "check-stream",
        }
    }

    fn validate(&self) -> CliResult<()> {
        let tokens = match self {
            CheckCommands::Once { tokens, .. } => *tokens,
            CheckCommands::Stream { tokens } => *tokens,
        };
        if tokens < 0 {
            return Err(CliError::Input(format!(
                "tokens must not be negative, got {tokens}"
            )));
        }
        if let CheckCommands::Once { client_id, .. } = self {
            if client_id.is_empty() {
                return Err(CliError::Input("client_id must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

async fn check_one(client: &ServiceClient, client_id: &str, tokens: i64) -> CliResult<()> {
    let response: CheckResponse = client
        .admission(
            "/check",
            &serde_json::json!({
                "client_id": client_id,
                "tokens_required": tokens,
            }),
        )
        .await?;
    print_admission(client_id, &response);
    Ok(())
}

/// The streaming mode of the original terminal client: one client id
/// per stdin line, an admission check for each.
async fn stream_checks(client: &ServiceClient, tokens: i64) -> CliResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let client_id = line.trim();
        if client_id.is_empty() {
            continue;
        }
        match check_one(client, client_id, tokens).await {
            Ok(()) => {}
            Err(CliError::Server { status, message }) => {
                eprintln!("{} {client_id}: {message} ({status})", "error:".red());
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn print_admission(client_id: &str, response: &CheckResponse) {
    if response.allowed {
        println!(
            "{} {client_id}: {} tokens remaining",
            "allowed".green().bold(),
            response.remaining_tokens
        );
    } else {
        println!(
            "{} {client_id}: {} tokens remaining",
            "rejected".red().bold(),
            response.remaining_tokens
        );
    }
}
