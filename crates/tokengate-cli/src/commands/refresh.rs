//! Bucket refresh commands

use crate::client::ServiceClient;
use crate::errors::{CliError, Result as CliResult};
use async_trait::async_trait;
use clap::Subcommand;
use serde::Deserialize;

use super::Command;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Subcommand)]
pub enum RefreshCommands {
    /// Rewrite one client's bucket from current policy
    One {
        #[arg(short = 'c', long)]
        client_id: String,
    },
    /// Flush every bucket
    All,
}

#[async_trait]
impl Command for RefreshCommands {
    async fn execute(&self, client: &ServiceClient) -> CliResult<()> {
        match self {
            RefreshCommands::One { client_id } => {
                let response: MessageResponse = client
                    .refresh(
                        "/refresh/id",
                        Some(&serde_json::json!({ "client_id": client_id })),
                    )
                    .await?;
                println!("{}", response.message);
                Ok(())
            }
            RefreshCommands::All => {
                let response: MessageResponse = client
                    .refresh::<serde_json::Value, _>("/refresh/all", None)
                    .await?;
                println!("{}", response.message);
                Ok(())
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RefreshCommands::One { .. } => "refresh-one",
            RefreshCommands::All => "refresh-all",
        }
    }

    fn validate(&self) -> CliResult<()> {
        if let RefreshCommands::One { client_id } = self {
            if client_id.is_empty() {
                return Err(CliError::Input("client_id must not be empty".to_string()));
            }
        }
        Ok(())
    }
}
