//! Policy administration commands

use crate::client::ServiceClient;
use crate::errors::{CliError, Result as CliResult};
use async_trait::async_trait;
use clap::Subcommand;
use colored::Colorize;
use serde::Deserialize;

use super::Command;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyResponse {
    client_id: String,
    rate_limit: i32,
    refill_interval: i32,
}

#[derive(Debug, Subcommand)]
pub enum PolicyCommands {
    /// Insert a new client policy
    Create {
        #[arg(short = 'c', long)]
        client_id: String,
        /// Bucket capacity, granted once per interval
        #[arg(short = 'r', long)]
        rate_limit: i32,
        /// Refill interval in seconds
        #[arg(short = 'i', long)]
        refill_interval: i32,
    },
    /// Delete one client policy
    Delete {
        #[arg(short = 'c', long)]
        client_id: String,
    },
    /// List client policies
    List {
        #[arg(long, default_value_t = 100)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Create pseudo-random client policies
    Generate {
        /// How many rows to attempt
        #[arg(short = 'n', long)]
        count: u32,
    },
    /// Update a client policy in place
    Update {
        #[arg(short = 'c', long)]
        client_id: String,
        #[arg(short = 'r', long)]
        rate_limit: i32,
        #[arg(short = 'i', long)]
        refill_interval: i32,
    },
    /// Delete every client policy
    DeleteAll {
        /// Confirm the bulk delete
        #[arg(long)]
        yes: bool,
    },
}

#[async_trait]
impl Command for PolicyCommands {
    async fn execute(&self, client: &ServiceClient) -> CliResult<()> {
        match self {
            PolicyCommands::Create {
                client_id,
                rate_limit,
                refill_interval,
            } => {
                let response: MessageResponse = client
                    .admin(
                        "/insert",
                        &serde_json::json!({
                            "clientId": client_id,
                            "rateLimit": rate_limit,
                            "refillInterval": refill_interval,
                        }),
                    )
                    .await?;
                println!("{}", response.message);
                Ok(())
            }
            PolicyCommands::Delete { client_id } => {
                let response: MessageResponse = client
                    .admin("/delete", &serde_json::json!({ "clientId": client_id }))
                    .await?;
                println!("{}", response.message);
                Ok(())
            }
            PolicyCommands::List { limit, offset } => {
                let policies: Vec<PolicyResponse> = client
                    .admin(
                        "/list-clients",
                        &serde_json::json!({ "limit": limit, "offset": offset }),
                    )
                    .await?;
                if policies.is_empty() {
                    println!("{}", "no policies found".yellow());
                }
                for policy in policies {
                    println!(
                        "{}  rate_limit={}  refill_interval={}s",
                        policy.client_id.bold(),
                        policy.rate_limit,
                        policy.refill_interval
                    );
                }
                Ok(())
            }
            PolicyCommands::Generate { count } => {
                let response: MessageResponse = client
                    .admin(
                        "/generate-random-clients",
                        &serde_json::json!({ "numRecords": count }),
                    )
                    .await?;
                println!("{}", response.message);
                Ok(())
            }
            PolicyCommands::Update {
                client_id,
                rate_limit,
                refill_interval,
            } => {
                let updated: PolicyResponse = client
                    .admin(
                        "/update-client-parameters",
                        &serde_json::json!({
                            "clientId": client_id,
                            "newRateLimit": rate_limit,
                            "newRefillInterval": refill_interval,
                        }),
                    )
                    .await?;
                println!(
                    "Updated {}: rate_limit={}, refill_interval={}s",
                    updated.client_id.bold(),
                    updated.rate_limit,
                    updated.refill_interval
                );
                Ok(())
            }
            PolicyCommands::DeleteAll { .. } => {
                let response: MessageResponse = client
                    .admin("/delete-all-clients", &serde_json::json!({}))
                    .await?;
                println!("{}", response.message);
                Ok(())
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PolicyCommands::Create { .. } => "policy-create",
            PolicyCommands::Delete { .. } => "policy-delete",
            PolicyCommands::List { .. } => "policy-list",
            PolicyCommands::Generate { .. } => "policy-generate",
            PolicyCommands::Update { .. } => "policy-update",
            PolicyCommands::DeleteAll { .. } => "policy-delete-all",
        }
    }

    fn validate(&self) -> CliResult<()> {
        match self {
            PolicyCommands::Create {
                client_id,
                rate_limit,
                refill_interval,
            }
            | PolicyCommands::Update {
                client_id,
                rate_limit,
                refill_interval,
            } => {
                if client_id.is_empty() {
                    return Err(CliError::Input("client_id must not be empty".to_string()));
                }
                if *rate_limit < 0 {
                    return Err(CliError::Input(format!(
                        "rate_limit must not be negative, got {rate_limit}"
                    )));
                }
                if *refill_interval <= 0 {
                    return Err(CliError::Input(format!(
                        "refill_interval must be positive, got {refill_interval}"
                    )));
                }
                Ok(())
            }
            PolicyCommands::Delete { client_id } => {
                if client_id.is_empty() {
                    return Err(CliError::Input("client_id must not be empty".to_string()));
                }
                Ok(())
            }
            PolicyCommands::Generate { count } => {
                if *count == 0 {
                    return Err(CliError::Input("count must be positive".to_string()));
                }
                Ok(())
            }
            PolicyCommands::DeleteAll { yes } => {
                if !yes {
                    return Err(CliError::Input(
                        "refusing to delete all policies without --yes".to_string(),
                    ));
                }
                Ok(())
            }
            PolicyCommands::List { .. } => Ok(()),
        }
    }
}
