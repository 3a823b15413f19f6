//! CLI commands organized by the surface they drive

use crate::client::ServiceClient;
use crate::errors::Result as CliResult;
use async_trait::async_trait;
use clap::Subcommand;

pub mod check;
pub mod policy;
pub mod refresh;

/// Trait that all CLI commands implement
#[async_trait]
pub trait Command {
    /// Execute the command
    async fn execute(&self, client: &ServiceClient) -> CliResult<()>;

    /// Command name for error reporting
    fn name(&self) -> &'static str;

    /// Validate command arguments before execution
    fn validate(&self) -> CliResult<()> {
        Ok(())
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Admission checks against the limiter
    #[command(subcommand)]
    Check(check::CheckCommands),
    /// Policy administration
    #[command(subcommand)]
    Policy(policy::PolicyCommands),
    /// Bucket cache refresh
    #[command(subcommand)]
    Refresh(refresh::RefreshCommands),
}

#[async_trait]
impl Command for Commands {
    async fn execute(&self, client: &ServiceClient) -> CliResult<()> {
        match self {
            Commands::Check(cmd) => cmd.execute(client).await,
            Commands::Policy(cmd) => cmd.execute(client).await,
            Commands::Refresh(cmd) => cmd.execute(client).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Commands::Check(cmd) => cmd.name(),
            Commands::Policy(cmd) => cmd.name(),
            Commands::Refresh(cmd) => cmd.name(),
        }
    }

    fn validate(&self) -> CliResult<()> {
        match self {
            Commands::Check(cmd) => cmd.validate(),
            Commands::Policy(cmd) => cmd.validate(),
            Commands::Refresh(cmd) => cmd.validate(),
        }
    }
}
