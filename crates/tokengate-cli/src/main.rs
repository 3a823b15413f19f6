pub mod cli;
pub mod client;
pub mod commands;
pub mod errors;

use crate::cli::Cli;
use crate::client::{Endpoints, ServiceClient};
use crate::commands::Command;
use clap::Parser;
use colored::Colorize;
use std::process::exit;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli.command.validate() {
        eprintln!("{} {err}", "✗".red());
        exit(err.exit_code());
    }

    let client = match ServiceClient::new(Endpoints {
        admission: cli.admission_url.clone(),
        admin: cli.admin_url.clone(),
        refresh: cli.refresh_url.clone(),
    }) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{} {err}", "✗".red());
            exit(err.exit_code());
        }
    };

    if let Err(err) = cli.command.execute(&client).await {
        eprintln!("{} {} failed: {err}", "✗".red(), cli.command.name());
        exit(err.exit_code());
    }
}
