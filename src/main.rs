//! nearest-config
//!
//! Command-line front end for nearest config file discovery.

use anyhow::Result;
use clap::Parser;
use nearest_config::cli::{self, Cli, Command};
use nearest_config::logging::{self, LogTarget};
use nearest_config::{ConfigError, ConfigResolver, LocatorSettings, OsFileSystem};
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

async fn run(cli: &Cli) -> Result<bool> {
    let settings = LocatorSettings::discover(cli.settings.as_deref())?;
    debug!(?settings, "Resolved locator settings");
    let resolver = ConfigResolver::new(Arc::new(OsFileSystem), settings);

    match &cli.command {
        Command::Resolve(args) => cli::resolve::run(args, &resolver).await,
        Command::Load(args) => cli::load::run(args, &resolver).await,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    match run(&cli).await {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::from(1)),
        Err(err) => match err.downcast_ref::<ConfigError>() {
            Some(config_err) => {
                let report = json!({
                    "code": config_err.code(),
                    "message": config_err.to_string(),
                    "path": config_err.path(),
                });
                eprintln!("{}", report);
                Ok(ExitCode::from(2))
            }
            None => Err(err),
        },
    }
}
