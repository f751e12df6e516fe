//! Load subcommand: print the nearest config as JSON.

use anyhow::Result;
use clap::Args;

use super::SearchArgs;
use crate::loader::LoadOptions;
use crate::resolver::ConfigResolver;

/// Arguments for the load subcommand
#[derive(Args, Debug)]
pub struct LoadArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Print the file text instead of parsing it
    #[arg(long)]
    pub raw: bool,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

impl LoadArgs {
    pub fn options(&self) -> LoadOptions {
        LoadOptions { parse: !self.raw }
    }
}

/// Load and print the config. Returns `false` when no config was found.
pub async fn run(args: &LoadArgs, resolver: &ConfigResolver) -> Result<bool> {
    let root = args.search.root()?;
    let output = resolver
        .load_config(&args.search.file, args.search.names.as_slice(), &args.options(), &root)
        .await?;

    let Some(output) = output else {
        println!("null");
        return Ok(false);
    };

    let json = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", json);
    Ok(true)
}
