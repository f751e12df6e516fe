//! Resolve subcommand: print the nearest config path.

use anyhow::Result;
use clap::Args;

use super::SearchArgs;
use crate::resolver::ConfigResolver;

/// Arguments for the resolve subcommand
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub search: SearchArgs,
}

/// Run the search. Returns `false` when no config was found.
pub async fn run(args: &ResolveArgs, resolver: &ConfigResolver) -> Result<bool> {
    let file = args.search.file()?;
    let root = args.search.root()?;
    let found = resolver
        .resolve_config(&file, args.search.names.as_slice(), &root)
        .await;

    match found {
        Some(path) => {
            println!("{}", path.display());
            Ok(true)
        }
        None => Ok(false),
    }
}
