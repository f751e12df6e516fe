//! CLI command definitions for nearest-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod load;
pub mod resolve;

use clap::{Args, Parser, Subcommand};
use load::LoadArgs;
use resolve::ResolveArgs;
use std::path::PathBuf;

/// Find and load the nearest config file for a source file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a YAML settings file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the path of the nearest config file
    Resolve(ResolveArgs),

    /// Load the nearest config file and print it as JSON
    Load(LoadArgs),
}

/// Arguments shared by every search.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Source file to start the search from
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Comma-separated config file names, in order of preference
    #[arg(short, long, value_name = "LIST", value_delimiter = ',', required = true)]
    pub names: Vec<String>,

    /// Project root (only bounds the search when root enforcement is on)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

impl SearchArgs {
    /// The start file as an absolute path, so the search can climb past the
    /// working directory.
    pub fn file(&self) -> std::io::Result<PathBuf> {
        std::path::absolute(&self.file)
    }

    /// The root directory made absolute, defaulting to the working directory.
    pub fn root(&self) -> std::io::Result<PathBuf> {
        match &self.root {
            Some(root) => std::path::absolute(root),
            None => std::env::current_dir(),
        }
    }
}
