//! Nearest config file discovery and loading.
//!
//! Walks upward from a source file to the closest directory holding one of a
//! set of config file names, then parses that file by format. Concurrent
//! searches for the same directory and names share a single scan.
//!
//! ```no_run
//! use nearest_config::{ConfigResolver, LoadOptions, LocatorSettings, OsFileSystem};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn demo() -> nearest_config::ConfigResult<()> {
//! let resolver = ConfigResolver::new(Arc::new(OsFileSystem), LocatorSettings::default());
//! let _output = resolver
//!     .load_config(
//!         Path::new("src/index.js"),
//!         &[".toolrc", "tool.toml"],
//!         &LoadOptions::default(),
//!         Path::new("."),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod error;
pub mod format;
pub mod fs;
pub mod loader;
pub mod locator;
pub mod logging;
pub mod module;
pub mod resolver;
pub mod settings;

pub use error::{ConfigError, ConfigResult, ErrorCode, ModuleError, ParseError};
pub use format::{ConfigFormat, parser_for};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use loader::{ConfigContent, ConfigFile, ConfigOutput, LoadOptions};
pub use locator::Located;
pub use module::{ModuleLoader, ModuleRegistry};
pub use resolver::{ConfigResolver, load_config, resolve_config};
pub use settings::LocatorSettings;
