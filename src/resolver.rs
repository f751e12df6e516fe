//! Config resolver sessions.
//!
//! A [`ConfigResolver`] owns the state shared by the searches of one build
//! session: the in-flight search map and the advisory exists cache. Clones
//! share that state, so a resolver can be handed to many tasks at once.
//! Dropping the last clone tears the state down.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ConfigResult;
use crate::fs::FileSystem;
use crate::loader::{ConfigOutput, LoadOptions};
use crate::locator::Locator;
use crate::module::ModuleLoader;
use crate::settings::LocatorSettings;

/// Resolves and loads the nearest config file for source files.
#[derive(Clone)]
pub struct ConfigResolver {
    pub(crate) locator: Arc<Locator>,
    pub(crate) modules: Option<Arc<dyn ModuleLoader>>,
}

impl ConfigResolver {
    /// Create a session over `fs` with the given traversal settings.
    pub fn new(fs: Arc<dyn FileSystem>, settings: LocatorSettings) -> Self {
        Self {
            locator: Arc::new(Locator::new(fs, settings)),
            modules: None,
        }
    }

    /// Install the loader used for code configs.
    pub fn with_module_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.modules = Some(loader);
        self
    }

    pub fn settings(&self) -> &LocatorSettings {
        self.locator.settings()
    }

    /// Find the config file nearest to `filepath`.
    ///
    /// Checks `filenames` in order in the directory of `filepath`, then in each
    /// ancestor. Concurrent calls for the same directory and filenames share a
    /// single scan. Returns `None` when the search reaches the filesystem root
    /// or a dependency directory without a match.
    pub async fn resolve_config<S: AsRef<str>>(
        &self,
        filepath: &Path,
        filenames: &[S],
        root: &Path,
    ) -> Option<PathBuf> {
        let filenames = owned_names(filenames);
        self.locator.locate(filepath, &filenames, root).await
    }

    /// Number of directory levels currently being scanned.
    pub fn in_flight_count(&self) -> usize {
        self.locator.in_flight().len()
    }

    /// Number of paths remembered as existing.
    pub fn exists_cache_len(&self) -> usize {
        self.locator.exists_cache().len()
    }

    /// Forget every path remembered as existing.
    pub fn clear_exists_cache(&self) {
        self.locator.exists_cache().clear();
    }
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("settings", self.settings())
            .field("in_flight", &self.in_flight_count())
            .field("module_loader", &self.modules.is_some())
            .finish()
    }
}

pub(crate) fn owned_names<S: AsRef<str>>(filenames: &[S]) -> Vec<String> {
    filenames.iter().map(|name| name.as_ref().to_string()).collect()
}

/// One-shot [`ConfigResolver::resolve_config`] with default settings.
///
/// Deduplication only spans this call; long-lived callers should keep a
/// [`ConfigResolver`] for the whole session instead.
pub async fn resolve_config<S: AsRef<str>>(
    fs: Arc<dyn FileSystem>,
    filepath: &Path,
    filenames: &[S],
    root: &Path,
) -> Option<PathBuf> {
    ConfigResolver::new(fs, LocatorSettings::default())
        .resolve_config(filepath, filenames, root)
        .await
}

/// One-shot [`ConfigResolver::load_config`] with default settings and no
/// module loader.
pub async fn load_config<S: AsRef<str>>(
    fs: Arc<dyn FileSystem>,
    filepath: &Path,
    filenames: &[S],
    options: &LoadOptions,
    root: &Path,
) -> ConfigResult<Option<ConfigOutput>> {
    ConfigResolver::new(fs, LocatorSettings::default())
        .load_config(filepath, filenames, options, root)
        .await
}
