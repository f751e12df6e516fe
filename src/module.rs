//! Loading of code configs.
//!
//! Executing a config file needs an interpreter, which this crate does not
//! embed. Embedders that want code configs install a [`ModuleLoader`] on the
//! resolver; without one, code configs fail with
//! [`ConfigError::NoModuleLoader`](crate::ConfigError::NoModuleLoader).

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ModuleError;

/// Evaluates a code config and returns its exported value.
///
/// The returned value may be shared with other callers (a module cache, for
/// instance). The resolver deep-copies it before handing it out.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load_module(&self, path: &Path) -> Result<Arc<Value>, ModuleError>;
}

/// A loader backed by a table of already-evaluated modules.
///
/// Behaves like a module cache: the same `Arc` is returned for every load of
/// a path, and unknown paths report [`ModuleError::NotFound`].
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Mutex<HashMap<PathBuf, Arc<Value>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the exported value of the module at `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, value: Value) {
        self.modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), Arc::new(value));
    }

    /// The shared value for `path`, if registered.
    pub fn get(&self, path: &Path) -> Option<Arc<Value>> {
        self.modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }
}

#[async_trait]
impl ModuleLoader for ModuleRegistry {
    async fn load_module(&self, path: &Path) -> Result<Arc<Value>, ModuleError> {
        self.get(path)
            .ok_or_else(|| ModuleError::NotFound(path.to_path_buf()))
    }
}
