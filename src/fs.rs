//! Filesystem collaborators.
//!
//! The resolver only needs three operations from a filesystem: an existence
//! check, real-path resolution and UTF-8 reads. [`OsFileSystem`] backs them
//! with `tokio::fs`; [`MemoryFileSystem`] keeps a tree in memory for tests
//! and for embedders with virtual project layouts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Async filesystem abstraction consumed by the resolver.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Whether `path` exists. Errors count as "does not exist".
    async fn exists(&self, path: &Path) -> bool;

    /// Canonical absolute form of `path` with symlinks resolved.
    async fn realpath(&self, path: &Path) -> io::Result<PathBuf>;

    /// Read `path` as UTF-8 text.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem, via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

#[async_trait]
impl FileSystem for OsFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
        tokio::fs::canonicalize(path).await
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<PathBuf, String>,
    symlinks: HashMap<PathBuf, PathBuf>,
    exists_log: Vec<PathBuf>,
}

/// In-memory filesystem.
///
/// Directories exist implicitly as ancestors of files. Every operation yields
/// to the scheduler once before answering, so concurrent resolutions interleave
/// the way they would against real I/O.
#[derive(Debug)]
pub struct MemoryFileSystem {
    cwd: PathBuf,
    state: Mutex<MemoryState>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    /// Empty tree with `/` as the working directory.
    pub fn new() -> Self {
        Self {
            cwd: PathBuf::from("/"),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Set the directory relative paths are resolved against.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace a file.
    pub fn write_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = self.absolute(path.as_ref());
        self.state().files.insert(path, content.into());
    }

    /// Remove a file. Returns `true` if it existed.
    pub fn remove_file(&self, path: impl AsRef<Path>) -> bool {
        let path = self.absolute(path.as_ref());
        self.state().files.remove(&path).is_some()
    }

    /// Make `link` an alias of the canonical path `target`.
    pub fn symlink(&self, target: impl Into<PathBuf>, link: impl AsRef<Path>) {
        let link = self.absolute(link.as_ref());
        self.state().symlinks.insert(link, target.into());
    }

    /// Every path passed to [`FileSystem::exists`], in call order.
    pub fn exists_calls(&self) -> Vec<PathBuf> {
        self.state().exists_log.clone()
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Lexically normalize `path`, following symlinks component by component.
    fn canonicalize(&self, state: &MemoryState, path: &Path) -> PathBuf {
        let mut out = PathBuf::new();
        for component in self.absolute(path).components() {
            match component {
                Component::Prefix(_) | Component::RootDir => out.push(component),
                Component::CurDir => {}
                Component::ParentDir => {
                    out.pop();
                }
                Component::Normal(name) => {
                    out.push(name);
                    if let Some(target) = state.symlinks.get(&out) {
                        out = target.clone();
                    }
                }
            }
        }
        out
    }

    fn entry_exists(state: &MemoryState, path: &Path) -> bool {
        state.files.contains_key(path)
            || state.symlinks.contains_key(path)
            || state.files.keys().any(|file| file.starts_with(path))
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.exists_log.push(path.to_path_buf());
        let resolved = self.canonicalize(&state, path);
        Self::entry_exists(&state, &resolved)
    }

    async fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
        tokio::task::yield_now().await;
        let state = self.state();
        let resolved = self.canonicalize(&state, path);
        if Self::entry_exists(&state, &resolved) {
            Ok(resolved)
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file or directory: {}", path.display()),
            ))
        }
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::task::yield_now().await;
        let state = self.state();
        let resolved = self.canonicalize(&state, path);
        state.files.get(&resolved).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}
