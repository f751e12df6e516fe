//! Upward config file search with in-flight deduplication.
//!
//! A search walks from the directory of a start file toward the filesystem
//! root and returns the first candidate filename that exists, checking
//! candidates in caller order at each level. Every directory level visited is
//! a separate `SearchKey`. A chain claims the keys it scans; a chain that
//! reaches a key already claimed by another one stops scanning and adopts that
//! chain's outcome, so searches fanning out from a common ancestor share the
//! work above the point where they meet.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::fs::FileSystem;
use crate::settings::LocatorSettings;

/// Settled outcome of a search: the config path, or `None` if nothing was
/// found inside the traversal boundary.
pub type Located = Option<PathBuf>;

type Slot = Option<Located>;

/// Identity of a search at one directory level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SearchKey {
    dir: PathBuf,
    filenames: Vec<String>,
    boundary: Option<PathBuf>,
}

impl SearchKey {
    pub(crate) fn new(dir: &Path, filenames: &[String], boundary: Option<&Path>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            filenames: filenames.to_vec(),
            boundary: boundary.map(Path::to_path_buf),
        }
    }
}

enum Claim {
    Owner(watch::Sender<Slot>),
    Joined(watch::Receiver<Slot>),
}

/// Map of searches currently being scanned.
///
/// Entries live only while their owning chain runs. Settled entries are
/// removed, so a later search for the same key scans again.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    entries: Mutex<HashMap<SearchKey, watch::Receiver<Slot>>>,
}

impl InFlight {
    fn entries(&self) -> MutexGuard<'_, HashMap<SearchKey, watch::Receiver<Slot>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim(&self, key: &SearchKey) -> Claim {
        let mut entries = self.entries();
        if let Some(rx) = entries.get(key) {
            return Claim::Joined(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        entries.insert(key.clone(), rx);
        Claim::Owner(tx)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }
}

/// Keys claimed by one running chain.
///
/// Settling publishes the outcome to every joiner and retires the keys.
/// Dropping an unsettled chain (its future was cancelled) retires the keys
/// without an outcome; joiners then see a closed channel and rescan.
struct Chain<'a> {
    in_flight: &'a InFlight,
    claimed: Vec<(SearchKey, watch::Sender<Slot>)>,
}

impl<'a> Chain<'a> {
    fn new(in_flight: &'a InFlight) -> Self {
        Self {
            in_flight,
            claimed: Vec::new(),
        }
    }

    fn settle(mut self, outcome: &Located) {
        let mut entries = self.in_flight.entries();
        for (key, tx) in self.claimed.drain(..) {
            tx.send_replace(Some(outcome.clone()));
            entries.remove(&key);
        }
    }
}

impl Drop for Chain<'_> {
    fn drop(&mut self) {
        if self.claimed.is_empty() {
            return;
        }
        let mut entries = self.in_flight.entries();
        for (key, _) in self.claimed.drain(..) {
            entries.remove(&key);
        }
    }
}

/// Advisory record of paths last seen to exist.
///
/// Never consulted during a walk. Entries are dropped when a check or a read
/// finds the file gone.
#[derive(Debug, Default)]
pub(crate) struct ExistsCache {
    paths: Mutex<HashSet<PathBuf>>,
}

impl ExistsCache {
    fn paths(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.paths().contains(path)
    }

    pub(crate) fn insert(&self, path: &Path) {
        self.paths().insert(path.to_path_buf());
    }

    pub(crate) fn invalidate(&self, path: &Path) -> bool {
        self.paths().remove(path)
    }

    pub(crate) fn clear(&self) {
        self.paths().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.paths().len()
    }
}

/// Walks ancestor directories looking for config files.
pub(crate) struct Locator {
    fs: Arc<dyn FileSystem>,
    settings: LocatorSettings,
    in_flight: InFlight,
    exists_cache: ExistsCache,
}

impl Locator {
    pub(crate) fn new(fs: Arc<dyn FileSystem>, settings: LocatorSettings) -> Self {
        Self {
            fs,
            settings,
            in_flight: InFlight::default(),
            exists_cache: ExistsCache::default(),
        }
    }

    pub(crate) fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub(crate) fn settings(&self) -> &LocatorSettings {
        &self.settings
    }

    pub(crate) fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    pub(crate) fn exists_cache(&self) -> &ExistsCache {
        &self.exists_cache
    }

    /// Find the nearest config file for `start_file`.
    ///
    /// `root` only bounds the search when `enforce_root` is set; the root
    /// directory itself is searched, its ancestors are not.
    pub(crate) async fn locate(&self, start_file: &Path, filenames: &[String], root: &Path) -> Located {
        let boundary = self.settings.enforce_root.then_some(root);
        let mut chain = Chain::new(&self.in_flight);
        let mut next = start_file.parent();

        let outcome = 'search: loop {
            let Some(dir) = next else {
                break None;
            };
            if self.is_traversal_boundary(dir) {
                trace!(dir = %dir.display(), "Reached traversal boundary");
                break None;
            }

            let key = SearchKey::new(dir, filenames, boundary);
            match self.in_flight.claim(&key) {
                Claim::Joined(mut rx) => {
                    debug!(dir = %dir.display(), "Joining in-flight config search");
                    let settled = rx
                        .wait_for(|slot| slot.is_some())
                        .await
                        .map(|slot| (*slot).clone().flatten());
                    match settled {
                        Ok(located) => break located,
                        Err(_) => {
                            debug!(dir = %dir.display(), "In-flight search abandoned, rescanning");
                            continue;
                        }
                    }
                }
                Claim::Owner(tx) => chain.claimed.push((key, tx)),
            }

            for name in filenames {
                let candidate = dir.join(name);
                if self.exists(&candidate).await {
                    debug!(path = %candidate.display(), "Found config file");
                    break 'search Some(candidate);
                }
            }

            if boundary == Some(dir) {
                trace!(dir = %dir.display(), "Reached project root");
                break None;
            }
            next = dir.parent();
        };

        chain.settle(&outcome);
        outcome
    }

    /// Filesystem root, or a dependency directory.
    fn is_traversal_boundary(&self, dir: &Path) -> bool {
        dir.parent().is_none()
            || dir
                .file_name()
                .is_some_and(|name| name == self.settings.dependency_dir.as_str())
    }

    /// Ask the filesystem, then record the answer. The cache is never taken
    /// as proof of existence, so a deleted config drops out of later walks.
    async fn exists(&self, path: &Path) -> bool {
        let found = self.fs.exists(path).await;
        if found {
            self.exists_cache.insert(path);
        } else {
            self.exists_cache.invalidate(path);
        }
        found
    }
}
