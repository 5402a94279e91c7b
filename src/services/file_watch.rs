//! Polling file watcher
//!
//! Keeps the last known modification time of every watched path. A background
//! thread rescans at the configured interval and posts
//! [`AsyncMessage::FileAltered`] / [`AsyncMessage::FileRemoved`] to the UI
//! thread; it never touches documents itself. [`FileWatcher::check_now`] runs
//! the same scan on the calling thread.
//!
//! Every entry carries a generation that moves on when we rearm or retarget
//! it. Notifications record the generation they were scanned at, so one
//! queued before our own write can be recognised as stale with
//! [`FileWatcher::is_current`].

use crate::model::ids::WatchId;
use crate::services::async_bridge::AsyncMessage;
use crate::services::fs::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
struct WatchEntry {
    path: PathBuf,
    last_seen: Option<SystemTime>,
    existed: bool,
    generation: u64,
}

type Entries = Arc<Mutex<HashMap<WatchId, WatchEntry>>>;

pub struct FileWatcher {
    enabled: bool,
    interval: Duration,
    filesystem: Arc<dyn FileSystem>,
    sender: mpsc::Sender<AsyncMessage>,
    entries: Entries,
    next_id: usize,
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FileWatcher {
    pub fn new(
        enabled: bool,
        interval: Duration,
        filesystem: Arc<dyn FileSystem>,
        sender: mpsc::Sender<AsyncMessage>,
    ) -> Self {
        Self {
            enabled,
            interval,
            filesystem,
            sender,
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: 1,
            stop: None,
            handle: None,
        }
    }

    /// Start watching `path`, remembering its current state
    pub fn watch(&mut self, path: &Path) -> WatchId {
        let id = WatchId(self.next_id);
        self.next_id += 1;
        let entry = self.observe(path, 0);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(id, entry);
        }
        tracing::debug!("file watch: {} -> {}", id, path.display());
        self.ensure_thread();
        id
    }

    pub fn unwatch(&mut self, id: WatchId) -> bool {
        self.entries
            .lock()
            .map(|mut entries| entries.remove(&id).is_some())
            .unwrap_or(false)
    }

    /// Re-read the file's state after we wrote it ourselves
    pub fn rearm(&self, id: WatchId) {
        let path = match self.entries.lock() {
            Ok(entries) => entries.get(&id).map(|e| e.path.clone()),
            Err(_) => None,
        };
        if let Some(path) = path {
            self.retarget(id, &path);
        }
    }

    /// Point an existing watch at a different path (after "save as")
    pub fn retarget(&self, id: WatchId, path: &Path) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if let Some(slot) = entries.get_mut(&id) {
            *slot = self.observe(path, slot.generation + 1);
        }
    }

    /// Whether a notification scanned at `generation` still describes the
    /// watch, i.e. we have not written the file since
    pub fn is_current(&self, id: WatchId, generation: u64) -> bool {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(&id).map(|e| e.generation == generation))
            .unwrap_or(false)
    }

    pub fn watched_path(&self, id: WatchId) -> Option<PathBuf> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(&id).map(|e| e.path.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scan every watched path now and post notifications for changes
    pub fn check_now(&self) -> usize {
        scan(self.filesystem.as_ref(), &self.entries, &self.sender)
    }

    fn observe(&self, path: &Path, generation: u64) -> WatchEntry {
        let (last_seen, existed) = match self.filesystem.modified(path) {
            Ok(mtime) => (mtime, true),
            Err(_) => (None, false),
        };
        WatchEntry {
            path: path.to_path_buf(),
            last_seen,
            existed,
            generation,
        }
    }

    fn ensure_thread(&mut self) {
        if !self.enabled || self.handle.is_some() {
            return;
        }
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let entries = Arc::clone(&self.entries);
        let filesystem = Arc::clone(&self.filesystem);
        let sender = self.sender.clone();
        let interval = self.interval;
        let spawned = thread::Builder::new()
            .name("file-watch".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        scan(filesystem.as_ref(), &entries, &sender);
                    }
                    _ => break,
                }
            });
        match spawned {
            Ok(handle) => {
                self.stop = Some(stop_tx);
                self.handle = Some(handle);
            }
            Err(e) => tracing::warn!("Failed to spawn file watcher: {}", e),
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn scan(
    filesystem: &dyn FileSystem,
    entries: &Mutex<HashMap<WatchId, WatchEntry>>,
    sender: &mpsc::Sender<AsyncMessage>,
) -> usize {
    let Ok(mut entries) = entries.lock() else {
        return 0;
    };
    let mut posted = 0;
    for (&watch, entry) in entries.iter_mut() {
        let message = match filesystem.modified(&entry.path) {
            Ok(mtime) => {
                let changed = !entry.existed || mtime != entry.last_seen;
                entry.existed = true;
                entry.last_seen = mtime;
                changed.then(|| AsyncMessage::FileAltered {
                    watch,
                    generation: entry.generation,
                    path: entry.path.clone(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let was_there = entry.existed;
                entry.existed = false;
                entry.last_seen = None;
                was_there.then(|| AsyncMessage::FileRemoved {
                    watch,
                    generation: entry.generation,
                    path: entry.path.clone(),
                })
            }
            Err(e) => {
                tracing::trace!("file watch: cannot stat {}: {}", entry.path.display(), e);
                None
            }
        };
        if let Some(message) = message {
            tracing::debug!("file watch: {:?}", message);
            if sender.send(message).is_ok() {
                posted += 1;
            }
        }
    }
    posted
}
