//! Autosave workers: periodic snapshots of unsaved content to a scratch directory
//!
//! One worker per document (the whole clone group of panes shares it). The UI
//! thread hands the worker a fresh snapshot after every edit; the worker wakes
//! up every interval and writes the snapshot if it changed. Workers only ever
//! write to disk; results and failures travel back over the async bridge.

use crate::model::ids::AutosaveId;
use crate::services::async_bridge::AsyncMessage;
use crate::services::fs::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Default)]
struct Snapshot {
    text: String,
    dirty: bool,
}

struct Worker {
    snapshot: Arc<Mutex<Snapshot>>,
    target: PathBuf,
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

pub struct AutosaveService {
    enabled: bool,
    interval: Duration,
    scratch_dir: PathBuf,
    filesystem: Arc<dyn FileSystem>,
    sender: mpsc::Sender<AsyncMessage>,
    workers: HashMap<AutosaveId, Worker>,
    next_id: usize,
}

impl AutosaveService {
    pub fn new(
        enabled: bool,
        interval: Duration,
        scratch_dir: PathBuf,
        filesystem: Arc<dyn FileSystem>,
        sender: mpsc::Sender<AsyncMessage>,
    ) -> Self {
        Self {
            enabled,
            interval,
            scratch_dir,
            filesystem,
            sender,
            workers: HashMap::new(),
            next_id: 1,
        }
    }

    /// Start tracking a document; spawns a worker thread when enabled
    pub fn register(&mut self, name: &str, text: &str) -> AutosaveId {
        let id = AutosaveId(self.next_id);
        self.next_id += 1;

        let target = self
            .scratch_dir
            .join(format!("{}-{}.autosave", id.0, sanitize(name)));
        let snapshot = Arc::new(Mutex::new(Snapshot {
            text: text.to_string(),
            dirty: false,
        }));

        let (stop, handle) = if self.enabled {
            let (stop_tx, stop_rx) = mpsc::channel::<()>();
            let worker_snapshot = Arc::clone(&snapshot);
            let worker_target = target.clone();
            let filesystem = Arc::clone(&self.filesystem);
            let sender = self.sender.clone();
            let interval = self.interval;
            let spawned = thread::Builder::new()
                .name(format!("autosave-{}", id.0))
                .spawn(move || loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let result = write_if_dirty(
                                filesystem.as_ref(),
                                &worker_snapshot,
                                &worker_target,
                            );
                            let message = match result {
                                Ok(false) => continue,
                                Ok(true) => AsyncMessage::AutosaveWritten {
                                    id,
                                    path: worker_target.clone(),
                                },
                                Err(e) => AsyncMessage::AutosaveFailed {
                                    id,
                                    path: worker_target.clone(),
                                    error: e.to_string(),
                                },
                            };
                            if sender.send(message).is_err() {
                                break;
                            }
                        }
                        // Stop request, or the service was dropped
                        _ => break,
                    }
                });
            match spawned {
                Ok(handle) => (Some(stop_tx), Some(handle)),
                Err(e) => {
                    tracing::warn!("Failed to spawn autosave worker {}: {}", id, e);
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        tracing::debug!("autosave: registered {} for '{}'", id, name);
        self.workers.insert(
            id,
            Worker {
                snapshot,
                target,
                stop,
                handle,
            },
        );
        id
    }

    /// Hand the worker a new snapshot of the document content
    pub fn update(&self, id: AutosaveId, text: &str) {
        if let Some(worker) = self.workers.get(&id) {
            if let Ok(mut snapshot) = worker.snapshot.lock() {
                snapshot.text = text.to_string();
                snapshot.dirty = true;
            }
        }
    }

    /// Forget the pending snapshot and delete the scratch file, e.g. after a save
    pub fn clear(&self, id: AutosaveId) {
        if let Some(worker) = self.workers.get(&id) {
            if let Ok(mut snapshot) = worker.snapshot.lock() {
                snapshot.dirty = false;
            }
            let _ = self.filesystem.remove_file(&worker.target);
        }
    }

    /// Write the snapshot now, on the calling thread
    pub fn flush(&self, id: AutosaveId) -> io::Result<bool> {
        match self.workers.get(&id) {
            Some(worker) => {
                write_if_dirty(self.filesystem.as_ref(), &worker.snapshot, &worker.target)
            }
            None => Ok(false),
        }
    }

    /// Stop the worker and delete its scratch file
    pub fn unregister(&mut self, id: AutosaveId) -> bool {
        let Some(mut worker) = self.workers.remove(&id) else {
            return false;
        };
        stop_worker(&mut worker);
        let _ = self.filesystem.remove_file(&worker.target);
        tracing::debug!("autosave: unregistered {}", id);
        true
    }

    pub fn scratch_path(&self, id: AutosaveId) -> Option<&Path> {
        self.workers.get(&id).map(|w| w.target.as_path())
    }

    pub fn is_registered(&self, id: AutosaveId) -> bool {
        self.workers.contains_key(&id)
    }

    pub fn is_running(&self, id: AutosaveId) -> bool {
        self.workers.get(&id).is_some_and(|w| w.handle.is_some())
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl Drop for AutosaveService {
    fn drop(&mut self) {
        for worker in self.workers.values_mut() {
            stop_worker(worker);
        }
    }
}

fn stop_worker(worker: &mut Worker) {
    if let Some(stop) = worker.stop.take() {
        let _ = stop.send(());
    }
    if let Some(handle) = worker.handle.take() {
        if handle.join().is_err() {
            tracing::error!("autosave worker for {:?} panicked", worker.target);
        }
    }
}

/// Write the snapshot if it changed since the last write
fn write_if_dirty(
    filesystem: &dyn FileSystem,
    snapshot: &Mutex<Snapshot>,
    target: &Path,
) -> io::Result<bool> {
    let text = {
        let mut guard = snapshot
            .lock()
            .map_err(|_| io::Error::other("autosave snapshot lock poisoned"))?;
        if !guard.dirty {
            return Ok(false);
        }
        guard.dirty = false;
        guard.text.clone()
    };

    let result = target
        .parent()
        .map(|dir| filesystem.create_dir_all(dir))
        .unwrap_or(Ok(()))
        .and_then(|()| filesystem.write(target, &text));

    if let Err(e) = result {
        // Leave the snapshot dirty so the next tick retries
        if let Ok(mut guard) = snapshot.lock() {
            guard.dirty = true;
        }
        return Err(e);
    }
    Ok(true)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | ' ' => '_',
            c => c,
        })
        .collect::<String>()
        .trim_start_matches('_')
        .to_string()
}
