//! Async Bridge: hand-off from background workers to the UI thread
//!
//! Autosave workers and the file watcher run on their own threads. They never
//! touch panes, documents, or split trees; they only post [`AsyncMessage`]s
//! here, and the UI thread drains them in
//! [`WindowServer::process_async_messages`](crate::app::WindowServer::process_async_messages).

use crate::model::ids::{AutosaveId, WatchId};
use std::path::PathBuf;
use std::sync::mpsc;

/// Messages sent from background workers to the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncMessage {
    /// A watched file's modification time changed behind our back
    ///
    /// `generation` is the watch entry's generation at scan time; the entry
    /// moves on whenever we write the file ourselves.
    FileAltered {
        watch: WatchId,
        generation: u64,
        path: PathBuf,
    },

    /// A watched file disappeared from disk
    FileRemoved {
        watch: WatchId,
        generation: u64,
        path: PathBuf,
    },

    /// An autosave worker wrote its snapshot
    AutosaveWritten { id: AutosaveId, path: PathBuf },

    /// An autosave worker failed to write its snapshot
    AutosaveFailed {
        id: AutosaveId,
        path: PathBuf,
        error: String,
    },
}

/// Bridge between background threads and the synchronous UI loop
pub struct AsyncBridge {
    sender: mpsc::Sender<AsyncMessage>,
    // Receiver wrapped in Arc<Mutex<>> so the bridge can be shared
    receiver: std::sync::Arc<std::sync::Mutex<mpsc::Receiver<AsyncMessage>>>,
}

impl AsyncBridge {
    /// Create a new bridge with an unbounded channel
    ///
    /// Unbounded is fine here: watchers post at most one message per file per
    /// poll interval, and the UI thread drains the queue on every tick.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: std::sync::Arc::new(std::sync::Mutex::new(receiver)),
        }
    }

    /// Get a cloneable sender for a background worker
    pub fn sender(&self) -> mpsc::Sender<AsyncMessage> {
        self.sender.clone()
    }

    /// Receive every pending message without blocking
    pub fn try_recv_all(&self) -> Vec<AsyncMessage> {
        let mut messages = Vec::new();
        if let Ok(receiver) = self.receiver.lock() {
            while let Ok(msg) = receiver.try_recv() {
                messages.push(msg);
            }
        }
        messages
    }

    /// Block for up to `timeout` waiting for one message
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<AsyncMessage> {
        self.receiver
            .lock()
            .ok()
            .and_then(|receiver| receiver.recv_timeout(timeout).ok())
    }
}

impl Default for AsyncBridge {
    fn default() -> Self {
        Self::new()
    }
}
