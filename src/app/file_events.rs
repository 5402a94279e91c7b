//! Handling notifications posted by background workers
//!
//! Workers never touch editor state. They post to the async bridge and the
//! UI thread drains it here, asking the user what to do about files that
//! changed underneath an open document.

use super::{ServerError, WindowServer};
use crate::model::document::DiskState;
use crate::model::ids::{AutosaveId, DocumentId, WatchId};
use crate::services::async_bridge::AsyncMessage;
use crate::services::dialogs::{FileChange, FileChangeChoice};
use std::path::Path;

impl WindowServer {
    /// Drain pending worker notifications; returns how many were handled
    pub fn process_async_messages(&mut self) -> usize {
        let messages = self.bridge.try_recv_all();
        let count = messages.len();
        for message in messages {
            match message {
                AsyncMessage::FileAltered {
                    watch,
                    generation,
                    path,
                } => self.handle_file_change(watch, generation, &path, FileChange::Altered),
                AsyncMessage::FileRemoved {
                    watch,
                    generation,
                    path,
                } => self.handle_file_change(watch, generation, &path, FileChange::Removed),
                AsyncMessage::AutosaveWritten { id, path } => {
                    tracing::debug!("autosave {} wrote {}", id, path.display());
                }
                AsyncMessage::AutosaveFailed { id, path, error } => {
                    tracing::warn!("autosave {} to {} failed: {}", id, path.display(), error);
                    let message = format!("autosave to {} failed: {}", path.display(), error);
                    self.dialogs.report(&message);
                }
            }
        }
        count
    }

    /// Poll watched files on this thread, then handle what was found
    pub fn check_files_now(&mut self) -> usize {
        self.file_watcher.check_now();
        self.process_async_messages()
    }

    /// Write every pending autosave snapshot now; returns how many were written
    pub fn flush_autosaves(&mut self) -> usize {
        let ids: Vec<AutosaveId> = self
            .documents
            .ids()
            .into_iter()
            .flat_map(|doc| self.graph.sorted_associations_of::<AutosaveId, _>(doc))
            .collect();
        let mut written = 0;
        for id in ids {
            match self.autosave.flush(id) {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("autosave {} failed: {}", id, e);
                    self.dialogs.report(&format!("autosave failed: {}", e));
                }
            }
        }
        written
    }

    fn handle_file_change(
        &mut self,
        watch: WatchId,
        generation: u64,
        path: &Path,
        change: FileChange,
    ) {
        // Queued before we saved, reloaded or closed the file
        if !self.file_watcher.is_current(watch, generation) {
            tracing::debug!("dropping stale {:?} for {}", change, path.display());
            return;
        }
        let Some(doc) = self.graph.first_association::<DocumentId, _>(watch) else {
            tracing::trace!("change to {} no longer open", path.display());
            return;
        };
        let name = match self.documents.get_mut(doc) {
            Some(document) => {
                document.disk_state = match change {
                    FileChange::Altered => DiskState::Altered,
                    FileChange::Removed => DiskState::Removed,
                };
                document.exists_on_disk = change != FileChange::Removed;
                document.display_name()
            }
            None => return,
        };
        tracing::info!("{} {:?} on disk", name, change);

        match self.dialogs.file_changed(&name, change) {
            FileChangeChoice::Reload => self.reload_document(doc, path),
            FileChangeChoice::SaveAgain => {
                // Failures were reported by the write itself
                let _ = self.write_document(doc, path.to_path_buf());
            }
            FileChangeChoice::SaveAs(target) => {
                let target = self.resolve_path(&target);
                let _ = self.write_document(doc, target);
            }
            FileChangeChoice::Ignore => {
                if change == FileChange::Removed {
                    if let Some(document) = self.documents.get_mut(doc) {
                        document.modified = true;
                    }
                }
                self.rearm_watches(doc);
            }
            FileChangeChoice::Close => {
                for pane in self.panes_for_document(doc) {
                    if let Err(e) = self.perform_close(pane) {
                        tracing::warn!("closing {} failed: {}", pane, e);
                    }
                }
            }
        }
    }

    fn reload_document(&mut self, doc: DocumentId, path: &Path) {
        let text = match self.filesystem.read_to_string(path) {
            Ok(text) => text,
            Err(source) => {
                let err = ServerError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                };
                tracing::warn!("{}", err);
                self.dialogs.report(&err.to_string());
                return;
            }
        };
        for pane in self.panes_for_document(doc) {
            if let Some(p) = self.panes.get_mut(pane) {
                p.text = text.clone();
            }
        }
        if let Some(document) = self.documents.get_mut(doc) {
            document.modified = false;
            document.exists_on_disk = true;
            document.disk_state = DiskState::InSync;
        }
        for id in self.graph.associations_of::<AutosaveId, _>(doc) {
            self.autosave.clear(id);
        }
        self.rearm_watches(doc);
        tracing::info!("reloaded {}", path.display());
    }

    fn rearm_watches(&self, doc: DocumentId) {
        for id in self.graph.associations_of::<WatchId, _>(doc) {
            self.file_watcher.rearm(id);
        }
    }
}
