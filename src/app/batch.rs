//! Batch save and close across windows
//!
//! Confirmation is per document, not per pane: a file shown by several
//! clones counts once, and a document that keeps a pane outside the batch
//! needs no confirmation at all. All answers are collected before anything
//! is written or closed, so cancelling leaves everything as it was.

use super::{ServerError, WindowServer};
use crate::model::ids::{DocumentId, PaneId, ViewId, WindowId};
use crate::services::dialogs::{BatchChoice, SaveChoice};
use std::collections::BTreeSet;
use std::path::PathBuf;

impl WindowServer {
    /// Close every pane of every window
    pub fn close_all(&mut self) -> Result<(), ServerError> {
        let panes = self.all_panes();
        tracing::info!("close all: {} panes", panes.len());
        self.close_panes(panes)
    }

    /// Close `window` and everything in it
    pub fn close_window(&mut self, window: WindowId) -> Result<(), ServerError> {
        if !self.windows.contains(window) {
            return Err(ServerError::UnknownWindow(window));
        }
        let panes = self.panes_of_window(window);
        self.close_panes(panes)
    }

    /// Close one view of a window
    pub fn close_view(&mut self, view: ViewId) -> Result<(), ServerError> {
        if !self.views.contains(view) {
            return Err(ServerError::UnknownView(view));
        }
        let panes = self.panes_of(view);
        self.close_panes(panes)
    }

    /// Save every modified document; returns how many were written
    ///
    /// Never-saved documents ask for a path first. Declining any of those
    /// cancels the whole batch before anything is written.
    pub fn save_all(&mut self) -> Result<usize, ServerError> {
        let docs: Vec<(DocumentId, String)> = self
            .documents
            .iter()
            .filter(|(_, d)| d.modified)
            .map(|(id, d)| (id, d.display_name()))
            .collect();
        let targets = self.resolve_save_targets(docs)?;
        let (saved, _) = self.write_targets(targets);
        tracing::info!("save all: {} documents written", saved);
        Ok(saved)
    }

    /// Close `panes` after one round of confirmations
    ///
    /// Documents whose save fails keep their panes open.
    fn close_panes(&mut self, panes: Vec<PaneId>) -> Result<(), ServerError> {
        let closing: BTreeSet<PaneId> = panes.into_iter().collect();
        let mut docs: Vec<(DocumentId, String)> = Vec::new();
        for &pane in &closing {
            let Some(doc) = self.document_of(pane) else {
                continue;
            };
            if docs.iter().any(|(d, _)| *d == doc) {
                continue;
            }
            let Some(document) = self.documents.get(doc) else {
                continue;
            };
            let survives = self
                .panes_for_document(doc)
                .iter()
                .any(|p| !closing.contains(p));
            if document.modified && !survives {
                docs.push((doc, document.display_name()));
            }
        }
        docs.sort_by(|a, b| a.1.cmp(&b.1));

        let to_save = self.confirm_documents(docs)?;
        let targets = self.resolve_save_targets(to_save)?;
        let (_, failed) = self.write_targets(targets);

        for pane in closing {
            let keep = self.document_of(pane).is_some_and(|d| failed.contains(&d));
            if keep || !self.panes.contains(pane) {
                continue;
            }
            self.perform_close(pane)?;
        }
        Ok(())
    }

    /// Ask which of `docs` to save; one document gets the plain
    /// save/discard/cancel prompt, several get a single combined one
    fn confirm_documents(
        &mut self,
        docs: Vec<(DocumentId, String)>,
    ) -> Result<Vec<(DocumentId, String)>, ServerError> {
        match docs.len() {
            0 => Ok(docs),
            1 => match self.dialogs.confirm_save(&docs[0].1) {
                SaveChoice::Save => Ok(docs),
                SaveChoice::Discard => Ok(Vec::new()),
                SaveChoice::Cancel => Err(ServerError::Cancelled),
            },
            _ => {
                let names: Vec<String> = docs.iter().map(|(_, name)| name.clone()).collect();
                match self.dialogs.confirm_batch(&names) {
                    BatchChoice::SaveAll => Ok(docs),
                    BatchChoice::DiscardAll => Ok(Vec::new()),
                    BatchChoice::SaveSelected(selected) => Ok(docs
                        .into_iter()
                        .filter(|(_, name)| selected.contains(name))
                        .collect()),
                    BatchChoice::Cancel => Err(ServerError::Cancelled),
                }
            }
        }
    }

    /// Work out where each document goes, asking for paths of placeholders
    fn resolve_save_targets(
        &mut self,
        docs: Vec<(DocumentId, String)>,
    ) -> Result<Vec<(DocumentId, PathBuf)>, ServerError> {
        let mut targets = Vec::with_capacity(docs.len());
        for (doc, name) in docs {
            let known = self
                .documents
                .get(doc)
                .and_then(|d| d.path().map(|p| p.to_path_buf()));
            let path = match known {
                Some(path) => path,
                None => match self.dialogs.ask_save_path(&name) {
                    Some(path) => self.resolve_path(&path),
                    None => return Err(ServerError::Cancelled),
                },
            };
            targets.push((doc, path));
        }
        Ok(targets)
    }

    /// Write each target; returns the number written and the documents that
    /// failed (already reported to the user)
    fn write_targets(
        &mut self,
        targets: Vec<(DocumentId, PathBuf)>,
    ) -> (usize, BTreeSet<DocumentId>) {
        let mut saved = 0;
        let mut failed = BTreeSet::new();
        for (doc, path) in targets {
            match self.write_document(doc, path) {
                Ok(()) => saved += 1,
                Err(e) => {
                    tracing::warn!("batch save of {} failed: {}", doc, e);
                    failed.insert(doc);
                }
            }
        }
        (saved, failed)
    }
}
