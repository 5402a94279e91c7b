//! Open routing
//!
//! A file is shown by at most one document. Opening a file that is already
//! open never creates a second independent pane: plain `open` raises the
//! existing pane, `open_in_direction` clones it (asking first if that means
//! pulling it out of another window).

use super::{OpenMode, OpenOutcome, ServerError, WindowServer};
use crate::model::ids::{DocumentId, Orientation, PaneId};
use std::path::Path;

impl WindowServer {
    /// Open `path`, raising it if it is already open somewhere
    pub fn open(&mut self, path: &Path, mode: OpenMode) -> Result<OpenOutcome, ServerError> {
        let path = self.resolve_path(path);
        let raised = self
            .find_document(&path)
            .and_then(|doc| self.raise_document(doc));
        if let Some(pane) = raised {
            tracing::info!("{} already open, raised {}", path.display(), pane);
            return Ok(OpenOutcome::Raised(pane));
        }

        let text = self.load_or_create(&path)?;
        let doc = self.create_file_document(path.clone(), &text);

        let pane = if let Some(slot) = self.find_empty_slot() {
            self.bind_pane(slot, doc);
            if let Some(p) = self.panes.get_mut(slot) {
                p.text = text;
            }
            self.focus_pane(slot);
            slot
        } else {
            let pane = self.create_pane(doc, text);
            match (mode, self.active_pane()) {
                (OpenMode::ActiveWindow, Some(active)) => {
                    let orientation = self.config.layout.default_orientation;
                    self.place_pane(active, orientation, pane)?;
                }
                _ => {
                    self.new_window_with_pane(pane);
                    self.focus_pane(pane);
                }
            }
            pane
        };
        tracing::info!("opened {} in {}", path.display(), pane);
        Ok(OpenOutcome::Loaded(pane))
    }

    /// Open `path` next to the active pane, splitting along `orientation`
    ///
    /// A file already open in this window gets another clone here. A file
    /// open only in other windows is moved here after confirmation: the
    /// remote panes close and the document keeps its unsaved changes.
    pub fn open_in_direction(
        &mut self,
        path: &Path,
        orientation: Orientation,
    ) -> Result<PaneId, ServerError> {
        let (Some(window), Some(target)) = (self.active_window(), self.active_pane()) else {
            return self.open(path, OpenMode::NewWindow).map(OpenOutcome::pane);
        };
        let path = self.resolve_path(path);

        let Some(doc) = self.find_document(&path) else {
            let text = self.load_or_create(&path)?;
            let doc = self.create_file_document(path.clone(), &text);
            let pane = self.create_pane(doc, text);
            self.place_pane(target, orientation, pane)?;
            tracing::info!("opened {} beside {}", path.display(), target);
            return Ok(pane);
        };

        let existing = self.panes_for_document(doc);
        let local: Vec<PaneId> = existing
            .iter()
            .copied()
            .filter(|&p| self.window_of_pane(p) == Some(window))
            .collect();
        let remote = local.is_empty();
        if remote && !self.dialogs.confirm_move_here(&path) {
            return Err(ServerError::Cancelled);
        }

        let source = self
            .most_recent(if remote { &existing } else { &local })
            .ok_or(ServerError::FileMissing(path.clone()))?;
        let pane = self.create_clone(source)?;
        self.place_pane(target, orientation, pane)?;

        if remote {
            for other in existing {
                self.perform_close(other)?;
            }
            self.focus_pane(pane);
            tracing::info!("moved {} into {}", path.display(), window);
        }
        Ok(pane)
    }

    /// Focus the most recently used pane showing `doc`
    fn raise_document(&mut self, doc: DocumentId) -> Option<PaneId> {
        let panes = self.panes_for_document(doc);
        let pane = self.most_recent(&panes)?;
        self.focus_pane(pane);
        Some(pane)
    }

    /// Read `path`, offering to create it first when missing
    fn load_or_create(&mut self, path: &Path) -> Result<String, ServerError> {
        if !self.filesystem.exists(path) {
            if !self.dialogs.confirm_create(path) {
                tracing::debug!("declined to create {}", path.display());
                return Err(ServerError::FileMissing(path.to_path_buf()));
            }
            if let Err(source) = self.filesystem.create_empty(path) {
                let err = ServerError::CreateFailed {
                    path: path.to_path_buf(),
                    source,
                };
                tracing::warn!("{}", err);
                self.dialogs.report(&err.to_string());
                return Err(err);
            }
            return Ok(String::new());
        }
        self.filesystem.read_to_string(path).map_err(|source| {
            let err = ServerError::ReadFailed {
                path: path.to_path_buf(),
                source,
            };
            tracing::warn!("{}", err);
            self.dialogs.report(&err.to_string());
            err
        })
    }

    /// An untouched placeholder pane, preferring the active window
    fn find_empty_slot(&self) -> Option<PaneId> {
        let mut candidates = Vec::new();
        if let Some(active) = self.active_pane() {
            candidates.push(active);
        }
        for window in self.window_stack.iter().rev() {
            candidates.extend(self.panes_of_window(*window));
        }
        candidates.into_iter().find(|&p| self.is_empty_slot(p))
    }
}
