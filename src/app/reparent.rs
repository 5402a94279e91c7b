//! Moving panes between views and windows
//!
//! A pane is never migrated in place. The destination gets a clone of it,
//! then the original is closed. The document's modification flag is carried
//! across by hand, because closing the original would otherwise prompt.

use super::{DropTarget, ServerError, WindowServer};
use crate::model::ids::{DocumentId, PaneId, ViewId, WindowId};

impl WindowServer {
    /// Move `pane` into a new window of its own
    ///
    /// Refused while the pane has clones: it would be ambiguous which one
    /// keeps the content.
    pub fn detach(&mut self, pane: PaneId) -> Result<WindowId, ServerError> {
        if !self.panes.contains(pane) {
            return Err(ServerError::UnknownPane(pane));
        }
        self.refuse_if_cloned(pane)?;
        let doc = self.document_of(pane).ok_or(ServerError::UnknownPane(pane))?;
        let modified = self.documents.get(doc).is_some_and(|d| d.modified);

        let moved = self.create_clone(pane)?;
        let (window, _) = self.new_window_with_pane(moved);
        self.set_document_modified(doc, false);
        self.perform_close(pane)?;
        self.set_document_modified(doc, modified);
        self.focus_pane(moved);
        tracing::info!("detached {} into {} as {}", pane, window, moved);
        Ok(window)
    }

    /// Move `pane` into `destination`
    ///
    /// With a drop target the target pane is split; otherwise an empty
    /// placeholder pane of the destination is reused, or its active pane is
    /// split along the default orientation. Returns the pane now showing the
    /// document, which is `pane` itself when it already lives in
    /// `destination`.
    pub fn reparent(
        &mut self,
        pane: PaneId,
        destination: ViewId,
        target: Option<DropTarget>,
    ) -> Result<PaneId, ServerError> {
        let source = self.view_of(pane).ok_or(ServerError::UnknownPane(pane))?;
        let dest = self
            .views
            .get(destination)
            .ok_or(ServerError::UnknownView(destination))?;
        if let Some(t) = target {
            if !dest.tree.contains(t.pane) {
                return Err(ServerError::UnknownPane(t.pane));
            }
        }
        let dest_active = dest.active_pane();
        self.refuse_if_cloned(pane)?;
        if source == destination {
            return Ok(pane);
        }

        let doc = self.document_of(pane).ok_or(ServerError::UnknownPane(pane))?;
        let modified = self.documents.get(doc).is_some_and(|d| d.modified);

        let slot = match target {
            Some(_) => None,
            None => self
                .panes_of(destination)
                .into_iter()
                .find(|&p| self.is_empty_slot(p)),
        };
        let moved = match (slot, target) {
            (Some(slot), _) => {
                self.bind_as_clone(slot, pane)?;
                slot
            }
            (None, Some(t)) => {
                let moved = self.create_clone(pane)?;
                self.place_pane(t.pane, t.orientation, moved)?;
                moved
            }
            (None, None) => {
                let moved = self.create_clone(pane)?;
                let orientation = self.config.layout.default_orientation;
                self.place_pane(dest_active, orientation, moved)?;
                moved
            }
        };

        self.set_document_modified(doc, false);
        self.perform_close(pane)?;
        self.set_document_modified(doc, modified);
        self.focus_pane(moved);
        tracing::info!("moved {} into {} as {}", pane, destination, moved);
        Ok(moved)
    }

    /// Move `pane` into whichever view is in front in `window`
    pub fn reparent_to_main(
        &mut self,
        pane: PaneId,
        window: WindowId,
    ) -> Result<PaneId, ServerError> {
        let view = self
            .windows
            .get(window)
            .ok_or(ServerError::UnknownWindow(window))?
            .active_view()
            .ok_or(ServerError::UnknownWindow(window))?;
        self.reparent(pane, view, None)
    }

    fn refuse_if_cloned(&mut self, pane: PaneId) -> Result<(), ServerError> {
        if self.clone_peers(pane).is_empty() {
            return Ok(());
        }
        let err = ServerError::HasClones(pane);
        tracing::warn!("{}", err);
        self.dialogs.report(&err.to_string());
        Err(err)
    }

    fn set_document_modified(&mut self, doc: DocumentId, modified: bool) {
        if let Some(document) = self.documents.get_mut(doc) {
            document.modified = modified;
        }
    }
}
