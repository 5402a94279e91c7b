//! Split and close: the split-tree lifecycle of panes
//!
//! Closing is staged: every prompt is answered before the first structural
//! change, so a cancelled close leaves trees and graph untouched.

use super::{ServerError, WindowServer};
use crate::model::ids::{Orientation, PaneId};
use crate::services::dialogs::SaveChoice;
use crate::view::split::Removal;

impl WindowServer {
    /// Split the active pane of the active view
    pub fn split_active_pane(
        &mut self,
        orientation: Orientation,
        clone: bool,
    ) -> Result<PaneId, ServerError> {
        let active = self.active_pane().ok_or(ServerError::NoWindow)?;
        self.split_pane(active, orientation, clone)
    }

    /// Split `target`, placing a new pane after it
    ///
    /// With `clone` the new pane shows `target`'s document and joins its
    /// clone group; otherwise it gets a fresh placeholder document. The new
    /// pane becomes active.
    pub fn split_pane(
        &mut self,
        target: PaneId,
        orientation: Orientation,
        clone: bool,
    ) -> Result<PaneId, ServerError> {
        if self.view_of(target).is_none() {
            return Err(ServerError::UnknownPane(target));
        }
        let pane = if clone {
            self.create_clone(target)?
        } else {
            let doc = self.create_placeholder_document();
            self.create_pane(doc, String::new())
        };
        self.place_pane(target, orientation, pane)?;
        tracing::debug!(
            "split {} {:?}{} -> {}",
            target,
            orientation,
            if clone { " (clone)" } else { "" },
            pane
        );
        Ok(pane)
    }

    /// Insert an unplaced pane next to `target` and focus it
    ///
    /// On failure the pane is destroyed again so nothing leaks.
    pub(super) fn place_pane(
        &mut self,
        target: PaneId,
        orientation: Orientation,
        pane: PaneId,
    ) -> Result<(), ServerError> {
        let view = self.view_of(target).ok_or(ServerError::UnknownPane(target))?;
        let result = match self.views.get_mut(view) {
            Some(v) => v.tree.split(target, orientation, pane).map_err(ServerError::from),
            None => Err(ServerError::UnknownView(view)),
        };
        if let Err(e) = result {
            self.discard_unplaced_pane(pane);
            return Err(e);
        }
        self.graph.associate(view, pane);
        self.focus_pane(pane);
        Ok(())
    }

    fn discard_unplaced_pane(&mut self, pane: PaneId) {
        let doc = self.document_of(pane);
        self.panes.destroy(pane, &mut self.graph);
        if let Some(doc) = doc {
            self.destroy_document_if_orphaned(doc);
        }
    }

    /// Close `pane`, asking to save its document if this is the last pane
    /// showing unsaved changes
    pub fn close_pane(&mut self, pane: PaneId) -> Result<(), ServerError> {
        self.stage_close(pane)?;
        self.perform_close(pane)
    }

    /// Answer the save prompt for closing `pane`, saving if asked to
    fn stage_close(&mut self, pane: PaneId) -> Result<(), ServerError> {
        let doc = self.document_of(pane).ok_or(ServerError::UnknownPane(pane))?;
        let Some(document) = self.documents.get(doc) else {
            return Ok(());
        };
        if !document.modified || !self.clone_peers(pane).is_empty() {
            return Ok(());
        }
        let name = document.display_name();
        match self.dialogs.confirm_save(&name) {
            SaveChoice::Save => self.save_document(doc, None),
            SaveChoice::Discard => {
                tracing::debug!("discarding changes to {}", name);
                Ok(())
            }
            SaveChoice::Cancel => Err(ServerError::Cancelled),
        }
    }

    /// Remove `pane` without prompting
    ///
    /// Collapses the split tree, destroys the document once no pane shows it,
    /// and closes the view (then the window) when it becomes empty.
    pub(super) fn perform_close(&mut self, pane: PaneId) -> Result<(), ServerError> {
        let view = self.view_of(pane).ok_or(ServerError::UnknownPane(pane))?;
        let window = self.window_of_view(view);
        let was_focused = self.active_window().is_some() && self.active_window() == window;
        let doc = self.document_of(pane);
        let peers = self.clone_peers(pane);

        let (removal, was_active) = {
            let v = self.views.get_mut(view).ok_or(ServerError::UnknownView(view))?;
            let was_active = v.active_pane() == pane;
            let removal = v.tree.remove(pane)?;
            v.forget(pane);
            (removal, was_active)
        };
        self.panes.destroy(pane, &mut self.graph);
        if let Some(doc) = doc {
            self.destroy_document_if_orphaned(doc);
        }
        tracing::debug!("closed {} ({:?})", pane, removal);

        let successor = if removal == Removal::Emptied {
            self.destroy_view(view);
            // Fall back to a surviving clone elsewhere, then to the view the
            // window brought to the front
            self.most_recent(&peers).or_else(|| {
                window
                    .and_then(|w| self.windows.get(w))
                    .and_then(|w| w.active_view())
                    .and_then(|v| self.active_pane_of(v))
            })
        } else if was_active {
            let local: Vec<PaneId> = peers
                .iter()
                .copied()
                .filter(|&p| self.view_of(p) == Some(view))
                .collect();
            self.most_recent(&local).or_else(|| {
                self.views
                    .get(view)
                    .and_then(|v| v.most_recent_except(pane))
            })
        } else {
            None
        };

        if let Some(next) = successor {
            if was_focused {
                self.focus_pane(next);
            } else if let Some(v) = self.view_of(next).and_then(|v| self.views.get_mut(v)) {
                v.activate(next);
            }
        }
        Ok(())
    }
}
