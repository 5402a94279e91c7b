//! The window server: process-wide owner of windows, views, panes, and documents
//!
//! All structural state lives here and is only mutated on the UI thread:
//! - registries for every entity type
//! - the association graph linking them
//! - the window stacking order (last = active)
//!
//! The operations are split across submodules:
//! - `split_actions`: split and close (the split-tree lifecycle)
//! - `reparent`: detach into a new window, move between views/windows
//! - `file_open`: open routing with single-instance-per-file semantics
//! - `batch`: save-all / close-all / close-window confirmations
//! - `file_events`: draining the async bridge (autosave, file watcher)
//! - `window`: per-window actions

mod batch;
mod file_events;
mod file_open;
mod reparent;
mod split_actions;
pub mod types;
pub mod window;

pub use types::{DropTarget, OpenMode, OpenOutcome, ServerError};
pub use window::{Window, WindowAction};

use crate::config::Config;
use crate::model::association::{AssociationGraph, Registry};
use crate::model::document::{Document, DocumentIdentity};
use crate::model::ids::{AutosaveId, DocumentId, PaneId, ViewId, WatchId, WindowId};
use crate::model::name_pool::NamePool;
use crate::model::pane::Pane;
use crate::services::async_bridge::AsyncBridge;
use crate::services::autosave::AutosaveService;
use crate::services::dialogs::Dialogs;
use crate::services::file_watch::FileWatcher;
use crate::services::fs::FileSystem;
use crate::view::split::Layout;
use crate::view::view::View;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct WindowServer {
    config: Config,
    graph: AssociationGraph,
    windows: Registry<WindowId, Window>,
    views: Registry<ViewId, View>,
    panes: Registry<PaneId, Pane>,
    documents: Registry<DocumentId, Document>,
    names: NamePool,
    /// Stacking order, bottom first; the last entry is the active window
    window_stack: Vec<WindowId>,
    focus_clock: u64,
    dialogs: Box<dyn Dialogs>,
    filesystem: Arc<dyn FileSystem>,
    working_dir: PathBuf,
    bridge: AsyncBridge,
    autosave: AutosaveService,
    file_watcher: FileWatcher,
}

impl WindowServer {
    pub fn new(config: Config, dialogs: Box<dyn Dialogs>, filesystem: Arc<dyn FileSystem>) -> Self {
        let bridge = AsyncBridge::new();
        let autosave = AutosaveService::new(
            config.autosave.enabled,
            config.autosave.interval(),
            config.autosave.resolved_scratch_dir(),
            Arc::clone(&filesystem),
            bridge.sender(),
        );
        let file_watcher = FileWatcher::new(
            config.file_check.enabled,
            config.file_check.poll_interval(),
            Arc::clone(&filesystem),
            bridge.sender(),
        );
        let working_dir = std::env::current_dir().unwrap_or_default();
        tracing::info!(
            "WindowServer::new: autosave={}, file_check={}",
            config.autosave.enabled,
            config.file_check.enabled
        );
        Self {
            names: NamePool::new(config.layout.placeholder_prefix.clone()),
            config,
            graph: AssociationGraph::new(),
            windows: Registry::new(),
            views: Registry::new(),
            panes: Registry::new(),
            documents: Registry::new(),
            window_stack: Vec::new(),
            focus_clock: 0,
            dialogs,
            filesystem,
            working_dir,
            bridge,
            autosave,
            file_watcher,
        }
    }

    /// Resolve relative paths against this directory instead of the process cwd
    pub fn set_working_dir(&mut self, dir: PathBuf) {
        self.working_dir = dir;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn graph(&self) -> &AssociationGraph {
        &self.graph
    }

    pub fn autosave(&self) -> &AutosaveService {
        &self.autosave
    }

    pub fn file_watcher(&self) -> &FileWatcher {
        &self.file_watcher
    }

    pub fn names(&self) -> &NamePool {
        &self.names
    }

    /// Windows bottom to top
    pub fn windows(&self) -> Vec<WindowId> {
        self.window_stack.clone()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn active_window(&self) -> Option<WindowId> {
        self.window_stack.last().copied()
    }

    pub fn active_view(&self) -> Option<ViewId> {
        self.active_window()
            .and_then(|w| self.windows.get(w))
            .and_then(|w| w.active_view())
    }

    /// Active pane of the active view of the active window
    pub fn active_pane(&self) -> Option<PaneId> {
        self.active_view().and_then(|v| self.active_pane_of(v))
    }

    pub fn active_pane_of(&self, view: ViewId) -> Option<PaneId> {
        self.views.get(view).map(View::active_pane)
    }

    pub fn window(&self, window: WindowId) -> Option<&Window> {
        self.windows.get(window)
    }

    /// Views of a window, oldest first
    pub fn views_of(&self, window: WindowId) -> Vec<ViewId> {
        self.graph.sorted_associations_of(window)
    }

    /// Panes of a view in split-tree order
    pub fn panes_of(&self, view: ViewId) -> Vec<PaneId> {
        self.views
            .get(view)
            .map(|v| v.tree.panes())
            .unwrap_or_default()
    }

    pub fn panes_of_window(&self, window: WindowId) -> Vec<PaneId> {
        self.views_of(window)
            .into_iter()
            .flat_map(|v| self.panes_of(v))
            .collect()
    }

    pub fn all_panes(&self) -> Vec<PaneId> {
        self.panes.ids()
    }

    pub fn layout_of(&self, view: ViewId) -> Option<Layout> {
        self.views.get(view).and_then(|v| v.tree.layout())
    }

    pub fn view_of(&self, pane: PaneId) -> Option<ViewId> {
        self.graph.first_association(pane)
    }

    pub fn window_of_view(&self, view: ViewId) -> Option<WindowId> {
        self.graph.first_association(view)
    }

    pub fn window_of_pane(&self, pane: PaneId) -> Option<WindowId> {
        self.view_of(pane).and_then(|v| self.window_of_view(v))
    }

    pub fn document_of(&self, pane: PaneId) -> Option<DocumentId> {
        self.graph.first_association(pane)
    }

    pub fn document(&self, doc: DocumentId) -> Option<&Document> {
        self.documents.get(doc)
    }

    pub fn document_of_pane(&self, pane: PaneId) -> Option<&Document> {
        self.document_of(pane).and_then(|d| self.documents.get(d))
    }

    pub fn panes_for_document(&self, doc: DocumentId) -> Vec<PaneId> {
        self.graph.sorted_associations_of(doc)
    }

    pub fn pane_text(&self, pane: PaneId) -> Option<&str> {
        self.panes.get(pane).map(|p| p.text.as_str())
    }

    /// Modification state as reported through a pane (shared by its clones)
    pub fn is_modified(&self, pane: PaneId) -> bool {
        self.document_of_pane(pane).is_some_and(|d| d.modified)
    }

    /// Every other pane reachable through pane-to-pane links
    pub fn clone_peers(&self, pane: PaneId) -> Vec<PaneId> {
        let mut seen = BTreeSet::from([pane]);
        let mut queue = VecDeque::from([pane]);
        while let Some(current) = queue.pop_front() {
            for peer in self.graph.associations_of::<PaneId, _>(current) {
                if seen.insert(peer) {
                    queue.push_back(peer);
                }
            }
        }
        seen.remove(&pane);
        seen.into_iter().collect()
    }

    /// The document bound to this file path, if any
    pub fn find_document(&self, path: &Path) -> Option<DocumentId> {
        self.documents
            .iter()
            .find(|(_, doc)| doc.path() == Some(path))
            .map(|(id, _)| id)
    }

    /// Title shown for a window: the document of its active pane
    pub fn window_title(&self, window: WindowId) -> Option<String> {
        let view = self.windows.get(window)?.active_view()?;
        let pane = self.active_pane_of(view)?;
        let doc = self.document_of_pane(pane)?;
        let marker = if doc.modified { "*" } else { "" };
        Some(format!("{}{}", doc.display_name(), marker))
    }

    /// Verify the cross-entity invariants; describes the first violation
    pub fn check_invariants(&self) -> Result<(), String> {
        for (view_id, view) in self.views.iter() {
            view.tree
                .check_invariants()
                .map_err(|e| format!("{}: {}", view_id, e))?;
            if view.tree.is_empty() {
                return Err(format!("{} is empty but alive", view_id));
            }
            if !view.tree.contains(view.active_pane()) {
                return Err(format!("{} has a stale active pane", view_id));
            }
            if self.window_of_view(view_id).is_none() {
                return Err(format!("{} belongs to no window", view_id));
            }
        }
        for (pane, _) in self.panes.iter() {
            let docs = self.graph.associations_of::<DocumentId, _>(pane);
            if docs.len() != 1 {
                return Err(format!("{} bound to {} documents", pane, docs.len()));
            }
            let views = self.graph.associations_of::<ViewId, _>(pane);
            if views.len() != 1 {
                return Err(format!("{} is in {} views", pane, views.len()));
            }
            let doc = self.document_of(pane);
            for peer in self.clone_peers(pane) {
                if self.document_of(peer) != doc {
                    return Err(format!("clones {} and {} disagree", pane, peer));
                }
            }
        }
        let mut by_path: HashMap<&Path, DocumentId> = HashMap::new();
        for (id, doc) in self.documents.iter() {
            if self.panes_for_document(id).is_empty() {
                return Err(format!("{} has no panes", id));
            }
            if let Some(path) = doc.path() {
                if let Some(other) = by_path.insert(path, id) {
                    return Err(format!("{} and {} both own {}", other, id, path.display()));
                }
            }
        }
        for (window, _) in self.windows.iter() {
            if self.views_of(window).is_empty() {
                return Err(format!("{} has no views", window));
            }
            if !self.window_stack.contains(&window) {
                return Err(format!("{} missing from the stacking order", window));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Window and focus management
    // ------------------------------------------------------------------

    /// Create a window with one view holding one empty pane
    pub fn new_window(&mut self) -> WindowId {
        let doc = self.create_placeholder_document();
        let pane = self.create_pane(doc, String::new());
        let (window, _) = self.new_window_with_pane(pane);
        self.focus_pane(pane);
        window
    }

    /// Add a view with one empty pane to `window` and make it active
    pub fn new_view(&mut self, window: WindowId) -> Result<ViewId, ServerError> {
        if !self.windows.contains(window) {
            return Err(ServerError::UnknownWindow(window));
        }
        let doc = self.create_placeholder_document();
        let pane = self.create_pane(doc, String::new());
        let view = self.attach_view(window, pane);
        self.focus_pane(pane);
        Ok(view)
    }

    /// Bring a window to the top of the stacking order
    pub fn raise(&mut self, window: WindowId) -> bool {
        if !self.windows.contains(window) {
            return false;
        }
        self.window_stack.retain(|&w| w != window);
        self.window_stack.push(window);
        tracing::trace!("raise {}", window);
        true
    }

    /// Give `pane` focus: active in its view, view active in its window,
    /// window raised
    pub fn focus_pane(&mut self, pane: PaneId) -> bool {
        let Some(view_id) = self.view_of(pane) else {
            return false;
        };
        self.focus_clock += 1;
        let tick = self.focus_clock;
        if let Some(p) = self.panes.get_mut(pane) {
            p.focus_tick = tick;
        }
        if let Some(view) = self.views.get_mut(view_id) {
            view.activate(pane);
        }
        if let Some(window_id) = self.window_of_view(view_id) {
            if let Some(window) = self.windows.get_mut(window_id) {
                window.set_active_view(view_id);
            }
            self.raise(window_id);
        }
        true
    }

    /// Focus the next pane of the active view
    pub fn next_pane(&mut self) -> Option<PaneId> {
        let view = self.active_view()?;
        let next = {
            let v = self.views.get(view)?;
            v.tree.next_pane(v.active_pane())?
        };
        self.focus_pane(next);
        Some(next)
    }

    /// Focus the previous pane of the active view
    pub fn prev_pane(&mut self) -> Option<PaneId> {
        let view = self.active_view()?;
        let prev = {
            let v = self.views.get(view)?;
            v.tree.prev_pane(v.active_pane())?
        };
        self.focus_pane(prev);
        Some(prev)
    }

    // ------------------------------------------------------------------
    // Editing surface (stand-in for the editing widget)
    // ------------------------------------------------------------------

    /// Replace a pane's content, as the editing widget would after a keystroke
    ///
    /// The content is copied into every clone and the shared document is
    /// marked modified.
    pub fn edit(&mut self, pane: PaneId, text: &str) -> Result<(), ServerError> {
        let doc = self.document_of(pane).ok_or(ServerError::UnknownPane(pane))?;
        let mut group = self.clone_peers(pane);
        group.push(pane);
        for member in group {
            if let Some(p) = self.panes.get_mut(member) {
                p.text = text.to_string();
            }
        }
        if let Some(document) = self.documents.get_mut(doc) {
            document.modified = true;
        }
        for id in self.graph.associations_of::<AutosaveId, _>(doc) {
            self.autosave.update(id, text);
        }
        Ok(())
    }

    /// Set the modification flag as reported by the editing widget
    pub fn set_modified(&mut self, pane: PaneId, modified: bool) -> Result<(), ServerError> {
        let doc = self.document_of(pane).ok_or(ServerError::UnknownPane(pane))?;
        if let Some(document) = self.documents.get_mut(doc) {
            document.modified = modified;
        }
        Ok(())
    }

    /// Save the document shown in `pane`
    pub fn save_pane(&mut self, pane: PaneId) -> Result<(), ServerError> {
        let doc = self.document_of(pane).ok_or(ServerError::UnknownPane(pane))?;
        self.save_document(doc, None)
    }

    /// Save the document shown in `pane` under a new path and rebind it there
    pub fn save_pane_as(&mut self, pane: PaneId, path: &Path) -> Result<(), ServerError> {
        let doc = self.document_of(pane).ok_or(ServerError::UnknownPane(pane))?;
        let path = self.resolve_path(path);
        self.save_document(doc, Some(path))
    }

    // ------------------------------------------------------------------
    // Entity lifecycle helpers
    // ------------------------------------------------------------------

    fn create_placeholder_document(&mut self) -> DocumentId {
        let name = self.names.reserve();
        let doc = self.documents.insert(Document::placeholder(name.clone()));
        let autosave = self.autosave.register(&name, "");
        self.graph.associate(doc, autosave);
        tracing::debug!("created {} '{}'", doc, name);
        doc
    }

    fn create_file_document(&mut self, path: PathBuf, text: &str) -> DocumentId {
        let name = path.display().to_string();
        let doc = self.documents.insert(Document::file(path.clone(), true));
        let autosave = self.autosave.register(&name, text);
        self.graph.associate(doc, autosave);
        let watch = self.file_watcher.watch(&path);
        self.graph.associate(doc, watch);
        tracing::debug!("created {} for {}", doc, name);
        doc
    }

    /// Tear down a document that no pane shows any more
    fn destroy_document(&mut self, doc: DocumentId) {
        for id in self.graph.associations_of::<AutosaveId, _>(doc) {
            self.autosave.unregister(id);
        }
        for id in self.graph.associations_of::<WatchId, _>(doc) {
            self.file_watcher.unwatch(id);
        }
        if let Some(document) = self.documents.destroy(doc, &mut self.graph) {
            if let DocumentIdentity::Placeholder(name) = &document.identity {
                self.names.release(name);
            }
            tracing::debug!("destroyed {} '{}'", doc, document.display_name());
        }
    }

    fn destroy_document_if_orphaned(&mut self, doc: DocumentId) {
        if self.documents.contains(doc) && self.panes_for_document(doc).is_empty() {
            self.destroy_document(doc);
        }
    }

    fn create_pane(&mut self, doc: DocumentId, text: String) -> PaneId {
        let pane = self.panes.insert(Pane::with_text(text));
        self.graph.associate(pane, doc);
        for id in self.graph.associations_of::<AutosaveId, _>(doc) {
            self.graph.associate(pane, id);
        }
        pane
    }

    /// New pane bound to `source`'s document, joined to its clone group, with
    /// the content copied in
    fn create_clone(&mut self, source: PaneId) -> Result<PaneId, ServerError> {
        let doc = self
            .document_of(source)
            .ok_or(ServerError::UnknownPane(source))?;
        let text = self.pane_text(source).unwrap_or_default().to_string();
        let mut group = self.clone_peers(source);
        group.push(source);
        let pane = self.create_pane(doc, text);
        for member in group {
            self.graph.associate(pane, member);
        }
        Ok(pane)
    }

    /// Rebind `pane` to `doc`, leaving any clone group it was part of
    fn bind_pane(&mut self, pane: PaneId, doc: DocumentId) {
        let old = self.document_of(pane);
        if old == Some(doc) {
            return;
        }
        for peer in self.graph.associations_of::<PaneId, _>(pane) {
            self.graph.dissociate(pane, peer);
        }
        if let Some(old) = old {
            self.graph.dissociate(pane, old);
            for id in self.graph.associations_of::<AutosaveId, _>(old) {
                self.graph.dissociate(pane, id);
            }
            self.destroy_document_if_orphaned(old);
        }
        self.graph.associate(pane, doc);
        for id in self.graph.associations_of::<AutosaveId, _>(doc) {
            self.graph.associate(pane, id);
        }
    }

    /// Make `new` a clone of `source`: same document, same clone group,
    /// content copied
    fn bind_as_clone(&mut self, new: PaneId, source: PaneId) -> Result<(), ServerError> {
        let doc = self
            .document_of(source)
            .ok_or(ServerError::UnknownPane(source))?;
        let text = self
            .panes
            .get(source)
            .map(|p| p.text.clone())
            .unwrap_or_default();
        self.bind_pane(new, doc);
        let mut group = self.clone_peers(source);
        group.push(source);
        for member in group {
            self.graph.associate(new, member);
        }
        if let Some(p) = self.panes.get_mut(new) {
            p.text = text;
        }
        Ok(())
    }

    /// Create a window whose single view holds `pane`
    fn new_window_with_pane(&mut self, pane: PaneId) -> (WindowId, ViewId) {
        let window = self.windows.insert(Window::new());
        self.window_stack.push(window);
        let view = self.attach_view(window, pane);
        tracing::info!("opened {} with {}", window, view);
        (window, view)
    }

    fn attach_view(&mut self, window: WindowId, pane: PaneId) -> ViewId {
        let view = self
            .views
            .insert(View::new(pane, self.config.layout.split_extent));
        self.graph.associate(window, view);
        self.graph.associate(view, pane);
        if let Some(w) = self.windows.get_mut(window) {
            w.set_active_view(view);
        }
        view
    }

    fn destroy_view(&mut self, view: ViewId) {
        let window = self.window_of_view(view);
        self.views.destroy(view, &mut self.graph);
        tracing::debug!("destroyed {}", view);
        let Some(window) = window else {
            return;
        };
        let remaining = self.views_of(window);
        match remaining.last() {
            None => self.destroy_window(window),
            Some(&fallback) => {
                if let Some(w) = self.windows.get_mut(window) {
                    if w.active_view() == Some(view) {
                        w.set_active_view(fallback);
                    }
                }
            }
        }
    }

    fn destroy_window(&mut self, window: WindowId) {
        self.windows.destroy(window, &mut self.graph);
        self.window_stack.retain(|&w| w != window);
        tracing::info!("closed {}", window);
    }

    /// A pane bound to an untouched placeholder: safe to load a file into
    fn is_empty_slot(&self, pane: PaneId) -> bool {
        let Some(doc) = self.document_of_pane(pane) else {
            return false;
        };
        doc.is_placeholder()
            && !doc.modified
            && self.pane_text(pane).is_some_and(str::is_empty)
            && self.clone_peers(pane).is_empty()
    }

    /// Most recently focused pane among `candidates`
    fn most_recent(&self, candidates: &[PaneId]) -> Option<PaneId> {
        candidates
            .iter()
            .copied()
            .max_by_key(|&p| self.panes.get(p).map(|p| p.focus_tick).unwrap_or(0))
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        let resolved = if path.is_relative() {
            self.working_dir.join(path)
        } else {
            path.to_path_buf()
        };
        if let Ok(canonical) = self.filesystem.canonicalize(&resolved) {
            return canonical;
        }
        // Missing file: canonicalize the parent and append the file name
        match (resolved.parent(), resolved.file_name()) {
            (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => self
                .filesystem
                .canonicalize(parent)
                .map(|p| p.join(name))
                .unwrap_or(resolved),
            _ => resolved,
        }
    }

    /// Write a document to disk
    ///
    /// `target` overrides the destination ("save as"). Placeholders without a
    /// target ask the user for a path; declining cancels.
    fn save_document(
        &mut self,
        doc: DocumentId,
        target: Option<PathBuf>,
    ) -> Result<(), ServerError> {
        let document = self.documents.get(doc).ok_or(ServerError::Cancelled)?;
        let name = document.display_name();
        let path = match (target, document.path()) {
            (Some(path), _) => path,
            (None, Some(path)) => path.to_path_buf(),
            (None, None) => match self.dialogs.ask_save_path(&name) {
                Some(path) => self.resolve_path(&path),
                None => return Err(ServerError::Cancelled),
            },
        };
        self.write_document(doc, path)
    }

    /// Write the document's content to `path` and rebind its identity there
    fn write_document(&mut self, doc: DocumentId, path: PathBuf) -> Result<(), ServerError> {
        if let Some(other) = self.find_document(&path) {
            if other != doc {
                let err = ServerError::AlreadyOpen(path);
                self.dialogs.report(&err.to_string());
                return Err(err);
            }
        }
        let name = self
            .documents
            .get(doc)
            .map(Document::display_name)
            .unwrap_or_default();
        let text = self
            .panes_for_document(doc)
            .first()
            .and_then(|&p| self.pane_text(p))
            .unwrap_or_default()
            .to_string();

        if let Err(source) = self.filesystem.write(&path, &text) {
            tracing::warn!("save of {} to {} failed: {}", name, path.display(), source);
            let err = ServerError::SaveFailed { name, source };
            self.dialogs.report(&err.to_string());
            return Err(err);
        }

        let Some(document) = self.documents.get_mut(doc) else {
            return Ok(());
        };
        let previous = std::mem::replace(
            &mut document.identity,
            DocumentIdentity::File(path.clone()),
        );
        document.modified = false;
        document.exists_on_disk = true;
        document.disk_state = Default::default();

        match previous {
            DocumentIdentity::Placeholder(old_name) => {
                self.names.release(&old_name);
                let watch = self.file_watcher.watch(&path);
                self.graph.associate(doc, watch);
            }
            DocumentIdentity::File(old_path) if old_path != path => {
                for id in self.graph.associations_of::<WatchId, _>(doc) {
                    self.file_watcher.retarget(id, &path);
                }
            }
            DocumentIdentity::File(_) => {
                for id in self.graph.associations_of::<WatchId, _>(doc) {
                    self.file_watcher.rearm(id);
                }
            }
        }
        for id in self.graph.associations_of::<AutosaveId, _>(doc) {
            self.autosave.clear(id);
        }
        tracing::info!("saved {} to {}", name, path.display());
        Ok(())
    }
}
