//! Top-level windows and the actions a window forwards to the server

use super::{ServerError, WindowServer};
use crate::model::ids::{Orientation, PaneId, ViewId, WindowId};

/// A top-level window
///
/// The views a window hosts are recorded in the association graph; the
/// window itself only remembers which one is in front.
#[derive(Debug, Clone, Default)]
pub struct Window {
    active_view: Option<ViewId>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_view(&self) -> Option<ViewId> {
        self.active_view
    }

    pub fn set_active_view(&mut self, view: ViewId) {
        self.active_view = Some(view);
    }
}

/// Actions bound to a window's menus and key bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAction {
    /// Split the active pane with a fresh empty document
    Split(Orientation),
    /// Split the active pane with a clone of its document
    SplitClone(Orientation),
    CloseActivePane,
    /// Move the active pane into a window of its own
    DetachActivePane,
    /// Move the active pane into the active view of the main window
    MoveActivePaneToMain,
    NewView,
    NextView,
    NextPane,
    PrevPane,
    /// Close the whole window, confirming unsaved documents first
    Close,
}

impl WindowServer {
    /// The main window: the oldest window still alive
    pub fn main_window(&self) -> Option<WindowId> {
        self.windows.ids().into_iter().min()
    }

    /// Run `action` against `window`, raising it first
    pub fn dispatch(&mut self, window: WindowId, action: WindowAction) -> Result<(), ServerError> {
        if !self.raise(window) {
            return Err(ServerError::UnknownWindow(window));
        }
        tracing::debug!("{}: {:?}", window, action);
        match action {
            WindowAction::Split(orientation) => {
                let pane = self.window_active_pane(window)?;
                self.split_pane(pane, orientation, false).map(|_| ())
            }
            WindowAction::SplitClone(orientation) => {
                let pane = self.window_active_pane(window)?;
                self.split_pane(pane, orientation, true).map(|_| ())
            }
            WindowAction::CloseActivePane => {
                let pane = self.window_active_pane(window)?;
                self.close_pane(pane)
            }
            WindowAction::DetachActivePane => {
                let pane = self.window_active_pane(window)?;
                self.detach(pane).map(|_| ())
            }
            WindowAction::MoveActivePaneToMain => {
                let pane = self.window_active_pane(window)?;
                let main = self.main_window().ok_or(ServerError::NoWindow)?;
                self.reparent_to_main(pane, main).map(|_| ())
            }
            WindowAction::NewView => self.new_view(window).map(|_| ()),
            WindowAction::NextView => {
                self.cycle_view(window)?;
                Ok(())
            }
            WindowAction::NextPane => {
                self.next_pane();
                Ok(())
            }
            WindowAction::PrevPane => {
                self.prev_pane();
                Ok(())
            }
            WindowAction::Close => self.close_window(window),
        }
    }

    /// Bring the next view of `window` to the front, wrapping around
    pub fn cycle_view(&mut self, window: WindowId) -> Result<ViewId, ServerError> {
        let views = self.views_of(window);
        let current = self
            .windows
            .get(window)
            .ok_or(ServerError::UnknownWindow(window))?
            .active_view();
        let index = current
            .and_then(|v| views.iter().position(|&x| x == v))
            .map_or(0, |i| (i + 1) % views.len().max(1));
        let next = *views.get(index).ok_or(ServerError::UnknownWindow(window))?;
        let pane = self
            .active_pane_of(next)
            .ok_or(ServerError::UnknownView(next))?;
        self.focus_pane(pane);
        Ok(next)
    }

    fn window_active_pane(&self, window: WindowId) -> Result<PaneId, ServerError> {
        let view = self
            .windows
            .get(window)
            .and_then(Window::active_view)
            .ok_or(ServerError::UnknownWindow(window))?;
        self.active_pane_of(view).ok_or(ServerError::UnknownView(view))
    }
}
