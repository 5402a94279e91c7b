//! A view: one split tree plus the pane that currently receives input

use super::split::SplitTree;
use crate::model::ids::PaneId;

#[derive(Debug, Clone)]
pub struct View {
    pub tree: SplitTree,
    active: PaneId,
    /// Panes in the order they last received focus, most recent last
    focus_history: Vec<PaneId>,
}

impl View {
    pub fn new(pane: PaneId, extent: u32) -> Self {
        Self {
            tree: SplitTree::new(pane, extent),
            active: pane,
            focus_history: vec![pane],
        }
    }

    pub fn active_pane(&self) -> PaneId {
        self.active
    }

    /// Make `pane` the active pane; returns false if it is not in this view
    pub fn activate(&mut self, pane: PaneId) -> bool {
        if !self.tree.contains(pane) {
            return false;
        }
        self.active = pane;
        self.focus_history.retain(|&p| p != pane);
        self.focus_history.push(pane);
        true
    }

    /// Drop a pane that has left the tree from the focus history
    pub fn forget(&mut self, pane: PaneId) {
        self.focus_history.retain(|&p| p != pane);
    }

    /// Most recently focused pane still in the tree, other than `except`
    pub fn most_recent_except(&self, except: PaneId) -> Option<PaneId> {
        self.focus_history
            .iter()
            .rev()
            .copied()
            .find(|&p| p != except && self.tree.contains(p))
            .or_else(|| self.tree.panes().into_iter().find(|&p| p != except))
    }
}
