/// Split tree for one view: panes arranged in nested horizontal/vertical splitters
///
/// Design:
/// - A node is either a leaf (one pane) or a splitter (orientation + ≥2 children)
/// - Nodes live in an arena and refer to each other by index, so removing a
///   pane and collapsing its parent is a matter of rewriting a few indices
/// - Splitting a pane whose parent already runs in the requested orientation
///   adds a sibling instead of nesting a new splitter
/// - Children of a splitter share the configured extent evenly; the integer
///   remainder goes to the last child
///
/// Example layouts (rendered with [`Layout`]'s `Display`):
/// ```text
/// ┌──────────┬─────────┐      ┌──────────┬─────────┐
/// │          │         │      │          │    2    │
/// │    1     │    2    │      │    1     ├─────────┤
/// │          │         │      │          │    3    │
/// └──────────┴─────────┘      └──────────┴─────────┘
///        H[1 2]                      H[1 V[2 3]]
/// ```
use crate::model::ids::{Orientation, PaneId};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf(PaneId),
    Splitter {
        orientation: Orientation,
        children: Vec<NodeId>,
        sizes: Vec<u32>,
    },
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// Owned snapshot of a split tree's shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Layout {
    Pane(PaneId),
    Split {
        orientation: Orientation,
        sizes: Vec<u32>,
        children: Vec<Layout>,
    },
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pane(pane) => write!(f, "{}", pane.0),
            Self::Split {
                orientation,
                children,
                ..
            } => {
                write!(f, "{}[", orientation.tag())?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// What happened to the tree when a pane was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The parent splitter kept two or more children
    Shrunk,
    /// The parent splitter was left with one child and was replaced by it
    Collapsed,
    /// The removed pane was the last one
    Emptied,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    #[error("pane {0} is not in this split tree")]
    UnknownPane(PaneId),
    #[error("pane {0} is already in this split tree")]
    DuplicatePane(PaneId),
}

#[derive(Debug, Clone)]
pub struct SplitTree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: Option<NodeId>,
    leaves: HashMap<PaneId, NodeId>,
    extent: u32,
}

impl SplitTree {
    /// Create a tree holding a single pane
    pub fn new(pane: PaneId, extent: u32) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            leaves: HashMap::new(),
            extent: extent.max(1),
        };
        let leaf = tree.alloc(Node {
            parent: None,
            kind: NodeKind::Leaf(pane),
        });
        tree.root = Some(leaf);
        tree.leaves.insert(pane, leaf);
        tree
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    pub fn contains(&self, pane: PaneId) -> bool {
        self.leaves.contains_key(&pane)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Panes in depth-first, first-to-last order
    pub fn panes(&self) -> Vec<PaneId> {
        let mut out = Vec::with_capacity(self.leaves.len());
        if let Some(root) = self.root {
            self.collect_panes(root, &mut out);
        }
        out
    }

    fn collect_panes(&self, id: NodeId, out: &mut Vec<PaneId>) {
        match &self.node(id).kind {
            NodeKind::Leaf(pane) => out.push(*pane),
            NodeKind::Splitter { children, .. } => {
                for &child in children {
                    self.collect_panes(child, out);
                }
            }
        }
    }

    /// Snapshot of the whole tree, or None once the last pane is gone
    pub fn layout(&self) -> Option<Layout> {
        self.root.map(|root| self.layout_of(root))
    }

    fn layout_of(&self, id: NodeId) -> Layout {
        match &self.node(id).kind {
            NodeKind::Leaf(pane) => Layout::Pane(*pane),
            NodeKind::Splitter {
                orientation,
                children,
                sizes,
            } => Layout::Split {
                orientation: *orientation,
                sizes: sizes.clone(),
                children: children.iter().map(|&c| self.layout_of(c)).collect(),
            },
        }
    }

    /// Orientation of the splitter directly holding `pane`
    pub fn parent_orientation(&self, pane: PaneId) -> Option<Orientation> {
        let leaf = *self.leaves.get(&pane)?;
        let parent = self.node(leaf).parent?;
        match &self.node(parent).kind {
            NodeKind::Splitter { orientation, .. } => Some(*orientation),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Sizes of the children of the splitter directly holding `pane`
    pub fn sizes_of_parent(&self, pane: PaneId) -> Option<Vec<u32>> {
        let leaf = *self.leaves.get(&pane)?;
        let parent = self.node(leaf).parent?;
        match &self.node(parent).kind {
            NodeKind::Splitter { sizes, .. } => Some(sizes.clone()),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Put `new` next to `target`
    ///
    /// If `target`'s parent already runs in `orientation`, `new` becomes the
    /// sibling right after `target`. Otherwise a new splitter takes
    /// `target`'s place and holds `target` followed by `new`.
    pub fn split(
        &mut self,
        target: PaneId,
        orientation: Orientation,
        new: PaneId,
    ) -> Result<(), SplitError> {
        if self.leaves.contains_key(&new) {
            return Err(SplitError::DuplicatePane(new));
        }
        let target_node = *self
            .leaves
            .get(&target)
            .ok_or(SplitError::UnknownPane(target))?;
        let parent = self.node(target_node).parent;

        let same_direction = parent.is_some_and(|p| {
            matches!(
                &self.node(p).kind,
                NodeKind::Splitter { orientation: o, .. } if *o == orientation
            )
        });

        let new_leaf = self.alloc(Node {
            parent: None,
            kind: NodeKind::Leaf(new),
        });

        match parent {
            Some(p) if same_direction => {
                if let NodeKind::Splitter { children, .. } = &mut self.node_mut(p).kind {
                    let index = children
                        .iter()
                        .position(|&c| c == target_node)
                        .unwrap_or(children.len() - 1);
                    children.insert(index + 1, new_leaf);
                }
                self.node_mut(new_leaf).parent = Some(p);
                self.redistribute(p);
            }
            _ => {
                let splitter = self.alloc(Node {
                    parent,
                    kind: NodeKind::Splitter {
                        orientation,
                        children: vec![target_node, new_leaf],
                        sizes: Vec::new(),
                    },
                });
                match parent {
                    Some(p) => self.replace_child(p, target_node, splitter),
                    None => self.root = Some(splitter),
                }
                self.node_mut(target_node).parent = Some(splitter);
                self.node_mut(new_leaf).parent = Some(splitter);
                self.redistribute(splitter);
            }
        }

        self.leaves.insert(new, new_leaf);
        tracing::trace!("split {} {:?} -> {}", target, orientation, new);
        Ok(())
    }

    /// Take `pane` out of the tree, collapsing a parent left with one child
    pub fn remove(&mut self, pane: PaneId) -> Result<Removal, SplitError> {
        let leaf = self
            .leaves
            .remove(&pane)
            .ok_or(SplitError::UnknownPane(pane))?;
        let parent = self.node(leaf).parent;
        self.release(leaf);

        let Some(parent) = parent else {
            self.root = None;
            return Ok(Removal::Emptied);
        };

        let survivor = match &mut self.node_mut(parent).kind {
            NodeKind::Splitter {
                children, sizes, ..
            } => {
                if let Some(index) = children.iter().position(|&c| c == leaf) {
                    children.remove(index);
                    if index < sizes.len() {
                        sizes.remove(index);
                    }
                }
                if children.len() == 1 {
                    Some(children[0])
                } else {
                    None
                }
            }
            NodeKind::Leaf(_) => None,
        };

        match survivor {
            Some(child) => {
                let grandparent = self.node(parent).parent;
                self.node_mut(child).parent = grandparent;
                match grandparent {
                    Some(g) => self.replace_child(g, parent, child),
                    None => self.root = Some(child),
                }
                self.release(parent);
                Ok(Removal::Collapsed)
            }
            None => {
                self.redistribute(parent);
                Ok(Removal::Shrunk)
            }
        }
    }

    /// Next pane after `pane` in depth-first order, wrapping around
    pub fn next_pane(&self, pane: PaneId) -> Option<PaneId> {
        let panes = self.panes();
        let pos = panes.iter().position(|&p| p == pane)?;
        Some(panes[(pos + 1) % panes.len()])
    }

    /// Previous pane before `pane` in depth-first order, wrapping around
    pub fn prev_pane(&self, pane: PaneId) -> Option<PaneId> {
        let panes = self.panes();
        let pos = panes.iter().position(|&p| p == pane)?;
        let prev = if pos == 0 { panes.len() } else { pos } - 1;
        Some(panes[prev])
    }

    /// Verify structural invariants, describing the first violation found
    pub fn check_invariants(&self) -> Result<(), String> {
        let Some(root) = self.root else {
            return if self.leaves.is_empty() {
                Ok(())
            } else {
                Err("empty tree still maps panes".to_string())
            };
        };
        if self.node(root).parent.is_some() {
            return Err("root has a parent".to_string());
        }
        let mut seen = 0;
        self.check_node(root, &mut seen)?;
        if seen != self.leaves.len() {
            return Err(format!(
                "{} reachable leaves but {} mapped panes",
                seen,
                self.leaves.len()
            ));
        }
        Ok(())
    }

    fn check_node(&self, id: NodeId, leaves: &mut usize) -> Result<(), String> {
        match &self.node(id).kind {
            NodeKind::Leaf(pane) => {
                if self.leaves.get(pane) != Some(&id) {
                    return Err(format!("leaf for {} is not mapped", pane));
                }
                *leaves += 1;
                Ok(())
            }
            NodeKind::Splitter {
                children, sizes, ..
            } => {
                if children.len() < 2 {
                    return Err(format!("splitter with {} children", children.len()));
                }
                if sizes.len() != children.len() {
                    return Err("sizes out of step with children".to_string());
                }
                if sizes.iter().sum::<u32>() != self.extent {
                    return Err(format!("sizes {:?} do not sum to {}", sizes, self.extent));
                }
                for &child in children {
                    if self.node(child).parent != Some(id) {
                        return Err("child does not point back to its splitter".to_string());
                    }
                    self.check_node(child, leaves)?;
                }
                Ok(())
            }
        }
    }

    /// Share the extent evenly among a splitter's children, remainder to the last
    fn redistribute(&mut self, id: NodeId) {
        let extent = self.extent;
        if let NodeKind::Splitter {
            children, sizes, ..
        } = &mut self.node_mut(id).kind
        {
            let count = children.len().max(1) as u32;
            let base = extent / count;
            *sizes = vec![base; children.len()];
            if let Some(last) = sizes.last_mut() {
                *last += extent % count;
            }
        }
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if let NodeKind::Splitter { children, .. } = &mut self.node_mut(parent).kind {
            if let Some(slot) = children.iter_mut().find(|c| **c == old) {
                *slot = new;
            }
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id.0] = None;
        self.free.push(id.0);
    }

    // Node ids never escape this module and are released exactly once, so a
    // lookup of a live id cannot miss.
    fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.0) {
            Some(Some(node)) => node,
            _ => unreachable!("split tree node {} is not live", id.0),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => unreachable!("split tree node {} is not live", id.0),
        }
    }
}
