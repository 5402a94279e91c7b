//! Typed identifiers for every entity the editor core tracks.
//!
//! Identifiers are handed out by [`Registry`](super::association::Registry)
//! in increasing order and are never reused, so a stale id can only ever
//! miss; it can never alias a newer entity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::association::{Entity, EntityKind};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:expr, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub usize);

        impl Entity for $name {
            const KIND: EntityKind = $kind;

            fn raw(self) -> usize {
                self.0
            }

            fn from_raw(raw: usize) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Top-level window hosting one or more views
    WindowId,
    EntityKind::Window,
    "W"
);
entity_id!(
    /// A view: one split tree inside a window
    ViewId,
    EntityKind::View,
    "V"
);
entity_id!(
    /// A pane: leaf of a split tree, bound to exactly one document
    PaneId,
    EntityKind::Pane,
    "P"
);
entity_id!(
    /// An in-memory document (file-backed or placeholder)
    DocumentId,
    EntityKind::Document,
    "D"
);
entity_id!(
    /// Registration of a document with the autosave service
    AutosaveId,
    EntityKind::Autosave,
    "A"
);
entity_id!(
    /// Registration of a document's backing file with the file watcher
    WatchId,
    EntityKind::Watch,
    "F"
);

/// Direction of a split
///
/// `Horizontal` stacks panes left to right, `Vertical` stacks them top to
/// bottom.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Single-letter tag used in layout renderings and on the command line
    pub fn tag(self) -> char {
        match self {
            Self::Horizontal => 'H',
            Self::Vertical => 'V',
        }
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Ok(Self::Horizontal),
            "v" | "vertical" => Ok(Self::Vertical),
            other => Err(format!("unknown orientation '{}'", other)),
        }
    }
}
