use crate::model::ids::{Orientation, PaneId, ViewId, WindowId};
use crate::view::split::SplitError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

/// Where a file that is not open yet should go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Split the active view of the active window
    #[default]
    ActiveWindow,
    /// Create a fresh window holding only the file
    NewWindow,
}

/// Drop position for a pane dragged into another view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    /// Pane of the destination view to split
    pub pane: PaneId,
    pub orientation: Orientation,
}

/// Result of a successful `open`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The file was already open; its pane was raised
    Raised(PaneId),
    /// The file was loaded into this pane
    Loaded(PaneId),
}

impl OpenOutcome {
    pub fn pane(self) -> PaneId {
        match self {
            Self::Raised(pane) | Self::Loaded(pane) => pane,
        }
    }
}

/// Why a structural operation did not happen
///
/// Refusals and resource failures are reported to the user where they occur
/// and then returned for the caller's information. Only `Cancelled` aborts
/// an enclosing batch.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0} has clones; close the other panes showing this document first")]
    HasClones(PaneId),

    #[error("operation cancelled")]
    Cancelled,

    #[error("file does not exist: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("{} is already open in another document", .0.display())]
    AlreadyOpen(PathBuf),

    #[error("could not create {}: {source}", path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not save {name}: {source}")]
    SaveFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("unknown pane {0}")]
    UnknownPane(PaneId),

    #[error("unknown view {0}")]
    UnknownView(ViewId),

    #[error("unknown window {0}")]
    UnknownWindow(WindowId),

    #[error("no window is open")]
    NoWindow,

    #[error(transparent)]
    Split(#[from] SplitError),
}

impl ServerError {
    /// Whether the user asked to stop; enclosing batches must abort
    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
