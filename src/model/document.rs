//! Document identity and modification state

use std::path::{Path, PathBuf};

/// How a document is identified
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentIdentity {
    /// Canonical path of the backing file
    File(PathBuf),
    /// Reserved placeholder name for a document that was never saved
    Placeholder(String),
}

impl DocumentIdentity {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Name shown to the user in titles and prompts
    pub fn display_name(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Placeholder(name) => name.clone(),
        }
    }
}

/// Last thing the file watcher told us about the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiskState {
    #[default]
    InSync,
    Altered,
    Removed,
}

/// An in-memory buffer identity shared by every pane that displays it
///
/// The modification flag lives here rather than on the panes, so all clones
/// of a document always report the same state.
#[derive(Debug, Clone)]
pub struct Document {
    pub identity: DocumentIdentity,
    pub modified: bool,
    pub exists_on_disk: bool,
    pub disk_state: DiskState,
}

impl Document {
    pub fn placeholder(name: String) -> Self {
        Self {
            identity: DocumentIdentity::Placeholder(name),
            modified: false,
            exists_on_disk: false,
            disk_state: DiskState::InSync,
        }
    }

    pub fn file(path: PathBuf, exists_on_disk: bool) -> Self {
        Self {
            identity: DocumentIdentity::File(path),
            modified: false,
            exists_on_disk,
            disk_state: DiskState::InSync,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.identity.path()
    }

    pub fn display_name(&self) -> String {
        self.identity.display_name()
    }

    pub fn is_placeholder(&self) -> bool {
        self.identity.is_placeholder()
    }
}
