//! Synchronous user queries the core needs answered
//!
//! The core never renders a dialog itself. It asks a [`Dialogs`]
//! implementation and branches on the answer; every query blocks until the
//! user decides.

use std::path::{Path, PathBuf};

/// Answer to "save changes to X before closing?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveChoice {
    Save,
    Discard,
    Cancel,
}

/// Answer to the single confirmation listing every modified document of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchChoice {
    SaveAll,
    DiscardAll,
    /// Save the named documents, discard the rest
    SaveSelected(Vec<String>),
    Cancel,
}

/// What the file watcher observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    Altered,
    Removed,
}

/// Answer to "the file changed on disk, what now?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChangeChoice {
    /// Replace the buffer with the disk contents
    Reload,
    /// Write the buffer back over the disk contents
    SaveAgain,
    /// Write the buffer to a different path and rebind the document to it
    SaveAs(PathBuf),
    /// Keep the buffer and stop complaining until the next change
    Ignore,
    /// Close every pane showing the document without saving
    Close,
}

pub trait Dialogs {
    /// Save/Discard/Cancel for a single modified document
    fn confirm_save(&mut self, name: &str) -> SaveChoice;

    /// One confirmation listing several modified documents
    fn confirm_batch(&mut self, names: &[String]) -> BatchChoice;

    /// Offer to create a file that does not exist yet
    fn confirm_create(&mut self, path: &Path) -> bool;

    /// The file is open in another window; move it here?
    fn confirm_move_here(&mut self, path: &Path) -> bool;

    fn file_changed(&mut self, name: &str, change: FileChange) -> FileChangeChoice;

    /// Pick a path for a document that has never been saved
    fn ask_save_path(&mut self, name: &str) -> Option<PathBuf>;

    /// Tell the user about a refusal or failure; no answer expected
    fn report(&mut self, message: &str);
}

/// Dialogs that never block: decline everything and log reports
///
/// Useful for headless embedding where no user is around to answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessDialogs;

impl Dialogs for HeadlessDialogs {
    fn confirm_save(&mut self, _name: &str) -> SaveChoice {
        SaveChoice::Cancel
    }

    fn confirm_batch(&mut self, _names: &[String]) -> BatchChoice {
        BatchChoice::Cancel
    }

    fn confirm_create(&mut self, _path: &Path) -> bool {
        false
    }

    fn confirm_move_here(&mut self, _path: &Path) -> bool {
        false
    }

    fn file_changed(&mut self, _name: &str, _change: FileChange) -> FileChangeChoice {
        FileChangeChoice::Ignore
    }

    fn ask_save_path(&mut self, _name: &str) -> Option<PathBuf> {
        None
    }

    fn report(&mut self, message: &str) {
        tracing::warn!("{}", message);
    }
}
