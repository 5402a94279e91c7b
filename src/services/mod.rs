//! Collaborators the editor core talks to: filesystem, dialogs, and the
//! background autosave and file-watch workers.

pub mod async_bridge;
pub mod autosave;
pub mod dialogs;
pub mod file_watch;
pub mod fs;
