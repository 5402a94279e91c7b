//! Filesystem access used by the editor core
//!
//! Everything the core does on disk goes through [`FileSystem`], so tests and
//! embedders can substitute their own backend.

mod local;

pub use local::LocalFileSystem;

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Create an empty file; fails if the parent directory is missing
    fn create_empty(&self, path: &Path) -> io::Result<()>;

    /// Modification time, or None when the platform does not report one
    fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;
}
