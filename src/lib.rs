// Editor core library - exposes the window server and its building blocks

pub mod app;
pub mod config;
pub mod model;
pub mod services;
pub mod view;

pub use app::{OpenMode, OpenOutcome, ServerError, WindowAction, WindowServer};
pub use config::Config;
