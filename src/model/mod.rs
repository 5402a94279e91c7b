pub mod association;
pub mod document;
pub mod ids;
pub mod name_pool;
pub mod pane;
