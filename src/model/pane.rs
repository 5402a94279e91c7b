//! A pane: one viewport onto a document
//!
//! The document binding, clone group, and containing view are associations in
//! the graph; the pane itself only carries what the viewport owns.

#[derive(Debug, Clone, Default)]
pub struct Pane {
    /// Content copy displayed in this viewport
    pub text: String,
    /// Logical clock value of the last time this pane received focus
    pub focus_tick: u64,
}

impl Pane {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            focus_tick: 0,
        }
    }
}
