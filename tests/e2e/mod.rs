// Workflow tests grouped by feature
pub mod batch_close;
pub mod detach_reparent;
pub mod split_view;
pub mod window_actions;
