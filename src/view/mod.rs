pub mod split;
pub mod view;
