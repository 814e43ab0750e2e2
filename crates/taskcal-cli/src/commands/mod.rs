pub mod apply;
pub mod auth;
pub mod completions;
pub mod config;
pub mod events;
pub mod history;
pub mod plan;
pub mod undo;
