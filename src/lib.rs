pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod format;
pub mod forms;
pub mod share;
pub mod store;
