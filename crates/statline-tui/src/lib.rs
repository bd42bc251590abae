// Library root: re-exports all modules so integration tests and the binary
// can access the crate's public API.

pub mod app;
pub mod config;
pub mod protocol;
pub mod scheduler;
pub mod service;
pub mod source;
pub mod tui;
pub mod window;
pub mod ws_server;
