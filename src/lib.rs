pub mod ai;
pub mod board;
pub mod config;
pub mod sound;
pub mod store;
pub mod tui;

/// Build version, set by `build.rs`.
pub const VERSION: &str = env!("ACTIONBOARD_VERSION");
