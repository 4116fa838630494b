pub mod config;
pub mod stash;
