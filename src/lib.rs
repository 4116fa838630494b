pub mod cli;
pub mod config;
pub mod errors;
pub mod git;
pub mod stash;

pub use errors::{Result, StashError};
pub use stash::StashManager;
