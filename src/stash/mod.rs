//! Branch-owned stash entries: reading the stash reflog, recognising the
//! entries stashkeep created, and mutating them safely.

pub mod catalog;
pub mod marker;
pub mod parser;
pub mod sequencer;

pub use catalog::{
    find_latest_owned_for_branch, find_owned_by_sha, list_entries, StashEntry, StashList,
    StashedFiles,
};
pub use marker::{
    create_moved_stash_message, create_stash_message, extract_branch_from_message,
    is_owned_message, STASH_MARKER, STASH_MESSAGE_PATTERN,
};
pub use parser::{parse_stash_log, LogRecord, ParsedStashLog, RawStashRecord};
pub use sequencer::{CreateOutcome, DropOutcome, MoveState, PopOutcome, StashManager};
