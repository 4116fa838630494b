use regex::Regex;
use std::sync::LazyLock;

/// Sentinel that tags a stash message as created by stashkeep
pub const STASH_MARKER: &str = "!!Stashkeep";

/// Grammar of an owned stash message: an optional `On <branch>: ` prefix
/// (added by `git stash push`), the marker, then the owning branch in angle
/// brackets at the end of the message.
pub const STASH_MESSAGE_PATTERN: &str = r"^(?:On [^:]+: )?!!Stashkeep<(.*)>$";

static STASH_MESSAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(STASH_MESSAGE_PATTERN).expect("stash message pattern is valid"));

/// Message for `git stash push`; git itself prefixes `On <branch>: `
pub fn create_stash_message(branch_name: &str) -> String {
    format!("{STASH_MARKER}<{branch_name}>")
}

/// Message for a stash stored directly with `git stash store`, matching what
/// `git stash push` would have recorded on that branch
pub fn create_moved_stash_message(branch_name: &str) -> String {
    format!("On {branch_name}: {}", create_stash_message(branch_name))
}

/// The owning branch encoded in a stash message, `None` for stashes created by
/// anything else or with an empty branch
pub fn extract_branch_from_message(message: &str) -> Option<&str> {
    STASH_MESSAGE_RE
        .captures(message)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|branch| !branch.is_empty())
}

/// Whether a stash message was written by stashkeep
pub fn is_owned_message(message: &str) -> bool {
    extract_branch_from_message(message).is_some()
}
