//! Parsing of `git log -g` output for the stash reflog.
//!
//! Records are NUL-terminated and their fields separated by the ASCII unit
//! separator, so subjects containing newlines or tabs survive intact.

use crate::errors::{Result, StashError};

/// Separator between fields of one record
pub const FIELD_SEPARATOR: char = '\u{1f}';

/// Terminator after each record
pub const RECORD_TERMINATOR: char = '\0';

/// `--pretty` format producing one record per stash: reflog selector, commit,
/// reflog subject, tree, parents
pub const STASH_LOG_FORMAT: &str = "%gd%x1f%H%x1f%gs%x1f%T%x1f%P";

/// One stash reflog record, fields as git printed them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStashRecord {
    pub name: String,
    pub stash_sha: String,
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

/// A record of the stream: a real stash, or the synthetic trailer that
/// follows the last terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Stash(RawStashRecord),
    Trailer,
}

/// Ordered records of one stash log, newest first, trailer last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStashLog {
    pub records: Vec<LogRecord>,
}

impl ParsedStashLog {
    /// Number of stash entries (the trailer excluded)
    pub fn entry_count(&self) -> usize {
        self.records.len().saturating_sub(1)
    }

    pub fn stashes(&self) -> impl Iterator<Item = &RawStashRecord> {
        self.records.iter().filter_map(|record| match record {
            LogRecord::Stash(stash) => Some(stash),
            LogRecord::Trailer => None,
        })
    }

    pub fn into_stashes(self) -> impl Iterator<Item = RawStashRecord> {
        self.records.into_iter().filter_map(|record| match record {
            LogRecord::Stash(stash) => Some(stash),
            LogRecord::Trailer => None,
        })
    }
}

/// Parse the raw stash log stream
pub fn parse_stash_log(stream: &str) -> Result<ParsedStashLog> {
    let mut segments: Vec<&str> = stream.split(RECORD_TERMINATOR).collect();

    // split always yields at least one segment: whatever follows the last terminator
    let trailer = segments.pop().unwrap_or_default();
    if !trailer.trim().is_empty() {
        return Err(StashError::parse(format!(
            "stash log ended without a record terminator: {:?}",
            trailer
        )));
    }

    let mut records = segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| parse_record(index, segment).map(LogRecord::Stash))
        .collect::<Result<Vec<_>>>()?;
    records.push(LogRecord::Trailer);

    Ok(ParsedStashLog { records })
}

fn parse_record(index: usize, segment: &str) -> Result<RawStashRecord> {
    // git separates -z records with a newline in some versions
    let segment = segment.trim_start_matches('\n');
    let fields: Vec<&str> = segment.split(FIELD_SEPARATOR).collect();

    let [name, stash_sha, message, tree, parents] = fields.as_slice() else {
        return Err(StashError::parse(format!(
            "record {} has {} field(s), expected 5: {:?}",
            index,
            fields.len(),
            segment
        )));
    };

    for (field, value) in [("name", name), ("commit", stash_sha), ("tree", tree)] {
        if value.trim().is_empty() {
            return Err(StashError::parse(format!(
                "record {} has an empty {} field",
                index, field
            )));
        }
    }

    Ok(RawStashRecord {
        name: name.to_string(),
        stash_sha: stash_sha.to_string(),
        message: message.to_string(),
        tree: tree.to_string(),
        parents: parents.split_whitespace().map(str::to_string).collect(),
    })
}
