use super::marker::extract_branch_from_message;
use super::parser::{parse_stash_log, RawStashRecord, STASH_LOG_FORMAT};
use crate::errors::{CommandFailure, Result, StashError};
use crate::git::{CommittedFileChange, ExecOptions, GitErrorKind, GitExecutor, Repository};
use tracing::debug;

/// Exit code of `git log` when `refs/stash` does not exist yet. Other fatal
/// errors share it, so the stderr must also name an unknown revision.
const NO_STASH_REFLOG_EXIT_CODE: i32 = 128;

/// File-level detail of a stash, fetched only on request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StashedFiles {
    #[default]
    NotLoaded,
    Loaded(Vec<CommittedFileChange>),
}

/// A stash entry created by stashkeep
///
/// `name` is the positional reflog selector (`stash@{N}`) and is only valid
/// until the next mutation of the stash list; `stash_sha` is the stable
/// identity to hold on to between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    pub name: String,
    pub stash_sha: String,
    pub branch_name: String,
    pub tree: String,
    pub parents: Vec<String>,
    pub files: StashedFiles,
}

impl StashEntry {
    /// Build an entry from a raw record when its message carries the marker
    pub fn from_record(record: RawStashRecord) -> Option<Self> {
        let branch_name = extract_branch_from_message(&record.message)?.to_string();
        Some(Self {
            name: record.name,
            stash_sha: record.stash_sha,
            branch_name,
            tree: record.tree,
            parents: record.parents,
            files: StashedFiles::NotLoaded,
        })
    }

    /// Parent holding the untracked files, present for `--include-untracked` stashes
    pub fn untracked_parent(&self) -> Option<&str> {
        self.parents.get(2).map(String::as_str)
    }

    pub fn with_files(mut self, files: Vec<CommittedFileChange>) -> Self {
        self.files = StashedFiles::Loaded(files);
        self
    }
}

/// One read of the stash list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StashList {
    /// Owned entries, most recently created first
    pub owned_entries: Vec<StashEntry>,
    /// All entries, owned or not
    pub total_entry_count: usize,
}

impl StashList {
    pub fn find_by_sha(&self, stash_sha: &str) -> Option<&StashEntry> {
        self.owned_entries.iter().find(|e| e.stash_sha == stash_sha)
    }

    /// First match is the newest: entries keep reflog order
    pub fn latest_for_branch(&self, branch_name: &str) -> Option<&StashEntry> {
        self.owned_entries
            .iter()
            .find(|e| e.branch_name == branch_name)
    }

    pub fn foreign_entry_count(&self) -> usize {
        self.total_entry_count - self.owned_entries.len()
    }
}

/// Read the stash reflog of `repository`
pub fn list_entries(git: &dyn GitExecutor, repository: &Repository) -> Result<StashList> {
    let pretty = format!("--pretty=tformat:{STASH_LOG_FORMAT}");
    let args = ["log", "-g", "-z", pretty.as_str(), "refs/stash"];

    let output = git
        .run(
            &args,
            repository.path(),
            "getStashEntries",
            &ExecOptions::with_success_codes([0, NO_STASH_REFLOG_EXIT_CODE]),
        )
        .map_err(|e| e.into_read())?;

    if output.exit_code == NO_STASH_REFLOG_EXIT_CODE {
        let kind = GitErrorKind::classify(&output.stdout, &output.stderr);
        if kind != Some(GitErrorKind::BadRevision) {
            return Err(StashError::Read(CommandFailure {
                label: "getStashEntries".to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
                kind,
            }));
        }
        debug!("No stash reflog in {}", repository.path().display());
        return Ok(StashList::default());
    }

    let log = parse_stash_log(&output.stdout)?;
    let total_entry_count = log.entry_count();
    let owned_entries: Vec<StashEntry> = log
        .into_stashes()
        .filter_map(StashEntry::from_record)
        .collect();

    debug!(
        "Found {} owned stash entries out of {}",
        owned_entries.len(),
        total_entry_count
    );

    Ok(StashList {
        owned_entries,
        total_entry_count,
    })
}

/// The owned entry with the given commit, re-read from the live list
pub fn find_owned_by_sha(
    git: &dyn GitExecutor,
    repository: &Repository,
    stash_sha: &str,
) -> Result<Option<StashEntry>> {
    let list = list_entries(git, repository)?;
    Ok(list.find_by_sha(stash_sha).cloned())
}

/// The most recent owned entry for `branch_name`
pub fn find_latest_owned_for_branch(
    git: &dyn GitExecutor,
    repository: &Repository,
    branch_name: &str,
) -> Result<Option<StashEntry>> {
    let list = list_entries(git, repository)?;
    Ok(list.latest_for_branch(branch_name).cloned())
}
