use super::catalog::{self, StashEntry, StashList};
use super::marker::{create_moved_stash_message, create_stash_message};
use crate::config::StashSettings;
use crate::errors::{CommandFailure, Result, StashError, StashOperation};
use crate::git::{
    ChangedFilesParser, CommittedFileChange, ExecOptions, FileStager, GitAddStager, GitErrorKind,
    GitExecutor, GitOutput, RawNumstatParser, Repository, WorkingFileChange,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// What `git stash push` prints when the working directory is clean
const NO_LOCAL_CHANGES: &str = "No local changes to save\n";

static ERROR_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^error: ").expect("error line pattern is valid"));

/// Result of creating a stash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Nothing to stash; the stash list is unchanged
    NoChanges,
}

impl CreateOutcome {
    pub fn created(self) -> bool {
        self == CreateOutcome::Created
    }
}

/// Result of popping a stash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopOutcome {
    /// Applied and removed by git
    Popped,
    /// Applied with conflicts left in the working directory; the entry was
    /// dropped explicitly
    PoppedWithConflicts,
    /// No owned entry with that sha
    NotFound,
}

/// Result of dropping a stash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Dropped,
    /// No owned entry with that sha; nothing was run
    AlreadyGone,
}

/// Progress through a move. A move that fails reports the last state it
/// reached: `Start` leaves the repository untouched, `CommitCreated` leaves an
/// unreachable commit behind, `Stored` leaves the stash duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveState {
    Start,
    CommitCreated { commit: String },
    Stored { commit: String },
    Dropped { commit: String },
}

impl MoveState {
    /// The re-created stash commit, once there is one
    pub fn commit(&self) -> Option<&str> {
        match self {
            MoveState::Start => None,
            MoveState::CommitCreated { commit }
            | MoveState::Stored { commit }
            | MoveState::Dropped { commit } => Some(commit),
        }
    }

    /// The original and new stash both exist
    pub fn is_duplicated(&self) -> bool {
        matches!(self, MoveState::Stored { .. })
    }
}

impl fmt::Display for MoveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveState::Start => write!(f, "start"),
            MoveState::CommitCreated { commit } => write!(f, "commit {commit} created"),
            MoveState::Stored { commit } => write!(f, "stash {commit} stored"),
            MoveState::Dropped { commit } => write!(f, "original dropped, now {commit}"),
        }
    }
}

/// Runs stash mutations against a repository
///
/// Every operation that needs a positional `stash@{N}` name resolves it from a
/// fresh read of the stash list immediately before use; entries passed in by
/// callers are only trusted for their sha, tree and parents.
pub struct StashManager<E: GitExecutor> {
    git: E,
    stager: Box<dyn FileStager>,
    files_parser: Box<dyn ChangedFilesParser>,
    settings: StashSettings,
}

impl<E: GitExecutor> StashManager<E> {
    pub fn new(git: E) -> Self {
        Self {
            git,
            stager: Box::new(GitAddStager),
            files_parser: Box::new(RawNumstatParser),
            settings: StashSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: StashSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_stager(mut self, stager: Box<dyn FileStager>) -> Self {
        self.stager = stager;
        self
    }

    pub fn with_files_parser(mut self, parser: Box<dyn ChangedFilesParser>) -> Self {
        self.files_parser = parser;
        self
    }

    pub fn executor(&self) -> &E {
        &self.git
    }

    /// All owned entries plus the total count, newest first
    pub fn list_entries(&self, repository: &Repository) -> Result<StashList> {
        catalog::list_entries(&self.git, repository)
    }

    pub fn find_owned_by_sha(
        &self,
        repository: &Repository,
        stash_sha: &str,
    ) -> Result<Option<StashEntry>> {
        catalog::find_owned_by_sha(&self.git, repository, stash_sha)
    }

    pub fn find_latest_owned_for_branch(
        &self,
        repository: &Repository,
        branch_name: &str,
    ) -> Result<Option<StashEntry>> {
        catalog::find_latest_owned_for_branch(&self.git, repository, branch_name)
    }

    /// Stash all local changes for `branch`, including `untracked_files`
    pub fn create(
        &self,
        repository: &Repository,
        branch: impl AsRef<str>,
        untracked_files: &[WorkingFileChange],
    ) -> Result<CreateOutcome> {
        let branch_name = branch.as_ref();

        // Untracked files only end up in the stash once they are fully staged
        let fully_included: Vec<WorkingFileChange> = untracked_files
            .iter()
            .cloned()
            .map(|file| file.with_include_all(true))
            .collect();
        self.stager
            .stage(&self.git, repository, &fully_included)
            .map_err(|e| e.during(StashOperation::Create))?;

        let message = create_stash_message(branch_name);
        let args = ["stash", "push", "-m", message.as_str()];
        let output = self
            .git
            .run(
                &args,
                repository.path(),
                "createStashEntry",
                &ExecOptions::with_success_codes([0, 1]),
            )
            .map_err(|e| e.during(StashOperation::Create))?;

        if output.exit_code == 1 {
            if ERROR_LINE_RE.is_match(&output.stderr) {
                return Err(StashError::Command(command_failure(
                    &args,
                    "createStashEntry",
                    output,
                ))
                .during(StashOperation::Create));
            }
            info!(
                "Stash created for '{}' but git exited with code 1: {}",
                branch_name,
                output.stderr.trim()
            );
        }

        if output.stdout == NO_LOCAL_CHANGES {
            debug!("Nothing to stash for '{}'", branch_name);
            return Ok(CreateOutcome::NoChanges);
        }

        info!("Created stash for '{}'", branch_name);
        Ok(CreateOutcome::Created)
    }

    /// Re-home `entry` on `branch_name`: recreate its commit with a new
    /// message, store that as a stash, then drop the original. Returns the
    /// sha of the new stash.
    pub fn move_to_branch(
        &self,
        repository: &Repository,
        entry: &StashEntry,
        branch_name: &str,
    ) -> Result<String> {
        let mut state = MoveState::Start;
        match self.advance_move(repository, entry, branch_name, &mut state) {
            Ok(()) => {
                info!(
                    "Moved stash {} to '{}' as {}",
                    entry.stash_sha,
                    branch_name,
                    state.commit().unwrap_or_default()
                );
                Ok(state.commit().unwrap_or_default().to_string())
            }
            Err(source) => {
                if state.is_duplicated() {
                    warn!(
                        "Stash {} is now duplicated: the moved copy was stored but the original could not be dropped",
                        entry.stash_sha
                    );
                }
                Err(StashError::Move {
                    stash_sha: entry.stash_sha.clone(),
                    branch: branch_name.to_string(),
                    reached: state,
                    source: Box::new(source),
                })
            }
        }
    }

    fn advance_move(
        &self,
        repository: &Repository,
        entry: &StashEntry,
        branch_name: &str,
        state: &mut MoveState,
    ) -> Result<()> {
        let message = create_moved_stash_message(branch_name);

        let mut args = vec!["commit-tree"];
        for parent in &entry.parents {
            args.push("-p");
            args.push(parent);
        }
        args.extend(["-m", message.as_str()]);
        if !self.settings.sign_moved_commits {
            args.push("--no-gpg-sign");
        }
        args.push(&entry.tree);

        let output = self
            .git
            .run(
                &args,
                repository.path(),
                "moveStashEntryToBranch",
                &ExecOptions::default(),
            )
            .map_err(|e| e.during(StashOperation::Move))?;
        let commit = output.stdout.trim().to_string();
        if commit.is_empty() {
            return Err(StashError::parse("commit-tree printed no commit id"));
        }
        *state = MoveState::CommitCreated {
            commit: commit.clone(),
        };
        debug!("Move of {}: {}", entry.stash_sha, state);

        self.git
            .run(
                &["stash", "store", "-m", message.as_str(), commit.as_str()],
                repository.path(),
                "moveStashEntryToBranch",
                &ExecOptions::default(),
            )
            .map_err(|e| e.during(StashOperation::Move))?;
        *state = MoveState::Stored {
            commit: commit.clone(),
        };
        debug!("Move of {}: {}", entry.stash_sha, state);

        if self.drop(repository, &entry.stash_sha)? == DropOutcome::AlreadyGone {
            warn!(
                "Original stash {} disappeared during the move",
                entry.stash_sha
            );
        }
        *state = MoveState::Dropped { commit };
        Ok(())
    }

    /// Apply and remove the owned stash with `stash_sha`
    pub fn pop(&self, repository: &Repository, stash_sha: &str) -> Result<PopOutcome> {
        let Some(entry) = self.find_owned_by_sha(repository, stash_sha)? else {
            debug!("No owned stash {} to pop", stash_sha);
            return Ok(PopOutcome::NotFound);
        };

        let args = ["stash", "pop", "--quiet", entry.name.as_str()];
        // Conflicts are resolved elsewhere; here they are part of a normal pop
        let options =
            ExecOptions::with_success_codes([0, 1]).expecting([GitErrorKind::MergeConflicts]);
        let output = self
            .git
            .run(&args, repository.path(), "popStashEntry", &options)
            .map_err(|e| e.during(StashOperation::Pop))?;

        if output.exit_code == 0 {
            info!("Popped stash {}", stash_sha);
            return Ok(PopOutcome::Popped);
        }

        if !output.stderr.trim().is_empty() {
            return Err(
                StashError::Command(command_failure(&args, "popStashEntry", output))
                    .during(StashOperation::Pop),
            );
        }

        // git keeps a stash whose pop conflicted even though it was applied
        info!(
            "Stash {} applied with exit code {}; dropping it",
            stash_sha, output.exit_code
        );
        self.drop(repository, stash_sha)?;
        Ok(PopOutcome::PoppedWithConflicts)
    }

    /// Remove the owned stash with `stash_sha`; absent entries are a no-op
    pub fn drop(&self, repository: &Repository, stash_sha: &str) -> Result<DropOutcome> {
        let Some(entry) = self.find_owned_by_sha(repository, stash_sha)? else {
            debug!("No owned stash {} to drop", stash_sha);
            return Ok(DropOutcome::AlreadyGone);
        };

        self.git
            .run(
                &["stash", "drop", entry.name.as_str()],
                repository.path(),
                "dropStashEntry",
                &ExecOptions::default(),
            )
            .map_err(|e| e.during(StashOperation::Drop))?;

        info!("Dropped stash {} ({})", stash_sha, entry.name);
        Ok(DropOutcome::Dropped)
    }

    /// Files changed by a stash relative to its base commit, untracked files
    /// included, sorted by path
    pub fn list_changed_files(
        &self,
        repository: &Repository,
        entry: &StashEntry,
    ) -> Result<Vec<CommittedFileChange>> {
        let sha = entry.stash_sha.as_str();
        let base = entry
            .parents
            .first()
            .cloned()
            .unwrap_or_else(|| format!("{sha}^"));

        let output = self
            .git
            .run(
                &[
                    "stash",
                    "show",
                    sha,
                    "--raw",
                    "--numstat",
                    "-z",
                    "--format=format:",
                    "--no-show-signature",
                    "--",
                ],
                repository.path(),
                "getStashedFiles",
                &ExecOptions::default(),
            )
            .map_err(|e| e.during(StashOperation::Show))?;

        let mut files: BTreeMap<String, CommittedFileChange> = BTreeMap::new();
        for file in self.files_parser.parse(&output.stdout, sha, &base)? {
            files.insert(file.path.clone(), file);
        }

        if let Some(untracked) = entry.untracked_parent() {
            let output = self
                .git
                .run(
                    &[
                        "show",
                        untracked,
                        "--raw",
                        "--numstat",
                        "-z",
                        "--format=format:",
                        "--no-show-signature",
                        "--",
                    ],
                    repository.path(),
                    "getStashedUntrackedFiles",
                    &ExecOptions::default(),
                )
                .map_err(|e| e.during(StashOperation::Show))?;

            for file in self.files_parser.parse(&output.stdout, sha, untracked)? {
                files.insert(file.path.clone(), file);
            }
        }

        Ok(files.into_values().collect())
    }

    /// A copy of `entry` with its files loaded
    pub fn load_files(&self, repository: &Repository, entry: &StashEntry) -> Result<StashEntry> {
        let files = self.list_changed_files(repository, entry)?;
        Ok(entry.clone().with_files(files))
    }
}

fn command_failure(args: &[&str], label: &str, output: GitOutput) -> CommandFailure {
    CommandFailure {
        label: label.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        exit_code: output.exit_code,
        kind: GitErrorKind::classify(&output.stdout, &output.stderr),
        stdout: output.stdout,
        stderr: output.stderr,
    }
}
