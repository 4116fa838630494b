use crate::config::GitSettings;
use crate::errors::{CommandFailure, Result, StashError};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Known categories of git failure, recognised from the command output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GitErrorKind {
    MergeConflicts,
    LocalChangesOverwritten,
    NotAGitRepository,
    BadRevision,
    LockFileExists,
    NoStashEntries,
}

impl GitErrorKind {
    /// Classify a failed invocation from its stderr, falling back to stdout
    /// (conflict reports are written to stdout).
    pub fn classify(stdout: &str, stderr: &str) -> Option<Self> {
        Self::from_text(stderr).or_else(|| Self::from_text(stdout))
    }

    fn from_text(text: &str) -> Option<Self> {
        if text.contains("CONFLICT (") || text.contains("Automatic merge failed") {
            Some(GitErrorKind::MergeConflicts)
        } else if text.contains("Your local changes to the following files would be overwritten")
        {
            Some(GitErrorKind::LocalChangesOverwritten)
        } else if text.contains("not a git repository") {
            Some(GitErrorKind::NotAGitRepository)
        } else if text.contains("bad revision") || text.contains("unknown revision") {
            Some(GitErrorKind::BadRevision)
        } else if text.contains(".lock': File exists") {
            Some(GitErrorKind::LockFileExists)
        } else if text.contains("No stash entries found") || text.contains("is not a valid reference")
        {
            Some(GitErrorKind::NoStashEntries)
        } else {
            None
        }
    }
}

/// Captured result of one git invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Which non-zero outcomes a caller is prepared to handle itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOptions {
    pub success_exit_codes: BTreeSet<i32>,
    pub expected_errors: BTreeSet<GitErrorKind>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            success_exit_codes: BTreeSet::from([0]),
            expected_errors: BTreeSet::new(),
        }
    }
}

impl ExecOptions {
    pub fn with_success_codes(codes: impl IntoIterator<Item = i32>) -> Self {
        Self {
            success_exit_codes: codes.into_iter().collect(),
            expected_errors: BTreeSet::new(),
        }
    }

    pub fn expecting(mut self, errors: impl IntoIterator<Item = GitErrorKind>) -> Self {
        self.expected_errors.extend(errors);
        self
    }

    /// Apply the exit policy: allow-listed codes pass, then anything explained
    /// by an expected error category, everything else is fatal.
    pub fn check(&self, output: GitOutput, args: &[&str], label: &str) -> Result<GitOutput> {
        if self.success_exit_codes.contains(&output.exit_code) {
            return Ok(output);
        }

        let kind = GitErrorKind::classify(&output.stdout, &output.stderr);
        if let Some(kind) = kind {
            if self.expected_errors.contains(&kind) {
                debug!(
                    "{}: tolerating expected {:?} (exit code {})",
                    label, kind, output.exit_code
                );
                return Ok(output);
            }
        }

        Err(StashError::Command(CommandFailure {
            label: label.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            kind,
        }))
    }
}

/// Runs git against a repository path
pub trait GitExecutor {
    /// Invoke git and capture its output, whatever the exit code
    fn spawn(&self, args: &[&str], path: &Path, label: &str) -> Result<GitOutput>;

    /// Invoke git and apply the exit policy in `options`
    fn run(
        &self,
        args: &[&str],
        path: &Path,
        label: &str,
        options: &ExecOptions,
    ) -> Result<GitOutput> {
        let output = self.spawn(args, path, label)?;
        options.check(output, args, label)
    }
}

/// Executor backed by the `git` binary
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: PathBuf,
    environment: BTreeMap<String, String>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("git"),
            environment: BTreeMap::new(),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &GitSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
            environment: settings.environment.clone(),
        }
    }
}

impl GitExecutor for GitCli {
    fn spawn(&self, args: &[&str], path: &Path, label: &str) -> Result<GitOutput> {
        debug!("{}: git {} (in {})", label, args.join(" "), path.display());

        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .envs(&self.environment)
            .stdin(Stdio::null())
            .output()?;

        // Killed by a signal
        let exit_code = output.status.code().unwrap_or(-1);
        debug!("{}: exit code {}", label, exit_code);

        Ok(GitOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
