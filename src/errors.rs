use crate::git::executor::GitErrorKind;
use crate::stash::sequencer::MoveState;
use std::fmt;

/// The stash operation a mutation failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StashOperation {
    Create,
    Move,
    Pop,
    Drop,
    Show,
}

impl fmt::Display for StashOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StashOperation::Create => "create",
            StashOperation::Move => "move",
            StashOperation::Pop => "pop",
            StashOperation::Drop => "drop",
            StashOperation::Show => "show",
        };
        f.write_str(name)
    }
}

/// Everything needed to reconstruct a failed git invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub label: String,
    pub args: Vec<String>,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub kind: Option<GitErrorKind>,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`git {}` ({}) exited with code {}",
            self.args.join(" "),
            self.label,
            self.exit_code
        )?;
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            write!(f, ": {stderr}")?;
        }
        Ok(())
    }
}

/// Stashkeep Error Types
#[derive(Debug, thiserror::Error)]
pub enum StashError {
    /// Repository discovery errors
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// I/O errors (the git process could not be started)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A git invocation exited with a code that was not allowed
    #[error("Git command failed: {0}")]
    Command(CommandFailure),

    /// Reading the stash list failed
    #[error("Could not read stash list: {0}")]
    Read(CommandFailure),

    /// A mutating stash operation failed
    #[error("Stash {operation} failed: {failure}")]
    Mutation {
        operation: StashOperation,
        failure: CommandFailure,
    },

    /// The stash log could not be parsed
    #[error("Malformed stash log: {0}")]
    Parse(String),

    /// A move stopped part-way; `reached` is the last step that completed
    #[error("Moving stash {stash_sha} to '{branch}' stopped at {reached}: {source}")]
    Move {
        stash_sha: String,
        branch: String,
        reached: MoveState,
        #[source]
        source: Box<StashError>,
    },
}

impl StashError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        StashError::Config(msg.into())
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        StashError::Parse(msg.into())
    }

    /// Re-tag a raw executor failure as a stash list read failure
    pub fn into_read(self) -> Self {
        match self {
            StashError::Command(failure) => StashError::Read(failure),
            other => other,
        }
    }

    /// Re-tag a raw executor failure as a failure of `operation`
    pub fn during(self, operation: StashOperation) -> Self {
        match self {
            StashError::Command(failure) => StashError::Mutation { operation, failure },
            other => other,
        }
    }

    /// The failed git invocation behind this error, if there is one
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self {
            StashError::Command(failure)
            | StashError::Read(failure)
            | StashError::Mutation { failure, .. } => Some(failure),
            StashError::Move { source, .. } => source.command_failure(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StashError>;
