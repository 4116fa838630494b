pub mod executor;
pub mod numstat;
pub mod repository;
pub mod staging;

pub use executor::{ExecOptions, GitCli, GitErrorKind, GitExecutor, GitOutput};
pub use numstat::{ChangedFilesParser, CommittedFileChange, FileStatus, RawNumstatParser};
pub use repository::GitRepository;
pub use staging::{FileStager, GitAddStager, WorkingFileChange, WorkingFileStatus};

use std::path::{Path, PathBuf};

/// A repository working directory that git commands run against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    path: PathBuf,
}

impl Repository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
