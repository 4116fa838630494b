use super::executor::{ExecOptions, GitExecutor};
use super::Repository;
use crate::errors::Result;
use tracing::debug;

/// Working-directory status of a changed file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingFileStatus {
    Untracked,
    New,
    Modified,
    Deleted,
}

/// A changed file in the working directory and whether all of its changes
/// are selected for the next snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingFileChange {
    pub path: String,
    pub status: WorkingFileStatus,
    pub include_all: bool,
}

impl WorkingFileChange {
    pub fn new<S: Into<String>>(path: S, status: WorkingFileStatus) -> Self {
        Self {
            path: path.into(),
            status,
            include_all: false,
        }
    }

    pub fn untracked<S: Into<String>>(path: S) -> Self {
        Self::new(path, WorkingFileStatus::Untracked)
    }

    pub fn with_include_all(mut self, include_all: bool) -> Self {
        self.include_all = include_all;
        self
    }
}

/// Marks working-directory files as fully included before a snapshot is taken
pub trait FileStager {
    fn stage(
        &self,
        git: &dyn GitExecutor,
        repository: &Repository,
        files: &[WorkingFileChange],
    ) -> Result<()>;
}

/// Stages fully-included files with `git add`
#[derive(Debug, Clone, Copy, Default)]
pub struct GitAddStager;

impl FileStager for GitAddStager {
    fn stage(
        &self,
        git: &dyn GitExecutor,
        repository: &Repository,
        files: &[WorkingFileChange],
    ) -> Result<()> {
        let paths: Vec<&str> = files
            .iter()
            .filter(|f| f.include_all)
            .map(|f| f.path.as_str())
            .collect();

        if paths.is_empty() {
            return Ok(());
        }

        let mut args = vec!["add", "--"];
        args.extend(paths.iter().copied());

        git.run(&args, repository.path(), "stageFiles", &ExecOptions::default())?;
        debug!("Staged {} file(s) in full", paths.len());
        Ok(())
    }
}
