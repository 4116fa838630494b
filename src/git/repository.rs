use super::staging::WorkingFileChange;
use super::Repository;
use crate::errors::{Result, StashError};
use std::path::{Path, PathBuf};

/// Read-only libgit2 view of a working directory: current branch and
/// untracked files, used to decide what goes into a new stash
pub struct GitRepository {
    repo: git2::Repository,
    path: PathBuf,
}

impl GitRepository {
    /// Open a Git repository at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let repo = git2::Repository::discover(path)
            .map_err(|e| StashError::config(format!("Not a git repository: {}", e)))?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| StashError::config("Repository has no working directory"))?
            .to_path_buf();

        Ok(Self {
            repo,
            path: workdir,
        })
    }

    /// Get the current branch name
    pub fn get_current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| StashError::config(format!("Could not get HEAD: {}", e)))?;

        if !head.is_branch() {
            return Err(StashError::config(
                "HEAD is detached; pass a branch name explicitly",
            ));
        }

        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| StashError::config("Branch name is not valid UTF-8"))
    }

    /// Get list of untracked files
    pub fn get_untracked_files(&self) -> Result<Vec<WorkingFileChange>> {
        let mut options = git2::StatusOptions::new();
        options.include_untracked(true).recurse_untracked_dirs(true);

        let statuses = self.repo.statuses(Some(&mut options))?;

        let mut untracked = Vec::new();
        for status in statuses.iter() {
            if status.status().contains(git2::Status::WT_NEW) {
                if let Some(path) = status.path() {
                    untracked.push(WorkingFileChange::untracked(path));
                }
            }
        }

        Ok(untracked)
    }

    /// The plain repository handle stash operations run against
    pub fn handle(&self) -> Repository {
        Repository::new(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path().to_path_buf();

        for args in [
            vec!["init"],
            vec!["config", "user.name", "Test"],
            vec!["config", "user.email", "test@test.com"],
        ] {
            Command::new("git")
                .args(&args)
                .current_dir(&repo_path)
                .output()
                .unwrap();
        }

        std::fs::write(repo_path.join("README.md"), "# Test").unwrap();
        Command::new("git")
            .args(["add", "."])
            .current_dir(&repo_path)
            .output()
            .unwrap();
        Command::new("git")
            .args(["commit", "-m", "Initial commit"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        (temp_dir, repo_path)
    }

    #[test]
    fn test_current_branch() {
        let (_temp_dir, repo_path) = create_test_repo();
        Command::new("git")
            .args(["checkout", "-b", "feature-stash"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        let repo = GitRepository::open(&repo_path).unwrap();
        assert_eq!(repo.get_current_branch().unwrap(), "feature-stash");
    }

    #[test]
    fn test_untracked_files() {
        let (_temp_dir, repo_path) = create_test_repo();
        std::fs::create_dir(repo_path.join("docs")).unwrap();
        std::fs::write(repo_path.join("docs").join("new.md"), "new").unwrap();
        std::fs::write(repo_path.join("README.md"), "# Changed").unwrap();

        let repo = GitRepository::open(&repo_path).unwrap();
        let untracked = repo.get_untracked_files().unwrap();

        assert_eq!(untracked.len(), 1);
        assert_eq!(untracked[0].path, "docs/new.md");
        assert!(!untracked[0].include_all);
    }

    #[test]
    fn test_open_from_subdirectory_finds_workdir() {
        let (_temp_dir, repo_path) = create_test_repo();
        let nested = repo_path.join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let repo = GitRepository::open(&nested).unwrap();
        assert_eq!(
            repo.handle().path().canonicalize().unwrap(),
            repo_path.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_open_outside_repository_fails() {
        let temp_dir = TempDir::new().unwrap();
        let inner = temp_dir.path().join("x");
        std::fs::create_dir(&inner).unwrap();
        // a repository somewhere above the temp dir would be discovered
        if git2::Repository::discover(&inner).is_ok() {
            return;
        }
        assert!(matches!(
            GitRepository::open(&inner),
            Err(StashError::Config(_))
        ));
    }

    #[test]
    fn test_detached_head_has_no_branch() {
        let (_temp_dir, repo_path) = create_test_repo();
        Command::new("git")
            .args(["checkout", "--detach"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        let repo = GitRepository::open(&repo_path).unwrap();
        assert!(repo.get_current_branch().is_err());
    }
}
