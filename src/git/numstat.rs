use crate::errors::{Result, StashError};

/// How a file changed between two commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
    Unmerged,
}

impl FileStatus {
    fn from_raw(code: &str) -> Option<Self> {
        match code.chars().next()? {
            'A' => Some(FileStatus::Added),
            'M' => Some(FileStatus::Modified),
            'D' => Some(FileStatus::Deleted),
            'R' => Some(FileStatus::Renamed),
            'C' => Some(FileStatus::Copied),
            'T' => Some(FileStatus::TypeChanged),
            'U' => Some(FileStatus::Unmerged),
            _ => None,
        }
    }

    fn has_two_paths(self) -> bool {
        matches!(self, FileStatus::Renamed | FileStatus::Copied)
    }
}

/// A file changed by a commit, relative to one of its parents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedFileChange {
    pub path: String,
    /// Source path of a rename or copy
    pub old_path: Option<String>,
    pub status: FileStatus,
    /// `None` for binary files
    pub additions: Option<u32>,
    pub deletions: Option<u32>,
    pub commitish: String,
    pub parent_commitish: String,
}

/// Turns raw diff output into file-change records
pub trait ChangedFilesParser {
    fn parse(
        &self,
        raw: &str,
        commitish: &str,
        parent_commitish: &str,
    ) -> Result<Vec<CommittedFileChange>>;
}

/// Parser for `--raw --numstat -z` output
#[derive(Debug, Clone, Copy, Default)]
pub struct RawNumstatParser;

impl ChangedFilesParser for RawNumstatParser {
    fn parse(
        &self,
        raw: &str,
        commitish: &str,
        parent_commitish: &str,
    ) -> Result<Vec<CommittedFileChange>> {
        let mut files: Vec<CommittedFileChange> = Vec::new();
        let mut tokens = raw.split('\0');

        while let Some(token) = tokens.next() {
            let token = token.trim_start_matches('\n');
            if token.is_empty() {
                continue;
            }

            if let Some(meta) = token.strip_prefix(':') {
                let code = meta.split_whitespace().last().unwrap_or_default();
                let status = FileStatus::from_raw(code).ok_or_else(|| {
                    StashError::parse(format!("unknown file status '{code}' in raw diff"))
                })?;

                let (old_path, path) = if status.has_two_paths() {
                    let old = next_path(&mut tokens, token)?;
                    let new = next_path(&mut tokens, token)?;
                    (Some(old), new)
                } else {
                    (None, next_path(&mut tokens, token)?)
                };

                files.push(CommittedFileChange {
                    path,
                    old_path,
                    status,
                    additions: None,
                    deletions: None,
                    commitish: commitish.to_string(),
                    parent_commitish: parent_commitish.to_string(),
                });
                continue;
            }

            let mut parts = token.splitn(3, '\t');
            let (Some(added), Some(deleted), Some(path)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(StashError::parse(format!(
                    "unexpected diff record '{token}'"
                )));
            };

            let path = if path.is_empty() {
                // rename: old and new path follow as separate records
                next_path(&mut tokens, token)?;
                next_path(&mut tokens, token)?
            } else {
                path.to_string()
            };

            if let Some(file) = files.iter_mut().find(|f| f.path == path) {
                file.additions = added.parse().ok();
                file.deletions = deleted.parse().ok();
            }
        }

        Ok(files)
    }
}

fn next_path<'a>(tokens: &mut impl Iterator<Item = &'a str>, record: &str) -> Result<String> {
    match tokens.next() {
        Some(path) if !path.is_empty() => Ok(path.to_string()),
        _ => Err(StashError::parse(format!(
            "missing path after diff record '{record}'"
        ))),
    }
}
