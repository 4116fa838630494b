use crate::cli::output::{short_sha, Output};
use crate::config::load_settings;
use crate::errors::{Result, StashError};
use crate::git::{GitCli, GitRepository, Repository};
use crate::stash::{CreateOutcome, DropOutcome, PopOutcome, StashEntry, StashManager};
use clap::Subcommand;
use std::env;

#[derive(Subcommand)]
pub enum StashAction {
    /// List stashes created by stashkeep, newest first
    List {
        /// Only show stashes owned by this branch
        #[arg(long, short)]
        branch: Option<String>,
    },

    /// Show the files changed by a stash
    Show {
        /// Stash commit (a unique prefix is enough)
        stash: String,
    },

    /// Stash local changes for a branch
    Create {
        /// Owning branch (defaults to the current branch)
        #[arg(long, short)]
        branch: Option<String>,
        /// Also stash untracked files
        #[arg(long, short = 'u')]
        include_untracked: bool,
    },

    /// Give a stash to another branch
    Move {
        /// Stash commit (a unique prefix is enough)
        stash: String,
        /// Branch that should own the stash
        branch: String,
    },

    /// Apply a stash and remove it
    Pop {
        /// Stash commit (a unique prefix is enough)
        stash: String,
    },

    /// Remove a stash
    Drop {
        /// Stash commit (a unique prefix is enough)
        stash: String,
    },
}

/// Handle stash commands
pub fn run(action: StashAction) -> Result<()> {
    let current_dir = env::current_dir()
        .map_err(|e| StashError::config(format!("Could not get current directory: {e}")))?;
    let git_repo = GitRepository::open(&current_dir)?;
    let repository = git_repo.handle();

    let settings = load_settings()?;
    let manager =
        StashManager::new(GitCli::from_settings(&settings.git)).with_settings(settings.stash);

    match action {
        StashAction::List { branch } => list(&manager, &repository, branch.as_deref()),
        StashAction::Show { stash } => show(&manager, &repository, &stash),
        StashAction::Create {
            branch,
            include_untracked,
        } => {
            let branch = match branch {
                Some(branch) => branch,
                None => git_repo.get_current_branch()?,
            };
            let untracked = if include_untracked {
                git_repo.get_untracked_files()?
            } else {
                Vec::new()
            };

            match manager.create(&repository, &branch, &untracked)? {
                CreateOutcome::Created => Output::success(format!("Stashed changes for '{branch}'")),
                CreateOutcome::NoChanges => Output::info("No local changes to stash"),
            }
            Ok(())
        }
        StashAction::Move { stash, branch } => {
            let entry = resolve(&manager, &repository, &stash)?;
            let new_sha = manager.move_to_branch(&repository, &entry, &branch)?;
            Output::success(format!(
                "Moved stash {} from '{}' to '{}'",
                short_sha(&entry.stash_sha),
                entry.branch_name,
                branch
            ));
            Output::sub_item(format!("New stash commit: {}", short_sha(&new_sha)));
            Ok(())
        }
        StashAction::Pop { stash } => {
            let entry = resolve(&manager, &repository, &stash)?;
            match manager.pop(&repository, &entry.stash_sha)? {
                PopOutcome::Popped => {
                    Output::success(format!("Restored stash for '{}'", entry.branch_name))
                }
                PopOutcome::PoppedWithConflicts => {
                    Output::warning(format!(
                        "Restored stash for '{}' with conflicts",
                        entry.branch_name
                    ));
                    Output::tip("Resolve the conflicted files, then stage them");
                }
                PopOutcome::NotFound => Output::info("Stash was already removed"),
            }
            Ok(())
        }
        StashAction::Drop { stash } => {
            let entry = resolve(&manager, &repository, &stash)?;
            match manager.drop(&repository, &entry.stash_sha)? {
                DropOutcome::Dropped => Output::success(format!(
                    "Dropped stash {}",
                    short_sha(&entry.stash_sha)
                )),
                DropOutcome::AlreadyGone => Output::info("Stash was already removed"),
            }
            Ok(())
        }
    }
}

fn list(
    manager: &StashManager<GitCli>,
    repository: &Repository,
    branch: Option<&str>,
) -> Result<()> {
    let list = manager.list_entries(repository)?;

    Output::section("Stashes");
    let entries: Vec<&StashEntry> = list
        .owned_entries
        .iter()
        .filter(|e| branch.map_or(true, |b| e.branch_name == b))
        .collect();

    if entries.is_empty() {
        Output::info("No stashes");
    }
    for entry in &entries {
        Output::stash_line(&entry.name, &entry.stash_sha, &entry.branch_name);
    }

    let foreign = list.foreign_entry_count();
    if foreign > 0 {
        Output::sub_item(format!(
            "{} of {} stash entries were created by other tools",
            foreign, list.total_entry_count
        ));
    }
    Ok(())
}

fn show(manager: &StashManager<GitCli>, repository: &Repository, stash: &str) -> Result<()> {
    let entry = resolve(manager, repository, stash)?;
    let files = manager.list_changed_files(repository, &entry)?;

    Output::section(format!(
        "Stash {} on '{}'",
        short_sha(&entry.stash_sha),
        entry.branch_name
    ));
    if files.is_empty() {
        Output::info("No changed files");
    }
    for file in files {
        let counts = match (file.additions, file.deletions) {
            (Some(added), Some(deleted)) => format!("+{added} -{deleted}"),
            _ => "binary".to_string(),
        };
        match file.old_path {
            Some(old) => Output::sub_item(format!("{old} → {} ({counts})", file.path)),
            None => Output::sub_item(format!("{:?} {} ({counts})", file.status, file.path)),
        }
    }
    Ok(())
}

/// Find the owned entry whose sha starts with `prefix`
fn resolve(
    manager: &StashManager<GitCli>,
    repository: &Repository,
    prefix: &str,
) -> Result<StashEntry> {
    let list = manager.list_entries(repository)?;
    select_by_prefix(&list.owned_entries, prefix).cloned()
}

fn select_by_prefix<'a>(entries: &'a [StashEntry], prefix: &str) -> Result<&'a StashEntry> {
    if prefix.is_empty() {
        return Err(StashError::config("Stash id must not be empty"));
    }

    let mut matches = entries.iter().filter(|e| e.stash_sha.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(entry), None) => Ok(entry),
        (None, _) => Err(StashError::config(format!(
            "No stash created by stashkeep matches '{prefix}'"
        ))),
        (Some(_), Some(_)) => Err(StashError::config(format!(
            "Stash id '{prefix}' is ambiguous; use more characters"
        ))),
    }
}
