//! Working tree status and change listing

use serde::Serialize;

use super::query::non_empty_lines;
use super::Git;
use crate::error::{GitError, Result};

/// One line of `git diff-index --name-status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    /// Status letter(s), e.g. `M`, `A`, `D`, `R100`
    pub status: String,
    pub path: String,
}

/// Files grouped by `git status --porcelain` prefix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkingTreeStatus {
    /// Staged modifications (`M  `)
    pub uncommitted: Vec<String>,
    /// Modifications not yet staged (` M `)
    pub unstaged: Vec<String>,
    /// Untracked files (`?? `)
    pub untracked: Vec<String>,
}

impl WorkingTreeStatus {
    pub fn is_clean(&self) -> bool {
        self.uncommitted.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

/// What to compare in [`Git::list_changed_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// Two treeishes, via `git diff-tree`
    Trees(String, String),
    /// A treeish against the index, via `git diff-index`
    Index(String),
}

impl Comparison {
    /// One treeish compares against the index, two compare with each other
    pub fn from_slice<S: AsRef<str>>(treeishes: &[S]) -> Result<Self> {
        match treeishes {
            [a] => Ok(Comparison::Index(a.as_ref().to_string())),
            [a, b] => Ok(Comparison::Trees(
                a.as_ref().to_string(),
                b.as_ref().to_string(),
            )),
            other => Err(GitError::InvalidComparison(other.len()).into()),
        }
    }
}

impl From<&str> for Comparison {
    fn from(treeish: &str) -> Self {
        Comparison::Index(treeish.to_string())
    }
}

impl From<(&str, &str)> for Comparison {
    fn from((a, b): (&str, &str)) -> Self {
        Comparison::Trees(a.to_string(), b.to_string())
    }
}

pub(crate) fn parse_name_status(output: &str) -> Vec<StatusEntry> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('\t') {
            Some((status, path)) => StatusEntry {
                status: status.to_string(),
                path: path.to_string(),
            },
            None => StatusEntry {
                status: line.to_string(),
                path: String::new(),
            },
        })
        .collect()
}

pub(crate) fn parse_porcelain(output: &str) -> Result<WorkingTreeStatus> {
    let mut status = WorkingTreeStatus::default();

    for line in output.lines().filter(|line| !line.is_empty()) {
        if let Some(path) = line.strip_prefix("M  ") {
            status.uncommitted.push(path.to_string());
        } else if let Some(path) = line.strip_prefix(" M ") {
            status.unstaged.push(path.to_string());
        } else if let Some(path) = line.strip_prefix("?? ") {
            status.untracked.push(path.to_string());
        } else {
            return Err(GitError::UnexpectedOutput(format!(
                "unrecognized git status prefix in {:?}",
                line
            ))
            .into());
        }
    }

    Ok(status)
}

impl Git {
    /// Changes of the working tree against `HEAD` as `(status, path)` entries
    pub async fn status(&self, paths: &[&str]) -> Result<Vec<StatusEntry>> {
        self.update_index_refresh().await?;

        let mut args = vec!["--ignore-submodules", "--name-status", "HEAD"];
        args.extend_from_slice(paths);
        let output = self.output("diff-index", &args).await?;
        Ok(parse_name_status(&output))
    }

    async fn porcelain(&self) -> Result<String> {
        // Raw stdout: trimming would eat the leading space of " M " lines
        let invocation = self.invocation(["status", "--porcelain"]);
        Ok(self.execute_checked(&invocation).await?.stdout)
    }

    /// True if nothing is staged, modified or untracked
    pub async fn is_clean(&self) -> Result<bool> {
        Ok(non_empty_lines(&self.porcelain().await?).is_empty())
    }

    /// Staged, unstaged and untracked files
    ///
    /// Fails on porcelain entries other than those three kinds (renames,
    /// deletions, conflicts).
    pub async fn status_full(&self) -> Result<WorkingTreeStatus> {
        parse_porcelain(&self.porcelain().await?)
    }

    /// Paths with unresolved merge conflicts
    pub async fn list_unmerged(&self) -> Result<Vec<String>> {
        let output = self
            .output("diff", &["--name-only", "--diff-filter=U"])
            .await?;
        Ok(non_empty_lines(&output))
    }

    /// Files that differ between the compared treeishes
    pub async fn list_changed_files(
        &self,
        compared: impl Into<Comparison>,
        paths: &[&str],
    ) -> Result<Vec<String>> {
        self.update_index_refresh().await?;

        let output = match compared.into() {
            Comparison::Trees(a, b) => {
                let mut args = vec!["-r", "--name-only", a.as_str(), b.as_str()];
                args.extend_from_slice(paths);
                self.output("diff-tree", &args).await?
            }
            Comparison::Index(treeish) => {
                let mut args = vec!["--ignore-submodules", "-r", "--name-only", treeish.as_str()];
                args.extend_from_slice(paths);
                self.output("diff-index", &args).await?
            }
        };

        Ok(non_empty_lines(&output))
    }
}
