//! Remotes and the stash

use std::collections::BTreeMap;

use super::Git;
use crate::error::{GitError, Result};

/// Remote name to its fetch/push locations, from `git remote -v`
pub(crate) fn parse_remotes(output: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let mut remotes: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (name, location) = line.split_once('\t').ok_or_else(|| {
            GitError::UnexpectedOutput(format!("remote line without a tab: {:?}", line))
        })?;
        remotes
            .entry(name.to_string())
            .or_default()
            .push(location.to_string());
    }

    Ok(remotes)
}

impl Git {
    /// `git stash`, `None` if there was nothing to stash
    pub async fn stash(&self) -> Result<Option<String>> {
        let message = self.output::<&str>("stash", &[]).await?;
        if message.starts_with("No local changes to save") {
            return Ok(None);
        }
        Ok(Some(message))
    }

    /// `git stash pop`, `None` if the stash is empty
    pub async fn stash_pop(&self) -> Result<Option<String>> {
        match self.output("stash", &["pop"]).await {
            Ok(message) => Ok(Some(message)),
            Err(e)
                if e.command_output().is_some_and(|out| {
                    out.starts_with("No stash found") || out.starts_with("No stash entries found")
                }) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// `git remote <args>`
    pub async fn remote(&self, args: &[&str]) -> Result<String> {
        self.output("remote", args).await
    }

    /// All remotes with their locations, e.g.
    /// `origin -> ["git@host:repo (fetch)", "git@host:repo (push)"]`
    pub async fn remotes(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let output = self.output("remote", &["-v"]).await?;
        parse_remotes(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::scripted_git;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_remotes() {
        let output = "origin\tgit@example.com:repo.git (fetch)\n\
                      origin\tgit@example.com:repo.git (push)\n\
                      upstream\thttps://example.com/repo.git (fetch)\n";
        let remotes = parse_remotes(output).unwrap();

        assert_eq!(remotes.len(), 2);
        assert_eq!(
            remotes["origin"],
            vec![
                "git@example.com:repo.git (fetch)",
                "git@example.com:repo.git (push)"
            ]
        );
        assert_eq!(remotes["upstream"], vec!["https://example.com/repo.git (fetch)"]);
        assert!(parse_remotes("").unwrap().is_empty());
        assert!(parse_remotes("garbage").is_err());
    }

    #[tokio::test]
    async fn test_stash_nothing_to_save() {
        let (git, runner) = scripted_git();
        runner.push_success("No local changes to save\n");
        runner.push_success("Saved working directory and index state WIP on main: abc init\n");

        assert_eq!(git.stash().await.unwrap(), None);
        assert_eq!(
            git.stash().await.unwrap().as_deref(),
            Some("Saved working directory and index state WIP on main: abc init")
        );
    }

    #[tokio::test]
    async fn test_stash_pop_empty() {
        let (git, runner) = scripted_git();
        runner.push_failure(1, "", "No stash entries found.\n");
        runner.push_failure(1, "error: conflict in a.txt\n", "");

        assert_eq!(git.stash_pop().await.unwrap(), None);
        assert!(git.stash_pop().await.is_err());
        assert_eq!(runner.argv()[0], vec!["stash", "pop"]);
    }
}
