//! Mutating git commands
//!
//! Thin passthroughs: each method runs one git subcommand and fails with
//! [`GitError::CommandFailed`](crate::error::GitError::CommandFailed) on a
//! non-zero exit, carrying git's stderr.

use std::path::Path;

use tracing::{debug, instrument};

use super::executor::StderrMode;
use super::Git;
use crate::error::Result;

/// Options for [`Git::commit`]
#[derive(Debug, Clone, Default)]
pub struct CommitOptions<'a> {
    /// Limit the commit to these paths
    pub paths: Vec<&'a Path>,
    /// Commit message; `None` or empty lets git decide (e.g. `MERGE_MSG`)
    pub message: Option<&'a str>,
    /// `-a`: stage modified and deleted tracked files first
    pub update_all: bool,
    /// `-v`
    pub verbose: bool,
}

/// Paths from `git update-index --refresh` output that need updating
pub(crate) fn paths_needing_update(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.ends_with("needs update"))
        .map(|line| match line.rsplit_once(':') {
            Some((path, _)) => path.to_string(),
            None => line.to_string(),
        })
        .collect()
}

impl Git {
    fn relative_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<String> {
        paths
            .iter()
            .map(|p| {
                let p = p.as_ref();
                match self.make_relative(p) {
                    Ok(rel) if rel.is_empty() => ".".to_string(),
                    Ok(rel) => rel,
                    Err(_) => p.to_string_lossy().into_owned(),
                }
            })
            .collect()
    }

    /// `git read-tree <opts>`
    pub async fn read_tree(&self, opts: &[&str]) -> Result<()> {
        self.system("read-tree", opts).await
    }

    /// `git update-index --remove <paths>`
    pub async fn update_index<P: AsRef<Path>>(&self, paths: &[P]) -> Result<()> {
        let mut args = vec!["--remove".to_string()];
        args.extend(self.relative_paths(paths));
        self.system("update-index", &args).await
    }

    /// `git update-index -q --unmerged --refresh`
    pub async fn update_index_refresh(&self) -> Result<()> {
        self.system("update-index", &["-q", "--unmerged", "--refresh"])
            .await
    }

    /// Update every file `git update-index --refresh` reports as needing it
    #[instrument(skip(self))]
    pub async fn update_index_all(&self) -> Result<()> {
        let invocation = self
            .invocation(["update-index", "--refresh"])
            .stderr(StderrMode::Merge);
        let output = self.execute(&invocation).await?;
        if output.success() {
            return Ok(());
        }

        let paths = paths_needing_update(&output.stdout);
        debug!("{} paths need update", paths.len());
        self.update_index(paths.as_slice()).await
    }

    /// `git add <paths>`
    pub async fn add<P: AsRef<Path>>(&self, paths: &[P]) -> Result<()> {
        self.system("add", &self.relative_paths(paths)).await
    }

    /// `git checkout <args>`
    pub async fn checkout(&self, args: &[&str]) -> Result<()> {
        self.system("checkout", args).await
    }

    /// `git checkout-index -a -f`
    pub async fn checkout_index(&self) -> Result<()> {
        self.system("checkout-index", &["-a", "-f"]).await
    }

    /// `git update-ref [-d] <ref> <rev> [<oldvalue>]`
    pub async fn update_ref(&self, args: &[&str]) -> Result<()> {
        self.system("update-ref", args).await
    }

    /// Remove `path` from the index only, recursively; missing paths are fine
    pub async fn rm_cached(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = self.relative_paths(&[path.as_ref()]).remove(0);
        self.system(
            "rm",
            &["--ignore-unmatch", "--cached", "--quiet", "-f", "-r", path.as_str()],
        )
        .await
    }

    /// `git commit [-a] [-v] [-m <message>] <paths>`
    #[instrument(skip_all)]
    pub async fn commit(&self, options: CommitOptions<'_>) -> Result<()> {
        let mut args = vec!["commit".to_string()];
        if options.update_all {
            args.push("-a".to_string());
        }
        if options.verbose {
            args.push("-v".to_string());
        }
        if let Some(message) = options.message.filter(|m| !m.is_empty()) {
            args.push("-m".to_string());
            args.push(message.to_string());
        }
        args.extend(self.relative_paths(&options.paths));

        // The message is not a path, so the args are not relativized
        self.execute_checked(&self.invocation(args)).await?;
        Ok(())
    }

    /// `git merge <remote>`
    pub async fn merge(&self, remote: &str) -> Result<()> {
        self.system("merge", &[remote]).await
    }

    /// `git reset <args>`
    pub async fn reset(&self, args: &[&str]) -> Result<()> {
        self.system("reset", args).await
    }

    /// `git branch -D <branch>`
    pub async fn branch_delete(&self, branch: &str) -> Result<()> {
        self.system("branch", &["-D", branch]).await
    }

    /// `git branch <args>`
    pub async fn branch(&self, args: &[&str]) -> Result<()> {
        self.system("branch", args).await
    }

    /// `git prune`
    pub async fn prune(&self) -> Result<()> {
        self.system::<&str>("prune", &[]).await
    }

    /// `git repack <args>`
    pub async fn repack(&self, args: &[&str]) -> Result<()> {
        self.system("repack", args).await
    }

    /// `git fetch <repository> <refspec>`
    pub async fn fetch(&self, repository: &str, refspec: &str) -> Result<()> {
        self.system("fetch", &[repository, refspec]).await
    }

    /// Run any git command without checking its exit status
    ///
    /// Returns `None` on success and `Some(exit_code)` otherwise.
    pub async fn raw(&self, command: &str, args: &[&str]) -> Result<Option<i32>> {
        let output = self.execute(&self.command(command, args)).await?;
        if output.success() {
            Ok(None)
        } else {
            Ok(Some(output.exit_code))
        }
    }

    /// Delete `refs/<reference>`
    pub async fn remove_ref(&self, reference: &str) -> Result<()> {
        let full = format!("refs/{}", reference.trim_start_matches('/'));
        self.update_ref(&["-d", &full]).await
    }

    /// Delete `refs/tags/<name>`
    pub async fn remove_tag(&self, name: &str) -> Result<()> {
        self.remove_ref(&format!("tags/{}", name)).await
    }
}
