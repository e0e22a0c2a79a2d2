//! Output-returning git commands
//!
//! Output is captured with stderr merged into stdout and trailing whitespace
//! trimmed, unless a method says otherwise.

use tracing::{debug, instrument};

use super::executor::StderrMode;
use super::Git;
use crate::error::{GitError, Result};

/// Options for [`Git::log`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// `--oneline`
    pub oneline: bool,
    /// `-<count>`; zero means no limit
    pub count: usize,
}

/// Split output into lines, dropping empty ones
pub(crate) fn non_empty_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Second space-separated field of the first line, as printed by
/// `show-ref` and `name-rev`
fn second_field(output: &str) -> Option<String> {
    output
        .lines()
        .next()
        .and_then(|line| line.split(' ').nth(1))
        .map(String::from)
}

/// Message part of a raw commit object (everything after the header)
pub(crate) fn commit_message(raw: &str) -> Option<&str> {
    raw.find("\n\n").map(|idx| &raw[idx + 2..])
}

impl Git {
    /// `git cat-file <args>`
    pub async fn cat_file(&self, args: &[&str]) -> Result<String> {
        self.output("cat-file", args).await
    }

    /// `git write-tree`, returns the id of the written tree
    pub async fn write_tree(&self) -> Result<String> {
        self.output::<&str>("write-tree", &[]).await
    }

    /// `git rev-parse <args>`, `None` if git cannot parse them
    pub async fn rev_parse(&self, args: &[&str]) -> Result<Option<String>> {
        self.output_or_none("rev-parse", args).await
    }

    /// `git merge-base <a> <b>`, `None` if there is no common ancestor
    pub async fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>> {
        self.output_or_none("merge-base", &[a, b]).await
    }

    /// Treat a failed command as "no answer", keep other errors
    async fn output_or_none(&self, subcommand: &str, args: &[&str]) -> Result<Option<String>> {
        match self.output(subcommand, args).await {
            Ok(out) => Ok(Some(out)),
            Err(e) if e.is_command_failure() => {
                debug!("git {} gave no answer: {}", subcommand, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// `git symbolic-ref <name> [<reference>]`, returns the ref's value
    pub async fn symbolic_ref(&self, name: &str, reference: Option<&str>) -> Result<String> {
        let mut args = vec![name];
        if let Some(reference) = reference.filter(|r| !r.is_empty()) {
            args.push(reference);
        }
        self.output("symbolic-ref", &args).await
    }

    /// `git rev-list <args>`
    pub async fn rev_list(&self, args: &[&str]) -> Result<Vec<String>> {
        let output = self.output("rev-list", args).await?;
        Ok(non_empty_lines(&output))
    }

    /// `git rev-list <args>` ignoring the exit status
    pub async fn rev_list_unchecked(&self, args: &[&str]) -> Result<Vec<String>> {
        let invocation = self.command("rev-list", args).stderr(StderrMode::Separate);
        let output = self.execute(&invocation).await?;
        Ok(non_empty_lines(&output.stdout))
    }

    /// `git name-rev <rev>`, returns the symbolic name
    pub async fn name_rev(&self, rev: &str) -> Result<String> {
        let output = self.output("name-rev", &[rev]).await?;
        second_field(&output)
            .ok_or_else(|| GitError::UnexpectedOutput(format!("name-rev: {:?}", output)).into())
    }

    /// `git show-ref <reference>`, returns the full ref name if it exists
    pub async fn show_ref(&self, reference: &str) -> Result<Option<String>> {
        Ok(self
            .output_or_none("show-ref", &[reference])
            .await?
            .and_then(|out| second_field(&out)))
    }

    /// `git show <args>`
    pub async fn show(&self, args: &[&str]) -> Result<String> {
        self.output("show", args).await
    }

    /// `git describe <args>`, one line per described argument
    ///
    /// git stops at the first argument it cannot describe; that failure is
    /// ignored and the lines printed so far are returned.
    pub async fn describe(&self, args: &[&str]) -> Result<Vec<String>> {
        let invocation = self.command("describe", args).stderr(StderrMode::Separate);
        let output = self.execute(&invocation).await?;
        Ok(output.stdout.trim_end().lines().map(String::from).collect())
    }

    /// `git commit-tree <tree> [-p <parent>]...` with `log` on stdin
    ///
    /// Returns the id of the new commit object.
    #[instrument(skip(self, log))]
    pub async fn commit_tree(&self, tree: &str, log: &str, parents: &[&str]) -> Result<String> {
        let mut args = vec!["commit-tree".to_string(), tree.to_string()];
        for parent in parents {
            args.push("-p".to_string());
            args.push(parent.to_string());
        }

        let invocation = self.invocation(args).stdin(log.as_bytes());
        let output = self.execute_checked(&invocation).await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Id of the empty tree, written with `git mktree`
    pub async fn mktree_empty(&self) -> Result<String> {
        let invocation = self.invocation(["mktree"]).stdin(Vec::new());
        let output = self.execute_checked(&invocation).await?;
        Ok(output.stdout.trim().to_string())
    }

    /// `git log [--oneline] [-<count>] <args>`
    pub async fn log(&self, args: &[&str], options: LogOptions) -> Result<String> {
        let mut argv: Vec<String> = Vec::new();
        if options.oneline {
            argv.push("--oneline".to_string());
        }
        if options.count != 0 {
            argv.push(format!("-{}", options.count));
        }
        argv.extend(args.iter().map(|a| a.to_string()));

        let invocation = self.command("log", &argv).stderr(StderrMode::Separate);
        let output = self.execute_checked(&invocation).await?;
        Ok(output.stdout.trim_end().to_string())
    }

    /// Most recent tag reachable from any tagged commit, `None` without tags
    pub async fn latest_tag(&self) -> Result<Option<String>> {
        // rev-list exits non-zero in a repository without tags
        let tagged = self
            .rev_list_unchecked(&["--tags", "--max-count=1"])
            .await?;
        let [commit] = tagged.as_slice() else {
            return Ok(None);
        };

        Ok(self.describe(&["--tags", commit.as_str()]).await?.into_iter().next())
    }

    /// `git rev-parse [--short] HEAD`
    ///
    /// Unlike [`Git::rev_parse`], an unborn `HEAD` is an error.
    pub async fn latest_commit(&self, short: bool) -> Result<String> {
        let mut args = Vec::new();
        if short {
            args.push("--short");
        }
        args.push("HEAD");

        Ok(self.output("rev-parse", &args).await?.trim().to_string())
    }

    /// Message of the commit `committish`, without the object header
    pub async fn commit_log(&self, committish: &str) -> Result<String> {
        let raw = self.output("cat-file", &["commit", committish]).await?;
        commit_message(&raw).map(String::from).ok_or_else(|| {
            GitError::UnexpectedOutput(format!("commit {} has no message", committish)).into()
        })
    }

    /// `git ls-files <args>`
    pub async fn ls_files(&self, args: &[&str]) -> Result<Vec<String>> {
        let output = self.output("ls-files", args).await?;
        Ok(output.lines().map(String::from).collect())
    }
}
