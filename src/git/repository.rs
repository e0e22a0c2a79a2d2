//! The `Git` repository handle
//!
//! Binds one repository (worktree or bare) to a [`GitRunner`]. Every git
//! invocation made through the handle runs with the repository root as its
//! working directory and `GIT_DIR` pointing at the gitdir.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::executor::{GitExecutor, GitRunner, Invocation, RawOutput, StderrMode};
use crate::error::{GitError, Result};

/// Handle to a git repository
///
/// Cheap to clone; clones share the runner.
#[derive(Clone)]
pub struct Git {
    /// Canonical repository root (the worktree, or the repository itself when bare)
    path: PathBuf,
    /// `<path>/.git`, or `path` for bare repositories
    gitdir: PathBuf,
    bare: bool,
    runner: Arc<dyn GitRunner>,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.path)
            .field("gitdir", &self.gitdir)
            .field("bare", &self.bare)
            .finish_non_exhaustive()
    }
}

/// Layout of a repository found on disk
fn detect_layout(path: &Path) -> Option<(PathBuf, bool)> {
    let dot_git = path.join(".git");
    if dot_git.is_dir() {
        return Some((dot_git, false));
    }

    // Bare: named `*.git` and already initialized
    let named_git = path.to_string_lossy().ends_with(".git");
    if named_git && path.join("refs").is_dir() && path.join("objects").is_dir() {
        return Some((path.to_path_buf(), true));
    }

    None
}

/// Return true if `path` is a git repository (worktree or bare)
pub fn is_git_repository(path: impl AsRef<Path>) -> bool {
    match std::fs::canonicalize(path.as_ref()) {
        Ok(real) => detect_layout(&real).is_some(),
        Err(_) => false,
    }
}

/// Lexically resolve `.` and `..` for paths that do not exist on disk
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve symlinks in the longest existing ancestor of `path`, then
/// re-append the missing components lexically
fn real_path(path: &Path) -> PathBuf {
    for ancestor in path.ancestors() {
        let Ok(real) = std::fs::canonicalize(ancestor) else {
            continue;
        };
        return match path.strip_prefix(ancestor) {
            Ok(rest) if rest.as_os_str().is_empty() => real,
            Ok(rest) => normalize_lexically(&real.join(rest)),
            Err(_) => real,
        };
    }
    normalize_lexically(path)
}

impl Git {
    /// Open an existing repository using the default executor
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, Arc::new(GitExecutor::new()))
    }

    /// Open an existing repository with a specific runner
    ///
    /// A path containing a `.git` directory is a worktree. Otherwise the path
    /// is taken as a bare repository if its name ends in `.git` and it has
    /// `refs/` and `objects/` directories.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with(path: impl AsRef<Path>, runner: Arc<dyn GitRunner>) -> Result<Self> {
        let path = path.as_ref();
        let real = std::fs::canonicalize(path)
            .map_err(|_| GitError::NotARepository(path.to_path_buf()))?;

        let (gitdir, bare) =
            detect_layout(&real).ok_or_else(|| GitError::NotARepository(real.clone()))?;

        debug!("Opened {} repository at {:?}", if bare { "bare" } else { "worktree" }, real);

        Ok(Self {
            path: real,
            gitdir,
            bare,
            runner,
        })
    }

    /// Discover the repository enclosing `path` (searches parent directories)
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let repo = gix::discover(path).map_err(|_e| GitError::NotARepository(path.to_path_buf()))?;

        let git_dir = repo.path();
        let root = if git_dir.file_name().is_some_and(|n| n == ".git") {
            git_dir.parent().unwrap_or(git_dir)
        } else {
            git_dir
        };

        debug!("Discovered repository at {:?}", root);

        Self::open(root)
    }

    /// Create `path` if needed and run `git init` in it
    ///
    /// With `bare` the directory itself becomes the gitdir, otherwise
    /// `<path>/.git` does. With `verbose` git's output is logged.
    /// A bare repository can only be reopened if its name ends in `.git`.
    pub async fn init_create(path: impl AsRef<Path>, bare: bool, verbose: bool) -> Result<Self> {
        Self::init_create_with(path, bare, verbose, Arc::new(GitExecutor::new())).await
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display(), bare = bare))]
    pub async fn init_create_with(
        path: impl AsRef<Path>,
        bare: bool,
        verbose: bool,
        runner: Arc<dyn GitRunner>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        if tokio::fs::symlink_metadata(&path).await.is_err() {
            tokio::fs::create_dir_all(&path).await?;
        }

        let init_path = if bare { path.clone() } else { path.join(".git") };

        let invocation = Invocation::new([
            "--git-dir".to_string(),
            init_path.to_string_lossy().into_owned(),
            "init".to_string(),
        ])
        .stderr(StderrMode::Merge);

        let output = runner.run(&invocation).await?;
        if !output.success() {
            return Err(GitError::CommandFailed {
                command: invocation.command_line(),
                exit_code: output.exit_code,
                output: output.stdout,
            }
            .into());
        }
        if verbose {
            info!("{}", output.stdout.trim_end());
        }

        Self::open_with(&path, runner)
    }

    /// Get the repository root
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the gitdir
    pub fn gitdir(&self) -> &Path {
        &self.gitdir
    }

    pub fn is_bare(&self) -> bool {
        self.bare
    }

    /// Replace the runner, e.g. to use an executor with a different timeout
    pub fn with_runner(mut self, runner: Arc<dyn GitRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Express `path` relative to the repository root
    ///
    /// The parent directory is resolved to its real path and the final
    /// component re-joined, so a symlink named by `path` itself is kept.
    /// Relative input is taken relative to the repository root. The root
    /// itself maps to the empty string.
    pub fn make_relative(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.path.join(path)
        };

        let resolved = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => real_path(parent).join(name),
            _ => real_path(&path),
        };

        match resolved.strip_prefix(&self.path) {
            Ok(rest) => Ok(rest.to_string_lossy().trim_start_matches('/').to_string()),
            Err(_) => Err(GitError::PathOutsideRepository(resolved).into()),
        }
    }

    /// Rewrite absolute paths inside the repository to repo-relative ones
    ///
    /// Anything else (options, revisions, outside paths) passes through.
    pub fn relativize_arg(&self, arg: &str) -> String {
        if !Path::new(arg).is_absolute() {
            return arg.to_string();
        }
        match self.make_relative(arg) {
            Ok(rel) if rel.is_empty() => ".".to_string(),
            Ok(rel) => rel,
            Err(_) => arg.to_string(),
        }
    }

    /// Build an invocation bound to this repository, without rewriting arguments
    pub(crate) fn invocation<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::new(args)
            .current_dir(&self.path)
            .git_dir(&self.gitdir)
    }

    /// Build an invocation for `git <subcommand> <args>`, relativizing the args
    pub(crate) fn command<S: AsRef<str>>(&self, subcommand: &str, args: &[S]) -> Invocation {
        let argv = std::iter::once(subcommand.to_string())
            .chain(args.iter().map(|a| self.relativize_arg(a.as_ref())));
        self.invocation(argv)
    }

    /// Run without interpreting the exit code
    pub(crate) async fn execute(&self, invocation: &Invocation) -> Result<RawOutput> {
        self.runner.run(invocation).await
    }

    /// Run and fail on non-zero exit, carrying the captured diagnostics
    pub(crate) async fn execute_checked(&self, invocation: &Invocation) -> Result<RawOutput> {
        let output = self.execute(invocation).await?;
        if output.success() {
            return Ok(output);
        }

        let text = if output.stderr.is_empty() {
            output.stdout
        } else {
            output.stderr
        };

        Err(GitError::CommandFailed {
            command: invocation.command_line(),
            exit_code: output.exit_code,
            output: text.trim_end().to_string(),
        }
        .into())
    }

    /// `git <subcommand> <args>` for its side effects; stderr kept for errors
    pub(crate) async fn system<S: AsRef<str>>(&self, subcommand: &str, args: &[S]) -> Result<()> {
        self.execute_checked(&self.command(subcommand, args)).await?;
        Ok(())
    }

    /// `git <subcommand> <args>` with stderr merged, trailing whitespace trimmed
    pub(crate) async fn output<S: AsRef<str>>(&self, subcommand: &str, args: &[S]) -> Result<String> {
        let invocation = self.command(subcommand, args).stderr(StderrMode::Merge);
        let output = self.execute_checked(&invocation).await?;
        Ok(output.stdout.trim_end().to_string())
    }

    fn merge_msg_path(&self) -> PathBuf {
        self.gitdir.join("MERGE_MSG")
    }

    fn index_lock_path(&self) -> PathBuf {
        self.gitdir.join("index.lock")
    }

    /// Contents of `MERGE_MSG`, if present
    pub async fn merge_msg(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.merge_msg_path()).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite `MERGE_MSG`
    pub async fn set_merge_msg(&self, message: &str) -> Result<()> {
        tokio::fs::write(self.merge_msg_path(), message).await?;
        Ok(())
    }

    /// Whether `index.lock` exists
    pub async fn index_locked(&self) -> bool {
        tokio::fs::try_exists(self.index_lock_path())
            .await
            .unwrap_or(false)
    }

    /// Create an empty `index.lock`, or remove it if present
    pub async fn set_index_lock(&self, locked: bool) -> Result<()> {
        let path = self.index_lock_path();
        if locked {
            tokio::fs::write(&path, b"").await?;
        } else {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Borrow objects from `other` via `objects/info/alternates`
    pub async fn set_alternates(&self, other: &Git) -> Result<()> {
        let info_dir = self.gitdir.join("objects").join("info");
        tokio::fs::create_dir_all(&info_dir).await?;

        let line = format!("{}\n", other.gitdir.join("objects").display());
        tokio::fs::write(info_dir.join("alternates"), line).await?;
        Ok(())
    }

    /// Write `lines` to `<dir>/.gitignore`, one per line
    ///
    /// Pass `text.split('\n')` to write a multi-line string.
    pub async fn set_gitignore<I, S>(dir: impl AsRef<Path>, lines: I, append: bool) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        use tokio::io::AsyncWriteExt;

        let mut content = String::new();
        for line in lines {
            content.push_str(line.as_ref());
            content.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(dir.as_ref().join(".gitignore"))
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Create an empty `<dir>/.anchor` so git keeps an otherwise empty directory
    pub async fn anchor(dir: impl AsRef<Path>) -> Result<()> {
        tokio::fs::write(dir.as_ref().join(".anchor"), b"").await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn from_parts(path: PathBuf, gitdir: PathBuf, bare: bool, runner: Arc<dyn GitRunner>) -> Self {
        Self {
            path,
            gitdir,
            bare,
            runner,
        }
    }
}
