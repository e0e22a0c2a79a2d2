//! gitwrapper - Async wrapper library for working with git repositories
//!
//! Each operation runs the `git` command-line tool in a subprocess and turns
//! its output into Rust values. The object store, refs and merge machinery
//! all stay inside git; this crate builds argument lists, binds every
//! invocation to the repository, and parses what comes back.
//!
//! ```no_run
//! # async fn demo() -> gitwrapper::Result<()> {
//! use gitwrapper::Git;
//!
//! let git = Git::open("/srv/project")?;
//! if !git.is_clean().await? {
//!     for entry in git.status(&[]).await? {
//!         println!("{}\t{}", entry.status, entry.path);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`git`] - The `Git` handle and the executor that runs git
//! - [`config`] - Layered configuration for the executor and logging
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod git;

pub use config::Config;
pub use error::{Error, GitError, Result};
pub use git::{
    is_git_repository, CommitOptions, Comparison, Git, GitExecutor, GitRunner, LogOptions,
    StatusEntry, WorkingTreeStatus,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
