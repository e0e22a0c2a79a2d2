//! Git operations through the git CLI
//!
//! - `GitExecutor` - Semaphore-controlled async git process execution
//! - `Git` - Repository handle: opening, paths and repository files
//! - Passthrough commands, output queries, status, refs and remotes,
//!   each implemented on `Git` in its own module

mod commands;
mod executor;
#[cfg(test)]
pub(crate) mod mock;
mod query;
mod refs;
mod remote;
mod repository;
mod status;

pub use commands::*;
pub use executor::*;
pub use query::*;
pub use repository::*;
pub use status::*;
