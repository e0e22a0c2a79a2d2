//! Scripted runner for unit tests
//!
//! Answers invocations from a queue of canned outputs and records every
//! invocation it sees. An empty queue answers with a silent success.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::executor::{GitRunner, Invocation, RawOutput, StderrMode};
use super::Git;
use crate::error::Result;

#[derive(Default)]
pub(crate) struct ScriptedRunner {
    responses: Mutex<VecDeque<RawOutput>>,
    seen: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_success(&self, stdout: &str) {
        self.push(RawOutput {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        });
    }

    pub(crate) fn push_failure(&self, exit_code: i32, stdout: &str, stderr: &str) {
        self.push(RawOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        });
    }

    fn push(&self, output: RawOutput) {
        self.responses.lock().unwrap().push_back(output);
    }

    /// Argument vectors of every invocation so far
    pub(crate) fn argv(&self) -> Vec<Vec<String>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.args.clone())
            .collect()
    }

    pub(crate) fn invocations(&self) -> Vec<Invocation> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<RawOutput> {
        self.seen.lock().unwrap().push(invocation.clone());
        let mut output = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();

        // Mirror the executor: merged invocations see stderr inside stdout
        if invocation.stderr == StderrMode::Merge {
            let stderr = std::mem::take(&mut output.stderr);
            output.stdout.push_str(&stderr);
        }
        Ok(output)
    }
}

/// A `Git` handle over a nonexistent path, wired to a fresh scripted runner
pub(crate) fn scripted_git() -> (Git, Arc<ScriptedRunner>) {
    let runner = Arc::new(ScriptedRunner::new());
    let git = Git::from_parts(
        "/srv/repo".into(),
        "/srv/repo/.git".into(),
        false,
        runner.clone(),
    );
    (git, runner)
}
