//! Reference listing

use regex::Regex;

use super::Git;
use crate::error::{GitError, Result};

/// Names under `refs/<refpath>/` in `git show-ref` output
pub(crate) fn parse_show_ref(output: &str, refpath: &str) -> Result<Vec<String>> {
    let pattern = format!(r"^[0-9a-f]+ refs/{}/(.*)$", regex::escape(refpath));
    let re = Regex::new(&pattern)
        .map_err(|e| GitError::UnexpectedOutput(format!("bad ref path {:?}: {}", refpath, e)))?;

    Ok(output
        .lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect())
}

impl Git {
    /// Short names of the refs under `refs/<refpath>/`, e.g. `heads`
    pub async fn list_refs(&self, refpath: &str) -> Result<Vec<String>> {
        // show-ref patterns match ref name tails, so list everything and filter
        let output = match self.output::<&str>("show-ref", &[]).await {
            Ok(output) => output,
            // show-ref exits 1 without output when there are no refs
            Err(e) if e.command_output() == Some("") => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        parse_show_ref(&output, refpath)
    }

    /// Local branch names
    pub async fn list_heads(&self) -> Result<Vec<String>> {
        self.list_refs("heads").await
    }

    /// Tag names, as listed by `git tag`
    pub async fn list_tags(&self) -> Result<Vec<String>> {
        let output = self.output::<&str>("tag", &[]).await?;
        Ok(output.split_whitespace().map(String::from).collect())
    }
}
