// src/models/stage.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A fully resolved external stage: label, program, and ordered arguments.
///
/// Immutable once built; the invoker performs no further substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            timeout: None,
        }
    }

    /// Append a single positional argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several positional arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a `--flag value` parameter pair.
    pub fn param(self, flag: &str, value: impl fmt::Display) -> Self {
        self.arg(format!("--{flag}")).arg(value.to_string())
    }

    pub fn envs(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for StageSpec {
    /// Shell-like rendering for `plan` output and diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Outcome of one stage invocation. Output went to the run log, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub name: String,
    /// True iff the child exited with status zero
    pub succeeded: bool,
    /// Exit code, absent when the child never started, was killed, or died by signal
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl StageResult {
    pub fn success(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            succeeded: true,
            exit_code: Some(0),
            duration,
        }
    }

    pub fn failure(name: impl Into<String>, exit_code: Option<i32>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            succeeded: false,
            exit_code,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_keep_declaration_order() {
        let spec = StageSpec::new("news analyzer", "python3")
            .arg("news_analyzer.py")
            .param("days", 1)
            .param("limit", 50);

        assert_eq!(
            spec.arguments(),
            ["news_analyzer.py", "--days", "1", "--limit", "50"]
        );
    }

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let spec = StageSpec::new("crawlers", "python3").args(["main crawler.py", "--limit", "5"]);
        assert_eq!(spec.to_string(), "python3 'main crawler.py' --limit 5");
    }

    #[test]
    fn failure_keeps_exit_code() {
        let result = StageResult::failure("crawlers", Some(2), Duration::from_millis(5));
        assert!(!result.succeeded);
        assert_eq!(result.exit_code, Some(2));
    }
}
