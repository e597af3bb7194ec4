//! Run context and the injected execution environment
//!
//! Actions, criteria, and handlers never talk to the process environment
//! directly. They receive a [`RunContext`] which borrows a [`RunEnvironment`]
//! implementation supplied by the caller; the core never constructs the
//! production environment itself.

use std::collections::HashMap;
use std::path::Path;

/// Capability boundary injected into every action, criterion, and handler:
/// logging, environment-variable lookup, file-system queries, and external
/// process invocation.
pub trait RunEnvironment {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);

    /// Look up an environment variable, `None` when unset.
    fn env_var(&self, name: &str) -> Option<String>;

    fn file_exists(&self, path: &Path) -> bool;

    /// Run a command line through the platform shell, blocking until it
    /// exits. `vars` are exported into the child's environment.
    fn run_shell(&self, command: &str, vars: &[(String, String)]) -> anyhow::Result<()>;

    /// Run an executable with explicit arguments, blocking until it exits.
    fn run_command(
        &self,
        program: &str,
        args: &[String],
        vars: &[(String, String)],
    ) -> anyhow::Result<()>;
}

/// A failure that was caught by a task's error handler. The run continues,
/// but the failure stays on record so a later finally handler can escalate.
#[derive(Debug)]
pub struct HandledFailure {
    pub task: String,
    pub error: anyhow::Error,
}

/// Mutable run-level state threaded through a single execution pass.
///
/// Execution is strictly sequential, so the key/value store is
/// single-writer-at-a-time by construction: task actions write, later
/// finally handlers read.
pub struct RunContext<'e> {
    environment: &'e dyn RunEnvironment,
    vars: HashMap<String, String>,
    handled_failures: Vec<HandledFailure>,
}

impl<'e> RunContext<'e> {
    pub fn new(environment: &'e dyn RunEnvironment) -> Self {
        Self {
            environment,
            vars: HashMap::new(),
            handled_failures: Vec::new(),
        }
    }

    pub fn environment(&self) -> &dyn RunEnvironment {
        self.environment
    }

    /// Set a run-scoped flag shared between tasks and handlers.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Failures caught by error handlers so far, in execution order.
    pub fn handled_failures(&self) -> &[HandledFailure] {
        &self.handled_failures
    }

    pub(crate) fn record_handled_failure(&mut self, task: &str, error: anyhow::Error) {
        self.handled_failures.push(HandledFailure {
            task: task.to_string(),
            error,
        });
    }

    pub(crate) fn take_handled_failures(&mut self) -> Vec<HandledFailure> {
        std::mem::take(&mut self.handled_failures)
    }

    // Delegation helpers so actions can log without reaching through
    // `environment()` every time.

    pub fn info(&self, message: &str) {
        self.environment.info(message);
    }

    pub fn warn(&self, message: &str) {
        self.environment.warn(message);
    }

    pub fn error(&self, message: &str) {
        self.environment.error(message);
    }

    pub fn env_var(&self, name: &str) -> Option<String> {
        self.environment.env_var(name)
    }
}
