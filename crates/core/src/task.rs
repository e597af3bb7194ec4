//! Task model
//!
//! A task is a named unit of build work: dependencies, criteria guards,
//! an optional action body, and optional error/finally handlers.

use crate::context::RunContext;
use crate::graph::TaskId;

/// Boolean guard evaluated before a task's action runs.
pub type Criterion = Box<dyn Fn(&RunContext) -> bool>;

/// Side-effecting unit of work executed when all criteria pass.
pub type Action = Box<dyn Fn(&mut RunContext) -> anyhow::Result<()>>;

/// Handler invoked with the causing failure when the task's action errors.
/// Attaching one isolates the failure: the run continues past this task.
pub type ErrorHandler = Box<dyn Fn(&mut RunContext, &anyhow::Error)>;

/// Cleanup/reporting logic that runs once per visited task after the whole
/// resolved sequence completes. Returning an error escalates the run.
pub type FinallyHandler = Box<dyn Fn(&mut RunContext) -> anyhow::Result<()>>;

/// Per-run outcome of a task. Terminal states are absorbing for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NotRun,
    Skipped,
    Succeeded,
    Failed,
}

impl Outcome {
    /// Whether dependents may treat this task as completed without failure.
    /// A skipped task still satisfies its dependents.
    pub fn satisfies_dependents(&self) -> bool {
        matches!(self, Outcome::Succeeded | Outcome::Skipped)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Outcome::NotRun => "not run",
            Outcome::Skipped => "skipped",
            Outcome::Succeeded => "succeeded",
            Outcome::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// A registered task with its dependencies resolved to typed ids.
pub struct Task {
    pub name: String,
    pub description: Option<String>,
    pub dependencies: Vec<TaskId>,
    pub criteria: Vec<Criterion>,
    pub action: Option<Action>,
    pub error_handler: Option<ErrorHandler>,
    pub finally_handler: Option<FinallyHandler>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("dependencies", &self.dependencies)
            .field("criteria", &self.criteria.len())
            .field("has_action", &self.action.is_some())
            .field("has_error_handler", &self.error_handler.is_some())
            .field("has_finally_handler", &self.finally_handler.is_some())
            .finish()
    }
}
