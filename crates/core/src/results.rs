//! Result types for pipeline operations
//!
//! This module contains the structures returned by the runner and the
//! pipeline manager, keeping output shapes in one place.

use crate::context::HandledFailure;
use crate::task::Outcome;
use crate::types::{TorteError, TorteResult};

/// Outcome of a single task within a run, in resolved order.
#[derive(Debug)]
pub struct TaskReport {
    pub name: String,
    pub outcome: Outcome,
}

/// Full account of one execution pass for a target.
#[derive(Debug)]
pub struct RunReport {
    pub target: String,
    /// Per-task outcomes in resolved execution order. Tasks never reached
    /// because of an abort stay [`Outcome::NotRun`].
    pub outcomes: Vec<TaskReport>,
    /// Failures that were caught by task error handlers.
    pub handled_failures: Vec<HandledFailure>,
    /// The aborting failure, if the run did not complete.
    pub failure: Option<TorteError>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Re-raise the aborting failure to the caller, keeping the report on
    /// the success path.
    pub fn into_result(mut self) -> TorteResult<RunReport> {
        match self.failure.take() {
            Some(failure) => Err(failure),
            None => Ok(self),
        }
    }
}

/// Resolved execution order for a target, without running anything.
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
    pub target: String,
    pub order: Vec<String>,
}

/// Adjacency view of the task graph for presentation.
#[derive(Debug, Clone)]
pub struct GraphView {
    pub tasks: Vec<GraphNode>,
    /// Dependency cycles detected at build time, if any.
    pub cycles: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub name: String,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
}
