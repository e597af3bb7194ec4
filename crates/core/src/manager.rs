//! High-level pipeline management interface
//!
//! This module provides the [`PipelineManager`], the primary entry point for
//! file-driven use: it loads a pipeline config, wires every declared task
//! into the graph builder with shell-backed actions, and exposes run, plan,
//! and inspection operations over the frozen graph.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use torte_core::execution::SystemEnvironment;
//! use torte_core::manager::PipelineManager;
//!
//! # fn example() -> torte_core::types::TorteResult<()> {
//! let manager = PipelineManager::from_file(Path::new("torte.yml"))?;
//! let environment = SystemEnvironment::new(".");
//! let report = manager.run_task(None, &environment)?;
//! # let _ = report;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use anyhow::anyhow;

use crate::configs::pipeline::{parse_pipeline_config, Command, PipelineConfig, TaskConfig};
use crate::context::{RunContext, RunEnvironment};
use crate::execution::TaskRunner;
use crate::graph::{PipelineBuilder, TaskGraph};
use crate::results::{GraphNode, GraphView, ResolvedPlan, RunReport};
use crate::types::{TorteError, TorteResult};

/// Environment variable carrying the current task name into spawned
/// processes.
pub const TASK_VAR: &str = "TORTE_TASK";
/// Environment variable carrying the requested target into spawned
/// processes.
pub const TARGET_VAR: &str = "TORTE_TARGET";

const FALLBACK_TARGET: &str = "default";

/// High-level manager over a config-declared pipeline.
pub struct PipelineManager {
    config: PipelineConfig,
    graph: TaskGraph,
}

impl PipelineManager {
    /// Load and wire a pipeline from a YAML file.
    pub fn from_file(path: &Path) -> TorteResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TorteError::Config(format!(
                "Failed to read pipeline file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = parse_pipeline_config(&content).map_err(|e| {
            TorteError::Config(format!(
                "Failed to parse pipeline file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_config(config)
    }

    /// Wire a parsed config into a frozen task graph.
    pub fn from_config(config: PipelineConfig) -> TorteResult<Self> {
        let mut builder = PipelineBuilder::new();

        for task_config in &config.tasks {
            if task_config.script.is_some() && task_config.command.is_some() {
                return Err(TorteError::Config(format!(
                    "Task '{}' declares both a script and a command; pick one",
                    task_config.name
                )));
            }
            Self::register_task(&mut builder, task_config);
        }

        let graph = builder.build()?;
        Ok(Self { config, graph })
    }

    fn register_task(builder: &mut PipelineBuilder, task_config: &TaskConfig) {
        let mut handle = builder.task(task_config.name.as_str());

        if let Some(description) = &task_config.description {
            handle = handle.describe(description.as_str());
        }
        for dependency in task_config.dependencies.iter().flatten() {
            handle = handle.depends_on(dependency.as_str());
        }
        for criterion in task_config.criteria.iter().flatten() {
            let criterion = criterion.clone();
            handle = handle.with_criteria(move |ctx| criterion.is_met(ctx));
        }

        let task_name = task_config.name.clone();
        if let Some(script) = &task_config.script {
            let script = script.clone();
            let name = task_name.clone();
            handle = handle.does(move |ctx| {
                if !ctx.environment().file_exists(Path::new(&script)) {
                    return Err(anyhow!("Script file '{}' not found", script));
                }
                let vars = child_vars(&name, ctx);
                ctx.environment().run_command(&script, &[], &vars)
            });
        } else if let Some(command) = &task_config.command {
            let command = command.clone();
            let name = task_name.clone();
            handle = handle.does(move |ctx| {
                let vars = child_vars(&name, ctx);
                match &command {
                    Command::Single(line) => ctx.environment().run_shell(line, &vars),
                    Command::Multiple(argv) => match argv.split_first() {
                        Some((program, args)) => {
                            ctx.environment().run_command(program, args, &vars)
                        }
                        None => Ok(()),
                    },
                }
            });
        }

        if task_config.continue_on_error == Some(true) {
            let name = task_name.clone();
            handle = handle.on_error(move |ctx, error| {
                ctx.info(&format!("Task '{}' failed: {:#}", name, error));
            });
        }

        if task_config.fail_on_handled_errors == Some(true) {
            handle.finally(|ctx| {
                let failed = ctx.handled_failures().len();
                if failed == 0 {
                    Ok(())
                } else {
                    Err(anyhow!(
                        "{} task(s) failed during the run; all tasks were attempted",
                        failed
                    ))
                }
            });
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    /// The target used when `run` is invoked without one.
    pub fn default_target(&self) -> &str {
        self.config
            .default_target
            .as_deref()
            .unwrap_or(FALLBACK_TARGET)
    }

    /// Execute a target (or the default target) against the given
    /// environment.
    pub fn run_task(
        &self,
        target: Option<&str>,
        environment: &dyn RunEnvironment,
    ) -> TorteResult<RunReport> {
        let target = target.unwrap_or_else(|| self.default_target());
        let mut ctx = RunContext::new(environment);
        ctx.set_var(TARGET_VAR, target);
        TaskRunner::new(&self.graph).run(target, &mut ctx)
    }

    /// Resolved execution order for a target, without running anything.
    pub fn plan(&self, target: &str) -> TorteResult<ResolvedPlan> {
        let order = self
            .graph
            .resolve(target)?
            .into_iter()
            .map(|id| self.graph.task(id).name.clone())
            .collect();
        Ok(ResolvedPlan {
            target: target.to_string(),
            order,
        })
    }

    /// Adjacency view of the whole task graph, in registration order.
    pub fn dependency_graph(&self) -> GraphView {
        let tasks = self
            .graph
            .tasks()
            .map(|(id, task)| GraphNode {
                name: task.name.clone(),
                description: task.description.clone(),
                dependencies: self
                    .graph
                    .dependency_names(id)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
            .collect();
        GraphView {
            tasks,
            cycles: self.graph.cycles().to_vec(),
        }
    }

    /// JSON Schema for the pipeline file format.
    pub fn config_schema() -> TorteResult<String> {
        let schema = schemars::schema_for!(PipelineConfig);
        serde_json::to_string_pretty(&schema)
            .map_err(|e| TorteError::Config(format!("Failed to serialize schema: {}", e)))
    }
}

fn child_vars(task_name: &str, ctx: &RunContext) -> Vec<(String, String)> {
    let mut vars = vec![(TASK_VAR.to_string(), task_name.to_string())];
    if let Some(target) = ctx.var(TARGET_VAR) {
        vars.push((TARGET_VAR.to_string(), target.to_string()));
    }
    vars
}
