//! Task graph construction and dependency resolution
//!
//! Tasks are registered through a fluent [`PipelineBuilder`] in the order the
//! pipeline declares them. [`PipelineBuilder::build`] resolves every declared
//! dependency name to a typed [`TaskId`] up front, so execution never does a
//! stringly-typed lookup. The resulting [`TaskGraph`] is immutable.

use std::collections::HashMap;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::NodeIndex;
use petgraph::prelude::DiGraph;

use crate::context::RunContext;
use crate::task::{Action, Criterion, ErrorHandler, FinallyHandler, Task};
use crate::types::{TorteError, TorteResult};

/// Opaque identifier of a registered task. Ordering follows registration
/// order, which is also the order finally handlers fire in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(NodeIndex);

impl TaskId {
    pub(crate) fn index(self) -> usize {
        self.0.index()
    }
}

struct TaskDeclaration {
    name: String,
    description: Option<String>,
    dependencies: Vec<String>,
    criteria: Vec<Criterion>,
    action: Option<Action>,
    error_handler: Option<ErrorHandler>,
    finally_handler: Option<FinallyHandler>,
}

/// Fluent registration of pipeline tasks.
///
/// ```
/// use torte_core::graph::PipelineBuilder;
///
/// let mut builder = PipelineBuilder::new();
/// builder.task("clean").does(|_ctx| Ok(()));
/// builder
///     .task("build")
///     .depends_on("clean")
///     .does(|ctx| {
///         ctx.info("building");
///         Ok(())
///     });
/// let graph = builder.build().unwrap();
/// assert_eq!(graph.len(), 2);
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    declarations: Vec<TaskDeclaration>,
    index_by_name: HashMap<String, usize>,
    duplicate: Option<String>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task and return a handle for attaching dependencies,
    /// criteria, and handlers. Registering the same name twice is a
    /// configuration error reported by [`PipelineBuilder::build`].
    pub fn task(&mut self, name: impl Into<String>) -> TaskHandle<'_> {
        let name = name.into();
        if self.index_by_name.contains_key(&name) && self.duplicate.is_none() {
            self.duplicate = Some(name.clone());
        }
        let index = self.declarations.len();
        self.index_by_name.entry(name.clone()).or_insert(index);
        self.declarations.push(TaskDeclaration {
            name,
            description: None,
            dependencies: Vec::new(),
            criteria: Vec::new(),
            action: None,
            error_handler: None,
            finally_handler: None,
        });
        TaskHandle {
            declaration: &mut self.declarations[index],
        }
    }

    /// Resolve all declared names and freeze the graph.
    pub fn build(self) -> TorteResult<TaskGraph> {
        if let Some(name) = self.duplicate {
            return Err(TorteError::DuplicateTask(name));
        }

        let mut graph = DiGraph::<String, ()>::new();
        let mut ids_by_name = HashMap::new();

        // Nodes are added in registration order, so NodeIndex order and
        // registration order coincide.
        for declaration in &self.declarations {
            let node = graph.add_node(declaration.name.clone());
            ids_by_name.insert(declaration.name.clone(), TaskId(node));
        }

        let mut tasks = Vec::with_capacity(self.declarations.len());
        for declaration in self.declarations {
            let from = ids_by_name[&declaration.name];
            let mut dependencies = Vec::with_capacity(declaration.dependencies.len());
            for dependency in &declaration.dependencies {
                let to = ids_by_name.get(dependency).copied().ok_or_else(|| {
                    TorteError::UnknownDependency {
                        task: declaration.name.clone(),
                        dependency: dependency.clone(),
                    }
                })?;
                // Edge: task -> dependency (dependency comes first)
                graph.add_edge(from.0, to.0, ());
                dependencies.push(to);
            }
            tasks.push(Task {
                name: declaration.name,
                description: declaration.description,
                dependencies,
                criteria: declaration.criteria,
                action: declaration.action,
                error_handler: declaration.error_handler,
                finally_handler: declaration.finally_handler,
            });
        }

        // Detect cycles using strongly connected components. A cyclic graph
        // still builds; resolution of any task on a cycle fails, and the
        // cycles are surfaced for presentation.
        let mut cycles: Vec<Vec<String>> = kosaraju_scc(&graph)
            .into_iter()
            .filter_map(|component| {
                if component.len() > 1 {
                    let mut cycle = component
                        .iter()
                        .map(|node| graph[*node].clone())
                        .collect::<Vec<_>>();
                    cycle.sort();
                    Some(cycle)
                } else {
                    let node = component[0];
                    if graph.contains_edge(node, node) {
                        Some(vec![graph[node].clone()])
                    } else {
                        None
                    }
                }
            })
            .collect();
        cycles.sort();

        Ok(TaskGraph {
            graph,
            tasks,
            ids_by_name,
            cycles,
        })
    }
}

/// Mutable handle to a task being declared.
pub struct TaskHandle<'a> {
    declaration: &'a mut TaskDeclaration,
}

impl<'a> TaskHandle<'a> {
    pub fn describe(self, text: impl Into<String>) -> Self {
        self.declaration.description = Some(text.into());
        self
    }

    /// Declare a dependency by name. Resolved to a [`TaskId`] at build time.
    pub fn depends_on(self, name: impl Into<String>) -> Self {
        self.declaration.dependencies.push(name.into());
        self
    }

    /// Attach a criteria predicate. All criteria must evaluate true, in
    /// declaration order, for the action to run; otherwise the task is
    /// skipped.
    pub fn with_criteria(self, criterion: impl Fn(&RunContext) -> bool + 'static) -> Self {
        self.declaration.criteria.push(Box::new(criterion));
        self
    }

    /// Attach the task's action body.
    pub fn does(self, action: impl Fn(&mut RunContext) -> anyhow::Result<()> + 'static) -> Self {
        self.declaration.action = Some(Box::new(action));
        self
    }

    /// Attach an error handler. A failing task with a handler does not abort
    /// the run; the failure is recorded and execution continues.
    pub fn on_error(self, handler: impl Fn(&mut RunContext, &anyhow::Error) + 'static) -> Self {
        self.declaration.error_handler = Some(Box::new(handler));
        self
    }

    /// Attach a finally handler, invoked once after the whole resolved
    /// sequence completes, whatever the outcomes.
    pub fn finally(
        self,
        handler: impl Fn(&mut RunContext) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.declaration.finally_handler = Some(Box::new(handler));
        self
    }
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

/// Immutable task graph: the task table plus the dependency relation.
pub struct TaskGraph {
    graph: DiGraph<String, ()>,
    tasks: Vec<Task>,
    ids_by_name: HashMap<String, TaskId>,
    cycles: Vec<Vec<String>>,
}

impl TaskGraph {
    pub fn task_id(&self, name: &str) -> Option<TaskId> {
        self.ids_by_name.get(name).copied()
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.index()]
    }

    /// All tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.graph
            .node_indices()
            .map(move |node| (TaskId(node), &self.tasks[node.index()]))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Dependency cycles detected at build time, each as a sorted list of
    /// the task names on the cycle.
    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    /// Dependency names of a task, in declaration order.
    pub fn dependency_names(&self, id: TaskId) -> Vec<&str> {
        self.tasks[id.index()]
            .dependencies
            .iter()
            .map(|dep| self.tasks[dep.index()].name.as_str())
            .collect()
    }

    /// Compute the ordered sequence of tasks to evaluate for `target`:
    /// a depth-first post-order over the dependency relation, visiting each
    /// task at most once, with every dependency strictly before its
    /// dependents.
    pub fn resolve(&self, target: &str) -> TorteResult<Vec<TaskId>> {
        let start = self
            .task_id(target)
            .ok_or_else(|| TorteError::TargetNotFound(target.to_string()))?;

        let mut states = vec![VisitState::Unvisited; self.tasks.len()];
        let mut order = Vec::new();
        let mut path = Vec::new();
        self.visit(start, &mut states, &mut order, &mut path)?;
        Ok(order)
    }

    fn visit(
        &self,
        id: TaskId,
        states: &mut [VisitState],
        order: &mut Vec<TaskId>,
        path: &mut Vec<TaskId>,
    ) -> TorteResult<()> {
        match states[id.index()] {
            VisitState::Done => return Ok(()),
            VisitState::InProgress => {
                // Close the loop for the error message: a -> b -> a
                let mut chain: Vec<String> = path
                    .iter()
                    .skip_while(|visited| **visited != id)
                    .map(|visited| self.tasks[visited.index()].name.clone())
                    .collect();
                chain.push(self.tasks[id.index()].name.clone());
                return Err(TorteError::CyclicDependency { chain });
            }
            VisitState::Unvisited => {}
        }

        states[id.index()] = VisitState::InProgress;
        path.push(id);
        for dependency in &self.tasks[id.index()].dependencies {
            self.visit(*dependency, states, order, path)?;
        }
        path.pop();
        states[id.index()] = VisitState::Done;
        order.push(id);
        Ok(())
    }
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.tasks)
            .finish()
    }
}
