//! Sequential task executor
//!
//! Runs a resolved task sequence strictly in order: criteria guards decide
//! skips, error handlers isolate failures, an unhandled failure aborts the
//! remaining sequence, and finally handlers of every visited task run exactly
//! once after the sequence ends.

use crate::context::RunContext;
use crate::graph::{TaskGraph, TaskId};
use crate::results::{RunReport, TaskReport};
use crate::task::Outcome;
use crate::types::{TorteError, TorteResult};

/// Executor over an immutable [`TaskGraph`].
pub struct TaskRunner<'g> {
    graph: &'g TaskGraph,
}

impl<'g> TaskRunner<'g> {
    pub fn new(graph: &'g TaskGraph) -> Self {
        Self { graph }
    }

    /// Execute `target` and its transitive dependencies, each at most once.
    ///
    /// Configuration errors (unknown target, cycles) return `Err` with zero
    /// actions executed. Run-time failures are captured in the returned
    /// [`RunReport`]; use [`RunReport::into_result`] to re-raise an aborting
    /// failure.
    pub fn run(&self, target: &str, ctx: &mut RunContext) -> TorteResult<RunReport> {
        let order = self.graph.resolve(target)?;

        let mut outcomes = vec![Outcome::NotRun; self.graph.len()];
        let mut visited: Vec<TaskId> = Vec::new();
        let mut failure: Option<TorteError> = None;

        for id in &order {
            let task = self.graph.task(*id);
            visited.push(*id);

            // Criteria are evaluated in declaration order; the first false
            // predicate skips the task. A skip is not a dependency failure.
            let mut criteria_met = true;
            for criterion in &task.criteria {
                if !criterion(&*ctx) {
                    criteria_met = false;
                    break;
                }
            }
            if !criteria_met {
                outcomes[id.index()] = Outcome::Skipped;
                ctx.info(&format!("Skipping task '{}' (criteria not met)", task.name));
                continue;
            }

            let Some(action) = &task.action else {
                // Aggregation target with no body of its own.
                outcomes[id.index()] = Outcome::Succeeded;
                continue;
            };

            ctx.info(&format!("Running task '{}'", task.name));
            match action(ctx) {
                Ok(()) => {
                    outcomes[id.index()] = Outcome::Succeeded;
                }
                Err(error) => {
                    outcomes[id.index()] = Outcome::Failed;
                    if let Some(handler) = &task.error_handler {
                        handler(ctx, &error);
                        ctx.warn(&format!(
                            "Task '{}' failed, continuing with the next task",
                            task.name
                        ));
                        ctx.record_handled_failure(&task.name, error);
                    } else {
                        failure = Some(TorteError::Action {
                            task: task.name.clone(),
                            cause: error,
                        });
                        break;
                    }
                }
            }
        }

        // Finally handlers of every visited task run exactly once, in
        // registration order, whatever the individual outcomes were.
        visited.sort();
        for id in visited {
            let task = self.graph.task(id);
            if let Some(finally) = &task.finally_handler {
                if let Err(error) = finally(ctx) {
                    if failure.is_none() {
                        failure = Some(TorteError::Action {
                            task: task.name.clone(),
                            cause: error,
                        });
                    } else {
                        ctx.error(&format!(
                            "Finally handler of task '{}' failed: {:#}",
                            task.name, error
                        ));
                    }
                }
            }
        }

        let outcomes = order
            .iter()
            .map(|id| TaskReport {
                name: self.graph.task(*id).name.clone(),
                outcome: outcomes[id.index()],
            })
            .collect();

        Ok(RunReport {
            target: target.to_string(),
            outcomes,
            handled_failures: ctx.take_handled_failures(),
            failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    use anyhow::anyhow;

    use super::*;
    use crate::context::RunEnvironment;
    use crate::graph::PipelineBuilder;

    /// Environment that records log lines and never touches the system.
    #[derive(Default)]
    struct TestEnvironment {
        log: RefCell<Vec<String>>,
    }

    impl RunEnvironment for TestEnvironment {
        fn info(&self, message: &str) {
            self.log.borrow_mut().push(message.to_string());
        }

        fn warn(&self, message: &str) {
            self.log.borrow_mut().push(format!("warn: {}", message));
        }

        fn error(&self, message: &str) {
            self.log.borrow_mut().push(format!("error: {}", message));
        }

        fn env_var(&self, _name: &str) -> Option<String> {
            None
        }

        fn file_exists(&self, _path: &Path) -> bool {
            false
        }

        fn run_shell(&self, _command: &str, _vars: &[(String, String)]) -> anyhow::Result<()> {
            Ok(())
        }

        fn run_command(
            &self,
            _program: &str,
            _args: &[String],
            _vars: &[(String, String)],
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn trace() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn record(trace: &Rc<RefCell<Vec<String>>>, entry: &str) {
        trace.borrow_mut().push(entry.to_string());
    }

    fn outcome_of(report: &RunReport, name: &str) -> Outcome {
        report
            .outcomes
            .iter()
            .find(|task| task.name == name)
            .map(|task| task.outcome)
            .unwrap_or_else(|| panic!("task '{}' missing from report", name))
    }

    #[test]
    fn runs_pipeline_in_dependency_order() {
        let trace = trace();
        let mut builder = PipelineBuilder::new();
        for name in ["clean", "build", "test", "package"] {
            let t = trace.clone();
            let task = builder.task(name).does(move |_ctx| {
                record(&t, name);
                Ok(())
            });
            match name {
                "build" => {
                    task.depends_on("clean");
                }
                "test" => {
                    task.depends_on("build");
                }
                "package" => {
                    task.depends_on("build").depends_on("test");
                }
                _ => {}
            }
        }

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("package", &mut ctx).unwrap();

        assert!(report.succeeded());
        assert_eq!(
            *trace.borrow(),
            vec!["clean", "build", "test", "package"],
            "dependencies must run strictly before dependents"
        );
        for name in ["clean", "build", "test", "package"] {
            assert_eq!(outcome_of(&report, name), Outcome::Succeeded);
        }
    }

    #[test]
    fn cycle_executes_zero_actions() {
        let trace = trace();
        let mut builder = PipelineBuilder::new();
        let t = trace.clone();
        builder.task("a").depends_on("b").does(move |_ctx| {
            record(&t, "a");
            Ok(())
        });
        let t = trace.clone();
        builder.task("b").depends_on("a").does(move |_ctx| {
            record(&t, "b");
            Ok(())
        });

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let result = TaskRunner::new(&graph).run("a", &mut ctx);

        assert!(matches!(
            result,
            Err(TorteError::CyclicDependency { .. })
        ));
        assert!(trace.borrow().is_empty(), "no action may run on a cycle");
    }

    #[test]
    fn false_criteria_skips_action_but_not_dependents() {
        let trace = trace();
        let mut builder = PipelineBuilder::new();
        let t = trace.clone();
        builder
            .task("restore")
            .with_criteria(|_ctx| false)
            .does(move |_ctx| {
                record(&t, "restore");
                Ok(())
            });
        let t = trace.clone();
        builder.task("build").depends_on("restore").does(move |_ctx| {
            record(&t, "build");
            Ok(())
        });

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("build", &mut ctx).unwrap();

        assert!(report.succeeded());
        assert_eq!(outcome_of(&report, "restore"), Outcome::Skipped);
        assert_eq!(outcome_of(&report, "build"), Outcome::Succeeded);
        assert_eq!(*trace.borrow(), vec!["build"]);
    }

    #[test]
    fn criteria_are_evaluated_in_declaration_order_and_short_circuit() {
        let trace = trace();
        let mut builder = PipelineBuilder::new();
        let first = trace.clone();
        let second = trace.clone();
        builder
            .task("publish")
            .with_criteria(move |_ctx| {
                record(&first, "first");
                false
            })
            .with_criteria(move |_ctx| {
                record(&second, "second");
                true
            })
            .does(|_ctx| Ok(()));

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("publish", &mut ctx).unwrap();

        assert_eq!(outcome_of(&report, "publish"), Outcome::Skipped);
        assert_eq!(*trace.borrow(), vec!["first"], "second criterion must not run");
    }

    #[test]
    fn skipped_task_error_handler_does_not_run() {
        let trace = trace();
        let mut builder = PipelineBuilder::new();
        let t = trace.clone();
        builder
            .task("publish")
            .with_criteria(|_ctx| false)
            .does(|_ctx| Err(anyhow!("boom")))
            .on_error(move |_ctx, _error| record(&t, "handler"));

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("publish", &mut ctx).unwrap();

        assert!(report.succeeded());
        assert!(trace.borrow().is_empty());
    }

    #[test]
    fn handled_failure_is_isolated_and_recorded() {
        let trace = trace();
        let mut builder = PipelineBuilder::new();
        let t = trace.clone();
        builder
            .task("publish-myget")
            .does(|_ctx| Err(anyhow!("api key missing")))
            .on_error(move |_ctx, error| record(&t, &format!("handled: {}", error)));
        let t = trace.clone();
        builder.task("publish-nuget").does(move |_ctx| {
            record(&t, "publish-nuget");
            Ok(())
        });
        builder
            .task("publish")
            .depends_on("publish-myget")
            .depends_on("publish-nuget");

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("publish", &mut ctx).unwrap();

        assert!(report.succeeded(), "handled failure must not abort the run");
        assert_eq!(outcome_of(&report, "publish-myget"), Outcome::Failed);
        assert_eq!(outcome_of(&report, "publish-nuget"), Outcome::Succeeded);
        assert_eq!(outcome_of(&report, "publish"), Outcome::Succeeded);
        assert_eq!(report.handled_failures.len(), 1);
        assert_eq!(report.handled_failures[0].task, "publish-myget");
        assert_eq!(
            *trace.borrow(),
            vec!["handled: api key missing", "publish-nuget"]
        );
    }

    #[test]
    fn unhandled_failure_aborts_remaining_tasks_but_not_finallys() {
        let trace = trace();
        let mut builder = PipelineBuilder::new();
        let t = trace.clone();
        builder
            .task("clean")
            .does(move |_ctx| {
                record(&t, "clean");
                Ok(())
            })
            .finally({
                let t = trace.clone();
                move |_ctx| {
                    record(&t, "finally: clean");
                    Ok(())
                }
            });
        let t = trace.clone();
        builder.task("build").depends_on("clean").does(move |_ctx| {
            record(&t, "build");
            Ok(())
        });
        builder
            .task("test")
            .depends_on("build")
            .does(|_ctx| Err(anyhow!("assertion failed")))
            .finally({
                let t = trace.clone();
                move |_ctx| {
                    record(&t, "finally: test");
                    Ok(())
                }
            });
        let t = trace.clone();
        builder
            .task("package")
            .depends_on("build")
            .depends_on("test")
            .does(move |_ctx| {
                record(&t, "package");
                Ok(())
            });

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("package", &mut ctx).unwrap();

        assert!(!report.succeeded());
        assert_eq!(outcome_of(&report, "test"), Outcome::Failed);
        assert_eq!(outcome_of(&report, "package"), Outcome::NotRun);
        assert_eq!(
            *trace.borrow(),
            vec!["clean", "build", "finally: clean", "finally: test"]
        );

        match report.into_result() {
            Err(TorteError::Action { task, .. }) => assert_eq!(task, "test"),
            other => panic!("expected aborting Action failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn finally_runs_exactly_once_per_visited_task_in_registration_order() {
        let trace = trace();
        let mut builder = PipelineBuilder::new();
        // Registered in an order that differs from the resolved order.
        builder
            .task("package")
            .depends_on("build")
            .with_criteria(|_ctx| false)
            .finally({
                let t = trace.clone();
                move |_ctx| {
                    record(&t, "finally: package");
                    Ok(())
                }
            });
        builder.task("build").depends_on("clean").finally({
            let t = trace.clone();
            move |_ctx| {
                record(&t, "finally: build");
                Ok(())
            }
        });
        builder.task("clean").finally({
            let t = trace.clone();
            move |_ctx| {
                record(&t, "finally: clean");
                Ok(())
            }
        });

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("package", &mut ctx).unwrap();

        assert!(report.succeeded());
        assert_eq!(outcome_of(&report, "package"), Outcome::Skipped);
        assert_eq!(
            *trace.borrow(),
            vec!["finally: package", "finally: build", "finally: clean"],
            "finally handlers fire once each, in registration order"
        );
    }

    #[test]
    fn finally_sees_handled_failures_and_can_escalate() {
        let mut builder = PipelineBuilder::new();
        builder
            .task("publish-myget")
            .does(|_ctx| Err(anyhow!("service unavailable")))
            .on_error(|_ctx, _error| {});
        builder
            .task("publish")
            .depends_on("publish-myget")
            .finally(|ctx| {
                if ctx.handled_failures().is_empty() {
                    Ok(())
                } else {
                    Err(anyhow!(
                        "an error occurred during publishing; all tasks were attempted"
                    ))
                }
            });

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("publish", &mut ctx).unwrap();

        assert!(!report.succeeded(), "finally escalation must fail the run");
        assert_eq!(report.handled_failures.len(), 1);
        match report.failure {
            Some(TorteError::Action { task, .. }) => assert_eq!(task, "publish"),
            other => panic!("expected escalation from 'publish', got {:?}", other),
        }
    }

    #[test]
    fn aborting_failure_takes_precedence_over_finally_escalation() {
        let mut builder = PipelineBuilder::new();
        builder
            .task("test")
            .does(|_ctx| Err(anyhow!("tests failed")))
            .finally(|_ctx| Err(anyhow!("cleanup failed too")));

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("test", &mut ctx).unwrap();

        match &report.failure {
            Some(TorteError::Action { task, cause }) => {
                assert_eq!(task, "test");
                assert_eq!(cause.to_string(), "tests failed");
            }
            other => panic!("expected the action failure, got {:?}", other),
        }
        // The secondary finally failure is still surfaced in the log.
        assert!(env
            .log
            .borrow()
            .iter()
            .any(|line| line.contains("cleanup failed too")));
    }

    #[test]
    fn criteria_skip_keeps_dependency_running() {
        // `publish` has a false guard; requesting it still runs `package`.
        let trace = trace();
        let mut builder = PipelineBuilder::new();
        let t = trace.clone();
        builder.task("package").does(move |_ctx| {
            record(&t, "package");
            Ok(())
        });
        let t = trace.clone();
        builder
            .task("publish")
            .depends_on("package")
            .with_criteria(|ctx| ctx.env_var("SHOULD_PUBLISH").as_deref() == Some("true"))
            .does(move |_ctx| {
                record(&t, "publish");
                Ok(())
            });

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("publish", &mut ctx).unwrap();

        assert!(report.succeeded());
        assert_eq!(outcome_of(&report, "package"), Outcome::Succeeded);
        assert_eq!(outcome_of(&report, "publish"), Outcome::Skipped);
        assert_eq!(*trace.borrow(), vec!["package"]);
    }

    #[test]
    fn run_context_vars_flow_from_handlers_to_finally() {
        let mut builder = PipelineBuilder::new();
        builder
            .task("publish-nuget")
            .does(|_ctx| Err(anyhow!("rejected")))
            .on_error(|ctx, _error| ctx.set_var("publishing_error", "true"));
        builder
            .task("publish")
            .depends_on("publish-nuget")
            .finally(|ctx| {
                if ctx.var("publishing_error") == Some("true") {
                    Err(anyhow!("publishing failed"))
                } else {
                    Ok(())
                }
            });

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();
        let mut ctx = RunContext::new(&env);
        let report = TaskRunner::new(&graph).run("publish", &mut ctx).unwrap();

        assert!(!report.succeeded());
    }

    #[test]
    fn outcomes_are_not_reused_across_runs() {
        let mut builder = PipelineBuilder::new();
        builder.task("build").does(|_ctx| Ok(()));

        let graph = builder.build().unwrap();
        let env = TestEnvironment::default();

        for _ in 0..2 {
            let mut ctx = RunContext::new(&env);
            let report = TaskRunner::new(&graph).run("build", &mut ctx).unwrap();
            assert_eq!(outcome_of(&report, "build"), Outcome::Succeeded);
            assert!(report.handled_failures.is_empty());
        }
    }
}
