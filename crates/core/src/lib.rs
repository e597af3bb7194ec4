//! Torte Core Library
//!
//! This is the core library for the Torte build task runner. It provides a
//! dependency-ordered task graph with conditional execution and
//! failure-isolation semantics: tasks declare dependencies, criteria guards,
//! error handlers, and finally handlers, and a requested target is executed
//! together with its transitive dependencies, each exactly once.
//!
//! ## Architecture
//!
//! The core library is organized into several modules:
//!
//! - [`manager`] - High-level pipeline management interface
//! - [`graph`] - Task registration, typed ids, and dependency resolution
//! - [`execution`] - Sequential executor and the process-backed environment
//! - [`context`] - Run-level state and the injected environment boundary
//! - [`task`] - Task model and outcomes
//! - [`configs`] - Pipeline file parsing
//! - [`results`] - Result types for runs, plans, and graph views
//! - [`platform`] - Platform shell selection
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! Pipelines can be declared programmatically through the fluent builder:
//!
//! ```rust
//! use torte_core::graph::PipelineBuilder;
//!
//! # fn example() -> torte_core::types::TorteResult<()> {
//! let mut builder = PipelineBuilder::new();
//! builder.task("clean").does(|_ctx| Ok(()));
//! builder
//!     .task("build")
//!     .depends_on("clean")
//!     .with_criteria(|ctx| ctx.env_var("SKIP_BUILD").is_none())
//!     .does(|ctx| {
//!         ctx.info("building");
//!         Ok(())
//!     });
//! let graph = builder.build()?;
//! # let _ = graph;
//! # Ok(())
//! # }
//! ```
//!
//! or loaded from a `torte.yml` file via [`manager::PipelineManager`].

pub mod configs;
pub mod context;
pub mod execution;
pub mod graph;
pub mod manager;
pub mod platform;
pub mod results;
pub mod task;
pub mod types;

// Re-export the main types for easier usage
pub use context::{RunContext, RunEnvironment};
pub use execution::{SystemEnvironment, TaskRunner};
pub use graph::{PipelineBuilder, TaskGraph, TaskId};
pub use manager::PipelineManager;
pub use results::RunReport;
pub use task::Outcome;
pub use types::{TorteError, TorteResult};
