//! Task execution module
//!
//! This module handles the actual execution of resolved task sequences,
//! including the production process-backed environment.

pub mod process;
pub mod runner;

pub use process::SystemEnvironment;
pub use runner::TaskRunner;
