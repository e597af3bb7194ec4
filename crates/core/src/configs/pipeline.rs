use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::RunContext;
use crate::types::TorteResult;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Command {
    Single(String),
    Multiple(Vec<String>),
}

/// Environment-variable guard, the config-expressible subset of criteria.
/// With neither `equals` nor `notEquals`, the variable must be set and
/// non-empty.
#[derive(Deserialize, Serialize, JsonSchema, Clone, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CriterionConfig {
    pub env: String,
    pub equals: Option<String>,
    pub not_equals: Option<String>,
}

impl CriterionConfig {
    pub fn is_met(&self, ctx: &RunContext) -> bool {
        let value = ctx.env_var(&self.env);
        if let Some(expected) = &self.equals {
            return value.as_deref() == Some(expected.as_str());
        }
        if let Some(rejected) = &self.not_equals {
            return value.as_deref() != Some(rejected.as_str());
        }
        value.map(|v| !v.is_empty()).unwrap_or(false)
    }
}

#[derive(Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskConfig {
    pub name: String,
    pub description: Option<String>,
    pub dependencies: Option<Vec<String>>,
    pub command: Option<Command>,
    pub script: Option<String>,
    pub criteria: Option<Vec<CriterionConfig>>,
    /// Attach the standard isolation handler: a failure is recorded and the
    /// run continues with the next task.
    pub continue_on_error: Option<bool>,
    /// Attach a finally handler that fails the run when any isolated
    /// failures were recorded, once every task has been attempted.
    pub fail_on_handled_errors: Option<bool>,
}

#[derive(Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub default_target: Option<String>,
    pub tasks: Vec<TaskConfig>,
}

pub fn parse_pipeline_config(yaml_str: &str) -> TorteResult<PipelineConfig> {
    let config: PipelineConfig = serde_yaml::from_str(yaml_str)?;
    Ok(config)
}
