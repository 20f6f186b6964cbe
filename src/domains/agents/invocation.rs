//! Command invocation input types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::error::{AgentError, AgentResult};

/// Parameter mapping passed to a command.
pub type Params = Map<String, Value>;

/// Optional caller information attached to an invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    /// Identity of the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Session the call belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Environment values made available to the command.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,
}

/// A single request to run a command on an agent.
///
/// Built fresh per call and consumed by the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandInvocation {
    /// Name of the command to run.
    pub command: String,

    /// Parameters for the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,

    /// Caller context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ExecutionContext>,
}

impl CommandInvocation {
    /// Create an invocation with no parameters.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params: None,
            context: None,
        }
    }

    /// Set the parameter mapping.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Insert a single parameter, creating the mapping if needed.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Map::new)
            .insert(name.into(), value.into());
        self
    }

    /// Set the execution context.
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Look up a raw parameter value.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref().and_then(|p| p.get(name))
    }

    /// Deserialize the parameter mapping into a typed parameter struct.
    ///
    /// Fails with [`AgentError::MissingParams`] when there is no mapping and
    /// with [`AgentError::InvalidParameters`] when the shape does not match.
    pub fn parse_params<T: DeserializeOwned>(&self) -> AgentResult<T> {
        let params = self.params.as_ref().ok_or(AgentError::MissingParams)?;

        serde_json::from_value(Value::Object(params.clone()))
            .map_err(|e| AgentError::invalid_parameters(&self.command, e.to_string()))
    }
}
