//! Capability unit interface.
//!
//! A capability unit is a named, versioned set of commands behind a single
//! `execute` entry point. [`Agent`](super::Agent) is the shipped
//! implementation; anything else implementing [`CapabilityUnit`] can be
//! registered too.

use async_trait::async_trait;
use serde::Serialize;

use super::envelope::ResultEnvelope;
use super::error::{AgentError, AgentResult};
use super::invocation::CommandInvocation;

/// Identity and advertised commands of a capability unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInfo {
    /// Unique identifier; immutable once the unit is built.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Free-text description.
    pub description: String,

    /// Semantic version.
    pub version: String,

    /// Command names the unit accepts, in declaration order.
    pub capabilities: Vec<String>,
}

/// Trait implemented by everything the registry can dispatch to.
///
/// `execute` must never fail: every error is reported through the returned
/// envelope. Implementations hold no per-call mutable state.
#[async_trait]
pub trait CapabilityUnit: Send + Sync {
    /// Identity of this unit.
    fn info(&self) -> &AgentInfo;

    /// Unique identifier.
    fn id(&self) -> &str {
        &self.info().id
    }

    /// Human-readable name.
    fn name(&self) -> &str {
        &self.info().name
    }

    /// Free-text description.
    fn description(&self) -> &str {
        &self.info().description
    }

    /// Semantic version.
    fn version(&self) -> &str {
        &self.info().version
    }

    /// Supported command names.
    fn capabilities(&self) -> &[String] {
        &self.info().capabilities
    }

    /// Run a command.
    async fn execute(&self, input: CommandInvocation) -> ResultEnvelope;
}

/// Check that every name in `required` is a key of the parameter mapping.
///
/// Presence only: values are not inspected. Fails when the mapping itself is
/// absent, or with the full list of missing names otherwise.
pub fn validate_required_params<S: AsRef<str>>(
    input: &CommandInvocation,
    required: &[S],
) -> AgentResult<()> {
    let params = input.params.as_ref().ok_or(AgentError::MissingParams)?;

    let missing: Vec<&str> = required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !params.contains_key(*name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AgentError::missing_parameters(missing))
    }
}
