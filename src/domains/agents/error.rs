//! Agent-specific error types.

use thiserror::Error;

/// A specialized Result type for command handlers and agent construction.
pub type AgentResult<T> = std::result::Result<T, AgentError>;

/// Errors that can occur inside an agent.
///
/// These never cross the agent boundary as `Err`: `Agent::execute` turns
/// them into failure envelopes. The only exception is [`AgentError::Definition`],
/// which is raised while building an agent at startup.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The invocation carried no parameter mapping at all.
    #[error("Missing parameters")]
    MissingParams,

    /// One or more required parameter names are absent from the mapping.
    #[error("Missing required parameter(s): {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    /// The parameter mapping does not match the command's parameter shape.
    #[error("Invalid parameters for '{command}': {reason}")]
    InvalidParameters { command: String, reason: String },

    /// The command name is not part of the agent's command table.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The command logic failed.
    #[error("{0}")]
    ExecutionFailed(String),

    /// The agent's command table does not match its declared capabilities.
    #[error("Invalid definition for agent '{agent}': {reason}")]
    Definition { agent: String, reason: String },
}

impl AgentError {
    /// Create a new "missing parameters" error from the absent names.
    pub fn missing_parameters<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingParameters(names.into_iter().map(Into::into).collect())
    }

    /// Create a new "invalid parameters" error.
    pub fn invalid_parameters(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Create a new "unknown command" error.
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand(name.into())
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a new "definition" error.
    pub fn definition(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Definition {
            agent: agent.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by registry mutation.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An agent with the same identifier is already registered.
    #[error("Agent already registered: {0}")]
    AlreadyRegistered(String),

    /// A built-in agent failed its definition checks.
    #[error(transparent)]
    InvalidAgent(#[from] AgentError),
}

impl RegistryError {
    /// Create a new "already registered" error.
    pub fn already_registered(id: impl Into<String>) -> Self {
        Self::AlreadyRegistered(id.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_message() {
        let err = AgentError::unknown_command("port-sweep");
        assert_eq!(err.to_string(), "Unknown command: port-sweep");
    }

    #[test]
    fn test_missing_parameters_lists_names() {
        let err = AgentError::missing_parameters(["target", "ports"]);
        assert_eq!(
            err.to_string(),
            "Missing required parameter(s): target, ports"
        );
    }

    #[test]
    fn test_already_registered_message() {
        let err = RegistryError::already_registered("recon");
        assert_eq!(err.to_string(), "Agent already registered: recon");
    }
}
