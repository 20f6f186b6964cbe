//! Table-driven agent implementation.
//!
//! An [`Agent`] pairs an [`AgentInfo`] with an explicit command table. The
//! table is checked against the declared capability list when the agent is
//! built, so the advertised commands and the dispatchable commands can never
//! drift apart.

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::envelope::ResultEnvelope;
use super::error::{AgentError, AgentResult};
use super::invocation::CommandInvocation;
use super::unit::{AgentInfo, CapabilityUnit, validate_required_params};

/// Future returned by a command handler.
pub type CommandFuture = BoxFuture<'static, AgentResult<Value>>;

/// Type-erased command handler.
pub type CommandHandler = Arc<dyn Fn(CommandInvocation) -> CommandFuture + Send + Sync>;

/// One entry of an agent's command table.
#[derive(Clone)]
pub struct Command {
    name: String,
    description: String,
    required: Vec<String>,
    handler: CommandHandler,
}

impl Command {
    /// Create a command from an async handler.
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CommandInvocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AgentResult<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            required: Vec::new(),
            handler: Arc::new(move |input| handler(input).boxed()),
        }
    }

    /// Declare parameter names that must be present before the handler runs.
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Required parameter names.
    pub fn required(&self) -> &[String] {
        &self.required
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// A capability unit backed by an explicit command table.
#[derive(Debug, Clone)]
pub struct Agent {
    info: AgentInfo,
    commands: Vec<Command>,
}

impl Agent {
    /// Start building an agent with the given identifier.
    pub fn builder(id: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(id)
    }

    /// Look up a command by exact name.
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// All commands, in declaration order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn metadata(&self, command: &str) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("agent".to_string(), json!(self.info.id));
        metadata.insert("version".to_string(), json!(self.info.version));
        metadata.insert("command".to_string(), json!(command));
        metadata.insert(
            "executedAt".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );
        metadata
    }
}

#[async_trait]
impl CapabilityUnit for Agent {
    fn info(&self) -> &AgentInfo {
        &self.info
    }

    #[instrument(skip_all, fields(agent = %self.info.id, command = %input.command))]
    async fn execute(&self, input: CommandInvocation) -> ResultEnvelope {
        let Some(command) = self.command(&input.command) else {
            warn!("Unknown command requested: {}", input.command);
            return ResultEnvelope::failure(AgentError::unknown_command(&input.command).to_string());
        };

        // Commands without required names accept an absent parameter map.
        if !command.required.is_empty() {
            if let Err(e) = validate_required_params(&input, command.required.as_slice()) {
                warn!("Parameter validation failed: {}", e);
                return ResultEnvelope::failure(e.to_string());
            }
        }

        let name = command.name.clone();
        let future = (command.handler)(input);

        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(data)) => {
                debug!("Command '{}' completed", name);
                ResultEnvelope::success(data).with_metadata(self.metadata(&name))
            }
            Ok(Err(e)) => {
                warn!("Command '{}' failed: {}", name, e);
                ResultEnvelope::failure(e.to_string())
            }
            Err(_) => {
                warn!("Command '{}' panicked", name);
                ResultEnvelope::failure(format!("Command '{}' failed unexpectedly", name))
            }
        }
    }
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    id: String,
    name: Option<String>,
    description: String,
    version: String,
    capabilities: Vec<String>,
    commands: Vec<Command>,
}

impl AgentBuilder {
    /// Create a new builder.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: String::new(),
            version: "0.1.0".to_string(),
            capabilities: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Human-readable name (defaults to the identifier).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Free-text description advertised to clients.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Semantic version string (defaults to `0.1.0`).
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Declare the advertised command names.
    pub fn capabilities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a command to the table.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Build the agent, checking the command table against the capabilities.
    pub fn build(self) -> AgentResult<Agent> {
        if self.id.trim().is_empty() {
            return Err(AgentError::definition(&self.id, "identifier must not be empty"));
        }

        let mut seen = HashSet::new();
        for command in &self.commands {
            if !seen.insert(command.name.as_str()) {
                return Err(AgentError::definition(
                    &self.id,
                    format!("duplicate command '{}'", command.name),
                ));
            }
            if !self.capabilities.contains(&command.name) {
                return Err(AgentError::definition(
                    &self.id,
                    format!("command '{}' is not a declared capability", command.name),
                ));
            }
        }

        if let Some(missing) = self
            .capabilities
            .iter()
            .find(|cap| !seen.contains(cap.as_str()))
        {
            return Err(AgentError::definition(
                &self.id,
                format!("capability '{}' has no command handler", missing),
            ));
        }

        Ok(Agent {
            info: AgentInfo {
                name: self.name.unwrap_or_else(|| self.id.clone()),
                id: self.id,
                description: self.description,
                version: self.version,
                capabilities: self.capabilities,
            },
            commands: self.commands,
        })
    }
}
