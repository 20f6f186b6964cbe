//! MCP Server implementation and lifecycle management.
//!
//! This module contains the protocol adapter: the `ServerHandler` that
//! exposes every registered agent as one MCP tool.
//!
//! ## Tool Mapping
//!
//! - `tools/list` yields one tool per agent, named by the agent identifier,
//!   with the same generic input schema (`command` + optional `params`).
//! - `tools/call` forwards to `AgentRegistry::execute` and returns the
//!   result envelope as pretty-printed JSON in a single text block.
//!
//! Unknown tool names are not protocol errors: the registry's
//! "Agent not found" envelope is returned as ordinary content.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::*,
    service::RequestContext,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::config::Config;
use super::error::Result;
use super::retry::RetryExecutor;
use crate::domains::agents::{AgentRegistry, CommandInvocation, Params, ResultEnvelope};

/// Command used when a tool call does not name one.
pub const DEFAULT_COMMAND: &str = "execute";

/// The main MCP server handler.
///
/// Cloning is cheap: the configuration and the frozen registry are shared.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registry of agents, read-only once the server is built.
    registry: Arc<AgentRegistry>,
}

impl McpServer {
    /// Create a new MCP server with the built-in agents.
    ///
    /// Fails if the built-in agents cannot be registered, which is a
    /// configuration error.
    pub fn new(config: Config) -> Result<Self> {
        let registry = AgentRegistry::with_builtin_agents(&config.agents.disabled)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Create a new MCP server around an existing registry.
    pub fn with_registry(config: Config, registry: AgentRegistry) -> Self {
        info!("Serving {} agent(s): {:?}", registry.len(), registry.ids());
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Get the agent registry.
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Retry executor built from the `executor` config section.
    ///
    /// Agent handlers that reach external services wrap their calls with it.
    pub fn retry_executor(&self) -> RetryExecutor {
        RetryExecutor::new(self.config.executor.clone())
    }

    /// One tool per registered agent, in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        let schema = Arc::new(agent_input_schema());

        self.registry
            .list()
            .into_iter()
            .map(|agent| Tool {
                name: agent.id().to_string().into(),
                description: Some(agent.description().to_string().into()),
                input_schema: schema.clone(),
                annotations: None,
                output_schema: None,
                icons: None,
                meta: None,
                title: Some(agent.name().to_string()),
            })
            .collect()
    }

    /// Run a tool call against the registry.
    ///
    /// `command` defaults to [`DEFAULT_COMMAND`] and `params` to an empty
    /// mapping when absent or not of the expected JSON type.
    #[instrument(skip(self, arguments))]
    pub async fn invoke(&self, name: &str, arguments: Option<JsonObject>) -> ResultEnvelope {
        let arguments = arguments.unwrap_or_default();

        let command = arguments
            .get("command")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_COMMAND);

        let params: Params = match arguments.get("params") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Params::new(),
            Some(other) => {
                warn!("Ignoring non-object params for '{}': {}", name, other);
                Params::new()
            }
        };

        let input = CommandInvocation::new(command).with_params(params);
        self.registry.execute(name, input).await
    }

    /// Run a tool call and wrap the envelope as MCP tool content.
    pub async fn call_agent_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let envelope = self.invoke(name, arguments).await;
        let text = envelope
            .to_pretty_json()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools as JSON (for HTTP transport).
    pub fn list_tools_json(&self) -> Vec<Value> {
        self.tools()
            .into_iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name and serialize the MCP result (for HTTP transport).
    pub async fn call_tool_json(
        &self,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<Value, String> {
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            _ => None,
        };

        let result = self
            .call_agent_tool(name, arguments)
            .await
            .map_err(|e| e.message.to_string())?;

        serde_json::to_value(&result).map_err(|e| e.to_string())
    }
}

/// Generic input schema shared by every agent tool.
pub fn agent_input_schema() -> JsonObject {
    match json!({
        "type": "object",
        "properties": {
            "command": { "type": "string" },
            "params": { "type": "object" }
        },
        "required": ["command"]
    }) {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Each tool is an agent. Call it with a `command` and optional `params`; \
                 the result is a JSON envelope with `success`, `data`, `error` and `metadata`."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("Calling tool: {}", request.name);
        self.call_agent_tool(&request.name, request.arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::agents::{Agent, AgentResult, Command};

    async fn noop(_input: CommandInvocation) -> AgentResult<Value> {
        Ok(json!({}))
    }

    fn builtin_server() -> McpServer {
        McpServer::new(Config::default()).unwrap()
    }

    fn args(value: Value) -> Option<JsonObject> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            RawContent::Text(text) => &text.text,
            _ => panic!("Expected text content"),
        }
    }

    #[test]
    fn test_tools_listing_in_registration_order() {
        let mut registry = AgentRegistry::new();
        for id in ["beta", "alpha"] {
            let agent = Agent::builder(id)
                .description(format!("{} agent", id))
                .capabilities(["execute"])
                .command(Command::new("execute", "", noop))
                .build()
                .unwrap();
            registry.register(agent).unwrap();
        }

        let server = McpServer::with_registry(Config::default(), registry);
        let tools = server.tools();

        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "beta");
        assert_eq!(tools[1].name, "alpha");
        assert_eq!(tools[0].description.as_deref(), Some("beta agent"));
    }

    #[test]
    fn test_tool_schema_is_generic() {
        let server = builtin_server();
        let expected = json!({
            "type": "object",
            "properties": {
                "command": { "type": "string" },
                "params": { "type": "object" }
            },
            "required": ["command"]
        });

        for tool in server.tools() {
            assert_eq!(Value::Object((*tool.input_schema).clone()), expected);
        }
    }

    #[test]
    fn test_list_tools_json_shape() {
        let server = builtin_server();
        let tools = server.list_tools_json();

        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "security-scan");
        assert_eq!(tools[1]["name"], "recon");
        assert_eq!(tools[0]["inputSchema"]["required"][0], "command");
    }

    #[tokio::test]
    async fn test_port_scan_end_to_end() {
        let server = builtin_server();
        let result = server
            .call_agent_tool(
                "security-scan",
                args(json!({ "command": "port-scan", "params": { "target": "192.168.1.1" } })),
            )
            .await
            .unwrap();

        assert_eq!(result.content.len(), 1);
        let envelope: Value = serde_json::from_str(text_of(&result)).unwrap();
        assert_eq!(envelope["success"], true);
        assert_eq!(envelope["data"]["target"], "192.168.1.1");
        assert!(envelope.get("error").is_none());
    }

    #[tokio::test]
    async fn test_missing_target_end_to_end() {
        let server = builtin_server();
        let envelope = server
            .invoke(
                "security-scan",
                args(json!({ "command": "port-scan", "params": {} })),
            )
            .await;

        assert!(!envelope.success);
        assert!(!envelope.error.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_ordinary_content() {
        let server = builtin_server();
        let result = server
            .call_agent_tool("nonexistent-id", args(json!({ "command": "x" })))
            .await
            .unwrap();

        let envelope: Value = serde_json::from_str(text_of(&result)).unwrap();
        assert_eq!(
            envelope,
            json!({ "success": false, "error": "Agent not found: nonexistent-id" })
        );
        assert_ne!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_missing_command_defaults_to_execute() {
        let server = builtin_server();
        let envelope = server.invoke("recon", None).await;

        assert_eq!(envelope.error.as_deref(), Some("Unknown command: execute"));
    }

    #[tokio::test]
    async fn test_non_object_params_are_ignored() {
        let server = builtin_server();
        let envelope = server
            .invoke(
                "recon",
                args(json!({ "command": "whois", "params": "example.com" })),
            )
            .await;

        assert!(!envelope.success);
        assert_eq!(
            envelope.error.as_deref(),
            Some("Missing required parameter(s): domain")
        );
    }

    #[tokio::test]
    async fn test_call_tool_json_serializes_content() {
        let server = builtin_server();
        let result = server
            .call_tool_json(
                "recon",
                json!({ "command": "whois", "params": { "domain": "example.com" } }),
            )
            .await
            .unwrap();

        let text = result["content"][0]["text"].as_str().unwrap();
        let envelope: Value = serde_json::from_str(text).unwrap();
        assert_eq!(envelope["data"]["domain"], "example.com");
        assert_eq!(envelope["metadata"]["agent"], "recon");
    }

    #[test]
    fn test_server_info_enables_tools_only() {
        let info = builtin_server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
    }

    #[test]
    fn test_retry_executor_follows_config() {
        let mut config = Config::default();
        config.executor.timeout_ms = 250;
        config.executor.retries = 5;
        let server = McpServer::new(config).unwrap();

        let executor = server.retry_executor();
        assert_eq!(executor.config().timeout_ms, 250);
        assert_eq!(executor.config().retries, 5);
    }

    #[test]
    fn test_disabled_agent_is_not_listed() {
        let mut config = Config::default();
        config.agents.disabled = vec!["security-scan".to_string()];
        let server = McpServer::new(config).unwrap();

        let names: Vec<_> = server.tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["recon"]);
    }
}
