//! Agent MCP Server Library
//!
//! This crate exposes a registry of command agents over the Model Context
//! Protocol (MCP). Each registered agent becomes one MCP tool; a tool call
//! names a command and its parameters and always answers with a JSON result
//! envelope.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, the retry executor, the MCP
//!   server (protocol adapter) and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **agents**: Capability units, the agent registry and built-in agents
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use crate::core::{Config, Error, McpServer, Result, RetryExecutor};
pub use domains::agents::{
    Agent, AgentRegistry, CapabilityUnit, Command, CommandInvocation, ResultEnvelope,
};
