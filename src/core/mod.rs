//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server,
//! including error handling, configuration, the retry executor, server
//! lifecycle management, and transport layer abstractions.

pub mod config;
pub mod error;
pub mod retry;
pub mod server;
pub mod transport;

pub use config::{Config, LoggingConfig};
pub use error::{Error, Result};
pub use retry::{ExecutorConfig, RetryError, RetryExecutor};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
