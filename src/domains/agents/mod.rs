//! Agents domain module.
//!
//! This module handles the command agents exposed by the MCP server. An agent
//! is a capability unit: a named, versioned set of commands behind a single
//! `execute` entry point that always answers with a [`ResultEnvelope`].
//!
//! ## Architecture
//!
//! - `unit.rs` - The `CapabilityUnit` trait and parameter presence checks
//! - `agent.rs` - Table-driven `Agent` implementation and its builder
//! - `registry.rs` - Identifier-keyed registry and fault-containing dispatch
//! - `definitions/` - Built-in agents (one file per agent)
//! - `envelope.rs` / `invocation.rs` - Output and input types
//! - `error.rs` - Agent and registry error types
//!
//! ## Adding a New Agent
//!
//! 1. Create a new file in `definitions/`
//! 2. Declare its capabilities and one `Command` per capability
//! 3. Add it to `definitions::builtin_agents()`
//!
//! **No need to modify `server.rs`!** Every registered agent becomes an MCP tool.

mod agent;
pub mod definitions;
mod envelope;
mod error;
mod invocation;
mod registry;
mod unit;

pub use agent::{Agent, AgentBuilder, Command, CommandFuture, CommandHandler};
pub use envelope::ResultEnvelope;
pub use error::{AgentError, AgentResult, RegistryError};
pub use invocation::{CommandInvocation, ExecutionContext, Params};
pub use registry::AgentRegistry;
pub use unit::{AgentInfo, CapabilityUnit, validate_required_params};
