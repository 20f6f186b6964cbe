//! Agent definitions module.
//!
//! Each built-in agent is defined in its own file with typed parameter
//! structs, fixture handlers and a `build()` constructor.
//!
//! ## Adding a New Agent
//!
//! 1. Create a new file (e.g., `my_agent.rs`) with a `build()` returning an `Agent`
//! 2. Export it here
//! 3. Add it to `builtin_agents()`

pub mod recon;
pub mod security_scan;

pub use recon::ReconAgent;
pub use security_scan::SecurityScanAgent;

use super::{Agent, AgentResult};

/// All built-in agents, in registration order.
pub fn builtin_agents() -> AgentResult<Vec<Agent>> {
    Ok(vec![SecurityScanAgent::build()?, ReconAgent::build()?])
}
