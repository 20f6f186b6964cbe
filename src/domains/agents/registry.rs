//! Agent Registry - identifier-keyed collection of capability units.
//!
//! This module provides:
//! - Registration and removal of agents (startup-time mutation)
//! - Lookup and ordered listing for the protocol adapter
//! - Dispatch that always answers with a [`ResultEnvelope`]

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::definitions::builtin_agents;
use super::envelope::ResultEnvelope;
use super::error::RegistryError;
use super::invocation::CommandInvocation;
use super::unit::CapabilityUnit;

// ============================================================================
// Agent Registry
// ============================================================================

/// Registry of capability units, in registration order.
///
/// Built and mutated at startup, then shared read-only (typically behind an
/// `Arc`) by every transport.
#[derive(Default, Clone)]
pub struct AgentRegistry {
    agents: Vec<Arc<dyn CapabilityUnit>>,
}

impl AgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in agents, minus `disabled` ids.
    pub fn with_builtin_agents(disabled: &[String]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        for agent in builtin_agents()? {
            if disabled.iter().any(|id| id == agent.id()) {
                info!("Skipping disabled agent: {}", agent.id());
                continue;
            }
            registry.register(agent)?;
        }

        Ok(registry)
    }

    /// Register a unit. Fails if its identifier is already taken.
    pub fn register(&mut self, unit: impl CapabilityUnit + 'static) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(unit))
    }

    /// Register an already shared unit.
    pub fn register_shared(&mut self, unit: Arc<dyn CapabilityUnit>) -> Result<(), RegistryError> {
        if self.contains(unit.id()) {
            warn!("Rejected duplicate agent registration: {}", unit.id());
            return Err(RegistryError::already_registered(unit.id()));
        }

        info!(
            "Registering agent: {} v{} ({} commands)",
            unit.id(),
            unit.version(),
            unit.capabilities().len()
        );
        self.agents.push(unit);
        Ok(())
    }

    /// Remove a unit. Absent identifiers are ignored.
    pub fn unregister(&mut self, id: &str) -> Option<Arc<dyn CapabilityUnit>> {
        let index = self.agents.iter().position(|a| a.id() == id)?;
        info!("Unregistering agent: {}", id);
        Some(self.agents.remove(index))
    }

    /// Look up a unit by identifier.
    pub fn get(&self, id: &str) -> Option<Arc<dyn CapabilityUnit>> {
        self.agents.iter().find(|a| a.id() == id).cloned()
    }

    /// Snapshot of all units, in registration order.
    pub fn list(&self) -> Vec<Arc<dyn CapabilityUnit>> {
        self.agents.clone()
    }

    /// Registered identifiers, in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.id()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.iter().any(|a| a.id() == id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Dispatch an invocation to the unit registered under `id`.
    ///
    /// Never fails: an unknown identifier and a panicking unit both come back
    /// as failure envelopes.
    #[instrument(skip(self, input), fields(command = %input.command))]
    pub async fn execute(&self, id: &str, input: CommandInvocation) -> ResultEnvelope {
        let Some(unit) = self.get(id) else {
            warn!("Agent not found: {}", id);
            return ResultEnvelope::failure(format!("Agent not found: {}", id));
        };

        match AssertUnwindSafe(unit.execute(input)).catch_unwind().await {
            Ok(envelope) => envelope,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Agent '{}' panicked: {}", id, message);
                ResultEnvelope::failure(message)
            }
        }
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.ids())
            .finish()
    }
}

/// Extract a human message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::agents::{Agent, AgentInfo, AgentResult, Command};
    use async_trait::async_trait;
    use serde_json::{Map, Value, json};

    async fn port_scan(input: CommandInvocation) -> AgentResult<Value> {
        Ok(json!({ "target": input.param("target").cloned() }))
    }

    fn scan_agent(id: &str) -> Agent {
        Agent::builder(id)
            .description("test scanner")
            .capabilities(["port-scan"])
            .command(Command::new("port-scan", "", port_scan).require(["target"]))
            .build()
            .unwrap()
    }

    /// A unit that ignores its own boundary contract and panics.
    struct RogueUnit {
        info: AgentInfo,
        payload: Option<&'static str>,
    }

    impl RogueUnit {
        fn new(payload: Option<&'static str>) -> Self {
            Self {
                info: AgentInfo {
                    id: "rogue".to_string(),
                    name: "Rogue".to_string(),
                    description: String::new(),
                    version: "0.0.1".to_string(),
                    capabilities: vec!["run".to_string()],
                },
                payload,
            }
        }
    }

    #[async_trait]
    impl CapabilityUnit for RogueUnit {
        fn info(&self) -> &AgentInfo {
            &self.info
        }

        async fn execute(&self, _input: CommandInvocation) -> ResultEnvelope {
            match self.payload {
                Some(msg) => panic!("{}", msg),
                None => std::panic::panic_any(42_u8),
            }
        }
    }

    #[test]
    fn test_register_then_get_and_list() {
        let mut registry = AgentRegistry::new();
        registry.register(scan_agent("security-scan")).unwrap();

        let unit = registry.get("security-scan").unwrap();
        assert_eq!(unit.id(), "security-scan");

        let listed = registry.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(
            listed.iter().filter(|u| u.id() == "security-scan").count(),
            1
        );
    }

    #[test]
    fn test_duplicate_registration_keeps_original() {
        let mut registry = AgentRegistry::new();
        registry.register(scan_agent("security-scan")).unwrap();

        let replacement = Agent::builder("security-scan")
            .description("impostor")
            .build()
            .unwrap();
        let err = registry.register(replacement).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(ref id) if id == "security-scan"));

        assert_eq!(registry.len(), 1);
        let unit = registry.get("security-scan").unwrap();
        assert_eq!(unit.description(), "test scanner");
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut registry = AgentRegistry::new();
        registry.register(scan_agent("a")).unwrap();

        assert!(registry.unregister("a").is_some());
        assert!(registry.unregister("a").is_none());
        assert!(registry.is_empty());
        assert!(registry.get("a").is_none());
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = AgentRegistry::new();
        registry.register(scan_agent("zeta")).unwrap();
        registry.register(scan_agent("alpha")).unwrap();
        registry.register(scan_agent("mid")).unwrap();
        registry.unregister("alpha");
        registry.register(scan_agent("alpha")).unwrap();

        assert_eq!(registry.ids(), vec!["zeta", "mid", "alpha"]);
    }

    #[tokio::test]
    async fn test_execute_unknown_agent() {
        let registry = AgentRegistry::new();
        let result = registry
            .execute("nonexistent-id", CommandInvocation::new("x"))
            .await;

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "success": false, "error": "Agent not found: nonexistent-id" })
        );
    }

    #[tokio::test]
    async fn test_execute_forwards_to_unit() {
        let mut registry = AgentRegistry::new();
        registry.register(scan_agent("security-scan")).unwrap();

        let input = CommandInvocation::new("port-scan").with_param("target", "192.168.1.1");
        let result = registry.execute("security-scan", input).await;
        assert!(result.success);
        assert_eq!(result.data.unwrap()["target"], "192.168.1.1");

        let input = CommandInvocation::new("port-scan").with_params(Map::new());
        let result = registry.execute("security-scan", input).await;
        assert!(!result.success);
        assert!(!result.error.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_unknown_command() {
        let mut registry = AgentRegistry::new();
        registry.register(scan_agent("security-scan")).unwrap();

        let result = registry
            .execute("security-scan", CommandInvocation::new("os-detect"))
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown command: os-detect"));
    }

    #[tokio::test]
    async fn test_execute_contains_panicking_unit() {
        let mut registry = AgentRegistry::new();
        registry.register(RogueUnit::new(Some("disk on fire"))).unwrap();

        let result = registry.execute("rogue", CommandInvocation::new("run")).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("disk on fire"));
    }

    #[tokio::test]
    async fn test_execute_panic_without_message() {
        let mut registry = AgentRegistry::new();
        registry.register(RogueUnit::new(None)).unwrap();

        let result = registry.execute("rogue", CommandInvocation::new("run")).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown error"));
    }

    #[test]
    fn test_with_builtin_agents() {
        let registry = AgentRegistry::with_builtin_agents(&[]).unwrap();
        assert_eq!(registry.ids(), vec!["security-scan", "recon"]);
    }

    #[test]
    fn test_with_builtin_agents_skips_disabled() {
        let registry = AgentRegistry::with_builtin_agents(&["recon".to_string()]).unwrap();
        assert_eq!(registry.ids(), vec!["security-scan"]);
    }
}
