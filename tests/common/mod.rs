#![allow(dead_code)]

use async_trait::async_trait;
use beacon::DiscoveryError;
use beacon::discovery::{
    AgentRegistration, AgentService, DiscoveryBackend, HealthEntry, HealthNode, HealthService,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const AGENT_HOST: &str = "127.0.0.1";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Health { name: String, tag: Option<String> },
    AgentServices,
    Register(AgentRegistration),
    Deregister(String),
}

/// In-memory directory that records every call made against it.
///
/// The health view is a fixed list; the agent view starts from the seeded
/// services and follows register/deregister.
#[derive(Default)]
pub struct FakeBackend {
    health: Vec<HealthEntry>,
    agent: Mutex<BTreeMap<String, AgentService>>,
    down: bool,
    reject_writes: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the agent were unreachable.
    pub fn unavailable() -> Self {
        Self {
            down: true,
            ..Self::default()
        }
    }

    /// Reads succeed, register and deregister fail.
    pub fn read_only(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    pub fn with_health(mut self, entries: Vec<HealthEntry>) -> Self {
        self.health = entries;
        self
    }

    pub fn with_agent_service(
        self,
        id: &str,
        name: &str,
        tags: &[&str],
        address: Option<&str>,
        port: u16,
    ) -> Self {
        self.agent.lock().unwrap().insert(
            id.to_string(),
            AgentService {
                id: id.to_string(),
                service: name.to_string(),
                tags: Some(tags.iter().map(|t| t.to_string()).collect()),
                address: address.map(str::to_string),
                port,
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn agent_ids(&self) -> Vec<String> {
        self.agent.lock().unwrap().keys().cloned().collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_up(&self) -> Result<(), DiscoveryError> {
        if self.down {
            return Err(outage());
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), DiscoveryError> {
        self.check_up()?;
        if self.reject_writes {
            return Err(DiscoveryError::UnexpectedStatus {
                path: "/agent/service".to_string(),
                status: 403,
                body: "Permission denied".to_string(),
            });
        }
        Ok(())
    }
}

pub fn outage() -> DiscoveryError {
    DiscoveryError::BackendUnavailable {
        endpoint: "http://127.0.0.1:8500/v1".to_string(),
        reason: "connection refused".to_string(),
    }
}

/// A health entry as Consul reports it.
pub fn health_entry(service_address: &str, port: u16, node_address: &str) -> HealthEntry {
    HealthEntry {
        node: Some(HealthNode {
            node: Some("node-1".to_string()),
            address: Some(node_address.to_string()),
        }),
        service: Some(HealthService {
            service: Some("svc".to_string()),
            address: Some(service_address.to_string()),
            port,
            ..Default::default()
        }),
    }
}

#[async_trait]
impl DiscoveryBackend for FakeBackend {
    async fn health_service(
        &self,
        name: &str,
        tag: Option<&str>,
    ) -> Result<Vec<HealthEntry>, DiscoveryError> {
        self.record(Call::Health {
            name: name.to_string(),
            tag: tag.map(str::to_string),
        });
        self.check_up()?;
        Ok(self.health.clone())
    }

    async fn agent_services(&self) -> Result<BTreeMap<String, AgentService>, DiscoveryError> {
        self.record(Call::AgentServices);
        self.check_up()?;
        Ok(self.agent.lock().unwrap().clone())
    }

    async fn register_service(
        &self,
        registration: &AgentRegistration,
    ) -> Result<(), DiscoveryError> {
        self.record(Call::Register(registration.clone()));
        self.check_writable()?;
        self.agent.lock().unwrap().insert(
            registration.id.clone(),
            AgentService {
                id: registration.id.clone(),
                service: registration.name.clone(),
                tags: Some(registration.tags.clone()),
                address: None,
                port: registration.port,
            },
        );
        Ok(())
    }

    async fn deregister_service(&self, service_id: &str) -> Result<(), DiscoveryError> {
        self.record(Call::Deregister(service_id.to_string()));
        self.check_writable()?;
        self.agent.lock().unwrap().remove(service_id);
        Ok(())
    }

    fn agent_host(&self) -> &str {
        AGENT_HOST
    }
}
