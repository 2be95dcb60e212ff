//! The seam between the resolver and a Consul-compatible directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::spec::RegistrationRecord;
use crate::error::DiscoveryError;

/// TCP check timing attached to every registration.
pub const CHECK_TIMEOUT: &str = "5s";
pub const CHECK_INTERVAL: &str = "30s";
pub const CHECK_DEREGISTER_AFTER: &str = "30s";

/// Operations the resolver needs from the directory.
///
/// Two read views (health, local agent) and two writes (register,
/// deregister), each a single round trip.
#[async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// Health view: every instance of `name`, optionally restricted to `tag`.
    async fn health_service(
        &self,
        name: &str,
        tag: Option<&str>,
    ) -> Result<Vec<HealthEntry>, DiscoveryError>;

    /// Local-agent view, keyed by service id.
    async fn agent_services(&self) -> Result<BTreeMap<String, AgentService>, DiscoveryError>;

    async fn register_service(&self, registration: &AgentRegistration)
    -> Result<(), DiscoveryError>;

    async fn deregister_service(&self, service_id: &str) -> Result<(), DiscoveryError>;

    /// Host the agent dials for TCP health checks of registered services.
    fn agent_host(&self) -> &str;
}

/// One element of `/v1/health/service/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthEntry {
    #[serde(default)]
    pub node: Option<HealthNode>,
    #[serde(default)]
    pub service: Option<HealthService>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthNode {
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthService {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub port: u16,
}

/// One value of `/v1/agent/services`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentService {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub port: u16,
}

/// Body of `PUT /v1/agent/service/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentRegistration {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub check: TcpCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TcpCheck {
    #[serde(rename = "TCP")]
    pub tcp: String,
    pub interval: String,
    pub timeout: String,
    pub deregister_critical_service_after: String,
}

impl TcpCheck {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            tcp: format!("{}:{}", host, port),
            interval: CHECK_INTERVAL.to_string(),
            timeout: CHECK_TIMEOUT.to_string(),
            deregister_critical_service_after: CHECK_DEREGISTER_AFTER.to_string(),
        }
    }
}

impl AgentRegistration {
    /// Registration for `record` with a TCP check against `check_host`.
    pub fn with_tcp_check(record: &RegistrationRecord, check_host: &str) -> Self {
        Self {
            id: record.service_id.clone(),
            name: record.name.clone(),
            port: record.port,
            tags: record.tags.clone(),
            check: TcpCheck::new(check_host, record.port),
        }
    }
}
