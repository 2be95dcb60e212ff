//! Service name (plus optional tag) to address resolution, and registration of
//! this process with the local agent.
//!
//! Reads and writes fail differently. A backend outage during resolution is
//! returned as [`DiscoveryError`] untouched, while register and unregister
//! flatten any failure into a [`RegistrationError`] carrying the message.
//!
//! An unknown service is *not* an error: [`ServiceResolver::resolve_all`]
//! returns an empty list, and [`ServiceResolver::resolve_one`] hands back
//! the identifier itself so callers can still use it as a literal host name.
//! A backend that answers with an empty list for a service it does know
//! looks exactly the same.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::backend::{AgentRegistration, AgentService, DiscoveryBackend, HealthEntry};
use super::spec::{RegistrationRecord, ServiceInstance, ServiceSpec};
use crate::error::{DiscoveryError, RegistrationError};

/// Address used for local-agent services registered without one.
pub const AGENT_DEFAULT_ADDRESS: &str = "localhost";

pub struct ServiceResolver<B> {
    backend: B,
    hostname: String,
    check_host: String,
}

impl<B: DiscoveryBackend> ServiceResolver<B> {
    /// Resolver over `backend`, identifying this host by its OS host name.
    pub fn new(backend: B) -> std::io::Result<Self> {
        let hostname = hostname::get()?.to_string_lossy().to_string();
        Ok(Self::with_hostname(backend, hostname))
    }

    pub fn with_hostname(backend: B, hostname: impl Into<String>) -> Self {
        let check_host = backend.agent_host().to_string();
        Self {
            backend,
            hostname: hostname.into(),
            check_host,
        }
    }

    /// Override the host the agent dials for TCP checks.
    pub fn check_host(mut self, host: impl Into<String>) -> Self {
        self.check_host = host.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn service_id(&self, name: &str, port: u16) -> String {
        super::spec::service_id(name, port, &self.hostname)
    }

    /// Every known instance of the service.
    ///
    /// The health view is asked first. Only when it has no entries at all is
    /// the local agent consulted, matching on the bare name and ignoring tags.
    pub async fn resolve_instances(
        &self,
        identifier: &str,
        tag: Option<&str>,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        let spec = ServiceSpec::with_fallback_tag(identifier, tag);

        let entries = self
            .backend
            .health_service(&spec.name, spec.tag.as_deref())
            .await?;
        if !entries.is_empty() {
            return Ok(filter_health_instances(&entries));
        }

        debug!(
            "No health entries for {}, falling back to local agent",
            spec
        );
        let services = self.backend.agent_services().await?;
        Ok(filter_agent_instances(&services, &spec.name))
    }

    /// `address:port` for every instance, in discovery order.
    pub async fn resolve_all(
        &self,
        identifier: &str,
        tag: Option<&str>,
    ) -> Result<Vec<String>, DiscoveryError> {
        let instances = self.resolve_instances(identifier, tag).await?;
        Ok(instances.iter().map(ToString::to_string).collect())
    }

    /// First resolved address, or `identifier` unchanged when there is none.
    pub async fn resolve_one(
        &self,
        identifier: &str,
        tag: Option<&str>,
    ) -> Result<String, DiscoveryError> {
        let address = self
            .resolve_all(identifier, tag)
            .await?
            .into_iter()
            .next()
            .unwrap_or_else(|| identifier.to_string());

        debug!("{} --> {}", identifier, address);
        Ok(address)
    }

    /// Register `identifier` on `port` with the local agent.
    ///
    /// `tag` applies only when the identifier has no embedded tag.
    pub async fn register(
        &self,
        identifier: &str,
        port: u16,
        tag: Option<&str>,
    ) -> Result<RegistrationRecord, RegistrationError> {
        let spec = ServiceSpec::with_fallback_tag(identifier, tag);
        if port == 0 {
            return Err(RegistrationError::InvalidPort {
                service: spec.name,
                port,
            });
        }

        let record = RegistrationRecord::new(&spec, port, &self.hostname);
        let registration = AgentRegistration::with_tcp_check(&record, &self.check_host);

        info!(
            "Registering {} as {} on port {} (tags: {:?})",
            record.name, record.service_id, record.port, record.tags
        );

        match self.backend.register_service(&registration).await {
            Ok(()) => Ok(record),
            Err(e) => {
                warn!("Registration of {} failed: {}", record.service_id, e);
                Err(RegistrationError::RegisterFailed {
                    service_id: record.service_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Remove every instance of the service from the local agent.
    ///
    /// Any embedded tag is dropped, so `svc:v1` removes the `v2` instances
    /// too. Returns how many were removed.
    pub async fn unregister(&self, identifier: &str) -> Result<usize, RegistrationError> {
        let spec = ServiceSpec::parse(identifier);

        let services = self
            .backend
            .agent_services()
            .await
            .map_err(|e| unregister_failed(&spec.name, e))?;

        let mut removed = 0;
        for (service_id, service) in &services {
            if service.service != spec.name {
                continue;
            }
            self.backend
                .deregister_service(service_id)
                .await
                .map_err(|e| unregister_failed(&spec.name, e))?;
            removed += 1;
        }

        info!("Unregistered {} instance(s) of {}", removed, spec.name);
        Ok(removed)
    }
}

fn unregister_failed(service: &str, e: DiscoveryError) -> RegistrationError {
    warn!("Unregistering {} failed: {}", service, e);
    RegistrationError::UnregisterFailed {
        service: service.to_string(),
        reason: e.to_string(),
    }
}

/// Health entries to instances. A blank service address falls back to the
/// node address; entries still missing an address or port are dropped.
pub fn filter_health_instances(entries: &[HealthEntry]) -> Vec<ServiceInstance> {
    entries
        .iter()
        .filter_map(|entry| {
            let service = entry.service.as_ref()?;
            let address = service
                .address
                .as_deref()
                .filter(|a| !a.is_empty())
                .or_else(|| entry.node.as_ref()?.address.as_deref())
                .unwrap_or_default();
            ServiceInstance::new(address, service.port)
        })
        .collect()
}

/// Local-agent services named exactly `name` with a non-zero port.
pub fn filter_agent_instances(
    services: &BTreeMap<String, AgentService>,
    name: &str,
) -> Vec<ServiceInstance> {
    services
        .values()
        .filter(|service| service.service == name)
        .filter_map(|service| {
            let address = service
                .address
                .as_deref()
                .filter(|a| !a.is_empty())
                .unwrap_or(AGENT_DEFAULT_ADDRESS);
            ServiceInstance::new(address, service.port)
        })
        .collect()
}
