//! Consul agent HTTP API client

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::backend::{AgentRegistration, AgentService, DiscoveryBackend, HealthEntry};
use crate::config::ConsulConfig;
use crate::error::DiscoveryError;

const TOKEN_HEADER: &str = "X-Consul-Token";

/// Consul backend talking to a single agent.
pub struct ConsulBackend {
    http_client: HttpClient,
    base_url: String,
    host: String,
    token: Option<String>,
    datacenter: Option<String>,
    only_passing: bool,
}

impl ConsulBackend {
    pub fn new(config: &ConsulConfig) -> Result<Self, DiscoveryError> {
        let base_url = config.base_url();
        let http_client = HttpClient::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DiscoveryError::BackendUnavailable {
                endpoint: base_url.clone(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        debug!("Consul backend at {}", base_url);

        Ok(Self {
            http_client,
            base_url,
            host: config.host.clone(),
            token: config.token.clone(),
            datacenter: config.datacenter.clone(),
            only_passing: config.only_passing,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    /// Request with the token header and datacenter applied.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self.http_client.request(method, self.url(path));

        if let Some(ref token) = self.token {
            request = request.header(TOKEN_HEADER, token);
        }
        if let Some(ref dc) = self.datacenter {
            request = request.query(&[("dc", dc)]);
        }

        request
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response, DiscoveryError> {
        let response = request
            .send()
            .await
            .map_err(|e| DiscoveryError::BackendUnavailable {
                endpoint: self.url(path),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DiscoveryError::UnexpectedStatus {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, DiscoveryError> {
        let response = self.send(path, request).await?;
        response.json().await.map_err(|e| DiscoveryError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl DiscoveryBackend for ConsulBackend {
    async fn health_service(
        &self,
        name: &str,
        tag: Option<&str>,
    ) -> Result<Vec<HealthEntry>, DiscoveryError> {
        let path = format!("/health/service/{}", urlencoding::encode(name));
        let mut request = self.request(Method::GET, &path);

        if let Some(tag) = tag {
            request = request.query(&[("tag", tag)]);
        }
        if self.only_passing {
            request = request.query(&[("passing", "true")]);
        }

        let entries: Vec<HealthEntry> = self.get_json(&path, request).await?;
        debug!("Health view for {} (tag {:?}): {} entries", name, tag, entries.len());
        Ok(entries)
    }

    async fn agent_services(&self) -> Result<BTreeMap<String, AgentService>, DiscoveryError> {
        let path = "/agent/services";
        let services: BTreeMap<String, AgentService> =
            self.get_json(path, self.request(Method::GET, path)).await?;
        debug!("Local agent knows {} services", services.len());
        Ok(services)
    }

    async fn register_service(
        &self,
        registration: &AgentRegistration,
    ) -> Result<(), DiscoveryError> {
        let path = "/agent/service/register";
        let request = self.request(Method::PUT, path).json(registration);

        self.send(path, request).await?;
        info!("Registered {} in Consul", registration.id);
        Ok(())
    }

    async fn deregister_service(&self, service_id: &str) -> Result<(), DiscoveryError> {
        let path = format!(
            "/agent/service/deregister/{}",
            urlencoding::encode(service_id)
        );
        let request = self.request(Method::PUT, &path);

        self.send(&path, request).await?;
        info!("Deregistered {} from Consul", service_id);
        Ok(())
    }

    fn agent_host(&self) -> &str {
        &self.host
    }
}
