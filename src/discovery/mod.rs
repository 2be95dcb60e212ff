//! Service discovery against a Consul-compatible directory
//!
//! - `spec`: identifier parsing (`name` / `name:tag`) and service ids
//! - `backend`: the [`DiscoveryBackend`] seam and Consul's record shapes
//! - `consul`: HTTP implementation of the seam
//! - `resolver`: [`ServiceResolver`], address lookup and self-registration

pub mod backend;
pub mod consul;
pub mod resolver;
pub mod spec;

pub use backend::{
    AgentRegistration, AgentService, DiscoveryBackend, HealthEntry, HealthNode, HealthService,
    TcpCheck,
};
pub use consul::ConsulBackend;
pub use resolver::ServiceResolver;
pub use spec::{RegistrationRecord, ServiceInstance, ServiceSpec, service_id};
