//! Beacon - Consul-backed service address resolution
//!
//! Resolve `name` or `name:tag` to `address:port` through a Consul agent,
//! register the running process with that agent, and a few small helpers
//! that usually travel alongside (chat webhook, MongoDB index and dedup
//! jobs, ObjectId from a timestamp, common regexes).
//!
//! ```no_run
//! # async fn demo() -> beacon::Result<()> {
//! let config = beacon::BeaconConfig::load(None)?;
//! let resolver = beacon::consul_resolver(&config)?;
//! let address = resolver.resolve_one("offer-api:v2.3.0", None).await?;
//! # let _ = address;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod mongo;
pub mod notify;
pub mod object_id;
pub mod patterns;

pub use config::{BeaconConfig, ConsulConfig, MongoConfig, NotifyConfig};
pub use discovery::{
    ConsulBackend, DiscoveryBackend, RegistrationRecord, ServiceInstance, ServiceResolver,
    ServiceSpec,
};
pub use error::{
    BeaconError, DiscoveryError, MongoError, NotifyError, ObjectIdError, RegistrationError,
    Result,
};
pub use notify::FeishuNotifier;

/// Resolver over the Consul agent named in `config`, identified by this
/// host's name.
pub fn consul_resolver(config: &BeaconConfig) -> Result<ServiceResolver<ConsulBackend>> {
    let backend = ConsulBackend::new(&config.consul)?;
    Ok(ServiceResolver::new(backend)?)
}
