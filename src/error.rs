use thiserror::Error;

/// Beacon-specific error types
#[derive(Error, Debug)]
pub enum BeaconError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] MongoError),

    #[error("ObjectId error: {0}")]
    ObjectId(#[from] ObjectIdError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Generic error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Failures on the read path. These propagate to the caller unchanged.
///
/// An unknown service is not an error: resolution returns an empty list.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("discovery backend unreachable at {endpoint}: {reason}")]
    BackendUnavailable { endpoint: String, reason: String },

    #[error("discovery backend returned HTTP {status} for {path}: {body}")]
    UnexpectedStatus {
        path: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode discovery response from {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// Failures on the write path.
///
/// The cause is flattened to a string: register and unregister never hand a
/// backend error back as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("invalid port {port} for service {service}")]
    InvalidPort { service: String, port: u16 },

    #[error("failed to register {service_id}: {reason}")]
    RegisterFailed { service_id: String, reason: String },

    #[error("failed to unregister {service}: {reason}")]
    UnregisterFailed { service: String, reason: String },
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("no webhook url configured")]
    MissingWebhook,

    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("webhook returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to serialize notification payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum MongoError {
    #[error("MongoDB request failed: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("an index needs at least one field")]
    EmptyIndex,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectIdError {
    #[error("params error, need {expected}: got {input:?}")]
    InvalidFormat { input: String, expected: &'static str },

    #[error("timestamp {seconds} does not fit in an ObjectId")]
    OutOfRange { seconds: i64 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found at path: {path}")]
    NotFound { path: String },

    #[error("Invalid config: {reason}")]
    Invalid { reason: String },
}

/// Convenience type alias for Beacon results
pub type Result<T, E = BeaconError> = std::result::Result<T, E>;
