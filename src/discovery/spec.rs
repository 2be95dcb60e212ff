//! Service identifiers (`name` or `name:tag`) and the values derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const TAG_SEPARATOR: char = ':';

/// A parsed service identifier.
///
/// Only the first separator is interpreted: `"a:b:c"` parses as name `a`,
/// tag `b`. An empty tag (`"a:"`) is no tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceSpec {
    pub name: String,
    pub tag: Option<String>,
}

impl ServiceSpec {
    pub fn parse(identifier: &str) -> Self {
        let mut parts = identifier.split(TAG_SEPARATOR);
        let name = parts.next().unwrap_or_default();
        let tag = parts.next().filter(|t| !t.is_empty());

        Self {
            name: name.to_string(),
            tag: tag.map(str::to_string),
        }
    }

    /// Parse `identifier`, using `tag` only when the identifier has no tag of
    /// its own. An embedded tag always wins.
    pub fn with_fallback_tag(identifier: &str, tag: Option<&str>) -> Self {
        let mut spec = Self::parse(identifier);
        if spec.tag.is_none() {
            spec.tag = tag.filter(|t| !t.is_empty()).map(str::to_string);
        }
        spec
    }
}

impl From<&str> for ServiceSpec {
    fn from(identifier: &str) -> Self {
        Self::parse(identifier)
    }
}

impl fmt::Display for ServiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(ref tag) => write!(f, "{}{}{}", self.name, TAG_SEPARATOR, tag),
            None => f.write_str(&self.name),
        }
    }
}

/// A reachable endpoint of a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub address: String,
    pub port: u16,
}

impl ServiceInstance {
    /// `None` when the address is blank or the port is zero.
    pub fn new(address: impl Into<String>, port: u16) -> Option<Self> {
        let address = address.into();
        if address.is_empty() || port == 0 {
            return None;
        }
        Some(Self { address, port })
    }
}

impl fmt::Display for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// What this process registers with the local agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub service_id: String,
    pub name: String,
    pub port: u16,
    pub tags: Vec<String>,
}

impl RegistrationRecord {
    pub fn new(spec: &ServiceSpec, port: u16, hostname: &str) -> Self {
        Self {
            service_id: service_id(&spec.name, port, hostname),
            name: spec.name.clone(),
            port,
            tags: spec.tag.iter().cloned().collect(),
        }
    }
}

/// Dots become hyphens so the host name is safe inside a service id.
pub fn normalize_hostname(hostname: &str) -> String {
    hostname.replace('.', "-")
}

/// `{name}-{port}-{hostname}`: stable per host and port, so registering
/// twice replaces the earlier entry instead of adding a second one.
pub fn service_id(name: &str, port: u16, hostname: &str) -> String {
    format!("{}-{}-{}", name, port, normalize_hostname(hostname))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("svc", "svc", None ; "plain name")]
    #[test_case("svc:v1", "svc", Some("v1") ; "embedded tag")]
    #[test_case("svc:", "svc", None ; "empty tag")]
    #[test_case("svc:v1:extra", "svc", Some("v1") ; "only first separator")]
    #[test_case("offer-api:v2.3.0", "offer-api", Some("v2.3.0") ; "dotted version")]
    #[test_case("", "", None ; "empty identifier")]
    fn parse_identifier(identifier: &str, name: &str, tag: Option<&str>) {
        let spec = ServiceSpec::parse(identifier);
        assert_eq!(spec.name, name);
        assert_eq!(spec.tag.as_deref(), tag);
    }

    #[test]
    fn embedded_tag_beats_explicit_tag() {
        let spec = ServiceSpec::with_fallback_tag("svc:v1", Some("v2"));
        assert_eq!(spec.tag.as_deref(), Some("v1"));

        let spec = ServiceSpec::with_fallback_tag("svc", Some("v2"));
        assert_eq!(spec.tag.as_deref(), Some("v2"));

        let spec = ServiceSpec::with_fallback_tag("svc", Some(""));
        assert_eq!(spec.tag, None);
    }

    #[test]
    fn display_round_trips_tagged_spec() {
        assert_eq!(ServiceSpec::parse("svc:v1").to_string(), "svc:v1");
        assert_eq!(ServiceSpec::parse("svc:").to_string(), "svc");
    }

    #[test]
    fn instance_rejects_blank_address_and_zero_port() {
        assert_eq!(ServiceInstance::new("", 80), None);
        assert_eq!(ServiceInstance::new("10.0.0.1", 0), None);
        assert_eq!(
            ServiceInstance::new("10.0.0.1", 80).unwrap().to_string(),
            "10.0.0.1:80"
        );
    }

    #[test]
    fn service_id_normalizes_hostname() {
        assert_eq!(service_id("svc", 8080, "host.local"), "svc-8080-host-local");
        assert_eq!(service_id("svc", 8080, "plainhost"), "svc-8080-plainhost");
    }

    #[test]
    fn record_carries_embedded_tag() {
        let record = RegistrationRecord::new(&ServiceSpec::parse("svc:v1"), 8080, "a.b");
        assert_eq!(record.name, "svc");
        assert_eq!(record.tags, vec!["v1".to_string()]);
        assert_eq!(record.service_id, "svc-8080-a-b");
    }

    proptest! {
        #[test]
        fn split_is_exact(name in "[a-z][a-z0-9-]{0,20}", tag in "[a-z0-9.]{1,12}") {
            let spec = ServiceSpec::parse(&format!("{}:{}", name, tag));
            prop_assert_eq!(spec.name, name);
            prop_assert_eq!(spec.tag, Some(tag));
        }

        #[test]
        fn service_id_has_no_dots_from_host(host in "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}") {
            let id = service_id("svc", 80, &host);
            prop_assert!(!id.contains('.'));
            prop_assert!(id.starts_with("svc-80-"));
        }
    }
}
