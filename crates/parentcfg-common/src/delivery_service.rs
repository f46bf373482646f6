//! Delivery service records

use crate::{CapabilitySet, ParentAlgorithm};
use serde::{Deserialize, Serialize};
use url::Url;

/// Delivery service routing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryServiceType {
    /// HTTP-routed, cached
    Http,
    /// HTTP-routed, never cached
    HttpNoCache,
    /// HTTP-routed live content
    HttpLive,
    /// HTTP-routed live content, national tier
    HttpLiveNatnl,
    /// DNS-routed, cached
    Dns,
    /// DNS-routed live content
    DnsLive,
    /// DNS-routed live content, national tier
    DnsLiveNatnl,
    /// Matches any request, no origin
    AnyMap,
    /// Steering across other delivery services
    Steering,
    /// Client-side steering
    ClientSteering,
}

impl DeliveryServiceType {
    /// Whether requests for this type are forwarded to an origin at all
    pub const fn uses_origin(self) -> bool {
        !matches!(self, Self::AnyMap | Self::Steering | Self::ClientSteering)
    }

    /// Whether caches skip the parent hierarchy and fetch from origin directly
    pub const fn bypasses_hierarchy(self) -> bool {
        matches!(self, Self::HttpNoCache | Self::HttpLive | Self::DnsLive)
    }
}

/// How a delivery service treats query strings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QStringIgnore {
    /// Query string is part of the cache key and forwarded upstream
    #[default]
    UseInCacheKeyAndPassUp,
    /// Query string is left out of the cache key but still forwarded
    IgnoreInCacheKeyAndPassUp,
    /// Query string is stripped entirely
    Drop,
}

/// Multi-site-origin tuning for a delivery service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsoSettings {
    /// Load-balancing algorithm across origin sites
    pub algorithm: Option<ParentAlgorithm>,
    /// Which failures trigger a retry (`simple`, `unavailable_server`, `both`)
    pub parent_retry: Option<String>,
    /// Comma separated response codes treated as unavailable
    pub unavailable_server_retry_responses: Option<String>,
    /// Retries on simple failures
    pub max_simple_retries: Option<String>,
    /// Retries on unavailable-server failures
    pub max_unavailable_server_retries: Option<String>,
}

/// A delivery service as seen by the compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryService {
    pub name: String,
    /// Origin URL, e.g. `http://origin.example.net:8080`
    pub origin_fqdn: String,
    #[serde(rename = "type")]
    pub ds_type: DeliveryServiceType,
    #[serde(default)]
    pub multi_site_origin: bool,
    #[serde(default)]
    pub required_capabilities: CapabilitySet,
    #[serde(default)]
    pub topology: Option<String>,
    #[serde(default)]
    pub qstring_ignore: QStringIgnore,
    /// Explicit qstring handling, empty means unset
    #[serde(default)]
    pub qstring_handling: Option<String>,
    #[serde(default)]
    pub mso: MsoSettings,
}

impl DeliveryService {
    /// Create a cached HTTP delivery service with default settings
    pub fn new(name: &str, origin_fqdn: &str, ds_type: DeliveryServiceType) -> Self {
        Self {
            name: name.to_string(),
            origin_fqdn: origin_fqdn.to_string(),
            ds_type,
            multi_site_origin: false,
            required_capabilities: CapabilitySet::new(),
            topology: None,
            qstring_ignore: QStringIgnore::default(),
            qstring_handling: None,
            mso: MsoSettings::default(),
        }
    }

    /// Topology name, treating an empty string as no topology
    pub fn topology_name(&self) -> Option<&str> {
        self.topology.as_deref().filter(|t| !t.is_empty())
    }

    /// Explicit qstring handling, treating an empty string as unset
    pub fn qstring_handling(&self) -> Option<&str> {
        self.qstring_handling.as_deref().filter(|q| !q.is_empty())
    }

    /// Parse the origin URL
    pub fn origin(&self) -> Option<Origin> {
        Origin::parse(&self.origin_fqdn)
    }
}

/// Parsed origin host and port
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub host: String,
    pub port: u16,
}

impl Origin {
    /// Parse an origin FQDN. A missing scheme is treated as `http`, the host
    /// comes back lowercase.
    pub fn parse(fqdn: &str) -> Option<Self> {
        let fqdn = fqdn.trim();
        if fqdn.is_empty() {
            return None;
        }

        let url = if fqdn.contains("://") {
            Url::parse(fqdn)
        } else {
            Url::parse(&format!("http://{}", fqdn))
        }
        .ok()?;

        let host = url.host_str().filter(|h| !h.is_empty())?.to_string();
        let port = url.port_or_known_default()?;
        Some(Self { host, port })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_default_ports() {
        let http = Origin::parse("http://ds0.example.net").unwrap();
        assert_eq!(http.host, "ds0.example.net");
        assert_eq!(http.port, 80);

        let https = Origin::parse("https://ds0.example.net/path").unwrap();
        assert_eq!(https.port, 443);
    }

    #[test]
    fn test_origin_host_is_lowercased() {
        let mixed = Origin::parse("http://DS1.Example.net").unwrap();
        assert_eq!(mixed.host, "ds1.example.net");
    }

    #[test]
    fn test_origin_explicit_port_and_bare_host() {
        let explicit = Origin::parse("http://origin.example.net:8080").unwrap();
        assert_eq!(explicit.port, 8080);

        let bare = Origin::parse("origin.example.net").unwrap();
        assert_eq!(bare.host, "origin.example.net");
        assert_eq!(bare.port, 80);
    }

    #[test]
    fn test_origin_rejects_garbage() {
        assert!(Origin::parse("").is_none());
        assert!(Origin::parse("http://").is_none());
    }

    #[test]
    fn test_type_classes() {
        assert!(!DeliveryServiceType::Steering.uses_origin());
        assert!(DeliveryServiceType::Dns.uses_origin());
        assert!(DeliveryServiceType::HttpLive.bypasses_hierarchy());
        assert!(!DeliveryServiceType::HttpLiveNatnl.bypasses_hierarchy());
    }

    #[test]
    fn test_deserialize_minimal() {
        let ds: DeliveryService = serde_json::from_str(
            r#"{"name":"ds0","origin_fqdn":"http://ds0.example.net","type":"HTTP_NO_CACHE"}"#,
        )
        .unwrap();
        assert_eq!(ds.ds_type, DeliveryServiceType::HttpNoCache);
        assert_eq!(ds.qstring_ignore, QStringIgnore::UseInCacheKeyAndPassUp);
        assert!(ds.topology_name().is_none());
    }

    #[test]
    fn test_empty_strings_are_unset() {
        let mut ds = DeliveryService::new("ds0", "http://a.example.net", DeliveryServiceType::Http);
        ds.topology = Some(String::new());
        ds.qstring_handling = Some(String::new());
        assert!(ds.topology_name().is_none());
        assert!(ds.qstring_handling().is_none());
    }
}
