//! Resolution of configured server addresses into network identities.
//!
//! A [`NetworkIdentity`] is the canonical `host:port` string of an endpoint. It is the
//! key that correlates a fetched stats block back to the display name it was configured with.

use crate::error::{
    CollectionWarning,
    ConfigurationError,
};
use memcached_monitor_config::ServerEndpointConfig;
use serde::Serialize;
use std::{
    collections::HashMap,
    fmt,
};

pub const DEFAULT_PORT: u16 = 11211;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NetworkIdentity(String);

impl NetworkIdentity {
    pub fn new(host: &str, port: u16) -> Self {
        let host = host.to_ascii_lowercase();
        if host.contains(':') {
            Self(format!("[{host}]:{port}"))
        } else {
            Self(format!("{host}:{port}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub host: String,
    pub port: u16,
    pub display_name: String,
}

impl ResolvedEndpoint {
    /// Parses `host`, `host:port`, `[v6]` or `[v6]:port`. A bare IPv6 literal is taken as a host.
    pub fn parse(server: &ServerEndpointConfig) -> Result<Self, ConfigurationError> {
        let address = server.address.trim();
        let (host, port) = match address.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
            Some((host, rest)) => (host, rest.strip_prefix(':')),
            None => match address.split_once(':') {
                Some((host, port)) if !port.contains(':') => (host, Some(port)),
                _ => (address, None),
            },
        };

        if host.is_empty() {
            return Err(ConfigurationError::EmptyHost {
                address: server.address.clone(),
            });
        }

        let port = match port {
            None => DEFAULT_PORT,
            Some(port) => port.trim().parse().map_err(|source| ConfigurationError::InvalidPort {
                address: server.address.clone(),
                port: port.to_string(),
                source,
            })?,
        };

        Ok(Self {
            host: host.to_string(),
            port,
            display_name: server.display_name.clone(),
        })
    }

    pub fn identity(&self) -> NetworkIdentity {
        NetworkIdentity::new(&self.host, self.port)
    }
}

/// Every configured endpoint plus the identity → display name lookup built from them.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<ResolvedEndpoint>,
    lookup: HashMap<NetworkIdentity, String>,
    warnings: Vec<CollectionWarning>,
}

impl EndpointRegistry {
    pub fn endpoints(&self) -> &[ResolvedEndpoint] {
        &self.endpoints
    }

    /// Unique identities in configuration order.
    pub fn identities(&self) -> Vec<NetworkIdentity> {
        let mut identities: Vec<NetworkIdentity> = Vec::with_capacity(self.lookup.len());
        for endpoint in &self.endpoints {
            let identity = endpoint.identity();
            if !identities.contains(&identity) {
                identities.push(identity);
            }
        }
        identities
    }

    pub fn display_name(&self, identity: &NetworkIdentity) -> Option<&str> {
        self.lookup.get(identity).map(String::as_str)
    }

    pub fn warnings(&self) -> &[CollectionWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }
}

/// Resolves every configured server. A malformed port fails the whole resolution; an empty
/// list resolves to an empty registry.
pub fn resolve(servers: &[ServerEndpointConfig]) -> Result<EndpointRegistry, ConfigurationError> {
    let mut registry = EndpointRegistry::default();

    for server in servers {
        let endpoint = ResolvedEndpoint::parse(server)?;
        let identity = endpoint.identity();

        // Last registration wins.
        if let Some(replaced) = registry.lookup.insert(identity.clone(), endpoint.display_name.clone()) {
            warn!(%identity, kept = %endpoint.display_name, %replaced, "Two servers resolve to the same endpoint");
            registry.warnings.push(CollectionWarning::DuplicateEndpoint {
                identity,
                kept: endpoint.display_name.clone(),
                replaced,
            });
        }
        registry.endpoints.push(endpoint);
    }

    debug!(endpoints = registry.endpoints.len(), unique = registry.lookup.len(), "Resolved endpoints");
    Ok(registry)
}
