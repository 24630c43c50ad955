use serde::{
    Deserialize,
    Serialize,
};

/// One configured memcached instance.
///
/// `address` is `host` or `host:port`; the port is filled in by the endpoint
/// resolver when it is missing. `display_name` labels every metric path emitted
/// for this server.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerEndpointConfig {
    #[serde(rename = "server", alias = "address")]
    pub address: String,
    #[serde(alias = "displayName")]
    pub display_name: String,
}

impl ServerEndpointConfig {
    pub fn new(address: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            display_name: display_name.into(),
        }
    }
}
