//! Error and warning types of a collection cycle.
//!
//! - [`ConfigurationError`] and [`CollectionError::NoServersReachable`] fail the whole cycle.
//! - [`FetchError`] is scoped to one endpoint and only fails the cycle when every endpoint failed.
//! - [`CollectionWarning`]s are recorded alongside the result and never fail the cycle.
//! - [`ClientResourceError`]s are logged and never replace a result.

use crate::endpoint::NetworkIdentity;
use serde::Serialize;
use std::{
    io,
    num::ParseIntError,
    time::Duration,
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("server address {address:?} has a non-numeric port {port:?}: {source}")]
    InvalidPort {
        address: String,
        port: String,
        #[source]
        source: ParseIntError,
    },
    #[error("server address {address:?} has no host")]
    EmptyHost { address: String },
}

#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    #[error("connection failed while talking to the server: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected magic byte {0:#04x} in response header")]
    BadMagic(u8),
    #[error("unexpected opcode {0:#04x} in a stats response")]
    UnexpectedOpcode(u8),
    #[error("response opaque {actual} does not match request opaque {expected}")]
    OpaqueMismatch { expected: u32, actual: u32 },
    #[error("server answered the stats request with status {0:#06x}")]
    Status(u16),
    #[error("response body of {body_len} bytes cannot hold {key_len} key and {extras_len} extras bytes")]
    MalformedBody {
        body_len: u32,
        key_len: u16,
        extras_len: u8,
    },
    #[error("response body of {0} bytes exceeds the limit")]
    BodyTooLarge(u32),
    #[error("stat {0:?} is not valid UTF-8")]
    InvalidUtf8(String),
}

/// Failure to obtain the stats of a single endpoint.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("cannot connect to {identity}: {source}")]
    Connect {
        identity: NetworkIdentity,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("no stats received within the batch timeout of {timeout:?}")]
    TimedOut { timeout: Duration },
}

/// Failure to release the network client of one endpoint.
#[derive(thiserror::Error, Debug)]
pub enum ClientResourceError {
    #[error("failed to shut down the connection to {identity}: {source}")]
    Shutdown {
        identity: NetworkIdentity,
        #[source]
        source: io::Error,
    },
}

/// Terminal failure of a collection cycle. No metrics are emitted for a failed cycle.
#[derive(thiserror::Error, Debug)]
pub enum CollectionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("none of the {} memcached servers could be reached", failures.len())]
    NoServersReachable { failures: Vec<(NetworkIdentity, FetchError)> },
}

/// Non-fatal condition recorded during a cycle.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionWarning {
    #[error("stats received from {identity} match no configured server")]
    Uncorrelated { identity: NetworkIdentity },
    #[error("server {display_name} ({identity}) was not collected: {reason}")]
    Unreachable {
        display_name: String,
        identity: NetworkIdentity,
        reason: String,
    },
    #[error("servers {replaced} and {kept} both resolve to {identity}; only {kept} is reported")]
    DuplicateEndpoint {
        identity: NetworkIdentity,
        kept: String,
        replaced: String,
    },
    #[error("server {identity} reports under the display name {display_name} of another server and replaces its metrics")]
    DuplicateDisplayName {
        display_name: String,
        identity: NetworkIdentity,
    },
}
