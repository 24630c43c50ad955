//! Fetching raw stats from every endpoint of a cycle.
//!
//! [`StatsFetcher`] fans out one request per endpoint and bounds the whole batch by one
//! deadline. Each endpoint succeeds or fails on its own; only a batch in which every endpoint
//! failed is an error.

use crate::{
    endpoint::NetworkIdentity,
    error::{
        ClientResourceError,
        CollectionError,
        FetchError,
    },
    metrics::RawStatsBlock,
    protocol,
};
use futures::future::join_all;
use std::{
    future::Future,
    pin::Pin,
    sync::atomic::{
        AtomicU32,
        Ordering,
    },
    time::Duration,
};
use tokio::{
    io::{
        AsyncRead,
        AsyncWrite,
        AsyncWriteExt,
    },
    net::TcpStream,
    time::{
        timeout_at,
        Instant,
    },
};

/// Source of the raw stats of one endpoint.
pub trait StatsSource: Send + Sync {
    fn stats<'a>(
        &'a self,
        identity: &'a NetworkIdentity,
    ) -> Pin<Box<dyn Future<Output = Result<RawStatsBlock, FetchError>> + Send + 'a>>;
}

/// Talks the memcached binary protocol over a fresh TCP connection per request.
///
/// The connection lives only for the duration of one [`StatsSource::stats`] call and is shut
/// down on every exit path. When the batch deadline cancels the call, dropping the stream closes it.
#[derive(Debug, Default)]
pub struct BinaryProtocolClient {
    next_opaque: AtomicU32,
}

impl BinaryProtocolClient {
    async fn connect(identity: &NetworkIdentity) -> Result<TcpStream, FetchError> {
        let stream = TcpStream::connect(identity.as_str())
            .await
            .map_err(|source| FetchError::Connect {
                identity: identity.clone(),
                source,
            })?;
        stream.set_nodelay(true).map_err(|source| FetchError::Connect {
            identity: identity.clone(),
            source,
        })?;
        Ok(stream)
    }

    /// One stats request over `stream`. The stream is shut down afterwards whatever the outcome;
    /// a failed shutdown is logged and never replaces the result.
    async fn exchange<S>(mut stream: S, identity: &NetworkIdentity, opaque: u32) -> Result<RawStatsBlock, FetchError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        debug!(%identity, opaque, "Requesting stats");
        let result = protocol::request_stats(&mut stream, opaque).await;
        if let Err(error) = Self::release(stream, identity).await {
            warn!(%error, "Releasing the stats connection failed");
        }
        Ok(result?)
    }

    async fn release<S>(mut stream: S, identity: &NetworkIdentity) -> Result<(), ClientResourceError>
    where
        S: AsyncWrite + Unpin,
    {
        stream.shutdown().await.map_err(|source| ClientResourceError::Shutdown {
            identity: identity.clone(),
            source,
        })
    }
}

impl StatsSource for BinaryProtocolClient {
    fn stats<'a>(
        &'a self,
        identity: &'a NetworkIdentity,
    ) -> Pin<Box<dyn Future<Output = Result<RawStatsBlock, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            let opaque = self.next_opaque.fetch_add(1, Ordering::Relaxed);
            let stream = Self::connect(identity).await?;
            Self::exchange(stream, identity, opaque).await
        })
    }
}

/// Stats of one endpoint, or why they could not be obtained.
#[derive(Debug)]
pub struct EndpointStats {
    pub identity: NetworkIdentity,
    pub result: Result<RawStatsBlock, FetchError>,
}

pub struct StatsFetcher<S> {
    source: S,
}

impl<S: StatsSource> StatsFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Requests stats from every identity concurrently. Endpoints that have not answered when
    /// `timeout` elapses fail with [`FetchError::TimedOut`].
    pub async fn fetch(
        &self,
        identities: &[NetworkIdentity],
        timeout: Duration,
    ) -> Result<Vec<EndpointStats>, CollectionError> {
        if identities.is_empty() {
            return Ok(Vec::new());
        }

        let deadline = Instant::now() + timeout;
        let requests = identities.iter().map(|identity| async move {
            let result = match timeout_at(deadline, self.source.stats(identity)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::TimedOut { timeout }),
            };
            if let Err(error) = &result {
                debug!(%identity, %error, "Fetching stats failed");
            }
            EndpointStats {
                identity: identity.clone(),
                result,
            }
        });
        let fetched = join_all(requests).await;

        if fetched.iter().all(|stats| stats.result.is_err()) {
            let failures = fetched
                .into_iter()
                .filter_map(|stats| stats.result.err().map(|error| (stats.identity, error)))
                .collect();
            return Err(CollectionError::NoServersReachable { failures });
        }

        Ok(fetched)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::{
        collections::HashMap,
        io,
    };

    /// In-memory source: known identities answer with their block, `stalled` ones never answer,
    /// everything else is refused.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub(crate) blocks: HashMap<NetworkIdentity, RawStatsBlock>,
        pub(crate) stalled: Vec<NetworkIdentity>,
    }

    impl FakeSource {
        pub(crate) fn with(mut self, identity: &str, pairs: &[(&str, &str)]) -> Self {
            let block = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
            self.blocks.insert(parse_identity(identity), block);
            self
        }

        pub(crate) fn stalled(mut self, identity: &str) -> Self {
            self.stalled.push(parse_identity(identity));
            self
        }
    }

    pub(crate) fn parse_identity(identity: &str) -> NetworkIdentity {
        let (host, port) = identity.rsplit_once(':').unwrap();
        NetworkIdentity::new(host, port.parse().unwrap())
    }

    impl StatsSource for FakeSource {
        fn stats<'a>(
            &'a self,
            identity: &'a NetworkIdentity,
        ) -> Pin<Box<dyn Future<Output = Result<RawStatsBlock, FetchError>> + Send + 'a>> {
            Box::pin(async move {
                if self.stalled.contains(identity) {
                    std::future::pending::<()>().await;
                }
                self.blocks.get(identity).cloned().ok_or_else(|| FetchError::Connect {
                    identity: identity.clone(),
                    source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
                })
            })
        }
    }
}
