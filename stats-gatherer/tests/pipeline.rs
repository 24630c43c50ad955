use memcached_monitor_config::{
    MonitorConfig,
    ServerEndpointConfig,
};
use memcached_stats_gatherer::{
    emitter::LineEmitter,
    protocol::{
        encode_stat_response,
        HEADER_SIZE,
        OPCODE_STAT,
        REQUEST_MAGIC,
    },
    BinaryProtocolClient,
    CollectionError,
    CollectionPipeline,
    CollectionWarning,
    Collector,
    CycleContext,
    FetchError,
    MemcachedCollector,
    StatField,
};
use pretty_assertions::assert_eq;
use std::{
    net::SocketAddr,
    time::Duration,
};
use tokio::{
    io::{
        AsyncReadExt,
        AsyncWriteExt,
    },
    net::TcpListener,
};

/// Answers every `STAT` request with `stats`, like a memcached server would.
async fn fake_memcached(stats: &'static [(&'static str, &'static str)]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let mut request = [0u8; HEADER_SIZE];
                socket.read_exact(&mut request).await.unwrap();
                assert_eq!((request[0], request[1]), (REQUEST_MAGIC, OPCODE_STAT));
                let opaque = u32::from_be_bytes([request[12], request[13], request[14], request[15]]);

                let mut response = Vec::new();
                for (key, value) in stats {
                    response.extend(encode_stat_response(key, value, opaque));
                }
                response.extend(encode_stat_response("", "", opaque));
                socket.write_all(&response).await.unwrap();
            });
        }
    });
    addr
}

/// Accepts connections and never answers.
async fn silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let (socket, _) = listener.accept().await.unwrap();
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn server(addr: SocketAddr, name: &str) -> ServerEndpointConfig {
    ServerEndpointConfig::new(addr.to_string(), name)
}

#[tokio::test]
async fn collects_every_reachable_server() {
    let cache1 = fake_memcached(&[("curr_items", "10"), ("cmd_get", "100"), ("version", "1.6.21")]).await;
    let cache2 = fake_memcached(&[("curr_items", "5"), ("threads", "4")]).await;
    let pipeline = CollectionPipeline::new(BinaryProtocolClient::default());

    let report = pipeline
        .run(
            &[server(cache1, "Cache1"), server(cache2, "Cache2")],
            Duration::from_secs(5),
            &CycleContext::numbered(1),
        )
        .await
        .unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(report.result["Cache1"].value(StatField::CurrItems), Some("10"));
    assert_eq!(report.result["Cache1"].value(StatField::CmdGet), Some("100"));
    assert_eq!(report.result["Cache1"].value(StatField::Threads), None);
    assert_eq!(report.result["Cache2"].value(StatField::CurrItems), Some("5"));
    assert_eq!(report.result["Cache2"].value(StatField::Threads), Some("4"));
    assert_eq!(report.result["Cache2"].value(StatField::CmdGet), None);
}

#[tokio::test]
async fn unreachable_and_silent_servers_are_isolated() {
    let healthy = fake_memcached(&[("evictions", "3")]).await;
    let refused = closed_port().await;
    let silent = silent_server().await;
    let pipeline = CollectionPipeline::new(BinaryProtocolClient::default());

    let report = pipeline
        .run(
            &[server(healthy, "Healthy"), server(refused, "Refused"), server(silent, "Silent")],
            Duration::from_millis(500),
            &CycleContext::numbered(1),
        )
        .await
        .unwrap();

    assert_eq!(report.result.keys().collect::<Vec<_>>(), vec!["Healthy"]);
    assert_eq!(report.result["Healthy"].value(StatField::Evictions), Some("3"));

    let skipped: Vec<&str> = report
        .warnings
        .iter()
        .filter_map(|warning| match warning {
            CollectionWarning::Unreachable { display_name, .. } => Some(display_name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec!["Refused", "Silent"]);
}

#[tokio::test]
async fn cycle_fails_when_no_server_answers() {
    let silent = silent_server().await;
    let pipeline = CollectionPipeline::new(BinaryProtocolClient::default());

    let err = pipeline
        .run(
            &[server(silent, "Silent")],
            Duration::from_millis(200),
            &CycleContext::numbered(1),
        )
        .await
        .unwrap_err();

    match err {
        CollectionError::NoServersReachable { failures } => {
            assert_eq!(failures.len(), 1);
            assert!(matches!(failures[0].1, FetchError::TimedOut { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn collector_emits_metric_lines() {
    let cache = fake_memcached(&[("bytes", "2048"), ("limit_maxbytes", "67108864")]).await;
    let config = MonitorConfig {
        servers: vec![server(cache, "Cache")],
        ..MonitorConfig::default()
    };
    let mut collector = MemcachedCollector::new(config, BinaryProtocolClient::default());

    collector.collect(CycleContext::numbered(1)).await.unwrap();

    let mut emitter = LineEmitter::new(Vec::new());
    collector.emit(&mut emitter).unwrap();
    let output = String::from_utf8(emitter.into_inner()).unwrap();
    assert_eq!(
        output.lines().collect::<Vec<_>>(),
        vec![
            "name=Custom Metrics|Memcached|Cache|bytes,value=2048,aggregator=OBSERVATION,time-rollup=CURRENT,cluster-rollup=COLLECTIVE",
            "name=Custom Metrics|Memcached|Cache|limit_maxbytes,value=67108864,aggregator=OBSERVATION,time-rollup=CURRENT,cluster-rollup=COLLECTIVE",
        ]
    );
}
