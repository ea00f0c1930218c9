//! Graceful shutdown against a real listener.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use rpc_http_gateway::config::GatewayConfig;
use rpc_http_gateway::http::RequestReader;
use rpc_http_gateway::lifecycle::Shutdown;

mod common;

type ServerTask = tokio::task::JoinHandle<std::io::Result<()>>;

async fn start(config: GatewayConfig) -> (String, Arc<Shutdown>, ServerTask) {
    let harness = common::harness(&config, RequestReader::anonymous());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move { harness.server.run(listener, server_shutdown).await });
    (base, shutdown, handle)
}

fn config(shutdown_secs: u64) -> GatewayConfig {
    let mut config = GatewayConfig {
        routing: common::routing(false),
        ..GatewayConfig::default()
    };
    config.timeouts.shutdown_secs = shutdown_secs;
    config
}

#[tokio::test]
async fn test_serves_then_stops_on_trigger() {
    let (base, shutdown, handle) = start(config(5)).await;

    let body = reqwest::get(format!("{base}/user?opr=login&sno=4"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "opr=login&sno=4&code=0&result=ok");
    assert!(!shutdown.is_complete());

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("server should stop after the trigger")
        .unwrap()
        .unwrap();

    assert!(shutdown.is_complete());
    // raised once, by the server
    assert!(!shutdown.mark_complete());
}

#[tokio::test]
async fn test_drain_timeout_abandons_in_flight_requests() {
    let (base, shutdown, handle) = start(config(0)).await;

    let slow = tokio::spawn(reqwest::get(format!("{base}/user?opr=slow")));
    tokio::time::sleep(Duration::from_millis(300)).await;

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("drain timeout should end the run")
        .unwrap()
        .unwrap();

    assert!(shutdown.is_complete());
    slow.abort();
}

#[tokio::test]
async fn test_completion_can_be_awaited() {
    let (_, shutdown, _handle) = start(config(5)).await;

    let waiter = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.wait_complete().await })
    };

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("completion should be signalled")
        .unwrap();
}
