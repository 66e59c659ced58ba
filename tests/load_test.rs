//! Concurrent traffic through the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::HOST;
use revproxy::config::ProxyTarget;
use revproxy::observability::NoopObserver;

mod common;

#[tokio::test]
async fn test_concurrent_requests_route_correctly() {
    let a = common::start_echo_backend("a").await;
    let b = common::start_echo_backend("b").await;
    let config = common::proxy_config(vec![
        ("a.example.com", ProxyTarget::url(format!("http://{}", a))),
        ("b.example.com", ProxyTarget::url(format!("http://{}", b))),
    ]);
    let gateway = common::spawn_gateway(config, common::http_listener(), Arc::new(NoopObserver)).await;

    let concurrency = 20;
    let requests_per_task = 25;
    let client = common::client();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let client = client.clone();
        let url = gateway.http_url("/load");
        let (host, expected) = if task % 2 == 0 {
            ("a.example.com", "a")
        } else {
            ("b.example.com", "b")
        };
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                let response = client.get(&url).header(HOST, host).send().await.unwrap();
                assert_eq!(response.status(), 200);
                assert_eq!(common::echoed(response).await["backend"], expected);
                latencies.push(req_start.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }
    let duration = start.elapsed();

    assert_eq!(all_latencies.len(), concurrency * requests_per_task);
    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", all_latencies.len());
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", all_latencies.len() as f64 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");

    assert!(p99 < Duration::from_secs(5));
    gateway.stop().await;
}
