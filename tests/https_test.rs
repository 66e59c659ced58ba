//! HTTPS listener and HTTPS backend tests.

use std::sync::Arc;

use reqwest::header::HOST;
use revproxy::config::ProxyTarget;
use revproxy::lifecycle::{Gateway, StartupError};
use revproxy::net::ListenerError;
use revproxy::observability::NoopObserver;

mod common;

use common::{echoed, https_listener, proxy_config, self_signed_cert, spawn_gateway};

#[tokio::test]
async fn test_http_and_https_share_routes() {
    let cert = self_signed_cert();
    let api = common::start_echo_backend("api").await;
    let config = proxy_config(vec![(
        "api.example.com",
        ProxyTarget::url(format!("http://{}", api)),
    )]);
    let gateway = spawn_gateway(config, https_listener(&cert), Arc::new(NoopObserver)).await;
    let client = common::client();

    for url in [gateway.http_url("/both?via=x"), gateway.https_url("/both?via=x")] {
        let response = client.get(&url).header(HOST, "api.example.com").send().await.unwrap();
        assert_eq!(response.status(), 200, "{}", url);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");

        let body = echoed(response).await;
        assert_eq!(body["backend"], "api");
        assert_eq!(body["uri"], "/both?via=x");
    }

    let response = client
        .get(gateway.https_url("/"))
        .header(HOST, "unknown.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    gateway.stop().await;
}

#[tokio::test]
async fn test_self_signed_backend_requires_opt_in() {
    let listener_cert = self_signed_cert();
    let backend_cert = self_signed_cert();
    let backend = common::start_tls_echo_backend("tls", &backend_cert).await;
    let url = format!("https://{}", backend);

    let config = proxy_config(vec![
        ("trusting.example.com", ProxyTarget::insecure(url.clone())),
        ("strict.example.com", ProxyTarget::url(url)),
    ]);
    let gateway = spawn_gateway(config, https_listener(&listener_cert), Arc::new(NoopObserver)).await;
    let client = common::client();

    let response = client
        .get(gateway.http_url("/secure"))
        .header(HOST, "trusting.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = echoed(response).await;
    assert_eq!(body["backend"], "tls");
    assert_eq!(body["uri"], "/secure");

    let response = client
        .get(gateway.http_url("/secure"))
        .header(HOST, "strict.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502, "unverified certificate must be rejected");

    gateway.stop().await;
}

#[tokio::test]
async fn test_https_backend_skipped_when_https_disabled() {
    let backend_cert = self_signed_cert();
    let backend = common::start_tls_echo_backend("tls", &backend_cert).await;

    let config = proxy_config(vec![(
        "secure.example.com",
        ProxyTarget::insecure(format!("https://{}", backend)),
    )]);
    let gateway = spawn_gateway(config, common::http_listener(), Arc::new(NoopObserver)).await;

    let response = common::client()
        .get(gateway.http_url("/"))
        .header(HOST, "secure.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    gateway.stop().await;
}

#[tokio::test]
async fn test_invalid_listener_certificate_is_fatal() {
    let cert = self_signed_cert();
    std::fs::write(&cert.cert_path, "not a certificate").unwrap();

    let result = Gateway::prepare(&proxy_config(vec![]), &https_listener(&cert)).await;
    match result {
        Err(StartupError::Listener(ListenerError::Tls(_))) => {}
        other => panic!("expected a TLS error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_https_port_in_use_is_fatal() {
    let cert = self_signed_cert();
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();

    let mut listener = https_listener(&cert);
    listener.https_address = taken.local_addr().unwrap().to_string();

    let result = Gateway::prepare(&proxy_config(vec![]), &listener).await;
    match result {
        Err(StartupError::Listener(ListenerError::Bind { protocol, .. })) => {
            assert_eq!(protocol, "https")
        }
        other => panic!("expected a bind error, got {:?}", other.err()),
    }
}
