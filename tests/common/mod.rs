//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use revproxy::config::{ListenerConfig, ProxyConfig, ProxyTarget, TlsConfig};
use revproxy::lifecycle::{Gateway, Shutdown};
use revproxy::observability::{RequestEvent, RequestObserver};

/// Bind an ephemeral port on loopback.
pub async fn ephemeral_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// An address nothing listens on.
pub fn dead_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Echoes the request back as JSON: method, uri, headers and a tag.
pub async fn start_echo_backend(tag: &'static str) -> SocketAddr {
    let (listener, addr) = ephemeral_listener().await;
    let app = Router::new().fallback(move |request: Request<Body>| async move { echo(tag, request) });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn echo(tag: &str, request: Request<Body>) -> impl IntoResponse {
    let mut headers = Map::new();
    for name in request.headers().keys() {
        let values: Vec<&str> = request
            .headers()
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        headers.insert(name.to_string(), Value::String(values.join(", ")));
    }

    axum::Json(json!({
        "backend": tag,
        "method": request.method().as_str(),
        "uri": request.uri().to_string(),
        "version": format!("{:?}", request.version()),
        "headers": headers,
    }))
}

/// Backend that answers only after `delay`.
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    let (listener, addr) = ephemeral_listener().await;
    let app = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        (StatusCode::OK, "late")
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a programmable raw HTTP/1.1 backend. `f` returns the status line
/// text, extra header lines and body for each connection.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (&'static str, Vec<String>, String)> + Send + 'static,
{
    let (listener, addr) = ephemeral_listener().await;
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                // Read the request head; bodies are not used by these tests.
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                while read < buf.len() {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let (status, headers, body) = f().await;
                let mut response = format!("HTTP/1.1 {}\r\nContent-Length: {}\r\n", status, body.len());
                for header in headers {
                    response.push_str(&header);
                    response.push_str("\r\n");
                }
                response.push_str("\r\n");
                response.push_str(&body);

                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Observer that remembers what it saw.
#[derive(Default)]
pub struct RecordingObserver {
    pub requests: Mutex<Vec<(String, String, String)>>,
    pub responses: Mutex<Vec<(String, u16)>>,
}

impl RequestObserver for RecordingObserver {
    fn on_request(&self, event: &RequestEvent<'_>) {
        self.requests.lock().unwrap().push((
            event.host.to_string(),
            event.method.to_string(),
            event.uri.to_string(),
        ));
    }

    fn on_response(&self, event: &RequestEvent<'_>, status: StatusCode, _elapsed: Duration) {
        self.responses
            .lock()
            .unwrap()
            .push((event.host.to_string(), status.as_u16()));
    }
}

/// A gateway running in the background.
pub struct TestGateway {
    pub http_addr: SocketAddr,
    pub https_addr: Option<SocketAddr>,
    pub shutdown: Shutdown,
    pub task: tokio::task::JoinHandle<Result<(), revproxy::StartupError>>,
}

impl TestGateway {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.http_addr, path)
    }

    pub fn https_url(&self, path: &str) -> String {
        format!("https://{}{}", self.https_addr.expect("https not enabled"), path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("gateway did not stop after shutdown")
            .unwrap();
        assert!(result.is_ok(), "gateway stopped with {:?}", result.err());
    }
}

pub fn proxy_config(proxies: Vec<(&str, ProxyTarget)>) -> ProxyConfig {
    ProxyConfig {
        proxies: proxies
            .into_iter()
            .map(|(host, target)| (host.to_string(), target))
            .collect(),
        ..ProxyConfig::default()
    }
}

pub fn http_listener() -> ListenerConfig {
    ListenerConfig {
        http_address: "127.0.0.1:0".into(),
        ..ListenerConfig::default()
    }
}

pub fn https_listener(cert: &TestCert) -> ListenerConfig {
    ListenerConfig {
        http_address: "127.0.0.1:0".into(),
        https_address: "127.0.0.1:0".into(),
        https_enabled: true,
        tls: TlsConfig {
            cert_path: cert.cert_path.display().to_string(),
            key_path: cert.key_path.display().to_string(),
        },
    }
}

pub async fn spawn_gateway(
    config: ProxyConfig,
    listener: ListenerConfig,
    observer: Arc<dyn RequestObserver>,
) -> TestGateway {
    let gateway = Gateway::prepare_with_observer(&config, &listener, observer)
        .await
        .unwrap();
    let http_addr = gateway.http_addr().unwrap();
    let https_addr = gateway.https_addr().map(|addr| addr.unwrap());

    let shutdown = Shutdown::new();
    let task = tokio::spawn(gateway.serve(shutdown.clone()));

    TestGateway {
        http_addr,
        https_addr,
        shutdown,
        task,
    }
}

/// Self-signed certificate for localhost and 127.0.0.1, written to disk.
pub struct TestCert {
    pub dir: tempfile::TempDir,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

pub fn self_signed_cert() -> TestCert {
    let certified =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let cert_path = dir.path().join("server.crt");
    let key_path = dir.path().join("server.key");
    std::fs::write(&cert_path, certified.cert.pem()).unwrap();
    std::fs::write(&key_path, certified.key_pair.serialize_pem()).unwrap();

    TestCert {
        dir,
        cert_path,
        key_path,
    }
}

/// Echo backend served over HTTPS with a self-signed certificate.
pub async fn start_tls_echo_backend(tag: &'static str, cert: &TestCert) -> SocketAddr {
    let tls = revproxy::net::tls::load_tls_config(&cert.cert_path, &cert.key_path)
        .await
        .unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(move |request: Request<Body>| async move { echo(tag, request) });
    tokio::spawn(async move {
        let _ = axum_server::from_tcp_rustls(listener, tls)
            .serve(app.into_make_service())
            .await;
    });
    addr
}

/// HTTP client. `accept_invalid_certs` is for the gateway's own self-signed
/// listener certificate.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Body of an echo response.
pub async fn echoed(response: reqwest::Response) -> Value {
    let text = response.text().await.unwrap();
    serde_json::from_str(&text).unwrap()
}
