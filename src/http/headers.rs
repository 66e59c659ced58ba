//! Header manipulation on the forwarding path.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Append the client IP to X-Forwarded-For
//! - Inject the CORS headers every proxied response carries

use std::net::SocketAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Headers that describe a single connection and never cross the proxy.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Append the client IP to `X-Forwarded-For`, joining any existing values.
pub fn append_forwarded_for(headers: &mut HeaderMap, client: SocketAddr) {
    let ip = client.ip().to_string();
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        ip
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

/// Set the CORS headers, replacing any values the backend sent.
pub fn inject_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("X-Requested-With"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_standard_and_listed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-session-hint"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-session-hint", HeaderValue::from_static("abc"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::UPGRADE, HeaderValue::from_static("h2c"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(header::HOST, HeaderValue::from_static("api.example.com"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers[header::ACCEPT], "application/json");
        assert_eq!(headers[header::HOST], "api.example.com");
    }

    #[test]
    fn forwarded_for_is_appended() {
        let client: SocketAddr = "192.0.2.7:51000".parse().unwrap();

        let mut fresh = HeaderMap::new();
        append_forwarded_for(&mut fresh, client);
        assert_eq!(fresh[X_FORWARDED_FOR], "192.0.2.7");

        let mut chained = HeaderMap::new();
        chained.append(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.1"));
        chained.append(X_FORWARDED_FOR, HeaderValue::from_static("198.51.100.2"));
        append_forwarded_for(&mut chained, client);
        assert_eq!(
            chained.get_all(X_FORWARDED_FOR).iter().count(),
            1
        );
        assert_eq!(chained[X_FORWARDED_FOR], "203.0.113.1, 198.51.100.2, 192.0.2.7");
    }

    #[test]
    fn cors_overrides_backend_values() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://only.example.com"),
        );

        inject_cors(&mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "X-Requested-With");
        assert_eq!(headers.get_all(header::ACCESS_CONTROL_ALLOW_ORIGIN).iter().count(), 1);
    }
}
