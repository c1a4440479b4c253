//! Client origin derivation behind a configurable number of trusted proxies.
//!
//! With `proxy_count == 0` only the TCP peer is trusted. Otherwise the entry
//! `proxy_count` positions from the end of `X-Forwarded-For` is used: each
//! trusted proxy appends the address it saw, so anything to the left of that
//! entry was supplied by the client and cannot be trusted.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Key identifying the client for rate limiting.
pub fn client_origin(headers: &HeaderMap, peer: SocketAddr, proxy_count: usize) -> String {
    if proxy_count == 0 {
        return peer.ip().to_string();
    }

    let hops: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .collect();

    if hops.len() >= proxy_count {
        if let Ok(ip) = hops[hops.len() - proxy_count].parse::<IpAddr>() {
            return ip.to_string();
        }
    }

    tracing::debug!(peer = %peer, proxy_count, hops = hops.len(), "Forwarded chain unusable, using peer address");
    peer.ip().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.10:5000".parse().unwrap()
    }

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_direct_peer_when_no_proxies() {
        let headers = forwarded("203.0.113.7");
        assert_eq!(client_origin(&headers, peer(), 0), "192.0.2.10");
    }

    #[test]
    fn test_single_trusted_proxy() {
        let headers = forwarded("6.6.6.6, 203.0.113.7");
        assert_eq!(client_origin(&headers, peer(), 1), "203.0.113.7");
    }

    #[test]
    fn test_two_trusted_proxies() {
        let headers = forwarded("6.6.6.6, 203.0.113.7, 198.51.100.2");
        assert_eq!(client_origin(&headers, peer(), 2), "203.0.113.7");
    }

    #[test]
    fn test_short_chain_falls_back_to_peer() {
        let headers = forwarded("203.0.113.7");
        assert_eq!(client_origin(&headers, peer(), 2), "192.0.2.10");
        assert_eq!(client_origin(&HeaderMap::new(), peer(), 1), "192.0.2.10");
    }

    #[test]
    fn test_garbage_entry_falls_back_to_peer() {
        let headers = forwarded("not-an-ip");
        assert_eq!(client_origin(&headers, peer(), 1), "192.0.2.10");
    }
}
