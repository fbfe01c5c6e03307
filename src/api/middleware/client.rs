//! Client identification for rate limiting and logs

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request};

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

/// Key identifying the client that sent `request`.
///
/// The peer address from `ConnectInfo`, or the first `X-Forwarded-For` entry
/// when `trust_forwarded_for` is set and that entry is a valid IP.
pub fn client_key(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(ip) = forwarded_ip(request) {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_ip(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get(FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(peer: Option<&str>, forwarded: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(forwarded) = forwarded {
            builder = builder.header(FORWARDED_FOR, forwarded);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        if let Some(peer) = peer {
            let addr: SocketAddr = peer.parse().unwrap();
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        request
    }

    #[test]
    fn test_peer_address() {
        let req = request(Some("10.1.2.3:5555"), Some("203.0.113.9"));
        assert_eq!(client_key(&req, false), "10.1.2.3");
    }

    #[test]
    fn test_trusted_forwarded_for_uses_first_entry() {
        let req = request(Some("10.1.2.3:5555"), Some("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_key(&req, true), "203.0.113.9");
    }

    #[test]
    fn test_garbage_forwarded_for_falls_back_to_peer() {
        let req = request(Some("10.1.2.3:5555"), Some("not-an-ip"));
        assert_eq!(client_key(&req, true), "10.1.2.3");
    }

    #[test]
    fn test_no_connect_info() {
        assert_eq!(client_key(&request(None, None), false), UNKNOWN_CLIENT);
    }
}
