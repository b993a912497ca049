use crate::api::server::AppState;
use crate::record::Credentials;
use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use base64::engine::general_purpose;
use base64::Engine;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

const HEADER_X_REAL_IP: &str = "x-real-ip";
const HEADER_X_FORWARDED_FOR: &str = "x-forwarded-for";
const HEADER_X_API_USER: &str = "x-api-user";
const HEADER_X_API_KEY: &str = "x-api-key";
const BASIC_PREFIX: &str = "Basic ";

/// The caller's address. Taken from the TCP peer, or from the forwarding headers when the peer
/// is a trusted proxy that sent them. `None` when a trusted proxy forwarded an unparseable
/// address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ClientIp(pub Option<IpAddr>);

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() else {
            return Ok(Self(None));
        };
        let peer = peer.ip();
        if !state.config.is_trusted_proxy(peer) {
            return Ok(Self(Some(peer)));
        }
        Ok(Self(client_ip_behind_proxy(peer, &parts.headers)))
    }
}

/// `X-Real-Ip`, else the first `X-Forwarded-For` entry, else the proxy's own address. Empty
/// header values count as absent.
fn client_ip_behind_proxy(proxy: IpAddr, headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = non_empty_header(headers, HEADER_X_REAL_IP).or_else(|| {
        non_empty_header(headers, HEADER_X_FORWARDED_FOR)
            .and_then(|list| list.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    });
    let Some(forwarded) = forwarded else {
        return Some(proxy);
    };
    match forwarded.parse() {
        Ok(ip) => Some(ip),
        Err(_) => {
            tracing::debug!("ignoring unparseable forwarded address \"{forwarded}\"");
            None
        }
    }
}

fn non_empty_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    header_str(headers, name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Credentials from an `Authorization: Basic` header, if one was sent and decodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct BasicAuth(pub Option<Credentials>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BasicAuth {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(
            header_str(&parts.headers, AUTHORIZATION.as_str()).and_then(decode_basic_auth),
        ))
    }
}

fn decode_basic_auth(authorization: &str) -> Option<Credentials> {
    let encoded = authorization.strip_prefix(BASIC_PREFIX)?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Credentials from the `X-Api-User` / `X-Api-Key` header pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ApiKeyAuth(pub Option<Credentials>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ApiKeyAuth {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let username = header_str(&parts.headers, HEADER_X_API_USER);
        let password = header_str(&parts.headers, HEADER_X_API_KEY);
        Ok(Self(match (username, password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => None,
        }))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
