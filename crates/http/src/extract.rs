//! Request extractors: authenticated user, bearer token, client IP and JSON bodies

use crate::error::{HttpError, HttpResult};
use crate::state::AppState;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};
use bookstore_auth::{extract_bearer, is_admin, is_staff, AuthError, Claims};
use bookstore_orm::models::User;
use bookstore_orm::repositories::users;
use bookstore_orm::ModelError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// The caller behind a valid, unrevoked bearer token, with roles loaded fresh
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub roles: Vec<String>,
    pub claims: Claims,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        is_admin(&self.roles)
    }

    pub fn is_staff(&self) -> bool {
        is_staff(&self.roles)
    }

    pub fn require_admin(&self) -> HttpResult<()> {
        Ok(bookstore_auth::require_admin(&self.roles)?)
    }

    pub fn require_staff(&self) -> HttpResult<()> {
        Ok(bookstore_auth::require_staff(&self.roles)?)
    }
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(authorization(&parts.headers))?.ok_or(AuthError::MissingToken)?;
        let claims = state.jwt.verify(token)?;
        if state.denylist.is_revoked(&claims.jti) {
            return Err(AuthError::TokenRevoked.into());
        }

        let mut conn = state.pool.acquire().await.map_err(ModelError::from)?;
        let found = users::find_with_roles(&mut conn, claims.user_id()?).await?;
        let Some(found) = found else {
            tracing::debug!(sub = %claims.sub, "Token subject no longer exists");
            return Err(HttpError::unauthenticated());
        };

        Ok(AuthUser {
            user: found.user,
            roles: found.roles,
            claims,
        })
    }
}

/// Raw bearer token, if the request carries one
#[derive(Debug, Clone)]
pub struct BearerToken(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(authorization(&parts.headers))?;
        Ok(BearerToken(token.map(str::to_string)))
    }
}

/// Client address as Laravel's `$request->ip()` sees it. The socket peer is
/// authoritative; forwarding headers count only when the peer is a trusted
/// proxy, and then the right-most untrusted `X-Forwarded-For` hop wins.
pub fn client_ip_from(headers: &HeaderMap, extensions: &Extensions, trusted: &[IpAddr]) -> IpAddr {
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if !trusted.contains(&peer) {
        return peer;
    }

    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

    if let Some(forwarded) = header("x-forwarded-for") {
        let hop = forwarded
            .rsplit(',')
            .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
            .find(|ip| !trusted.contains(ip));
        if let Some(ip) = hop {
            return ip;
        }
    }

    header("x-real-ip")
        .and_then(|value| value.trim().parse::<IpAddr>().ok())
        .unwrap_or(peer)
}

pub fn client_ip(request: &Request, trusted: &[IpAddr]) -> IpAddr {
    client_ip_from(request.headers(), request.extensions(), trusted)
}

#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ip = client_ip_from(&parts.headers, &parts.extensions, &state.config.trusted_proxies);
        Ok(ClientIp(ip.to_string()))
    }
}

/// A JSON object body. An empty body reads as `{}` so that validation
/// reports the missing fields instead of a parse error.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = HttpError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|e| HttpError::bad_request("Unreadable request body").with_error("body", e.to_string()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(Value::Object(Map::new())));
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value @ Value::Object(_)) => Ok(JsonBody(value)),
            Ok(_) => Err(HttpError::bad_request("Malformed JSON body")
                .with_error("body", "The request body must be a JSON object.")),
            Err(e) => Err(HttpError::bad_request("Malformed JSON body").with_error("body", e.to_string())),
        }
    }
}

impl JsonBody {
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Rewrite numeric strings (`"12.5"`) in `fields` as JSON numbers
    pub fn coerce_numbers(mut self, fields: &[&str]) -> Self {
        coerce_numbers(&mut self.0, fields);
        self
    }

    /// Deserialize into `T`; shape mismatches surface as 422
    pub fn parse<T: DeserializeOwned>(self) -> HttpResult<T> {
        serde_json::from_value(self.0).map_err(|e| {
            HttpError::unprocessable("Validation failed").with_error("body", e.to_string())
        })
    }
}

pub fn coerce_numbers(value: &mut Value, fields: &[&str]) {
    let Some(object) = value.as_object_mut() else {
        return;
    };

    for field in fields {
        let Some(slot) = object.get_mut(*field) else {
            continue;
        };
        let number = match slot {
            Value::String(raw) => {
                let raw = raw.trim();
                match raw.parse::<i64>() {
                    Ok(int) => Some(Value::from(int)),
                    Err(_) => raw
                        .parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .map(Value::from),
                }
            }
            _ => None,
        };
        if let Some(number) = number {
            *slot = number;
        }
    }
}

/// Parse a numeric path segment
pub fn parse_id(raw: &str, name: &str) -> HttpResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            HttpError::bad_request(format!("Invalid parameter: {}", name))
                .with_error(name, format!("The {} must be a positive integer.", name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn peer(ip: [u8; 4]) -> Extensions {
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from((ip, 5555))));
        extensions
    }

    fn ip(raw: &str) -> IpAddr {
        raw.parse().unwrap()
    }

    #[test]
    fn test_client_ip_ignores_headers_from_untrusted_peers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        assert_eq!(client_ip_from(&headers, &peer([192, 168, 1, 20]), &[]), ip("192.168.1.20"));
        assert_eq!(
            client_ip_from(&headers, &peer([192, 168, 1, 20]), &[ip("10.0.0.1")]),
            ip("192.168.1.20")
        );
    }

    #[test]
    fn test_client_ip_without_connect_info_is_loopback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        assert_eq!(client_ip_from(&headers, &Extensions::new(), &[]), ip("127.0.0.1"));
    }

    #[test]
    fn test_client_ip_behind_trusted_proxy() {
        let trusted = [ip("10.0.0.1"), ip("10.0.0.9")];

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 203.0.113.7, 10.0.0.9"),
        );
        assert_eq!(client_ip_from(&headers, &peer([10, 0, 0, 1]), &trusted), ip("203.0.113.7"));

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip_from(&headers, &peer([10, 0, 0, 1]), &trusted), ip("198.51.100.4"));

        assert_eq!(
            client_ip_from(&HeaderMap::new(), &peer([10, 0, 0, 1]), &trusted),
            ip("10.0.0.1")
        );
    }

    #[test]
    fn test_coerce_numbers() {
        let mut body = json!({"price": "12.50", "pages": "300", "title": "42", "quantity": "many"});
        coerce_numbers(&mut body, &["price", "pages", "quantity"]);
        assert_eq!(body["price"], json!(12.5));
        assert_eq!(body["pages"], json!(300));
        assert_eq!(body["title"], json!("42"));
        assert_eq!(body["quantity"], json!("many"));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("17", "id").unwrap(), 17);
        assert!(parse_id("0", "id").is_err());
        assert!(parse_id("abc", "bookId").is_err());
    }

    #[test]
    fn test_parse_reports_shape_errors_as_422() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Input {
            pages: i32,
        }
        let err = JsonBody(json!({"pages": "lots"})).parse::<Input>().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }
}
