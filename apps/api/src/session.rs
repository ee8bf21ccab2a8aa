//! Browser sessions — an opaque UUID carried in the `analysis_session` cookie.
//!
//! Sessions only scope the pending upload slot. There is no server-side
//! session table; an unknown or malformed cookie simply yields a fresh id.

use std::convert::Infallible;
use std::fmt;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "analysis_session";

/// Identifier of one browser caller. Always a canonical UUID string, so it is
/// safe to embed in upload file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }

    /// Accepts `raw` only if it is a UUID.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim())
            .ok()
            .map(|id| SessionId(id.to_string()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
impl From<String> for SessionId {
    fn from(raw: String) -> Self {
        SessionId(raw)
    }
}

/// Extractor resolving the caller's session from the request cookies.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// True when no valid cookie was sent and `id` was minted for this request.
    pub is_new: bool,
}

impl Session {
    /// `Set-Cookie` value binding the browser to this session.
    pub fn cookie(&self) -> HeaderValue {
        let value = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id);
        // UUIDs and the fixed attributes are plain ASCII.
        HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(match session_from_headers(&parts.headers) {
            Some(id) => Session { id, is_new: false },
            None => Session {
                id: SessionId::generate(),
                is_new: true,
            },
        })
    }
}

fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value))
}
