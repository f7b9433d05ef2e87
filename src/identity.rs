//! Anonymous visitor identities.
//!
//! A visitor is known by a random token held in the `uuid` cookie. Resolving
//! never touches storage; the only observable effect is the `Set-Cookie`
//! header for a freshly issued token.

use std::{convert::Infallible, fmt};

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use time::OffsetDateTime;
use tower_sessions::cookie::{Cookie, SameSite};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "uuid";
pub const LIFETIME: time::Duration = time::Duration::days(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity(Uuid);

impl Identity {
    pub fn issue() -> Self {
        Self(Uuid::new_v4())
    }

    /// `None` for anything that is not a usable token.
    pub fn parse(token: &str) -> Option<Self> {
        Uuid::parse_str(token.trim())
            .ok()
            .filter(|uuid| !uuid.is_nil())
            .map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Identity carried by the request, if any. Malformed cookies count as absent.
pub fn existing(headers: &HeaderMap) -> Option<Identity> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == COOKIE_NAME)
        .and_then(|cookie| Identity::parse(cookie.value()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub identity: Identity,
    /// Issued during this request; the client does not hold it yet.
    pub fresh: bool,
}

pub fn resolve(headers: &HeaderMap) -> Resolved {
    match existing(headers) {
        Some(identity) => Resolved { identity, fresh: false },
        None => Resolved { identity: Identity::issue(), fresh: true },
    }
}

impl Resolved {
    /// The header that hands a fresh token to the client.
    pub fn set_cookie(&self, secure: bool) -> Option<HeaderValue> {
        if !self.fresh {
            return None;
        }

        let cookie = Cookie::build((COOKIE_NAME, self.identity.to_string()))
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .max_age(LIFETIME)
            .expires(OffsetDateTime::now_utc() + LIFETIME)
            .build();
        HeaderValue::from_str(&cookie.to_string()).ok()
    }
}

/// Extractor that always yields an identity, issuing one when needed.
pub struct Visitor(pub Resolved);

impl<S: Send + Sync> FromRequestParts<S> for Visitor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Visitor(resolve(&parts.headers)))
    }
}

/// Extractor for read-only pages: never issues a token.
pub struct KnownVisitor(pub Option<Identity>);

impl<S: Send + Sync> FromRequestParts<S> for KnownVisitor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(KnownVisitor(existing(&parts.headers)))
    }
}
