use std::{
    convert::Infallible,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{AppConfig, AuthMode},
    models::{Metadata, User},
};

/// ResolverError
///
/// Why an identity lookup produced no user. Neither variant is surfaced to the visitor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolverError {
    /// The provider rejected the session (expired, revoked, malformed token).
    #[error("auth check failed: {0}")]
    Auth(String),
    /// The lookup itself broke: transport failure, upstream 5xx, unreadable payload.
    #[error("unexpected error during auth check: {0}")]
    Unexpected(String),
}

/// Result of one identity lookup. `Ok(None)` is an anonymous visitor.
pub type Resolution = Result<Option<User>, ResolverError>;

/// SessionCredentials
///
/// The access token presented with a request, if any. Read from the
/// `Authorization: Bearer` header first, then from the session cookie.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionCredentials {
    access_token: Option<String>,
}

impl SessionCredentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        let token = access_token.into();
        Self {
            access_token: (!token.is_empty()).then_some(token),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_parts(parts: &Parts, cookie_name: &str) -> Self {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split_once(' '))
            // The auth scheme is case-insensitive (RFC 7235).
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty());

        if let Some(token) = bearer {
            return Self::new(token);
        }

        let jar = CookieJar::from_headers(&parts.headers);
        match jar.get(cookie_name) {
            Some(cookie) => Self::new(cookie.value()),
            None => Self::anonymous(),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

/// SessionCredentials Extractor
///
/// Never rejects: a request without a usable token is simply anonymous. The cookie
/// name comes from `AppConfig`.
impl<S> FromRequestParts<S> for SessionCredentials
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(Self::from_parts(parts, &config.auth_cookie))
    }
}

/// IdentityResolver
///
/// "Get the current user for this request." Called exactly once per entry request.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn current_user(&self, credentials: &SessionCredentials) -> Resolution;
}

/// ResolverState
///
/// The concrete type used to share the identity resolver across the application state.
pub type ResolverState = Arc<dyn IdentityResolver>;

/// Builds the resolver selected by `config.auth_mode`.
pub fn build_resolver(config: &AppConfig) -> Result<ResolverState, reqwest::Error> {
    let resolver: ResolverState = match config.auth_mode {
        AuthMode::Remote => Arc::new(SupabaseIdentityResolver::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            config.auth_timeout,
        )?),
        AuthMode::Jwt => Arc::new(JwtIdentityResolver::new(&config.jwt_secret)),
    };
    Ok(resolver)
}

/// SupabaseIdentityResolver
///
/// Asks Supabase Auth (`GET /auth/v1/user`) who owns the presented access token.
/// Rejections (4xx) are recoverable auth errors; anything else that goes wrong is unexpected.
#[derive(Clone)]
pub struct SupabaseIdentityResolver {
    client: reqwest::Client,
    user_endpoint: String,
    anon_key: String,
}

impl SupabaseIdentityResolver {
    pub fn new(supabase_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            user_endpoint: format!("{}/auth/v1/user", supabase_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
        })
    }
}

#[async_trait]
impl IdentityResolver for SupabaseIdentityResolver {
    async fn current_user(&self, credentials: &SessionCredentials) -> Resolution {
        let Some(token) = credentials.access_token() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(&self.user_endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ResolverError::Unexpected(format!("auth request failed: {e}")))?;

        let status = response.status();

        if status.is_success() {
            return response
                .json::<User>()
                .await
                .map(Some)
                .map_err(|e| ResolverError::Unexpected(format!("malformed user payload: {e}")));
        }

        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolverError::Auth(upstream_message(status, &body)));
        }

        Err(ResolverError::Unexpected(format!(
            "auth service responded with {status}"
        )))
    }
}

/// Pulls the human readable reason out of a Supabase Auth error body.
fn upstream_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| json.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        })
}

/// Claims
///
/// The payload of a Supabase access token. Supabase embeds both metadata maps
/// in the token, so a verified token is enough to make the entry decision.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// auth.users.id
    pub sub: Uuid,
    pub exp: usize,
    /// Always "authenticated" for signed-in users.
    pub aud: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "crate::models::nullable_metadata")]
    pub user_metadata: Metadata,
    #[serde(default, deserialize_with = "crate::models::nullable_metadata")]
    pub app_metadata: Metadata,
}

/// JwtIdentityResolver
///
/// Verifies the access token with the project's JWT secret (HS256) instead of
/// calling Supabase. Saves a round trip per request at the cost of not seeing
/// revocations before the token expires.
pub struct JwtIdentityResolver {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityResolver {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&["authenticated"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn current_user(&self, credentials: &SessionCredentials) -> Resolution {
        let Some(token) = credentials.access_token() else {
            return Ok(None);
        };

        let claims = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                return match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        Err(ResolverError::Auth("session expired".to_string()))
                    }
                    _ => Err(ResolverError::Auth(format!("invalid access token: {e}"))),
                };
            }
        };

        Ok(Some(User {
            id: claims.sub,
            email: claims.email,
            user_metadata: claims.user_metadata,
            app_metadata: claims.app_metadata,
            created_at: None,
        }))
    }
}

/// MockIdentityResolver
///
/// Returns a canned resolution regardless of the credentials and counts how often
/// it was asked. Used by unit and integration tests.
pub struct MockIdentityResolver {
    resolution: Resolution,
    calls: AtomicUsize,
}

impl MockIdentityResolver {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning_user(user: User) -> Self {
        Self::new(Ok(Some(user)))
    }

    pub fn anonymous() -> Self {
        Self::new(Ok(None))
    }

    pub fn failing(error: ResolverError) -> Self {
        Self::new(Err(error))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityResolver for MockIdentityResolver {
    async fn current_user(&self, _credentials: &SessionCredentials) -> Resolution {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.resolution.clone()
    }
}
