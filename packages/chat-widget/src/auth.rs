//! Bearer-token configuration with secure memory.
//!
//! Static tokens live in a `secrecy`-backed [`SecretString`] so they never
//! show up in logs or `Debug` output. Dynamic tokens come from a
//! [`TokenProvider`], resolved before every request attempt.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretBox};
use serde::Deserialize;

use crate::error::Result;

/// Header used when the configuration does not name one.
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually building a request header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Produces a bearer token on demand (session refresh, SSO, etc.).
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String>;
}

#[async_trait]
impl<F, Fut> TokenProvider for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send,
{
    async fn token(&self) -> Result<String> {
        (self)().await
    }
}

/// Where the bearer token comes from.
#[derive(Clone)]
pub enum TokenSource {
    Static(SecretString),
    Provider(Arc<dyn TokenProvider>),
}

impl TokenSource {
    pub async fn resolve(&self) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.expose().to_string()),
            TokenSource::Provider(provider) => provider.token().await,
        }
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Static(token) => f.debug_tuple("Static").field(token).finish(),
            TokenSource::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// Optional bearer authentication applied to every request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "AuthConfigRepr")]
pub struct AuthConfig {
    pub token: Option<TokenSource>,
    pub header_name: Option<String>,
}

impl AuthConfig {
    /// Authenticate with a fixed token.
    pub fn bearer(token: impl Into<SecretString>) -> Self {
        Self {
            token: Some(TokenSource::Static(token.into())),
            header_name: None,
        }
    }

    /// Authenticate with a token produced per request.
    pub fn with_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.token = Some(TokenSource::Provider(Arc::new(provider)));
        self
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self
    }

    pub fn header_name(&self) -> &str {
        self.header_name.as_deref().unwrap_or(DEFAULT_AUTH_HEADER)
    }

    /// Resolve the header to attach, or `None` when no token is configured.
    pub async fn header(&self) -> Result<Option<(String, String)>> {
        let Some(source) = &self.token else {
            return Ok(None);
        };
        let token = source.resolve().await?;
        Ok(Some((
            self.header_name().to_string(),
            format!("Bearer {}", token),
        )))
    }
}

/// JSON shape accepted from hosts: only static tokens can be expressed there.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthConfigRepr {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    header_name: Option<String>,
}

impl From<AuthConfigRepr> for AuthConfig {
    fn from(repr: AuthConfigRepr) -> Self {
        Self {
            token: repr.token.map(|t| TokenSource::Static(SecretString::new(t))),
            header_name: repr.header_name,
        }
    }
}
