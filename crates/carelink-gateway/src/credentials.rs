//! Bearer credentials for the FHIR store.
//!
//! The gateway asks its [`TokenSource`] for a token on every request and
//! never caches one itself; refresh and expiry belong to the source.

use async_trait::async_trait;

use crate::error::GatewayError;

/// Supplies bearer tokens scoped to the clinical-data platform.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String, GatewayError>;
}

/// A fixed token, for tests and short-lived tooling.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, GatewayError> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on each call, so an external
/// refresher can rotate it underneath a running process.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl TokenSource for EnvToken {
    async fn token(&self) -> Result<String, GatewayError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(GatewayError::credential(format!(
                "environment variable {} is unset or empty",
                self.var
            ))),
        }
    }
}
