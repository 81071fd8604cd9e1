//! Credential suppliers.
//!
//! A supplier is asked once per tool call, so tokens that rotate between
//! calls are picked up without rebuilding the agent.

use async_trait::async_trait;
use mcpagent_core::error::AuthError;
use mcpagent_core::transport::CredentialSupplier;

/// Authentication disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentials;

#[async_trait]
impl CredentialSupplier for NoCredentials {
    async fn credential(&self) -> Result<Option<String>, AuthError> {
        Ok(None)
    }
}

/// A fixed bearer token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken([REDACTED])")
    }
}

#[async_trait]
impl CredentialSupplier for StaticToken {
    async fn credential(&self) -> Result<Option<String>, AuthError> {
        Ok(Some(self.0.clone()))
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

#[async_trait]
impl CredentialSupplier for EnvToken {
    async fn credential(&self) -> Result<Option<String>, AuthError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(Some(token)),
            Ok(_) => Err(AuthError::Unavailable(format!("{} is empty", self.var))),
            Err(std::env::VarError::NotPresent) => {
                Err(AuthError::Unavailable(format!("{} is not set", self.var)))
            }
            Err(e) => Err(AuthError::SupplierFailed(format!("{}: {e}", self.var))),
        }
    }
}
