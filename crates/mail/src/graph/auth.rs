//! Bearer-token authentication boundary
//!
//! Token acquisition and refresh happen outside this crate; this type only
//! holds the token and hands it to the client.

use anyhow::{Result, bail};

use crate::config::GraphCredentials;

/// Access-token holder for the remote mail API
pub struct GraphAuth {
    access_token: String,
}

impl GraphAuth {
    /// Create an auth boundary around an already-acquired bearer token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Build from loaded credentials
    pub fn from_credentials(credentials: &GraphCredentials) -> Self {
        Self::new(credentials.access_token.clone())
    }

    /// Get the bearer token for a request
    pub fn access_token(&self) -> Result<&str> {
        if self.access_token.is_empty() {
            bail!("No access token configured");
        }
        Ok(&self.access_token)
    }

    /// Check whether a token is present
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }
}
