//! Collaborator API configuration.
//!
//! The backend that owns balances, invoices and coupon numbers is reached over HTTP.
//! Its base URL, bearer token and request timeout come from the environment
//! (`API_URL`, `API_TOKEN`, `API_TIMEOUT_SECS`), usually through the `.env` file.

use crate::errors::{Error, Result};
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how to reach the backend API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Bearer token sent with every request, when present
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Reads the API configuration from the process environment.
    ///
    /// # Errors
    /// Returns `Error::Config` when `API_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `Error::Config` when `API_TIMEOUT_SECS` is not a number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let token = lookup("API_TOKEN").filter(|token| !token.trim().is_empty());

        let timeout_secs = match lookup("API_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| Error::Config {
                message: format!("API_TIMEOUT_SECS must be a whole number of seconds: {e}"),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Joins an endpoint path onto the base URL.
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}
