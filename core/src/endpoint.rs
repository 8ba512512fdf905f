//! Backend address and API key.
//!
//! An `EndpointConfig` is validated once and read thereafter. The preferred
//! way to use it is to hand it to `Dispatcher::new`; independent dispatchers
//! can then target different backends. A process-wide slot is kept for hosts
//! that configure the SDK once at startup and resolve it later with
//! `current()`.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ApiError;

pub const BASE_URL_ENV: &str = "TUTORING_BASE_URL";
pub const API_KEY_ENV: &str = "TUTORING_API_KEY";

static CURRENT: RwLock<Option<Arc<EndpointConfig>>> = parking_lot::const_rwlock(None);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    base_address: String,
    api_key: String,
}

impl EndpointConfig {
    /// Fails with `InvalidAddress` if `base_address` has no `://`.
    pub fn new(base_address: &str, api_key: &str) -> Result<Self, ApiError> {
        if !base_address.contains("://") {
            return Err(ApiError::InvalidAddress(base_address.to_string()));
        }
        Ok(Self {
            base_address: base_address.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Read `TUTORING_BASE_URL` and `TUTORING_API_KEY`. A missing key is
    /// treated as empty; a missing base URL is `NotConfigured`.
    pub fn from_env() -> Result<Self, ApiError> {
        let base = std::env::var(BASE_URL_ENV).map_err(|_| ApiError::NotConfigured)?;
        let key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::new(&base, &key)
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Full target for `route`: base address, route, then `/<api key>`.
    pub fn target(&self, route: &str) -> String {
        format!("{}{}/{}", self.base_address, route, self.api_key)
    }
}

/// Validate and install a process-wide configuration, replacing any
/// previous one. On failure the previous configuration stays in place.
pub fn configure(base_address: &str, api_key: &str) -> Result<(), ApiError> {
    let config = EndpointConfig::new(base_address, api_key)?;
    *CURRENT.write() = Some(Arc::new(config));
    tracing::debug!(base_address, "endpoint configured");
    Ok(())
}

/// The configuration installed by `configure`.
pub fn current() -> Result<Arc<EndpointConfig>, ApiError> {
    CURRENT.read().clone().ok_or(ApiError::NotConfigured)
}
