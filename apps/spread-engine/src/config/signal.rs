//! Signal provider settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infrastructure::signal::GammaWizardConfig;

/// GammaWizard signal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// API host.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Endpoint path returning the LeoCross payload.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token.
    #[serde(default)]
    pub token: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl SignalConfig {
    /// Client configuration.
    #[must_use]
    pub fn to_client_config(&self) -> GammaWizardConfig {
        let mut config = GammaWizardConfig::new(self.token.clone()).with_base_url(self.base_url.clone());
        config.endpoint.clone_from(&self.endpoint);
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.retry = config.retry.with_max_attempts(self.max_attempts);
        config
    }
}

fn default_base_url() -> String {
    "https://gandalf.gammawizard.com".to_string()
}

fn default_endpoint() -> String {
    "/rapi/GetLeoCross".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_attempts() -> u32 {
    3
}
