//! Session-wide transport settings.
//!
//! These are pass-through directives: the engine copies them into every
//! [`TransferConfig`] and the transport enforces them. The engine itself has
//! no timers and never retries.

use std::time::Duration;

use serde::Deserialize;

use crate::transport::TransferConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Whole-transfer timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    /// Upper bound on followed redirects; the transport's default when unset.
    pub max_redirects: Option<u32>,
}

impl SessionConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(saturating_millis(timeout));
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = Some(saturating_millis(timeout));
        self
    }

    pub fn with_max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = Some(max);
        self
    }

    pub(crate) fn apply(&self, config: &mut TransferConfig) {
        config.timeout = self.timeout_ms.map(Duration::from_millis);
        config.connect_timeout = self.connect_timeout_ms.map(Duration::from_millis);
        config.max_redirects = self.max_redirects;
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
