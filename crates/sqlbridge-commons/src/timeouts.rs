//! Timeout configuration for SQLBridge transports.
//!
//! Blocking HTTP transports read these values when building their clients; the
//! async fetch driver reads `poll_timeout` to bound how long a statement may stay
//! in the running state.

use crate::config::HttpSettings;
use std::time::Duration;

/// Timeout configuration for transport operations.
///
/// # Examples
///
/// ```rust
/// use sqlbridge_commons::BridgeTimeouts;
/// use std::time::Duration;
///
/// // Use defaults (recommended for most cases)
/// let timeouts = BridgeTimeouts::default();
///
/// // Long-running warehouse queries
/// let timeouts = BridgeTimeouts::builder()
///     .request_timeout(Duration::from_secs(900))
///     .poll_timeout_secs(3600)
///     .build();
///
/// // Aggressive timeouts for local engines
/// let timeouts = BridgeTimeouts::fast();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeTimeouts {
    /// Timeout for establishing connections (TCP + TLS handshake).
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Timeout for a single request, including reading a streamed body.
    /// Default: 300 seconds
    pub request_timeout: Duration,

    /// Upper bound on the time a statement may stay running while polled.
    /// Set to 0 to poll until a terminal state.
    /// Default: 0 (disabled)
    pub poll_timeout: Duration,
}

impl Default for BridgeTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            poll_timeout: Duration::ZERO,
        }
    }
}

impl From<&HttpSettings> for BridgeTimeouts {
    fn from(settings: &HttpSettings) -> Self {
        Self {
            connection_timeout: Duration::from_secs(settings.connection_timeout_secs),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            poll_timeout: Duration::ZERO,
        }
    }
}

impl BridgeTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> BridgeTimeoutsBuilder {
        BridgeTimeoutsBuilder::new()
    }

    /// Short timeouts suitable for engines on localhost.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(60),
        }
    }

    /// Long timeouts for remote warehouses and unreliable networks.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(1800),
            poll_timeout: Duration::ZERO,
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365) // > 1 year
    }
}

/// Builder for creating custom [`BridgeTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct BridgeTimeoutsBuilder {
    timeouts: BridgeTimeouts,
}

impl BridgeTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: BridgeTimeouts::default(),
        }
    }

    /// Set the connection timeout (TCP + TLS handshake).
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the connection timeout in seconds.
    pub fn connection_timeout_secs(self, secs: u64) -> Self {
        self.connection_timeout(Duration::from_secs(secs))
    }

    /// Set the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    /// Set the per-request timeout in seconds.
    pub fn request_timeout_secs(self, secs: u64) -> Self {
        self.request_timeout(Duration::from_secs(secs))
    }

    /// Set the overall polling bound. 0 disables it.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.poll_timeout = timeout;
        self
    }

    /// Set the overall polling bound in seconds. 0 disables it.
    pub fn poll_timeout_secs(self, secs: u64) -> Self {
        self.poll_timeout(Duration::from_secs(secs))
    }

    /// Build the timeout configuration.
    pub fn build(self) -> BridgeTimeouts {
        self.timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = BridgeTimeouts::default();
        assert_eq!(timeouts.connection_timeout, Duration::from_secs(10));
        assert_eq!(timeouts.request_timeout, Duration::from_secs(300));
        assert!(timeouts.poll_timeout.is_zero());
    }

    #[test]
    fn test_builder() {
        let timeouts = BridgeTimeouts::builder()
            .connection_timeout_secs(60)
            .request_timeout_secs(120)
            .poll_timeout_secs(600)
            .build();

        assert_eq!(timeouts.connection_timeout, Duration::from_secs(60));
        assert_eq!(timeouts.request_timeout, Duration::from_secs(120));
        assert_eq!(timeouts.poll_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_presets() {
        assert!(BridgeTimeouts::fast().connection_timeout <= Duration::from_secs(5));
        assert!(BridgeTimeouts::relaxed().request_timeout >= Duration::from_secs(600));
    }

    #[test]
    fn test_from_http_settings() {
        let settings = HttpSettings {
            connection_timeout_secs: 3,
            request_timeout_secs: 45,
            ..HttpSettings::default()
        };
        let timeouts = BridgeTimeouts::from(&settings);
        assert_eq!(timeouts.connection_timeout, Duration::from_secs(3));
        assert_eq!(timeouts.request_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_is_no_timeout() {
        assert!(BridgeTimeouts::is_no_timeout(Duration::ZERO));
        assert!(!BridgeTimeouts::is_no_timeout(Duration::from_secs(1)));
        assert!(BridgeTimeouts::is_no_timeout(Duration::from_secs(86400 * 400)));
    }
}
