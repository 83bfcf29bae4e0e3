//! Scan configuration
//!
//! [`ScanSettings`] is the mutable surface a CLI or GUI writes to before a
//! scan. [`ScanSettings::snapshot`] freezes it into a [`ScanConfig`] which is
//! handed to the scanner and never changes for the duration of that scan.

use derive_builder::Builder;
use std::time::Duration;

/// Default number of concurrent workers
pub const DEFAULT_CONCURRENCY: usize = 32;
/// Hard maximum number of concurrent workers, even with user override
pub const MAX_CONCURRENCY: usize = 128;
/// Default timeout for external operations in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
/// Maximum timeout for external operations in milliseconds
pub const MAX_TIMEOUT_MS: u64 = 30000;
/// Ceiling applied to the ping utility's own wait argument
pub const PING_TIMEOUT_CAP_MS: u64 = 5000;
/// Concurrency above which a scan is considered high-intensity
pub const HIGH_INTENSITY_CONCURRENCY: usize = 64;

/// Immutable scan parameters
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into))]
pub struct ScanConfig {
    /// Maximum number of targets probed at once
    #[builder(default = "DEFAULT_CONCURRENCY")]
    pub concurrency: usize,
    /// Politeness delay applied before each probe (jitter is added on top)
    #[builder(default = "Duration::ZERO")]
    pub delay: Duration,
    /// Deadline for every external command and lookup
    #[builder(default = "Duration::from_millis(DEFAULT_TIMEOUT_MS)")]
    pub timeout: Duration,
    /// Lifts the default ceiling up to the hard ceiling
    #[builder(default)]
    pub allow_large_ranges: bool,
    /// Use active ARP tooling rather than only reading the neighbor cache
    #[builder(default)]
    pub active_arp: bool,
}

impl ScanConfig {
    /// Returns builder for ScanConfig
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Timeout passed to the ping utility itself. Ping tools have their own
    /// upper limits so this is capped below the global ceiling.
    pub fn ping_timeout(&self) -> Duration {
        self.timeout.min(Duration::from_millis(PING_TIMEOUT_CAP_MS))
    }

    /// Whole seconds passed to arping's wait flag
    pub fn arping_wait_secs(&self) -> u64 {
        self.timeout.as_secs() + 1
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            delay: Duration::ZERO,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            allow_large_ranges: false,
            active_arp: false,
        }
    }
}

/// Mutable settings written by a collaborator before a scan starts.
///
/// Single writer, read-mostly: the last write before [`Self::snapshot`] is
/// authoritative for the full duration of that scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSettings {
    config: ScanConfig,
}

impl ScanSettings {
    /// Returns settings populated with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker limit clamped to `[1, MAX_CONCURRENCY]`. Returns true
    /// if the request exceeded the maximum and was clamped.
    pub fn set_concurrency(&mut self, workers: i64) -> bool {
        if workers > MAX_CONCURRENCY as i64 {
            self.config.concurrency = MAX_CONCURRENCY;
            return true;
        }
        self.config.concurrency = workers.max(1) as usize;
        false
    }

    /// Sets the per-target delay. Negative values become zero.
    pub fn set_delay_ms(&mut self, delay_ms: i64) {
        self.config.delay = Duration::from_millis(delay_ms.max(0) as u64);
    }

    /// Sets the operation timeout. Values above [`MAX_TIMEOUT_MS`] are
    /// clamped and true is returned, negative values reset to the default.
    pub fn set_timeout_ms(&mut self, timeout_ms: i64) -> bool {
        if timeout_ms > MAX_TIMEOUT_MS as i64 {
            self.config.timeout = Duration::from_millis(MAX_TIMEOUT_MS);
            return true;
        }
        if timeout_ms < 0 {
            self.config.timeout = Duration::from_millis(DEFAULT_TIMEOUT_MS);
            return false;
        }
        self.config.timeout = Duration::from_millis(timeout_ms as u64);
        false
    }

    /// Allows ranges above the default ceiling (never above the hard one)
    pub fn set_allow_large_ranges(&mut self, allow: bool) {
        self.config.allow_large_ranges = allow;
    }

    /// Enables active ARP resolution
    pub fn set_active_arp(&mut self, active: bool) {
        self.config.active_arp = active;
    }

    /// Current worker limit
    pub fn concurrency(&self) -> usize {
        self.config.concurrency
    }

    /// Current per-target delay
    pub fn delay(&self) -> Duration {
        self.config.delay
    }

    /// Current operation timeout
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Freezes the current settings for a scan
    pub fn snapshot(&self) -> ScanConfig {
        self.config.clone()
    }
}

#[cfg(test)]
#[path = "./config_tests.rs"]
mod tests;
