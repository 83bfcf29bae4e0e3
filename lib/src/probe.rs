//! Single-shot ICMP reachability probe through the platform ping utility

#[cfg(test)]
use mockall::automock;

use log::*;
use std::{net::Ipv4Addr, sync::Arc, time::Duration};

use crate::{
    command::{CommandRunner, to_args},
    config::ScanConfig,
    targets::validation::validate_ip,
};

/// Trait describing a reachability probe for one target
#[cfg_attr(test, automock)]
pub trait HostProber: Send + Sync {
    /// Returns true if the target answered. Every failure, including
    /// malformed input, is reported as unreachable.
    fn probe(&self, target: &str) -> bool;
}

/// Argument dialect of the ping utility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingFlavor {
    /// `ping -n 1 -w <ms>`
    Windows,
    /// `ping -c 1 -W <ms>` (macOS and the BSDs)
    Bsd,
    /// `ping -c 1 -W <secs>` (iputils)
    Linux,
}

impl PingFlavor {
    /// Dialect of the ping utility on the current platform
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Bsd
        }
    }

    /// Arguments for exactly one echo request to `ip` waiting at most `wait`
    pub fn args(&self, ip: Ipv4Addr, wait: Duration) -> Vec<String> {
        let ip = ip.to_string();
        let ms = wait.as_millis().to_string();
        match self {
            Self::Windows => to_args(["-n", "1", "-w", ms.as_str(), ip.as_str()]),
            Self::Bsd => to_args(["-c", "1", "-W", ms.as_str(), ip.as_str()]),
            Self::Linux => {
                let secs = wait.as_millis().div_ceil(1000).max(1).to_string();
                to_args(["-c", "1", "-W", secs.as_str(), ip.as_str()])
            }
        }
    }
}

/// Returns true if ping output carries a TTL marker (`TTL=` on Windows,
/// `ttl=` elsewhere), the only reliable sign that a reply arrived
pub fn has_ttl_marker(output: &str) -> bool {
    output.contains("TTL=") || output.contains("ttl=")
}

/// [`HostProber`] that shells out to the ping utility
#[derive(Clone)]
pub struct PingProber {
    runner: Arc<dyn CommandRunner>,
    flavor: PingFlavor,
    wait: Duration,
    timeout: Duration,
}

impl PingProber {
    /// Returns a prober using the current platform's ping dialect
    pub fn new(runner: Arc<dyn CommandRunner>, config: &ScanConfig) -> Self {
        Self::with_flavor(runner, config, PingFlavor::current())
    }

    /// Returns a prober using a specific ping dialect
    pub fn with_flavor(
        runner: Arc<dyn CommandRunner>,
        config: &ScanConfig,
        flavor: PingFlavor,
    ) -> Self {
        Self {
            runner,
            flavor,
            wait: config.ping_timeout(),
            timeout: config.timeout,
        }
    }
}

impl HostProber for PingProber {
    fn probe(&self, target: &str) -> bool {
        // only a parsed address ever reaches the command line
        let ip = match validate_ip(target) {
            Ok(ip) => ip,
            Err(e) => {
                debug!("refusing to ping {:?}: {}", target, e);
                return false;
            }
        };

        let args = self.flavor.args(ip, self.wait);

        match self.runner.run("ping", &args, self.timeout) {
            Ok(output) => {
                let reachable = has_ttl_marker(&output.stdout);
                debug!("ping {} reachable={}", ip, reachable);
                reachable
            }
            Err(e) => {
                debug!("ping {} failed: {}", ip, e);
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "./probe_tests.rs"]
mod tests;
