//! IP to MAC resolution
//!
//! The resolver picks one [`ArpStrategy`] per scan by probing which tools
//! and privileges are available, then builds an [`ArpTable`] once before the
//! orchestrator fans out. A missing tool or missing privilege never fails a
//! scan, it only degrades to reading the passive cache.

#[cfg(test)]
use mockall::automock;

use log::*;
use std::{
    collections::{HashMap, HashSet},
    net::Ipv4Addr,
    sync::Arc,
    time::Duration,
};

use crate::{
    command::{CommandRunner, to_args},
    config::ScanConfig,
};

pub mod active;
pub mod cache;
pub mod mac;

pub use mac::{normalize_mac, oui_prefix};

/// Mapping of IPv4 address to normalized MAC text
pub type ArpTable = HashMap<Ipv4Addr, String>;

/// Trait describing a source of IP to MAC mappings for a scan pass
#[cfg_attr(test, automock)]
pub trait ArpSource: Send + Sync {
    /// Builds the table used for the whole pass over `targets`
    fn arp_table(&self, targets: &[Ipv4Addr]) -> ArpTable;
}

/// How MAC addresses are obtained on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpStrategy {
    /// Read the existing neighbor cache without generating traffic
    PassiveCache,
    /// Batch requests through arp-scan
    ActiveBatchTool {
        /// Whether commands must be prefixed with sudo
        sudo: bool,
    },
    /// One arping request per host
    ActiveSingleTool {
        /// Whether commands must be prefixed with sudo
        sudo: bool,
    },
    /// Ping every host so the OS resolves it, then read the cache (Windows)
    PingThenReadCache,
}

impl ArpStrategy {
    /// Probes the current host for active ARP capability
    pub fn detect(runner: &dyn CommandRunner, timeout: Duration) -> Self {
        Self::detect_with(runner, timeout, cfg!(windows), is_elevated())
    }

    /// Probes for active ARP capability given platform facts. Tools are
    /// preferred in order arp-scan, arping. Without root or passwordless
    /// sudo the passive cache is used instead.
    pub fn detect_with(
        runner: &dyn CommandRunner,
        timeout: Duration,
        windows: bool,
        elevated: bool,
    ) -> Self {
        if windows {
            return Self::PingThenReadCache;
        }

        let batch = if runner.exists(active::ARP_SCAN) {
            true
        } else if runner.exists(active::ARPING) {
            false
        } else {
            info!(
                "active ARP tools (arp-scan, arping) not available, using \
                 passive ARP cache; MAC addresses may be incomplete"
            );
            return Self::PassiveCache;
        };

        let sudo = if elevated {
            false
        } else if has_passwordless_sudo(runner, timeout) {
            true
        } else {
            warn!(
                "active ARP scanning requires root or passwordless sudo, \
                 falling back to passive ARP cache; MAC addresses may be \
                 incomplete"
            );
            return Self::PassiveCache;
        };

        if batch {
            Self::ActiveBatchTool { sudo }
        } else {
            Self::ActiveSingleTool { sudo }
        }
    }

    /// Returns true if this strategy generates ARP traffic
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::PassiveCache)
    }
}

fn has_passwordless_sudo(runner: &dyn CommandRunner, timeout: Duration) -> bool {
    matches!(
        runner.run("sudo", &to_args(["-n", "true"]), timeout),
        Ok(output) if output.success
    )
}

#[cfg(unix)]
fn is_elevated() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_elevated() -> bool {
    false
}

/// [`ArpSource`] executing an [`ArpStrategy`] through a [`CommandRunner`]
#[derive(Clone)]
pub struct ArpResolver {
    runner: Arc<dyn CommandRunner>,
    strategy: ArpStrategy,
    config: ScanConfig,
}

impl ArpResolver {
    /// Returns a resolver using an explicit strategy
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        strategy: ArpStrategy,
        config: ScanConfig,
    ) -> Self {
        Self {
            runner,
            strategy,
            config,
        }
    }

    /// Returns a resolver whose strategy is detected once up front. Active
    /// tooling is only considered when the config enables it.
    pub fn detect(runner: Arc<dyn CommandRunner>, config: ScanConfig) -> Self {
        let strategy = if config.active_arp {
            ArpStrategy::detect(runner.as_ref(), config.timeout)
        } else {
            ArpStrategy::PassiveCache
        };

        debug!("arp strategy: {:?}", strategy);

        Self::new(runner, strategy, config)
    }

    /// The strategy in use
    pub fn strategy(&self) -> ArpStrategy {
        self.strategy
    }
}

impl ArpSource for ArpResolver {
    fn arp_table(&self, targets: &[Ipv4Addr]) -> ArpTable {
        if self.strategy.is_active() && targets.is_empty() {
            return ArpTable::new();
        }

        let table = match self.strategy {
            ArpStrategy::PassiveCache => {
                return cache::read_arp_cache(
                    self.runner.as_ref(),
                    self.config.timeout,
                );
            }
            ArpStrategy::ActiveBatchTool { sudo } => active::resolve_batch(
                self.runner.as_ref(),
                targets,
                sudo,
                &self.config,
            ),
            ArpStrategy::ActiveSingleTool { sudo } => active::resolve_single(
                Arc::clone(&self.runner),
                targets,
                sudo,
                &self.config,
            ),
            ArpStrategy::PingThenReadCache => active::ping_then_read(
                Arc::clone(&self.runner),
                targets,
                &self.config,
            ),
        };

        retain_targets(table, targets)
    }
}

fn retain_targets(mut table: ArpTable, targets: &[Ipv4Addr]) -> ArpTable {
    let wanted: HashSet<&Ipv4Addr> = targets.iter().collect();
    table.retain(|ip, _| wanted.contains(ip));
    table
}

#[cfg(test)]
#[path = "./arp_tests.rs"]
mod tests;
