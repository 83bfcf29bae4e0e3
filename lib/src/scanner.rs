//! The polite scan orchestrator
//!
//! A scan moves through validate, prefetch ARP, dispatch, aggregate, and
//! finalize. Workers never share state with each other: the prefetched
//! [`ArpTable`] is read-only for the pass, and the result list and progress
//! counter are owned by the orchestrator behind their own primitives.
//!
//! Results arrive in completion order. Call [`ScanResult::sort_by_ip`] when
//! a stable order is needed.

use chrono::{DateTime, Local};
use derive_builder::Builder;
use itertools::Itertools;
use log::*;
use serde::{Deserialize, Serialize};
use std::{
    net::Ipv4Addr,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    arp::{ArpResolver, ArpSource, ArpTable},
    command::SystemCommandRunner,
    config::{HIGH_INTENSITY_CONCURRENCY, ScanConfig},
    error::Result,
    hostname::{HostnameResolver, NameResolver},
    network,
    pool::{for_each_bounded, polite_pause, worker_count},
    probe::{HostProber, PingProber},
    targets::{
        MAX_TOTAL_IPS_DEFAULT, ips::TargetValidator,
        validation::validate_ip_list,
    },
    vendor::{VendorLookup, VendorResolver},
};

/// Called with `(completed, total)` at least once per finished target and
/// once more with `completed == total` at the end. May be invoked from
/// several worker threads at once.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// A host that answered its probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// IPv4 address of the host
    pub ip: Ipv4Addr,
    /// Normalized MAC, empty if unknown
    pub mac: String,
    /// Vendor name derived from the MAC
    pub vendor: String,
    /// Hostname, empty if unknown
    pub hostname: String,
}

/// Outcome of one scan pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// When the scan finished
    pub timestamp: DateTime<Local>,
    /// Adapter name the scan was attributed to
    pub adapter: String,
    /// Subnet text the scan was attributed to
    pub subnet: String,
    /// Reachable hosts in completion order
    pub devices: Vec<DeviceEntry>,
}

impl ScanResult {
    /// Returns a result with no devices, stamped now
    pub fn empty(adapter: &str, subnet: &str) -> Self {
        Self {
            timestamp: Local::now(),
            adapter: adapter.to_string(),
            subnet: subnet.to_string(),
            devices: Vec::new(),
        }
    }

    /// Sorts devices by address
    pub fn sort_by_ip(&mut self) {
        self.devices.sort_by_key(|d| d.ip);
    }
}

/// Reasons a scan counts as high-intensity. Empty when the scan is polite.
pub fn high_intensity_reasons(total: usize, config: &ScanConfig) -> Vec<String> {
    let mut reasons = Vec::new();

    if total > MAX_TOTAL_IPS_DEFAULT {
        reasons.push(format!("large host count ({})", total));
    }

    if config.concurrency > HIGH_INTENSITY_CONCURRENCY {
        reasons.push(format!(
            "high concurrency ({} workers)",
            config.concurrency
        ));
    }

    if config.delay.is_zero() && total > MAX_TOTAL_IPS_DEFAULT {
        reasons.push("no delay configured".to_string());
    }

    reasons
}

/// Concurrent ping sweep with ARP, vendor, and hostname enrichment
#[derive(Clone, Builder)]
#[builder(setter(into))]
pub struct PoliteScanner {
    /// Parameters frozen for the lifetime of this scanner
    #[builder(default)]
    config: ScanConfig,
    /// Reachability probe
    prober: Arc<dyn HostProber>,
    /// Source of the per-pass ARP table
    arp: Arc<dyn ArpSource>,
    /// Hostname lookup for reachable hosts
    names: Arc<dyn NameResolver>,
    /// Vendor lookup for reachable hosts
    vendors: Arc<dyn VendorLookup>,
}

impl PoliteScanner {
    /// Returns builder for PoliteScanner
    pub fn builder() -> PoliteScannerBuilder {
        PoliteScannerBuilder::default()
    }

    /// Returns a scanner wired to the platform utilities, system DNS, and
    /// the on-disk vendor database. ARP capability is probed here, once.
    pub fn system(config: ScanConfig) -> Self {
        let runner = Arc::new(SystemCommandRunner::new());

        Self {
            prober: Arc::new(PingProber::new(runner.clone(), &config)),
            arp: Arc::new(ArpResolver::detect(runner.clone(), config.clone())),
            names: Arc::new(HostnameResolver::new(runner, &config)),
            vendors: Arc::new(VendorResolver::system()),
            config,
        }
    }

    /// The configuration this scanner runs with
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Filters a raw target list and applies the safety ceilings.
    /// Dropped entries are reported as a warning.
    pub fn prepare_targets<S: AsRef<str>>(&self, raw: &[S]) -> Result<Vec<Ipv4Addr>> {
        let filtered = validate_ip_list(raw)?;

        if let Some(advisory) = filtered.advisory() {
            warn!("{}", advisory);
        }

        TargetValidator::from(&self.config).validate_targets(&filtered.valid)?;

        Ok(filtered.valid)
    }

    /// Scans an externally supplied list of addresses. Validation failures
    /// are logged and produce an empty result.
    pub fn scan_targets<S: AsRef<str>>(
        &self,
        raw: &[S],
        adapter: &str,
        subnet: &str,
        progress: Option<ProgressCallback>,
    ) -> ScanResult {
        match self.prepare_targets(raw) {
            Ok(targets) => self.sweep(&targets, adapter, subnet, progress),
            Err(e) => {
                error!("{}", e);
                ScanResult::empty(adapter, subnet)
            }
        }
    }

    /// Scans the subnet of the named adapter, or of the first usable adapter
    /// when none is named. Any detection or validation failure produces an
    /// empty result.
    pub fn scan_adapter(
        &self,
        adapter: Option<&str>,
        progress: Option<ProgressCallback>,
    ) -> ScanResult {
        let detected = match adapter {
            Some(name) => network::get_adapter(name),
            None => network::get_active_adapter(),
        };

        let Some(detected) = detected else {
            error!("no usable network adapter found");
            return ScanResult::empty(adapter.unwrap_or_default(), "");
        };

        let cidr = detected.cidr();

        match TargetValidator::from(&self.config).parse_subnet_input(&cidr) {
            Ok(targets) => self.sweep(&targets, &detected.name, &cidr, progress),
            Err(e) => {
                error!("{}", e);
                ScanResult::empty(&detected.name, &cidr)
            }
        }
    }

    /// Probes every target on the bounded worker pool and enriches each
    /// reachable host. Duplicates are dropped and the safety ceilings are
    /// applied first; a list over the ceilings produces an empty result.
    /// Never fails: individual target failures only show up as missing data.
    pub fn scan(
        &self,
        targets: &[Ipv4Addr],
        adapter: &str,
        subnet: &str,
        progress: Option<ProgressCallback>,
    ) -> ScanResult {
        let targets: Vec<Ipv4Addr> = targets.iter().copied().unique().collect();

        let validator = TargetValidator::from(&self.config);

        if let Err(e) = validator.validate_targets(&targets) {
            error!("{}", e);
            return ScanResult::empty(adapter, subnet);
        }

        self.sweep(&targets, adapter, subnet, progress)
    }

    /// Runs one pass over targets that have already been validated
    fn sweep(
        &self,
        targets: &[Ipv4Addr],
        adapter: &str,
        subnet: &str,
        progress: Option<ProgressCallback>,
    ) -> ScanResult {
        if targets.is_empty() {
            error!("no valid scan targets found");
            return ScanResult::empty(adapter, subnet);
        }

        let total = targets.len();

        let reasons = high_intensity_reasons(total, &self.config);
        if !reasons.is_empty() {
            warn!(
                "high-intensity scan settings ({}) may generate noticeable \
                 network traffic and trigger monitoring systems",
                reasons.join(", ")
            );
        }

        info!("reading ARP table for {} targets", total);
        let arp: Arc<ArpTable> = Arc::new(self.arp.arp_table(targets));

        info!(
            "probing {} targets with {} workers",
            total,
            worker_count(self.config.concurrency, total)
        );

        let devices = Arc::new(Mutex::new(Vec::new()));
        let completed = Arc::new(AtomicUsize::new(0));

        let worker = {
            let delay = self.config.delay;
            let prober = Arc::clone(&self.prober);
            let names = Arc::clone(&self.names);
            let vendors = Arc::clone(&self.vendors);
            let devices = Arc::clone(&devices);
            let completed = Arc::clone(&completed);
            let progress = progress.clone();

            move |ip: Ipv4Addr| {
                polite_pause(delay);

                if prober.probe(&ip.to_string()) {
                    let mac = arp.get(&ip).cloned().unwrap_or_default();
                    let vendor = vendors.lookup_vendor(&mac);
                    let hostname = names.resolve_hostname(ip);

                    debug!("found {} mac={:?} hostname={:?}", ip, mac, hostname);

                    devices
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(DeviceEntry {
                            ip,
                            mac,
                            vendor,
                            hostname,
                        });
                }

                let current = completed.fetch_add(1, Ordering::SeqCst) + 1;

                if let Some(cb) = progress.as_ref() {
                    cb(current, total);
                }
            }
        };

        for_each_bounded(targets, self.config.concurrency, worker);

        if let Some(cb) = progress.as_ref() {
            cb(total, total);
        }

        let devices = std::mem::take(
            &mut *devices.lock().unwrap_or_else(PoisonError::into_inner),
        );

        info!("scan complete: {} of {} hosts reachable", devices.len(), total);

        ScanResult {
            timestamp: Local::now(),
            adapter: adapter.to_string(),
            subnet: subnet.to_string(),
            devices,
        }
    }
}

#[cfg(test)]
#[path = "./scanner_tests.rs"]
mod tests;
