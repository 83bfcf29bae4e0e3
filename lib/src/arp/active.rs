//! Active ARP resolution through arp-scan, arping, or ping-then-read

use log::*;
use regex::Regex;
use std::{
    net::Ipv4Addr,
    sync::{Arc, LazyLock, Mutex},
    thread,
    time::Duration,
};

use crate::{
    command::{CommandRunner, to_args},
    config::ScanConfig,
    pool::{for_each_bounded, polite_pause},
    probe::PingFlavor,
};

use super::{ArpTable, cache::read_arp_cache, mac::normalize_mac};

/// Number of addresses handed to a single arp-scan invocation
pub const BATCH_SIZE: usize = 64;

/// Name of the batch ARP tool
pub const ARP_SCAN: &str = "arp-scan";

/// Name of the per-host ARP tool
pub const ARPING: &str = "arping";

const CACHE_SETTLE: Duration = Duration::from_millis(100);

static ARP_SCAN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\s+([0-9a-fA-F:]{17})")
        .expect("arp-scan line pattern is valid")
});

static MAC_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9a-fA-F]{2}(?::[0-9a-fA-F]{2}){5})")
        .expect("mac address pattern is valid")
});

/// Parses arp-scan output lines of the form `IP<ws>MAC<ws>vendor`. Header,
/// footer, and blank lines are ignored.
pub fn parse_arp_scan_output(output: &str) -> ArpTable {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let captures = ARP_SCAN_LINE.captures(line)?;
            let ip = captures[1].parse::<Ipv4Addr>().ok()?;
            Some((ip, normalize_mac(&captures[2])))
        })
        .collect()
}

/// Returns the first MAC address found in arping output
pub fn parse_arping_output(output: &str) -> Option<String> {
    MAC_ADDRESS
        .captures(output)
        .map(|captures| normalize_mac(&captures[1]))
}

/// Prefixes a command with non-interactive sudo when required
pub fn elevate(sudo: bool, program: &str, args: Vec<String>) -> (String, Vec<String>) {
    if !sudo {
        return (program.to_string(), args);
    }

    let mut elevated = to_args(["-n", program]);
    elevated.extend(args);
    ("sudo".to_string(), elevated)
}

/// Arguments for a single arping request. macOS ships the Habets arping
/// (`-C` count), Linux ships iputils (`-c` count, `-w` deadline).
pub fn arping_args(ip: Ipv4Addr, wait_secs: u64, macos: bool) -> Vec<String> {
    let ip = ip.to_string();
    if macos {
        to_args(["-C", "1", ip.as_str()])
    } else {
        let wait = wait_secs.to_string();
        to_args(["-c", "1", "-w", wait.as_str(), ip.as_str()])
    }
}

fn passive_subset(
    runner: &dyn CommandRunner,
    batch: &[Ipv4Addr],
    timeout: Duration,
) -> ArpTable {
    let passive = read_arp_cache(runner, timeout);
    batch
        .iter()
        .filter_map(|ip| passive.get(ip).map(|mac| (*ip, mac.clone())))
        .collect()
}

/// Resolves targets with arp-scan in batches of [`BATCH_SIZE`], pausing
/// between batches. A failed batch contributes whatever the passive cache
/// knows about its addresses.
pub fn resolve_batch(
    runner: &dyn CommandRunner,
    targets: &[Ipv4Addr],
    sudo: bool,
    config: &ScanConfig,
) -> ArpTable {
    let mut table = ArpTable::new();
    let batches: Vec<&[Ipv4Addr]> = targets.chunks(BATCH_SIZE).collect();
    let last = batches.len().saturating_sub(1);

    for (idx, batch) in batches.into_iter().enumerate() {
        let args = batch.iter().map(ToString::to_string).collect();
        let (program, args) = elevate(sudo, ARP_SCAN, args);

        debug!("arp-scan batch {} ({} hosts)", idx + 1, batch.len());

        match runner.run(&program, &args, config.timeout) {
            Ok(output) if output.success => {
                table.extend(parse_arp_scan_output(&output.stdout));
            }
            Ok(_) => {
                warn!("arp-scan batch failed, falling back to passive ARP for this batch");
                table.extend(passive_subset(runner, batch, config.timeout));
            }
            Err(e) => {
                warn!(
                    "arp-scan batch failed ({}), falling back to passive ARP for this batch",
                    e
                );
                table.extend(passive_subset(runner, batch, config.timeout));
            }
        }

        if idx < last {
            polite_pause(config.delay);
        }
    }

    table
}

/// Resolves each target with its own arping request on the bounded worker
/// pool. Targets that fail simply have no entry.
pub fn resolve_single(
    runner: Arc<dyn CommandRunner>,
    targets: &[Ipv4Addr],
    sudo: bool,
    config: &ScanConfig,
) -> ArpTable {
    let table = Arc::new(Mutex::new(ArpTable::new()));
    let macos = cfg!(target_os = "macos");
    let wait_secs = config.arping_wait_secs();
    let delay = config.delay;
    let timeout = config.timeout;

    let results = Arc::clone(&table);

    for_each_bounded(targets, config.concurrency, move |ip| {
        polite_pause(delay);

        let (program, args) =
            elevate(sudo, ARPING, arping_args(ip, wait_secs, macos));

        let output = match runner.run(&program, &args, timeout) {
            Ok(output) if output.success => output,
            Ok(_) => return,
            Err(e) => {
                debug!("arping {} failed: {}", ip, e);
                return;
            }
        };

        if let Some(mac) = parse_arping_output(&output.stdout) {
            if let Ok(mut table) = results.lock() {
                table.insert(ip, mac);
            }
        }
    });

    match Arc::try_unwrap(table) {
        Ok(table) => table.into_inner().unwrap_or_default(),
        Err(shared) => shared.lock().map(|t| t.clone()).unwrap_or_default(),
    }
}

/// Clears the cache, pings every target through the worker pool so the OS
/// performs fresh ARP exchanges, then reads the repopulated cache
pub fn ping_then_read(
    runner: Arc<dyn CommandRunner>,
    targets: &[Ipv4Addr],
    config: &ScanConfig,
) -> ArpTable {
    // clearing needs elevation and may fail, which only means older entries
    // survive
    if let Err(e) = runner.run("arp", &to_args(["-d", "*"]), config.timeout) {
        debug!("failed to clear arp cache: {}", e);
    }

    let delay = config.delay;
    let timeout = config.timeout;
    let wait = config.ping_timeout();
    let pinger = Arc::clone(&runner);

    for_each_bounded(targets, config.concurrency, move |ip| {
        polite_pause(delay);
        let args = PingFlavor::Windows.args(ip, wait);
        if let Err(e) = pinger.run("ping", &args, timeout) {
            debug!("ping {} failed: {}", ip, e);
        }
    });

    thread::sleep(CACHE_SETTLE);

    read_arp_cache(runner.as_ref(), config.timeout)
}

#[cfg(test)]
#[path = "./active_tests.rs"]
mod tests;
