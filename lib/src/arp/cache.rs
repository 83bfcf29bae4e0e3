//! Passive reads of the operating system's neighbor cache

use log::*;
use std::{net::Ipv4Addr, time::Duration};

use crate::command::{CommandRunner, to_args};

use super::{ArpTable, mac::normalize_mac};

const ZERO_MAC: &str = "00:00:00:00:00:00";

/// Layout of `arp -a` output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheFormat {
    /// BSD style used by macOS and Linux:
    /// `? (192.168.1.1) at aa:bb:cc:dd:ee:ff on en0 ifscope [ethernet]`
    Unix,
    /// Columnar Windows style:
    /// `192.168.1.1           00-11-22-33-44-55     dynamic`
    Windows,
}

impl CacheFormat {
    /// Format printed by the arp utility on the current platform
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    fn args(&self) -> Vec<String> {
        match self {
            // -n keeps arp from doing a reverse lookup on every entry
            Self::Unix => to_args(["-an"]),
            Self::Windows => to_args(["-a"]),
        }
    }
}

fn usable(mac: &str) -> bool {
    !mac.is_empty() && !mac.to_lowercase().contains("incomplete") && mac != ZERO_MAC
}

fn parse_unix_line(line: &str) -> Option<(Ipv4Addr, String)> {
    let open = line.find('(')?;
    let close = line.find(')')?;

    if close <= open {
        return None;
    }

    let ip = line[open + 1..close].parse::<Ipv4Addr>().ok()?;
    let at = line.find(" at ")?;
    let mac = line[at + 4..].split_whitespace().next()?;

    Some((ip, normalize_mac(mac)))
}

fn parse_windows_line(line: &str) -> Option<(Ipv4Addr, String)> {
    let mut fields = line.split_whitespace();
    let ip = fields.next()?.trim_matches(|c| c == '(' || c == ')');
    let ip = ip.parse::<Ipv4Addr>().ok()?;
    let mac = fields.next()?;
    Some((ip, normalize_mac(mac)))
}

/// Parses `arp -a` output into a table, skipping headers and incomplete
/// entries
pub fn parse_arp_cache(output: &str, format: CacheFormat) -> ArpTable {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match format {
            CacheFormat::Unix => parse_unix_line(line),
            CacheFormat::Windows => parse_windows_line(line),
        })
        .filter(|(_, mac)| usable(mac))
        .collect()
}

/// Parses the Linux kernel's `/proc/net/arp` table. Rows flagged `0x0` have
/// not completed resolution and are skipped.
pub fn parse_proc_net_arp(contents: &str) -> ArpTable {
    contents
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 || fields[2] == "0x0" {
                return None;
            }
            let ip = fields[0].parse::<Ipv4Addr>().ok()?;
            Some((ip, normalize_mac(fields[3])))
        })
        .filter(|(_, mac)| usable(mac))
        .collect()
}

#[cfg(target_os = "linux")]
fn read_proc_net_arp() -> ArpTable {
    match std::fs::read_to_string("/proc/net/arp") {
        Ok(contents) => parse_proc_net_arp(&contents),
        Err(e) => {
            debug!("failed to read /proc/net/arp: {}", e);
            ArpTable::new()
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn read_proc_net_arp() -> ArpTable {
    ArpTable::new()
}

/// Reads the neighbor cache once without generating traffic. Never fails:
/// any problem running the utility yields whatever the kernel table offers,
/// or an empty table.
pub fn read_arp_cache(runner: &dyn CommandRunner, timeout: Duration) -> ArpTable {
    let format = CacheFormat::current();

    match runner.run("arp", &format.args(), timeout) {
        Ok(output) => {
            let table = parse_arp_cache(&output.stdout, format);
            debug!("read {} entries from arp cache", table.len());
            table
        }
        Err(e) => {
            debug!("arp cache read failed: {}", e);
            read_proc_net_arp()
        }
    }
}

#[cfg(test)]
#[path = "./cache_tests.rs"]
mod tests;
