//! Reverse DNS and NetBIOS name lookup
//!
//! Hostnames are advisory. Every failure of every strategy ends as an empty
//! string, never an error surfaced to the scan.

#[cfg(test)]
use mockall::automock;

use log::*;
use std::{
    io,
    net::{IpAddr, Ipv4Addr},
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};

use crate::{
    command::{CommandRunner, to_args},
    config::ScanConfig,
    error::{QuietScanError, Result},
};

/// Trait describing a per-host name lookup
#[cfg_attr(test, automock)]
pub trait NameResolver: Send + Sync {
    /// Returns the host's name, or an empty string if none could be found
    fn resolve_hostname(&self, ip: Ipv4Addr) -> String;
}

/// Blocking reverse lookup function
pub type ReverseLookup = Arc<dyn Fn(Ipv4Addr) -> io::Result<String> + Send + Sync>;

fn system_reverse_lookup(ip: Ipv4Addr) -> io::Result<String> {
    dns_lookup::lookup_addr(&IpAddr::V4(ip))
}

/// Trims the trailing root dot from a DNS answer. Resolvers that have no
/// PTR record often echo the numeric address back, which is treated as no
/// answer.
pub fn clean_dns_name(name: &str, ip: Ipv4Addr) -> Option<String> {
    let name = name.trim().trim_matches('.');
    if name.is_empty() || name == ip.to_string() {
        return None;
    }
    Some(name.to_string())
}

/// Extracts the workstation name from `nbtstat -A` output: the first field
/// of the first line tagged `<00>`
pub fn parse_nbt_name(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("<00>"))
        .and_then(|line| line.split_whitespace().next())
        .map(str::to_string)
}

/// [`NameResolver`] trying reverse DNS, then NetBIOS where enabled
#[derive(Clone)]
pub struct HostnameResolver {
    runner: Arc<dyn CommandRunner>,
    lookup: ReverseLookup,
    timeout: Duration,
    netbios: bool,
}

impl HostnameResolver {
    /// Returns a resolver using system DNS, with the NetBIOS fallback
    /// enabled on Windows
    pub fn new(runner: Arc<dyn CommandRunner>, config: &ScanConfig) -> Self {
        Self {
            runner,
            lookup: Arc::new(system_reverse_lookup),
            timeout: config.timeout,
            netbios: cfg!(windows),
        }
    }

    /// Replaces the reverse lookup function
    pub fn with_reverse_lookup(mut self, lookup: ReverseLookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Enables or disables the NetBIOS fallback
    pub fn with_netbios(mut self, enabled: bool) -> Self {
        self.netbios = enabled;
        self
    }

    /// Reverse DNS bounded by the configured timeout. The lookup runs on a
    /// helper thread since the system resolver cannot be cancelled; on
    /// timeout the thread is abandoned.
    pub fn reverse_dns(&self, ip: Ipv4Addr) -> Result<String> {
        let (tx, rx) = mpsc::channel();
        let lookup = Arc::clone(&self.lookup);

        thread::spawn(move || {
            let _ = tx.send(lookup(ip));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(name)) => clean_dns_name(&name, ip).ok_or_else(|| {
                QuietScanError::unavailable("hostname", "no PTR record")
            }),
            Ok(Err(e)) => Err(QuietScanError::unavailable("hostname", e.to_string())),
            Err(_) => Err(QuietScanError::unavailable(
                "hostname",
                format!("reverse lookup timed out after {:?}", self.timeout),
            )),
        }
    }

    /// NetBIOS node status query through `nbtstat -A`
    pub fn netbios_name(&self, ip: Ipv4Addr) -> Result<String> {
        let output = self.runner.run(
            "nbtstat",
            &to_args(["-A".to_string(), ip.to_string()]),
            self.timeout,
        )?;

        if !output.success {
            return Err(QuietScanError::unavailable("netbios name", "nbtstat failed"));
        }

        parse_nbt_name(&output.stdout).ok_or_else(|| {
            QuietScanError::unavailable("netbios name", "no <00> record")
        })
    }
}

impl NameResolver for HostnameResolver {
    fn resolve_hostname(&self, ip: Ipv4Addr) -> String {
        match self.reverse_dns(ip) {
            Ok(name) => return name,
            Err(e) => debug!("{}: {}", ip, e),
        }

        if !self.netbios {
            return String::new();
        }

        self.netbios_name(ip).unwrap_or_else(|e| {
            debug!("{}: {}", ip, e);
            String::new()
        })
    }
}

#[cfg(test)]
#[path = "./hostname_tests.rs"]
mod tests;
