//! Syntactic validation of IPs, CIDR blocks, and raw target lists

use ipnet::{IpNet, Ipv4Net};
use itertools::Itertools;
use std::net::{IpAddr, Ipv4Addr};

use crate::error::{QuietScanError, Result};

/// Validates a single IPv4 address
///
/// # Errors
///
/// Returns [`QuietScanError::InvalidFormat`] if the input is empty, is not an
/// IP address, or is an IPv6 address
///
/// # Examples
///
/// ```
/// # use quietscan_lib::targets::validation::validate_ip;
/// assert!(validate_ip("192.168.1.1").is_ok());
/// assert!(validate_ip("::1").is_err());
/// assert!(validate_ip("192.168.1.1; rm -rf /").is_err());
/// ```
pub fn validate_ip(input: &str) -> Result<Ipv4Addr> {
    let input = input.trim();

    if input.is_empty() {
        return Err(QuietScanError::invalid(
            "IP address",
            input,
            "IP address cannot be empty",
        ));
    }

    match input.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(_)) => Err(QuietScanError::invalid(
            "IP address",
            input,
            "only IPv4 addresses are supported",
        )),
        Err(_) => Err(QuietScanError::invalid(
            "IP address",
            input,
            "not a valid IP address format",
        )),
    }
}

/// Validates CIDR notation and returns the parsed block. Host bits may be
/// set, i.e. `192.168.1.23/24` is accepted; use [`Ipv4Net::trunc`] for the
/// network itself. The prefix length is available via
/// [`Ipv4Net::prefix_len`].
///
/// # Errors
///
/// Returns [`QuietScanError::InvalidFormat`] if the input is empty, has no
/// `/`, cannot be parsed, or is not IPv4
pub fn validate_cidr(input: &str) -> Result<Ipv4Net> {
    let input = input.trim();

    if input.is_empty() {
        return Err(QuietScanError::invalid(
            "CIDR",
            input,
            "CIDR cannot be empty",
        ));
    }

    if !input.contains('/') {
        return Err(QuietScanError::invalid(
            "CIDR",
            input,
            "CIDR must contain '/' (e.g., 192.168.1.0/24)",
        ));
    }

    match input.parse::<IpNet>() {
        Ok(IpNet::V4(net)) => Ok(net),
        Ok(IpNet::V6(_)) => Err(QuietScanError::invalid(
            "CIDR",
            input,
            "only IPv4 addresses are supported",
        )),
        Err(e) => Err(QuietScanError::invalid(
            "CIDR",
            input,
            format!("invalid CIDR format: {}", e),
        )),
    }
}

/// Result of filtering an externally supplied target list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredTargets {
    /// Valid, de-duplicated targets in input order
    pub valid: Vec<Ipv4Addr>,
    /// Entries that failed validation, trimmed
    pub invalid: Vec<String>,
}

impl FilteredTargets {
    /// Returns a non-fatal advisory describing dropped entries, if any
    pub fn advisory(&self) -> Option<QuietScanError> {
        if self.invalid.is_empty() {
            return None;
        }

        Some(QuietScanError::FilteredTargets {
            count: self.invalid.len(),
            sample: self.invalid.iter().take(5).join(", "),
        })
    }
}

/// Filters a raw list of IPs, e.g. lines read from a targets file.
///
/// Blank lines and lines starting with `#` are skipped. Invalid entries are
/// segregated rather than failing the whole list and duplicates are dropped.
///
/// # Errors
///
/// Returns [`QuietScanError::NoValidTargets`] only if no valid entry remains
pub fn validate_ip_list<S: AsRef<str>>(list: &[S]) -> Result<FilteredTargets> {
    let mut filtered = FilteredTargets::default();

    for entry in list.iter().map(|s| s.as_ref().trim()) {
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }

        match validate_ip(entry) {
            Ok(ip) => filtered.valid.push(ip),
            Err(e) => {
                log::debug!("dropping invalid target: {}", e);
                filtered.invalid.push(entry.to_string());
            }
        }
    }

    if filtered.valid.is_empty() {
        return Err(QuietScanError::NoValidTargets {
            invalid: filtered.invalid.len(),
        });
    }

    filtered.valid = filtered.valid.into_iter().unique().collect();

    Ok(filtered)
}

#[cfg(test)]
#[path = "./validation_tests.rs"]
mod tests;
