//! Counting, safety checks, and expansion of subnet input into IP targets

use ipnet::Ipv4AddrRange;
use std::{net::Ipv4Addr, ops::Deref};

use crate::{
    config::ScanConfig,
    error::{QuietScanError, Result, SafetyLimit},
};

use super::{
    MAX_TOTAL_IPS_DEFAULT, MAX_TOTAL_IPS_HARD, MIN_CIDR_PREFIX,
    validation::{validate_cidr, validate_ip},
};

/// An ordered list of unique IPv4 targets that has passed safety validation.
///
/// Only [`TargetValidator::parse_subnet_input`] builds these so a
/// `TargetSet` always holds between 1 and [`MAX_TOTAL_IPS_HARD`] addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSet(Vec<Ipv4Addr>);

impl TargetSet {
    /// Consumes the set and returns the underlying list
    pub fn into_vec(self) -> Vec<Ipv4Addr> {
        self.0
    }
}

impl Deref for TargetSet {
    type Target = [Ipv4Addr];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Counts the hosts described by a CIDR block, a range, or a single IP
/// without building the list.
///
/// Ranges are either `start-end` with full addresses or `start-N` where `N`
/// replaces the last octet of `start`.
///
/// # Errors
///
/// Returns [`QuietScanError::InvalidFormat`] for malformed input, including
/// ranges whose end comes before their start
///
/// # Examples
///
/// ```
/// # use quietscan_lib::targets::ips::count_targets;
/// assert_eq!(count_targets("192.168.1.0/24").unwrap(), 256);
/// assert_eq!(count_targets("192.168.1.10-20").unwrap(), 11);
/// assert_eq!(count_targets("192.168.1.10").unwrap(), 1);
/// ```
pub fn count_targets(input: &str) -> Result<usize> {
    let input = input.trim();

    if input.is_empty() {
        return Err(QuietScanError::invalid(
            "input",
            input,
            "input cannot be empty",
        ));
    }

    if input.contains('/') {
        return count_cidr_targets(input);
    }

    if input.contains('-') {
        let (start, end) = parse_range_bounds(input)?;
        return Ok((u32::from(end) - u32::from(start)) as usize + 1);
    }

    validate_ip(input)?;

    Ok(1)
}

fn count_cidr_targets(cidr: &str) -> Result<usize> {
    let net = validate_cidr(cidr)?;
    let host_bits = 32 - u32::from(net.prefix_len());
    Ok(usize::try_from(1u64 << host_bits).unwrap_or(usize::MAX))
}

fn parse_range_bounds(input: &str) -> Result<(Ipv4Addr, Ipv4Addr)> {
    let parts: Vec<&str> = input.split('-').map(str::trim).collect();

    if parts.len() != 2 {
        return Err(QuietScanError::invalid(
            "IP range",
            input,
            "invalid range format: expected 'start-end' (e.g., \
             192.168.1.1-254)",
        ));
    }

    let start = validate_ip(parts[0]).map_err(|e| {
        QuietScanError::invalid(
            "IP range start",
            parts[0],
            format!("invalid start IP: {}", e),
        )
    })?;

    let end = if parts[1].contains('.') {
        validate_ip(parts[1]).map_err(|e| {
            QuietScanError::invalid(
                "IP range end",
                parts[1],
                format!("invalid end IP: {}", e),
            )
        })?
    } else {
        let octet = parts[1].parse::<u8>().map_err(|e| {
            QuietScanError::invalid(
                "IP range end",
                parts[1],
                format!("invalid end octet (must be 0-255): {}", e),
            )
        })?;
        let [a, b, c, _] = start.octets();
        Ipv4Addr::new(a, b, c, octet)
    };

    if end < start {
        return Err(QuietScanError::invalid(
            "IP range",
            input,
            format!(
                "start IP ({}) must be less than or equal to end IP ({})",
                start, end
            ),
        ));
    }

    Ok((start, end))
}

/// Applies the safety ceilings to target lists.
///
/// - more than [`MAX_TOTAL_IPS_HARD`] hosts is always rejected
/// - more than [`MAX_TOTAL_IPS_DEFAULT`] hosts requires `allow_large_ranges`
/// - CIDR prefixes shorter than [`MIN_CIDR_PREFIX`] require
///   `allow_large_ranges` and are then subject to the host count checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetValidator {
    allow_large_ranges: bool,
}

impl TargetValidator {
    /// Returns a new validator
    pub fn new(allow_large_ranges: bool) -> Self {
        Self { allow_large_ranges }
    }

    /// Validates that a CIDR block's prefix meets safety requirements
    ///
    /// # Errors
    ///
    /// Returns [`QuietScanError::InvalidFormat`] for malformed CIDR and
    /// [`QuietScanError::SafetyLimitExceeded`] for prefixes that are too
    /// broad
    pub fn validate_cidr_prefix(&self, cidr: &str) -> Result<()> {
        let net = validate_cidr(cidr)?;

        if net.prefix_len() >= MIN_CIDR_PREFIX {
            return Ok(());
        }

        if !self.allow_large_ranges {
            return Err(SafetyLimit::PrefixTooBroad {
                cidr: cidr.trim().to_string(),
                min_prefix: MIN_CIDR_PREFIX,
            }
            .into());
        }

        self.validate_count(count_cidr_targets(cidr)?)
    }

    /// Validates a materialized list of targets against the ceilings
    pub fn validate_targets<T>(&self, targets: &[T]) -> Result<()> {
        self.validate_count(targets.len())
    }

    /// Validates a host count against the ceilings
    ///
    /// # Errors
    ///
    /// Returns [`QuietScanError::SafetyLimitExceeded`] if the count is above
    /// the hard ceiling, or above the default ceiling without an override
    pub fn validate_count(&self, count: usize) -> Result<()> {
        if count > MAX_TOTAL_IPS_HARD {
            return Err(SafetyLimit::HardCeiling {
                requested: count,
                limit: MAX_TOTAL_IPS_HARD,
            }
            .into());
        }

        if count > MAX_TOTAL_IPS_DEFAULT {
            if !self.allow_large_ranges {
                return Err(SafetyLimit::SoftCeiling {
                    requested: count,
                    limit: MAX_TOTAL_IPS_DEFAULT,
                }
                .into());
            }

            log::warn!(
                "large scan requested ({} hosts, more than {}); this may \
                 generate noticeable network traffic and trigger monitoring \
                 systems",
                count,
                MAX_TOTAL_IPS_DEFAULT
            );
        }

        Ok(())
    }

    /// Parses subnet input and returns the concrete list of targets.
    ///
    /// Accepts CIDR (`192.168.1.0/24`), full ranges
    /// (`192.168.1.1-192.168.1.254`), last octet ranges (`192.168.1.1-254`),
    /// and single IPs. Sizes are checked before any list is built.
    ///
    /// # Examples
    ///
    /// ```
    /// # use quietscan_lib::targets::ips::TargetValidator;
    /// let validator = TargetValidator::new(false);
    /// let targets = validator.parse_subnet_input("10.0.0.1-3").unwrap();
    /// assert_eq!(targets.len(), 3);
    /// assert!(validator.parse_subnet_input("10.0.0.0/16").is_err());
    /// ```
    pub fn parse_subnet_input(&self, input: &str) -> Result<TargetSet> {
        let input = input.trim();

        if input.is_empty() {
            return Err(QuietScanError::invalid(
                "subnet input",
                input,
                "input cannot be empty. Expected CIDR (e.g., 192.168.1.0/24) \
                 or range (e.g., 192.168.1.1-254)",
            ));
        }

        if input.contains('/') {
            let net = validate_cidr(input)?;
            self.validate_cidr_prefix(input)?;
            let net = net.trunc();
            let ips = Ipv4AddrRange::new(net.network(), net.broadcast());
            return Ok(TargetSet(ips.collect()));
        }

        self.validate_count(count_targets(input)?)?;

        if input.contains('-') {
            let (start, end) = parse_range_bounds(input)?;
            return Ok(TargetSet(Ipv4AddrRange::new(start, end).collect()));
        }

        Ok(TargetSet(vec![validate_ip(input)?]))
    }
}

impl From<&ScanConfig> for TargetValidator {
    fn from(config: &ScanConfig) -> Self {
        Self::new(config.allow_large_ranges)
    }
}

#[cfg(test)]
#[path = "./ips_tests.rs"]
mod tests;
