//! Provides helpers for validating and expanding scan targets
//!
//! Every target list handed to the scanner passes through this module. Sizes
//! are always computed before a list is materialized so that inputs such as
//! `10.0.0.0/0` are rejected without allocating anything.

pub mod ips;
pub mod validation;

/// Default safety limit on the number of hosts in one scan (a /24)
pub const MAX_TOTAL_IPS_DEFAULT: usize = 256;
/// Hard ceiling on the number of hosts in one scan, even with overrides
pub const MAX_TOTAL_IPS_HARD: usize = 1024;
/// Narrowest CIDR prefix allowed without an override
pub const MIN_CIDR_PREFIX: u8 = 24;
