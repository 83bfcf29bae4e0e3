//! Custom Error and Result types for this library

use std::{any::Any, time::Duration};
use thiserror::Error;

/// Describes which safety ceiling a requested scan ran into
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SafetyLimit {
    /// CIDR prefix is broader than the minimum allowed prefix
    #[error(
        "networks up to /{min_prefix} are supported, you requested {cidr}; \
         narrow your range or allow large ranges if you understand the impact"
    )]
    PrefixTooBroad {
        /// The offending CIDR block
        cidr: String,
        /// The narrowest prefix allowed without an override
        min_prefix: u8,
    },

    /// Target count exceeds the default ceiling and no override is set
    #[error(
        "requested scan covers {requested} hosts, the default limit is \
         {limit} to avoid noisy scans; reduce your scope or allow large \
         ranges to override"
    )]
    SoftCeiling {
        /// Number of hosts requested
        requested: usize,
        /// The default ceiling
        limit: usize,
    },

    /// Target count exceeds the absolute ceiling
    #[error(
        "requested scan covers {requested} hosts, which exceeds the hard \
         safety limit of {limit}; reduce your scope"
    )]
    HardCeiling {
        /// Number of hosts requested
        requested: usize,
        /// The hard ceiling
        limit: usize,
    },
}

impl SafetyLimit {
    /// Returns true if allowing large ranges would lift this limit
    pub fn is_overridable(&self) -> bool {
        !matches!(self, Self::HardCeiling { .. })
    }
}

/// Custom Error type for this library
#[derive(Error, Debug)]
pub enum QuietScanError {
    /// Malformed IP, CIDR, or range text
    #[error("invalid {field}: {value} - {message}")]
    InvalidFormat {
        /// The kind of input being validated, i.e. "IP address"
        field: String,
        /// The offending input
        value: String,
        /// Human readable reason
        message: String,
    },

    /// Requested targets exceed a safety ceiling
    #[error("{_0}")]
    SafetyLimitExceeded(SafetyLimit),

    /// Nothing left to scan after filtering
    #[error(
        "no valid scan targets found after filtering ({invalid} invalid \
         entries)"
    )]
    NoValidTargets {
        /// Number of entries that failed validation
        invalid: usize,
    },

    /// Advisory: some entries were dropped but valid targets remain
    #[error("filtered out {count} invalid IP addresses: {sample}")]
    FilteredTargets {
        /// Number of dropped entries
        count: usize,
        /// Up to five of the dropped entries, comma separated
        sample: String,
    },

    /// A MAC, vendor, or hostname lookup could not produce an answer
    #[error("{what} unavailable: {reason}")]
    ResolutionUnavailable {
        /// What was being resolved
        what: String,
        /// Why it failed
        reason: String,
    },

    /// An external command did not finish before its deadline
    #[error("command {program} timed out after {:?}", timeout)]
    CommandTimeout {
        /// The program that was killed
        program: String,
        /// The deadline that expired
        timeout: Duration,
    },

    /// Errors loading, parsing, or fetching the OUI database
    #[error("oui database error: {_0}")]
    OuiDatabase(String),

    /// Generic thread error
    #[error("thread error: {_0}")]
    ThreadError(String),

    /// Wrapped I/O errors
    #[error("io error: {_0}")]
    Io(#[from] std::io::Error),

    /// Wrapped JSON errors
    #[error("json error: {_0}")]
    Json(#[from] serde_json::Error),

    /// Wrapped CSV errors
    #[error("csv error: {_0}")]
    Csv(#[from] csv::Error),

    /// Wrapped HTTP errors
    #[error("http error: {_0}")]
    Http(#[from] ureq::Error),
}

impl From<SafetyLimit> for QuietScanError {
    fn from(value: SafetyLimit) -> Self {
        Self::SafetyLimitExceeded(value)
    }
}

impl From<Box<dyn Any + Send>> for QuietScanError {
    fn from(value: Box<dyn Any + Send>) -> Self {
        if let Some(s) = value.downcast_ref::<&'static str>() {
            Self::ThreadError(format!("Thread panicked with: {}", s))
        } else if let Some(s) = value.downcast_ref::<String>() {
            Self::ThreadError(format!("Thread panicked with: {}", s))
        } else {
            Self::ThreadError("Thread panicked with an unknown type".into())
        }
    }
}

impl QuietScanError {
    /// Convenience constructor for [`QuietScanError::InvalidFormat`]
    pub fn invalid(
        field: &str,
        value: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidFormat {
            field: field.to_string(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`QuietScanError::ResolutionUnavailable`]
    pub fn unavailable(what: &str, reason: impl Into<String>) -> Self {
        Self::ResolutionUnavailable {
            what: what.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the safety limit if this is a safety error
    pub fn safety_limit(&self) -> Option<&SafetyLimit> {
        match self {
            Self::SafetyLimitExceeded(limit) => Some(limit),
            _ => None,
        }
    }
}

/// Custom Result type for this library. All Errors exposed by this library
/// will be returned as [`QuietScanError`]
pub type Result<T> = std::result::Result<T, QuietScanError>;
