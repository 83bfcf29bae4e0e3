//! Maps MAC addresses to hardware vendors
//!
//! Vendor names are advisory: an empty MAC, a malformed MAC, a database
//! miss, or a database that cannot be loaded all produce [`UNKNOWN_VENDOR`]
//! rather than an error.

#[cfg(test)]
use mockall::automock;

use log::*;
use std::{
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::{Duration, Instant},
};

use crate::{
    arp::mac::{is_canonical_mac, normalize_mac, oui_prefix},
    error::Result,
};

pub mod oui;

pub use oui::{LocalOuiSource, OuiDatabase, OuiDiff, OuiSource};

/// Sentinel returned whenever a vendor cannot be determined
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

// Reported by incomplete ARP entries rather than real hardware
const ZERO_PREFIX: &str = "00:00:00";

/// Minimum time between load attempts after a failed load
pub const LOAD_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Trait describing a MAC to vendor lookup
#[cfg_attr(test, automock)]
pub trait VendorLookup: Send + Sync {
    /// Returns the vendor for `mac`, or [`UNKNOWN_VENDOR`]
    fn lookup_vendor(&self, mac: &str) -> String;
}

/// [`VendorLookup`] backed by a lazily loaded [`OuiDatabase`]
pub struct VendorResolver {
    source: Arc<dyn OuiSource>,
    database: RwLock<Option<Arc<OuiDatabase>>>,
    // held for the duration of a load; remembers when the last one failed
    last_failure: Mutex<Option<Instant>>,
    retry_interval: Duration,
    registry_fallback: bool,
}

impl VendorResolver {
    /// Returns a resolver that loads from `source` on first use and falls
    /// back to the compiled-in registry for misses
    pub fn new(source: Arc<dyn OuiSource>) -> Self {
        Self {
            source,
            database: RwLock::new(None),
            last_failure: Mutex::new(None),
            retry_interval: LOAD_RETRY_INTERVAL,
            registry_fallback: true,
        }
    }

    /// Returns a resolver reading the default on-disk locations
    pub fn system() -> Self {
        Self::new(Arc::new(LocalOuiSource::new()))
    }

    /// Enables or disables the compiled-in registry fallback
    pub fn with_registry_fallback(mut self, enabled: bool) -> Self {
        self.registry_fallback = enabled;
        self
    }

    /// Sets how long to wait after a failed load before trying again
    pub fn with_load_retry(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    fn loaded(&self) -> Option<Arc<OuiDatabase>> {
        self.database
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }

    fn store(&self, db: Arc<OuiDatabase>) {
        *self.database.write().unwrap_or_else(PoisonError::into_inner) = Some(db);
    }

    /// Returns the loaded database, attempting a load if none is held yet.
    /// Only one caller loads at a time, and after a failure no new attempt
    /// is made until the retry interval has passed.
    pub fn database(&self) -> Option<Arc<OuiDatabase>> {
        if let Some(db) = self.loaded() {
            return Some(db);
        }

        let mut last_failure =
            self.last_failure.lock().unwrap_or_else(PoisonError::into_inner);

        // another caller may have finished loading while we waited
        if let Some(db) = self.loaded() {
            return Some(db);
        }

        if let Some(failed_at) = *last_failure {
            if failed_at.elapsed() < self.retry_interval {
                return None;
            }
        }

        match self.source.load() {
            Ok(db) => {
                let db = Arc::new(db);
                self.store(Arc::clone(&db));
                *last_failure = None;
                Some(db)
            }
            Err(e) => {
                debug!("vendor database unavailable: {}", e);
                *last_failure = Some(Instant::now());
                None
            }
        }
    }

    /// Replaces the held database with a fresh load from the source and
    /// returns its size. On failure the previous database is kept.
    pub fn reload(&self) -> Result<usize> {
        let mut last_failure =
            self.last_failure.lock().unwrap_or_else(PoisonError::into_inner);
        let db = Arc::new(self.source.load()?);
        let len = db.len();
        self.store(db);
        *last_failure = None;
        info!("vendor database reloaded with {} entries", len);
        Ok(len)
    }

    fn registry_lookup(&self, mac: &str) -> Option<String> {
        if !self.registry_fallback || !is_canonical_mac(mac) {
            return None;
        }

        oui_data::lookup(&mac.to_lowercase()).map(|v| v.organization().to_owned())
    }
}

impl VendorLookup for VendorResolver {
    fn lookup_vendor(&self, mac: &str) -> String {
        if mac.trim().is_empty() {
            return UNKNOWN_VENDOR.to_string();
        }

        let Some(prefix) = oui_prefix(mac) else {
            return UNKNOWN_VENDOR.to_string();
        };

        if prefix == ZERO_PREFIX {
            return UNKNOWN_VENDOR.to_string();
        }

        let known = self
            .database()
            .and_then(|db| db.get(&prefix).map(str::to_string));

        if let Some(vendor) = known {
            return vendor;
        }

        self.registry_lookup(&normalize_mac(mac))
            .filter(|vendor| !vendor.is_empty())
            .unwrap_or_else(|| UNKNOWN_VENDOR.to_string())
    }
}

#[cfg(test)]
#[path = "./vendor_tests.rs"]
mod tests;
