//! Library package for polite host discovery on a local IPv4 network
//!
//! Hosts are found by pinging every target on a bounded worker pool with a
//! politeness delay and random jitter between probes. Reachable hosts are
//! enriched with a MAC address from an ARP table read once per pass, a
//! vendor name from the OUI registry, and a reverse DNS or NetBIOS name.
//!
//! All probing shells out to platform utilities (`ping`, `arp`, `arp-scan`,
//! `arping`, `nbtstat`), each bounded by a timeout. Target lists are counted
//! and checked against safety ceilings before they are ever enumerated.
//!
//! # Examples
//!
//! <https://github.com/quietscan/quietscan/blob/main/lib/examples/polite-scanner.rs>
//!
//! ```bash
//! cargo run --example polite-scanner -p quietscan-lib
//! ```

#![deny(missing_docs)]
pub mod arp;
pub mod command;
pub mod config;
pub mod error;
pub mod hostname;
pub mod network;
pub mod pool;
pub mod probe;
pub mod scanner;
pub mod targets;
pub mod vendor;
