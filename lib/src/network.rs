//! Enumerates local network adapters and their IPv4 subnets
//!
//! A pure read of OS reported interface state. No retries and no network
//! I/O.

use ipnet::Ipv4Net;
use pnet::{datalink::NetworkInterface as PNetNetworkInterface, ipnetwork};
use std::net::Ipv4Addr;

/// An up, non-loopback interface that has an IPv4 address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapter {
    /// Interface name, i.e. "eth0" or "en0"
    pub name: String,
    /// The interface's own IPv4 address
    pub ipv4: Ipv4Addr,
    /// The interface's subnet with host bits cleared, i.e. 192.168.1.0/24
    pub subnet: Ipv4Net,
}

impl Adapter {
    /// Subnet in CIDR text form
    pub fn cidr(&self) -> String {
        self.subnet.to_string()
    }
}

impl TryFrom<&PNetNetworkInterface> for Adapter {
    type Error = ();

    fn try_from(value: &PNetNetworkInterface) -> Result<Self, Self::Error> {
        if !value.is_up() || value.is_loopback() {
            return Err(());
        }

        let (ipv4, prefix) = value
            .ips
            .iter()
            .find_map(|ip| match ip {
                ipnetwork::IpNetwork::V4(net) => Some((net.ip(), net.prefix())),
                _ => None,
            })
            .ok_or(())?;

        let subnet = Ipv4Net::new(ipv4, prefix).map_err(|_| ())?.trunc();

        Ok(Self {
            name: value.name.clone(),
            ipv4,
            subnet,
        })
    }
}

fn adapters_from(interfaces: &[PNetNetworkInterface]) -> Vec<Adapter> {
    interfaces
        .iter()
        .filter_map(|i| Adapter::try_from(i).ok())
        .collect()
}

fn system_adapters() -> Vec<Adapter> {
    adapters_from(&pnet::datalink::interfaces())
}

/// Returns the first adapter suitable for scanning
pub fn get_active_adapter() -> Option<Adapter> {
    system_adapters().into_iter().next()
}

/// Returns the names of all adapters suitable for scanning
pub fn get_all_adapters() -> Vec<String> {
    system_adapters().into_iter().map(|a| a.name).collect()
}

/// Returns the adapter with the given name if it is suitable for scanning
pub fn get_adapter(name: &str) -> Option<Adapter> {
    system_adapters().into_iter().find(|a| a.name == name)
}

/// Returns the subnet of the named adapter in CIDR text form
pub fn get_adapter_subnet(name: &str) -> Option<String> {
    get_adapter(name).map(|a| a.cidr())
}

/// Returns the subnet for the named adapter, or for the active adapter when
/// no name is given
pub fn get_local_cidr(adapter: Option<&str>) -> Option<String> {
    match adapter {
        Some(name) => get_adapter_subnet(name),
        None => get_active_adapter().map(|a| a.cidr()),
    }
}

#[cfg(test)]
#[path = "./network_tests.rs"]
mod tests;
