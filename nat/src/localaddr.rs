// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Addresses assigned to the local interfaces

use std::collections::HashSet;
use std::net::IpAddr;

use ipnet::IpNet;
use nix::ifaddrs::getifaddrs;
use nix::sys::socket::SockaddrStorage;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LocalAddrError {
    #[error("failed to enumerate network interfaces: {0}")]
    Enumerate(#[source] nix::Error),
}

/// The set of addresses bound to the host's interfaces, taken once at startup.
///
/// Prefix lengths are kept for display, but [`LocalAddrs::contains`] only checks for an exact
/// address match.
#[derive(Debug, Clone, Default)]
pub struct LocalAddrs {
    nets: Vec<IpNet>,
    addrs: HashSet<IpAddr>,
}

fn ip_of(sockaddr: &SockaddrStorage) -> Option<IpAddr> {
    if let Some(sin) = sockaddr.as_sockaddr_in() {
        Some(IpAddr::V4(sin.ip()))
    } else {
        sockaddr.as_sockaddr_in6().map(|sin6| IpAddr::V6(sin6.ip()))
    }
}

fn prefix_len(netmask: &SockaddrStorage) -> Option<u8> {
    let ones = match ip_of(netmask)? {
        IpAddr::V4(mask) => mask.to_bits().count_ones(),
        IpAddr::V6(mask) => mask.to_bits().count_ones(),
    };
    u8::try_from(ones).ok()
}

impl LocalAddrs {
    /// Enumerate the addresses currently assigned to the host's interfaces.
    ///
    /// # Errors
    ///
    /// Returns [`LocalAddrError`] if the interfaces cannot be listed.
    pub fn build() -> Result<Self, LocalAddrError> {
        let mut local = Self::default();
        for ifaddr in getifaddrs().map_err(LocalAddrError::Enumerate)? {
            let Some(addr) = ifaddr.address.as_ref().and_then(ip_of) else {
                continue;
            };
            let net = ifaddr
                .netmask
                .as_ref()
                .and_then(prefix_len)
                .and_then(|len| IpNet::new(addr, len).ok())
                .unwrap_or_else(|| IpNet::from(addr));
            debug!("Local address {net} on {}", ifaddr.interface_name);
            local.insert(net);
        }
        Ok(local)
    }

    /// Build the set from explicit addresses, each taken as a host prefix.
    #[must_use]
    pub fn from_addrs(addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        Self::from_nets(addrs.into_iter().map(IpNet::from))
    }

    /// Build the set from explicit address/prefix pairs.
    #[must_use]
    pub fn from_nets(nets: impl IntoIterator<Item = IpNet>) -> Self {
        let mut local = Self::default();
        for net in nets {
            local.insert(net);
        }
        local
    }

    fn insert(&mut self, net: IpNet) {
        if self.addrs.insert(net.addr()) {
            self.nets.push(net);
        }
    }

    #[must_use]
    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.addrs.contains(addr)
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &IpNet> {
        self.nets.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(addr: &str) -> IpAddr {
        addr.parse().expect("Bad address")
    }

    #[test]
    fn test_exact_membership() {
        let local = LocalAddrs::from_nets([
            "192.168.1.1/24".parse::<IpNet>().unwrap(),
            "2001:db8::1/64".parse::<IpNet>().unwrap(),
        ]);
        assert_eq!(local.len(), 2);
        assert!(local.contains(&ip("192.168.1.1")));
        assert!(local.contains(&ip("2001:db8::1")));
        // same subnet is not enough
        assert!(!local.contains(&ip("192.168.1.2")));
        assert!(!local.contains(&ip("2001:db8::2")));
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let local = LocalAddrs::from_addrs([ip("10.0.0.1"), ip("10.0.0.1"), ip("10.0.0.2")]);
        assert_eq!(local.len(), 2);
        assert_eq!(
            local.iter().map(|net| net.prefix_len()).collect::<Vec<_>>(),
            vec![32, 32]
        );
    }

    #[test]
    fn test_build() {
        let local = LocalAddrs::build().expect("Failed to enumerate interfaces");
        for net in local.iter() {
            assert!(local.contains(&net.addr()));
        }
    }
}
