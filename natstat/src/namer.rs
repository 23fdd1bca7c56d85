// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Display names of endpoints

use std::net::IpAddr;

use netdb::{Resolver, ServiceDb};
use tracing::trace;

/// Turns addresses and ports into the strings shown in the report. Lookups never fail: when
/// no name can be found, the numeric form is used.
pub struct EndpointNamer<'a> {
    resolve: bool,
    resolver: &'a dyn Resolver,
    services: &'a ServiceDb,
}

impl<'a> EndpointNamer<'a> {
    #[must_use]
    pub fn new(resolve: bool, resolver: &'a dyn Resolver, services: &'a ServiceDb) -> Self {
        Self {
            resolve,
            resolver,
            services,
        }
    }

    /// Host name of an address, or the address itself
    #[must_use]
    pub fn address(&self, addr: IpAddr) -> String {
        if !self.resolve {
            return addr.to_string();
        }
        match self.resolver.reverse(addr) {
            Ok(names) if !names.is_empty() => names[0].clone(),
            Ok(_) => addr.to_string(),
            Err(e) => {
                trace!("Using numeric address: {e}");
                addr.to_string()
            }
        }
    }

    /// Service name of a port for the given protocol, or the port number
    #[must_use]
    pub fn port(&self, port: u16, protocol: &str) -> String {
        if !self.resolve {
            return port.to_string();
        }
        self.services
            .name(port, protocol)
            .map_or_else(|| port.to_string(), str::to_owned)
    }

    /// `host:port`, with brackets around numeric IPv6 hosts
    #[must_use]
    pub fn endpoint(&self, addr: IpAddr, port: u16, protocol: &str) -> String {
        let host = self.address(addr);
        let port = self.port(port, protocol);
        if addr.is_ipv6() && host.parse::<IpAddr>().is_ok() {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use netdb::ResolveError;
    use std::cell::Cell;
    use tracing_test::traced_test;

    /// Resolver failing every lookup, counting them
    #[derive(Default)]
    pub(crate) struct FailingResolver {
        pub(crate) calls: Cell<usize>,
    }
    impl Resolver for FailingResolver {
        fn reverse(&self, addr: IpAddr) -> Result<Vec<String>, ResolveError> {
            self.calls.set(self.calls.get() + 1);
            Err(ResolveError::Failed {
                addr,
                reason: "timed out".to_string(),
            })
        }
    }

    /// Resolver answering `host-<last octet>.example` for IPv4 addresses
    pub(crate) struct FakeResolver;
    impl Resolver for FakeResolver {
        fn reverse(&self, addr: IpAddr) -> Result<Vec<String>, ResolveError> {
            match addr {
                IpAddr::V4(v4) => Ok(vec![
                    format!("host-{}.example", v4.octets()[3]),
                    "alias.example".to_string(),
                ]),
                IpAddr::V6(_) => Ok(vec![]),
            }
        }
    }

    fn services() -> ServiceDb {
        ServiceDb::parse("http 80/tcp\ndomain 53/udp\n")
    }

    #[test]
    fn test_no_resolve_bypasses_lookups() {
        let resolver = FailingResolver::default();
        let services = services();
        let namer = EndpointNamer::new(false, &resolver, &services);
        assert_eq!(namer.address("10.0.0.1".parse().unwrap()), "10.0.0.1");
        assert_eq!(namer.port(80, "tcp"), "80");
        assert_eq!(resolver.calls.get(), 0);
    }

    #[test]
    fn test_resolution() {
        let services = services();
        let namer = EndpointNamer::new(true, &FakeResolver, &services);
        assert_eq!(namer.address("10.0.0.7".parse().unwrap()), "host-7.example");
        assert_eq!(namer.address("2001:db8::1".parse().unwrap()), "2001:db8::1");
        assert_eq!(namer.port(80, "tcp"), "http");
        assert_eq!(namer.port(80, "udp"), "80");
        assert_eq!(
            namer.endpoint("10.0.0.7".parse().unwrap(), 53, "udp"),
            "host-7.example:domain"
        );
        assert_eq!(
            namer.endpoint("2001:db8::1".parse().unwrap(), 443, "tcp"),
            "[2001:db8::1]:443"
        );
    }

    #[test]
    #[traced_test]
    fn test_failures_fall_back_to_numeric() {
        let resolver = FailingResolver::default();
        let services = ServiceDb::default();
        let namer = EndpointNamer::new(true, &resolver, &services);
        assert_eq!(
            namer.endpoint("192.0.2.1".parse().unwrap(), 8080, "tcp"),
            "192.0.2.1:8080"
        );
        assert_eq!(resolver.calls.get(), 1);
        assert!(logs_contain("Using numeric address: failed to resolve 192.0.2.1: timed out"));
    }
}
