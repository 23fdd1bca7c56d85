// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Reverse address resolution

use std::net::IpAddr;

use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no name found for {0}")]
    NotFound(IpAddr),
    #[error("failed to resolve {addr}: {reason}")]
    Failed { addr: IpAddr, reason: String },
}

/// Maps addresses back to host names.
pub trait Resolver {
    /// Return the names of the given address, most relevant first.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if the address has no name or the lookup failed.
    fn reverse(&self, addr: IpAddr) -> Result<Vec<String>, ResolveError>;
}

/// Resolver backed by the system resolver (`getnameinfo`). Every lookup blocks the caller for as
/// long as the system resolver takes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn reverse(&self, addr: IpAddr) -> Result<Vec<String>, ResolveError> {
        let name = dns_lookup::lookup_addr(&addr).map_err(|e| {
            trace!("Reverse lookup of {addr} failed: {e}");
            ResolveError::Failed {
                addr,
                reason: e.to_string(),
            }
        })?;
        // the system resolver hands back the numeric form when there is no name
        if name.is_empty() || name.parse::<IpAddr>().is_ok() {
            return Err(ResolveError::NotFound(addr));
        }
        Ok(vec![name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_loopback() {
        // whatever the resolver configuration, a successful lookup must yield a non-empty name
        if let Ok(names) = SystemResolver.reverse("127.0.0.1".parse().unwrap()) {
            assert_eq!(names.len(), 1);
            assert!(!names[0].is_empty());
        }
    }

    #[test]
    fn test_error_display() {
        let addr: IpAddr = "192.0.2.1".parse().unwrap();
        assert_eq!(
            ResolveError::NotFound(addr).to_string(),
            "no name found for 192.0.2.1"
        );
        assert_eq!(
            ResolveError::Failed {
                addr,
                reason: "timed out".to_string()
            }
            .to_string(),
            "failed to resolve 192.0.2.1: timed out"
        );
    }

    #[test]
    fn test_numeric_answer_is_not_a_name() {
        // documentation prefix, no PTR record anywhere
        let addr: IpAddr = "192.0.2.1".parse().unwrap();
        match SystemResolver.reverse(addr) {
            Ok(names) => assert!(names.iter().all(|n| n.parse::<IpAddr>().is_err())),
            Err(e) => assert!(matches!(
                e,
                ResolveError::NotFound(a) | ResolveError::Failed { addr: a, .. } if a == addr
            )),
        }
    }
}
