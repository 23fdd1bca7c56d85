// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(rustdoc::all)]

//! Network Address Translation (NAT) classification of tracked connections
//!
//! The connection tracking table never says whether an entry was translated. It only holds the
//! tuple observed in the original direction and the one observed in the reply direction. This
//! package infers the kind of translation from which addresses of the two tuples match, and
//! provides the filtering and ordering used to report on a snapshot.
//!
//! # Example
//!
//! ```
//! use conntrack::{EndpointTuple, Flow, Protocol};
//! use natstat_nat::{LocalAddrs, NatCategory, classify};
//!
//! let ip = |s: &str| s.parse().unwrap();
//! let flow = Flow::new(
//!     Protocol::new("tcp", 6),
//!     "ESTABLISHED",
//!     EndpointTuple::new(ip("10.0.0.5"), ip("93.184.216.34"), 5000, 80),
//!     EndpointTuple::new(ip("93.184.216.34"), ip("203.0.113.9"), 80, 5000),
//! );
//! let local = LocalAddrs::from_addrs([ip("203.0.113.9")]);
//! assert_eq!(classify(&flow, &local), NatCategory::Snat);
//! ```
//!
//! # Limitations
//!
//! - Only addresses take part in the classification; port translation alone is not detected.
//! - Local addresses are matched exactly, prefixes are not taken into account.

mod classify;
mod filter;
mod localaddr;
mod sort;

pub use classify::{ClassifiedFlow, NatCategory, classify, nat_address};
pub use filter::{CategorySelection, FlowFilter, FlowFilterBuilder};
pub use localaddr::{LocalAddrError, LocalAddrs};
pub use sort::{SortKey, compare, sort_flows};
