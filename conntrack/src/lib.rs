// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(rustdoc::all)]

//! Connection tracking snapshots
//!
//! This package models the entries of the kernel connection-tracking table and provides the means
//! to acquire one snapshot of it. Each [`Flow`] carries two [`EndpointTuple`]s: the tuple observed
//! in the original direction (as sent by the initiator) and the tuple observed in the reply
//! direction (after any address translation performed by the host).
//!
//! # Example
//!
//! ```
//! use natstat_conntrack::{MemorySnapshot, SnapshotSource};
//!
//! let text = "ipv4 2 tcp 6 431999 ESTABLISHED \
//!     src=10.0.0.5 dst=93.184.216.34 sport=5000 dport=80 \
//!     src=93.184.216.34 dst=203.0.113.9 sport=80 dport=5000 [ASSURED] mark=0 use=2\n";
//! let flows = MemorySnapshot::from_text(text).flows().unwrap();
//! assert_eq!(flows.len(), 1);
//! assert_eq!(flows[0].protocol.name, "tcp");
//! assert_eq!(flows[0].state, "ESTABLISHED");
//! ```
//!
//! # Limitations
//!
//! - Only the textual `/proc` interface is supported; netlink dumps are not.
//! - Port numbers are only extracted for protocols exposing `sport`/`dport` fields. ICMP
//!   identifiers are ignored and the ports of such flows are 0.

mod flow;
mod parse;
mod snapshot;

pub use flow::{EndpointTuple, Flow, FlowStatus, L3Family, Protocol};
pub use parse::{ParseError, parse_line, parse_table};
pub use snapshot::{
    DEFAULT_CONNTRACK_PATH, LEGACY_CONNTRACK_PATH, MemorySnapshot, ProcConntrack, SnapshotError,
    SnapshotSource,
};
