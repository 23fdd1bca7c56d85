// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Connection tracking entries

use bitflags::bitflags;
use std::fmt::Display;
use std::net::IpAddr;

/// One direction of a tracked connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointTuple {
    pub src: IpAddr,
    pub dst: IpAddr,
    pub sport: u16,
    pub dport: u16,
}

impl EndpointTuple {
    #[must_use]
    pub fn new(src: IpAddr, dst: IpAddr, sport: u16, dport: u16) -> Self {
        Self {
            src,
            dst,
            sport,
            dport,
        }
    }
}

impl Display for EndpointTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.src, self.sport, self.dst, self.dport
        )
    }
}

/// Transport protocol of a tracked connection, as reported by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Protocol {
    pub name: String,
    pub number: u8,
}

impl Protocol {
    #[must_use]
    pub fn new(name: impl Into<String>, number: u8) -> Self {
        Self {
            name: name.into(),
            number,
        }
    }
}

/// Network-layer family of a tracked connection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum L3Family {
    Ipv4,
    Ipv6,
}

impl L3Family {
    #[must_use]
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => L3Family::Ipv4,
            IpAddr::V6(_) => L3Family::Ipv6,
        }
    }
}

bitflags! {
    /// Status markers the kernel attaches to an entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FlowStatus: u8 {
        /// Traffic has been seen in both directions and the entry will not be early-dropped.
        const ASSURED = 0b0000_0001;
        /// No reply traffic has been seen yet.
        const UNREPLIED = 0b0000_0010;
    }
}

impl FlowStatus {
    /// Map a `[MARKER]` word of the conntrack table to a status flag.
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "ASSURED" => Some(FlowStatus::ASSURED),
            "UNREPLIED" => Some(FlowStatus::UNREPLIED),
            _ => None,
        }
    }
}

/// A tracked connection. The `original` tuple is the one observed from the initiator, the
/// `reply` tuple the one observed in the return direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    pub family: L3Family,
    pub protocol: Protocol,
    pub timeout: u64,
    pub state: String,
    pub original: EndpointTuple,
    pub reply: EndpointTuple,
    pub status: FlowStatus,
}

impl Flow {
    /// Build a flow from its two tuples. The family is taken from the original source address;
    /// timeout and status are left empty.
    #[must_use]
    pub fn new(
        protocol: Protocol,
        state: impl Into<String>,
        original: EndpointTuple,
        reply: EndpointTuple,
    ) -> Self {
        Self {
            family: L3Family::of(&original.src),
            protocol,
            timeout: 0,
            state: state.into(),
            original,
            reply,
            status: FlowStatus::empty(),
        }
    }
}

impl Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} original {} reply {}",
            self.protocol.name, self.state, self.original, self.reply
        )
    }
}
