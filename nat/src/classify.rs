// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Inference of the NAT category of a tracked connection

use std::net::IpAddr;

use conntrack::Flow;

use crate::localaddr::LocalAddrs;

/// Kind of translation a tracked connection went through
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum NatCategory {
    /// The source address was translated
    #[strum(serialize = "SNAT")]
    Snat,
    /// The destination address was translated
    #[strum(serialize = "DNAT")]
    Dnat,
    /// Not translated, and the host itself is one of the endpoints
    Local,
    /// Not translated, forwarded between two remote endpoints
    Routed,
    /// None of the above, e.g. entries being torn down
    Unclassified,
}

/// Infer the NAT category of a flow. Only addresses are compared, ports are ignored.
///
/// Rules are evaluated in order and the first one that matches wins:
///
/// 1. SNAT: the reply comes from the original destination but goes back to a different address
///    than the original source.
/// 2. DNAT: either the reply goes back to the original source but comes from a different address
///    than the original destination, or the only correlation between both tuples is the
///    destination (source and destination NAT performed by the same host).
/// 3. Local: no translation, and one of the addresses belongs to the host.
/// 4. Routed: no translation, and none of the addresses belongs to the host.
#[must_use]
pub fn classify(flow: &Flow, local: &LocalAddrs) -> NatCategory {
    let (o, r) = (&flow.original, &flow.reply);

    if o.dst == r.src && o.src != r.dst {
        return NatCategory::Snat;
    }

    let two_legged = o.src == r.dst && o.dst != r.src;
    let one_legged = o.src != r.src && o.src != r.dst && o.dst != r.src && o.dst == r.dst;
    if two_legged || one_legged {
        return NatCategory::Dnat;
    }

    if o.src == r.dst && o.dst == r.src {
        if [o.src, o.dst, r.src, r.dst]
            .iter()
            .any(|addr| local.contains(addr))
        {
            return NatCategory::Local;
        }
        return NatCategory::Routed;
    }

    NatCategory::Unclassified
}

/// The address the host translated to: for SNAT the address the source was rewritten to, for
/// DNAT the real destination behind the original one.
#[must_use]
pub fn nat_address(flow: &Flow, category: NatCategory) -> Option<IpAddr> {
    match category {
        NatCategory::Snat => Some(flow.reply.dst),
        NatCategory::Dnat => Some(flow.reply.src),
        _ => None,
    }
}

/// A flow along with its category, computed once per snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFlow {
    pub flow: Flow,
    pub category: NatCategory,
}

impl ClassifiedFlow {
    #[must_use]
    pub fn new(flow: Flow, local: &LocalAddrs) -> Self {
        let category = classify(&flow, local);
        Self { flow, category }
    }

    #[must_use]
    pub fn nat_address(&self) -> Option<IpAddr> {
        nat_address(&self.flow, self.category)
    }
}
