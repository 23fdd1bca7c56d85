// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ordering of the reported flows

use std::cmp::Ordering;

use conntrack::Flow;

use crate::classify::ClassifiedFlow;

/// Key to order flows by. Addresses and ports are those of the original tuple.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum SortKey {
    #[default]
    #[strum(to_string = "src", serialize = "source")]
    Source,
    #[strum(to_string = "dst", serialize = "destination")]
    Destination,
    #[strum(to_string = "src-port", serialize = "source-port")]
    SourcePort,
    #[strum(to_string = "dst-port", serialize = "destination-port")]
    DestinationPort,
    #[strum(to_string = "state")]
    State,
}

/// Compare two flows by the given key.
///
/// Addresses compare as the strings they are rendered as, not numerically: `10.0.0.10` sorts
/// before `10.0.0.2`.
#[must_use]
pub fn compare(key: SortKey, a: &Flow, b: &Flow) -> Ordering {
    match key {
        SortKey::Source => a.original.src.to_string().cmp(&b.original.src.to_string()),
        SortKey::Destination => a.original.dst.to_string().cmp(&b.original.dst.to_string()),
        SortKey::SourcePort => a.original.sport.cmp(&b.original.sport),
        SortKey::DestinationPort => a.original.dport.cmp(&b.original.dport),
        SortKey::State => a.state.cmp(&b.state),
    }
}

/// Sort flows in place. The sort is stable: flows comparing equal keep their relative order.
pub fn sort_flows(key: SortKey, flows: &mut [ClassifiedFlow]) {
    flows.sort_by(|a, b| compare(key, &a.flow, &b.flow));
}
