// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Selection of the flows to report

use std::net::IpAddr;

use conntrack::Flow;
use derive_builder::Builder;
use tracing::debug;

use crate::classify::{ClassifiedFlow, NatCategory};
use crate::localaddr::LocalAddrs;

/// Which NAT categories to report. This is a single choice: selecting a category replaces the
/// default rather than adding to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategorySelection {
    /// Translated flows, both SNAT and DNAT
    #[default]
    Translated,
    /// Flows of exactly one category
    Only(NatCategory),
}

impl CategorySelection {
    #[must_use]
    pub fn accepts(&self, category: NatCategory) -> bool {
        match self {
            CategorySelection::Translated => {
                matches!(category, NatCategory::Snat | NatCategory::Dnat)
            }
            CategorySelection::Only(only) => *only == category,
        }
    }
}

/// Conjunction of the enabled predicates. Unset predicates accept everything.
#[derive(Builder, Debug, Clone, Default, PartialEq, Eq)]
#[builder(default)]
pub struct FlowFilter {
    pub category: CategorySelection,
    /// Protocol number the flows must have
    #[builder(setter(strip_option))]
    pub protocol: Option<u8>,
    /// Address the original tuple must come from
    #[builder(setter(strip_option))]
    pub source: Option<IpAddr>,
    /// Address the original tuple must go to
    #[builder(setter(strip_option))]
    pub destination: Option<IpAddr>,
}

impl FlowFilter {
    fn accepts_endpoints(&self, flow: &Flow) -> bool {
        self.protocol.is_none_or(|proto| flow.protocol.number == proto)
            && self.source.is_none_or(|src| flow.original.src == src)
            && self.destination.is_none_or(|dst| flow.original.dst == dst)
    }

    /// Whether a classified flow passes every enabled predicate
    #[must_use]
    pub fn accepts(&self, flow: &ClassifiedFlow) -> bool {
        self.category.accepts(flow.category) && self.accepts_endpoints(&flow.flow)
    }

    /// Classify the flows of a snapshot and keep those accepted by this filter, in their
    /// original order.
    pub fn select(
        &self,
        flows: impl IntoIterator<Item = Flow>,
        local: &LocalAddrs,
    ) -> Vec<ClassifiedFlow> {
        let mut total = 0usize;
        let selected: Vec<_> = flows
            .into_iter()
            .inspect(|_| total += 1)
            .map(|flow| ClassifiedFlow::new(flow, local))
            .filter(|flow| self.accepts(flow))
            .collect();
        debug!("Selected {} out of {total} flows", selected.len());
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conntrack::{EndpointTuple, Protocol};
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn ip(addr: &str) -> IpAddr {
        addr.parse().expect("Bad address")
    }

    fn flow(proto: (&str, u8), orig: (&str, &str), reply: (&str, &str), sport: u16) -> Flow {
        Flow::new(
            Protocol::new(proto.0, proto.1),
            "",
            EndpointTuple::new(ip(orig.0), ip(orig.1), sport, 80),
            EndpointTuple::new(ip(reply.0), ip(reply.1), 80, sport),
        )
    }

    /// One flow of each category; 192.0.2.1 is the router
    fn snapshot() -> Vec<Flow> {
        vec![
            // SNAT
            flow(("tcp", 6), ("10.0.0.5", "8.8.8.8"), ("8.8.8.8", "192.0.2.1"), 1),
            // DNAT
            flow(("udp", 17), ("8.8.4.4", "192.0.2.1"), ("10.0.0.6", "8.8.4.4"), 2),
            // Local
            flow(("tcp", 6), ("10.0.0.5", "192.0.2.1"), ("192.0.2.1", "10.0.0.5"), 3),
            // Routed
            flow(("udp", 17), ("10.0.0.5", "10.9.0.1"), ("10.9.0.1", "10.0.0.5"), 4),
            // SNAT, udp
            flow(("udp", 17), ("10.0.0.6", "8.8.8.8"), ("8.8.8.8", "192.0.2.1"), 5),
        ]
    }

    fn local() -> LocalAddrs {
        LocalAddrs::from_addrs([ip("192.0.2.1")])
    }

    fn sports(flows: &[ClassifiedFlow]) -> Vec<u16> {
        flows.iter().map(|f| f.flow.original.sport).collect()
    }

    #[test]
    #[traced_test]
    fn test_default_selects_translated() {
        let selected = FlowFilter::default().select(snapshot(), &local());
        assert_eq!(sports(&selected), vec![1, 2, 5]);
        assert!(logs_contain("Selected 3 out of 5 flows"));
    }

    #[test]
    fn test_single_category() {
        for (category, expected) in [
            (NatCategory::Snat, vec![1, 5]),
            (NatCategory::Dnat, vec![2]),
            (NatCategory::Local, vec![3]),
            (NatCategory::Routed, vec![4]),
            (NatCategory::Unclassified, vec![]),
        ] {
            let filter = FlowFilterBuilder::default()
                .category(CategorySelection::Only(category))
                .build()
                .unwrap();
            assert_eq!(sports(&filter.select(snapshot(), &local())), expected);
        }
    }

    #[test]
    fn test_protocol_and_addresses() {
        let filter = FlowFilterBuilder::default()
            .protocol(17)
            .build()
            .unwrap();
        assert_eq!(sports(&filter.select(snapshot(), &local())), vec![2, 5]);

        let filter = FlowFilterBuilder::default()
            .source(ip("10.0.0.5"))
            .build()
            .unwrap();
        assert_eq!(sports(&filter.select(snapshot(), &local())), vec![1]);

        let filter = FlowFilterBuilder::default()
            .category(CategorySelection::Only(NatCategory::Local))
            .destination(ip("192.0.2.1"))
            .protocol(6)
            .build()
            .unwrap();
        assert_eq!(sports(&filter.select(snapshot(), &local())), vec![3]);
    }

    #[test]
    fn test_filter_is_conjunction() {
        let filters = [
            FlowFilter::default(),
            FlowFilterBuilder::default().protocol(6).build().unwrap(),
            FlowFilterBuilder::default()
                .category(CategorySelection::Only(NatCategory::Snat))
                .destination(ip("8.8.8.8"))
                .build()
                .unwrap(),
            FlowFilterBuilder::default()
                .category(CategorySelection::Only(NatCategory::Routed))
                .source(ip("10.0.0.5"))
                .protocol(17)
                .build()
                .unwrap(),
        ];
        let local = local();
        for filter in &filters {
            for flow in snapshot() {
                let classified = ClassifiedFlow::new(flow.clone(), &local);
                let expected = filter.category.accepts(classified.category)
                    && filter.protocol.is_none_or(|p| p == flow.protocol.number)
                    && filter.source.is_none_or(|s| s == flow.original.src)
                    && filter.destination.is_none_or(|d| d == flow.original.dst);
                assert_eq!(filter.accepts(&classified), expected);
            }
        }
    }

    #[test]
    fn test_selection_keeps_order_and_is_order_independent() {
        let local = local();
        let mut reversed = snapshot();
        reversed.reverse();
        let selected = FlowFilter::default().select(reversed, &local);
        assert_eq!(sports(&selected), vec![5, 2, 1]);
        for flow in &selected {
            assert_eq!(flow.category, crate::classify(&flow.flow, &local));
        }
    }
}
