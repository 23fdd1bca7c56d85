// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Report configuration, built once from the command line

use std::fmt::Display;
use std::net::IpAddr;
use std::path::PathBuf;

use args::CmdArgs;
use derive_builder::Builder;
use nat::{CategorySelection, SortKey};
use netdb::{DEFAULT_PROTOCOLS_PATH, DEFAULT_SERVICES_PATH};

/// Everything a [`crate::Reporter`] needs to know about what to show and how.
/// N.B. we derive a builder type `ReportConfigBuilder` with defaults matching the command line.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    #[builder(default)]
    pub category: CategorySelection,

    /// Protocol name, resolved through the protocols database
    #[builder(setter(into, strip_option), default)]
    pub protocol: Option<String>,

    #[builder(setter(strip_option), default)]
    pub source: Option<IpAddr>,

    #[builder(setter(strip_option), default)]
    pub destination: Option<IpAddr>,

    #[builder(default)]
    pub sort: SortKey,

    #[builder(default = true)]
    pub resolve: bool,

    #[builder(default = true)]
    pub header: bool,

    #[builder(default)]
    pub nat_box: bool,

    /// File to read the conntrack table from, instead of `/proc`
    #[builder(setter(into, strip_option), default)]
    pub snapshot: Option<PathBuf>,

    #[builder(setter(into), default = PathBuf::from(DEFAULT_PROTOCOLS_PATH))]
    pub protocols: PathBuf,

    #[builder(setter(into), default = PathBuf::from(DEFAULT_SERVICES_PATH))]
    pub services: PathBuf,

    /// If not empty, used instead of the addresses of the local interfaces
    #[builder(default)]
    pub local_addresses: Vec<IpAddr>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            category: CategorySelection::default(),
            protocol: None,
            source: None,
            destination: None,
            sort: SortKey::default(),
            resolve: true,
            header: true,
            nat_box: false,
            snapshot: None,
            protocols: PathBuf::from(DEFAULT_PROTOCOLS_PATH),
            services: PathBuf::from(DEFAULT_SERVICES_PATH),
            local_addresses: Vec::new(),
        }
    }
}

impl From<&CmdArgs> for ReportConfig {
    fn from(args: &CmdArgs) -> Self {
        Self {
            category: args.category(),
            protocol: args.protocol().map(str::to_owned),
            source: args.source(),
            destination: args.destination(),
            sort: args.sort(),
            resolve: args.resolve(),
            header: args.header(),
            nat_box: args.nat_box(),
            snapshot: args.snapshot().cloned(),
            protocols: args.protocols().clone(),
            services: args.services().clone(),
            local_addresses: args.local_addresses().to_vec(),
        }
    }
}

fn or_any<T: Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "any".to_string(), ToString::to_string)
}

impl Display for ReportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        writeln!(f, "Report config")?;
        writeln!(f, "  category    : {:?}", self.category)?;
        writeln!(f, "  protocol    : {}", or_any(self.protocol.as_ref()))?;
        writeln!(f, "  source      : {}", or_any(self.source.as_ref()))?;
        writeln!(f, "  destination : {}", or_any(self.destination.as_ref()))?;
        writeln!(f, "  sort        : {}", self.sort)?;
        writeln!(f, "  resolve     : {}", self.resolve)?;
        match &self.snapshot {
            Some(path) => writeln!(f, "  snapshot    : {}", path.display()),
            None => writeln!(f, "  snapshot    : kernel"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use args::Parser;
    use nat::NatCategory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_defaults() {
        let config = ReportConfigBuilder::default().build().unwrap();
        assert_eq!(config, ReportConfig::default());
        assert!(config.resolve);
        assert!(config.header);
        assert_eq!(config.protocols, PathBuf::from("/etc/protocols"));
    }

    #[test]
    fn test_from_args() {
        let args = CmdArgs::try_parse_from([
            "natstat", "-L", "-n", "-p", "udp", "-r", "state", "--snapshot", "/tmp/ct",
        ])
        .unwrap();
        let config = ReportConfig::from(&args);
        let expected = ReportConfigBuilder::default()
            .category(CategorySelection::Only(NatCategory::Local))
            .resolve(false)
            .protocol("udp")
            .sort(SortKey::State)
            .snapshot("/tmp/ct")
            .build()
            .unwrap();
        assert_eq!(config, expected);
    }

    #[test]
    fn test_display() {
        let config = ReportConfigBuilder::default()
            .source("10.0.0.1".parse::<IpAddr>().unwrap())
            .build()
            .unwrap();
        let text = config.to_string();
        assert!(text.contains("source      : 10.0.0.1"));
        assert!(text.contains("protocol    : any"));
        assert!(text.contains("snapshot    : kernel"));
    }
}
