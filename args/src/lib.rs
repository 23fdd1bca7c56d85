// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

pub use clap::Parser;
use nat::{CategorySelection, NatCategory, SortKey};
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "natstat")]
#[command(version)]
#[command(args_override_self = true)]
#[command(
    about = "Display NAT connections tracked by the kernel",
    long_about = "Display the connections tracked by the kernel along with the kind of address translation they went through.
By default, only translated (SNAT and DNAT) connections are shown."
)]
#[allow(clippy::struct_excessive_bools)]
pub struct CmdArgs {
    #[arg(
        short = 'S',
        long,
        overrides_with_all = ["dnat", "local", "routed"],
        help = "Display only SNAT connections"
    )]
    snat: bool,

    #[arg(
        short = 'D',
        long,
        overrides_with_all = ["snat", "local", "routed"],
        help = "Display only DNAT connections"
    )]
    dnat: bool,

    #[arg(
        short = 'L',
        long,
        overrides_with_all = ["snat", "dnat", "routed"],
        help = "Display only local connections (originating from or going to the router)"
    )]
    local: bool,

    #[arg(
        short = 'R',
        long,
        overrides_with_all = ["snat", "dnat", "local"],
        help = "Display only connections routed through the router"
    )]
    routed: bool,

    #[arg(short = 'n', long, help = "Do not resolve host and service names")]
    no_resolve: bool,

    #[arg(short = 'o', long, help = "Strip output header")]
    no_header: bool,

    #[arg(
        short = 'N',
        long,
        help = "Display the address the router translated to (SNAT and DNAT connections)"
    )]
    nat_box: bool,

    #[arg(
        short = 'p',
        long,
        value_name = "NAME",
        help = "Filter connections by protocol name, as listed in the protocols database"
    )]
    protocol: Option<String>,

    #[arg(short = 's', long, value_name = "ADDRESS", help = "Filter by source IP")]
    source: Option<IpAddr>,

    #[arg(
        short = 'd',
        long,
        value_name = "ADDRESS",
        help = "Filter by destination IP"
    )]
    destination: Option<IpAddr>,

    #[arg(
        short = 'r',
        long,
        value_name = "KEY",
        value_parser = SortKey::from_str,
        default_value_t = SortKey::default(),
        help = "Sort connections by one of: src, dst, src-port, dst-port, state"
    )]
    sort: SortKey,

    #[arg(
        long,
        value_name = "PATH",
        help = "Read the connection tracking table from a file instead of /proc"
    )]
    snapshot: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        default_value = "/etc/protocols",
        help = "Protocols database"
    )]
    protocols: PathBuf,

    #[arg(
        long,
        value_name = "PATH",
        default_value = "/etc/services",
        help = "Services database"
    )]
    services: PathBuf,

    #[arg(
        long,
        value_name = "ADDRESS",
        value_delimiter = ',',
        help = "Addresses to consider local instead of those of the network interfaces.
Multiple addresses can be given, comma-separated or repeating the option"
    )]
    local_address: Vec<IpAddr>,

    #[arg(
        long,
        value_name = "tracing configuration",
        help = "Tracing config string as comma-separated sequence of tag=level, with level one in [off,error,warn,info,debug,trace].
Passing default=level sets the default log-level.
Passing all=level sets the log-level of all the tags (conntrack, netdb, nat, natstat).
E.g. default=error,all=info,nat=debug"
    )]
    tracing: Option<String>,
}

impl CmdArgs {
    /// The category the user asked for. When several category flags are given the last one wins.
    pub fn category(&self) -> CategorySelection {
        let selection = if self.snat {
            CategorySelection::Only(NatCategory::Snat)
        } else if self.dnat {
            CategorySelection::Only(NatCategory::Dnat)
        } else if self.local {
            CategorySelection::Only(NatCategory::Local)
        } else if self.routed {
            CategorySelection::Only(NatCategory::Routed)
        } else {
            CategorySelection::Translated
        };
        debug!("Category selection: {selection:?}");
        selection
    }

    pub fn resolve(&self) -> bool {
        !self.no_resolve
    }
    pub fn header(&self) -> bool {
        !self.no_header
    }
    pub fn nat_box(&self) -> bool {
        self.nat_box
    }
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }
    pub fn source(&self) -> Option<IpAddr> {
        self.source
    }
    pub fn destination(&self) -> Option<IpAddr> {
        self.destination
    }
    pub fn sort(&self) -> SortKey {
        self.sort
    }
    pub fn snapshot(&self) -> Option<&PathBuf> {
        self.snapshot.as_ref()
    }
    pub fn protocols(&self) -> &PathBuf {
        &self.protocols
    }
    pub fn services(&self) -> &PathBuf {
        &self.services
    }
    pub fn local_addresses(&self) -> &[IpAddr] {
        &self.local_address
    }
    pub fn tracing(&self) -> Option<&String> {
        self.tracing.as_ref()
    }
}
