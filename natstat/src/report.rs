// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Report on one snapshot of the connection tracking table

use std::io::Write;

use conntrack::{ProcConntrack, SnapshotError, SnapshotSource};
use nat::{ClassifiedFlow, FlowFilter, LocalAddrError, LocalAddrs, sort_flows};
use netdb::{ProtocolDb, Resolver, ServiceDb};
use tracing::{debug, info};

use crate::config::ReportConfig;
use crate::logging::TracingConfigError;
use crate::namer::EndpointNamer;
use crate::table;

/// Conditions aborting the report. None of them produce partial output.
#[derive(Debug, thiserror::Error)]
pub enum NatstatError {
    #[error("unknown protocol '{0}'")]
    UnknownProtocol(String),
    #[error(transparent)]
    LocalAddrs(#[from] LocalAddrError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
    #[error("invalid tracing configuration: {0}")]
    Tracing(#[from] TracingConfigError),
}

impl NatstatError {
    /// Process exit code for this error: 2 for usage errors, 1 otherwise
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            NatstatError::Tracing(TracingConfigError::Init(_))
            | NatstatError::LocalAddrs(_)
            | NatstatError::Snapshot(_)
            | NatstatError::Output(_) => 1,
            NatstatError::UnknownProtocol(_) | NatstatError::Tracing(_) => 2,
        }
    }
}

/// One line of the report, with display strings already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub protocol: String,
    pub source: String,
    pub destination: String,
    pub state: String,
    pub nat: Option<String>,
}

/// Runs the classify, filter, sort, name and format sequence over one snapshot.
pub struct Reporter<'a> {
    config: &'a ReportConfig,
    protocols: ProtocolDb,
    services: ServiceDb,
    local: LocalAddrs,
}

impl<'a> Reporter<'a> {
    #[must_use]
    pub fn new(
        config: &'a ReportConfig,
        protocols: ProtocolDb,
        services: ServiceDb,
        local: LocalAddrs,
    ) -> Self {
        Self {
            config,
            protocols,
            services,
            local,
        }
    }

    /// Build a reporter loading the network databases and local addresses the configuration
    /// points to.
    ///
    /// # Errors
    ///
    /// Fails if the local interfaces cannot be enumerated.
    pub fn from_config(config: &'a ReportConfig) -> Result<Self, NatstatError> {
        let protocols = ProtocolDb::load_or_builtin(&config.protocols);
        let services = if config.resolve {
            ServiceDb::load_or_empty(&config.services)
        } else {
            ServiceDb::default()
        };
        let local = if config.local_addresses.is_empty() {
            LocalAddrs::build()?
        } else {
            LocalAddrs::from_addrs(config.local_addresses.iter().copied())
        };
        info!("{} local addresses", local.len());
        for net in local.iter() {
            debug!("Local address {net}");
        }
        Ok(Self::new(config, protocols, services, local))
    }

    /// The snapshot source the configuration asks for
    #[must_use]
    pub fn source(&self) -> ProcConntrack {
        match &self.config.snapshot {
            Some(path) => ProcConntrack::with_path(path),
            None => ProcConntrack::new(),
        }
    }

    /// The filter described by the configuration, with the protocol name resolved.
    ///
    /// # Errors
    ///
    /// Fails with [`NatstatError::UnknownProtocol`] if the protocol is not in the database.
    pub fn filter(&self) -> Result<FlowFilter, NatstatError> {
        let protocol = match &self.config.protocol {
            Some(name) => {
                let entry = self
                    .protocols
                    .by_name(name)
                    .ok_or_else(|| NatstatError::UnknownProtocol(name.clone()))?;
                Some(entry.number)
            }
            None => None,
        };
        Ok(FlowFilter {
            category: self.config.category,
            protocol,
            source: self.config.source,
            destination: self.config.destination,
        })
    }

    /// Select and order the flows of a snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the protocol filter is invalid or the snapshot cannot be acquired.
    pub fn flows(&self, source: &dyn SnapshotSource) -> Result<Vec<ClassifiedFlow>, NatstatError> {
        let filter = self.filter()?;
        let flows = source.flows()?;
        let mut selected = filter.select(flows, &self.local);
        sort_flows(self.config.sort, &mut selected);
        Ok(selected)
    }

    fn row(&self, namer: &EndpointNamer, flow: &ClassifiedFlow) -> Row {
        let proto = flow.flow.protocol.name.as_str();
        let original = &flow.flow.original;
        Row {
            protocol: proto.to_string(),
            source: namer.endpoint(original.src, original.sport, proto),
            destination: namer.endpoint(original.dst, original.dport, proto),
            state: flow.flow.state.clone(),
            nat: self
                .config
                .nat_box
                .then(|| flow.nat_address().map(|addr| namer.address(addr)))
                .flatten(),
        }
    }

    /// Produce the rows of the report, in their final order. Names are resolved one flow at a
    /// time.
    ///
    /// # Errors
    ///
    /// Fails if the protocol filter is invalid or the snapshot cannot be acquired.
    pub fn rows(
        &self,
        source: &dyn SnapshotSource,
        resolver: &dyn Resolver,
    ) -> Result<Vec<Row>, NatstatError> {
        let flows = self.flows(source)?;
        let namer = EndpointNamer::new(self.config.resolve, resolver, &self.services);
        Ok(flows.iter().map(|flow| self.row(&namer, flow)).collect())
    }

    /// Write the report. Nothing is written if any fatal condition occurs.
    ///
    /// # Errors
    ///
    /// See [`NatstatError`].
    pub fn run(
        &self,
        source: &dyn SnapshotSource,
        resolver: &dyn Resolver,
        out: &mut dyn Write,
    ) -> Result<usize, NatstatError> {
        let rows = self.rows(source, resolver)?;
        let text = table::render(&rows, self.config.header, self.config.nat_box);
        out.write_all(text.as_bytes())?;
        out.flush()?;
        debug!("Reported {} flows", rows.len());
        Ok(rows.len())
    }
}
