// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(rustdoc::all)]
#![allow(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod logging;
pub mod namer;
pub mod report;
pub mod table;

pub use config::{ReportConfig, ReportConfigBuilder};
pub use namer::EndpointNamer;
pub use report::{NatstatError, Reporter, Row};
