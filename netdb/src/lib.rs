// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(rustdoc::all)]

//! Network databases: protocol numbers, service names and reverse address resolution.
//!
//! The protocol and service databases are read from files in the `/etc/protocols` and
//! `/etc/services` format. Reverse resolution goes through the system resolver, so it honours
//! `/etc/hosts`, `nsswitch.conf` and whatever DNS configuration the host has.

mod protocols;
mod resolver;
mod services;

pub use protocols::{DEFAULT_PROTOCOLS_PATH, ProtoEntry, ProtocolDb};
pub use resolver::{ResolveError, Resolver, SystemResolver};
pub use services::{DEFAULT_SERVICES_PATH, ServiceDb};

use std::path::PathBuf;

/// Errors reading a network database file
#[derive(Debug, thiserror::Error)]
pub enum NetdbError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Strip the comment of a database line and split it in whitespace-separated words
pub(crate) fn words(line: &str) -> impl Iterator<Item = &str> {
    let content = match line.split_once('#') {
        Some((content, _comment)) => content,
        None => line,
    };
    content.split_whitespace()
}

pub(crate) fn read_db(path: &std::path::Path) -> Result<String, NetdbError> {
    std::fs::read_to_string(path).map_err(|source| NetdbError::Io {
        path: path.to_path_buf(),
        source,
    })
}
