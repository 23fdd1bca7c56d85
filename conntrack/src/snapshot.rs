// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Acquisition of a conntrack table snapshot

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::flow::Flow;
use crate::parse::{ParseError, parse_table};

/// Location of the conntrack table on current kernels
pub const DEFAULT_CONNTRACK_PATH: &str = "/proc/net/nf_conntrack";
/// Location of the conntrack table on kernels predating `nf_conntrack`
pub const LEGACY_CONNTRACK_PATH: &str = "/proc/net/ip_conntrack";

/// Errors which may occur when acquiring a snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("connection tracking table not found (is the nf_conntrack module loaded?)")]
    Unavailable,
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed connection tracking table {path}: {source}")]
    Parse { path: PathBuf, source: ParseError },
}

/// Something able to produce the list of tracked connections at one point in time.
pub trait SnapshotSource {
    /// Take a snapshot of the tracked connections.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if the table cannot be read or parsed.
    fn flows(&self) -> Result<Vec<Flow>, SnapshotError>;
}

/// Reads the conntrack table from `/proc`, or from a file holding a copy of it.
#[derive(Debug, Clone)]
pub struct ProcConntrack {
    paths: Vec<PathBuf>,
    /// Missing files mean the kernel module is not loaded, rather than a bad path
    kernel: bool,
}

impl ProcConntrack {
    /// Source reading the kernel table, trying the legacy location if the current one is absent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            paths: vec![
                PathBuf::from(DEFAULT_CONNTRACK_PATH),
                PathBuf::from(LEGACY_CONNTRACK_PATH),
            ],
            kernel: true,
        }
    }

    /// Source reading the given file only. A missing file is an I/O error.
    #[must_use]
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            paths: vec![path.as_ref().to_path_buf()],
            kernel: false,
        }
    }

    fn read(&self, path: &Path) -> Result<Option<String>, SnapshotError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if self.kernel && e.kind() == ErrorKind::NotFound => {
                debug!("No conntrack table at {}", path.display());
                Ok(None)
            }
            Err(source) => Err(SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl Default for ProcConntrack {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for ProcConntrack {
    fn flows(&self) -> Result<Vec<Flow>, SnapshotError> {
        for path in &self.paths {
            if let Some(text) = self.read(path)? {
                let flows = parse_table(&text).map_err(|source| SnapshotError::Parse {
                    path: path.clone(),
                    source,
                })?;
                debug!("Read {} tracked flows from {}", flows.len(), path.display());
                return Ok(flows);
            }
        }
        Err(SnapshotError::Unavailable)
    }
}

/// A snapshot that is already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    flows: Vec<Flow>,
    text: Option<String>,
}

impl MemorySnapshot {
    #[must_use]
    pub fn new(flows: Vec<Flow>) -> Self {
        Self { flows, text: None }
    }

    /// Snapshot given as conntrack table text, parsed when the flows are requested.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            flows: Vec::new(),
            text: Some(text.into()),
        }
    }
}

impl SnapshotSource for MemorySnapshot {
    fn flows(&self) -> Result<Vec<Flow>, SnapshotError> {
        match &self.text {
            Some(text) => parse_table(text).map_err(|source| SnapshotError::Parse {
                path: PathBuf::from("<memory>"),
                source,
            }),
            None => Ok(self.flows.clone()),
        }
    }
}
