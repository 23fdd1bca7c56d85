// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Service database (`/etc/services`)

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::{NetdbError, read_db, words};

pub const DEFAULT_SERVICES_PATH: &str = "/etc/services";

/// (port, protocol) to service name mapping. When a port is listed several times for the same
/// protocol, the first entry wins.
#[derive(Debug, Clone, Default)]
pub struct ServiceDb {
    names: HashMap<(u16, String), String>,
}

impl ServiceDb {
    /// Build a database from text in the `/etc/services` format.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut db = Self::default();
        for line in text.lines() {
            let mut words = words(line);
            let (Some(name), Some(port_proto)) = (words.next(), words.next()) else {
                continue;
            };
            let Some((port, proto)) = port_proto.split_once('/') else {
                continue;
            };
            let Ok(port) = port.parse::<u16>() else {
                continue;
            };
            db.names
                .entry((port, proto.to_owned()))
                .or_insert_with(|| name.to_owned());
        }
        db
    }

    /// Load the database from a file.
    ///
    /// # Errors
    ///
    /// Returns [`NetdbError`] if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NetdbError> {
        let text = read_db(path.as_ref())?;
        Ok(Self::parse(&text))
    }

    /// Load the database from a file; an unreadable file yields an empty database so that
    /// ports are shown numerically.
    #[must_use]
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            debug!("{e}; service names disabled");
            Self::default()
        })
    }

    #[must_use]
    pub fn name(&self, port: u16, protocol: &str) -> Option<&str> {
        self.names
            .get(&(port, protocol.to_owned()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const SERVICES: &str = "\
# Network services, Internet style
ssh		22/tcp				# SSH Remote Login Protocol
domain		53/tcp				# Domain Name Server
domain		53/udp
http		80/tcp		www		# WorldWideWeb HTTP
www-alt		80/tcp
bad		port/tcp
noproto		99
";

    #[test]
    fn test_parse_services() {
        let db = ServiceDb::parse(SERVICES);
        assert_eq!(db.len(), 4);
        assert_eq!(db.name(22, "tcp"), Some("ssh"));
        assert_eq!(db.name(53, "udp"), Some("domain"));
        assert_eq!(db.name(80, "tcp"), Some("http"));
        assert_eq!(db.name(22, "udp"), None);
        assert_eq!(db.name(99, "tcp"), None);
    }

    #[test]
    #[traced_test]
    fn test_missing_file() {
        assert!(ServiceDb::load_or_empty("/nonexistent/natstat/services").is_empty());
        assert!(logs_contain("service names disabled"));
    }
}
