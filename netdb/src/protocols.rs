// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Protocol database (`/etc/protocols`)

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::{NetdbError, read_db, words};

pub const DEFAULT_PROTOCOLS_PATH: &str = "/etc/protocols";

/// Protocols known even when no database file can be read
const BUILTIN_PROTOCOLS: &[(&str, u8, &[&str])] = &[
    ("ip", 0, &["IP"]),
    ("icmp", 1, &["ICMP"]),
    ("igmp", 2, &["IGMP"]),
    ("tcp", 6, &["TCP"]),
    ("udp", 17, &["UDP"]),
    ("ipv6", 41, &["IPv6"]),
    ("gre", 47, &["GRE"]),
    ("esp", 50, &["IPSEC-ESP"]),
    ("ah", 51, &["IPSEC-AH"]),
    ("ipv6-icmp", 58, &["IPv6-ICMP"]),
    ("sctp", 132, &["SCTP"]),
    ("udplite", 136, &["UDPLite"]),
];

/// One protocol of the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoEntry {
    pub name: String,
    pub number: u8,
    pub aliases: Vec<String>,
}

/// Protocol name to number mapping. Lookups by name are case-sensitive and also match aliases.
#[derive(Debug, Clone, Default)]
pub struct ProtocolDb {
    entries: Vec<ProtoEntry>,
    by_name: HashMap<String, usize>,
}

impl ProtocolDb {
    fn add(&mut self, entry: ProtoEntry) {
        let index = self.entries.len();
        for name in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
            self.by_name.entry(name.clone()).or_insert(index);
        }
        self.entries.push(entry);
    }

    /// Build a database from text in the `/etc/protocols` format. Lines that cannot be parsed
    /// are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut db = Self::default();
        for line in text.lines() {
            let mut words = words(line);
            let (Some(name), Some(number)) = (words.next(), words.next()) else {
                continue;
            };
            let Ok(number) = number.parse::<u8>() else {
                debug!("Skipping protocol entry '{name}' with bad number '{number}'");
                continue;
            };
            db.add(ProtoEntry {
                name: name.to_owned(),
                number,
                aliases: words.map(str::to_owned).collect(),
            });
        }
        db
    }

    /// The protocols every Linux system knows about.
    #[must_use]
    pub fn builtin() -> Self {
        let mut db = Self::default();
        for (name, number, aliases) in BUILTIN_PROTOCOLS {
            db.add(ProtoEntry {
                name: (*name).to_owned(),
                number: *number,
                aliases: aliases.iter().map(|a| (*a).to_owned()).collect(),
            });
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

    /// Load the database from a file, or use the built-in table if it cannot be read.
    #[must_use]
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(db) => db,
            Err(e) => {
                warn!("{e}; using built-in protocol table");
                Self::builtin()
            }
        }
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ProtoEntry> {
        self.by_name.get(name).map(|index| &self.entries[*index])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
