// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tracing setup.
//!
//! Log output goes to stderr so that stdout only carries the report. Levels are configured with a
//! string of comma-separated `tag=level` items, where a tag names one of the crates of the
//! workspace.

use std::str::FromStr;

use ordermap::OrderMap;
use tracing_subscriber::filter::{LevelFilter, ParseError};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Tags that can be configured and the tracing target each one controls
pub const TAGS: &[(&str, &str)] = &[
    ("conntrack", "natstat_conntrack"),
    ("netdb", "natstat_netdb"),
    ("nat", "natstat_nat"),
    ("natstat", "natstat"),
];

#[derive(Debug, thiserror::Error)]
pub enum TracingConfigError {
    #[error("invalid syntax '{0}': it should be tag=loglevel")]
    Syntax(String),
    #[error("invalid level {level}: {reason}")]
    Level { level: String, reason: String },
    #[error("unknown tag '{0}'")]
    UnknownTag(String),
    #[error("invalid directive: {0}")]
    Directive(#[from] ParseError),
    #[error("failed to initialize tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Default level plus per-tag overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    default: LevelFilter,
    tags: OrderMap<&'static str, LevelFilter>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default: LevelFilter::WARN,
            tags: OrderMap::new(),
        }
    }
}

fn known_tag(tag: &str) -> Option<&'static str> {
    TAGS.iter().find(|(name, _)| *name == tag).map(|(name, _)| *name)
}

impl TracingConfig {
    /// Parse a string made of comma-separated tag=level, where level is one of
    /// off,error,warn,info,debug,trace.
    /// `default=level` sets the default level and `all=level` sets the level of every tag.
    /// Tags are applied after `all`, which allows configs like `default=error,all=info,nat=debug`.
    ///
    /// # Errors
    ///
    /// Fails if an item is not of the form tag=level, the level is invalid or the tag unknown.
    pub fn parse(input: &str) -> Result<Self, TracingConfigError> {
        let mut items: OrderMap<String, LevelFilter> = OrderMap::new();
        for item in input.split(',') {
            let item = item.trim();
            let Some((tag, level)) = item.split_once('=') else {
                return Err(TracingConfigError::Syntax(item.to_string()));
            };
            let level =
                LevelFilter::from_str(level.trim()).map_err(|e| TracingConfigError::Level {
                    level: level.trim().to_string(),
                    reason: e.to_string(),
                })?;
            items.insert(tag.trim().to_string(), level);
        }

        let mut config = Self::default();
        if let Some(level) = items.get("default") {
            config.default = *level;
        }
        if let Some(level) = items.get("all") {
            for (tag, _) in TAGS {
                config.tags.insert(*tag, *level);
            }
        }
        for (tag, level) in &items {
            if tag == "default" || tag == "all" {
                continue;
            }
            let tag = known_tag(tag).ok_or_else(|| TracingConfigError::UnknownTag(tag.clone()))?;
            config.tags.insert(tag, *level);
        }
        Ok(config)
    }

    #[must_use]
    pub fn default_level(&self) -> LevelFilter {
        self.default
    }

    #[must_use]
    pub fn tag_level(&self, tag: &str) -> Option<LevelFilter> {
        self.tags.get(tag).copied()
    }

    /// Build the filter for this configuration.
    ///
    /// # Errors
    ///
    /// Fails if a directive cannot be parsed, which would be a bug in the tag table.
    pub fn env_filter(&self) -> Result<EnvFilter, TracingConfigError> {
        let mut filter = EnvFilter::new(self.default.to_string());
        for (tag, level) in &self.tags {
            if let Some((_, target)) = TAGS.iter().find(|(name, _)| name == tag) {
                filter = filter.add_directive(format!("{target}={level}").parse()?);
            }
        }
        Ok(filter)
    }

    /// Generate a config string equivalent to this configuration
    #[must_use]
    pub fn as_config_string(&self) -> String {
        let mut out = format!("default={}", self.default);
        for (tag, level) in &self.tags {
            out += format!(",{tag}={level}").as_str();
        }
        out
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a subscriber was already installed.
pub fn init(config: &TracingConfig) -> Result<(), TracingConfigError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}
