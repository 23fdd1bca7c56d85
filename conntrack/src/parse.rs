// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Parser for the textual conntrack table exposed under `/proc`.
//!
//! A line looks like
//!
//! ```text
//! ipv4     2 tcp      6 431999 ESTABLISHED src=10.0.0.5 dst=93.184.216.34 sport=5000 dport=80 \
//!     src=93.184.216.34 dst=203.0.113.9 sport=80 dport=5000 [ASSURED] mark=0 zone=0 use=2
//! ```
//!
//! The leading family columns are absent in the legacy `ip_conntrack` format. The state word only
//! exists for stateful protocols. The first `src`/`dst`/`sport`/`dport` group describes the
//! original direction, the second one the reply direction.

use std::net::IpAddr;
use std::str::FromStr;

use tracing::trace;

use crate::flow::{EndpointTuple, Flow, FlowStatus, L3Family, Protocol};

/// Errors found while parsing the conntrack table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("invalid {field} value '{value}'")]
    InvalidValue { field: &'static str, value: String },
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        source: Box<ParseError>,
    },
}

fn parse_value<T: FromStr>(field: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        field,
        value: value.to_owned(),
    })
}

/// Fields of one line, collected in order of appearance
#[derive(Default)]
struct Fields<'a> {
    state: Option<&'a str>,
    src: Vec<&'a str>,
    dst: Vec<&'a str>,
    sport: Vec<&'a str>,
    dport: Vec<&'a str>,
    status: FlowStatus,
}

impl<'a> Fields<'a> {
    fn collect(tokens: impl Iterator<Item = &'a str>) -> Self {
        let mut fields = Fields::default();
        let mut seen_kv = false;
        for token in tokens {
            if let Some(marker) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
                if let Some(flag) = FlowStatus::from_marker(marker) {
                    fields.status |= flag;
                }
            } else if let Some((key, value)) = token.split_once('=') {
                seen_kv = true;
                match key {
                    "src" => fields.src.push(value),
                    "dst" => fields.dst.push(value),
                    "sport" => fields.sport.push(value),
                    "dport" => fields.dport.push(value),
                    _ => {}
                }
            } else if !seen_kv && fields.state.is_none() {
                fields.state = Some(token);
            }
        }
        fields
    }

    fn port(ports: &[&str], index: usize, field: &'static str) -> Result<u16, ParseError> {
        ports
            .get(index)
            .map_or(Ok(0), |value| parse_value(field, value))
    }

    fn tuple(&self, index: usize) -> Result<EndpointTuple, ParseError> {
        let src = self.src.get(index).ok_or(ParseError::MissingField("src"))?;
        let dst = self.dst.get(index).ok_or(ParseError::MissingField("dst"))?;
        Ok(EndpointTuple {
            src: parse_value::<IpAddr>("src", src)?,
            dst: parse_value::<IpAddr>("dst", dst)?,
            sport: Self::port(&self.sport, index, "sport")?,
            dport: Self::port(&self.dport, index, "dport")?,
        })
    }
}

/// Parse a single line of the conntrack table.
///
/// # Errors
///
/// Returns a [`ParseError`] if a mandatory column is missing or any value cannot be parsed.
pub fn parse_line(line: &str) -> Result<Flow, ParseError> {
    let mut tokens = line.split_whitespace().peekable();

    let family = match tokens.peek() {
        Some(&first) if first == "ipv4" || first == "ipv6" => {
            let family = parse_value::<L3Family>("family", first)?;
            tokens.next();
            tokens.next().ok_or(ParseError::MissingField("l3proto"))?;
            Some(family)
        }
        _ => None,
    };

    let name = tokens.next().ok_or(ParseError::MissingField("protocol"))?;
    let number = tokens
        .next()
        .ok_or(ParseError::MissingField("protocol number"))?;
    let protocol = Protocol::new(name, parse_value("protocol number", number)?);
    let timeout = tokens.next().ok_or(ParseError::MissingField("timeout"))?;
    let timeout = parse_value("timeout", timeout)?;

    let fields = Fields::collect(tokens);
    let original = fields.tuple(0)?;
    let reply = fields.tuple(1)?;

    Ok(Flow {
        family: family.unwrap_or_else(|| L3Family::of(&original.src)),
        protocol,
        timeout,
        state: fields.state.unwrap_or_default().to_owned(),
        original,
        reply,
        status: fields.status,
    })
}

/// Parse a whole conntrack table, one entry per line. Blank lines are skipped.
///
/// # Errors
///
/// Fails on the first malformed line, with its 1-based line number.
pub fn parse_table(text: &str) -> Result<Vec<Flow>, ParseError> {
    let mut flows = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            trace!("Skipping blank line {}", n + 1);
            continue;
        }
        let flow = parse_line(line).map_err(|e| ParseError::Line {
            line: n + 1,
            source: Box::new(e),
        })?;
        flows.push(flow);
    }
    Ok(flows)
}
