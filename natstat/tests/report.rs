// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! End-to-end reports over a captured conntrack table. The router is 198.51.100.1, in front of
//! the 192.168.1.0/24 network.

use std::net::IpAddr;
use std::path::PathBuf;

use args::{CmdArgs, Parser};
use conntrack::SnapshotError;
use natstat::{NatstatError, ReportConfig, Reporter};
use netdb::{ResolveError, Resolver};
use pretty_assertions::assert_eq;

struct NoNames;
impl Resolver for NoNames {
    fn reverse(&self, addr: IpAddr) -> Result<Vec<String>, ResolveError> {
        Err(ResolveError::NotFound(addr))
    }
}

fn fixture(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name]
        .iter()
        .collect();
    path.to_string_lossy().into_owned()
}

fn config(extra: &[&str]) -> ReportConfig {
    let snapshot = fixture("nf_conntrack");
    let services = fixture("services");
    let mut argv = vec![
        "natstat",
        "--snapshot",
        snapshot.as_str(),
        "--services",
        services.as_str(),
        "--protocols",
        "/nonexistent/protocols",
        "--local-address",
        "198.51.100.1,192.168.1.1",
    ];
    argv.extend_from_slice(extra);
    ReportConfig::from(&CmdArgs::try_parse_from(argv).unwrap())
}

fn report(config: &ReportConfig) -> Result<String, NatstatError> {
    let reporter = Reporter::from_config(config)?;
    let mut out = Vec::new();
    reporter.run(&reporter.source(), &NoNames, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn words(text: &str) -> Vec<Vec<&str>> {
    text.lines().map(|l| l.split_whitespace().collect()).collect()
}

#[test]
fn test_translated_connections() {
    let text = report(&config(&[])).unwrap();
    assert_eq!(
        words(&text),
        vec![
            vec!["Proto", "Source", "Address", "Destination", "Address", "State"],
            vec!["tcp", "192.168.1.20:41000", "93.184.216.34:https", "ESTABLISHED"],
            vec!["tcp", "203.0.113.50:52000", "198.51.100.1:http-alt", "SYN_RECV"],
        ]
    );
}

#[test]
fn test_nat_box() {
    let text = report(&config(&["-N", "-n", "-o", "-r", "dst-port"])).unwrap();
    assert_eq!(
        words(&text),
        vec![
            vec![
                "tcp",
                "192.168.1.20:41000",
                "93.184.216.34:443",
                "ESTABLISHED",
                "198.51.100.1"
            ],
            vec![
                "tcp",
                "203.0.113.50:52000",
                "198.51.100.1:8080",
                "SYN_RECV",
                "192.168.1.30"
            ],
        ]
    );
}

#[test]
fn test_local_connections() {
    let text = report(&config(&["-L", "-o"])).unwrap();
    assert_eq!(
        words(&text),
        vec![vec!["udp", "192.168.1.20:53000", "198.51.100.1:domain"]]
    );
}

#[test]
fn test_routed_connections() {
    let text = report(&config(&["-R", "-o"])).unwrap();
    assert_eq!(
        words(&text),
        vec![
            vec!["icmp", "192.168.1.21:0", "10.9.9.9:0"],
            vec!["tcp", "[2001:db8::1]:40000", "[2001:db8::2]:https", "ESTABLISHED"],
        ]
    );

    let text = report(&config(&["-R", "-o", "-p", "icmp"])).unwrap();
    assert_eq!(text.lines().count(), 1);
}

#[test]
fn test_last_category_wins() {
    let text = report(&config(&["-S", "-D", "-o"])).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("tcp"));
    assert!(text.contains("203.0.113.50:52000"));
}

#[test]
fn test_repeated_flags() {
    let text = report(&config(&["-S", "-S", "-o", "-o"])).unwrap();
    assert_eq!(
        words(&text),
        vec![vec!["tcp", "192.168.1.20:41000", "93.184.216.34:https", "ESTABLISHED"]]
    );
}

#[test]
fn test_address_filters() {
    let text = report(&config(&["-o", "-s", "192.168.1.20"])).unwrap();
    assert_eq!(text.lines().count(), 1);
    let text = report(&config(&["-o", "-s", "192.168.1.20", "-d", "198.51.100.1"])).unwrap();
    assert!(text.is_empty());
}

#[test]
fn test_missing_table() {
    let mut config = config(&[]);
    config.snapshot = Some(PathBuf::from("/nonexistent/nf_conntrack"));
    let err = report(&config).unwrap_err();
    assert!(matches!(err, NatstatError::Snapshot(SnapshotError::Io { .. })));
    assert!(err.to_string().contains("/nonexistent/nf_conntrack"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_malformed_table() {
    let path = std::env::temp_dir().join(format!("natstat-malformed-{}", std::process::id()));
    std::fs::write(&path, "ipv4 2 tcp 6 10 ESTABLISHED src=1.1.1.1 dst=nope\n").unwrap();
    let mut config = config(&[]);
    config.snapshot = Some(path.clone());
    let err = report(&config).unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(err, NatstatError::Snapshot(SnapshotError::Parse { .. })));
}
