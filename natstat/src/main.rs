// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(rustdoc::all)]
#![allow(rustdoc::missing_crate_level_docs)]

use std::process::ExitCode;

use args::{CmdArgs, Parser};
use natstat::logging::{self, TracingConfig};
use natstat::{NatstatError, ReportConfig, Reporter};
use netdb::SystemResolver;
use tracing::{debug, info};

fn init_tracing(args: &CmdArgs) -> Result<(), NatstatError> {
    let tracing = match args.tracing() {
        Some(config) => TracingConfig::parse(config)?,
        None => TracingConfig::default(),
    };
    logging::init(&tracing)?;
    debug!("Tracing config: {}", tracing.as_config_string());
    Ok(())
}

fn report(config: &ReportConfig) -> Result<usize, NatstatError> {
    let reporter = Reporter::from_config(config)?;
    let source = reporter.source();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    reporter.run(&source, &SystemResolver, &mut out)
}

fn run(args: &CmdArgs) -> Result<usize, NatstatError> {
    init_tracing(args)?;
    let config = ReportConfig::from(args);
    info!("{config}");
    report(&config)
}

fn main() -> ExitCode {
    /* parse cmd line args */
    let args = CmdArgs::parse();

    match run(&args) {
        Ok(count) => {
            info!("Reported {count} flows");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("natstat: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
