// This file is part of sirc, a host-side harness for submitting jobs to SIRC FPGA accelerators.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// sirc is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// sirc is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

//! sirc_job - run one job on a SIRC FPGA accelerator.
//!
//! Opens a session to the accelerator, negotiates buffer limits, submits the PUF challenge
//! in [`challenge`], waits for the run to finish and prints the response. Any failure is
//! printed with the step that failed and the driver's error code, and the process exits
//! with a non-zero status.
//!
//! # Usage
//!
//! ```bash
//! # Default hardware address AA:AA:AA:AA:AA:AA, 10 s wait
//! sirc_job
//!
//! # Explicit hardware address and wait timeout
//! sirc_job --mac 00:0A:35:01:02:03 --wait-timeout 30
//!
//! # No hardware: run against the simulated accelerator, then dump the job's log
//! sirc_job --loopback --print-log
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (`trace`, `debug`, `info`, `warn`, `error`
//!   or `off`). Defaults to `info`

mod challenge;

use clap::Parser;
use log::{debug, warn};
use sirc::diagnostics::DiagnosticLog;
use sirc::error::HarnessError;
use sirc::identity::DeviceIdentifier;
use sirc::job::{JobRequest, submit};
use sirc::offset::JobOutput;
use sirc::reporter::report;
use sirc::transport::dbus::{Bus, DbusConnector};
use sirc::transport::loopback::{LoopbackAccelerator, LoopbackConnector};

#[derive(Parser, Debug)]
#[command(name = "sirc_job")]
#[command(bin_name = "sirc_job")]
#[command(about = "Run one job on a SIRC FPGA accelerator")]
struct Cli {
    #[arg(
        long = "mac",
        value_name = "X:X:X:X:X:X",
        help = r#"hardware address of the accelerator.
Defaults to AA:AA:AA:AA:AA:AA."#
    )]
    mac: Option<String>,
    #[arg(
        long = "wait-timeout",
        value_name = "SECS",
        help = r#"seconds to wait for the accelerator to finish, must be >= 1.
Also used as the driver's read and write timeout. Defaults to 10."#
    )]
    wait_timeout: Option<u32>,
    #[arg(
        long = "loopback",
        help = "run against the in-process simulated accelerator instead of the driver"
    )]
    loopback: bool,
    #[arg(
        long = "session-bus",
        conflicts_with = "loopback",
        help = "reach the SIRC driver on the session bus instead of the system bus"
    )]
    session_bus: bool,
    #[arg(
        long = "print-log",
        help = "print the job's diagnostic log after a successful run"
    )]
    print_log: bool,
}

fn run(
    cli: &Cli,
    identifier: DeviceIdentifier,
    request: &JobRequest,
    log: &mut DiagnosticLog,
) -> Result<JobOutput, HarnessError> {
    if cli.loopback {
        let mut connector = LoopbackConnector::new(LoopbackAccelerator::new());
        return submit(&mut connector, identifier, cli.wait_timeout, request, log);
    }
    let bus = match cli.session_bus {
        true => Bus::Session,
        false => Bus::System,
    };
    submit(
        &mut DbusConnector::new(bus),
        identifier,
        cli.wait_timeout,
        request,
        log,
    )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    debug!("parsed cli command with {cli:?}");

    let mut log = DiagnosticLog::new();
    let identifier = match DeviceIdentifier::resolve(cli.mac.as_deref()) {
        Ok(id) => id,
        Err(e) => report(&e, &mut log),
    };
    if cli.mac.is_some() {
        println!("destination MAC: {identifier}");
    }
    if let Some(timeout) = cli.wait_timeout.filter(|&t| t >= 1) {
        println!("Allowed a waitTimeOut of : {timeout} secs");
    }

    let request = challenge::puf_request();
    println!("{}", challenge::configuration_message());

    match run(&cli, identifier, &request, &mut log) {
        Ok(output) => {
            println!("{}", challenge::response_message(output.results()));
            println!(
                "Operation complete !\tExecuted in {} ms",
                output.elapsed().as_millis()
            );
            if cli.print_log {
                if let Err(e) = log.flush_to(&mut std::io::stdout().lock()) {
                    warn!("Unable to print the diagnostic log: {e}");
                }
            }
        }
        Err(e) => report(&e, &mut log),
    }
}
