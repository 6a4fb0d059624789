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

//! sirc - host-side job submission for SIRC FPGA accelerators.
//!
//! A SIRC (Simple Interface for Reconfigurable Computing) accelerator is an FPGA design that
//! exposes parameter registers, an input memory, an output memory and a run/done handshake
//! to a host over a byte-oriented link. This crate drives exactly one job through such a
//! device per invocation:
//!
//! 1. Resolve the device's hardware address ([`identity`])
//! 2. Open a session through a [`transport::Connector`]
//! 3. Negotiate buffer limits and timeouts ([`negotiate`])
//! 4. Reset, write parameter registers, write input, run, wait, read back ([`job`])
//! 5. Strip the hardware's result offset ([`offset`])
//! 6. Close the session
//!
//! Any failure along the way is fatal and is reported through [`reporter`] together with
//! the job's [`diagnostics::DiagnosticLog`].
//!
//! # Transports
//!
//! - [`transport::dbus`] - The SIRC driver service on D-Bus
//! - [`transport::loopback`] - An in-process simulated accelerator
//!
//! # Configuration
//!
//! Buffer sizes and defaults live in [`config`]. The buffer sizes must match the
//! accelerator's bitstream; see the module documentation.
//!
//! # Environment Variables
//!
//! Logging goes through the `log` facade. Binaries using this crate are expected to
//! install `env_logger`, so `RUST_LOG` controls verbosity.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod job;
pub mod negotiate;
pub mod offset;
pub mod reporter;
pub mod transport;
