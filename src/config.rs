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

//! Compile-time configuration shared by the harness and the accelerator build.
//!
//! The buffer sizes below are a contract with the hardware design: the accelerator's
//! input and output memories are synthesized with exactly these capacities and nothing
//! at runtime can discover them. If the bitstream is rebuilt with different buffers,
//! these constants must change with it.

/// Capacity of the accelerator's input memory in bytes (2**17, 128 KiB).
pub const MAX_INPUT_DATA_BYTES: u32 = 1 << 17;

/// Capacity of the accelerator's output memory in bytes (2**13, 8 KiB).
pub const MAX_OUTPUT_DATA_BYTES: u32 = 1 << 13;

/// Seconds to wait for the run to complete when the user does not override it.
pub const DEFAULT_WAIT_TIMEOUT_SECS: u32 = 10;

/// Hardware address used when none is given on the command line.
pub const DEFAULT_FPGA_ID: [u8; 6] = [0xAA; 6];

/// Driver version hint handed to the driver when a session is opened. 0 lets the driver pick.
pub const DRIVER_VERSION: u32 = 0;

/// Well-known bus name of the SIRC driver service.
pub static DRIVER_SERVICE: &str = "org.sirc.driver";
