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

//! The PUF challenge job.
//!
//! The reference bitstream is an arbiter PUF. It takes:
//! - Param register 0 - Operand A
//! - Param register 1 - Operand B
//! - Input buffer - 128 configuration bits, 64 for the top delay line and 64 for the bottom one
//! - Output - 16-bit response
//!
//! The challenge below is the one the bitstream was characterised with.

use sirc::job::{JobRequest, ParamRegister};

/// Configuration bytes of the top delay line.
pub const CONFIG_TOP: [u8; 8] = [0, 2, 0, 0, 0, 0, 0, 0];
/// Configuration bytes of the bottom delay line.
pub const CONFIG_BOTTOM: [u8; 8] = [0, 0, 0, 0, 0, 0, 255, 255];

pub const OPERAND_A: u32 = 0xffff_ffff;
pub const OPERAND_B: u32 = 0x0000_0000;

/// Input bytes written per job.
pub const WRITE_OPERATIONS: u32 = 16;
/// Response bytes read back per job.
pub const RESPONSE_BYTES: usize = 2;

pub fn puf_request() -> JobRequest {
    let mut payload = Vec::with_capacity(CONFIG_TOP.len() + CONFIG_BOTTOM.len());
    payload.extend_from_slice(&CONFIG_TOP);
    payload.extend_from_slice(&CONFIG_BOTTOM);
    JobRequest {
        params: vec![
            ParamRegister {
                index: 0,
                value: OPERAND_A,
            },
            ParamRegister {
                index: 1,
                value: OPERAND_B,
            },
        ],
        payload,
        operation_count: WRITE_OPERATIONS,
        result_count: RESPONSE_BYTES,
    }
}

fn join(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human readable dump of the challenge configuration.
pub fn configuration_message() -> String {
    format!(
        "Configuration for TOP line:    {}\n\
         Configuration for BOTTOM line: {}",
        join(&CONFIG_TOP),
        join(&CONFIG_BOTTOM)
    )
}

/// Human readable dump of the response bytes.
pub fn response_message(results: &[u8]) -> String {
    format!("The responses are : {}", join(results))
}
