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

//! Result offset correction.
//!
//! The accelerator's output memory does not start where the host expects it to. Because of
//! a defect in the hardware design, the first result byte lands at physical address 1 and
//! address 0 holds whatever the circuit left there. The host compensates by reading one
//! byte more than it needs, starting at address 0, and dropping the first byte.
//!
//! This is a permanent property of the current bitstream, not something detected at
//! runtime. Do not remove it without a hardware revision that moves results back to
//! address 0; `test_two_results_need_three_bytes` pins the behaviour down.

use std::time::Duration;

/// Physical address of the first result byte in output memory.
pub const RESULT_OFFSET: usize = 1;

/// Number of bytes to read from address 0 to obtain `result_count` results, `None` when
/// that does not fit in a `usize`.
pub const fn read_length(result_count: usize) -> Option<usize> {
    result_count.checked_add(RESULT_OFFSET)
}

/// Raw output buffer of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutput {
    raw: Vec<u8>,
    elapsed: Duration,
}

impl JobOutput {
    /// Wrap a buffer read from address 0. `raw` is expected to be `read_length(n)` bytes long.
    pub fn new(raw: Vec<u8>, elapsed: Duration) -> Self {
        JobOutput { raw, elapsed }
    }

    /// The discard slot at physical address 0.
    pub fn padding(&self) -> &[u8] {
        &self.raw[..RESULT_OFFSET.min(self.raw.len())]
    }

    /// Logical results, physical addresses `1..=N`.
    pub fn results(&self) -> &[u8] {
        self.raw.get(RESULT_OFFSET..).unwrap_or(&[])
    }

    /// Everything read back, padding included.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Wall-clock time from reset to the end of the read-back.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
