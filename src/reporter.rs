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

//! The single exit path for unrecoverable errors.
//!
//! Every failure of a job is fatal. The binary hands it to [`report`], which prints the
//! diagnostic once, flushes whatever the job's [`DiagnosticLog`] collected, and exits non-zero.

use crate::diagnostics::DiagnosticLog;
use log::debug;
use std::fmt::Display;
use std::io::Write;

/// Process exit status used for every reported failure.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Format `err` the way [`report`] prints it.
pub fn render(err: &impl Display) -> String {
    format!("Error:\n\t{err}")
}

/// Print `err`, flush `log` to stderr and terminate the process with [`FAILURE_EXIT_CODE`].
pub fn report(err: &impl Display, log: &mut DiagnosticLog) -> ! {
    debug!("Reporting fatal error: {err}");
    let mut stderr = std::io::stderr().lock();
    // nothing useful can be done if stderr is gone
    let _ = writeln!(stderr, "{}", render(err));
    let _ = log.flush_to(&mut stderr);
    std::process::exit(FAILURE_EXIT_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{JobError, NegotiationError};
    use crate::transport::TransportFault;

    #[test]
    fn test_render_names_step_and_code() {
        let msg = render(&JobError::ResetFailed(TransportFault::Device(3)));
        assert_eq!(msg, "Error:\n\tJobError::ResetFailed: Reset failed with code 3");
    }

    #[test]
    fn test_render_register_index() {
        let msg = render(&JobError::ParameterRegisterWriteFailed {
            index: 1,
            fault: TransportFault::Device(8),
        });
        assert!(msg.contains("Parameter register 1 write failed with code 8"));
    }

    #[test]
    fn test_render_invalid_timeout() {
        let msg = render(&NegotiationError::InvalidTimeout(0));
        assert!(msg.contains("Must be >= 1"));
    }
}
