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

//! Per-job diagnostic log.
//!
//! The log collects time-marked notes while a job runs. It is created by the caller,
//! handed to every step by `&mut`, and flushed by the [`reporter`](crate::reporter) when
//! the job fails. Entries are also mirrored to the `log` facade at debug level, so
//! `RUST_LOG=debug` shows them live.

use log::debug;
use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub at: Duration,
    pub message: String,
}

impl fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>8.3} ms] {}", self.at.as_secs_f64() * 1000.0, self.message)
    }
}

#[derive(Debug)]
pub struct DiagnosticLog {
    started: Instant,
    entries: Vec<DiagnosticEntry>,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticLog {
    pub fn new() -> Self {
        DiagnosticLog {
            started: Instant::now(),
            entries: Vec::new(),
        }
    }

    /// Record `message` with the time elapsed since the log was created.
    pub fn note(&mut self, message: impl Into<String>) {
        let entry = DiagnosticEntry {
            at: self.started.elapsed(),
            message: message.into(),
        };
        debug!("{entry}");
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[DiagnosticEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every pending entry to `out` and empty the log.
    pub fn flush_to(&mut self, out: &mut impl Write) -> std::io::Result<()> {
        for entry in self.entries.drain(..) {
            writeln!(out, "{entry}")?;
        }
        out.flush()
    }
}
