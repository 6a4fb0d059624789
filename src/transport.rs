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

//! Transport abstraction for talking to a SIRC accelerator.
//!
//! The harness never touches frames or ioctls itself. Everything it needs from the driver
//! is captured by two traits:
//! - [`Connector`] - Opens a session to the accelerator with a given hardware address
//! - [`Transport`] - The per-session command set (parameters, reset, register writes,
//!   buffer transfers, run and completion wait)
//!
//! Two implementations ship with the crate:
//! - [`dbus::DbusConnector`] - Reaches the SIRC driver service over D-Bus
//! - [`loopback::LoopbackConnector`] - In-process simulated accelerator
//!
//! Every command either succeeds or fails with a [`TransportFault`]. A fault carries the
//! driver's last reported error code when the device refused the command, or a message
//! when the channel to the driver itself broke.

pub mod dbus;
pub mod loopback;

use crate::error::ConstructionError;
use crate::identity::DeviceIdentifier;

/// Transport limits and timeouts governing one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionParameters {
    pub max_input_data_bytes: u32,
    pub max_output_data_bytes: u32,
    pub write_timeout: u32,
    pub read_timeout: u32,
}

impl SessionParameters {
    /// Largest buffer that fits both directions: `min(max_input_data_bytes, max_output_data_bytes)`.
    pub fn limit(&self) -> u32 {
        self.max_input_data_bytes.min(self.max_output_data_bytes)
    }

    pub(crate) fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (
            self.max_input_data_bytes,
            self.max_output_data_bytes,
            self.write_timeout,
            self.read_timeout,
        )
    }

    pub(crate) fn from_tuple(t: (u32, u32, u32, u32)) -> Self {
        SessionParameters {
            max_input_data_bytes: t.0,
            max_output_data_bytes: t.1,
            write_timeout: t.2,
            read_timeout: t.3,
        }
    }
}

/// Why a transport command did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFault {
    /// The driver refused the command and reported this error code.
    #[error("code {0}")]
    Device(i32),
    /// The driver could not be reached.
    #[error("link error: {0}")]
    Link(String),
}

impl TransportFault {
    pub fn code(&self) -> Option<i32> {
        match self {
            TransportFault::Device(code) => Some(*code),
            TransportFault::Link(_) => None,
        }
    }
}

/// Command set of one open accelerator session.
///
/// All calls block until the driver answers. Implementations report failures as
/// [`TransportFault`]s and never retry on their own.
pub trait Transport {
    /// Error code of the last failed command, 0 if none failed.
    fn last_error_code(&self) -> i32;

    /// Read the session parameters currently in effect.
    fn get_parameters(&mut self) -> Result<SessionParameters, TransportFault>;

    /// Commit new session parameters.
    fn set_parameters(&mut self, params: &SessionParameters) -> Result<(), TransportFault>;

    /// Soft reset of the user circuit.
    fn send_reset(&mut self) -> Result<(), TransportFault>;

    /// Write `value` to parameter register `index`.
    fn send_param_register_write(&mut self, index: u8, value: u32) -> Result<(), TransportFault>;

    /// Write `data` into the input memory starting at `address`.
    fn send_write(&mut self, address: u32, data: &[u8]) -> Result<(), TransportFault>;

    /// Raise the run signal.
    fn send_run(&mut self) -> Result<(), TransportFault>;

    /// Block until the circuit signals completion or `timeout_secs` elapse.
    fn wait_done(&mut self, timeout_secs: u32) -> Result<(), TransportFault>;

    /// Read `length` bytes of output memory starting at `address`.
    fn send_read(&mut self, address: u32, length: u32) -> Result<Vec<u8>, TransportFault>;

    /// Release the session. Further commands are undefined.
    fn close(&mut self);
}

/// Opens sessions to an accelerator.
pub trait Connector {
    type Session: Transport;

    /// Open a session to the accelerator at `identifier`.
    ///
    /// # Arguments
    ///
    /// * `identifier` - Hardware address of the accelerator
    /// * `driver_version` - Version hint for the driver, 0 for "any"
    ///
    /// # Returns: `Result<Self::Session, ConstructionError>`
    /// * `Ok(Session)` - Session ready for parameter negotiation
    /// * `Err(ConstructionError::DriverUnavailable)` - No driver could be reached
    /// * `Err(ConstructionError::Failed)` - Driver reported an error while constructing the session
    fn open(
        &mut self,
        identifier: DeviceIdentifier,
        driver_version: u32,
    ) -> Result<Self::Session, ConstructionError>;
}
