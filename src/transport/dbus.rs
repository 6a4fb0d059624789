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

//! SIRC driver access over D-Bus.
//!
//! The Ethernet SIRC driver runs as a system service and owns the raw link to the
//! accelerator. This module talks to it through blocking `zbus` proxies, so every
//! [`Transport`] call is a single synchronous method call.
//!
//! # DBus Service Information
//!
//! - **Service Name**: `org.sirc.driver`
//! - **Manager Interface**: `org.sirc.driver.manager` at `/org/sirc/driver`
//!   - `Open(ay fpga_id, u driver_version) -> (o session, i code)`
//! - **Session Interface**: `org.sirc.driver.session` at the path returned by `Open`
//!   - one method per [`Transport`] command; commands answer `b`, `false` meaning the
//!     driver's `LastError()` holds the reason
//!
//! A `false` answer becomes [`TransportFault::Device`] with the code from `LastError()`.
//! A failed method call becomes [`TransportFault::Link`].

pub mod manager_proxy;
pub mod session_proxy;

use crate::config;
use crate::error::ConstructionError;
use crate::identity::DeviceIdentifier;
use crate::transport::{Connector, SessionParameters, Transport, TransportFault};
use log::{trace, warn};
use manager_proxy::ManagerProxyBlocking;
use session_proxy::SessionProxyBlocking;
use zbus::blocking::Connection;
use zbus::proxy::CacheProperties;

/// Which message bus the driver service lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bus {
    #[default]
    System,
    Session,
}

/// Opens sessions through the SIRC driver service.
#[derive(Debug, Clone, Default)]
pub struct DbusConnector {
    bus: Bus,
}

impl DbusConnector {
    pub fn new(bus: Bus) -> Self {
        DbusConnector { bus }
    }

    fn connect(&self) -> zbus::Result<Connection> {
        match self.bus {
            Bus::System => Connection::system(),
            Bus::Session => Connection::session(),
        }
    }
}

fn unavailable(e: zbus::Error) -> ConstructionError {
    ConstructionError::DriverUnavailable(format!("{} on {e}", config::DRIVER_SERVICE))
}

impl Connector for DbusConnector {
    type Session = DbusSession;

    fn open(
        &mut self,
        identifier: DeviceIdentifier,
        driver_version: u32,
    ) -> Result<Self::Session, ConstructionError> {
        trace!("Connecting to {:?} bus", self.bus);
        let connection = self.connect().map_err(unavailable)?;
        let manager = ManagerProxyBlocking::new(&connection).map_err(unavailable)?;
        let (path, code) = manager
            .open(&identifier.bytes(), driver_version)
            .map_err(unavailable)?;
        if code != 0 {
            return Err(ConstructionError::Failed { code });
        }
        trace!("Driver opened session {path:?}");

        let proxy = SessionProxyBlocking::builder(&connection)
            .path(path)
            .and_then(|b| b.cache_properties(CacheProperties::No).build())
            .map_err(unavailable)?;
        Ok(DbusSession {
            proxy,
            last_error: 0,
        })
    }
}

/// One open session on the driver service.
pub struct DbusSession {
    proxy: SessionProxyBlocking<'static>,
    last_error: i32,
}

/// Turn a command's `b` answer into a transport result, asking for the error code only
/// when the driver said no.
fn fault_from_reply(
    reply: zbus::Result<bool>,
    last_error: impl FnOnce() -> zbus::Result<i32>,
) -> Result<(), TransportFault> {
    match reply {
        Ok(true) => Ok(()),
        Ok(false) => match last_error() {
            Ok(code) => Err(TransportFault::Device(code)),
            Err(e) => Err(TransportFault::Link(e.to_string())),
        },
        Err(e) => Err(TransportFault::Link(e.to_string())),
    }
}

impl DbusSession {
    fn check(&mut self, reply: zbus::Result<bool>) -> Result<(), TransportFault> {
        let res = fault_from_reply(reply, || self.proxy.last_error());
        if let Err(TransportFault::Device(code)) = res {
            self.last_error = code;
        }
        res
    }
}

impl Transport for DbusSession {
    fn last_error_code(&self) -> i32 {
        self.last_error
    }

    fn get_parameters(&mut self) -> Result<SessionParameters, TransportFault> {
        let (ok, params) = self
            .proxy
            .get_parameters()
            .map_err(|e| TransportFault::Link(e.to_string()))?;
        self.check(Ok(ok))?;
        Ok(SessionParameters::from_tuple(params))
    }

    fn set_parameters(&mut self, params: &SessionParameters) -> Result<(), TransportFault> {
        let reply = self.proxy.set_parameters(params.as_tuple());
        self.check(reply)
    }

    fn send_reset(&mut self) -> Result<(), TransportFault> {
        let reply = self.proxy.send_reset();
        self.check(reply)
    }

    fn send_param_register_write(&mut self, index: u8, value: u32) -> Result<(), TransportFault> {
        let reply = self.proxy.send_param_register_write(index, value);
        self.check(reply)
    }

    fn send_write(&mut self, address: u32, data: &[u8]) -> Result<(), TransportFault> {
        trace!("Writing {} bytes at {address}", data.len());
        let reply = self.proxy.send_write(address, data);
        self.check(reply)
    }

    fn send_run(&mut self) -> Result<(), TransportFault> {
        let reply = self.proxy.send_run();
        self.check(reply)
    }

    fn wait_done(&mut self, timeout_secs: u32) -> Result<(), TransportFault> {
        let reply = self.proxy.wait_done(timeout_secs);
        self.check(reply)
    }

    fn send_read(&mut self, address: u32, length: u32) -> Result<Vec<u8>, TransportFault> {
        trace!("Reading {length} bytes at {address}");
        let (ok, data) = self
            .proxy
            .send_read(address, length)
            .map_err(|e| TransportFault::Link(e.to_string()))?;
        self.check(Ok(ok))?;
        Ok(data)
    }

    fn close(&mut self) {
        if let Err(e) = self.proxy.close() {
            warn!("Closing SIRC session failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_reply_is_ok_without_asking_for_code() {
        let res = fault_from_reply(Ok(true), || panic!("LastError must not be called"));
        assert_eq!(res, Ok(()));
    }

    #[test]
    fn test_false_reply_carries_last_error() {
        let res = fault_from_reply(Ok(false), || Ok(17));
        assert_eq!(res, Err(TransportFault::Device(17)));
    }

    #[test]
    fn test_bus_error_is_link_fault() {
        let res = fault_from_reply(Err(zbus::Error::Failure("no reply".into())), || Ok(0));
        assert!(matches!(res, Err(TransportFault::Link(m)) if m.contains("no reply")));
    }

    #[test]
    fn test_failed_code_lookup_is_link_fault() {
        let res = fault_from_reply(Ok(false), || Err(zbus::Error::Failure("gone".into())));
        assert!(matches!(res, Err(TransportFault::Link(_))));
    }
}
