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

use zbus::zvariant::OwnedObjectPath;
use zbus::{Result, proxy};

#[proxy(
    default_service = "org.sirc.driver",
    interface = "org.sirc.driver.manager",
    default_path = "/org/sirc/driver"
)]
pub trait Manager {
    /// Open a session to the accelerator at `fpga_id`. Returns the session object path and
    /// the constructor's error code, 0 on success.
    async fn open(&self, fpga_id: &[u8], driver_version: u32) -> Result<(OwnedObjectPath, i32)>;
}
