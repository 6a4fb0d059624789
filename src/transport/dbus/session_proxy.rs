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

use zbus::{Result, proxy};

#[proxy(default_service = "org.sirc.driver", interface = "org.sirc.driver.session")]
pub trait Session {
    async fn last_error(&self) -> Result<i32>;
    async fn get_parameters(&self) -> Result<(bool, (u32, u32, u32, u32))>;
    async fn set_parameters(&self, params: (u32, u32, u32, u32)) -> Result<bool>;
    async fn send_reset(&self) -> Result<bool>;
    async fn send_param_register_write(&self, index: u8, value: u32) -> Result<bool>;
    async fn send_write(&self, address: u32, data: &[u8]) -> Result<bool>;
    async fn send_run(&self) -> Result<bool>;
    async fn wait_done(&self, timeout_secs: u32) -> Result<bool>;
    async fn send_read(&self, address: u32, length: u32) -> Result<(bool, Vec<u8>)>;
    async fn close(&self) -> Result<()>;
}
