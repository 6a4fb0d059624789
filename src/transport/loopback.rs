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

//! In-process simulated SIRC accelerator.
//!
//! [`LoopbackAccelerator`] behaves like a SIRC device sitting on the other end of the
//! transport: it keeps parameter registers, an input memory and an output memory sized by
//! the committed session parameters, and runs a kernel when the run signal is raised. The
//! default kernel echoes the written input back.
//!
//! Like the real bitstream, the loopback stores kernel output starting at physical address
//! [`RESULT_OFFSET`](crate::offset::RESULT_OFFSET), so the host has to apply the same
//! offset correction it applies to hardware.
//!
//! Every command is recorded in a journal, and any command can be made to fail with a
//! chosen error code, which is how the sequencing tests observe abort behaviour.
//! Handles are cheap clones sharing one device, so a test can keep a handle while the
//! harness owns the session.

use crate::error::ConstructionError;
use crate::identity::DeviceIdentifier;
use crate::offset::RESULT_OFFSET;
use crate::transport::{Connector, SessionParameters, Transport, TransportFault};
use log::{trace, warn};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// Error code for a command addressed outside the device's memories.
pub const ERR_OUT_OF_BOUNDS: i32 = 3;
/// Error code for waiting on, or reading from, a circuit that was never started.
pub const ERR_NOT_STARTED: i32 = 5;
/// Error code for a wait that ran out of time.
pub const ERR_TIMEOUT: i32 = 6;
/// Error code for any command issued after `close`.
pub const ERR_CLOSED: i32 = 9;

/// Parameters the loopback driver reports before negotiation.
pub const DRIVER_DEFAULT_PARAMETERS: SessionParameters = SessionParameters {
    max_input_data_bytes: 1 << 10,
    max_output_data_bytes: 1 << 10,
    write_timeout: 5,
    read_timeout: 5,
};

/// A command received by the loopback device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetParameters,
    SetParameters,
    Reset,
    ParamRegisterWrite(u8),
    Write,
    Run,
    WaitDone,
    Read,
    Close,
}

/// Parameter register file as seen by a kernel.
pub type Registers = BTreeMap<u8, u32>;

/// Computation performed on `send_run`. Receives the register file and the written input,
/// returns the result bytes.
pub type Kernel = Box<dyn FnMut(&Registers, &[u8]) -> Vec<u8>>;

struct Device {
    params: SessionParameters,
    registers: Registers,
    input: Vec<u8>,
    written: usize,
    output: Vec<u8>,
    started: bool,
    done: bool,
    closed: bool,
    stalled: bool,
    last_error: i32,
    kernel: Kernel,
    failures: HashMap<Operation, i32>,
    journal: Vec<Operation>,
    wait_timeouts: Vec<u32>,
}

impl Device {
    fn new() -> Self {
        let params = DRIVER_DEFAULT_PARAMETERS;
        Device {
            params,
            registers: Registers::new(),
            input: vec![0; params.max_input_data_bytes as usize],
            written: 0,
            output: vec![0; params.max_output_data_bytes as usize],
            started: false,
            done: false,
            closed: false,
            stalled: false,
            last_error: 0,
            kernel: Box::new(|_, input| input.to_vec()),
            failures: HashMap::new(),
            journal: Vec::new(),
            wait_timeouts: Vec::new(),
        }
    }

    /// Journal `op` and decide whether it may proceed.
    fn admit(&mut self, op: Operation) -> Result<(), TransportFault> {
        trace!("loopback: {op:?}");
        self.journal.push(op);
        if self.closed && op != Operation::Close {
            return self.refuse(ERR_CLOSED);
        }
        match self.failures.get(&op).copied() {
            Some(code) => self.refuse(code),
            None => Ok(()),
        }
    }

    fn refuse<T>(&mut self, code: i32) -> Result<T, TransportFault> {
        warn!("loopback: refusing {:?} with code {code}", self.journal.last());
        self.last_error = code;
        Err(TransportFault::Device(code))
    }
}

/// Handle to a simulated accelerator. Clones share the same device.
#[derive(Clone)]
pub struct LoopbackAccelerator {
    device: Rc<RefCell<Device>>,
}

impl fmt::Debug for LoopbackAccelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.device.borrow();
        f.debug_struct("LoopbackAccelerator")
            .field("params", &d.params)
            .field("registers", &d.registers)
            .field("written", &d.written)
            .field("done", &d.done)
            .field("closed", &d.closed)
            .finish_non_exhaustive()
    }
}

impl Default for LoopbackAccelerator {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackAccelerator {
    pub fn new() -> Self {
        LoopbackAccelerator {
            device: Rc::new(RefCell::new(Device::new())),
        }
    }

    /// Make every future `op` fail with `code`.
    pub fn fail_on(self, op: Operation, code: i32) -> Self {
        self.device.borrow_mut().failures.insert(op, code);
        self
    }

    /// Replace the echo kernel.
    pub fn with_kernel(self, kernel: impl FnMut(&Registers, &[u8]) -> Vec<u8> + 'static) -> Self {
        self.device.borrow_mut().kernel = Box::new(kernel);
        self
    }

    /// Never signal completion, so every wait times out.
    pub fn stalled(self) -> Self {
        self.device.borrow_mut().stalled = true;
        self
    }

    /// Every command received so far, in order, including refused ones.
    pub fn journal(&self) -> Vec<Operation> {
        self.device.borrow().journal.clone()
    }

    /// Timeouts passed to `wait_done`, in order.
    pub fn wait_timeouts(&self) -> Vec<u32> {
        self.device.borrow().wait_timeouts.clone()
    }

    pub fn parameters(&self) -> SessionParameters {
        self.device.borrow().params
    }

    pub fn registers(&self) -> Registers {
        self.device.borrow().registers.clone()
    }

    /// Bytes written to input memory, up to the highest address written.
    pub fn input(&self) -> Vec<u8> {
        let d = self.device.borrow();
        d.input[..d.written].to_vec()
    }

    pub fn is_closed(&self) -> bool {
        self.device.borrow().closed
    }
}

impl Transport for LoopbackAccelerator {
    fn last_error_code(&self) -> i32 {
        self.device.borrow().last_error
    }

    fn get_parameters(&mut self) -> Result<SessionParameters, TransportFault> {
        let mut d = self.device.borrow_mut();
        d.admit(Operation::GetParameters)?;
        Ok(d.params)
    }

    fn set_parameters(&mut self, params: &SessionParameters) -> Result<(), TransportFault> {
        let mut d = self.device.borrow_mut();
        d.admit(Operation::SetParameters)?;
        d.params = *params;
        d.input.resize(params.max_input_data_bytes as usize, 0);
        d.output.resize(params.max_output_data_bytes as usize, 0);
        d.written = d.written.min(d.input.len());
        Ok(())
    }

    fn send_reset(&mut self) -> Result<(), TransportFault> {
        let mut d = self.device.borrow_mut();
        d.admit(Operation::Reset)?;
        d.registers.clear();
        d.input.fill(0);
        d.written = 0;
        d.output.fill(0);
        d.started = false;
        d.done = false;
        Ok(())
    }

    fn send_param_register_write(&mut self, index: u8, value: u32) -> Result<(), TransportFault> {
        let mut d = self.device.borrow_mut();
        d.admit(Operation::ParamRegisterWrite(index))?;
        d.registers.insert(index, value);
        Ok(())
    }

    fn send_write(&mut self, address: u32, data: &[u8]) -> Result<(), TransportFault> {
        let mut d = self.device.borrow_mut();
        d.admit(Operation::Write)?;
        let start = address as usize;
        let end = start + data.len();
        if end > d.input.len() {
            return d.refuse(ERR_OUT_OF_BOUNDS);
        }
        d.input[start..end].copy_from_slice(data);
        d.written = d.written.max(end);
        Ok(())
    }

    fn send_run(&mut self) -> Result<(), TransportFault> {
        let mut d = self.device.borrow_mut();
        d.admit(Operation::Run)?;
        let Device {
            kernel,
            registers,
            input,
            written,
            output,
            ..
        } = &mut *d;
        let results = kernel(&*registers, &input[..*written]);

        // results land one byte in, as on the hardware
        let room = output.len().saturating_sub(RESULT_OFFSET);
        let n = results.len().min(room);
        if n > 0 {
            output[RESULT_OFFSET..RESULT_OFFSET + n].copy_from_slice(&results[..n]);
        }
        d.started = true;
        d.done = !d.stalled;
        Ok(())
    }

    fn wait_done(&mut self, timeout_secs: u32) -> Result<(), TransportFault> {
        let mut d = self.device.borrow_mut();
        d.admit(Operation::WaitDone)?;
        d.wait_timeouts.push(timeout_secs);
        if !d.started {
            return d.refuse(ERR_NOT_STARTED);
        }
        if !d.done || timeout_secs == 0 {
            return d.refuse(ERR_TIMEOUT);
        }
        Ok(())
    }

    fn send_read(&mut self, address: u32, length: u32) -> Result<Vec<u8>, TransportFault> {
        let mut d = self.device.borrow_mut();
        d.admit(Operation::Read)?;
        if !d.done {
            return d.refuse(ERR_NOT_STARTED);
        }
        let start = address as usize;
        let end = start + length as usize;
        if end > d.output.len() {
            return d.refuse(ERR_OUT_OF_BOUNDS);
        }
        Ok(d.output[start..end].to_vec())
    }

    fn close(&mut self) {
        let mut d = self.device.borrow_mut();
        // close cannot fail, but it is still journaled
        let _ = d.admit(Operation::Close);
        d.closed = true;
    }
}

/// Opens sessions on a [`LoopbackAccelerator`].
#[derive(Debug, Clone)]
pub struct LoopbackConnector {
    device: LoopbackAccelerator,
    construction_code: i32,
    opened_with: Option<(DeviceIdentifier, u32)>,
}

impl LoopbackConnector {
    pub fn new(device: LoopbackAccelerator) -> Self {
        LoopbackConnector {
            device,
            construction_code: 0,
            opened_with: None,
        }
    }

    /// Leave `code` as the device's last error after construction, which the harness
    /// must treat as a failed open.
    pub fn failing_construction(mut self, code: i32) -> Self {
        self.construction_code = code;
        self
    }

    /// Identifier and driver version of the last `open` call.
    pub fn opened_with(&self) -> Option<(DeviceIdentifier, u32)> {
        self.opened_with
    }
}

impl Connector for LoopbackConnector {
    type Session = LoopbackAccelerator;

    fn open(
        &mut self,
        identifier: DeviceIdentifier,
        driver_version: u32,
    ) -> Result<Self::Session, ConstructionError> {
        trace!("loopback: open {identifier} (driver version {driver_version})");
        self.opened_with = Some((identifier, driver_version));
        self.device.device.borrow_mut().last_error = self.construction_code;

        let session = self.device.clone();
        match session.last_error_code() {
            0 => Ok(session),
            code => Err(ConstructionError::Failed { code }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed() -> LoopbackAccelerator {
        let mut device = LoopbackAccelerator::new();
        let params = SessionParameters {
            max_input_data_bytes: 64,
            max_output_data_bytes: 16,
            write_timeout: 1,
            read_timeout: 1,
        };
        device.set_parameters(&params).unwrap();
        device
    }

    #[test]
    fn test_results_start_at_address_one() {
        let mut device = committed();
        device.send_reset().unwrap();
        device.send_write(0, &[7, 8, 9]).unwrap();
        device.send_run().unwrap();
        device.wait_done(1).unwrap();
        assert_eq!(device.send_read(0, 4).unwrap(), vec![0, 7, 8, 9]);
    }

    #[test]
    fn test_kernel_sees_registers() {
        let mut device = committed().with_kernel(|regs, input| {
            let k = regs.get(&0).copied().unwrap_or(0) as u8;
            input.iter().map(|b| b ^ k).collect()
        });
        device.send_param_register_write(0, 0xFF).unwrap();
        device.send_write(0, &[0x0F]).unwrap();
        device.send_run().unwrap();
        device.wait_done(1).unwrap();
        assert_eq!(device.send_read(1, 1).unwrap(), vec![0xF0]);
    }

    #[test]
    fn test_write_past_input_memory_is_refused() {
        let mut device = committed();
        let res = device.send_write(60, &[0; 8]);
        assert_eq!(res, Err(TransportFault::Device(ERR_OUT_OF_BOUNDS)));
        assert_eq!(device.last_error_code(), ERR_OUT_OF_BOUNDS);
    }

    #[test]
    fn test_wait_before_run_is_refused() {
        let mut device = committed();
        assert_eq!(
            device.wait_done(1),
            Err(TransportFault::Device(ERR_NOT_STARTED))
        );
    }

    #[test]
    fn test_stalled_device_times_out() {
        let mut device = committed().stalled();
        device.send_run().unwrap();
        assert_eq!(device.wait_done(2), Err(TransportFault::Device(ERR_TIMEOUT)));
        assert_eq!(device.wait_timeouts(), vec![2]);
    }

    #[test]
    fn test_commands_after_close_are_refused() {
        let mut device = committed();
        device.close();
        assert!(device.is_closed());
        assert_eq!(device.send_reset(), Err(TransportFault::Device(ERR_CLOSED)));
    }

    #[test]
    fn test_connector_reports_construction_code() {
        let mut connector =
            LoopbackConnector::new(LoopbackAccelerator::new()).failing_construction(2);
        let res = connector.open(DeviceIdentifier::default(), 0);
        assert!(matches!(res, Err(ConstructionError::Failed { code: 2 })));
        assert_eq!(
            connector.opened_with(),
            Some((DeviceIdentifier::default(), 0))
        );
    }
}
