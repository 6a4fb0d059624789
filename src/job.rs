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

//! Job sequencing.
//!
//! A job is one pass through the fixed SIRC command sequence:
//!
//! ```text
//! Idle -> Reset -> ParametersWritten -> InputWritten -> Running
//!      -> WaitingForCompletion -> Completed -> ResultsRead
//! ```
//!
//! [`run_job`] drives an already negotiated session through that sequence. The first
//! command that fails ends the job with the matching [`JobError`]; nothing is retried and
//! nothing is rolled back. The device stays in whatever state the failed command left it
//! in, and the next job's reset is the only way back.
//!
//! [`submit`] wraps the whole cycle: open a session, negotiate, run, and close the session
//! whatever the outcome.
//!
//! # Examples
//!
//! ```rust
//! use sirc::diagnostics::DiagnosticLog;
//! use sirc::identity::DeviceIdentifier;
//! use sirc::job::{JobRequest, ParamRegister, submit};
//! use sirc::transport::loopback::{LoopbackAccelerator, LoopbackConnector};
//!
//! let mut connector = LoopbackConnector::new(LoopbackAccelerator::new());
//! let request = JobRequest {
//!     params: vec![ParamRegister { index: 0, value: 0xffff_ffff }],
//!     payload: vec![1, 2, 3, 4],
//!     operation_count: 4,
//!     result_count: 2,
//! };
//! let mut log = DiagnosticLog::new();
//! let output = submit(&mut connector, DeviceIdentifier::default(), None, &request, &mut log).unwrap();
//! assert_eq!(output.raw().len(), 3);
//! assert_eq!(output.results(), &[1, 2]);
//! ```

use crate::config;
use crate::diagnostics::DiagnosticLog;
use crate::error::{HarnessError, JobError, NegotiationError};
use crate::identity::DeviceIdentifier;
use crate::negotiate::negotiate;
use crate::offset::{JobOutput, RESULT_OFFSET, read_length};
use crate::transport::{Connector, Transport, TransportFault};
use log::{info, trace};
use std::fmt;
use std::time::Instant;

/// Address at which the input buffer is written and the output buffer is read.
const BASE_ADDRESS: u32 = 0;

/// One parameter register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamRegister {
    pub index: u8,
    pub value: u32,
}

/// Everything the caller wants done in one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Registers to write before the run, in this order.
    pub params: Vec<ParamRegister>,
    /// Bytes placed at the start of the input buffer. The rest is zero.
    pub payload: Vec<u8>,
    /// Requested input buffer length, 0 for "as large as the buffers allow".
    pub operation_count: u32,
    /// Number of logical result bytes to read back.
    pub result_count: usize,
}

/// Input buffer of exactly the negotiated length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInput(Vec<u8>);

impl JobInput {
    /// Build an `operation_count` byte buffer starting with `payload`, zero-filled after it.
    ///
    /// # Returns: `Result<JobInput, NegotiationError>`
    /// * `Ok(JobInput)` - Buffer of `operation_count` bytes
    /// * `Err(NegotiationError::OperationCountExceeded)` - `payload` is longer than `operation_count`
    pub fn new(payload: &[u8], operation_count: u32) -> Result<Self, NegotiationError> {
        let len = operation_count as usize;
        if payload.len() > len {
            return Err(NegotiationError::OperationCountExceeded {
                requested: payload.len() as u32,
                limit: operation_count,
            });
        }
        let mut buf = vec![0; len];
        buf[..payload.len()].copy_from_slice(payload);
        Ok(JobInput(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Position of a job in the command sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Idle,
    Reset,
    ParametersWritten,
    InputWritten,
    Running,
    WaitingForCompletion,
    Completed,
    ResultsRead,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Idle => "idle",
            JobStage::Reset => "reset",
            JobStage::ParametersWritten => "parameters written",
            JobStage::InputWritten => "input written",
            JobStage::Running => "running",
            JobStage::WaitingForCompletion => "waiting for completion",
            JobStage::Completed => "completed",
            JobStage::ResultsRead => "results read",
        };
        f.write_str(name)
    }
}

fn enter(log: &mut DiagnosticLog, stage: JobStage) {
    trace!("Entering stage: {stage}");
    log.note(format!("stage: {stage}"));
}

/// Run one job on a negotiated session.
///
/// # Arguments
///
/// * `transport` - Session whose parameters were already negotiated
/// * `params` - Parameter registers, written in order
/// * `input` - Input buffer, written at address 0
/// * `result_count` - Number of logical results wanted
/// * `wait_timeout` - Seconds to wait for completion
/// * `log` - Diagnostic log of this job
///
/// # Returns: `Result<JobOutput, JobError>`
/// * `Ok(JobOutput)` - `result_count + 1` bytes read from address 0 and the elapsed time
/// * `Err(JobError::ResultCountExceeded)` - `result_count` does not fit the output memory;
///   no command was issued
/// * `Err(JobError)` - The first step that failed; no later step was issued
pub fn run_job<T: Transport + ?Sized>(
    transport: &mut T,
    params: &[ParamRegister],
    input: &JobInput,
    result_count: usize,
    wait_timeout: u32,
    log: &mut DiagnosticLog,
) -> Result<JobOutput, JobError> {
    enter(log, JobStage::Idle);
    let length = read_length(result_count)
        .filter(|&l| l <= config::MAX_OUTPUT_DATA_BYTES as usize)
        .ok_or(JobError::ResultCountExceeded {
            requested: result_count,
            limit: config::MAX_OUTPUT_DATA_BYTES as usize - RESULT_OFFSET,
        })?;

    let started = Instant::now();

    transport.send_reset().map_err(JobError::ResetFailed)?;
    enter(log, JobStage::Reset);

    for p in params {
        trace!("Writing 0x{:08X} to parameter register {}", p.value, p.index);
        transport
            .send_param_register_write(p.index, p.value)
            .map_err(|fault| JobError::ParameterRegisterWriteFailed {
                index: p.index,
                fault,
            })?;
    }
    enter(log, JobStage::ParametersWritten);

    transport
        .send_write(BASE_ADDRESS, input.as_bytes())
        .map_err(JobError::InputWriteFailed)?;
    enter(log, JobStage::InputWritten);

    transport.send_run().map_err(JobError::RunTriggerFailed)?;
    enter(log, JobStage::Running);

    enter(log, JobStage::WaitingForCompletion);
    info!("Waiting up to {wait_timeout} s for the accelerator");
    transport
        .wait_done(wait_timeout)
        .map_err(JobError::WaitFailed)?;
    enter(log, JobStage::Completed);

    let raw = transport
        .send_read(BASE_ADDRESS, length as u32)
        .map_err(JobError::ReadFailed)?;
    if raw.len() != length {
        return Err(JobError::ReadFailed(TransportFault::Link(format!(
            "expected {length} bytes, driver returned {}",
            raw.len()
        ))));
    }
    enter(log, JobStage::ResultsRead);

    let elapsed = started.elapsed();
    info!("Job finished in {} ms", elapsed.as_millis());
    Ok(JobOutput::new(raw, elapsed))
}

/// Open a session, negotiate, run `request` and close the session.
///
/// The session is closed exactly once, whether the job succeeded or not. A failure to open
/// leaves nothing to close.
///
/// # Arguments
///
/// * `connector` - Source of sessions
/// * `identifier` - Hardware address of the accelerator
/// * `wait_timeout` - User wait timeout in seconds, `None` for the default
/// * `request` - The job
/// * `log` - Diagnostic log of this job
///
/// # Returns: `Result<JobOutput, HarnessError>`
/// * `Ok(JobOutput)` - Results of the job
/// * `Err(HarnessError)` - Open, negotiation or job failure
pub fn submit<C: Connector>(
    connector: &mut C,
    identifier: DeviceIdentifier,
    wait_timeout: Option<u32>,
    request: &JobRequest,
    log: &mut DiagnosticLog,
) -> Result<JobOutput, HarnessError> {
    info!("Opening SIRC session to {identifier}");
    let mut session = connector.open(identifier, config::DRIVER_VERSION)?;
    log.note(format!("session opened to {identifier}"));

    let outcome = negotiate_and_run(&mut session, wait_timeout, request, log);

    session.close();
    log.note("session closed");
    outcome
}

fn negotiate_and_run<T: Transport>(
    session: &mut T,
    wait_timeout: Option<u32>,
    request: &JobRequest,
    log: &mut DiagnosticLog,
) -> Result<JobOutput, HarnessError> {
    let negotiated = negotiate(session, wait_timeout, request.operation_count)?;
    log.note(format!(
        "negotiated {} operations, wait timeout {} s",
        negotiated.operation_count(),
        negotiated.wait_timeout()
    ));
    let input = JobInput::new(&request.payload, negotiated.operation_count())?;
    let output = run_job(
        session,
        &request.params,
        &input,
        request.result_count,
        negotiated.wait_timeout(),
        log,
    )?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::loopback::{LoopbackAccelerator, Operation};
    use rstest::*;

    const PARAMS: [ParamRegister; 2] = [
        ParamRegister {
            index: 0,
            value: 0xffff_ffff,
        },
        ParamRegister {
            index: 1,
            value: 0x0000_0000,
        },
    ];

    fn run(
        device: &mut LoopbackAccelerator,
        payload: &[u8],
        results: usize,
    ) -> Result<JobOutput, JobError> {
        let input = JobInput::new(payload, 16).unwrap();
        let mut log = DiagnosticLog::new();
        run_job(device, &PARAMS, &input, results, 10, &mut log)
    }

    #[test]
    fn test_steps_run_in_order() {
        let mut device = LoopbackAccelerator::new();
        run(&mut device, &[1, 2], 2).unwrap();
        assert_eq!(
            device.journal(),
            vec![
                Operation::Reset,
                Operation::ParamRegisterWrite(0),
                Operation::ParamRegisterWrite(1),
                Operation::Write,
                Operation::Run,
                Operation::WaitDone,
                Operation::Read,
            ]
        );
    }

    #[rstest]
    #[case::reset(Operation::Reset, 1)]
    #[case::first_register(Operation::ParamRegisterWrite(0), 2)]
    #[case::second_register(Operation::ParamRegisterWrite(1), 3)]
    #[case::write(Operation::Write, 4)]
    #[case::run(Operation::Run, 5)]
    #[case::wait(Operation::WaitDone, 6)]
    #[case::read(Operation::Read, 7)]
    fn test_sequence_stops_at_failing_step(#[case] failing: Operation, #[case] issued: usize) {
        let mut device = LoopbackAccelerator::new().fail_on(failing, 42);
        let res = run(&mut device, &[1, 2], 2);

        let journal = device.journal();
        assert_eq!(journal.len(), issued, "journal was {journal:?}");
        assert_eq!(journal.last(), Some(&failing));

        let err = res.expect_err("job should fail");
        let fault = match (failing, err) {
            (Operation::Reset, JobError::ResetFailed(f)) => f,
            (
                Operation::ParamRegisterWrite(i),
                JobError::ParameterRegisterWriteFailed { index, fault },
            ) => {
                assert_eq!(i, index);
                fault
            }
            (Operation::Write, JobError::InputWriteFailed(f)) => f,
            (Operation::Run, JobError::RunTriggerFailed(f)) => f,
            (Operation::WaitDone, JobError::WaitFailed(f)) => f,
            (Operation::Read, JobError::ReadFailed(f)) => f,
            (op, e) => panic!("{op:?} failed with unexpected error {e:?}"),
        };
        assert_eq!(fault, TransportFault::Device(42));
    }

    #[test]
    fn test_two_results_read_three_bytes() {
        let mut device = LoopbackAccelerator::new();
        let out = run(&mut device, &[0xAB, 0xCD, 0xEF], 2).unwrap();
        assert_eq!(out.raw().len(), 3);
        assert_eq!(out.padding(), &[0]);
        assert_eq!(out.results(), &[0xAB, 0xCD]);
    }

    #[test]
    fn test_registers_and_padded_input_reach_device() {
        let mut device = LoopbackAccelerator::new();
        run(&mut device, &[9, 9], 1).unwrap();
        assert_eq!(device.registers().get(&0), Some(&0xffff_ffff));
        assert_eq!(device.registers().get(&1), Some(&0));
        let mut expected = vec![0u8; 16];
        expected[..2].copy_from_slice(&[9, 9]);
        assert_eq!(device.input(), expected);
    }

    #[test]
    fn test_wait_uses_given_timeout() {
        let mut device = LoopbackAccelerator::new();
        run(&mut device, &[], 1).unwrap();
        assert_eq!(device.wait_timeouts(), vec![10]);
    }

    #[test]
    fn test_stages_are_logged() {
        let mut device = LoopbackAccelerator::new();
        let input = JobInput::new(&[1], 4).unwrap();
        let mut log = DiagnosticLog::new();
        run_job(&mut device, &[], &input, 1, 1, &mut log).unwrap();
        let stages: Vec<&str> = log.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            stages,
            vec![
                "stage: idle",
                "stage: reset",
                "stage: parameters written",
                "stage: input written",
                "stage: running",
                "stage: waiting for completion",
                "stage: completed",
                "stage: results read",
            ]
        );
    }

    #[rstest]
    #[case::past_output_memory(8192)]
    #[case::read_length_overflows(usize::MAX)]
    fn test_result_count_beyond_output_memory_issues_nothing(#[case] results: usize) {
        let mut device = LoopbackAccelerator::new();
        let res = run(&mut device, &[1], results);
        assert!(matches!(
            res,
            Err(JobError::ResultCountExceeded { requested, limit: 8191 }) if requested == results
        ));
        assert!(device.journal().is_empty());
    }

    #[test]
    fn test_input_longer_than_operation_count_is_rejected() {
        let res = JobInput::new(&[0; 17], 16);
        assert!(matches!(
            res,
            Err(NegotiationError::OperationCountExceeded {
                requested: 17,
                limit: 16
            })
        ));
    }
}
