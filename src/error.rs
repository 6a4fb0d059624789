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

//! Error types for every step of a job submission.
//!
//! Each step of the protocol has its own error enum so that callers matching on a failure
//! know exactly which stage broke. [`HarnessError`] folds them together for the binary,
//! which hands it to [`crate::reporter::report`].

use crate::transport::TransportFault;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("ParseError::InvalidIdentifierLength: expected 6 bytes in hardware address, found {found}")]
    InvalidIdentifierLength { found: usize },
    #[error("ParseError::InvalidHexGroup: '{0}' is not a one or two digit hex byte")]
    InvalidHexGroup(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    #[error("ConstructionError::DriverUnavailable: Unable to find a suitable SIRC driver: {0}")]
    DriverUnavailable(String),
    #[error("ConstructionError::Failed: Constructor failed with code {code}")]
    Failed { code: i32 },
}

#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    #[error("NegotiationError::ParameterFetchFailed: Cannot getParameters from SIRC interface, {0}")]
    ParameterFetchFailed(TransportFault),
    #[error("NegotiationError::ParameterCommitFailed: Cannot setParameters on SIRC interface, {0}")]
    ParameterCommitFailed(TransportFault),
    #[error("NegotiationError::InvalidTimeout: Invalid waitTimeOut: {0}. Must be >= 1")]
    InvalidTimeout(u32),
    #[error(
        "NegotiationError::OperationCountExceeded: Invalid number of operations ({requested}), must be less than or equal to {limit}"
    )]
    OperationCountExceeded { requested: u32, limit: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(
        "JobError::ResultCountExceeded: Cannot read {requested} results, must be less than or equal to {limit}"
    )]
    ResultCountExceeded { requested: usize, limit: usize },
    #[error("JobError::ResetFailed: Reset failed with {0}")]
    ResetFailed(TransportFault),
    #[error("JobError::ParameterRegisterWriteFailed: Parameter register {index} write failed with {fault}")]
    ParameterRegisterWriteFailed { index: u8, fault: TransportFault },
    #[error("JobError::InputWriteFailed: Write to FPGA failed with {0}")]
    InputWriteFailed(TransportFault),
    #[error("JobError::RunTriggerFailed: Run command failed with {0}")]
    RunTriggerFailed(TransportFault),
    #[error("JobError::WaitFailed: Wait till done failed with {0}")]
    WaitFailed(TransportFault),
    #[error("JobError::ReadFailed: Read from FPGA failed with {0}")]
    ReadFailed(TransportFault),
}

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error(transparent)]
    Job(#[from] JobError),
}
