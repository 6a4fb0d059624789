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

//! Session parameter negotiation.
//!
//! Before a job runs the host reads the driver's session parameters, forces the buffer
//! limits to the sizes the accelerator was built with, applies the user's wait timeout if
//! there is one, and commits the result. The requested operation count is then checked
//! against what both buffers can hold.
//!
//! # Examples
//!
//! ```rust
//! use sirc::negotiate::negotiate;
//! use sirc::transport::loopback::LoopbackAccelerator;
//!
//! let mut device = LoopbackAccelerator::new();
//! let negotiated = negotiate(&mut device, None, 16).unwrap();
//! assert_eq!(negotiated.operation_count(), 16);
//! assert_eq!(negotiated.wait_timeout(), 10);
//! ```

use crate::config;
use crate::error::NegotiationError;
use crate::transport::{SessionParameters, Transport};
use log::{info, trace};

/// Outcome of a successful negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    params: SessionParameters,
    operation_count: u32,
    wait_timeout: u32,
}

impl Negotiated {
    /// Parameters as committed to the transport.
    pub fn params(&self) -> &SessionParameters {
        &self.params
    }

    /// Number of input bytes the job writes. Never 0 and never above [`SessionParameters::limit`].
    pub fn operation_count(&self) -> u32 {
        self.operation_count
    }

    /// Seconds to wait for completion: the user's timeout, else
    /// [`config::DEFAULT_WAIT_TIMEOUT_SECS`].
    pub fn wait_timeout(&self) -> u32 {
        self.wait_timeout
    }
}

/// Negotiate session parameters and validate the operation count.
///
/// # Arguments
///
/// * `transport` - Open session
/// * `desired_timeout` - User wait timeout in seconds, applied to both read and write timeouts
/// * `requested_ops` - Number of input bytes to write, 0 for "as many as fit"
///
/// # Returns: `Result<Negotiated, NegotiationError>`
/// * `Ok(Negotiated)` - Committed parameters and effective operation count
/// * `Err(NegotiationError::ParameterFetchFailed)` - Driver refused `get_parameters`
/// * `Err(NegotiationError::InvalidTimeout)` - `desired_timeout` was 0
/// * `Err(NegotiationError::ParameterCommitFailed)` - Driver refused `set_parameters`
/// * `Err(NegotiationError::OperationCountExceeded)` - `requested_ops` does not fit the buffers
pub fn negotiate<T: Transport + ?Sized>(
    transport: &mut T,
    desired_timeout: Option<u32>,
    requested_ops: u32,
) -> Result<Negotiated, NegotiationError> {
    let mut params = transport
        .get_parameters()
        .map_err(NegotiationError::ParameterFetchFailed)?;
    trace!("Driver parameters: {params:?}");

    params.max_input_data_bytes = config::MAX_INPUT_DATA_BYTES;
    params.max_output_data_bytes = config::MAX_OUTPUT_DATA_BYTES;

    if let Some(timeout) = desired_timeout {
        if timeout < 1 {
            return Err(NegotiationError::InvalidTimeout(timeout));
        }
        params.write_timeout = timeout;
        params.read_timeout = timeout;
    }

    transport
        .set_parameters(&params)
        .map_err(NegotiationError::ParameterCommitFailed)?;
    info!("Committed session parameters: {params:?}");

    let limit = params.limit();
    let operation_count = match requested_ops {
        0 => limit,
        n if n > limit => {
            return Err(NegotiationError::OperationCountExceeded {
                requested: n,
                limit,
            });
        }
        n => n,
    };

    Ok(Negotiated {
        params,
        operation_count,
        wait_timeout: desired_timeout.unwrap_or(config::DEFAULT_WAIT_TIMEOUT_SECS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportFault;
    use crate::transport::loopback::{LoopbackAccelerator, Operation};
    use googletest::prelude::*;
    use rstest::*;

    #[gtest]
    #[rstest]
    #[case::one(1, 1)]
    #[case::sixteen(16, 16)]
    #[case::at_limit(8192, 8192)]
    #[case::zero_means_limit(0, 8192)]
    fn test_operation_count_within_limit(#[case] requested: u32, #[case] expected: u32) {
        let mut device = LoopbackAccelerator::new();
        let negotiated = negotiate(&mut device, None, requested).unwrap();
        expect_that!(negotiated.operation_count(), eq(expected));
        expect_that!(
            negotiated.params().max_input_data_bytes,
            eq(config::MAX_INPUT_DATA_BYTES)
        );
        expect_that!(
            negotiated.params().max_output_data_bytes,
            eq(config::MAX_OUTPUT_DATA_BYTES)
        );
    }

    #[test]
    fn test_operation_count_over_limit_fails() {
        let mut device = LoopbackAccelerator::new();
        let res = negotiate(&mut device, None, 8193);
        assert!(matches!(
            res,
            Err(NegotiationError::OperationCountExceeded {
                requested: 8193,
                limit: 8192
            })
        ));
        assert_eq!(
            device.journal().last(),
            Some(&Operation::SetParameters),
            "no transport call may follow a rejected operation count"
        );
    }

    #[test]
    fn test_zero_timeout_is_rejected_before_commit() {
        let mut device = LoopbackAccelerator::new();
        let res = negotiate(&mut device, Some(0), 16);
        assert!(matches!(res, Err(NegotiationError::InvalidTimeout(0))));
        assert!(!device.journal().contains(&Operation::SetParameters));
    }

    #[test]
    fn test_user_timeout_sets_both_directions() {
        let mut device = LoopbackAccelerator::new();
        let negotiated = negotiate(&mut device, Some(3), 16).unwrap();
        assert_eq!(negotiated.params().write_timeout, 3);
        assert_eq!(negotiated.params().read_timeout, 3);
        assert_eq!(negotiated.wait_timeout(), 3);
        assert_eq!(device.parameters(), *negotiated.params());
    }

    #[test]
    fn test_no_timeout_keeps_driver_timeouts() {
        let mut device = LoopbackAccelerator::new();
        let before = device.parameters();
        let negotiated = negotiate(&mut device, None, 16).unwrap();
        assert_eq!(negotiated.params().write_timeout, before.write_timeout);
        assert_eq!(negotiated.params().read_timeout, before.read_timeout);
        assert_eq!(negotiated.wait_timeout(), config::DEFAULT_WAIT_TIMEOUT_SECS);
    }

    #[test]
    fn test_fetch_failure_carries_code() {
        let mut device = LoopbackAccelerator::new().fail_on(Operation::GetParameters, 12);
        let res = negotiate(&mut device, None, 16);
        assert!(matches!(
            res,
            Err(NegotiationError::ParameterFetchFailed(TransportFault::Device(12)))
        ));
    }

    #[test]
    fn test_commit_failure_carries_code() {
        let mut device = LoopbackAccelerator::new().fail_on(Operation::SetParameters, 4);
        let res = negotiate(&mut device, Some(5), 16);
        assert!(matches!(
            res,
            Err(NegotiationError::ParameterCommitFailed(TransportFault::Device(4)))
        ));
    }
}
