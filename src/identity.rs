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

//! Device identity resolution.
//!
//! A SIRC accelerator is addressed by the 6-byte hardware (MAC) address of its Ethernet
//! endpoint. Users type that address as delimited hex; this module turns it into a
//! [`DeviceIdentifier`] and supplies the default identifier when none is given.
//!
//! # Examples
//!
//! ```rust
//! use sirc::identity::DeviceIdentifier;
//!
//! let id: DeviceIdentifier = "00:0a:35:01:02:03".parse().unwrap();
//! assert_eq!(id.bytes(), [0x00, 0x0a, 0x35, 0x01, 0x02, 0x03]);
//!
//! let fallback = DeviceIdentifier::resolve(None).unwrap();
//! assert_eq!(fallback, DeviceIdentifier::default());
//! ```

use crate::config;
use crate::error::ParseError;
use log::trace;
use std::fmt;
use std::str::FromStr;

/// Number of bytes in a hardware address.
pub const IDENTIFIER_BYTES: usize = 6;

/// Fixed-length hardware address of an accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentifier([u8; IDENTIFIER_BYTES]);

impl DeviceIdentifier {
    pub const fn new(bytes: [u8; IDENTIFIER_BYTES]) -> Self {
        DeviceIdentifier(bytes)
    }

    pub fn bytes(&self) -> [u8; IDENTIFIER_BYTES] {
        self.0
    }

    /// Parse `text` if the caller supplied one, otherwise fall back to
    /// [`config::DEFAULT_FPGA_ID`].
    ///
    /// # Returns: `Result<DeviceIdentifier, ParseError>`
    /// * `Ok(DeviceIdentifier)` - Parsed or default identifier
    /// * `Err(ParseError)` - `text` was given but is not a 6-byte hex address
    pub fn resolve(text: Option<&str>) -> Result<Self, ParseError> {
        match text {
            Some(t) => t.parse(),
            None => {
                trace!("No hardware address given, using default");
                Ok(DeviceIdentifier::default())
            }
        }
    }
}

impl Default for DeviceIdentifier {
    fn default() -> Self {
        DeviceIdentifier(config::DEFAULT_FPGA_ID)
    }
}

impl FromStr for DeviceIdentifier {
    type Err = ParseError;

    /// Parse `XX:XX:XX:XX:XX:XX` or `XX-XX-XX-XX-XX-XX`. Groups may be one or two hex digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups: Vec<&str> = s.trim().split([':', '-']).collect();
        let mut bytes = Vec::with_capacity(groups.len());
        for group in groups {
            if group.is_empty() || group.len() > 2 {
                return Err(ParseError::InvalidHexGroup(group.to_string()));
            }
            let byte = u8::from_str_radix(group, 16)
                .map_err(|_| ParseError::InvalidHexGroup(group.to_string()))?;
            bytes.push(byte);
        }

        let found = bytes.len();
        let bytes: [u8; IDENTIFIER_BYTES] = bytes
            .try_into()
            .map_err(|_| ParseError::InvalidIdentifierLength { found })?;
        Ok(DeviceIdentifier(bytes))
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}
