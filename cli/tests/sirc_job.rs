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

use googletest::prelude::*;
use rstest::*;
use std::process::{Command, Output};

fn sirc_job(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sirc_job"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("failed to run sirc_job")
}

#[gtest]
#[rstest]
#[case::loopback(
    &["--loopback"],
    Some(0),
    all![
        contains_substring("Configuration for TOP line:    0, 2, 0, 0, 0, 0, 0, 0"),
        contains_substring("The responses are : 0, 2"),
        contains_substring("Operation complete !"),
        not(contains_substring("stage: "))
    ],
    not(contains_substring("Error:"))
)]
#[case::loopback_with_log(
    &["--loopback", "--wait-timeout", "3", "--print-log"],
    Some(0),
    all![
        contains_substring("Allowed a waitTimeOut of : 3 secs"),
        contains_substring("The responses are : 0, 2"),
        contains_substring("stage: results read"),
        contains_substring("session closed")
    ],
    not(contains_substring("Error:"))
)]
#[case::zero_timeout(
    &["--loopback", "--wait-timeout", "0"],
    Some(1),
    all![
        contains_substring("Configuration for TOP line:"),
        not(contains_substring("waitTimeOut")),
        not(contains_substring("The responses are"))
    ],
    all![
        contains_substring("Error:\n\tNegotiationError::InvalidTimeout: Invalid waitTimeOut: 0"),
        contains_substring("session closed")
    ]
)]
#[case::bad_mac(
    &["--loopback", "--mac", "AA:BB:CC"],
    Some(1),
    not(contains_substring("The responses are")),
    contains_substring("Error:\n\tParseError::InvalidIdentifierLength:")
)]
#[case::single_dash_mac(
    &["-mac", "x"],
    Some(2),
    eq(""),
    all![contains_substring("unexpected argument"), contains_substring("Usage:")]
)]
fn exit_status_and_output<O: for<'a> Matcher<&'a str>, E: for<'a> Matcher<&'a str>>(
    #[case] args: &[&str],
    #[case] code: Option<i32>,
    #[case] stdout: O,
    #[case] stderr: E,
) {
    let out = sirc_job(args);
    let out_text = String::from_utf8_lossy(&out.stdout);
    let err_text = String::from_utf8_lossy(&out.stderr);
    expect_that!(out.status.code(), eq(code), "stderr was {}", err_text);
    expect_that!(&*out_text, stdout);
    expect_that!(&*err_text, stderr);
}

#[gtest]
fn failure_is_reported_once() {
    let out = sirc_job(&["--loopback", "--wait-timeout", "0"]);
    let err_text = String::from_utf8_lossy(&out.stderr);
    expect_that!(
        err_text.matches("NegotiationError::InvalidTimeout").count(),
        eq(1)
    );
}
