// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Errors reported to the Thread stack.

use kernel::ErrorCode;

/// The stack's fixed error enumeration. Success is `Ok(..)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioError {
    Failed,
    Busy,
    InvalidArgs,
    InvalidState,
    NotCapable,
    NotImplemented,
    Security,
    NoAck,
    ChannelAccessFailure,
    Abort,
    NoBufs,
    NotFound,
}

impl From<ErrorCode> for RadioError {
    fn from(err: ErrorCode) -> RadioError {
        match err {
            ErrorCode::INVAL => RadioError::InvalidArgs,
            ErrorCode::OFF | ErrorCode::ALREADY => RadioError::InvalidState,
            _ => RadioError::Failed,
        }
    }
}
