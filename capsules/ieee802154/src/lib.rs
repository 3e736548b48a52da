// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Hardware independent IEEE 802.15.4 MAC frame helpers: header parsing,
//! header IEs, enhanced acknowledgments and CCM* frame security.

#![forbid(unsafe_code)]
#![no_std]

pub mod aes_ccm;
pub mod frame;
pub mod ie;
pub mod security;
