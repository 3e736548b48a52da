// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! OpenThread platform layer for the EFR32 radio SoC family.
//!
//! The chip's radio is driven through the vendor radio abstraction (see
//! [`rail`]); everything the Thread stack needs from the platform is served
//! by the types in this crate:
//!
//! - [`alarm::AlarmService`]: millisecond and microsecond alarms with wrap
//!   handling, plus the 64-bit platform clock.
//! - [`radio::Radio`]: IEEE 802.15.4 transmit, receive, energy scan,
//!   enhanced acknowledgments and transmit security.
//! - [`sleep::SleepManager`] and [`misc::Misc`]: power mode gating and
//!   system services.
//!
//! Work produced in interrupt context is drained by calling `process()` on
//! the alarm service and the radio from the main loop.

#![no_std]

// Host tests use std for the mocks.
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod alarm;
pub mod band;
pub mod config;
pub mod energy_scan;
pub mod enh_ack;
pub mod error;
pub mod events;
pub mod filter;
pub mod interrupt;
pub mod link_metrics;
pub mod mac_keys;
pub mod misc;
pub mod platform;
pub mod power;
pub mod radio;
pub mod rail;
pub mod rx_queue;
pub mod sleep;
pub mod source_match;
pub mod timer;

#[cfg(test)]
mod test;
