// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Interface for the hardware timers backing platform alarms.
//!
//! Two timers exist: a low frequency sleep timer counting milliseconds and
//! the radio's microsecond timer. Both are one-shot, have a bounded range
//! and report expiry through a [`TimerClient`] in interrupt context.
//! [`AlarmTimer`] selects one of them for an alarm handle.

use kernel::ErrorCode;

pub trait TimerClient {
    /// The armed timeout elapsed. Called in interrupt context.
    fn fired(&self);
}

/// Millisecond one-shot timer.
pub trait SleepTimer<'a> {
    fn set_client(&self, client: &'a dyn TimerClient);

    /// Free running counter, in ms.
    fn now_ms(&self) -> u32;

    /// Longest timeout `start_ms` accepts.
    fn max_ms(&self) -> u32;

    /// Arms the timer to fire `timeout` ms from now. Replaces any previous
    /// timeout.
    fn start_ms(&self, timeout: u32) -> Result<(), ErrorCode>;

    fn stop(&self);
}

/// Microsecond one-shot timer. The full 32-bit range is usable.
pub trait MicroTimer<'a> {
    fn set_client(&self, client: &'a dyn TimerClient);

    fn now_us(&self) -> u32;

    fn start_us(&self, timeout: u32) -> Result<(), ErrorCode>;

    fn stop(&self);
}

/// The timer behind one alarm handle.
#[derive(Copy, Clone)]
pub enum AlarmTimer<'a> {
    Milli(&'a dyn SleepTimer<'a>),
    Micro(&'a dyn MicroTimer<'a>),
}

impl<'a> AlarmTimer<'a> {
    pub fn set_client(&self, client: &'a dyn TimerClient) {
        match self {
            AlarmTimer::Milli(timer) => timer.set_client(client),
            AlarmTimer::Micro(timer) => timer.set_client(client),
        }
    }

    pub fn now(&self) -> u32 {
        match self {
            AlarmTimer::Milli(timer) => timer.now_ms(),
            AlarmTimer::Micro(timer) => timer.now_us(),
        }
    }

    pub fn max(&self) -> u32 {
        match self {
            AlarmTimer::Milli(timer) => timer.max_ms(),
            AlarmTimer::Micro(_) => u32::MAX,
        }
    }

    pub fn start(&self, timeout: u32) -> Result<(), ErrorCode> {
        match self {
            AlarmTimer::Milli(timer) => timer.start_ms(timeout),
            AlarmTimer::Micro(timer) => timer.start_us(timeout),
        }
    }

    pub fn stop(&self) {
        match self {
            AlarmTimer::Milli(timer) => timer.stop(),
            AlarmTimer::Micro(timer) => timer.stop(),
        }
    }
}
