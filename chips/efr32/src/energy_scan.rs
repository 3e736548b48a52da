// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Energy detection on a channel.
//!
//! With frame detection off the radio is put in receive mode and its RSSI
//! sampled every eight symbols from the one-shot radio timer. The scan
//! reports the highest reading over the requested averaging time. An
//! asynchronous scan is reported to the stack by the radio's `process()`;
//! a synchronous one (an RSSI query) is waited for in place.
//!
//! ```text
//!   Idle --begin--> InProgress --last sample--> Completed --reported--> Idle
//! ```

use core::cell::Cell;

use kernel::ErrorCode;

use crate::error::RadioError;
use crate::rail::Rail;

/// Reported when no valid reading was taken.
pub const RSSI_INVALID: i8 = 127;

const ENERGY_READS_MAX: i8 = -128;
const SYMBOLS_PER_ENERGY_READING: u32 = 8;
const QUARTER_DBM_IN_DBM: i16 = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScanStatus {
    Idle,
    InProgress,
    Completed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScanMode {
    Sync,
    Async,
}

pub struct EnergyScan<'a> {
    rail: &'a dyn Rail<'a>,
    status: Cell<ScanStatus>,
    mode: Cell<ScanMode>,
    result: Cell<i8>,
    reads_max: Cell<i8>,
    /// Samples still to take after the next one.
    counter: Cell<u32>,
    counter_max: Cell<u32>,
}

impl<'a> EnergyScan<'a> {
    pub fn new(rail: &'a dyn Rail<'a>) -> EnergyScan<'a> {
        EnergyScan {
            rail,
            status: Cell::new(ScanStatus::Idle),
            mode: Cell::new(ScanMode::Async),
            result: Cell::new(RSSI_INVALID),
            reads_max: Cell::new(ENERGY_READS_MAX),
            counter: Cell::new(0),
            counter_max: Cell::new(0),
        }
    }

    pub fn status(&self) -> ScanStatus {
        self.status.get()
    }

    pub fn mode(&self) -> ScanMode {
        self.mode.get()
    }

    pub fn result(&self) -> i8 {
        self.result.get()
    }

    pub fn set_idle(&self) {
        self.status.set(ScanStatus::Idle);
    }

    /// Claims the scanner for a new scan.
    pub fn begin(&self, mode: ScanMode) -> Result<(), RadioError> {
        if self.status.get() != ScanStatus::Idle {
            return Err(RadioError::Busy);
        }
        self.status.set(ScanStatus::InProgress);
        self.mode.set(mode);
        Ok(())
    }

    fn symbol_duration_us(&self) -> u32 {
        match self.rail.symbol_rate() {
            0 => 1,
            rate => (1_000_000 / rate).max(1),
        }
    }

    /// Sets up sampling over `averaging_time_us`: one reading, plus one
    /// more for every eight symbols that fit in it.
    pub fn arm(&self, averaging_time_us: u32) -> Result<(), RadioError> {
        if self.counter.get() != 0 {
            return Err(RadioError::Failed);
        }
        let per_reading = self.symbol_duration_us() * SYMBOLS_PER_ENERGY_READING;
        self.reads_max.set(ENERGY_READS_MAX);
        self.counter_max.set(averaging_time_us / per_reading);
        self.counter.set(self.counter_max.get());
        Ok(())
    }

    /// Waits eight symbols for the next reading.
    pub fn dwell(&self) -> Result<(), ErrorCode> {
        self.rail.cancel_timer();
        self.rail
            .start_timer_us(SYMBOLS_PER_ENERGY_READING * self.symbol_duration_us())
    }

    pub fn complete(&self, result: i8) {
        self.result.set(result);
        self.status.set(ScanStatus::Completed);
    }

    /// Stops an unfinished scan.
    pub fn abort(&self) {
        self.rail.cancel_timer();
        if self.counter.get() != 0 || self.status.get() == ScanStatus::InProgress {
            self.counter.set(0);
            let _ = self.rail.set_frame_detection(true);
        }
        self.status.set(ScanStatus::Idle);
    }

    /// Takes one reading. Called when the dwell timer expires. Returns true
    /// once the scan has completed.
    pub fn sample(&self) -> bool {
        if self.status.get() != ScanStatus::InProgress {
            return false;
        }

        let wait = self.counter.get() == self.counter_max.get();
        if let Some(quarter_dbm) = self.rail.rssi_quarter_dbm(wait) {
            let dbm = (quarter_dbm / QUARTER_DBM_IN_DBM) as i8;
            if self.reads_max.get() < dbm {
                self.reads_max.set(dbm);
            }
        }

        if self.counter.get() != 0 {
            self.counter.set(self.counter.get() - 1);
            if self.dwell().is_ok() {
                return false;
            }
            self.counter.set(0);
        }

        self.complete(self.reads_max.get());
        let _ = self.rail.set_frame_detection(true);
        true
    }

    /// Waits for a synchronous scan for up to `timeout_us` and returns its
    /// result, or [`RSSI_INVALID`] if it did not finish. The scanner is idle
    /// afterwards.
    pub fn wait(&self, timeout_us: u32) -> i8 {
        let start = self.rail.time_us();
        while self.status.get() == ScanStatus::InProgress
            && self.rail.time_us().wrapping_sub(start) < timeout_us
        {
            core::hint::spin_loop();
        }

        let rssi = if self.status.get() == ScanStatus::Completed {
            self.result.get()
        } else {
            RSSI_INVALID
        };
        self.abort();
        rssi
    }
}
