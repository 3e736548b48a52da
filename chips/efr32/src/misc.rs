// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Reset cause, system reset and host wake-up.

use core::cell::Cell;

use kernel::debug;
use kernel::hil::gpio::Output;
use kernel::utilities::cells::OptionalCell;
use kernel::utilities::registers::{register_bitfields, LocalRegisterCopy};

use crate::config::CONFIG;
use crate::error::RadioError;
use crate::timer::{SleepTimer, TimerClient};

register_bitfields![u32,
    pub ResetCause [
        PORST OFFSET(0) NUMBITS(1) [],
        AVDDBOD OFFSET(2) NUMBITS(1) [],
        DVDDBOD OFFSET(3) NUMBITS(1) [],
        DECBOD OFFSET(4) NUMBITS(1) [],
        EXTRST OFFSET(8) NUMBITS(1) [],
        LOCKUPRST OFFSET(9) NUMBITS(1) [],
        SYSREQRST OFFSET(10) NUMBITS(1) [],
        WDOGRST OFFSET(11) NUMBITS(1) [],
        EM4RST OFFSET(16) NUMBITS(1) []
    ]
];

pub type ResetCauseCopy = LocalRegisterCopy<u32, ResetCause::Register>;

/// Reset reason reported to the stack.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResetReason {
    PowerOn,
    Software,
    Watchdog,
    External,
    Fault,
    Other,
    Unknown,
}

impl ResetReason {
    /// Several causes may be latched at once; the first one in the order of
    /// this enum wins.
    pub fn from_cause(cause: ResetCauseCopy) -> ResetReason {
        if cause.is_set(ResetCause::PORST) {
            ResetReason::PowerOn
        } else if cause.is_set(ResetCause::SYSREQRST) {
            ResetReason::Software
        } else if cause.is_set(ResetCause::WDOGRST) {
            ResetReason::Watchdog
        } else if cause.is_set(ResetCause::EXTRST) {
            ResetReason::External
        } else if cause.is_set(ResetCause::LOCKUPRST) {
            ResetReason::Fault
        } else if cause.get()
            & (ResetCause::AVDDBOD::SET
                + ResetCause::DVDDBOD::SET
                + ResetCause::DECBOD::SET
                + ResetCause::EM4RST::SET)
                .mask()
            != 0
        {
            ResetReason::Other
        } else {
            ResetReason::Unknown
        }
    }
}

/// Reset management unit and bootloader.
pub trait SystemControl {
    /// Causes latched since the register was last cleared.
    fn reset_cause(&self) -> u32;
    fn clear_reset_cause(&self);
    fn system_reset(&self);
    /// Reboots into the bootloader to install a staged image. Returns only
    /// if no bootloader is present.
    fn reboot_and_install(&self);
}

#[derive(Copy, Clone)]
struct HostWake<'a> {
    pin: &'a dyn Output,
    timer: &'a dyn SleepTimer<'a>,
    clear_after_ms: u32,
}

pub struct Misc<'a> {
    system: &'a dyn SystemControl,
    reset_cause: Cell<u32>,
    host_wake: OptionalCell<HostWake<'a>>,
}

impl<'a> Misc<'a> {
    pub fn new(system: &'a dyn SystemControl) -> Misc<'a> {
        Misc {
            system,
            reset_cause: Cell::new(0),
            host_wake: OptionalCell::empty(),
        }
    }

    /// Captures the reset cause. The register is cleared since causes
    /// accumulate over resets.
    pub fn init(&self) {
        self.reset_cause.set(self.system.reset_cause());
        self.system.clear_reset_cause();
    }

    pub fn reset_reason(&self) -> ResetReason {
        ResetReason::from_cause(ResetCauseCopy::new(self.reset_cause.get()))
    }

    pub fn reset(&self) {
        self.system.system_reset();
    }

    /// Fails with `NotCapable` when no bootloader took over.
    pub fn reset_to_bootloader(&self) -> Result<(), RadioError> {
        self.system.reboot_and_install();
        Err(RadioError::NotCapable)
    }

    /// Routes `wake_host` to `pin`, released `clear_after_ms` later.
    pub fn set_host_wake(
        &'a self,
        pin: &'a dyn Output,
        timer: &'a dyn SleepTimer<'a>,
        clear_after_ms: u32,
    ) {
        timer.set_client(self);
        self.host_wake.set(HostWake {
            pin,
            timer,
            clear_after_ms,
        });
    }

    /// Raises the host wake pin. Does nothing without a pin.
    pub fn wake_host(&self) {
        self.host_wake.map(|wake| {
            wake.pin.set();
            if let Err(e) = wake.timer.start_ms(wake.clear_after_ms) {
                if CONFIG.debug_radio {
                    debug!("efr32: host wake timer failed: {:?}", e);
                }
                wake.pin.clear();
            }
        });
    }
}

impl TimerClient for Misc<'_> {
    fn fired(&self) {
        self.host_wake.map(|wake| wake.pin.clear());
    }
}
