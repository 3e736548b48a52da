// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Radio state flags shared between interrupt and main-loop context.
//!
//! The low bits track what the radio is doing (a data frame or an ACK on
//! the air, an ACK being awaited, a scheduled window pending). The `TX_*`
//! bits are terminal transmit outcomes: the interrupt handler sets exactly
//! one of them when a transmission ends and the main loop consumes it. Every
//! update is a single atomic read-modify-write on the whole mask.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use kernel::debug;
use kernel::utilities::registers::{register_bitfields, Field, FieldValue, LocalRegisterCopy};

use crate::config::CONFIG;

register_bitfields![u32,
    pub RadioFlags [
        INIT_DONE OFFSET(0) NUMBITS(1) [],
        ONGOING_TX_DATA OFFSET(1) NUMBITS(1) [],
        ONGOING_TX_ACK OFFSET(2) NUMBITS(1) [],
        WAITING_FOR_ACK OFFSET(3) NUMBITS(1) [],
        CURRENT_TX_USE_CSMA OFFSET(4) NUMBITS(1) [],
        SCHEDULED_RX_PENDING OFFSET(5) NUMBITS(1) [],
        SCHEDULED_TX_PENDING OFFSET(6) NUMBITS(1) [],

        TX_SUCCESS OFFSET(8) NUMBITS(1) [],
        TX_CCA_FAILED OFFSET(9) NUMBITS(1) [],
        TX_NO_ACK OFFSET(10) NUMBITS(1) [],
        TX_SCHEDULER_ERROR OFFSET(11) NUMBITS(1) [],
        TX_FAILED OFFSET(12) NUMBITS(1) [],
        ACK_SENT_WITH_FP_SET OFFSET(13) NUMBITS(1) [],
        SECURED_ACK_SENT OFFSET(14) NUMBITS(1) [],
        SCHEDULED_RX_STARTED OFFSET(15) NUMBITS(1) [],
        SCHEDULED_TX_STARTED OFFSET(16) NUMBITS(1) []
    ]
];

pub type FlagsCopy = LocalRegisterCopy<u32, RadioFlags::Register>;

/// All terminal transmit outcomes.
pub fn tx_events() -> FieldValue<u32, RadioFlags::Register> {
    RadioFlags::TX_SUCCESS::SET
        + RadioFlags::TX_CCA_FAILED::SET
        + RadioFlags::TX_NO_ACK::SET
        + RadioFlags::TX_SCHEDULER_ERROR::SET
        + RadioFlags::TX_FAILED::SET
}

pub struct EventFlags {
    bits: AtomicU32,
}

impl EventFlags {
    pub const fn new() -> EventFlags {
        EventFlags {
            bits: AtomicU32::new(0),
        }
    }

    pub fn get(&self) -> FlagsCopy {
        FlagsCopy::new(self.bits.load(Ordering::Acquire))
    }

    pub fn is_set(&self, field: Field<u32, RadioFlags::Register>) -> bool {
        self.get().is_set(field)
    }

    /// True if any bit of `flags` is set.
    pub fn any(&self, flags: FieldValue<u32, RadioFlags::Register>) -> bool {
        self.bits.load(Ordering::Acquire) & flags.mask() != 0
    }

    pub fn set(&self, flags: FieldValue<u32, RadioFlags::Register>) {
        self.bits.fetch_or(flags.value, Ordering::AcqRel);
    }

    pub fn clear(&self, flags: FieldValue<u32, RadioFlags::Register>) {
        self.bits.fetch_and(!flags.mask(), Ordering::AcqRel);
    }

    pub fn write(&self, field: Field<u32, RadioFlags::Register>, set: bool) {
        let mask = field.mask << field.shift;
        if set {
            self.bits.fetch_or(mask, Ordering::AcqRel);
        } else {
            self.bits.fetch_and(!mask, Ordering::AcqRel);
        }
    }
}

/// Debug counters, counted only when enabled in the radio configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Counter {
    RxBadLength,
    RxBadTimestamp,
    RxQueueFull,
    RxFilterMismatch,
    RxDropped,
    RxPacketQueued,
    RxAckReceived,
    TxStarted,
    TxStartFailed,
    TxPacketSent,
    TxChannelBusy,
    TxAborted,
    TxNoAck,
    TxDoneCallback,
    ScheduledTxStarted,
    SchedulerError,
    EnhAckWriteFailed,
    EnergyScanDone,
    CalibrationNeeded,
}

const COUNTER_COUNT: usize = Counter::CalibrationNeeded as usize + 1;

pub struct DebugCounters {
    enabled: Cell<bool>,
    counts: [Cell<u32>; COUNTER_COUNT],
}

impl DebugCounters {
    pub const fn new() -> DebugCounters {
        const ZERO: Cell<u32> = Cell::new(0);
        DebugCounters {
            enabled: Cell::new(false),
            counts: [ZERO; COUNTER_COUNT],
        }
    }

    pub fn enable(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn increment(&self, counter: Counter) {
        if !self.enabled.get() {
            return;
        }
        let count = &self.counts[counter as usize];
        count.set(count.get().wrapping_add(1));
        if CONFIG.debug_counters {
            debug!("efr32: {:?} = {}", counter, count.get());
        }
    }

    pub fn get(&self, counter: Counter) -> u32 {
        self.counts[counter as usize].get()
    }

    pub fn clear(&self) {
        for count in self.counts.iter() {
            count.set(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear() {
        let flags = EventFlags::new();
        flags.set(RadioFlags::ONGOING_TX_DATA::SET + RadioFlags::CURRENT_TX_USE_CSMA::SET);
        assert!(flags.is_set(RadioFlags::ONGOING_TX_DATA));
        assert!(flags.is_set(RadioFlags::CURRENT_TX_USE_CSMA));
        assert!(!flags.any(tx_events()));

        flags.set(RadioFlags::TX_CCA_FAILED::SET);
        assert!(flags.any(tx_events()));

        flags.clear(RadioFlags::ONGOING_TX_DATA::SET + tx_events());
        assert!(!flags.is_set(RadioFlags::ONGOING_TX_DATA));
        assert!(!flags.any(tx_events()));
        assert!(flags.is_set(RadioFlags::CURRENT_TX_USE_CSMA));

        flags.write(RadioFlags::CURRENT_TX_USE_CSMA, false);
        assert_eq!(flags.get().get(), 0);
    }

    #[test]
    fn counters_only_count_when_enabled() {
        let counters = DebugCounters::new();
        counters.increment(Counter::RxQueueFull);
        assert_eq!(counters.get(Counter::RxQueueFull), 0);

        counters.enable(true);
        counters.increment(Counter::RxQueueFull);
        counters.increment(Counter::RxQueueFull);
        assert_eq!(counters.get(Counter::RxQueueFull), 2);
        assert_eq!(counters.get(Counter::EnergyScanDone), 0);

        counters.clear();
        assert_eq!(counters.get(Counter::RxQueueFull), 0);
    }
}
