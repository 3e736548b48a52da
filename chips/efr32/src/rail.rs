// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Interface for the vendor radio abstraction layer.
//!
//! The radio driver in this crate owns the protocol state machine; the
//! layer below it only moves bytes and timing. Everything the driver asks of
//! the hardware goes through [`Rail`], and everything the hardware reports
//! comes back through [`RailClient`] in interrupt context.
//!
//! Events are delivered as a 64-bit mask. Several events may be reported in
//! one call, the client handles them in a fixed order.

use enum_primitive::cast::FromPrimitive;
use enum_primitive::enum_from_primitive;
use kernel::utilities::registers::{register_bitfields, LocalRegisterCopy};
use kernel::ErrorCode;

use capsules_ieee802154::frame::MacAddress;

use crate::band::Band;

register_bitfields![u64,
    pub RailEvents [
        RX_ACK_TIMEOUT OFFSET(2) NUMBITS(1) [],
        RX_PACKET_RECEIVED OFFSET(4) NUMBITS(1) [],
        IEEE802154_DATA_REQUEST_COMMAND OFFSET(16) NUMBITS(1) [],
        RX_SCHEDULED_RX_STARTED OFFSET(19) NUMBITS(1) [],
        RX_SCHEDULED_RX_END OFFSET(20) NUMBITS(1) [],
        RX_SCHEDULED_RX_MISSED OFFSET(21) NUMBITS(1) [],
        TX_PACKET_SENT OFFSET(24) NUMBITS(1) [],
        TXACK_PACKET_SENT OFFSET(25) NUMBITS(1) [],
        TX_ABORTED OFFSET(26) NUMBITS(1) [],
        TXACK_ABORTED OFFSET(27) NUMBITS(1) [],
        TX_BLOCKED OFFSET(28) NUMBITS(1) [],
        TXACK_BLOCKED OFFSET(29) NUMBITS(1) [],
        TX_UNDERFLOW OFFSET(30) NUMBITS(1) [],
        TXACK_UNDERFLOW OFFSET(31) NUMBITS(1) [],
        TX_CHANNEL_BUSY OFFSET(33) NUMBITS(1) [],
        TX_SCHEDULED_TX_STARTED OFFSET(37) NUMBITS(1) [],
        TX_SCHEDULED_TX_MISSED OFFSET(38) NUMBITS(1) [],
        CONFIG_UNSCHEDULED OFFSET(39) NUMBITS(1) [],
        CONFIG_SCHEDULED OFFSET(40) NUMBITS(1) [],
        SCHEDULER_STATUS OFFSET(41) NUMBITS(1) [],
        CAL_NEEDED OFFSET(42) NUMBITS(1) []
    ]
];

pub type EventsCopy = LocalRegisterCopy<u64, RailEvents::Register>;

enum_from_primitive! {
/// Radio state as reported by the hardware.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RadioState {
    Inactive = 0,
    Idle = 1,
    Rx = 2,
    RxActive = 3,
    Tx = 4,
    TxActive = 5,
}
}

impl RadioState {
    /// Decodes the raw state register; unknown values read as inactive.
    pub fn from_raw(raw: u8) -> RadioState {
        RadioState::from_u8(raw).unwrap_or(RadioState::Inactive)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IdleMode {
    /// Finish the current operation before idling.
    Idle,
    /// Abort whatever is in progress.
    Abort,
}

/// Arbitration parameters for a radio operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SchedulerInfo {
    /// Lower values win.
    pub priority: u8,
    pub slip_time_us: u32,
    pub transaction_time_us: u32,
}

/// CSMA-CA and CCA parameters of a transmission.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CsmaConfig {
    pub min_backoff_exp: u8,
    pub max_backoff_exp: u8,
    pub csma_tries: u8,
    pub cca_threshold_dbm: i8,
    pub cca_backoff_us: u16,
    pub cca_duration_us: u16,
    pub timeout_us: u32,
}

impl CsmaConfig {
    /// IEEE 802.15.4 2.4 GHz defaults.
    pub const IEEE802154_2P4GHZ: CsmaConfig = CsmaConfig {
        min_backoff_exp: 3,
        max_backoff_exp: 5,
        csma_tries: 5,
        cca_threshold_dbm: -75,
        cca_backoff_us: 320,
        cca_duration_us: 128,
        timeout_us: 0,
    };

    /// One clear channel assessment without random backoff, used for
    /// scheduled transmissions.
    pub const SINGLE_CCA: CsmaConfig = CsmaConfig {
        min_backoff_exp: 0,
        max_backoff_exp: 0,
        csma_tries: 1,
        cca_threshold_dbm: -75,
        cca_backoff_us: 0,
        cca_duration_us: 128,
        timeout_us: 0,
    };
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// Listen for an ACK after the frame is sent.
    pub wait_for_ack: bool,
}

/// The frame currently being received.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IncomingPacket {
    /// Address filters that matched, see [`crate::filter`].
    pub filter_mask: u8,
    /// Bytes received so far, PHY header included.
    pub packet_bytes: usize,
    /// Bytes copied into the caller's buffer.
    pub copied: usize,
}

/// A completely received frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RxPacket {
    pub filter_mask: u8,
    /// Frame bytes copied to the caller, PHY header included and FCS
    /// excluded.
    pub packet_bytes: usize,
    pub is_ack: bool,
    pub rssi_dbm: i8,
    pub lqi: u8,
    pub channel: u8,
    /// End of the sync word in radio us, if the timestamp is valid.
    pub time_received: Option<u32>,
}

/// Events from the radio, delivered in interrupt context.
pub trait RailClient {
    fn events(&self, events: EventsCopy);

    /// The one-shot timer armed with [`Rail::start_timer_us`] expired.
    fn timer_expired(&self);
}

pub trait Rail<'a> {
    fn set_client(&self, client: &'a dyn RailClient);

    fn idle(&self, mode: IdleMode);
    fn state(&self) -> RadioState;
    /// Hands the radio back to the scheduler for other protocols.
    fn yield_radio(&self);
    fn calibrate(&self) -> Result<(), ErrorCode>;
    /// Outcome of the last scheduler arbitration.
    fn scheduler_status(&self) -> Result<(), ErrorCode>;

    fn load_phy(&self, band: &Band) -> Result<(), ErrorCode>;
    fn symbol_rate(&self) -> u32;
    fn channel(&self) -> Option<u8>;
    /// Free running radio time, in us.
    fn time_us(&self) -> u32;
    fn unique_id(&self) -> u64;

    fn start_rx(&self, channel: u8, info: &SchedulerInfo) -> Result<(), ErrorCode>;
    /// Opens a receive window of `duration` us at absolute time `start`.
    fn start_scheduled_rx(
        &self,
        channel: u8,
        start: u32,
        duration: u32,
        info: &SchedulerInfo,
    ) -> Result<(), ErrorCode>;
    fn set_frame_detection(&self, enabled: bool) -> Result<(), ErrorCode>;

    /// Writes `data` to the transmit FIFO, emptying it first if `reset`.
    /// Returns the number of bytes written.
    fn write_tx_fifo(&self, data: &[u8], reset: bool) -> usize;
    fn start_tx(&self, channel: u8, options: TxOptions, info: &SchedulerInfo)
        -> Result<(), ErrorCode>;
    fn start_cca_csma_tx(
        &self,
        channel: u8,
        options: TxOptions,
        csma: &CsmaConfig,
        info: &SchedulerInfo,
    ) -> Result<(), ErrorCode>;
    /// Transmits at absolute time `when` after the channel assessment
    /// configured by `csma`.
    fn start_scheduled_cca_csma_tx(
        &self,
        channel: u8,
        options: TxOptions,
        when: u32,
        csma: &CsmaConfig,
        info: &SchedulerInfo,
    ) -> Result<(), ErrorCode>;

    fn set_tx_power_deci_dbm(&self, power: i16) -> Result<(), ErrorCode>;
    fn tx_power_deci_dbm(&self) -> i16;
    fn set_cca_threshold(&self, threshold_dbm: i8) -> Result<(), ErrorCode>;
    /// Current RSSI in quarter dBm, `None` if no valid sample is available.
    /// With `wait` the call blocks until a sample is ready.
    fn rssi_quarter_dbm(&self, wait: bool) -> Option<i16>;

    fn set_pan_id(&self, pan_id: u16, index: usize) -> Result<(), ErrorCode>;
    fn set_short_address(&self, address: u16, index: usize) -> Result<(), ErrorCode>;
    /// `address` is in over-the-air byte order.
    fn set_long_address(&self, address: &[u8; 8], index: usize) -> Result<(), ErrorCode>;
    fn set_promiscuous(&self, enabled: bool) -> Result<(), ErrorCode>;

    /// Copies the start of the frame being received into `buf`. Nothing
    /// is copied unless at least `min_bytes` have arrived.
    fn incoming_packet(&self, buf: &mut [u8], min_bytes: usize) -> IncomingPacket;
    /// Source address of the frame being received.
    fn source_address(&self) -> Result<MacAddress, ErrorCode>;
    /// Sets the frame pending bit of the immediate ACK about to be sent.
    fn toggle_frame_pending(&self) -> Result<(), ErrorCode>;
    /// Replaces the immediate ACK with `frame`, PHY header included.
    fn write_enh_ack(&self, frame: &[u8]) -> Result<(), ErrorCode>;
    /// Takes the oldest completely received frame into `buf`.
    fn received_packet(&self, buf: &mut [u8]) -> Option<RxPacket>;

    /// Arms the one-shot us timer, replacing any previous timeout.
    fn start_timer_us(&self, delay: u32) -> Result<(), ErrorCode>;
    fn cancel_timer(&self);
}
