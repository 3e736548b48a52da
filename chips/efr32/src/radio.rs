// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! IEEE 802.15.4 radio driver for the Thread stack.
//!
//! The driver sits between the Thread stack and the vendor radio layer
//! ([`Rail`]). Requests from the stack (receive, transmit, energy scan,
//! address and key configuration) are served synchronously from the main
//! loop. The radio reports back in interrupt context through
//! [`RailClient`]; the interrupt handlers only record outcomes in the
//! [`EventFlags`] and queue received frames, and [`Radio::process`] turns
//! them into stack callbacks.
//!
//! ```text
//!             receive()            transmit()
//!   Sleep ----------------> Receive ------------> Transmit
//!     ^                       ^  |                   |
//!     |        sleep()        |  | energy_scan()     | TX_* outcome,
//!     +-----------------------+  v                   | process() reports it
//!                           Scanning                 |
//!                             |                      |
//!                             +----------------------+--> Receive
//! ```
//!
//! Transmit outcomes are recorded as exactly one of the `TX_*` flags and
//! reported by the next `process()` call as success, channel access failure,
//! no ACK or abort. Malformed received frames are dropped in the interrupt
//! handler and only show up in the debug counters.
//!
//! In multipan builds several Thread instances share the radio. Interface 0
//! is the broadcast interface; a transmit or energy scan requested while the
//! radio is busy is queued and started by `process()` once it is free.

use core::cell::Cell;

use capsules_ieee802154::frame::{
    frame_control, FrameControl, FrameType, FrameVersion, Header, BROADCAST_PAN_ID, DSN_OFFSET, FCS_SIZE, FRAME_FLAG_ACK_REQUEST,
    MAX_PSDU_SIZE, MIN_DATA_FRAME_LENGTH, MIN_FRAME_LENGTH,
};
use capsules_ieee802154::ie::{self, ENH_ACK_PROBING_MAX_DATA};
use kernel::debug;
use kernel::utilities::cells::{MapCell, OptionalCell};
use kernel::utilities::registers::{register_bitfields, FieldValue, LocalRegisterCopy};
use kernel::ErrorCode;

use crate::alarm::Clock;
use crate::band::{self, Band};
use crate::config::{RadioConfig, CONFIG, MAX_INSTANCES, MAX_RADIO_INTERFACES};
use crate::energy_scan::{EnergyScan, ScanMode, ScanStatus, RSSI_INVALID};
use crate::enh_ack::{
    ack_shr_done_time, build_enh_ack, csl_phase, secure_transmit, write_phr,
    CSL_CSMA_BACKOFF_TIME_US, EARLY_FRAME_BYTES, SCHEDULE_TX_DELAY_US, SHR_DURATION_US,
};
use crate::error::RadioError;
use crate::events::{tx_events, Counter, DebugCounters, EventFlags, RadioFlags};
use crate::filter::{iid_from_filter_mask, is_filter_mask_valid, pan_filter_bits};
use crate::link_metrics::{LinkMetrics, LinkMetricsProbing};
use crate::mac_keys::{MacKey, MacKeys};
use crate::platform::{reverse_ext_address, ExtAddress, PlatformClient, RxFrame, TxFrame};
use crate::power::TxPowerManager;
use crate::rail::{
    CsmaConfig, EventsCopy, IdleMode, Rail, RailClient, RailEvents, RadioState, SchedulerInfo,
    TxOptions,
};
use crate::rx_queue::{RxQueue, RX_QUEUE_SIZE};
use crate::source_match::SourceMatchTable;

register_bitfields![u16,
    pub RadioCaps [
        ACK_TIMEOUT OFFSET(0) NUMBITS(1) [],
        ENERGY_SCAN OFFSET(1) NUMBITS(1) [],
        TRANSMIT_RETRIES OFFSET(2) NUMBITS(1) [],
        CSMA_BACKOFF OFFSET(3) NUMBITS(1) [],
        SLEEP_TO_TX OFFSET(4) NUMBITS(1) [],
        TRANSMIT_SEC OFFSET(5) NUMBITS(1) [],
        TRANSMIT_TIMING OFFSET(6) NUMBITS(1) [],
        RECEIVE_TIMING OFFSET(7) NUMBITS(1) []
    ]
];

pub type CapsCopy = LocalRegisterCopy<u16, RadioCaps::Register>;

const FRAME_TYPE_MASK: u8 = 0x07;
const FRAME_FLAG_FRAME_PENDING: u8 = 1 << 4;
const US_PER_MS: u32 = 1000;

/// Radio state as reported to the stack.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhyState {
    Disabled,
    Sleep,
    Receive,
    Transmit,
}

/// A request deferred while the radio was busy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PendingCommand {
    Transmit { iid: u8 },
    EnergyScan { iid: u8, channel: u8, duration_ms: u16 },
}

/// What the interrupt handlers need to know about the frame on the air.
#[derive(Copy, Clone, Debug, Default)]
struct CurrentTx {
    iid: u8,
    seq: u8,
    ack_requested: bool,
    is_command: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TxFailure {
    ChannelBusy,
    Failed,
    SchedulerError,
}

fn any_event(events: EventsCopy, which: FieldValue<u64, RailEvents::Register>) -> bool {
    events.get() & which.mask() != 0
}

pub struct Radio<'a> {
    rail: &'a dyn Rail<'a>,
    clock: &'a dyn Clock,
    config: &'a RadioConfig,
    bands: &'a [Band],
    current_band: Cell<Option<usize>>,
    client: OptionalCell<&'a dyn PlatformClient>,

    flags: EventFlags,
    counters: DebugCounters,

    tx_frames: [MapCell<TxFrame>; MAX_INSTANCES],
    tx_priority: [Cell<u8>; MAX_INSTANCES],
    current_tx: Cell<CurrentTx>,
    ack_frame: MapCell<RxFrame>,
    rx_queue: RxQueue<RxFrame, RX_QUEUE_SIZE>,
    rx_channel: Cell<u8>,
    pending: RxQueue<PendingCommand, MAX_INSTANCES>,

    scan: EnergyScan<'a>,
    scan_iid: Cell<u8>,
    power: TxPowerManager<'a>,
    mac_keys: [MacKeys; MAX_RADIO_INTERFACES],
    ext_addresses: [Cell<ExtAddress>; MAX_RADIO_INTERFACES],
    source_match: SourceMatchTable,
    link_metrics: LinkMetricsProbing,

    enabled: Cell<bool>,
    csl_period: Cell<u16>,
    csl_sample_time: Cell<u32>,
    cca_threshold: Cell<i8>,
    promiscuous: Cell<bool>,
    src_match_enabled: Cell<bool>,
    /// The last frame sent was a data poll answered with frame pending: keep
    /// the radio until the data arrives.
    pending_data: Cell<bool>,
    last_rssi: Cell<i8>,
    last_lqi: Cell<u8>,
    /// PAN filter bits of the instances that have a PAN ID.
    filter_mask_enabled: Cell<u8>,
}

impl<'a> Radio<'a> {
    pub fn new(
        rail: &'a dyn Rail<'a>,
        clock: &'a dyn Clock,
        config: &'a RadioConfig,
        bands: &'a [Band],
    ) -> Radio<'a> {
        Radio {
            rail,
            clock,
            config,
            bands,
            current_band: Cell::new(None),
            client: OptionalCell::empty(),
            flags: EventFlags::new(),
            counters: DebugCounters::new(),
            tx_frames: core::array::from_fn(|_| MapCell::new(TxFrame::new())),
            tx_priority: core::array::from_fn(|_| Cell::new(config.tx_priority_min)),
            current_tx: Cell::new(CurrentTx::default()),
            ack_frame: MapCell::new(RxFrame::new()),
            rx_queue: RxQueue::new(RxFrame::new()),
            rx_channel: Cell::new(bands.first().map_or(0, |band| band.channel_min)),
            pending: RxQueue::new(PendingCommand::Transmit { iid: 0 }),
            scan: EnergyScan::new(rail),
            scan_iid: Cell::new(0),
            power: TxPowerManager::new(rail, config, Band::for_config(config)),
            mac_keys: core::array::from_fn(|_| MacKeys::new()),
            ext_addresses: core::array::from_fn(|_| Cell::new([0; 8])),
            source_match: SourceMatchTable::new(),
            link_metrics: LinkMetricsProbing::new(config.receive_sensitivity_dbm),
            enabled: Cell::new(false),
            csl_period: Cell::new(0),
            csl_sample_time: Cell::new(0),
            cca_threshold: Cell::new(config.cca_threshold_dbm),
            promiscuous: Cell::new(false),
            src_match_enabled: Cell::new(false),
            pending_data: Cell::new(false),
            last_rssi: Cell::new(0),
            last_lqi: Cell::new(0),
            filter_mask_enabled: Cell::new(0),
        }
    }

    /// Loads the first band and connects the driver to the radio. Called
    /// once at start-up.
    pub fn init(&'a self) -> Result<(), RadioError> {
        self.power.init();
        self.scan.set_idle();
        self.counters.enable(self.config.debug_counters);
        self.rail.set_client(self);

        let first = self.bands.first().ok_or(RadioError::InvalidArgs)?;
        self.load_channel_config(first.channel_min, self.power.tx_power_for_channel(first.channel_min))?;
        self.flags.set(RadioFlags::INIT_DONE::SET);
        Ok(())
    }

    pub fn set_client(&self, client: &'a dyn PlatformClient) {
        self.client.set(client);
    }

    /// Transmit buffer of slot `iid`, index 0 serving interfaces 0 and 1.
    fn slot(&self, iid: u8) -> usize {
        if self.config.multipan {
            (iid as usize).saturating_sub(1).min(MAX_INSTANCES - 1)
        } else {
            0
        }
    }

    fn signal_pending(&self) {
        self.client.map(|client| client.signal_pending());
    }

    /// Gives the stack access to the transmit buffer of `iid`. The buffer
    /// must not be changed while a transmission from it is in progress.
    pub fn transmit_buffer<R, F: FnOnce(&mut TxFrame) -> R>(&self, iid: u8, f: F) -> Option<R> {
        self.tx_frames[self.slot(iid)].map(f)
    }

    /// Makes sure the band of `channel` is loaded, then applies `power`.
    fn load_channel_config(&self, channel: u8, power: i8) -> Result<(), RadioError> {
        let index = band::lookup(self.bands, channel).ok_or(RadioError::InvalidArgs)?;
        if self.current_band.get() != Some(index) {
            self.rail.idle(IdleMode::Idle);
            self.rail.load_phy(&self.bands[index])?;
            self.current_band.set(Some(index));
        }
        self.power.apply(power)
    }

    fn set_idle(&self) {
        if self.rail.state() != RadioState::Idle {
            self.rail.idle(IdleMode::Idle);
        }
        self.rail.yield_radio();
    }

    fn is_busy(&self) -> bool {
        self.scan.status() != ScanStatus::Idle
            || self.flags.is_set(RadioFlags::ONGOING_TX_DATA)
            || self.flags.any(tx_events())
    }

    fn push_pending(&self, command: PendingCommand) {
        if !self.pending.enqueue(command) {
            panic!("efr32: more pending radio commands than instances");
        }
    }

    // Enable, disable, sleep and receive

    /// The radio stays initialized; enabling only gates the stack's view.
    pub fn enable(&self) -> Result<(), RadioError> {
        self.enabled.set(true);
        Ok(())
    }

    pub fn disable(&self) -> Result<(), RadioError> {
        self.enabled.set(false);
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.is_set(RadioFlags::INIT_DONE) && self.enabled.get()
    }

    /// Idles the radio. Fails while a data frame is being sent.
    pub fn sleep(&self) -> Result<(), RadioError> {
        if self.flags.is_set(RadioFlags::ONGOING_TX_DATA) {
            return Err(RadioError::Busy);
        }
        self.flags.clear(RadioFlags::SCHEDULED_RX_PENDING::SET);
        self.set_idle();
        Ok(())
    }

    pub fn receive(&self, channel: u8) -> Result<(), RadioError> {
        if self.flags.is_set(RadioFlags::ONGOING_TX_DATA)
            || self.scan.status() == ScanStatus::InProgress
        {
            return Err(RadioError::InvalidState);
        }

        self.load_channel_config(channel, self.power.tx_power_for_current_channel())?;
        self.rail
            .start_rx(channel, &self.background_rx())
            .map_err(|e| {
                if CONFIG.debug_radio {
                    debug!("efr32: start rx on {} failed: {:?}", channel, e);
                }
                RadioError::Failed
            })?;
        self.flags.clear(RadioFlags::SCHEDULED_RX_PENDING::SET);
        self.rx_channel.set(channel);
        Ok(())
    }

    /// Opens a receive window of `duration` us at radio time `start`.
    pub fn receive_at(&self, channel: u8, start: u32, duration: u32) -> Result<(), RadioError> {
        if self
            .flags
            .any(RadioFlags::SCHEDULED_TX_PENDING::SET + RadioFlags::SCHEDULED_TX_STARTED::SET)
        {
            return Err(RadioError::Failed);
        }

        self.load_channel_config(channel, self.power.tx_power_for_current_channel())?;
        // The window may open before the call returns.
        self.flags.set(RadioFlags::SCHEDULED_RX_PENDING::SET);
        if self
            .rail
            .start_scheduled_rx(channel, start, duration, &self.background_rx())
            .is_err()
        {
            self.flags.clear(RadioFlags::SCHEDULED_RX_PENDING::SET);
            return Err(RadioError::Failed);
        }
        self.rx_channel.set(channel);
        Ok(())
    }

    fn background_rx(&self) -> SchedulerInfo {
        SchedulerInfo {
            priority: self.config.background_rx_priority,
            slip_time_us: 0,
            transaction_time_us: 0,
        }
    }

    // Transmit

    /// Sends the frame in the transmit buffer of `iid`. The outcome is
    /// reported through `transmit_done` by a later `process()` call.
    pub fn transmit(&self, iid: u8) -> Result<(), RadioError> {
        if self.config.multipan {
            if iid == 0 || iid as usize >= self.config.radio_interface_count() {
                return Err(RadioError::InvalidArgs);
            }
            if self.is_busy() {
                self.push_pending(PendingCommand::Transmit { iid });
                return Ok(());
            }
        }
        if self.flags.is_set(RadioFlags::ONGOING_TX_DATA)
            || self.scan.status() == ScanStatus::InProgress
        {
            return Err(RadioError::InvalidState);
        }

        let slot = self.slot(iid);
        let channel = self.tx_frames[slot]
            .map(|frame| frame.channel)
            .ok_or(RadioError::InvalidState)?;
        self.load_channel_config(channel, self.power.tx_power_for_current_channel())?;

        let is_retx = self.tx_frames[slot].map_or(false, |frame| frame.is_retx);
        let priority = self
            .config
            .next_tx_priority(self.tx_priority[slot].get(), is_retx);
        self.tx_priority[slot].set(priority);

        self.flags.clear(tx_events());
        let csma = self.tx_frames[slot].map_or(true, |frame| frame.csma_ca_enabled);
        self.flags.write(RadioFlags::CURRENT_TX_USE_CSMA, csma);

        if self.csl_period.get() > 0 {
            let needs_delay = self.tx_frames[slot].map_or(false, |frame| frame.tx_delay == 0);
            if needs_delay {
                let now = self.rail.time_us();
                self.tx_frames[slot].map(|frame| {
                    frame.tx_delay_base_time = now;
                    frame.tx_delay = SCHEDULE_TX_DELAY_US;
                });
            }
        }

        if self.config.enhanced_ack {
            self.update_csl_ie(slot);
            self.secure_frame(iid, slot)?;
        }

        let current = self.tx_frames[slot]
            .map(|frame| CurrentTx {
                iid,
                seq: frame.psdu[DSN_OFFSET],
                ack_requested: frame.psdu[0] & FRAME_FLAG_ACK_REQUEST != 0,
                is_command: frame.psdu[0] & FRAME_TYPE_MASK == FrameType::MacCommand as u8,
            })
            .unwrap_or_default();
        self.current_tx.set(current);

        self.flags.set(RadioFlags::ONGOING_TX_DATA::SET);
        self.tx_current_packet();

        if !self.flags.is_set(RadioFlags::TX_FAILED) {
            if let Some(frame) = self.tx_frames[slot].map(|frame| *frame) {
                self.client.map(|client| client.transmit_started(iid, &frame));
            }
        }
        Ok(())
    }

    /// Writes the CSL phase for the moment the frame's SHR will be sent.
    fn update_csl_ie(&self, slot: usize) {
        let period = self.csl_period.get();
        if period == 0 {
            return;
        }
        let sample_time = self.csl_sample_time.get();
        self.tx_frames[slot].map(|frame| {
            if frame.is_header_updated {
                return;
            }
            let length = frame.length;
            let Ok(header) = Header::decode(&frame.psdu[..length]) else {
                return;
            };
            let shr_time = frame
                .tx_delay_base_time
                .wrapping_add(frame.tx_delay)
                .wrapping_add(SHR_DURATION_US);
            let phase = csl_phase(sample_time, shr_time, period);
            let end = length - header.footer_length();
            if let Err(e) = ie::set_csl_ie(&mut frame.psdu[..end], header.ie_offset, period, phase) {
                if CONFIG.debug_radio {
                    debug!("efr32: no CSL IE to update: {:?}", e);
                }
            }
        });
    }

    fn secure_frame(&self, iid: u8, slot: usize) -> Result<(), RadioError> {
        let keys = &self.mac_keys[iid as usize];
        let ext_address = self.ext_addresses[iid as usize].get();
        self.tx_frames[slot]
            .map(|frame| {
                if frame.is_security_processed {
                    return Ok(());
                }
                let length = frame.length;
                if secure_transmit(&mut frame.psdu[..length], frame.is_header_updated, keys, &ext_address)? {
                    frame.is_security_processed = true;
                    frame.is_header_updated = true;
                }
                Ok(())
            })
            .unwrap_or(Err(RadioError::InvalidState))
            .map_err(|e| {
                if CONFIG.debug_radio {
                    debug!("efr32: transmit security failed: {:?}", e);
                }
                e
            })
    }

    fn tx_current_packet(&self) {
        let current = self.current_tx.get();
        let Some(frame) = self.tx_frames[self.slot(current.iid)].map(|frame| *frame) else {
            return;
        };

        let mut phr = [0u8; 2];
        let phr_len = write_phr(&mut phr, self.config.phr_size, frame.length);
        self.rail.write_tx_fifo(&phr[..phr_len], true);
        self.rail
            .write_tx_fifo(&frame.psdu[..frame.length.saturating_sub(FCS_SIZE)], false);

        let info = SchedulerInfo {
            priority: self.tx_priority[self.slot(current.iid)].get(),
            slip_time_us: self.config.tx_slip_time_us,
            transaction_time_us: 0,
        };
        let options = TxOptions {
            wait_for_ack: current.ack_requested,
        };

        // A pending scheduled receive gives way to the transmission.
        if self.flags.is_set(RadioFlags::SCHEDULED_RX_PENDING) {
            self.rail.idle(IdleMode::Idle);
            self.flags.clear(
                RadioFlags::SCHEDULED_RX_PENDING::SET + RadioFlags::SCHEDULED_RX_STARTED::SET,
            );
        }

        let result = if frame.tx_delay == 0 {
            if self.flags.is_set(RadioFlags::CURRENT_TX_USE_CSMA) {
                let csma = CsmaConfig {
                    csma_tries: frame.max_csma_backoffs,
                    cca_threshold_dbm: self.cca_threshold.get(),
                    ..CsmaConfig::IEEE802154_2P4GHZ
                };
                self.rail
                    .start_cca_csma_tx(frame.channel, options, &csma, &info)
            } else {
                self.rail.start_tx(frame.channel, options, &info)
            }
        } else {
            // Start early enough for one CCA to finish before the SHR is due.
            let when = frame
                .tx_delay_base_time
                .wrapping_add(frame.tx_delay)
                .wrapping_sub(SHR_DURATION_US)
                .wrapping_sub(CSL_CSMA_BACKOFF_TIME_US);
            let csma = CsmaConfig {
                cca_backoff_us: CSL_CSMA_BACKOFF_TIME_US as u16,
                cca_threshold_dbm: self.cca_threshold.get(),
                ..CsmaConfig::SINGLE_CCA
            };
            let result =
                self.rail
                    .start_scheduled_cca_csma_tx(frame.channel, options, when, &csma, &info);
            if result.is_ok() {
                self.flags.set(RadioFlags::SCHEDULED_TX_PENDING::SET);
                self.counters.increment(Counter::ScheduledTxStarted);
            }
            result
        };

        match result {
            Ok(()) => self.counters.increment(Counter::TxStarted),
            Err(e) => {
                self.counters.increment(Counter::TxStartFailed);
                if CONFIG.debug_radio {
                    debug!("efr32: start tx on {} failed: {:?}", frame.channel, e);
                }
                self.tx_failed(TxFailure::Failed);
                self.signal_pending();
            }
        }
    }

    // Transmit outcomes, interrupt context

    fn tx_failed(&self, failure: TxFailure) {
        if !self.flags.is_set(RadioFlags::ONGOING_TX_DATA) {
            return;
        }
        match failure {
            TxFailure::ChannelBusy => {
                self.flags.set(RadioFlags::TX_CCA_FAILED::SET);
                self.flags.clear(RadioFlags::CURRENT_TX_USE_CSMA::SET);
                self.counters.increment(Counter::TxChannelBusy);
            }
            TxFailure::Failed => {
                self.flags.set(RadioFlags::TX_FAILED::SET);
                self.counters.increment(Counter::TxAborted);
            }
            TxFailure::SchedulerError => {
                self.flags.set(RadioFlags::TX_SCHEDULER_ERROR::SET);
                self.counters.increment(Counter::TxAborted);
            }
        }
        self.flags.clear(
            RadioFlags::ONGOING_TX_DATA::SET
                + RadioFlags::WAITING_FOR_ACK::SET
                + RadioFlags::SCHEDULED_TX_STARTED::SET,
        );
        self.rail.yield_radio();
    }

    fn tx_ack_failed(&self) {
        self.flags.clear(RadioFlags::ONGOING_TX_ACK::SET);
    }

    fn packet_sent(&self, is_ack: bool) {
        if is_ack {
            self.flags.clear(RadioFlags::ONGOING_TX_ACK::SET);
            if self.pending_data.get() {
                self.rail.yield_radio();
                self.pending_data.set(false);
            }
        } else if self.flags.is_set(RadioFlags::ONGOING_TX_DATA) {
            self.flags.clear(RadioFlags::CURRENT_TX_USE_CSMA::SET);
            if self.current_tx.get().ack_requested {
                self.flags.set(RadioFlags::WAITING_FOR_ACK::SET);
            } else {
                self.rail.yield_radio();
                self.flags.set(RadioFlags::TX_SUCCESS::SET);
                self.flags.clear(
                    RadioFlags::ONGOING_TX_DATA::SET + RadioFlags::SCHEDULED_TX_STARTED::SET,
                );
            }
            self.counters.increment(Counter::TxPacketSent);
        }
    }

    fn ack_timeout(&self) {
        self.flags.set(RadioFlags::TX_NO_ACK::SET);
        self.flags.clear(
            RadioFlags::ONGOING_TX_DATA::SET
                + RadioFlags::SCHEDULED_TX_STARTED::SET
                + RadioFlags::WAITING_FOR_ACK::SET,
        );
        self.counters.increment(Counter::TxNoAck);
        self.rail.yield_radio();
        self.pending_data.set(false);
    }

    fn scheduler_event(&self) {
        if self.rail.scheduler_status().is_ok() {
            return;
        }
        self.flags.clear(
            RadioFlags::SCHEDULED_RX_PENDING::SET
                + RadioFlags::SCHEDULED_TX_PENDING::SET
                + RadioFlags::SCHEDULED_TX_STARTED::SET,
        );
        if self.flags.is_set(RadioFlags::ONGOING_TX_ACK) {
            self.tx_ack_failed();
        }
        // A data frame that lost arbitration counts as a busy channel.
        if self.flags.is_set(RadioFlags::ONGOING_TX_DATA) {
            self.tx_failed(TxFailure::ChannelBusy);
        }
        if self.flags.is_set(RadioFlags::WAITING_FOR_ACK) {
            self.ack_timeout();
        }
        self.counters.increment(Counter::SchedulerError);
    }

    // Receive, interrupt context

    fn psdu_length(&self, phr: &[u8]) -> usize {
        if self.config.phr_size == 2 {
            phr[1].reverse_bits() as usize
        } else {
            phr[0] as usize
        }
    }

    /// 64-bit time of `timestamp`, which lies in the recent past.
    fn extend_timestamp(&self, timestamp: u32) -> u64 {
        let now = self.clock.time_get();
        let mut wraps = (now >> 32) as u32;
        if (now as u32) <= timestamp {
            wraps = wraps.wrapping_sub(1);
        }
        timestamp as u64 + ((wraps as u64) << 32)
    }

    fn packet_received(&self) {
        let phr_size = self.config.phr_size;
        let mut buf = [0u8; MAX_PSDU_SIZE + 2];
        let Some(packet) = self.rail.received_packet(&mut buf) else {
            self.counters.increment(Counter::RxDropped);
            return;
        };

        if !is_filter_mask_valid(packet.filter_mask, self.config.multipan) {
            self.counters.increment(Counter::RxFilterMismatch);
            return;
        }
        if packet.packet_bytes <= phr_size || packet.packet_bytes > buf.len() {
            self.counters.increment(Counter::RxBadLength);
            return;
        }
        let length = packet.packet_bytes - phr_size + FCS_SIZE;
        if self.psdu_length(&buf) != length || !(MIN_FRAME_LENGTH..=MAX_PSDU_SIZE).contains(&length)
        {
            self.counters.increment(Counter::RxBadLength);
            return;
        }

        let psdu = &buf[phr_size..phr_size + length - FCS_SIZE];
        let fcf = psdu[0];
        let iid = iid_from_filter_mask(
            packet.filter_mask,
            self.filter_mask_enabled.get(),
            self.config.multipan,
        );
        let current = self.current_tx.get();
        let is_data_request =
            self.flags.is_set(RadioFlags::ONGOING_TX_DATA) && current.is_command;

        if packet.is_ack {
            if fcf & FRAME_TYPE_MASK != FrameType::Ack as u8 {
                self.counters.increment(Counter::RxDropped);
                return;
            }
            self.ack_frame.map(|ack| {
                ack.psdu = [0; MAX_PSDU_SIZE];
                ack.psdu[..psdu.len()].copy_from_slice(psdu);
                ack.length = length;
            });
            self.counters.increment(Counter::RxAckReceived);

            let waiting = self.flags.is_set(RadioFlags::ONGOING_TX_DATA) && current.ack_requested;
            if waiting && psdu[DSN_OFFSET] == current.seq {
                let Some(time) = packet.time_received else {
                    self.counters.increment(Counter::RxBadTimestamp);
                    return;
                };
                let timestamp = self.extend_timestamp(time);
                self.ack_frame.map(|ack| {
                    ack.rssi = packet.rssi_dbm;
                    ack.lqi = packet.lqi;
                    ack.iid = iid;
                    ack.channel = packet.channel;
                    ack.timestamp = timestamp;
                });

                self.flags.set(RadioFlags::TX_SUCCESS::SET);
                self.flags.clear(
                    RadioFlags::WAITING_FOR_ACK::SET
                        + RadioFlags::ONGOING_TX_DATA::SET
                        + RadioFlags::SCHEDULED_TX_STARTED::SET,
                );
                if is_data_request && fcf & FRAME_FLAG_FRAME_PENDING != 0 {
                    self.pending_data.set(true);
                }
            }
            // Keep the radio after a data poll: the data may follow.
            if !is_data_request {
                self.rail.yield_radio();
            }
            return;
        }

        if !self.promiscuous.get() && length < MIN_DATA_FRAME_LENGTH {
            self.counters.increment(Counter::RxBadLength);
            return;
        }
        let Some(time) = packet.time_received else {
            self.counters.increment(Counter::RxBadTimestamp);
            return;
        };
        if self.rx_queue.is_full() {
            self.counters.increment(Counter::RxQueueFull);
            return;
        }

        let acked_fp = self.flags.is_set(RadioFlags::ACK_SENT_WITH_FP_SET);
        let acked_secured = self.flags.is_set(RadioFlags::SECURED_ACK_SENT);
        self.flags
            .clear(RadioFlags::ACK_SENT_WITH_FP_SET::SET + RadioFlags::SECURED_ACK_SENT::SET);

        let queued = self.rx_queue.enqueue_with(|frame| {
            *frame = RxFrame::new();
            frame.psdu[..psdu.len()].copy_from_slice(psdu);
            frame.length = length;
            frame.channel = packet.channel;
            frame.rssi = packet.rssi_dbm;
            frame.lqi = packet.lqi;
            frame.timestamp = time as u64;
            frame.iid = iid;
            frame.acked_with_frame_pending = acked_fp;
            frame.acked_with_sec_enh_ack = acked_secured;
            true
        });
        if !queued {
            self.counters.increment(Counter::RxQueueFull);
            return;
        }
        self.counters.increment(Counter::RxPacketQueued);

        if fcf & FRAME_FLAG_ACK_REQUEST != 0 {
            self.flags.set(RadioFlags::ONGOING_TX_ACK::SET);
        } else if self.pending_data.get() {
            // The data that answered our poll needs no ACK.
            self.rail.yield_radio();
            self.pending_data.set(false);
        }
    }

    /// An ACK-requesting frame's addressing fields are in: decide the ACK's
    /// frame pending bit, or build an enhanced ACK for a 2015 frame.
    fn data_request(&self) {
        let now = self.clock.micro_now();
        if self.config.enhanced_ack && self.write_enh_ack(now) {
            return;
        }

        let phr_size = self.config.phr_size;
        let mut buf = [0u8; 6];
        let incoming = self
            .rail
            .incoming_packet(&mut buf[..phr_size + 3], phr_size + 2);
        let fcf = if incoming.copied > phr_size {
            buf[phr_size]
        } else {
            0
        };

        let result = if self.src_match_enabled.get() {
            self.rail.source_address().and_then(|source| {
                let iid = iid_from_filter_mask(
                    incoming.filter_mask,
                    self.filter_mask_enabled.get(),
                    self.config.multipan,
                );
                if self.source_match.contains(iid, &source) {
                    self.rail.toggle_frame_pending().map(|()| true)
                } else {
                    Ok(false)
                }
            })
        } else if fcf & FRAME_TYPE_MASK != FrameType::Data as u8 {
            self.rail.toggle_frame_pending().map(|()| true)
        } else {
            Ok(false)
        };

        match result {
            Ok(true) => self.flags.set(RadioFlags::ACK_SENT_WITH_FP_SET::SET),
            Ok(false) => {}
            Err(ErrorCode::ALREADY) => {
                if CONFIG.debug_radio {
                    debug!("efr32: too late to modify outgoing frame pending");
                }
            }
            Err(e) => {
                if CONFIG.debug_radio {
                    debug!("efr32: frame pending lookup failed: {:?}", e);
                }
            }
        }
    }

    /// Builds and hands over the enhanced ACK for the frame being received.
    /// Returns false if the frame wants an immediate ACK instead.
    fn write_enh_ack(&self, now: u32) -> bool {
        let phr_size = self.config.phr_size;
        let mut rx = [0u8; EARLY_FRAME_BYTES];
        let incoming = self.rail.incoming_packet(&mut rx, phr_size + 2);
        if incoming.copied == 0 {
            return true;
        }

        let frame_length = self.psdu_length(&rx);
        let rx_psdu = &rx[phr_size..incoming.copied];
        let is_2015 = frame_control(rx_psdu).is_some_and(|fcf| {
            fcf.read(FrameControl::FRAME_VERSION) == FrameVersion::V2015 as u16
        });
        if !is_2015 {
            return false;
        }
        let Ok(header) = Header::decode_partial(rx_psdu) else {
            return true;
        };

        let iid = iid_from_filter_mask(
            incoming.filter_mask,
            self.filter_mask_enabled.get(),
            self.config.multipan,
        );
        let frame_pending = self.src_match_enabled.get()
            && header
                .src_addr
                .is_some_and(|source| self.source_match.contains(iid, &source));

        let mut probing = [0u8; ENH_ACK_PROBING_MAX_DATA];
        let probing_len = match header.src_addr {
            Some(source) if self.config.link_metrics_subject => self.link_metrics.enh_ack_data(
                &source,
                self.last_lqi.get(),
                self.last_rssi.get(),
                &mut probing,
            ),
            _ => 0,
        };

        let period = self.csl_period.get();
        let csl = (self.config.csl_receiver && period > 0).then(|| {
            let shr_done = ack_shr_done_time(now, incoming.packet_bytes, frame_length, self.config);
            (period, csl_phase(self.csl_sample_time.get(), shr_done, period))
        });

        let mut ack = [0u8; MAX_PSDU_SIZE + 2];
        let length = match build_enh_ack(
            &header,
            rx_psdu,
            frame_pending,
            csl,
            &probing[..probing_len],
            &mut ack[phr_size..],
        ) {
            Ok(length) => length,
            Err(e) => {
                if CONFIG.debug_radio {
                    debug!("efr32: enhanced ACK generation failed: {:?}", e);
                }
                return true;
            }
        };

        if header.security_enabled() {
            let keys = &self.mac_keys[iid as usize];
            let ext_address = self.ext_addresses[iid as usize].get();
            match secure_transmit(&mut ack[phr_size..phr_size + length], false, keys, &ext_address) {
                Ok(true) => self.flags.set(RadioFlags::SECURED_ACK_SENT::SET),
                Ok(false) => {}
                Err(e) => {
                    if CONFIG.debug_radio {
                        debug!("efr32: enhanced ACK security failed: {:?}", e);
                    }
                    return true;
                }
            }
        }
        if frame_pending {
            self.flags.set(RadioFlags::ACK_SENT_WITH_FP_SET::SET);
        }

        write_phr(&mut ack, phr_size, length);
        if self.rail.write_enh_ack(&ack[..phr_size + length]).is_err() {
            self.counters.increment(Counter::EnhAckWriteFailed);
        }
        true
    }

    // Main loop

    /// Delivers received frames, the transmit outcome and a finished energy
    /// scan to the stack, then starts deferred requests.
    pub fn process(&self) {
        while let Some(mut frame) = self.rx_queue.dequeue() {
            frame.timestamp = self.extend_timestamp(frame.timestamp as u32);
            let keys = &self.mac_keys[frame.iid as usize];
            frame.ack_key_id = keys.ack_key_id();
            frame.ack_frame_counter = keys.ack_frame_counter();
            self.last_rssi.set(frame.rssi);
            self.last_lqi.set(frame.lqi);

            self.client.map(|client| {
                if self.config.multipan && frame.iid == 0 {
                    for iid in 1..self.config.radio_interface_count() {
                        client.receive_done(iid as u8, Ok(&frame));
                    }
                } else {
                    client.receive_done(frame.iid, Ok(&frame));
                }
            });
            self.signal_pending();
        }

        self.process_tx_complete();

        if self.scan.mode() == ScanMode::Async && self.scan.status() == ScanStatus::Completed {
            self.scan.set_idle();
            let result = self.scan.result();
            self.client
                .map(|client| client.energy_scan_done(self.scan_iid.get(), result));
            self.signal_pending();
        }

        if self.config.multipan {
            while !self.is_busy() {
                let Some(command) = self.pending.dequeue() else {
                    break;
                };
                let result = match command {
                    PendingCommand::Transmit { iid } => self.transmit(iid),
                    PendingCommand::EnergyScan {
                        iid,
                        channel,
                        duration_ms,
                    } => self.energy_scan(iid, channel, duration_ms),
                };
                if let Err(e) = result {
                    if CONFIG.debug_radio {
                        debug!("efr32: deferred {:?} failed: {:?}", command, e);
                    }
                    self.deferred_failed(command);
                }
            }
        }
    }

    /// The caller was told its request was accepted, so it still gets a
    /// completion.
    fn deferred_failed(&self, command: PendingCommand) {
        match command {
            PendingCommand::Transmit { iid } => {
                let Some(frame) = self.tx_frames[self.slot(iid)].map(|frame| *frame) else {
                    return;
                };
                self.client
                    .map(|client| client.transmit_done(iid, &frame, None, Err(RadioError::Abort)));
            }
            // A scan that failed after starting reports through `process()`.
            PendingCommand::EnergyScan { iid, .. } => {
                if self.scan.status() == ScanStatus::Idle {
                    self.client
                        .map(|client| client.energy_scan_done(iid, RSSI_INVALID));
                }
            }
        }
    }

    fn process_tx_complete(&self) {
        if !self.flags.any(tx_events()) {
            return;
        }
        let flags = self.flags.get();
        let current = self.current_tx.get();
        let result = if flags.is_set(RadioFlags::TX_SUCCESS) {
            Ok(())
        } else if flags.is_set(RadioFlags::TX_CCA_FAILED) {
            Err(RadioError::ChannelAccessFailure)
        } else if flags.is_set(RadioFlags::TX_NO_ACK) {
            Err(RadioError::NoAck)
        } else {
            Err(RadioError::Abort)
        };
        self.flags.clear(tx_events());

        if CONFIG.debug_radio {
            if let Err(e) = result {
                debug!("efr32: transmit failed: {:?}", e);
            }
        }

        let ack = match result {
            Ok(()) if current.ack_requested => self.ack_frame.map(|ack| *ack),
            _ => None,
        };
        let slot = self.slot(current.iid);
        let frame = self.tx_frames[slot].map(|frame| {
            frame.tx_delay_base_time = 0;
            frame.tx_delay = 0;
            *frame
        });
        if let Some(frame) = frame {
            self.client
                .map(|client| client.transmit_done(current.iid, &frame, ack.as_ref(), result));
        }
        self.counters.increment(Counter::TxDoneCallback);
        self.signal_pending();
    }

    // Energy scan and RSSI

    fn start_energy_scan(&self, mode: ScanMode, channel: u8, averaging_us: u32) -> Result<(), RadioError> {
        self.scan.begin(mode)?;
        self.rail.idle(IdleMode::Idle);

        let Some(index) = band::lookup(self.bands, channel) else {
            self.scan.set_idle();
            return Err(RadioError::InvalidArgs);
        };

        let started = self.load_scan_band(index).and_then(|()| {
            self.scan.arm(averaging_us)?;
            self.rail.set_frame_detection(false)?;
            self.rail.start_rx(channel, &self.background_rx())?;
            self.scan.dwell()?;
            Ok(())
        });
        started.map_err(|e| {
            if CONFIG.debug_radio {
                debug!("efr32: energy scan on {} failed: {:?}", channel, e);
            }
            self.scan.abort();
            self.scan.complete(RSSI_INVALID);
            self.signal_pending();
            RadioError::Failed
        })
    }

    fn load_scan_band(&self, index: usize) -> Result<(), RadioError> {
        if self.current_band.get() != Some(index) {
            self.rail.load_phy(&self.bands[index])?;
            self.current_band.set(Some(index));
        }
        Ok(())
    }

    /// Samples `channel` for `duration_ms` and reports the peak energy
    /// through `energy_scan_done`.
    pub fn energy_scan(&self, iid: u8, channel: u8, duration_ms: u16) -> Result<(), RadioError> {
        if band::lookup(self.bands, channel).is_none() {
            return Err(RadioError::InvalidArgs);
        }
        if self.config.multipan && self.is_busy() {
            self.push_pending(PendingCommand::EnergyScan {
                iid,
                channel,
                duration_ms,
            });
            return Ok(());
        }
        if self.flags.is_set(RadioFlags::ONGOING_TX_DATA) {
            return Err(RadioError::Busy);
        }
        self.scan_iid.set(iid);
        self.start_energy_scan(ScanMode::Async, channel, duration_ms as u32 * US_PER_MS)
    }

    /// Current energy on the receive channel, waiting for the reading.
    /// [`RSSI_INVALID`] if no reading could be taken.
    pub fn get_rssi(&self) -> i8 {
        if self.flags.is_set(RadioFlags::ONGOING_TX_DATA) {
            return RSSI_INVALID;
        }
        match self.start_energy_scan(
            ScanMode::Sync,
            self.rx_channel.get(),
            self.config.rssi_averaging_time_us,
        ) {
            Ok(()) => self.scan.wait(self.config.rssi_averaging_timeout_us),
            Err(RadioError::Busy) => RSSI_INVALID,
            Err(_) => {
                self.scan.abort();
                RSSI_INVALID
            }
        }
    }

    // Configuration

    pub fn caps(&self) -> CapsCopy {
        let mut caps = RadioCaps::ACK_TIMEOUT::SET
            + RadioCaps::CSMA_BACKOFF::SET
            + RadioCaps::ENERGY_SCAN::SET
            + RadioCaps::SLEEP_TO_TX::SET;
        if self.config.enhanced_ack {
            caps += RadioCaps::TRANSMIT_SEC::SET
                + RadioCaps::TRANSMIT_TIMING::SET
                + RadioCaps::RECEIVE_TIMING::SET;
        }
        CapsCopy::new(caps.value)
    }

    pub fn state(&self) -> PhyState {
        match self.rail.state() {
            RadioState::Rx | RadioState::RxActive => PhyState::Receive,
            RadioState::Tx | RadioState::TxActive => PhyState::Transmit,
            RadioState::Idle => PhyState::Sleep,
            RadioState::Inactive => PhyState::Disabled,
        }
    }

    pub fn promiscuous(&self) -> bool {
        self.promiscuous.get()
    }

    pub fn set_promiscuous(&self, enabled: bool) -> Result<(), RadioError> {
        self.promiscuous.set(enabled);
        self.rail.set_promiscuous(enabled)?;
        Ok(())
    }

    pub fn enable_src_match(&self, enabled: bool) {
        self.src_match_enabled.set(enabled);
    }

    pub fn add_src_match_short_entry(&self, iid: u8, address: u16) -> Result<(), RadioError> {
        self.source_match.add_short(iid, address)
    }

    pub fn add_src_match_ext_entry(&self, iid: u8, address: &ExtAddress) -> Result<(), RadioError> {
        self.source_match.add_ext(iid, address)
    }

    pub fn clear_src_match_short_entry(&self, iid: u8, address: u16) -> Result<(), RadioError> {
        self.source_match.clear_short(iid, address)
    }

    pub fn clear_src_match_ext_entry(&self, iid: u8, address: &ExtAddress) -> Result<(), RadioError> {
        self.source_match.clear_ext(iid, address)
    }

    pub fn clear_src_match_short_entries(&self, iid: u8) {
        self.source_match.clear_short_entries(iid);
    }

    pub fn clear_src_match_ext_entries(&self, iid: u8) {
        self.source_match.clear_ext_entries(iid);
    }

    /// Power currently programmed into the radio, in dBm.
    pub fn transmit_power(&self) -> i8 {
        (self.rail.tx_power_deci_dbm() / 10) as i8
    }

    pub fn set_transmit_power(&self, iid: u8, power: i8) -> Result<(), RadioError> {
        self.power.set_default_tx_power(iid, power)
    }

    pub fn set_channel_max_transmit_power(
        &self,
        iid: u8,
        channel: u8,
        power: i8,
    ) -> Result<(), RadioError> {
        self.power.set_channel_max_tx_power(iid, channel, power)
    }

    pub fn cca_energy_detect_threshold(&self) -> i8 {
        self.cca_threshold.get()
    }

    pub fn set_cca_energy_detect_threshold(&self, threshold: i8) -> Result<(), RadioError> {
        self.rail.set_cca_threshold(threshold)?;
        self.cca_threshold.set(threshold);
        Ok(())
    }

    pub fn receive_sensitivity(&self) -> i8 {
        self.config.receive_sensitivity_dbm
    }

    pub fn set_pan_id(&self, iid: u8, pan_id: u16) -> Result<(), RadioError> {
        let index = self.config.pan_index(iid);
        self.source_match.set_pan_id(iid, pan_id);
        self.rail.set_pan_id(pan_id, index)?;
        if self.config.multipan && pan_id != BROADCAST_PAN_ID {
            self.filter_mask_enabled
                .set(self.filter_mask_enabled.get() | pan_filter_bits(index));
        }
        Ok(())
    }

    pub fn set_short_address(&self, iid: u8, address: u16) -> Result<(), RadioError> {
        self.rail
            .set_short_address(address, self.config.pan_index(iid))?;
        Ok(())
    }

    /// `address` is in over-the-air order, least significant byte first.
    pub fn set_extended_address(&self, iid: u8, address: &[u8; 8]) -> Result<(), RadioError> {
        self.ext_addresses[iid as usize].set(reverse_ext_address(address));
        self.rail
            .set_long_address(address, self.config.pan_index(iid))?;
        Ok(())
    }

    /// Factory EUI-64, most significant byte first.
    pub fn ieee_eui64(&self) -> [u8; 8] {
        self.rail.unique_id().to_be_bytes()
    }

    /// Current radio time on the 64-bit clock, in us.
    pub fn now(&self) -> u64 {
        self.clock.time_get()
    }

    // Thread 1.2: keys, CSL and link metrics

    /// Installs the MAC keys of `iid`. The frame counter restarts at 0.
    /// Only key id mode 1 frames are secured by the radio.
    pub fn set_mac_key(
        &self,
        iid: u8,
        key_id_mode: u8,
        key_id: u8,
        prev: &MacKey,
        curr: &MacKey,
        next: &MacKey,
    ) {
        if CONFIG.debug_radio && key_id_mode != capsules_ieee802154::frame::key_id_mode::INDEX {
            debug!("efr32: key id mode {} frames are secured by the stack", key_id_mode);
        }
        self.mac_keys[iid as usize].set_keys(key_id, prev, curr, next);
    }

    pub fn set_mac_frame_counter(&self, iid: u8, counter: u32) {
        self.mac_keys[iid as usize].set_frame_counter(counter);
    }

    pub fn set_mac_frame_counter_if_larger(&self, iid: u8, counter: u32) {
        self.mac_keys[iid as usize].set_frame_counter_if_larger(counter);
    }

    /// Starts CSL reception with `period` (ten symbol units), 0 stops it.
    pub fn enable_csl(&self, period: u16, _short: u16, _ext: &ExtAddress) -> Result<(), RadioError> {
        if !self.config.csl_receiver {
            return Err(RadioError::NotImplemented);
        }
        self.csl_period.set(period);
        Ok(())
    }

    pub fn update_csl_sample_time(&self, sample_time: u32) {
        self.csl_sample_time.set(sample_time);
    }

    pub fn csl_accuracy(&self) -> u8 {
        self.clock.xtal_accuracy_ppm()
    }

    pub fn csl_uncertainty(&self) -> u8 {
        self.config.csl_tx_uncertainty
    }

    pub fn configure_enh_ack_probing(
        &self,
        metrics: LinkMetrics,
        short: u16,
        ext: &ExtAddress,
    ) -> Result<(), RadioError> {
        if !self.config.link_metrics_subject {
            return Err(RadioError::NotImplemented);
        }
        self.link_metrics.configure(short, ext, metrics)
    }

    pub fn debug_counter(&self, counter: Counter) -> u32 {
        self.counters.get(counter)
    }

    pub fn clear_debug_counters(&self) {
        self.counters.clear();
    }
}

impl RailClient for Radio<'_> {
    fn events(&self, events: EventsCopy) {
        if events.is_set(RailEvents::IEEE802154_DATA_REQUEST_COMMAND) {
            self.data_request();
        }

        if events.is_set(RailEvents::TX_PACKET_SENT) {
            self.packet_sent(false);
        } else if events.is_set(RailEvents::TX_CHANNEL_BUSY) {
            self.tx_failed(TxFailure::ChannelBusy);
        } else if events.is_set(RailEvents::TX_BLOCKED) {
            self.tx_failed(TxFailure::Failed);
        } else if any_event(events, RailEvents::TX_UNDERFLOW::SET + RailEvents::TX_ABORTED::SET) {
            self.tx_failed(TxFailure::Failed);
        }

        // Scheduled RX and TX events share bits, the pending flag tells
        // them apart.
        if self.flags.is_set(RadioFlags::SCHEDULED_RX_PENDING) {
            if events.is_set(RailEvents::RX_SCHEDULED_RX_STARTED) {
                self.flags.set(RadioFlags::SCHEDULED_RX_STARTED::SET);
            }
            if any_event(
                events,
                RailEvents::RX_SCHEDULED_RX_END::SET + RailEvents::RX_SCHEDULED_RX_MISSED::SET,
            ) {
                self.flags.clear(
                    RadioFlags::SCHEDULED_RX_PENDING::SET + RadioFlags::SCHEDULED_RX_STARTED::SET,
                );
                self.set_idle();
            }
        } else if events.is_set(RailEvents::TX_SCHEDULED_TX_STARTED) {
            self.flags.set(RadioFlags::SCHEDULED_TX_STARTED::SET);
            self.flags.clear(RadioFlags::SCHEDULED_TX_PENDING::SET);
        } else if events.is_set(RailEvents::TX_SCHEDULED_TX_MISSED) {
            self.flags.clear(RadioFlags::SCHEDULED_TX_PENDING::SET);
            self.tx_failed(TxFailure::SchedulerError);
        }

        if events.is_set(RailEvents::RX_PACKET_RECEIVED) {
            self.packet_received();
        }

        if events.is_set(RailEvents::TXACK_PACKET_SENT) {
            self.packet_sent(true);
        }
        if any_event(
            events,
            RailEvents::TXACK_ABORTED::SET
                + RailEvents::TXACK_UNDERFLOW::SET
                + RailEvents::TXACK_BLOCKED::SET,
        ) {
            self.tx_ack_failed();
        }

        // An ACK received together with the timeout wins.
        if events.is_set(RailEvents::RX_ACK_TIMEOUT) && self.flags.is_set(RadioFlags::WAITING_FOR_ACK)
        {
            self.ack_timeout();
        }

        if events.is_set(RailEvents::SCHEDULER_STATUS) {
            self.scheduler_event();
        }

        if events.is_set(RailEvents::CAL_NEEDED) {
            if let Err(e) = self.rail.calibrate() {
                if CONFIG.debug_radio {
                    debug!("efr32: calibration failed: {:?}", e);
                }
            }
            self.counters.increment(Counter::CalibrationNeeded);
        }

        let config_events = RailEvents::CONFIG_SCHEDULED::SET + RailEvents::CONFIG_UNSCHEDULED::SET;
        if events.get() & !config_events.mask() != 0 {
            self.signal_pending();
        }
    }

    fn timer_expired(&self) {
        if self.scan.sample() {
            self.counters.increment(Counter::EnergyScanDone);
            self.signal_pending();
        }
    }
}
