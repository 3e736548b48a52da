// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Host-side doubles for the hardware interfaces, used by the unit tests.

use core::cell::{Cell, RefCell};
use std::boxed::Box;
use std::collections::VecDeque;
use std::vec::Vec;

use capsules_ieee802154::frame::MacAddress;
use kernel::hil::gpio::Output;
use kernel::utilities::cells::OptionalCell;
use kernel::utilities::registers::FieldValue;
use kernel::ErrorCode;

use crate::alarm::Clock;
use crate::band::{Band, Phy};
use crate::error::RadioError;
use crate::interrupt::InterruptControl;
use crate::misc::SystemControl;
use crate::platform::{PlatformClient, RxFrame, TxFrame};
use crate::rail::{
    CsmaConfig, EventsCopy, IdleMode, IncomingPacket, Rail, RailClient, RailEvents, RadioState,
    RxPacket, SchedulerInfo, TxOptions,
};
use crate::sleep::PowerManager;
use crate::timer::{MicroTimer, SleepTimer, TimerClient};

/// Gives a test object the `'static` lifetime the drivers expect.
pub fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

/// Manually driven one-shot timer.
pub struct ToyTimer<'a> {
    now: Cell<u32>,
    max: u32,
    /// Start time and timeout of the armed timeout.
    armed: Cell<Option<(u32, u32)>>,
    last_timeout: Cell<Option<u32>>,
    starts: Cell<usize>,
    stops: Cell<usize>,
    fire_on_start: Cell<bool>,
    interrupts: OptionalCell<&'a MockInterrupts>,
    unmasked_reads: Cell<usize>,
    client: OptionalCell<&'a dyn TimerClient>,
}

impl<'a> ToyTimer<'a> {
    pub fn new(max: u32) -> ToyTimer<'a> {
        ToyTimer {
            now: Cell::new(0),
            max,
            armed: Cell::new(None),
            last_timeout: Cell::new(None),
            starts: Cell::new(0),
            stops: Cell::new(0),
            fire_on_start: Cell::new(false),
            interrupts: OptionalCell::empty(),
            unmasked_reads: Cell::new(0),
            client: OptionalCell::empty(),
        }
    }

    /// Expire every timeout as soon as it is armed, as if the interrupt
    /// came in before `start` returned.
    pub fn fire_on_start(&self, fire: bool) {
        self.fire_on_start.set(fire);
    }

    /// Count counter reads made while `interrupts` is not masked.
    pub fn watch(&self, interrupts: &'a MockInterrupts) {
        self.interrupts.set(interrupts);
    }

    pub fn unmasked_reads(&self) -> usize {
        self.unmasked_reads.get()
    }

    fn read(&self) -> u32 {
        if self.interrupts.map_or(false, |interrupts| !interrupts.is_masked()) {
            self.unmasked_reads.set(self.unmasked_reads.get() + 1);
        }
        self.now.get()
    }

    pub fn set_now(&self, now: u32) {
        self.now.set(now);
    }

    /// Moves time forward by `ticks`, firing every timeout that falls in
    /// the interval, including ones armed by the client while firing.
    pub fn advance(&self, ticks: u32) {
        let mut remaining = ticks;
        while let Some((start, timeout)) = self.armed.get() {
            let left = timeout.saturating_sub(self.now.get().wrapping_sub(start));
            if left > remaining {
                break;
            }
            self.now.set(self.now.get().wrapping_add(left));
            remaining -= left;
            self.armed.set(None);
            self.client.map(|client| client.fired());
        }
        self.now.set(self.now.get().wrapping_add(remaining));
    }

    pub fn last_timeout(&self) -> Option<u32> {
        self.last_timeout.get()
    }

    pub fn starts(&self) -> usize {
        self.starts.get()
    }

    pub fn stops(&self) -> usize {
        self.stops.get()
    }

    fn arm(&self, timeout: u32) {
        self.starts.set(self.starts.get() + 1);
        self.last_timeout.set(Some(timeout));
        self.armed.set(Some((self.now.get(), timeout)));
        if self.fire_on_start.get() {
            self.armed.set(None);
            self.client.map(|client| client.fired());
        }
    }

    fn disarm(&self) {
        self.stops.set(self.stops.get() + 1);
        self.armed.set(None);
    }
}

impl<'a> SleepTimer<'a> for ToyTimer<'a> {
    fn set_client(&self, client: &'a dyn TimerClient) {
        self.client.set(client);
    }

    fn now_ms(&self) -> u32 {
        self.read()
    }

    fn max_ms(&self) -> u32 {
        self.max
    }

    fn start_ms(&self, timeout: u32) -> Result<(), ErrorCode> {
        if timeout > self.max {
            return Err(ErrorCode::INVAL);
        }
        self.arm(timeout);
        Ok(())
    }

    fn stop(&self) {
        self.disarm();
    }
}

impl<'a> MicroTimer<'a> for ToyTimer<'a> {
    fn set_client(&self, client: &'a dyn TimerClient) {
        self.client.set(client);
    }

    fn now_us(&self) -> u32 {
        self.read()
    }

    fn start_us(&self, timeout: u32) -> Result<(), ErrorCode> {
        self.arm(timeout);
        Ok(())
    }

    fn stop(&self) {
        self.disarm();
    }
}

/// Interrupt masking that records its critical sections.
pub struct MockInterrupts {
    depth: Cell<usize>,
    sections: Cell<usize>,
}

impl MockInterrupts {
    pub fn new() -> MockInterrupts {
        MockInterrupts {
            depth: Cell::new(0),
            sections: Cell::new(0),
        }
    }

    pub fn is_masked(&self) -> bool {
        self.depth.get() > 0
    }

    pub fn sections(&self) -> usize {
        self.sections.get()
    }
}

impl InterruptControl for MockInterrupts {
    fn atomic(&self, f: &mut dyn FnMut()) {
        self.sections.set(self.sections.get() + 1);
        self.depth.set(self.depth.get() + 1);
        f();
        self.depth.set(self.depth.get() - 1);
    }
}

/// Platform clock set by hand.
pub struct ToyClock {
    now: Cell<u64>,
}

impl ToyClock {
    pub fn new(now: u64) -> ToyClock {
        ToyClock {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }
}

impl Clock for ToyClock {
    fn micro_now(&self) -> u32 {
        self.now.get() as u32
    }

    fn time_get(&self) -> u64 {
        self.now.get()
    }

    fn xtal_accuracy_ppm(&self) -> u8 {
        140
    }
}

/// Stack callbacks as recorded by [`RecordingClient`].
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    MilliFired(u8),
    MicroFired(u8),
    DiagAlarmFired(u8),
    ReceiveDone(u8, Result<(), RadioError>),
    TransmitStarted(u8),
    TransmitDone(u8, Result<(), RadioError>),
    EnergyScanDone(u8, i8),
}

/// A stack stand-in that records every callback.
pub struct RecordingClient {
    events: RefCell<Vec<Event>>,
    received: RefCell<Vec<RxFrame>>,
    transmitted: RefCell<Vec<(TxFrame, Option<RxFrame>)>>,
    signals: Cell<usize>,
    tasklets_pending: Cell<bool>,
    hook: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl RecordingClient {
    pub fn new() -> RecordingClient {
        RecordingClient {
            events: RefCell::new(Vec::new()),
            received: RefCell::new(Vec::new()),
            transmitted: RefCell::new(Vec::new()),
            signals: Cell::new(0),
            tasklets_pending: Cell::new(false),
            hook: RefCell::new(None),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
        self.received.borrow_mut().clear();
        self.transmitted.borrow_mut().clear();
    }

    pub fn signals(&self) -> usize {
        self.signals.get()
    }

    /// Frames passed to successful `receive_done` calls.
    pub fn received(&self) -> Vec<RxFrame> {
        self.received.borrow().clone()
    }

    /// Frames and ACKs passed to `transmit_done`.
    pub fn transmitted(&self) -> Vec<(TxFrame, Option<RxFrame>)> {
        self.transmitted.borrow().clone()
    }

    pub fn set_tasklets_pending(&self, pending: bool) {
        self.tasklets_pending.set(pending);
    }

    /// Runs `hook` once, right after the next callback is recorded.
    pub fn on_event<F: FnOnce() + 'static>(&self, hook: F) {
        *self.hook.borrow_mut() = Some(Box::new(hook));
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
        let hook = self.hook.borrow_mut().take();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl PlatformClient for RecordingClient {
    fn receive_done(&self, iid: u8, result: Result<&RxFrame, RadioError>) {
        if let Ok(frame) = result {
            self.received.borrow_mut().push(*frame);
        }
        self.record(Event::ReceiveDone(iid, result.map(|_| ())));
    }

    fn transmit_started(&self, iid: u8, _frame: &TxFrame) {
        self.record(Event::TransmitStarted(iid));
    }

    fn transmit_done(
        &self,
        iid: u8,
        frame: &TxFrame,
        ack: Option<&RxFrame>,
        result: Result<(), RadioError>,
    ) {
        self.transmitted.borrow_mut().push((*frame, ack.copied()));
        self.record(Event::TransmitDone(iid, result));
    }

    fn energy_scan_done(&self, iid: u8, max_rssi_dbm: i8) {
        self.record(Event::EnergyScanDone(iid, max_rssi_dbm));
    }

    fn alarm_milli_fired(&self, iid: u8) {
        self.record(Event::MilliFired(iid));
    }

    fn alarm_micro_fired(&self, iid: u8) {
        self.record(Event::MicroFired(iid));
    }

    fn diag_alarm_fired(&self, iid: u8) {
        self.record(Event::DiagAlarmFired(iid));
    }

    fn signal_pending(&self) {
        self.signals.set(self.signals.get() + 1);
    }

    fn tasklets_pending(&self, _iid: u8) -> bool {
        self.tasklets_pending.get()
    }
}

/// Requests made of [`MockRail`].
#[derive(Clone, Debug, PartialEq)]
pub enum RailCall {
    Idle(IdleMode),
    Yield,
    Calibrate,
    LoadPhy(Phy),
    StartRx(u8),
    StartScheduledRx {
        channel: u8,
        start: u32,
        duration: u32,
    },
    FrameDetection(bool),
    StartTx {
        channel: u8,
        wait_for_ack: bool,
        priority: u8,
    },
    StartCsmaTx {
        channel: u8,
        wait_for_ack: bool,
        csma_tries: u8,
        cca_threshold_dbm: i8,
    },
    StartScheduledTx {
        channel: u8,
        wait_for_ack: bool,
        when: u32,
    },
    TxPower(i16),
    CcaThreshold(i8),
    PanId(u16, usize),
    ShortAddress(u16, usize),
    LongAddress([u8; 8], usize),
    Promiscuous(bool),
    ToggleFramePending,
    WriteEnhAck(Vec<u8>),
    StartTimer(u32),
    CancelTimer,
}

/// Frame under reception, as seen by [`Rail::incoming_packet`].
struct Incoming {
    filter_mask: u8,
    bytes: Vec<u8>,
    source: Option<MacAddress>,
}

/// A scripted radio. Requests are recorded; frames, readings and events
/// are injected by the test.
pub struct MockRail<'a> {
    client: OptionalCell<&'a dyn RailClient>,
    calls: RefCell<Vec<RailCall>>,
    state: Cell<RadioState>,
    channel: Cell<Option<u8>>,
    tx_power: Cell<i16>,
    symbol_rate: Cell<u32>,
    time: Cell<u32>,
    time_step: Cell<u32>,
    timer: Cell<Option<(u32, u32)>>,
    rssi: RefCell<VecDeque<Option<i16>>>,
    rssi_waits: RefCell<Vec<bool>>,
    fail_tx: Cell<bool>,
    fail_rx: Cell<bool>,
    scheduler: Cell<Result<(), ErrorCode>>,
    frame_pending: Cell<Result<(), ErrorCode>>,
    tx_fifo: RefCell<Vec<u8>>,
    incoming: RefCell<Option<Incoming>>,
    received: RefCell<VecDeque<(RxPacket, Vec<u8>)>>,
}

impl<'a> MockRail<'a> {
    pub fn new() -> MockRail<'a> {
        MockRail {
            client: OptionalCell::empty(),
            calls: RefCell::new(Vec::new()),
            state: Cell::new(RadioState::Idle),
            channel: Cell::new(None),
            tx_power: Cell::new(0),
            symbol_rate: Cell::new(62_500),
            time: Cell::new(0),
            time_step: Cell::new(0),
            timer: Cell::new(None),
            rssi: RefCell::new(VecDeque::new()),
            rssi_waits: RefCell::new(Vec::new()),
            fail_tx: Cell::new(false),
            fail_rx: Cell::new(false),
            scheduler: Cell::new(Ok(())),
            frame_pending: Cell::new(Ok(())),
            tx_fifo: RefCell::new(Vec::new()),
            incoming: RefCell::new(None),
            received: RefCell::new(VecDeque::new()),
        }
    }

    fn record(&self, call: RailCall) {
        self.calls.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<RailCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn set_state(&self, state: RadioState) {
        self.state.set(state);
    }

    pub fn set_channel(&self, channel: u8) {
        self.channel.set(Some(channel));
    }

    pub fn tx_power(&self) -> i16 {
        self.tx_power.get()
    }

    pub fn set_symbol_rate(&self, rate: u32) {
        self.symbol_rate.set(rate);
    }

    pub fn set_time(&self, time: u32) {
        self.time.set(time);
    }

    /// Every `time_us` read advances the clock by `step`.
    pub fn set_time_step(&self, step: u32) {
        self.time_step.set(step);
    }

    /// Delay of the armed radio timer.
    pub fn timer_delay(&self) -> Option<u32> {
        self.timer.get().map(|(_, delay)| delay)
    }

    /// Fires the radio timer now, if armed.
    pub fn expire_timer(&self) {
        if self.timer.take().is_some() {
            self.client.map(|client| client.timer_expired());
        }
    }

    pub fn push_rssi(&self, quarter_dbm: Option<i16>) {
        self.rssi.borrow_mut().push_back(quarter_dbm);
    }

    /// `wait` argument of every RSSI read so far.
    pub fn rssi_waits(&self) -> Vec<bool> {
        self.rssi_waits.borrow().clone()
    }

    pub fn fail_tx(&self, fail: bool) {
        self.fail_tx.set(fail);
    }

    pub fn fail_rx(&self, fail: bool) {
        self.fail_rx.set(fail);
    }

    pub fn set_scheduler_status(&self, status: Result<(), ErrorCode>) {
        self.scheduler.set(status);
    }

    /// Result of the next `toggle_frame_pending` calls.
    pub fn set_frame_pending_result(&self, result: Result<(), ErrorCode>) {
        self.frame_pending.set(result);
    }

    pub fn tx_fifo(&self) -> Vec<u8> {
        self.tx_fifo.borrow().clone()
    }

    /// Makes `bytes` (PHY header included) the frame under reception.
    pub fn set_incoming(&self, filter_mask: u8, bytes: &[u8], source: Option<MacAddress>) {
        *self.incoming.borrow_mut() = Some(Incoming {
            filter_mask,
            bytes: bytes.to_vec(),
            source,
        });
    }

    /// Queues a received frame. `bytes` holds the PHY header and the PSDU
    /// without its FCS.
    pub fn push_received(&self, packet: RxPacket, bytes: &[u8]) {
        self.received
            .borrow_mut()
            .push_back((packet, bytes.to_vec()));
    }

    /// Delivers `events` to the client as the radio interrupt would.
    pub fn fire(&self, events: FieldValue<u64, RailEvents::Register>) {
        self.client
            .map(|client| client.events(EventsCopy::new(events.value)));
    }

    /// The last enhanced ACK written, PHY header included.
    pub fn last_enh_ack(&self) -> Option<Vec<u8>> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            RailCall::WriteEnhAck(frame) => Some(frame.clone()),
            _ => None,
        })
    }

    fn start(&self, result: Result<(), ErrorCode>, state: RadioState, channel: u8) -> Result<(), ErrorCode> {
        if result.is_ok() {
            self.state.set(state);
            self.channel.set(Some(channel));
        }
        result
    }

    fn tx_result(&self) -> Result<(), ErrorCode> {
        if self.fail_tx.get() {
            Err(ErrorCode::FAIL)
        } else {
            Ok(())
        }
    }

    fn rx_result(&self) -> Result<(), ErrorCode> {
        if self.fail_rx.get() {
            Err(ErrorCode::FAIL)
        } else {
            Ok(())
        }
    }
}

impl<'a> Rail<'a> for MockRail<'a> {
    fn set_client(&self, client: &'a dyn RailClient) {
        self.client.set(client);
    }

    fn idle(&self, mode: IdleMode) {
        self.record(RailCall::Idle(mode));
        self.state.set(RadioState::Idle);
    }

    fn state(&self) -> RadioState {
        self.state.get()
    }

    fn yield_radio(&self) {
        self.record(RailCall::Yield);
    }

    fn calibrate(&self) -> Result<(), ErrorCode> {
        self.record(RailCall::Calibrate);
        Ok(())
    }

    fn scheduler_status(&self) -> Result<(), ErrorCode> {
        self.scheduler.get()
    }

    fn load_phy(&self, band: &Band) -> Result<(), ErrorCode> {
        self.record(RailCall::LoadPhy(band.phy));
        Ok(())
    }

    fn symbol_rate(&self) -> u32 {
        self.symbol_rate.get()
    }

    fn channel(&self) -> Option<u8> {
        self.channel.get()
    }

    fn time_us(&self) -> u32 {
        let now = self.time.get().wrapping_add(self.time_step.get());
        self.time.set(now);
        if let Some((start, delay)) = self.timer.get() {
            if now.wrapping_sub(start) >= delay {
                self.timer.set(None);
                self.client.map(|client| client.timer_expired());
            }
        }
        now
    }

    fn unique_id(&self) -> u64 {
        0x0102_0304_0506_0708
    }

    fn start_rx(&self, channel: u8, _info: &SchedulerInfo) -> Result<(), ErrorCode> {
        self.record(RailCall::StartRx(channel));
        self.start(self.rx_result(), RadioState::Rx, channel)
    }

    fn start_scheduled_rx(
        &self,
        channel: u8,
        start: u32,
        duration: u32,
        _info: &SchedulerInfo,
    ) -> Result<(), ErrorCode> {
        self.record(RailCall::StartScheduledRx {
            channel,
            start,
            duration,
        });
        self.rx_result()
    }

    fn set_frame_detection(&self, enabled: bool) -> Result<(), ErrorCode> {
        self.record(RailCall::FrameDetection(enabled));
        Ok(())
    }

    fn write_tx_fifo(&self, data: &[u8], reset: bool) -> usize {
        let mut fifo = self.tx_fifo.borrow_mut();
        if reset {
            fifo.clear();
        }
        fifo.extend_from_slice(data);
        data.len()
    }

    fn start_tx(
        &self,
        channel: u8,
        options: TxOptions,
        info: &SchedulerInfo,
    ) -> Result<(), ErrorCode> {
        self.record(RailCall::StartTx {
            channel,
            wait_for_ack: options.wait_for_ack,
            priority: info.priority,
        });
        self.start(self.tx_result(), RadioState::Tx, channel)
    }

    fn start_cca_csma_tx(
        &self,
        channel: u8,
        options: TxOptions,
        csma: &CsmaConfig,
        _info: &SchedulerInfo,
    ) -> Result<(), ErrorCode> {
        self.record(RailCall::StartCsmaTx {
            channel,
            wait_for_ack: options.wait_for_ack,
            csma_tries: csma.csma_tries,
            cca_threshold_dbm: csma.cca_threshold_dbm,
        });
        self.start(self.tx_result(), RadioState::Tx, channel)
    }

    fn start_scheduled_cca_csma_tx(
        &self,
        channel: u8,
        options: TxOptions,
        when: u32,
        _csma: &CsmaConfig,
        _info: &SchedulerInfo,
    ) -> Result<(), ErrorCode> {
        self.record(RailCall::StartScheduledTx {
            channel,
            wait_for_ack: options.wait_for_ack,
            when,
        });
        self.tx_result()
    }

    fn set_tx_power_deci_dbm(&self, power: i16) -> Result<(), ErrorCode> {
        self.record(RailCall::TxPower(power));
        self.tx_power.set(power);
        Ok(())
    }

    fn tx_power_deci_dbm(&self) -> i16 {
        self.tx_power.get()
    }

    fn set_cca_threshold(&self, threshold_dbm: i8) -> Result<(), ErrorCode> {
        self.record(RailCall::CcaThreshold(threshold_dbm));
        Ok(())
    }

    fn rssi_quarter_dbm(&self, wait: bool) -> Option<i16> {
        self.rssi_waits.borrow_mut().push(wait);
        self.rssi.borrow_mut().pop_front().flatten()
    }

    fn set_pan_id(&self, pan_id: u16, index: usize) -> Result<(), ErrorCode> {
        self.record(RailCall::PanId(pan_id, index));
        Ok(())
    }

    fn set_short_address(&self, address: u16, index: usize) -> Result<(), ErrorCode> {
        self.record(RailCall::ShortAddress(address, index));
        Ok(())
    }

    fn set_long_address(&self, address: &[u8; 8], index: usize) -> Result<(), ErrorCode> {
        self.record(RailCall::LongAddress(*address, index));
        Ok(())
    }

    fn set_promiscuous(&self, enabled: bool) -> Result<(), ErrorCode> {
        self.record(RailCall::Promiscuous(enabled));
        Ok(())
    }

    fn incoming_packet(&self, buf: &mut [u8], min_bytes: usize) -> IncomingPacket {
        match self.incoming.borrow().as_ref() {
            Some(incoming) if incoming.bytes.len() >= min_bytes => {
                let copied = incoming.bytes.len().min(buf.len());
                buf[..copied].copy_from_slice(&incoming.bytes[..copied]);
                IncomingPacket {
                    filter_mask: incoming.filter_mask,
                    packet_bytes: incoming.bytes.len(),
                    copied,
                }
            }
            Some(incoming) => IncomingPacket {
                filter_mask: incoming.filter_mask,
                packet_bytes: incoming.bytes.len(),
                copied: 0,
            },
            None => IncomingPacket {
                filter_mask: 0,
                packet_bytes: 0,
                copied: 0,
            },
        }
    }

    fn source_address(&self) -> Result<MacAddress, ErrorCode> {
        self.incoming
            .borrow()
            .as_ref()
            .and_then(|incoming| incoming.source)
            .ok_or(ErrorCode::FAIL)
    }

    fn toggle_frame_pending(&self) -> Result<(), ErrorCode> {
        self.record(RailCall::ToggleFramePending);
        self.frame_pending.get()
    }

    fn write_enh_ack(&self, frame: &[u8]) -> Result<(), ErrorCode> {
        self.record(RailCall::WriteEnhAck(frame.to_vec()));
        Ok(())
    }

    fn received_packet(&self, buf: &mut [u8]) -> Option<RxPacket> {
        let (packet, bytes) = self.received.borrow_mut().pop_front()?;
        let len = bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&bytes[..len]);
        Some(packet)
    }

    fn start_timer_us(&self, delay: u32) -> Result<(), ErrorCode> {
        self.record(RailCall::StartTimer(delay));
        self.timer.set(Some((self.time.get(), delay)));
        Ok(())
    }

    fn cancel_timer(&self) {
        self.record(RailCall::CancelTimer);
        self.timer.set(None);
    }
}

/// Counts energy mode requirement changes.
pub struct MockPowerManager {
    adds: Cell<usize>,
    removes: Cell<usize>,
}

impl MockPowerManager {
    pub fn new() -> MockPowerManager {
        MockPowerManager {
            adds: Cell::new(0),
            removes: Cell::new(0),
        }
    }

    pub fn adds(&self) -> usize {
        self.adds.get()
    }

    pub fn removes(&self) -> usize {
        self.removes.get()
    }

    /// EM1 is currently required.
    pub fn em1_required(&self) -> bool {
        self.adds.get() > self.removes.get()
    }
}

impl PowerManager for MockPowerManager {
    fn add_em1_requirement(&self) {
        self.adds.set(self.adds.get() + 1);
    }

    fn remove_em1_requirement(&self) {
        self.removes.set(self.removes.get() + 1);
    }
}

/// Reset unit and bootloader stand-in.
pub struct MockSystem {
    cause: Cell<u32>,
    resets: Cell<usize>,
    bootloader_requests: Cell<usize>,
}

impl MockSystem {
    pub fn new(cause: u32) -> MockSystem {
        MockSystem {
            cause: Cell::new(cause),
            resets: Cell::new(0),
            bootloader_requests: Cell::new(0),
        }
    }

    pub fn resets(&self) -> usize {
        self.resets.get()
    }

    pub fn bootloader_requests(&self) -> usize {
        self.bootloader_requests.get()
    }
}

impl SystemControl for MockSystem {
    fn reset_cause(&self) -> u32 {
        self.cause.get()
    }

    fn clear_reset_cause(&self) {
        self.cause.set(0);
    }

    fn system_reset(&self) {
        self.resets.set(self.resets.get() + 1);
    }

    fn reboot_and_install(&self) {
        self.bootloader_requests.set(self.bootloader_requests.get() + 1);
    }
}

/// Output pin that remembers its level.
pub struct MockPin {
    high: Cell<bool>,
}

impl MockPin {
    pub fn new() -> MockPin {
        MockPin {
            high: Cell::new(false),
        }
    }

    pub fn is_high(&self) -> bool {
        self.high.get()
    }
}

impl Output for MockPin {
    fn set(&self) {
        self.high.set(true);
    }

    fn clear(&self) {
        self.high.set(false);
    }

    fn toggle(&self) -> bool {
        self.high.set(!self.high.get());
        self.high.get()
    }
}
