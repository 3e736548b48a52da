// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Frames exchanged with the Thread stack and the callbacks the platform
//! layer delivers to it.

use capsules_ieee802154::frame::{FCS_SIZE, MAX_PSDU_SIZE};

use crate::error::RadioError;

/// Callbacks into the Thread stack.
///
/// `iid` identifies the stack instance. In multipan builds interface 0 is
/// the broadcast interface and instances use 1 and up; otherwise it is
/// always 0. All callbacks except `signal_pending` run from a `process()`
/// call in the main loop.
pub trait PlatformClient {
    /// A frame was received, or reception failed.
    fn receive_done(&self, iid: u8, result: Result<&RxFrame, RadioError>);

    /// The radio accepted `frame` for transmission.
    fn transmit_started(&self, iid: u8, frame: &TxFrame);

    /// Transmission of `frame` finished. `ack` is the acknowledgment that
    /// completed it, if one was requested and received.
    fn transmit_done(
        &self,
        iid: u8,
        frame: &TxFrame,
        ack: Option<&RxFrame>,
        result: Result<(), RadioError>,
    );

    fn energy_scan_done(&self, iid: u8, max_rssi_dbm: i8);

    fn alarm_milli_fired(&self, iid: u8);

    fn alarm_micro_fired(&self, iid: u8);

    /// Millisecond alarm fired while in diagnostic mode.
    fn diag_alarm_fired(&self, iid: u8);

    /// Interrupt context produced work: the main loop should call
    /// `process()`. May be called from interrupt context.
    fn signal_pending(&self);

    /// The stack has tasklets waiting to run.
    fn tasklets_pending(&self, iid: u8) -> bool;
}

/// Extended address as the stack sees it, most significant byte first.
/// Frames carry it the other way around.
pub type ExtAddress = [u8; 8];

/// Converts an extended address between stack and over-the-air order.
pub fn reverse_ext_address(address: &[u8; 8]) -> [u8; 8] {
    let mut reversed = *address;
    reversed.reverse();
    reversed
}

/// An outgoing frame. Owned by the stack between transmissions and lent to
/// the radio while one is in progress.
#[derive(Copy, Clone, Debug)]
pub struct TxFrame {
    pub psdu: [u8; MAX_PSDU_SIZE],
    /// PSDU length, FCS included.
    pub length: usize,
    pub channel: u8,
    pub max_csma_backoffs: u8,
    pub csma_ca_enabled: bool,
    /// A retransmission of the previous frame from this buffer.
    pub is_retx: bool,
    /// The auxiliary security header and MIC are already in place.
    pub is_security_processed: bool,
    /// Key id and frame counter are already in place.
    pub is_header_updated: bool,
    /// Base time of a delayed transmission, in radio us.
    pub tx_delay_base_time: u32,
    /// Delay from `tx_delay_base_time`, in us. 0 transmits right away.
    pub tx_delay: u32,
    /// Key id used to secure an enhanced ACK, set by transmit security.
    pub ack_key_id: u8,
    pub ack_frame_counter: u32,
}

impl TxFrame {
    pub const fn new() -> TxFrame {
        TxFrame {
            psdu: [0; MAX_PSDU_SIZE],
            length: 0,
            channel: 0,
            max_csma_backoffs: 4,
            csma_ca_enabled: true,
            is_retx: false,
            is_security_processed: false,
            is_header_updated: false,
            tx_delay_base_time: 0,
            tx_delay: 0,
            ack_key_id: 0,
            ack_frame_counter: 0,
        }
    }

    /// Copies `psdu` (FCS excluded) into the frame.
    pub fn set_payload(&mut self, psdu: &[u8]) {
        let len = psdu.len().min(MAX_PSDU_SIZE - FCS_SIZE);
        self.psdu[..len].copy_from_slice(&psdu[..len]);
        self.length = len + FCS_SIZE;
    }

    /// The PSDU, FCS included.
    pub fn bytes(&self) -> &[u8] {
        &self.psdu[..self.length]
    }
}

/// A received frame.
#[derive(Copy, Clone, Debug)]
pub struct RxFrame {
    pub psdu: [u8; MAX_PSDU_SIZE],
    /// PSDU length, FCS included.
    pub length: usize,
    pub channel: u8,
    pub iid: u8,
    pub rssi: i8,
    pub lqi: u8,
    /// End of the SFD, in us on the 64-bit platform clock.
    pub timestamp: u64,
    pub acked_with_frame_pending: bool,
    pub acked_with_sec_enh_ack: bool,
    pub ack_key_id: u8,
    pub ack_frame_counter: u32,
}

impl RxFrame {
    pub const fn new() -> RxFrame {
        RxFrame {
            psdu: [0; MAX_PSDU_SIZE],
            length: 0,
            channel: 0,
            iid: 0,
            rssi: 0,
            lqi: 0,
            timestamp: 0,
            acked_with_frame_pending: false,
            acked_with_sec_enh_ack: false,
            ack_key_id: 0,
            ack_frame_counter: 0,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.psdu[..self.length]
    }
}
