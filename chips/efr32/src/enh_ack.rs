// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Enhanced acknowledgments and transmit security.
//!
//! A Thread 1.2 frame that requests an ACK gets an enhanced ACK built while
//! the frame is still being received: the radio reports the frame once its
//! addressing fields are in, the driver reads the first
//! [`EARLY_FRAME_BYTES`] bytes and hands the finished ACK back before the
//! turnaround time runs out. The ACK may carry a CSL IE, whose phase is
//! computed for the moment the ACK's SHR will have been sent:
//!
//! ```text
//!   rx SHR |PHR| frame .........|  rx->tx  |SHR|PHR| ack
//!          ^ now - received bytes          ^ ack SHR done
//! ```
//!
//! Frames secured with key id mode 1 are secured by the radio layer rather
//! than the stack, because an ACK must be secured in interrupt context and
//! shares the frame counter with data frames.

use capsules_ieee802154::frame::{self, key_id_mode, FrameType, Header};
use capsules_ieee802154::ie::{self, CSL_IE_SIZE, ENH_ACK_PROBING_IE_OVERHEAD, ENH_ACK_PROBING_MAX_DATA};
use capsules_ieee802154::security;
use kernel::ErrorCode;

use crate::config::RadioConfig;
use crate::error::RadioError;
use crate::mac_keys::{KeySlot, MacKeys};
use crate::platform::ExtAddress;

/// 2.4 GHz O-QPSK symbol period.
pub const SYMBOL_TIME_US: u32 = 16;
/// CSL periods and phases count in units of ten symbols.
pub const US_PER_TEN_SYMBOLS: u32 = 160;
pub const SHR_DURATION_US: u32 = 160;
/// Lead time given to CSL transmissions the stack asks to send right away.
pub const SCHEDULE_TX_DELAY_US: u32 = 3000;
/// CCA backoff before a scheduled transmission.
pub const CSL_CSMA_BACKOFF_TIME_US: u32 = 150;
/// Bytes of a frame under reception read to build its ACK.
pub const EARLY_FRAME_BYTES: usize = 39;

pub const ACK_IE_MAX_SIZE: usize =
    CSL_IE_SIZE + ENH_ACK_PROBING_IE_OVERHEAD + ENH_ACK_PROBING_MAX_DATA;

const BYTE_TIME_US: u32 = SYMBOL_TIME_US * 2;

/// CSL phase, in ten symbol units, of a frame whose SHR ends at `shr_time`
/// for a receiver sampling at `sample_time` every `period`.
pub fn csl_phase(sample_time: u32, shr_time: u32, period: u16) -> u16 {
    let period_us = period as u32 * US_PER_TEN_SYMBOLS;
    if period_us == 0 {
        return 0;
    }
    let diff = (sample_time % period_us + period_us - shr_time % period_us) % period_us;
    (diff / US_PER_TEN_SYMBOLS) as u16
}

/// When the SHR of the enhanced ACK to a frame of `frame_length` bytes will
/// be done, given that `received_bytes` (PHY header included) had arrived
/// at `now`.
pub fn ack_shr_done_time(
    now: u32,
    received_bytes: usize,
    frame_length: usize,
    config: &RadioConfig,
) -> u32 {
    let bytes = |count: usize| count as u32 * BYTE_TIME_US;
    now.wrapping_sub(bytes(received_bytes))
        .wrapping_add(bytes(config.phr_size))
        .wrapping_add(bytes(frame_length))
        .wrapping_add(config.rx_to_tx_us)
        .wrapping_add(bytes(config.phr_size))
        .wrapping_add(bytes(config.shr_size))
}

/// Writes the PHY header of a PSDU of `length` bytes. Returns its size.
pub fn write_phr(buf: &mut [u8], phr_size: usize, length: usize) -> usize {
    if phr_size == 2 {
        // Two byte FCS, whitening enabled, length sent bit reversed.
        buf[0] = 0x08 | 0x10;
        buf[1] = (length as u8).reverse_bits();
        2
    } else {
        buf[0] = length as u8;
        1
    }
}

/// Builds the enhanced ACK for the frame `rx` decoded from `rx_psdu` into
/// `out`. `csl` is the CSL period and phase to advertise; `link_metrics`
/// the probing data, if any. Returns the PSDU length, FCS included.
pub fn build_enh_ack(
    rx: &Header,
    rx_psdu: &[u8],
    frame_pending: bool,
    csl: Option<(u16, u16)>,
    link_metrics: &[u8],
    out: &mut [u8],
) -> Result<usize, ErrorCode> {
    let mut ie_data = [0u8; ACK_IE_MAX_SIZE];
    let mut ie_len = 0;
    if let Some((period, _)) = csl {
        ie_len += ie::write_csl_ie(&mut ie_data, period);
    }
    if !link_metrics.is_empty() {
        ie_len += ie::write_enh_ack_probing_ie(&mut ie_data[ie_len..], link_metrics)?;
    }

    let length = frame::generate_enh_ack(rx, rx_psdu, frame_pending, &ie_data[..ie_len], out)?;
    if let Some((period, phase)) = csl {
        let ack = Header::decode(&out[..length])?;
        ie::set_csl_ie(&mut out[..length], ack.ie_offset, period, phase)?;
    }
    Ok(length)
}

/// Secures `psdu` (FCS included) in place when it asks for key id mode 1
/// security. Returns whether the frame was secured.
///
/// Data frames use the current key. An ACK uses the key it names, which
/// must be the previous, current or next one, and its key id and frame
/// counter are recorded in `keys`. Unless `header_updated`, the key id and
/// the next frame counter are written into the auxiliary security header
/// first.
pub fn secure_transmit(
    psdu: &mut [u8],
    header_updated: bool,
    keys: &MacKeys,
    ext_address: &ExtAddress,
) -> Result<bool, RadioError> {
    let header = Header::decode(psdu).map_err(|_| RadioError::Failed)?;
    if !header.security_enabled() || header.key_id_mode() != Some(key_id_mode::INDEX) {
        return Ok(false);
    }

    let is_ack = header.frame_type() == Some(FrameType::Ack);
    let (key_id, slot) = if is_ack {
        let key_id = header.key_id(psdu).ok_or(RadioError::Failed)?;
        (key_id, keys.slot_for(key_id)?)
    } else {
        (keys.key_id(), KeySlot::Current)
    };

    if !header_updated {
        let counter = keys.next_frame_counter();
        if is_ack {
            keys.record_ack(key_id, counter);
        }
        header
            .set_key_id(psdu, key_id)
            .and_then(|()| header.set_frame_counter(psdu, counter))
            .map_err(|_| RadioError::Failed)?;
    }

    security::secure_frame(psdu, &keys.key(slot), ext_address).map_err(|_| RadioError::Security)?;
    Ok(true)
}
