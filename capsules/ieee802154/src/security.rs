// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Outgoing frame security.
//!
//! The CCM* nonce is the originator's extended address (most significant
//! byte first), the frame counter (big endian) and the security level. The
//! MAC header and header IEs are authenticated; the payload is encrypted for
//! levels 4 to 7 and only authenticated for levels 1 to 3.

use kernel::ErrorCode;

use crate::aes_ccm::{AesCcm, AES_KEY_SIZE};
use crate::frame::Header;

pub const NONCE_SIZE: usize = 13;
pub const EXT_ADDRESS_SIZE: usize = 8;

pub fn nonce(ext_addr: &[u8; EXT_ADDRESS_SIZE], frame_counter: u32, level: u8) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[..8].copy_from_slice(ext_addr);
    nonce[8..12].copy_from_slice(&frame_counter.to_be_bytes());
    nonce[12] = level;
    nonce
}

/// Computes the MIC of a frame whose auxiliary security header is already
/// filled in, and encrypts its payload when the level asks for it.
///
/// `ext_addr` is the sender's extended address, most significant byte
/// first. Frames without security are left untouched.
pub fn secure_frame(
    psdu: &mut [u8],
    key: &[u8; AES_KEY_SIZE],
    ext_addr: &[u8; EXT_ADDRESS_SIZE],
) -> Result<(), ErrorCode> {
    let header = Header::decode(psdu)?;
    let sec = match header.security {
        Some(sec) => sec,
        None => return Ok(()),
    };
    let level = sec.level();
    if level == 0 {
        return Ok(());
    }
    let frame_counter = sec.frame_counter.ok_or(ErrorCode::INVAL)?;
    let nonce = nonce(ext_addr, frame_counter, level);
    let ccm = AesCcm::new(key);
    let mic = header.mic_size();
    let payload_end = header.payload_offset + header.payload_length();

    if level & 0x4 != 0 {
        let (adata, rest) = psdu.split_at_mut(header.payload_offset);
        let (payload, footer) = rest.split_at_mut(header.payload_length());
        ccm.encrypt(&nonce, adata, payload, &mut footer[..mic])
    } else {
        let (adata, footer) = psdu.split_at_mut(payload_end);
        ccm.encrypt(&nonce, adata, &mut [], &mut footer[..mic])
    }
}
