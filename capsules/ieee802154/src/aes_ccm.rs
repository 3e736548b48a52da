// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! AES-128 CCM* (IEEE 802.15.4-2015, Annex B.4.1) on top of a software AES
//! block cipher.
//!
//! The authentication tag is the CBC-MAC over
//!
//! ```text
//! [ B0 | L(a) | AuthData | pad | PlaintextData | pad ]
//! ```
//!
//! encrypted with the counter block A0. The payload is then encrypted in
//! counter mode with A1, A2, ... Unlike the fixed 13 byte nonce of plain
//! 802.15.4 security, the nonce length and the size of the length field `L`
//! are negotiated here so that they always add up to 15 bytes: `L` is the
//! number of bytes needed to encode the payload length (at least 2), raised
//! to fill a short nonce, and a long nonce is truncated to fit `L`.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use kernel::ErrorCode;

pub const AES_BLOCK_SIZE: usize = 16;
pub const AES_KEY_SIZE: usize = 16;
pub const MAX_NONCE_LENGTH: usize = 13;

/// CBC-MAC accumulator, fed in arbitrary chunks.
struct CbcMac<'a> {
    cipher: &'a Aes128,
    x: [u8; AES_BLOCK_SIZE],
    pos: usize,
}

impl<'a> CbcMac<'a> {
    fn new(cipher: &'a Aes128, b0: [u8; AES_BLOCK_SIZE]) -> CbcMac<'a> {
        let mut mac = CbcMac {
            cipher,
            x: b0,
            pos: 0,
        };
        mac.encrypt();
        mac
    }

    fn encrypt(&mut self) {
        self.cipher
            .encrypt_block(GenericArray::from_mut_slice(&mut self.x));
    }

    fn update(&mut self, data: &[u8]) {
        for byte in data {
            self.x[self.pos] ^= *byte;
            self.pos += 1;
            if self.pos == AES_BLOCK_SIZE {
                self.encrypt();
                self.pos = 0;
            }
        }
    }

    /// Zero pads the current block.
    fn pad(&mut self) {
        if self.pos != 0 {
            self.encrypt();
            self.pos = 0;
        }
    }
}

pub struct AesCcm {
    cipher: Aes128,
}

impl AesCcm {
    pub fn new(key: &[u8; AES_KEY_SIZE]) -> AesCcm {
        AesCcm {
            cipher: Aes128::new(GenericArray::from_slice(key)),
        }
    }

    fn keystream(&self, ctr: &[u8; AES_BLOCK_SIZE], l: usize, i: usize) -> [u8; AES_BLOCK_SIZE] {
        let mut block = *ctr;
        let mut count = i;
        for b in block[AES_BLOCK_SIZE - l..].iter_mut().rev() {
            *b = count as u8;
            count >>= 8;
        }
        self.cipher
            .encrypt_block(GenericArray::from_mut_slice(&mut block));
        block
    }

    /// Authenticates `adata` and `payload`, encrypts `payload` in place and
    /// writes the encrypted tag into `tag`. The tag length (0, or an even
    /// number from 4 to 16) is `tag.len()`.
    pub fn encrypt(
        &self,
        nonce: &[u8],
        adata: &[u8],
        payload: &mut [u8],
        tag: &mut [u8],
    ) -> Result<(), ErrorCode> {
        let m = tag.len();
        if m != 0 && (m < 4 || m > AES_BLOCK_SIZE || m % 2 != 0) {
            return Err(ErrorCode::INVAL);
        }

        let mut l = 0;
        let mut len = payload.len();
        while len > 0 {
            l += 1;
            len >>= 8;
        }
        l = l.max(2);
        let mut nonce_len = nonce.len().min(MAX_NONCE_LENGTH);
        if l < 15 - nonce_len {
            l = 15 - nonce_len;
        }
        if nonce_len > 15 - l {
            nonce_len = 15 - l;
        }

        let mut b0 = [0u8; AES_BLOCK_SIZE];
        let m_field = if m == 0 { 0 } else { (m - 2) / 2 };
        b0[0] = (u8::from(!adata.is_empty()) << 6) | ((m_field as u8) << 3) | (l as u8 - 1);
        b0[1..1 + nonce_len].copy_from_slice(&nonce[..nonce_len]);
        let mut len = payload.len();
        for b in b0[1 + nonce_len..].iter_mut().rev() {
            *b = len as u8;
            len >>= 8;
        }

        let mut mac = CbcMac::new(&self.cipher, b0);
        if !adata.is_empty() {
            let a_len = adata.len();
            if a_len < 0xff00 {
                mac.update(&(a_len as u16).to_be_bytes());
            } else {
                mac.update(&[0xff, 0xfe]);
                mac.update(&(a_len as u32).to_be_bytes());
            }
            mac.update(adata);
            mac.pad();
        }
        mac.update(payload);
        mac.pad();

        let mut ctr = [0u8; AES_BLOCK_SIZE];
        ctr[0] = l as u8 - 1;
        ctr[1..1 + nonce_len].copy_from_slice(&nonce[..nonce_len]);

        let s0 = self.keystream(&ctr, l, 0);
        for (i, t) in tag.iter_mut().enumerate() {
            *t = mac.x[i] ^ s0[i];
        }

        for (i, chunk) in payload.chunks_mut(AES_BLOCK_SIZE).enumerate() {
            let s = self.keystream(&ctr, l, i + 1);
            for (p, k) in chunk.iter_mut().zip(s.iter()) {
                *p ^= *k;
            }
        }
        Ok(())
    }
}
