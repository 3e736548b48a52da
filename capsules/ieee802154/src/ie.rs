// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Header information elements.
//!
//! Every header IE starts with a two byte descriptor:
//!
//! ```text
//! | length (bits 0-6) | element id (bits 7-14) | type = 0 (bit 15) |
//! ```
//!
//! Only the elements an enhanced acknowledgment can carry are generated
//! here: the CSL IE and the Thread vendor IE used for enhanced-ACK based
//! link metrics probing.

use kernel::utilities::registers::{register_bitfields, LocalRegisterCopy};
use kernel::ErrorCode;

pub const HEADER_IE_DESCRIPTOR_SIZE: usize = 2;

pub const VENDOR_IE_ID: u8 = 0x00;
pub const CSL_IE_ID: u8 = 0x1a;
pub const TERMINATION_1_IE_ID: u8 = 0x7e;
pub const TERMINATION_2_IE_ID: u8 = 0x7f;

pub const CSL_IE_CONTENT_SIZE: usize = 4;
pub const CSL_IE_SIZE: usize = HEADER_IE_DESCRIPTOR_SIZE + CSL_IE_CONTENT_SIZE;

/// Thread vendor OUI, over-the-air byte order.
pub const THREAD_OUI: [u8; 3] = [0x9b, 0xb8, 0xea];
pub const ENH_ACK_PROBING_SUBTYPE: u8 = 0x00;
/// Descriptor, OUI and subtype in front of the probing data.
pub const ENH_ACK_PROBING_IE_OVERHEAD: usize = HEADER_IE_DESCRIPTOR_SIZE + THREAD_OUI.len() + 1;
/// At most two metrics are reported in an enhanced ACK.
pub const ENH_ACK_PROBING_MAX_DATA: usize = 2;

register_bitfields![u16,
    pub HeaderIeDescriptor [
        LENGTH OFFSET(0) NUMBITS(7) [],
        ID OFFSET(7) NUMBITS(8) [],
        TYPE OFFSET(15) NUMBITS(1) []
    ]
];

type Descriptor = LocalRegisterCopy<u16, HeaderIeDescriptor::Register>;

fn write_descriptor(buf: &mut [u8], id: u8, len: usize) {
    let mut desc = Descriptor::new(0);
    desc.modify(HeaderIeDescriptor::LENGTH.val(len as u16) + HeaderIeDescriptor::ID.val(id as u16));
    buf[..HEADER_IE_DESCRIPTOR_SIZE].copy_from_slice(&desc.get().to_le_bytes());
}

/// One header IE found in a frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HeaderIe {
    pub id: u8,
    /// Offset of the IE content.
    pub offset: usize,
    pub len: usize,
}

/// Walks the header IEs of a frame, stopping after a termination IE.
pub struct HeaderIes<'a> {
    buf: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> HeaderIes<'a> {
    /// `buf` must end where the MAC footer begins.
    pub fn new(buf: &'a [u8], offset: usize) -> HeaderIes<'a> {
        HeaderIes {
            buf,
            offset,
            done: false,
        }
    }

    /// Offset just past the last element returned.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for HeaderIes<'_> {
    type Item = Result<HeaderIe, ErrorCode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.buf.len() {
            return None;
        }
        let raw = match self.buf.get(self.offset..self.offset + HEADER_IE_DESCRIPTOR_SIZE) {
            Some(b) => u16::from_le_bytes([b[0], b[1]]),
            None => {
                self.done = true;
                return Some(Err(ErrorCode::SIZE));
            }
        };
        let desc = Descriptor::new(raw);
        let ie = HeaderIe {
            id: desc.read(HeaderIeDescriptor::ID) as u8,
            offset: self.offset + HEADER_IE_DESCRIPTOR_SIZE,
            len: desc.read(HeaderIeDescriptor::LENGTH) as usize,
        };
        if ie.offset + ie.len > self.buf.len() {
            self.done = true;
            return Some(Err(ErrorCode::SIZE));
        }
        self.offset = ie.offset + ie.len;
        if ie.id == TERMINATION_1_IE_ID || ie.id == TERMINATION_2_IE_ID {
            self.done = true;
        }
        Some(Ok(ie))
    }
}

/// Returns the offset of the MAC payload that follows the header IEs
/// starting at `start`.
pub fn header_ies_end(buf: &[u8], start: usize) -> Result<usize, ErrorCode> {
    let mut ies = HeaderIes::new(buf, start);
    for ie in &mut ies {
        ie?;
    }
    Ok(ies.offset())
}

/// Writes a CSL IE carrying `period` and a zero phase. Returns the number
/// of bytes written.
pub fn write_csl_ie(buf: &mut [u8], period: u16) -> usize {
    write_descriptor(buf, CSL_IE_ID, CSL_IE_CONTENT_SIZE);
    let content = &mut buf[HEADER_IE_DESCRIPTOR_SIZE..CSL_IE_SIZE];
    content[..2].copy_from_slice(&0u16.to_le_bytes());
    content[2..].copy_from_slice(&period.to_le_bytes());
    CSL_IE_SIZE
}

/// Updates the phase and period of the CSL IE found among the header IEs
/// of `buf` starting at `start`.
pub fn set_csl_ie(buf: &mut [u8], start: usize, period: u16, phase: u16) -> Result<(), ErrorCode> {
    let ie = HeaderIes::new(buf, start)
        .filter_map(Result::ok)
        .find(|ie| ie.id == CSL_IE_ID && ie.len >= CSL_IE_CONTENT_SIZE)
        .ok_or(ErrorCode::FAIL)?;
    buf[ie.offset..ie.offset + 2].copy_from_slice(&phase.to_le_bytes());
    buf[ie.offset + 2..ie.offset + 4].copy_from_slice(&period.to_le_bytes());
    Ok(())
}

/// Writes the Thread vendor IE used for enhanced-ACK link metrics probing.
/// Returns the number of bytes written.
pub fn write_enh_ack_probing_ie(buf: &mut [u8], data: &[u8]) -> Result<usize, ErrorCode> {
    let total = ENH_ACK_PROBING_IE_OVERHEAD + data.len();
    if data.len() > ENH_ACK_PROBING_MAX_DATA || total > buf.len() {
        return Err(ErrorCode::SIZE);
    }
    write_descriptor(buf, VENDOR_IE_ID, total - HEADER_IE_DESCRIPTOR_SIZE);
    let mut off = HEADER_IE_DESCRIPTOR_SIZE;
    buf[off..off + THREAD_OUI.len()].copy_from_slice(&THREAD_OUI);
    off += THREAD_OUI.len();
    buf[off] = ENH_ACK_PROBING_SUBTYPE;
    off += 1;
    buf[off..total].copy_from_slice(data);
    Ok(total)
}
