// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! IEEE 802.15.4 MAC frame layout.
//!
//! Frames are handled as plain PSDU byte slices, exactly as they are read out
//! of (or written into) the radio FIFO. The length of a PSDU slice always
//! includes the two FCS bytes at the end, even though the radio computes and
//! strips them itself.
//!
//! ```text
//! | FCF (2) | seq (0/1) | dst PAN (0/2) | dst addr (0/2/8) | src PAN (0/2) |
//! | src addr (0/2/8) | aux security header (0/5..14) | header IEs | payload |
//! | MIC (0/4/8/16) | FCS (2) |
//! ```
//!
//! [`Header::decode`] walks the header once and records where every field
//! lives so that callers can later patch fields (frame counter, key index)
//! in place without parsing again.

use enum_primitive::cast::FromPrimitive;
use enum_primitive::enum_from_primitive;
use kernel::utilities::registers::{register_bitfields, LocalRegisterCopy};
use kernel::ErrorCode;

use crate::ie;

pub const MAX_PSDU_SIZE: usize = 127;
pub const FCS_SIZE: usize = 2;
/// Smallest frame the radio reports: an immediate ACK.
pub const MIN_FRAME_LENGTH: usize = 5;
/// Smallest non-ACK frame accepted outside promiscuous mode.
pub const MIN_DATA_FRAME_LENGTH: usize = 5;
pub const FCF_SIZE: usize = 2;
pub const DSN_OFFSET: usize = 2;
/// Bit of the first FCF byte requesting an acknowledgment.
pub const FRAME_FLAG_ACK_REQUEST: u8 = 1 << 5;
pub const BROADCAST_PAN_ID: u16 = 0xffff;

register_bitfields![u16,
    pub FrameControl [
        FRAME_TYPE OFFSET(0) NUMBITS(3) [
            Beacon = 0,
            Data = 1,
            Ack = 2,
            MacCommand = 3,
            Multipurpose = 5,
            Fragment = 6,
            Extended = 7
        ],
        SECURITY_ENABLED OFFSET(3) NUMBITS(1) [],
        FRAME_PENDING OFFSET(4) NUMBITS(1) [],
        ACK_REQUEST OFFSET(5) NUMBITS(1) [],
        PAN_ID_COMPRESSION OFFSET(6) NUMBITS(1) [],
        SEQ_SUPPRESSION OFFSET(8) NUMBITS(1) [],
        IE_PRESENT OFFSET(9) NUMBITS(1) [],
        DST_ADDR_MODE OFFSET(10) NUMBITS(2) [
            None = 0,
            Short = 2,
            Long = 3
        ],
        FRAME_VERSION OFFSET(12) NUMBITS(2) [
            V2003 = 0,
            V2006 = 1,
            V2015 = 2
        ],
        SRC_ADDR_MODE OFFSET(14) NUMBITS(2) [
            None = 0,
            Short = 2,
            Long = 3
        ]
    ]
];

register_bitfields![u8,
    pub SecurityControl [
        LEVEL OFFSET(0) NUMBITS(3) [],
        KEY_ID_MODE OFFSET(3) NUMBITS(2) [],
        FRAME_COUNTER_SUPPRESSION OFFSET(5) NUMBITS(1) []
    ]
];

pub type FrameControlCopy = LocalRegisterCopy<u16, FrameControl::Register>;
pub type SecurityControlCopy = LocalRegisterCopy<u8, SecurityControl::Register>;

enum_from_primitive! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub enum FrameType {
        Beacon = 0,
        Data = 1,
        Ack = 2,
        MacCommand = 3,
        Multipurpose = 5,
        Fragment = 6,
        Extended = 7,
    }
}

enum_from_primitive! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd)]
    pub enum FrameVersion {
        V2003 = 0,
        V2006 = 1,
        V2015 = 2,
    }
}

enum_from_primitive! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub enum AddressMode {
        None = 0,
        Short = 2,
        Long = 3,
    }
}

/// Key identifier modes of the auxiliary security header.
pub mod key_id_mode {
    pub const IMPLICIT: u8 = 0;
    pub const INDEX: u8 = 1;
    pub const SOURCE_4_INDEX: u8 = 2;
    pub const SOURCE_8_INDEX: u8 = 3;
}

/// A MAC address. Extended addresses are kept in over-the-air byte order
/// (least significant byte first).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MacAddress {
    Short(u16),
    Long([u8; 8]),
}

impl MacAddress {
    fn encoded_len(&self) -> usize {
        match *self {
            MacAddress::Short(_) => 2,
            MacAddress::Long(_) => 8,
        }
    }

    fn encode(&self, buf: &mut [u8]) {
        match *self {
            MacAddress::Short(short) => buf[..2].copy_from_slice(&short.to_le_bytes()),
            MacAddress::Long(long) => buf[..8].copy_from_slice(&long),
        }
    }
}

fn address_len(mode: Option<AddressMode>) -> usize {
    match mode {
        Some(AddressMode::Short) => 2,
        Some(AddressMode::Long) => 8,
        _ => 0,
    }
}

fn read_u16(buf: &[u8], off: usize) -> Result<u16, ErrorCode> {
    buf.get(off..off + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(ErrorCode::SIZE)
}

fn read_address(buf: &[u8], off: usize, mode: Option<AddressMode>) -> Result<Option<MacAddress>, ErrorCode> {
    match mode {
        Some(AddressMode::Short) => Ok(Some(MacAddress::Short(read_u16(buf, off)?))),
        Some(AddressMode::Long) => {
            let mut long = [0; 8];
            long.copy_from_slice(buf.get(off..off + 8).ok_or(ErrorCode::SIZE)?);
            Ok(Some(MacAddress::Long(long)))
        }
        _ => Ok(None),
    }
}

/// Reads the frame control field at the start of a PSDU.
pub fn frame_control(psdu: &[u8]) -> Option<FrameControlCopy> {
    read_u16(psdu, 0).ok().map(FrameControlCopy::new)
}

fn addr_modes(fcf: FrameControlCopy) -> (Option<AddressMode>, Option<AddressMode>) {
    (
        AddressMode::from_u16(fcf.read(FrameControl::DST_ADDR_MODE)),
        AddressMode::from_u16(fcf.read(FrameControl::SRC_ADDR_MODE)),
    )
}

fn is_version_2015(fcf: FrameControlCopy) -> bool {
    fcf.read(FrameControl::FRAME_VERSION) == FrameVersion::V2015 as u16
}

/// Whether the destination PAN identifier field is present.
///
/// Frame versions before 2015 carry it whenever there is a destination
/// address. The 2015 revision derives it from the addressing modes and the
/// PAN ID compression bit (IEEE 802.15.4-2015, table 7-2).
pub fn is_dst_pan_present(fcf: FrameControlCopy) -> bool {
    let (dst, src) = addr_modes(fcf);
    let dst_present = address_len(dst) != 0;
    let src_present = address_len(src) != 0;

    if !is_version_2015(fcf) {
        return dst_present;
    }

    let compressed = fcf.is_set(FrameControl::PAN_ID_COMPRESSION);
    match (dst_present, src_present) {
        (false, false) => compressed,
        (true, false) => !compressed,
        (false, true) => false,
        (true, true) => {
            let both_long = dst == Some(AddressMode::Long) && src == Some(AddressMode::Long);
            !(both_long && compressed)
        }
    }
}

/// Whether the source PAN identifier field is present.
pub fn is_src_pan_present(fcf: FrameControlCopy) -> bool {
    let (dst, src) = addr_modes(fcf);
    if address_len(src) == 0 || fcf.is_set(FrameControl::PAN_ID_COMPRESSION) {
        return false;
    }
    if is_version_2015(fcf) && dst == Some(AddressMode::Long) && src == Some(AddressMode::Long) {
        return false;
    }
    true
}

/// MIC length for a security level.
pub fn mic_size(level: u8) -> usize {
    match level & 0x3 {
        1 => 4,
        2 => 8,
        3 => 16,
        _ => 0,
    }
}

fn key_id_field_len(mode: u8) -> usize {
    match mode {
        key_id_mode::INDEX => 1,
        key_id_mode::SOURCE_4_INDEX => 5,
        key_id_mode::SOURCE_8_INDEX => 9,
        _ => 0,
    }
}

/// Location and content of the auxiliary security header.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AuxSecurityHeader {
    /// Offset of the security control byte.
    pub offset: usize,
    pub control: u8,
    pub frame_counter: Option<u32>,
    /// Offset of the key identifier field (key source followed by index).
    pub key_id_offset: usize,
}

impl AuxSecurityHeader {
    fn control(&self) -> SecurityControlCopy {
        SecurityControlCopy::new(self.control)
    }

    pub fn level(&self) -> u8 {
        self.control().read(SecurityControl::LEVEL)
    }

    pub fn key_id_mode(&self) -> u8 {
        self.control().read(SecurityControl::KEY_ID_MODE)
    }

    fn frame_counter_offset(&self) -> Option<usize> {
        self.frame_counter.map(|_| self.offset + 1)
    }

    pub fn key_id_len(&self) -> usize {
        key_id_field_len(self.key_id_mode())
    }

    pub fn len(&self) -> usize {
        self.key_id_offset + self.key_id_len() - self.offset
    }
}

/// A decoded MAC header.
#[derive(Copy, Clone, Debug)]
pub struct Header {
    pub fcf: FrameControlCopy,
    pub seq: Option<u8>,
    pub dst_pan: Option<u16>,
    pub dst_addr: Option<MacAddress>,
    pub src_pan: Option<u16>,
    pub src_addr: Option<MacAddress>,
    pub security: Option<AuxSecurityHeader>,
    /// Offset of the first header IE (or of the payload when there are none).
    pub ie_offset: usize,
    /// Offset of the MAC payload: past the header IEs and any header
    /// termination IE.
    pub payload_offset: usize,
    /// PSDU length including the FCS.
    pub length: usize,
}

impl Header {
    /// Decodes the MAC header of `psdu`, whose length (FCS included) is the
    /// frame length.
    pub fn decode(psdu: &[u8]) -> Result<Header, ErrorCode> {
        let mut header = Header::decode_partial(psdu)?;
        let length = psdu.len();
        let footer = FCS_SIZE + header.mic_size();
        if header.ie_offset + footer > length {
            return Err(ErrorCode::SIZE);
        }
        if header.fcf.is_set(FrameControl::IE_PRESENT) {
            header.payload_offset = ie::header_ies_end(&psdu[..length - footer], header.ie_offset)?;
        }
        Ok(header)
    }

    /// Decodes addressing and the auxiliary security header from the start
    /// of a frame that may still be arriving. Header IEs are not parsed:
    /// `payload_offset` equals `ie_offset` and `length` is the number of
    /// bytes available.
    pub fn decode_partial(psdu: &[u8]) -> Result<Header, ErrorCode> {
        let fcf = frame_control(psdu).ok_or(ErrorCode::SIZE)?;
        let (dst_mode, src_mode) = addr_modes(fcf);
        let mut off = FCF_SIZE;

        let seq = if fcf.is_set(FrameControl::SEQ_SUPPRESSION) {
            None
        } else {
            let seq = *psdu.get(off).ok_or(ErrorCode::SIZE)?;
            off += 1;
            Some(seq)
        };

        let dst_pan = if is_dst_pan_present(fcf) {
            let pan = read_u16(psdu, off)?;
            off += 2;
            Some(pan)
        } else {
            None
        };
        let dst_addr = read_address(psdu, off, dst_mode)?;
        off += address_len(dst_mode);

        let src_pan = if is_src_pan_present(fcf) {
            let pan = read_u16(psdu, off)?;
            off += 2;
            Some(pan)
        } else {
            None
        };
        let src_addr = read_address(psdu, off, src_mode)?;
        off += address_len(src_mode);

        let security = if fcf.is_set(FrameControl::SECURITY_ENABLED) {
            let offset = off;
            let control = *psdu.get(off).ok_or(ErrorCode::SIZE)?;
            off += 1;
            let frame_counter = if SecurityControlCopy::new(control)
                .is_set(SecurityControl::FRAME_COUNTER_SUPPRESSION)
            {
                None
            } else {
                let b = psdu.get(off..off + 4).ok_or(ErrorCode::SIZE)?;
                off += 4;
                Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            };
            let header = AuxSecurityHeader {
                offset,
                control,
                frame_counter,
                key_id_offset: off,
            };
            off += header.key_id_len();
            Some(header)
        } else {
            None
        };

        Ok(Header {
            fcf,
            seq,
            dst_pan,
            dst_addr,
            src_pan,
            src_addr,
            security,
            ie_offset: off,
            payload_offset: off,
            length: psdu.len(),
        })
    }

    pub fn frame_type(&self) -> Option<FrameType> {
        FrameType::from_u16(self.fcf.read(FrameControl::FRAME_TYPE))
    }

    pub fn version(&self) -> Option<FrameVersion> {
        FrameVersion::from_u16(self.fcf.read(FrameControl::FRAME_VERSION))
    }

    pub fn is_version_2015(&self) -> bool {
        is_version_2015(self.fcf)
    }

    pub fn ack_requested(&self) -> bool {
        self.fcf.is_set(FrameControl::ACK_REQUEST)
    }

    pub fn frame_pending(&self) -> bool {
        self.fcf.is_set(FrameControl::FRAME_PENDING)
    }

    pub fn security_enabled(&self) -> bool {
        self.security.is_some()
    }

    pub fn security_level(&self) -> u8 {
        self.security.map_or(0, |s| s.level())
    }

    pub fn key_id_mode(&self) -> Option<u8> {
        self.security.map(|s| s.key_id_mode())
    }

    /// The key index, which is the last byte of the key identifier field.
    pub fn key_id(&self, psdu: &[u8]) -> Option<u8> {
        let sec = self.security?;
        match sec.key_id_len() {
            0 => None,
            n => psdu.get(sec.key_id_offset + n - 1).copied(),
        }
    }

    pub fn mic_size(&self) -> usize {
        mic_size(self.security_level())
    }

    /// MIC plus FCS.
    pub fn footer_length(&self) -> usize {
        self.mic_size() + FCS_SIZE
    }

    /// Length of the payload between the header and the footer.
    pub fn payload_length(&self) -> usize {
        self.length - self.footer_length() - self.payload_offset
    }

    pub fn set_frame_counter(&self, psdu: &mut [u8], counter: u32) -> Result<(), ErrorCode> {
        let off = self
            .security
            .and_then(|s| s.frame_counter_offset())
            .ok_or(ErrorCode::INVAL)?;
        psdu[off..off + 4].copy_from_slice(&counter.to_le_bytes());
        Ok(())
    }

    pub fn set_key_id(&self, psdu: &mut [u8], key_id: u8) -> Result<(), ErrorCode> {
        let sec = self.security.ok_or(ErrorCode::INVAL)?;
        match sec.key_id_len() {
            0 => Err(ErrorCode::INVAL),
            n => {
                psdu[sec.key_id_offset + n - 1] = key_id;
                Ok(())
            }
        }
    }
}

/// Builds an enhanced acknowledgment for `rx` into `out`.
///
/// The ACK is a 2015 frame addressed to the originator of `rx` (its source
/// address and PAN), mirrors its sequence number and security settings, and
/// carries `ie_data` as header IEs. A secured ACK gets a zero frame counter
/// placeholder that transmit security fills in later. Returns the PSDU
/// length including MIC and FCS.
pub fn generate_enh_ack(
    rx: &Header,
    rx_psdu: &[u8],
    frame_pending: bool,
    ie_data: &[u8],
    out: &mut [u8],
) -> Result<usize, ErrorCode> {
    let mut fcf = FrameControlCopy::new(0);
    fcf.modify(FrameControl::FRAME_TYPE::Ack + FrameControl::FRAME_VERSION::V2015);
    if rx.security_enabled() {
        fcf.modify(FrameControl::SECURITY_ENABLED::SET);
    }
    if frame_pending {
        fcf.modify(FrameControl::FRAME_PENDING::SET);
    }
    if !ie_data.is_empty() {
        fcf.modify(FrameControl::IE_PRESENT::SET);
    }
    if rx.seq.is_none() {
        fcf.modify(FrameControl::SEQ_SUPPRESSION::SET);
    }
    match rx.src_addr {
        Some(MacAddress::Short(_)) => fcf.modify(FrameControl::DST_ADDR_MODE::Short),
        Some(MacAddress::Long(_)) => fcf.modify(FrameControl::DST_ADDR_MODE::Long),
        None => fcf.modify(FrameControl::DST_ADDR_MODE::None),
    }

    let header_len = FCF_SIZE
        + usize::from(rx.seq.is_some())
        + if is_dst_pan_present(fcf) { 2 } else { 0 }
        + rx.src_addr.map_or(0, |a| a.encoded_len())
        + rx.security.map_or(0, |s| s.len());
    let length = header_len + ie_data.len() + rx.footer_length();
    if length > MAX_PSDU_SIZE || length > out.len() {
        return Err(ErrorCode::SIZE);
    }

    out[..length].fill(0);
    out[..2].copy_from_slice(&fcf.get().to_le_bytes());
    let mut off = FCF_SIZE;
    if let Some(seq) = rx.seq {
        out[off] = seq;
        off += 1;
    }
    if is_dst_pan_present(fcf) {
        let pan = rx.src_pan.or(rx.dst_pan).ok_or(ErrorCode::INVAL)?;
        out[off..off + 2].copy_from_slice(&pan.to_le_bytes());
        off += 2;
    }
    if let Some(addr) = rx.src_addr {
        addr.encode(&mut out[off..]);
        off += addr.encoded_len();
    }
    if let Some(sec) = rx.security {
        out[off] = sec.control;
        off += 1;
        if sec.frame_counter.is_some() {
            // Frame counter placeholder, filled in by transmit security.
            off += 4;
        }
        let key_len = sec.key_id_len();
        out[off..off + key_len]
            .copy_from_slice(&rx_psdu[sec.key_id_offset..sec.key_id_offset + key_len]);
        off += key_len;
    }
    out[off..off + ie_data.len()].copy_from_slice(ie_data);

    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Data frame, 2006, ACK request, PAN ID compression, short dst, long
    // src, secured with level 5 and key id mode 1.
    const SECURED_DATA: [u8; 29] = [
        0x69, 0xd8, 0x33, // fcf, seq
        0xce, 0xfa, // dst pan
        0x00, 0x00, // dst short
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, // src long
        0x0d, 0x44, 0x33, 0x22, 0x11, 0x02, // aux security header
        0xaa, 0xbb, // payload
        0xc1, 0xc2, 0xc3, 0xc4, // mic
        0x00, 0x00, // fcs
    ];

    #[test]
    fn decode_secured_data_frame() {
        let psdu = SECURED_DATA;
        let header = Header::decode(&psdu).unwrap();

        assert_eq!(header.frame_type(), Some(FrameType::Data));
        assert_eq!(header.version(), Some(FrameVersion::V2006));
        assert!(header.ack_requested());
        assert_eq!(header.seq, Some(0x33));
        assert_eq!(header.dst_pan, Some(0xface));
        assert_eq!(header.dst_addr, Some(MacAddress::Short(0)));
        assert_eq!(header.src_pan, None);
        assert_eq!(
            header.src_addr,
            Some(MacAddress::Long([1, 2, 3, 4, 5, 6, 7, 8]))
        );
        assert_eq!(header.security_level(), 5);
        assert_eq!(header.key_id_mode(), Some(key_id_mode::INDEX));
        assert_eq!(header.key_id(&psdu), Some(0x02));
        assert_eq!(header.security.unwrap().frame_counter, Some(0x11223344));
        assert_eq!(header.payload_offset, 21);
        assert_eq!(header.footer_length(), 6);
        assert_eq!(header.payload_length(), 2);
    }

    #[test]
    fn patch_security_fields() {
        let mut psdu = SECURED_DATA;
        let header = Header::decode(&psdu).unwrap();

        header.set_frame_counter(&mut psdu, 0x0a0b0c0d).unwrap();
        header.set_key_id(&mut psdu, 7).unwrap();

        let header = Header::decode(&psdu).unwrap();
        assert_eq!(header.security.unwrap().frame_counter, Some(0x0a0b0c0d));
        assert_eq!(header.key_id(&psdu), Some(7));
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let psdu = SECURED_DATA;
        assert_eq!(Header::decode(&psdu[..12]).err(), Some(ErrorCode::SIZE));
        assert_eq!(Header::decode(&psdu[..1]).err(), Some(ErrorCode::SIZE));
    }

    #[test]
    fn partial_decode_stops_after_security_header() {
        let psdu = SECURED_DATA;
        assert!(Header::decode(&psdu[..21]).is_err());

        let header = Header::decode_partial(&psdu[..21]).unwrap();
        assert_eq!(header.src_addr, Some(MacAddress::Long([1, 2, 3, 4, 5, 6, 7, 8])));
        assert_eq!(header.key_id(&psdu), Some(0x02));
        assert_eq!(header.ie_offset, 21);
        assert_eq!(header.length, 21);

        assert_eq!(Header::decode_partial(&psdu[..16]).err(), Some(ErrorCode::SIZE));
    }

    #[test]
    fn pan_presence_2015() {
        let fcf = |v: u16| FrameControlCopy::new(v);
        let v2015 = 2 << 12;
        let compression = 1 << 6;
        let dst_short = 2 << 10;
        let dst_long = 3 << 10;
        let src_short = 2 << 14;
        let src_long = 3 << 14;

        assert!(!is_dst_pan_present(fcf(v2015)));
        assert!(is_dst_pan_present(fcf(v2015 | compression)));
        assert!(is_dst_pan_present(fcf(v2015 | dst_short)));
        assert!(!is_dst_pan_present(fcf(v2015 | dst_short | compression)));
        assert!(!is_dst_pan_present(fcf(v2015 | src_long)));
        assert!(is_dst_pan_present(fcf(v2015 | dst_long | src_long)));
        assert!(!is_dst_pan_present(fcf(v2015 | dst_long | src_long | compression)));
        assert!(is_dst_pan_present(fcf(v2015 | dst_short | src_long | compression)));

        assert!(is_src_pan_present(fcf(v2015 | dst_short | src_short)));
        assert!(!is_src_pan_present(fcf(v2015 | dst_short | src_short | compression)));
        assert!(!is_src_pan_present(fcf(v2015 | dst_long | src_long)));
        assert!(is_src_pan_present(fcf(dst_long | src_long)));
    }

    #[test]
    fn enh_ack_mirrors_addressing_and_security() {
        let rx_psdu = SECURED_DATA;
        let rx = Header::decode(&rx_psdu).unwrap();
        let ie = [0x04, 0x0d, 0x10, 0x00, 0x20, 0x00];
        let mut out = [0xffu8; MAX_PSDU_SIZE];

        let len = generate_enh_ack(&rx, &rx_psdu, true, &ie, &mut out).unwrap();
        let ack = Header::decode(&out[..len]).unwrap();

        assert_eq!(ack.frame_type(), Some(FrameType::Ack));
        assert!(ack.is_version_2015());
        assert!(ack.frame_pending());
        assert!(ack.fcf.is_set(FrameControl::IE_PRESENT));
        assert_eq!(ack.seq, Some(0x33));
        assert_eq!(ack.dst_pan, Some(0xface));
        assert_eq!(ack.dst_addr, rx.src_addr);
        assert_eq!(ack.src_addr, None);
        assert_eq!(ack.security_level(), 5);
        assert_eq!(ack.security.unwrap().frame_counter, Some(0));
        assert_eq!(ack.key_id(&out), Some(0x02));
        assert_eq!(&out[ack.ie_offset..ack.ie_offset + ie.len()], &ie);
        assert_eq!(len, 3 + 2 + 8 + 6 + ie.len() + 4 + FCS_SIZE);
    }

    #[test]
    fn enh_ack_without_source_address() {
        // 2015 data frame, short dst with PAN, no source address.
        let rx_psdu = [0x01, 0x28, 0x10, 0x34, 0x12, 0xff, 0xff, 0x00, 0x00];
        let rx = Header::decode(&rx_psdu).unwrap();
        let mut out = [0u8; MAX_PSDU_SIZE];

        let len = generate_enh_ack(&rx, &rx_psdu, false, &[], &mut out).unwrap();

        assert_eq!(len, 5);
        let ack = Header::decode(&out[..len]).unwrap();
        assert_eq!(ack.dst_addr, None);
        assert_eq!(ack.dst_pan, None);
        assert!(!ack.frame_pending());
        assert!(!ack.fcf.is_set(FrameControl::IE_PRESENT));
    }
}
