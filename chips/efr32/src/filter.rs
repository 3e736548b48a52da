// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Receive filter mask decoding for multipan builds.
//!
//! The radio reports which of its address filters matched an incoming frame
//! as a byte:
//!
//! ```text
//!  7     6     5     4     3     2     1     0
//! +-----+-----+-----+-----+-----+-----+-----+-----+
//! |  ADDR index 2..0 | BCAST|  PAN index 2..0 | BCAST|
//! |                  | ADDR |                 | PAN  |
//! +-----+-----+-----+-----+-----+-----+-----+-----+
//! ```
//!
//! PAN slot `n` and address slot `n` belong to interface `n + 1`;
//! interface 0 is the broadcast interface.

/// Broadcast PAN ID matched.
pub const BROADCAST_PAN_MATCH: u8 = 1 << 0;
/// Broadcast destination address matched.
pub const BROADCAST_ADDR_MATCH: u8 = 1 << 4;

const PAN_MASK: u8 = 0x0e;
const ADDR_MASK: u8 = 0xe0;

/// Filter bits that belong to the PAN at `pan_index` (its PAN ID and
/// address slots).
pub fn pan_filter_bits(pan_index: usize) -> u8 {
    (1 << (pan_index + 1)) | (1 << (pan_index + 5))
}

/// Interface id a received frame belongs to.
///
/// Only the broadcast PAN filter and the PAN filters enabled by
/// `enabled_mask` count. If exactly one PAN filter matched the frame belongs
/// to that PAN's interface; any other mask, including no match or several
/// matches, maps to the broadcast interface.
pub fn iid_from_filter_mask(mask: u8, enabled_mask: u8, multipan: bool) -> u8 {
    if !multipan {
        return 0;
    }

    let pan_bits = mask & (enabled_mask | BROADCAST_PAN_MATCH) & (PAN_MASK | BROADCAST_PAN_MATCH);
    if !pan_bits.is_power_of_two() {
        return 0;
    }
    pan_bits.trailing_zeros() as u8
}

/// Checks that a frame's PAN and address matches are consistent: either a
/// broadcast matched, one side of the filter did not match at all, or the
/// PAN slot that matched is also the address slot that matched.
pub fn is_filter_mask_valid(mask: u8, multipan: bool) -> bool {
    if !multipan {
        return true;
    }

    if mask & (BROADCAST_PAN_MATCH | BROADCAST_ADDR_MATCH) != 0 {
        return true;
    }

    let pans = (mask & PAN_MASK) >> 1;
    let addrs = (mask & ADDR_MASK) >> 5;
    pans == 0 || addrs == 0 || pans & addrs != 0
}
