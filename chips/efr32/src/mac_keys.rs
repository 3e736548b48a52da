// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! MAC security material of one Thread instance.
//!
//! The stack installs the previous, current and next MAC keys together with
//! the current key index. Outgoing data frames always use the current key;
//! an enhanced ACK uses whichever of the three keys the acknowledged frame
//! was secured with. The frame counter is shared by data frames and ACKs,
//! which are secured from interrupt context, so it is only ever advanced by
//! a single atomic read-modify-write.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use capsules_ieee802154::aes_ccm::AES_KEY_SIZE;

use crate::error::RadioError;

pub type MacKey = [u8; AES_KEY_SIZE];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeySlot {
    Previous,
    Current,
    Next,
}

pub struct MacKeys {
    key_id: Cell<u8>,
    keys: [Cell<MacKey>; 3],
    frame_counter: AtomicU32,
    ack_key_id: Cell<u8>,
    ack_frame_counter: Cell<u32>,
}

impl MacKeys {
    pub const fn new() -> MacKeys {
        MacKeys {
            key_id: Cell::new(0),
            keys: [
                Cell::new([0; AES_KEY_SIZE]),
                Cell::new([0; AES_KEY_SIZE]),
                Cell::new([0; AES_KEY_SIZE]),
            ],
            frame_counter: AtomicU32::new(0),
            ack_key_id: Cell::new(0),
            ack_frame_counter: Cell::new(0),
        }
    }

    /// Installs a new key set. The frame counter restarts at 0 before the
    /// keys change.
    pub fn set_keys(&self, key_id: u8, prev: &MacKey, curr: &MacKey, next: &MacKey) {
        self.frame_counter.store(0, Ordering::Release);
        self.key_id.set(key_id);
        self.keys[0].set(*prev);
        self.keys[1].set(*curr);
        self.keys[2].set(*next);
    }

    pub fn key_id(&self) -> u8 {
        self.key_id.get()
    }

    pub fn key(&self, slot: KeySlot) -> MacKey {
        self.keys[slot as usize].get()
    }

    /// Key that secured a frame carrying `key_id`.
    pub fn slot_for(&self, key_id: u8) -> Result<KeySlot, RadioError> {
        if key_id == 0 {
            return Err(RadioError::Failed);
        }
        let current = self.key_id.get();
        if current.checked_sub(1) == Some(key_id) {
            Ok(KeySlot::Previous)
        } else if current == key_id {
            Ok(KeySlot::Current)
        } else if current.checked_add(1) == Some(key_id) {
            Ok(KeySlot::Next)
        } else {
            Err(RadioError::Security)
        }
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter.load(Ordering::Acquire)
    }

    pub fn set_frame_counter(&self, counter: u32) {
        self.frame_counter.store(counter, Ordering::Release);
    }

    /// Moves the counter forward to `counter`; never moves it back.
    pub fn set_frame_counter_if_larger(&self, counter: u32) {
        self.frame_counter.fetch_max(counter, Ordering::AcqRel);
    }

    /// Takes the next frame counter value.
    pub fn next_frame_counter(&self) -> u32 {
        self.frame_counter.fetch_add(1, Ordering::AcqRel)
    }

    /// Key id and frame counter of the last secured enhanced ACK.
    pub fn record_ack(&self, key_id: u8, frame_counter: u32) {
        self.ack_key_id.set(key_id);
        self.ack_frame_counter.set(frame_counter);
    }

    pub fn ack_key_id(&self) -> u8 {
        self.ack_key_id.get()
    }

    pub fn ack_frame_counter(&self) -> u32 {
        self.ack_frame_counter.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keys_reset_counter() {
        let keys = MacKeys::new();
        keys.set_frame_counter(1000);
        keys.set_keys(5, &[1; 16], &[2; 16], &[3; 16]);
        assert_eq!(keys.frame_counter(), 0);
        assert_eq!(keys.key_id(), 5);
        assert_eq!(keys.key(KeySlot::Previous), [1; 16]);
        assert_eq!(keys.key(KeySlot::Next), [3; 16]);
    }

    #[test]
    fn counter_only_moves_forward_when_asked() {
        let keys = MacKeys::new();
        keys.set_frame_counter(10);
        keys.set_frame_counter_if_larger(5);
        assert_eq!(keys.frame_counter(), 10);
        keys.set_frame_counter_if_larger(20);
        assert_eq!(keys.frame_counter(), 20);

        assert_eq!(keys.next_frame_counter(), 20);
        assert_eq!(keys.next_frame_counter(), 21);
        assert_eq!(keys.frame_counter(), 22);

        keys.set_frame_counter(3);
        assert_eq!(keys.frame_counter(), 3);
    }

    #[test]
    fn ack_key_selection() {
        let keys = MacKeys::new();
        keys.set_keys(2, &[1; 16], &[2; 16], &[3; 16]);
        assert_eq!(keys.slot_for(1), Ok(KeySlot::Previous));
        assert_eq!(keys.slot_for(2), Ok(KeySlot::Current));
        assert_eq!(keys.slot_for(3), Ok(KeySlot::Next));
        assert_eq!(keys.slot_for(4), Err(RadioError::Security));
        assert_eq!(keys.slot_for(0), Err(RadioError::Failed));

        // No wrap around the key index range.
        keys.set_keys(255, &[1; 16], &[2; 16], &[3; 16]);
        assert_eq!(keys.slot_for(1), Err(RadioError::Security));
    }
}
