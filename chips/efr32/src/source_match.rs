// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Software source address match table.
//!
//! A parent keeps the addresses of sleepy children it holds frames for.
//! When a data request from one of them is acknowledged the frame pending
//! bit is set, telling the child to stay awake. Each interface has its own
//! table, and entries belong to the PAN that was configured when they were
//! added.

use core::cell::Cell;

use capsules_ieee802154::frame::MacAddress;

use crate::config::MAX_RADIO_INTERFACES;
use crate::error::RadioError;
use crate::platform::{reverse_ext_address, ExtAddress};

pub const SHORT_ENTRY_COUNT: usize = 10;
pub const EXT_ENTRY_COUNT: usize = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Entry<A> {
    pan_id: u16,
    address: A,
}

struct Table<A: Copy + PartialEq, const N: usize> {
    entries: [Cell<Option<Entry<A>>>; N],
}

impl<A: Copy + PartialEq, const N: usize> Table<A, N> {
    fn new() -> Table<A, N> {
        Table {
            entries: core::array::from_fn(|_| Cell::new(None)),
        }
    }

    fn find(&self, pan_id: u16, address: A) -> Option<usize> {
        let wanted = Some(Entry { pan_id, address });
        self.entries.iter().position(|entry| entry.get() == wanted)
    }

    fn add(&self, pan_id: u16, address: A) -> Result<(), RadioError> {
        if self.find(pan_id, address).is_some() {
            return Ok(());
        }
        let free = self
            .entries
            .iter()
            .find(|entry| entry.get().is_none())
            .ok_or(RadioError::NoBufs)?;
        free.set(Some(Entry { pan_id, address }));
        Ok(())
    }

    fn remove(&self, pan_id: u16, address: A) -> Result<(), RadioError> {
        let index = self.find(pan_id, address).ok_or(RadioError::NotFound)?;
        self.entries[index].set(None);
        Ok(())
    }

    fn clear(&self) {
        for entry in self.entries.iter() {
            entry.set(None);
        }
    }
}

pub struct SourceMatchTable {
    pan_ids: [Cell<u16>; MAX_RADIO_INTERFACES],
    short: [Table<u16, SHORT_ENTRY_COUNT>; MAX_RADIO_INTERFACES],
    ext: [Table<ExtAddress, EXT_ENTRY_COUNT>; MAX_RADIO_INTERFACES],
}

impl SourceMatchTable {
    pub fn new() -> SourceMatchTable {
        SourceMatchTable {
            pan_ids: core::array::from_fn(|_| Cell::new(0)),
            short: core::array::from_fn(|_| Table::new()),
            ext: core::array::from_fn(|_| Table::new()),
        }
    }

    fn pan_id(&self, iid: u8) -> u16 {
        self.pan_ids[iid as usize].get()
    }

    pub fn set_pan_id(&self, iid: u8, pan_id: u16) {
        self.pan_ids[iid as usize].set(pan_id);
    }

    pub fn add_short(&self, iid: u8, address: u16) -> Result<(), RadioError> {
        self.short[iid as usize].add(self.pan_id(iid), address)
    }

    pub fn clear_short(&self, iid: u8, address: u16) -> Result<(), RadioError> {
        self.short[iid as usize].remove(self.pan_id(iid), address)
    }

    pub fn clear_short_entries(&self, iid: u8) {
        self.short[iid as usize].clear();
    }

    /// `address` is most significant byte first.
    pub fn add_ext(&self, iid: u8, address: &ExtAddress) -> Result<(), RadioError> {
        self.ext[iid as usize].add(self.pan_id(iid), *address)
    }

    pub fn clear_ext(&self, iid: u8, address: &ExtAddress) -> Result<(), RadioError> {
        self.ext[iid as usize].remove(self.pan_id(iid), *address)
    }

    pub fn clear_ext_entries(&self, iid: u8) {
        self.ext[iid as usize].clear();
    }

    pub fn find_short(&self, iid: u8, address: u16) -> Option<usize> {
        self.short[iid as usize].find(self.pan_id(iid), address)
    }

    pub fn find_ext(&self, iid: u8, address: &ExtAddress) -> Option<usize> {
        self.ext[iid as usize].find(self.pan_id(iid), *address)
    }

    /// Looks up a source address taken from a frame.
    pub fn contains(&self, iid: u8, address: &MacAddress) -> bool {
        match address {
            MacAddress::Short(short) => self.find_short(iid, *short).is_some(),
            MacAddress::Long(long) => self.find_ext(iid, &reverse_ext_address(long)).is_some(),
        }
    }
}
