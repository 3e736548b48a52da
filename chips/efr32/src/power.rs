// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Transmit power selection across interfaces.
//!
//! Each interface may set a default transmit power and a maximum power per
//! channel. The radio is shared, so the power actually used must satisfy
//! every interface: it is the smallest per-channel maximum, capped by the
//! largest default. With nothing configured the board default applies.

use core::cell::Cell;

use kernel::debug;

use crate::band::Band;
use crate::config::{RadioConfig, CONFIG, MAX_RADIO_INTERFACES};
use crate::error::RadioError;
use crate::rail::Rail;

/// Marks an unset table entry.
pub const INVALID_TX_POWER: i8 = 127;

/// Channels covered by the per-channel table.
pub const CHANNEL_COUNT: usize = 16;

pub struct TxPowerManager<'a> {
    rail: &'a dyn Rail<'a>,
    config: &'a RadioConfig,
    band: Band,
    default_power: [Cell<i8>; MAX_RADIO_INTERFACES],
    max_power: [[Cell<i8>; CHANNEL_COUNT]; MAX_RADIO_INTERFACES],
}

impl<'a> TxPowerManager<'a> {
    pub fn new(rail: &'a dyn Rail<'a>, config: &'a RadioConfig, band: Band) -> TxPowerManager<'a> {
        TxPowerManager {
            rail,
            config,
            band,
            default_power: core::array::from_fn(|_| Cell::new(INVALID_TX_POWER)),
            max_power: core::array::from_fn(|_| {
                core::array::from_fn(|_| Cell::new(INVALID_TX_POWER))
            }),
        }
    }

    pub fn init(&self) {
        for (default, channels) in self.default_power.iter().zip(self.max_power.iter()) {
            default.set(INVALID_TX_POWER);
            for max in channels.iter() {
                max.set(INVALID_TX_POWER);
            }
        }
    }

    fn channel_index(&self, channel: u8) -> Option<usize> {
        if !self.band.contains(channel) {
            return None;
        }
        let index = (channel - self.band.channel_min) as usize;
        (index < CHANNEL_COUNT).then_some(index)
    }

    /// Power to use on `channel`, in dBm.
    pub fn tx_power_for_channel(&self, channel: u8) -> i8 {
        let interfaces = self.config.radio_interface_count();
        let index = self.channel_index(channel);

        let mut max_channel_power = INVALID_TX_POWER;
        let mut max_default_power = INVALID_TX_POWER;
        for iid in 0..interfaces {
            if let Some(index) = index {
                max_channel_power = max_channel_power.min(self.max_power[iid][index].get());
            }
            let default = self.default_power[iid].get();
            if default != INVALID_TX_POWER {
                max_default_power = if max_default_power == INVALID_TX_POWER {
                    default
                } else {
                    max_default_power.max(default)
                };
            }
        }

        match max_channel_power.min(max_default_power) {
            INVALID_TX_POWER => self.config.default_tx_power_dbm,
            power => power,
        }
    }

    pub fn tx_power_for_current_channel(&self) -> i8 {
        let channel = self.rail.channel().unwrap_or(self.band.channel_min);
        self.tx_power_for_channel(channel)
    }

    /// Programs the radio with `power` dBm.
    pub fn apply(&self, power: i8) -> Result<(), RadioError> {
        self.rail.set_tx_power_deci_dbm(power as i16 * 10).map_err(|e| {
            if CONFIG.debug_radio {
                debug!("efr32: setting tx power {} failed: {:?}", power, e);
            }
            RadioError::from(e)
        })
    }

    pub fn set_default_tx_power(&self, iid: u8, power: i8) -> Result<(), RadioError> {
        self.default_power[iid as usize].set(power);
        self.apply(self.tx_power_for_current_channel())
    }

    pub fn set_channel_max_tx_power(
        &self,
        iid: u8,
        channel: u8,
        power: i8,
    ) -> Result<(), RadioError> {
        let index = self.channel_index(channel).ok_or(RadioError::InvalidArgs)?;
        self.max_power[iid as usize][index].set(power);
        self.apply(self.tx_power_for_current_channel())
    }
}
