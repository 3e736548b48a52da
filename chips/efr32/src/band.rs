// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Frequency bands the radio can be configured for.

use crate::config::RadioConfig;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phy {
    /// 2.4 GHz O-QPSK, the default IEEE 802.15.4 PHY.
    Oqpsk2p4Ghz,
    /// A sub-GHz PHY with a two byte PHY header.
    SubGhz,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Band {
    pub phy: Phy,
    pub channel_min: u8,
    pub channel_max: u8,
}

impl Band {
    pub const OQPSK_2P4GHZ: Band = Band {
        phy: Phy::Oqpsk2p4Ghz,
        channel_min: 11,
        channel_max: 26,
    };

    pub const SUB_GHZ_915MHZ: Band = Band {
        phy: Phy::SubGhz,
        channel_min: 0,
        channel_max: 10,
    };

    pub fn contains(&self, channel: u8) -> bool {
        self.channel_min <= channel && channel <= self.channel_max
    }

    /// Band matching the PHY header size of `config`.
    pub fn for_config(config: &RadioConfig) -> Band {
        if config.phr_size == 2 {
            Band::SUB_GHZ_915MHZ
        } else {
            Band::OQPSK_2P4GHZ
        }
    }
}

/// Index of the band in `bands` that covers `channel`.
pub fn lookup(bands: &[Band], channel: u8) -> Option<usize> {
    bands.iter().position(|band| band.contains(channel))
}
