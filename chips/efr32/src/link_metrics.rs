// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Enhanced-ACK based link metrics probing (Thread link metrics subject).
//!
//! A probing neighbour asks for up to two metrics to be reported in every
//! enhanced ACK sent to it. The values are measured on the frame being
//! acknowledged and carried in a Thread vendor header IE, each scaled to a
//! single byte:
//!
//! ```text
//!   LQI          as received
//!   link margin  min(rssi - noise floor, 130) * 255 / 130
//!   RSSI         (clamp(rssi, -130, 0) + 130) * 255 / 130
//! ```

use core::cell::Cell;

use capsules_ieee802154::frame::MacAddress;
use capsules_ieee802154::ie::ENH_ACK_PROBING_MAX_DATA;

use crate::error::RadioError;
use crate::platform::{reverse_ext_address, ExtAddress};

pub const NEIGHBOR_COUNT: usize = 10;

const MAX_LINK_MARGIN: i16 = 130;
const MIN_RSSI: i16 = -130;
const MAX_RSSI: i16 = 0;

/// Metrics a neighbour wants reported.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkMetrics {
    /// Not available through enhanced ACKs.
    pub pdu_count: bool,
    pub lqi: bool,
    pub link_margin: bool,
    pub rssi: bool,
}

impl LinkMetrics {
    fn count(&self) -> usize {
        usize::from(self.lqi) + usize::from(self.link_margin) + usize::from(self.rssi)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Neighbor {
    short: u16,
    ext: ExtAddress,
    metrics: LinkMetrics,
}

impl Neighbor {
    fn matches(&self, address: &MacAddress) -> bool {
        match address {
            MacAddress::Short(short) => self.short == *short,
            MacAddress::Long(long) => self.ext == reverse_ext_address(long),
        }
    }
}

pub fn scale_link_margin(margin: u8) -> u8 {
    let margin = (margin as i16).min(MAX_LINK_MARGIN);
    (margin * 255 / MAX_LINK_MARGIN) as u8
}

pub fn scale_rssi(rssi: i8) -> u8 {
    let rssi = (rssi as i16).clamp(MIN_RSSI, MAX_RSSI);
    ((rssi - MIN_RSSI) * 255 / (MAX_RSSI - MIN_RSSI)) as u8
}

pub struct LinkMetricsProbing {
    noise_floor: i8,
    neighbors: [Cell<Option<Neighbor>>; NEIGHBOR_COUNT],
}

impl LinkMetricsProbing {
    /// `noise_floor` is the receive sensitivity in dBm.
    pub fn new(noise_floor: i8) -> LinkMetricsProbing {
        LinkMetricsProbing {
            noise_floor,
            neighbors: core::array::from_fn(|_| Cell::new(None)),
        }
    }

    fn position(&self, short: u16, ext: &ExtAddress) -> Option<usize> {
        self.neighbors.iter().position(|slot| {
            slot.get()
                .is_some_and(|neighbor| neighbor.short == short && neighbor.ext == *ext)
        })
    }

    /// Starts, updates or, with no metrics selected, stops probing for a
    /// neighbour. `ext` is most significant byte first.
    pub fn configure(
        &self,
        short: u16,
        ext: &ExtAddress,
        metrics: LinkMetrics,
    ) -> Result<(), RadioError> {
        if metrics.pdu_count || metrics.count() > ENH_ACK_PROBING_MAX_DATA {
            return Err(RadioError::InvalidArgs);
        }

        let existing = self.position(short, ext);
        if metrics.count() == 0 {
            let index = existing.ok_or(RadioError::NotFound)?;
            self.neighbors[index].set(None);
            return Ok(());
        }

        let index = existing
            .or_else(|| self.neighbors.iter().position(|slot| slot.get().is_none()))
            .ok_or(RadioError::NoBufs)?;
        self.neighbors[index].set(Some(Neighbor {
            short,
            ext: *ext,
            metrics,
        }));
        Ok(())
    }

    /// Writes the probing data for an ACK to `source` into `data`. Returns
    /// the number of bytes written, 0 if the neighbour is not probing.
    pub fn enh_ack_data(
        &self,
        source: &MacAddress,
        lqi: u8,
        rssi: i8,
        data: &mut [u8; ENH_ACK_PROBING_MAX_DATA],
    ) -> usize {
        let metrics = match self
            .neighbors
            .iter()
            .filter_map(Cell::get)
            .find(|neighbor| neighbor.matches(source))
        {
            Some(neighbor) => neighbor.metrics,
            None => return 0,
        };

        let mut len = 0;
        if metrics.lqi {
            data[len] = lqi;
            len += 1;
        }
        if metrics.link_margin {
            let margin = (rssi as i16 - self.noise_floor as i16).clamp(0, u8::MAX as i16);
            data[len] = scale_link_margin(margin as u8);
            len += 1;
        }
        if metrics.rssi {
            data[len] = scale_rssi(rssi);
            len += 1;
        }
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXT: ExtAddress = [0, 1, 2, 3, 4, 5, 6, 7];

    fn lqi_and_rssi() -> LinkMetrics {
        LinkMetrics {
            lqi: true,
            rssi: true,
            ..LinkMetrics::default()
        }
    }

    #[test]
    fn scaling() {
        assert_eq!(scale_link_margin(0), 0);
        assert_eq!(scale_link_margin(65), 127);
        assert_eq!(scale_link_margin(130), 255);
        assert_eq!(scale_link_margin(200), 255);

        assert_eq!(scale_rssi(-130), 0);
        assert_eq!(scale_rssi(-128), 3);
        assert_eq!(scale_rssi(-65), 127);
        assert_eq!(scale_rssi(0), 255);
        assert_eq!(scale_rssi(20), 255);
    }

    #[test]
    fn data_for_configured_neighbor() {
        let probing = LinkMetricsProbing::new(-100);
        probing.configure(0x1234, &EXT, lqi_and_rssi()).unwrap();

        let mut data = [0; ENH_ACK_PROBING_MAX_DATA];
        let len = probing.enh_ack_data(&MacAddress::Short(0x1234), 200, -65, &mut data);
        assert_eq!(len, 2);
        assert_eq!(data, [200, 127]);

        let mut air = EXT;
        air.reverse();
        assert_eq!(probing.enh_ack_data(&MacAddress::Long(air), 200, -65, &mut data), 2);
        assert_eq!(probing.enh_ack_data(&MacAddress::Short(0x4321), 200, -65, &mut data), 0);
    }

    #[test]
    fn link_margin_against_noise_floor() {
        let probing = LinkMetricsProbing::new(-100);
        let margin = LinkMetrics {
            link_margin: true,
            ..LinkMetrics::default()
        };
        probing.configure(0x0001, &EXT, margin).unwrap();

        let mut data = [0; ENH_ACK_PROBING_MAX_DATA];
        assert_eq!(probing.enh_ack_data(&MacAddress::Short(1), 0, -35, &mut data), 1);
        assert_eq!(data[0], 127);
        // Below the noise floor.
        probing.enh_ack_data(&MacAddress::Short(1), 0, -110, &mut data);
        assert_eq!(data[0], 0);
    }

    #[test]
    fn configuration_rules() {
        let probing = LinkMetricsProbing::new(-100);
        let all = LinkMetrics {
            lqi: true,
            link_margin: true,
            rssi: true,
            ..LinkMetrics::default()
        };
        assert_eq!(probing.configure(1, &EXT, all), Err(RadioError::InvalidArgs));
        let pdu = LinkMetrics {
            pdu_count: true,
            ..LinkMetrics::default()
        };
        assert_eq!(probing.configure(1, &EXT, pdu), Err(RadioError::InvalidArgs));

        assert_eq!(
            probing.configure(1, &EXT, LinkMetrics::default()),
            Err(RadioError::NotFound)
        );
        probing.configure(1, &EXT, lqi_and_rssi()).unwrap();
        probing.configure(1, &EXT, LinkMetrics::default()).unwrap();

        for short in 0..NEIGHBOR_COUNT as u16 {
            probing.configure(short, &EXT, lqi_and_rssi()).unwrap();
        }
        assert_eq!(
            probing.configure(0xfffe, &EXT, lqi_and_rssi()),
            Err(RadioError::NoBufs)
        );
        // Updating an existing neighbour needs no free slot.
        assert_eq!(probing.configure(3, &EXT, all_but_rssi()), Ok(()));
    }

    fn all_but_rssi() -> LinkMetrics {
        LinkMetrics {
            lqi: true,
            link_margin: true,
            ..LinkMetrics::default()
        }
    }
}
