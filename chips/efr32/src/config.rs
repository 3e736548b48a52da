// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Platform configuration.
//!
//! Two kinds of configuration live here. [`CONFIG`] holds compile-time
//! switches for diagnostic output: because they are constants, every code
//! path stays type-checked while disabled logging folds away. [`RadioConfig`]
//! and [`PlatformConfig`] describe the board and the Thread feature set; a
//! board builds them once at start-up and hands them to the drivers by
//! reference.

/// Compile-time diagnostic switches.
pub(crate) struct Config {
    /// Print radio state transitions and dropped frames.
    pub(crate) debug_radio: bool,

    /// Print alarm arming and wrap handling.
    pub(crate) debug_alarm: bool,

    /// Print a debug counter each time it is incremented.
    pub(crate) debug_counters: bool,

    /// Print EM1 requirement changes.
    pub(crate) debug_sleep: bool,
}

pub(crate) const CONFIG: Config = Config {
    debug_radio: false,
    debug_alarm: false,
    debug_counters: false,
    debug_sleep: false,
};

/// Largest number of Thread instances a multipan build can host.
pub const MAX_INSTANCES: usize = 3;
/// Broadcast interface plus one per instance.
pub const MAX_RADIO_INTERFACES: usize = MAX_INSTANCES + 1;

#[derive(Copy, Clone, Debug)]
pub struct RadioConfig {
    /// Several Thread instances share the radio (multipan RCP).
    pub multipan: bool,
    /// Number of Thread instances, 1 to [`MAX_INSTANCES`].
    pub instance_count: usize,
    /// The device is a CSL receiver and advertises CSL IEs in its frames.
    pub csl_receiver: bool,
    /// The device answers enhanced-ACK link metrics probing.
    pub link_metrics_subject: bool,
    /// Thread 1.2: enhanced ACKs, transmit security and scheduled frames.
    pub enhanced_ack: bool,
    pub debug_counters: bool,

    /// Scheduler priority of a first transmission attempt. Lower values
    /// win arbitration.
    pub tx_priority_min: u8,
    /// Priority gained by each retransmission.
    pub tx_priority_step: u8,
    /// Highest priority a retransmission can reach.
    pub tx_priority_max: u8,
    pub background_rx_priority: u8,
    /// Time the scheduler may slip the start of a transmission, in us.
    pub tx_slip_time_us: u32,

    pub cca_threshold_dbm: i8,
    pub receive_sensitivity_dbm: i8,
    pub default_tx_power_dbm: i8,
    /// Energy sampled by a synchronous RSSI read, in us.
    pub rssi_averaging_time_us: u32,
    /// Give up on a synchronous RSSI read after this long, in us.
    pub rssi_averaging_timeout_us: u32,
    pub csl_tx_uncertainty: u8,

    /// PHY header bytes: 1 for 2.4 GHz O-QPSK, 2 for sub-GHz.
    pub phr_size: usize,
    /// Synchronization header bytes (preamble and start of frame delimiter).
    pub shr_size: usize,
    /// Receive to transmit turnaround of the radio, in us.
    pub rx_to_tx_us: u32,
}

impl RadioConfig {
    pub const fn default() -> RadioConfig {
        RadioConfig {
            multipan: false,
            instance_count: 1,
            csl_receiver: true,
            link_metrics_subject: true,
            enhanced_ack: true,
            debug_counters: false,
            tx_priority_min: 100,
            tx_priority_step: 5,
            tx_priority_max: 80,
            background_rx_priority: 255,
            tx_slip_time_us: 500_000,
            cca_threshold_dbm: -75,
            receive_sensitivity_dbm: -100,
            default_tx_power_dbm: 0,
            rssi_averaging_time_us: 16,
            rssi_averaging_timeout_us: 300,
            csl_tx_uncertainty: 10,
            phr_size: 1,
            shr_size: 5,
            rx_to_tx_us: 192,
        }
    }

    /// Sub-GHz variant: two byte PHY header and a longer SHR.
    pub const fn sub_ghz() -> RadioConfig {
        let mut config = RadioConfig::default();
        config.phr_size = 2;
        config.shr_size = 6;
        config
    }

    /// Interface ids in use. Interface 0 is the broadcast interface in
    /// multipan builds.
    pub fn radio_interface_count(&self) -> usize {
        if self.multipan {
            self.instance_count + 1
        } else {
            1
        }
    }

    /// Maps an interface id to its address filter slot and transmit buffer.
    pub fn pan_index(&self, iid: u8) -> usize {
        let index = if self.multipan {
            (iid as usize)
                .checked_sub(1)
                .unwrap_or_else(|| panic!("interface {} has no PAN slot", iid))
        } else {
            0
        };
        if index >= self.instance_count {
            panic!("interface {} out of range", iid);
        }
        index
    }

    /// Maps an instance slot back to its interface id.
    pub fn iid_from_index(&self, index: usize) -> u8 {
        if self.multipan {
            index as u8 + 1
        } else {
            0
        }
    }

    /// Next scheduler priority for a frame: a fresh frame starts at the
    /// minimum, each retransmission climbs by one step up to the maximum.
    pub fn next_tx_priority(&self, current: u8, is_retx: bool) -> u8 {
        let mut priority = current;
        if !is_retx {
            priority = self.tx_priority_min;
        } else if priority > self.tx_priority_step {
            priority -= self.tx_priority_step;
        }
        priority.max(self.tx_priority_max)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct PlatformConfig {
    /// The device may enter EM2 between events.
    pub sleep_allowed: bool,
    /// Do not sleep when a millisecond alarm is due sooner than this.
    pub min_sleep_duration_ms: u32,
    pub hfxo_accuracy_ppm: u8,
    pub lfxo_accuracy_ppm: u8,
}

impl PlatformConfig {
    pub const fn default() -> PlatformConfig {
        PlatformConfig {
            sleep_allowed: true,
            min_sleep_duration_ms: 5,
            hfxo_accuracy_ppm: 40,
            lfxo_accuracy_ppm: 100,
        }
    }

    /// Worst-case clock accuracy reported to the stack for CSL.
    pub fn xtal_accuracy_ppm(&self) -> u8 {
        if self.sleep_allowed {
            self.hfxo_accuracy_ppm.saturating_add(self.lfxo_accuracy_ppm)
        } else {
            self.hfxo_accuracy_ppm
        }
    }
}
