// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Power mode gating for the Thread stack.
//!
//! The device may drop to EM2 between events only while no EM1 requirement
//! is held with the power manager. The sleep manager holds one on behalf of
//! the stack and releases it from `update()` once there is no reason to stay
//! awake: no platform event waiting to be processed, no tasklets pending and
//! no millisecond alarm due within the minimum sleep duration.

use core::cell::Cell;

use kernel::debug;
use kernel::utilities::cells::OptionalCell;

use crate::alarm::AlarmService;
use crate::config::{PlatformConfig, RadioConfig, CONFIG};
use crate::platform::PlatformClient;

/// Energy mode requirements, as kept by the chip's power manager.
pub trait PowerManager {
    fn add_em1_requirement(&self);
    fn remove_em1_requirement(&self);
}

/// Application override of the sleep decision.
pub trait SleepPolicy {
    fn allow_sleep(&self) -> bool;
}

/// What the power manager should do when an interrupt handler returns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IsrExitAction {
    Ignore,
    Wakeup,
}

pub struct SleepManager<'a, const N: usize> {
    power: &'a dyn PowerManager,
    alarms: &'a AlarmService<'a, N>,
    config: &'a RadioConfig,
    platform: &'a PlatformConfig,
    wake_required: Cell<bool>,
    /// Host transport data waiting to be processed.
    io_pending: Cell<bool>,
    policy: OptionalCell<&'a dyn SleepPolicy>,
    client: OptionalCell<&'a dyn PlatformClient>,
}

impl<'a, const N: usize> SleepManager<'a, N> {
    pub fn new(
        power: &'a dyn PowerManager,
        alarms: &'a AlarmService<'a, N>,
        config: &'a RadioConfig,
        platform: &'a PlatformConfig,
    ) -> SleepManager<'a, N> {
        SleepManager {
            power,
            alarms,
            config,
            platform,
            wake_required: Cell::new(false),
            io_pending: Cell::new(false),
            policy: OptionalCell::empty(),
            client: OptionalCell::empty(),
        }
    }

    /// Holds the device awake until the first `update()`.
    pub fn init(&self) {
        self.set_wake_requirement(true);
    }

    pub fn set_client(&self, client: &'a dyn PlatformClient) {
        self.client.set(client);
    }

    pub fn set_policy(&self, policy: &'a dyn SleepPolicy) {
        self.policy.set(policy);
    }

    pub fn set_io_pending(&self, pending: bool) {
        self.io_pending.set(pending);
    }

    pub fn wake_required(&self) -> bool {
        self.wake_required.get()
    }

    /// Whether sleep is allowed: the policy's answer if one is installed,
    /// otherwise whether no wake requirement is held.
    pub fn allow_sleep(&self) -> bool {
        self.policy
            .map_or(!self.wake_required.get(), |policy| policy.allow_sleep())
    }

    /// Called by the power manager right before sleeping.
    pub fn is_ok_to_sleep(&self) -> bool {
        !(self.wake_required.get() || self.should_interrupt_sleep())
    }

    pub fn on_isr_exit(&self) -> IsrExitAction {
        if self.platform_event_pending() {
            IsrExitAction::Wakeup
        } else {
            IsrExitAction::Ignore
        }
    }

    /// Takes or releases the wake requirement. Called from the main loop
    /// after the stack has processed its events.
    pub fn update(&self) {
        let policy_denies = self.policy.map_or(false, |policy| !policy.allow_sleep());
        let stay_awake = !self.platform.sleep_allowed
            || policy_denies
            || self.platform_event_pending()
            || self.should_interrupt_sleep();
        self.set_wake_requirement(stay_awake);
    }

    fn set_wake_requirement(&self, wake: bool) {
        if wake == self.wake_required.get() {
            return;
        }
        if wake {
            self.power.add_em1_requirement();
        } else {
            self.power.remove_em1_requirement();
        }
        self.wake_required.set(wake);
        if CONFIG.debug_sleep {
            debug!("efr32: EM1 requirement {}", if wake { "added" } else { "removed" });
        }
    }

    fn platform_event_pending(&self) -> bool {
        self.alarms.any_fired() || self.io_pending.get()
    }

    fn instance_should_interrupt_sleep(&self, iid: u8) -> bool {
        let Some(tasklets) = self.client.map(|client| client.tasklets_pending(iid)) else {
            return true;
        };
        tasklets
            || (self.alarms.is_running(iid)
                && self.alarms.pending_time(iid) < self.platform.min_sleep_duration_ms as u64)
    }

    fn should_interrupt_sleep(&self) -> bool {
        (0..self.config.instance_count)
            .map(|index| self.config.iid_from_index(index))
            .any(|iid| self.instance_should_interrupt_sleep(iid))
    }
}
