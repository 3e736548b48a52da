// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Millisecond and microsecond alarms for the Thread stack.
//!
//! Every stack instance owns one millisecond and one microsecond
//! [`AlarmHandle`], each driving its own hardware timer. A hardware timer
//! has a bounded range; a longer alarm is armed for the remainder first and
//! then re-armed for the full range until the requested time is reached:
//!
//! ```text
//!   t0                                                  t0 + dt
//!   |-- dt % max --|------ max ------|------ max ------|
//!                  ^ overflow 1      ^ overflow 2      ^ fired
//! ```
//!
//! Expiry is recorded in interrupt context by incrementing the handle's
//! fired count. [`AlarmService::process`] takes the count atomically and
//! delivers one stack callback per unit from the main loop.
//!
//! The service also keeps the 64-bit platform clock, extending the 32-bit
//! microsecond counter each time it is read. It must be read at least once
//! per counter wrap (about 71 minutes) to stay correct.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use kernel::debug;
use kernel::utilities::cells::OptionalCell;

use crate::config::{PlatformConfig, RadioConfig, CONFIG};
use crate::interrupt::{atomic, InterruptControl};
use crate::platform::PlatformClient;
use crate::timer::{AlarmTimer, MicroTimer, SleepTimer, TimerClient};

/// Source of radio timestamps for the radio driver.
pub trait Clock {
    /// Current microsecond counter.
    fn micro_now(&self) -> u32;

    /// Current time on the 64-bit platform clock, in us.
    fn time_get(&self) -> u64;

    /// Worst-case crystal accuracy, in ppm.
    fn xtal_accuracy_ppm(&self) -> u8;
}

/// Ticks from `now` until `t0 + dt`, negative once that time has passed. A
/// `t0` less than half the counter range ahead of `now` is in the future.
fn remaining_time(now: u32, t0: u32, dt: u32) -> i64 {
    let elapsed = now.wrapping_sub(t0) as i32;
    dt as i64 - elapsed as i64
}

pub struct AlarmHandle<'a> {
    timer: AlarmTimer<'a>,
    interrupts: &'a dyn InterruptControl,
    running: Cell<bool>,
    overflow_counter: Cell<u32>,
    overflow_max: Cell<u32>,
    fired_count: AtomicU32,
    client: OptionalCell<&'a dyn PlatformClient>,
}

impl<'a> AlarmHandle<'a> {
    pub fn new(timer: AlarmTimer<'a>, interrupts: &'a dyn InterruptControl) -> AlarmHandle<'a> {
        AlarmHandle {
            timer,
            interrupts,
            running: Cell::new(false),
            overflow_counter: Cell::new(0),
            overflow_max: Cell::new(0),
            fired_count: AtomicU32::new(0),
            client: OptionalCell::empty(),
        }
    }

    fn reset(&self) {
        atomic(self.interrupts, || {
            self.running.set(false);
            self.overflow_counter.set(0);
            self.overflow_max.set(0);
            self.fired_count.store(0, Ordering::Release);
        });
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn fired_count(&self) -> u32 {
        self.fired_count.load(Ordering::Acquire)
    }

    fn overflow_in_progress(&self) -> bool {
        self.overflow_counter.get() < self.overflow_max.get()
    }

    /// Splits `remaining` into a first arming and a number of full range
    /// re-armings. Returns the first timeout.
    fn set_wrapped_duration(&self, remaining: u64) -> u32 {
        let max = self.timer.max().max(1) as u64;
        self.overflow_counter.set(0);
        if remaining <= max {
            self.overflow_max.set(0);
            return remaining as u32;
        }

        let initial = remaining % max;
        let overflows = u32::try_from(remaining / max).unwrap_or(u32::MAX);
        if initial == 0 {
            self.overflow_max.set(overflows - 1);
            max as u32
        } else {
            self.overflow_max.set(overflows);
            initial as u32
        }
    }

    /// Arms the alarm for `t0 + dt`. An alarm whose time has already come
    /// fires right away without touching the hardware timer.
    pub fn start_at(&self, t0: u32, dt: u32) {
        let armed = atomic(self.interrupts, || {
            self.stop_timer();

            let remaining = remaining_time(self.timer.now(), t0, dt);
            if remaining <= 0 {
                self.fire();
                return None;
            }

            let timeout = self.set_wrapped_duration(remaining as u64);
            // A short timeout may expire before `start` returns.
            self.running.set(true);
            let result = self.timer.start(timeout);
            if result.is_err() {
                self.running.set(false);
            }
            Some((timeout, result))
        });

        if CONFIG.debug_alarm {
            match armed {
                Some((timeout, Ok(()))) => debug!(
                    "efr32: alarm in {} ({} overflows)",
                    timeout,
                    self.overflow_max.get()
                ),
                Some((_, Err(e))) => debug!("efr32: alarm start failed: {:?}", e),
                None => {}
            }
        }
    }

    pub fn stop(&self) {
        atomic(self.interrupts, || self.stop_timer());
    }

    fn stop_timer(&self) {
        if !self.running.get() {
            return;
        }
        self.timer.stop();
        self.running.set(false);
    }

    fn fire(&self) {
        self.fired_count.fetch_add(1, Ordering::AcqRel);
        self.stop_timer();
        self.client.map(|client| client.signal_pending());
    }

    /// Takes the fired count and calls `callback` once per firing.
    fn drain<F: Fn()>(&self, callback: F) {
        let count = self.fired_count.swap(0, Ordering::AcqRel);
        for _ in 0..count {
            callback();
        }
    }
}

impl TimerClient for AlarmHandle<'_> {
    fn fired(&self) {
        if self.overflow_in_progress() {
            self.overflow_counter.set(self.overflow_counter.get() + 1);
            if self.timer.start(self.timer.max()).is_err() {
                self.fire();
            }
        } else {
            self.fire();
        }
    }
}

/// 32-bit counter extended to 64 bits. Must be read with interrupts
/// disabled, at least once per counter wrap.
struct WideClock {
    wraps: Cell<u32>,
    prev: Cell<u32>,
}

impl WideClock {
    const fn new() -> WideClock {
        WideClock {
            wraps: Cell::new(0),
            prev: Cell::new(0),
        }
    }

    fn extend(&self, now: u32) -> u64 {
        if now < self.prev.get() {
            self.wraps.set(self.wraps.get().wrapping_add(1));
        }
        self.prev.set(now);
        ((self.wraps.get() as u64) << 32) | now as u64
    }
}

pub struct AlarmService<'a, const N: usize> {
    config: &'a RadioConfig,
    platform: &'a PlatformConfig,
    interrupts: &'a dyn InterruptControl,
    milli: [AlarmHandle<'a>; N],
    micro: [AlarmHandle<'a>; N],
    /// Deadline of each instance's millisecond alarm on `milli_clock`.
    pending_ms: [Cell<u64>; N],
    clock: WideClock,
    milli_clock: WideClock,
    diag_mode: Cell<bool>,
    client: OptionalCell<&'a dyn PlatformClient>,
}

impl<'a, const N: usize> AlarmService<'a, N> {
    pub fn new(
        config: &'a RadioConfig,
        platform: &'a PlatformConfig,
        interrupts: &'a dyn InterruptControl,
        milli_timers: [&'a dyn SleepTimer<'a>; N],
        micro_timers: [&'a dyn MicroTimer<'a>; N],
    ) -> AlarmService<'a, N> {
        AlarmService {
            config,
            platform,
            interrupts,
            milli: milli_timers
                .map(|timer| AlarmHandle::new(AlarmTimer::Milli(timer), interrupts)),
            micro: micro_timers
                .map(|timer| AlarmHandle::new(AlarmTimer::Micro(timer), interrupts)),
            pending_ms: core::array::from_fn(|_| Cell::new(0)),
            clock: WideClock::new(),
            milli_clock: WideClock::new(),
            diag_mode: Cell::new(false),
            client: OptionalCell::empty(),
        }
    }

    /// Connects every handle to its timer and resets it to idle.
    pub fn init(&'a self) {
        for handle in self.milli.iter().chain(self.micro.iter()) {
            handle.reset();
            handle.timer.set_client(handle);
        }
        for pending in self.pending_ms.iter() {
            pending.set(0);
        }
    }

    pub fn set_client(&self, client: &'a dyn PlatformClient) {
        self.client.set(client);
        for handle in self.milli.iter().chain(self.micro.iter()) {
            handle.client.set(client);
        }
    }

    fn index(&self, iid: u8) -> usize {
        self.config.pan_index(iid)
    }

    pub fn milli_handle(&self, iid: u8) -> &AlarmHandle<'a> {
        &self.milli[self.index(iid)]
    }

    pub fn micro_handle(&self, iid: u8) -> &AlarmHandle<'a> {
        &self.micro[self.index(iid)]
    }

    pub fn milli_now(&self) -> u32 {
        self.milli[0].timer.now()
    }

    pub fn micro_now(&self) -> u32 {
        self.micro[0].timer.now()
    }

    /// Millisecond counter extended to 64 bits.
    fn milli_time(&self) -> u64 {
        atomic(self.interrupts, || self.milli_clock.extend(self.milli_now()))
    }

    pub fn milli_start_at(&self, iid: u8, t0: u32, dt: u32) {
        let index = self.index(iid);
        let now = self.milli_time();
        let remaining = remaining_time(now as u32, t0, dt).max(0) as u64;
        self.pending_ms[index].set(now + remaining);
        self.milli[index].start_at(t0, dt);
    }

    pub fn milli_stop(&self, iid: u8) {
        self.milli_handle(iid).stop();
    }

    pub fn micro_start_at(&self, iid: u8, t0: u32, dt: u32) {
        self.micro_handle(iid).start_at(t0, dt);
    }

    pub fn micro_stop(&self, iid: u8) {
        self.micro_handle(iid).stop();
    }

    /// Current time on the 64-bit platform clock, in us.
    pub fn time_get(&self) -> u64 {
        atomic(self.interrupts, || self.clock.extend(self.micro_now()))
    }

    pub fn xtal_accuracy_ppm(&self) -> u8 {
        self.platform.xtal_accuracy_ppm()
    }

    /// Millisecond alarm callbacks go to `diag_alarm_fired` while set.
    pub fn set_diag_mode(&self, enabled: bool) {
        self.diag_mode.set(enabled);
    }

    pub fn is_running(&self, iid: u8) -> bool {
        self.milli_handle(iid).is_running()
    }

    /// Time until the millisecond alarm of `iid` is due, or 0 if it is not
    /// running.
    pub fn pending_time(&self, iid: u8) -> u64 {
        if !self.is_running(iid) {
            return 0;
        }
        let deadline = self.pending_ms[self.index(iid)].get();
        deadline.saturating_sub(self.milli_time())
    }

    pub fn any_fired(&self) -> bool {
        self.milli
            .iter()
            .chain(self.micro.iter())
            .any(|handle| handle.fired_count() != 0)
    }

    /// Delivers fired alarms: millisecond handles first, then microsecond
    /// handles, each in instance order.
    pub fn process(&self) {
        if !self.any_fired() {
            return;
        }
        self.client.map(|client| {
            for (index, handle) in self.milli.iter().enumerate() {
                let iid = self.config.iid_from_index(index);
                handle.drain(|| {
                    if self.diag_mode.get() {
                        client.diag_alarm_fired(iid);
                    } else {
                        client.alarm_milli_fired(iid);
                    }
                });
            }
            for (index, handle) in self.micro.iter().enumerate() {
                let iid = self.config.iid_from_index(index);
                handle.drain(|| client.alarm_micro_fired(iid));
            }
        });
    }
}

impl<const N: usize> Clock for AlarmService<'_, N> {
    fn micro_now(&self) -> u32 {
        AlarmService::micro_now(self)
    }

    fn time_get(&self) -> u64 {
        AlarmService::time_get(self)
    }

    fn xtal_accuracy_ppm(&self) -> u8 {
        AlarmService::xtal_accuracy_ppm(self)
    }
}
