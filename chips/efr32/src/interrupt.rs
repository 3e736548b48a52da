// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Interrupt masking for state shared with interrupt handlers.

/// Provided by the board, usually by forwarding to `Chip::atomic`.
pub trait InterruptControl {
    /// Runs `f` once with interrupts disabled.
    fn atomic(&self, f: &mut dyn FnMut());
}

/// Runs `f` with interrupts disabled and returns its result.
pub fn atomic<R>(control: &dyn InterruptControl, f: impl FnOnce() -> R) -> R {
    let mut f = Some(f);
    let mut result = None;
    control.atomic(&mut || {
        if let Some(f) = f.take() {
            result = Some(f());
        }
    });
    match result {
        Some(result) => result,
        None => panic!("efr32: critical section was not run"),
    }
}
