//! Long-press timers
//!
//! Timers are compared against the tick timestamp; nothing sleeps.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct HoldTimers {
    pressed_at: BTreeMap<u8, u64>,
    fired: BTreeSet<u8>,
}

/// What a release means for a timed button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldRelease {
    /// Released before the threshold
    Tap,
    /// Reached the threshold only now
    LongPress,
    /// Long-press already fired while held
    AlreadyFired,
}

impl HoldTimers {
    pub fn start(&mut self, button: u8, now_ms: u64) {
        self.pressed_at.insert(button, now_ms);
        self.fired.remove(&button);
    }

    pub fn is_timing(&self, button: u8) -> bool {
        self.pressed_at.contains_key(&button)
    }

    /// Buttons whose long-press is due this tick; each is reported once
    pub fn due(&mut self, threshold_ms: u64, now_ms: u64) -> Vec<u8> {
        let due: Vec<u8> = self
            .pressed_at
            .iter()
            .filter(|(button, start)| {
                !self.fired.contains(button) && now_ms.saturating_sub(**start) >= threshold_ms
            })
            .map(|(button, _)| *button)
            .collect();
        self.fired.extend(due.iter().copied());
        due
    }

    /// Stop timing a button and classify the press
    pub fn finish(&mut self, button: u8, threshold_ms: u64, now_ms: u64) -> Option<HoldRelease> {
        let start = self.pressed_at.remove(&button)?;
        if self.fired.remove(&button) {
            return Some(HoldRelease::AlreadyFired);
        }
        if now_ms.saturating_sub(start) >= threshold_ms {
            Some(HoldRelease::LongPress)
        } else {
            Some(HoldRelease::Tap)
        }
    }

    /// Drop a timer without classifying it
    pub fn cancel(&mut self, button: u8) {
        self.pressed_at.remove(&button);
        self.fired.remove(&button);
    }
}
