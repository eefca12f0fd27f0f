//! Transient per-session gesture state
//!
//! Everything here belongs to the active controller session and is thrown
//! away on disconnect or profile switch.

pub mod cursor;
pub mod hold;
pub mod quick_select;
pub mod stick;

pub use cursor::{axis_speed, AnalogInput, CursorState, CursorStep, Rect};
pub use hold::{HoldRelease, HoldTimers};
pub use quick_select::{MenuPhase, QuickSelect};
pub use stick::{StickTracker, StickZoneSettings, ZoneChange};

use crate::action::Action;
use crate::input::InputSnapshot;
use crate::profile::InputRef;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct GestureState {
    /// Snapshot of the previous tick, for edge detection
    pub previous: InputSnapshot,
    /// Buttons whose tap is deferred until release or long-press
    pub holds: HoldTimers,
    /// Buttons swallowed by a chord or the menu until they are released
    pub consumed: BTreeSet<u8>,
    /// Button-mode stick trackers by stick index
    pub sticks: BTreeMap<u8, StickTracker>,
    /// Pressed inputs whose action still expects a release edge
    pub active: BTreeMap<InputRef, Action>,
    pub quick_select: QuickSelect,
    pub cursor: CursorState,
    /// Timestamp of the previous tick
    pub last_tick_ms: Option<u64>,
}

impl GestureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stick(&mut self, index: u8) -> &mut StickTracker {
        self.sticks.entry(index).or_default()
    }

    /// Milliseconds since the previous tick, zero on the first
    pub fn advance(&mut self, now_ms: u64) -> u64 {
        let dt = self
            .last_tick_ms
            .map(|last| now_ms.saturating_sub(last))
            .unwrap_or(0);
        self.last_tick_ms = Some(now_ms);
        dt
    }

    /// Forget everything, including the open menu and pending timers
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Forget in-flight gestures but keep the edge baseline
    ///
    /// Buttons and stick zones held across the call produce no new press.
    pub fn rebase(&mut self) {
        *self = Self {
            previous: std::mem::take(&mut self.previous),
            sticks: std::mem::take(&mut self.sticks),
            last_tick_ms: self.last_tick_ms,
            ..Self::default()
        };
    }

    /// Whether nothing is in flight
    pub fn is_idle(&self) -> bool {
        !self.quick_select.is_open()
            && self.active.is_empty()
            && self.consumed.is_empty()
            && !self.cursor.is_moving()
    }
}
