//! Raw frame → canonical snapshot
//!
//! Applies the axis deadzone, per-axis inversion and 8-way hat
//! quantization. Devices reporting fewer inputs than their model declares
//! read as neutral for the missing indices.

use super::{Direction, InputSnapshot, RawFrame};
use crate::device::DeviceModel;
use crate::profile::AxisSettings;
use tracing::warn;

/// Hat vectors shorter than this read as centered
const HAT_THRESHOLD: f32 = 0.5;

/// Apply a deadzone to one axis value
///
/// Values with magnitude at or below `deadzone` become exactly `0.0`; the
/// remaining range is rescaled so output still spans [-1, 1].
///
/// # Examples
/// ```
/// use padmap::input::normalize::apply_deadzone;
/// assert_eq!(apply_deadzone(0.05, 0.1), 0.0);
/// assert_eq!(apply_deadzone(1.0, 0.1), 1.0);
/// assert!((apply_deadzone(-0.55, 0.1) + 0.5).abs() < 1e-6);
/// ```
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let deadzone = deadzone.clamp(0.0, 0.99);
    let magnitude = value.abs().min(1.0);
    if magnitude <= deadzone {
        return 0.0;
    }
    value.signum() * (magnitude - deadzone) / (1.0 - deadzone)
}

/// Per-session normalizer; remembers whether under-provisioning was logged
#[derive(Debug, Default)]
pub struct Normalizer {
    warned_missing: bool,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the logged warning (new session)
    pub fn reset(&mut self) {
        self.warned_missing = false;
    }

    pub fn normalize(
        &mut self,
        raw: &RawFrame,
        model: &DeviceModel,
        settings: &AxisSettings,
    ) -> InputSnapshot {
        self.check_provisioning(raw, model);

        let button_count = model.button_count().max(raw.buttons.len());
        let buttons = (0..button_count)
            .map(|i| raw.buttons.get(i).copied().unwrap_or(false))
            .collect();

        let axis_count = model.axes.max(raw.axes.len());
        let axes = (0..axis_count)
            .map(|i| {
                let value = apply_deadzone(raw.axes.get(i).copied().unwrap_or(0.0), settings.deadzone);
                if value != 0.0 && u8::try_from(i).is_ok_and(|axis| settings.is_inverted(axis)) {
                    -value
                } else {
                    value
                }
            })
            .collect();

        let hat_count = model.hats.max(raw.hats.len());
        let hats = (0..hat_count)
            .map(|i| {
                raw.hats
                    .get(i)
                    .and_then(|h| Direction::from_vector(h.x, h.y, HAT_THRESHOLD))
            })
            .collect();

        InputSnapshot {
            buttons,
            axes,
            hats,
        }
    }

    fn check_provisioning(&mut self, raw: &RawFrame, model: &DeviceModel) {
        if self.warned_missing {
            return;
        }
        if raw.buttons.len() < model.button_count()
            || raw.axes.len() < model.axes
            || raw.hats.len() < model.hats
        {
            warn!(
                "⚠️  {} reports {} buttons / {} axes / {} hats, expected {} / {} / {}; missing inputs read as neutral",
                model.name,
                raw.buttons.len(),
                raw.axes.len(),
                raw.hats.len(),
                model.button_count(),
                model.axes,
                model.hats
            );
            self.warned_missing = true;
        }
    }

    /// Whether the under-provisioning warning fired this session
    pub fn warned_missing(&self) -> bool {
        self.warned_missing
    }
}
