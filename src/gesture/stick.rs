//! Button-mode sticks: angle quantized into directional zones
//!
//! Once a direction is entered the stick has to leave a band wider than the
//! zone (by the hysteresis angle) before another direction takes over, and
//! has to drop below a lower magnitude before it releases.

use crate::input::{vector_angle, Direction};

/// Release magnitude as a fraction of the activation magnitude
const RELEASE_RATIO: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickZoneSettings {
    /// 4 or 8
    pub zones: u8,
    /// Magnitude needed to enter a direction
    pub activation: f32,
    /// Extra degrees a held direction keeps past its zone edge
    pub hysteresis_deg: f32,
}

impl Default for StickZoneSettings {
    fn default() -> Self {
        Self {
            zones: 8,
            activation: 0.5,
            hysteresis_deg: 10.0,
        }
    }
}

/// Direction change reported by [`StickTracker::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneChange {
    pub released: Option<Direction>,
    pub entered: Option<Direction>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StickTracker {
    current: Option<Direction>,
}

/// Smallest absolute difference between two angles in degrees
fn angular_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

impl StickTracker {
    pub fn current(&self) -> Option<Direction> {
        self.current
    }

    /// Feed one tick of stick position, returning a change if any
    pub fn update(&mut self, x: f32, y: f32, settings: &StickZoneSettings) -> Option<ZoneChange> {
        let magnitude = x.hypot(y);
        let next = if !magnitude.is_finite() {
            None
        } else {
            match self.current {
                Some(_) if magnitude < settings.activation * RELEASE_RATIO => None,
                None if magnitude < settings.activation => None,
                Some(held) => {
                    let angle = vector_angle(x, y);
                    let half_zone = 180.0 / settings.zones as f32;
                    if angular_distance(angle, held.angle()) <= half_zone + settings.hysteresis_deg {
                        Some(held)
                    } else {
                        Some(Direction::from_angle(angle, settings.zones))
                    }
                }
                None => Some(Direction::from_angle(vector_angle(x, y), settings.zones)),
            }
        };

        if next == self.current {
            return None;
        }
        let change = ZoneChange {
            released: self.current,
            entered: next,
        };
        self.current = next;
        Some(change)
    }
}
