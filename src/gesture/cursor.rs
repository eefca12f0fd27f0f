//! Analog cursor and scroll integration

use crate::profile::AxisSettings;
use serde::{Deserialize, Serialize};

/// Virtual desktop spanning all screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Clamp a point to the last pixel inside the rectangle
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        let max_x = self.x as f64 + self.width.saturating_sub(1) as f64;
        let max_y = self.y as f64 + self.height.saturating_sub(1) as f64;
        (x.clamp(self.x as f64, max_x), y.clamp(self.y as f64, max_y))
    }
}

/// Velocity in pixels per second for one normalized axis value
///
/// The normalizer already rescaled the value past the deadzone, so the curve
/// starts at zero at the deadzone edge.
pub fn axis_speed(value: f32, max_speed: f32, exponent: f32) -> f32 {
    if value == 0.0 || !value.is_finite() {
        return 0.0;
    }
    value.signum() * max_speed * value.abs().min(1.0).powf(exponent)
}

/// Output of one cursor step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CursorStep {
    /// New absolute pointer position, when it moved
    pub moved_to: Option<(i32, i32)>,
    /// Whole scroll pixels to emit this tick
    pub scroll: (i32, i32),
}

/// Analog deflection for one tick, already normalized
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnalogInput {
    pub cursor: (f32, f32),
    pub scroll: (f32, f32),
}

#[derive(Debug, Clone, Default)]
pub struct CursorState {
    position: Option<(f64, f64)>,
    velocity: (f32, f32),
    scroll_remainder: (f64, f64),
}

impl CursorState {
    pub fn position(&self) -> Option<(f64, f64)> {
        self.position
    }

    pub fn is_moving(&self) -> bool {
        self.velocity != (0.0, 0.0)
    }

    /// Integrate one tick
    ///
    /// `origin` is where the pointer actually is when a movement starts; the
    /// host may have moved it since the last stroke.
    pub fn step(
        &mut self,
        input: AnalogInput,
        settings: &AxisSettings,
        dt_ms: u64,
        bounds: Rect,
        origin: Option<(i32, i32)>,
    ) -> CursorStep {
        let dt = dt_ms as f64 / 1000.0;
        let mut step = CursorStep::default();

        let velocity = (
            axis_speed(input.cursor.0, settings.cursor_speed, settings.cursor_acceleration),
            axis_speed(input.cursor.1, settings.cursor_speed, settings.cursor_acceleration),
        );
        if velocity != (0.0, 0.0) {
            if !self.is_moving() || self.position.is_none() {
                self.position = Some(
                    origin
                        .map(|(x, y)| (x as f64, y as f64))
                        .or(self.position)
                        .unwrap_or_else(|| bounds.center()),
                );
            }
            if let Some((x, y)) = self.position {
                let (x, y) = bounds.clamp(x + velocity.0 as f64 * dt, y + velocity.1 as f64 * dt);
                self.position = Some((x, y));
                step.moved_to = Some((x.round() as i32, y.round() as i32));
            }
        }
        self.velocity = velocity;

        let scroll_x = axis_speed(input.scroll.0, settings.scroll_speed, settings.cursor_acceleration);
        let scroll_y = axis_speed(input.scroll.1, settings.scroll_speed, settings.cursor_acceleration);
        if scroll_x == 0.0 && scroll_y == 0.0 {
            self.scroll_remainder = (0.0, 0.0);
        } else {
            let sx = self.scroll_remainder.0 + scroll_x as f64 * dt;
            let sy = self.scroll_remainder.1 + scroll_y as f64 * dt;
            step.scroll = (sx.trunc() as i32, sy.trunc() as i32);
            self.scroll_remainder = (sx.fract(), sy.fract());
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP: Rect = Rect::new(0, 0, 1920, 1080);

    #[test]
    fn test_speed_curve() {
        assert_eq!(axis_speed(0.0, 1200.0, 2.0), 0.0);
        assert_eq!(axis_speed(1.0, 1200.0, 2.0), 1200.0);
        assert_eq!(axis_speed(-0.5, 1200.0, 2.0), -300.0);
        assert_eq!(axis_speed(f32::NAN, 1200.0, 2.0), 0.0);
    }

    #[test]
    fn test_cursor_moves_and_clamps() {
        let settings = AxisSettings::default();
        let mut cursor = CursorState::default();
        let input = AnalogInput {
            cursor: (1.0, 0.0),
            ..Default::default()
        };
        let step = cursor.step(input, &settings, 100, DESKTOP, Some((100, 100)));
        assert_eq!(step.moved_to, Some((220, 100)));

        for _ in 0..100 {
            cursor.step(input, &settings, 100, DESKTOP, None);
        }
        assert_eq!(cursor.position(), Some((1919.0, 100.0)));
    }

    #[test]
    fn test_multi_screen_bounds() {
        let desktop = Rect::new(-1920, 0, 3840, 1080);
        let settings = AxisSettings::default();
        let mut cursor = CursorState::default();
        let input = AnalogInput {
            cursor: (-1.0, -1.0),
            ..Default::default()
        };
        for _ in 0..100 {
            cursor.step(input, &settings, 100, desktop, Some((0, 0)));
        }
        assert_eq!(cursor.position(), Some((-1920.0, 0.0)));
    }

    #[test]
    fn test_idle_stick_does_not_move() {
        let settings = AxisSettings::default();
        let mut cursor = CursorState::default();
        let step = cursor.step(AnalogInput::default(), &settings, 16, DESKTOP, Some((5, 5)));
        assert_eq!(step, CursorStep::default());
        assert!(!cursor.is_moving());
    }

    #[test]
    fn test_scroll_accumulates_fractions() {
        let settings = AxisSettings {
            scroll_speed: 100.0,
            cursor_acceleration: 1.0,
            ..Default::default()
        };
        let mut cursor = CursorState::default();
        let input = AnalogInput {
            scroll: (0.0, 0.25),
            ..Default::default()
        };
        // 25 px/s in 125 ms ticks is 3.125 px per tick
        let steps: Vec<i32> = (0..8)
            .map(|_| cursor.step(input, &settings, 125, DESKTOP, None).scroll.1)
            .collect();
        assert_eq!(steps[0], 3);
        assert_eq!(steps.iter().sum::<i32>(), 25);
    }
}
