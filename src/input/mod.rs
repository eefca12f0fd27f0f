//! Raw controller frames and the canonical per-tick snapshot
//!
//! Axis convention everywhere: x grows to the right, y grows downward
//! (pushing a stick up reads negative), values in [-1, 1].

pub mod gamepad;
pub mod normalize;

pub use normalize::Normalizer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hat switch reading; each component in [-1, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawHat {
    pub x: f32,
    pub y: f32,
}

/// One polling tick of raw hardware state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
    pub hats: Vec<RawHat>,
}

impl RawFrame {
    pub fn with_sizes(buttons: usize, axes: usize, hats: usize) -> Self {
        Self {
            buttons: vec![false; buttons],
            axes: vec![0.0; axes],
            hats: vec![RawHat::default(); hats],
        }
    }
}

/// Eight-way direction used by hats and button-mode sticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl Direction {
    /// Counter-clockwise from `Right`, one entry per 45° sector
    const SECTORS: [Direction; 8] = [
        Direction::Right,
        Direction::UpRight,
        Direction::Up,
        Direction::UpLeft,
        Direction::Left,
        Direction::DownLeft,
        Direction::Down,
        Direction::DownRight,
    ];

    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::UpRight,
        Direction::Right,
        Direction::DownRight,
        Direction::Down,
        Direction::DownLeft,
        Direction::Left,
        Direction::UpLeft,
    ];

    /// Center angle in degrees, counter-clockwise from the positive x axis
    pub fn angle(self) -> f32 {
        let index = Self::SECTORS.iter().position(|d| *d == self).unwrap_or(0);
        index as f32 * 45.0
    }

    /// Nearest of the 8 (or 4 when `zones == 4`) directions for an angle
    pub fn from_angle(angle: f32, zones: u8) -> Direction {
        let angle = angle.rem_euclid(360.0);
        if zones == 4 {
            let index = ((angle / 90.0).round() as usize) % 4;
            Self::SECTORS[index * 2]
        } else {
            let index = ((angle / 45.0).round() as usize) % 8;
            Self::SECTORS[index]
        }
    }

    /// Quantize a vector, or `None` when its magnitude is below `threshold`
    pub fn from_vector(x: f32, y: f32, threshold: f32) -> Option<Direction> {
        if x.is_nan() || y.is_nan() || x.hypot(y) < threshold {
            return None;
        }
        Some(Self::from_angle(vector_angle(x, y), 8))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::UpRight => "up-right",
            Direction::Right => "right",
            Direction::DownRight => "down-right",
            Direction::Down => "down",
            Direction::DownLeft => "down-left",
            Direction::Left => "left",
            Direction::UpLeft => "up-left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown direction '{}'", s))
    }
}

/// Angle of a stick vector in degrees (0 = right, 90 = up)
pub fn vector_angle(x: f32, y: f32) -> f32 {
    (-y).atan2(x).to_degrees().rem_euclid(360.0)
}

/// Canonical state of the active controller for one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
    pub hats: Vec<Option<Direction>>,
}

impl InputSnapshot {
    pub fn is_pressed(&self, button: u8) -> bool {
        self.buttons.get(button as usize).copied().unwrap_or(false)
    }

    pub fn axis(&self, axis: u8) -> f32 {
        self.axes.get(axis as usize).copied().unwrap_or(0.0)
    }

    pub fn hat(&self, hat: u8) -> Option<Direction> {
        self.hats.get(hat as usize).copied().flatten()
    }

    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX)
            .zip(self.buttons.iter())
            .filter(|(_, p)| **p)
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_quantization() {
        assert_eq!(Direction::from_vector(0.0, -1.0, 0.5), Some(Direction::Up));
        assert_eq!(Direction::from_vector(1.0, 0.0, 0.5), Some(Direction::Right));
        assert_eq!(Direction::from_vector(-0.7, 0.7, 0.5), Some(Direction::DownLeft));
        assert_eq!(Direction::from_vector(0.7, -0.7, 0.5), Some(Direction::UpRight));
        assert_eq!(Direction::from_vector(0.1, 0.1, 0.5), None);
    }

    #[test]
    fn test_four_zone_quantization() {
        assert_eq!(Direction::from_angle(40.0, 4), Direction::Right);
        assert_eq!(Direction::from_angle(50.0, 4), Direction::Up);
        assert_eq!(Direction::from_angle(359.0, 4), Direction::Right);
        assert_eq!(Direction::from_angle(-90.0, 4), Direction::Down);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("UP-LEFT".parse::<Direction>(), Ok(Direction::UpLeft));
        assert!("north".parse::<Direction>().is_err());
    }

    #[test]
    fn test_snapshot_missing_indices_are_neutral() {
        let snapshot = InputSnapshot::default();
        assert!(!snapshot.is_pressed(5));
        assert_eq!(snapshot.axis(3), 0.0);
        assert_eq!(snapshot.hat(0), None);
    }

    #[test]
    fn test_pressed_stops_at_addressable_buttons() {
        let mut snapshot = InputSnapshot {
            buttons: vec![false; 300],
            ..InputSnapshot::default()
        };
        snapshot.buttons[2] = true;
        snapshot.buttons[258] = true;
        assert_eq!(snapshot.pressed().collect::<Vec<_>>(), vec![2]);
    }
}
