//! Device models and identification
//!
//! A [`DeviceModel`] describes what a physical controller offers (buttons,
//! axes, hats) independent of the vendor IDs it reports. Models are built
//! once from static tables and shared read-only through `Arc`.

pub mod models;
pub mod registry;

pub use models::{builtin_models, find_model};
pub use registry::{AttachOutcome, DetachOutcome, DeviceRegistry, Fingerprint, Session, SessionId};

use serde::{Deserialize, Serialize};
use std::fmt;

/// USB vendor/product pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Signature {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Two axes forming one analog stick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickPair {
    pub name: String,
    pub x_axis: u8,
    /// `None` for single-axis sticks (odd axis count on generic devices)
    pub y_axis: Option<u8>,
}

/// Button indices of a d-pad exposed as buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpadButtons {
    pub up: u8,
    pub down: u8,
    pub left: u8,
    pub right: u8,
}

/// Normalized capabilities of one controller family
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceModel {
    pub name: String,
    pub signatures: Vec<Signature>,
    /// Lowercase substrings matched against the reported device name
    pub name_patterns: Vec<String>,
    /// Ordered button slot names; the index is the button id
    pub buttons: Vec<String>,
    pub axes: usize,
    pub hats: usize,
    pub sticks: Vec<StickPair>,
    pub dpad: Option<DpadButtons>,
    /// Stick-press button used to confirm in the quick-select menu
    pub stick_button: Option<u8>,
    /// True for the "Standard Gamepad" fallback models
    pub generic: bool,
}

/// Button names of the standard gamepad layout, indices 0..=16
pub(crate) const STANDARD_BUTTON_NAMES: [&str; 17] = [
    "South",
    "East",
    "West",
    "North",
    "Left Shoulder",
    "Right Shoulder",
    "Left Trigger",
    "Right Trigger",
    "Select",
    "Start",
    "Left Stick",
    "Right Stick",
    "D-Pad Up",
    "D-Pad Down",
    "D-Pad Left",
    "D-Pad Right",
    "Home",
];

impl DeviceModel {
    /// Fallback model for unrecognized hardware
    pub fn generic(buttons: usize, axes: usize, hats: usize) -> Self {
        let button_names = (0..buttons)
            .map(|i| {
                STANDARD_BUTTON_NAMES
                    .get(i)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("Button {}", i))
            })
            .collect();

        Self {
            name: generic_model_name(buttons, axes),
            signatures: Vec::new(),
            name_patterns: Vec::new(),
            buttons: button_names,
            axes,
            hats,
            sticks: stick_pairs(axes),
            dpad: (buttons >= 16).then_some(DpadButtons {
                up: 12,
                down: 13,
                left: 14,
                right: 15,
            }),
            stick_button: (buttons > 10).then_some(10),
            generic: true,
        }
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    pub fn button_name(&self, index: u8) -> String {
        self.buttons
            .get(index as usize)
            .cloned()
            .unwrap_or_else(|| format!("Button {}", index))
    }

    /// Matches a reported vendor/product pair
    pub fn matches_signature(&self, signature: Signature) -> bool {
        self.signatures.contains(&signature)
    }

    /// Case-insensitive substring match on the reported device name
    pub fn matches_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.name_patterns.iter().any(|p| lower.contains(p.as_str()))
    }
}

/// Display name of the generic model for a given layout
pub fn generic_model_name(buttons: usize, axes: usize) -> String {
    format!("Standard Gamepad ({} Buttons {} Axes)", buttons, axes)
}

/// Pair consecutive axes into sticks: (0,1), (2,3), ...
pub(crate) fn stick_pairs(axes: usize) -> Vec<StickPair> {
    const NAMES: [&str; 2] = ["Left Stick", "Right Stick"];
    (0..axes)
        .step_by(2)
        .enumerate()
        .map(|(i, x)| StickPair {
            name: NAMES
                .get(i)
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("Stick {}", i + 1)),
            x_axis: x as u8,
            y_axis: (x + 1 < axes).then_some((x + 1) as u8),
        })
        .collect()
}

/// Logical handle assigned by the input backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(pub usize);

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identification data reported by the backend for one logical handle
#[derive(Debug, Clone, PartialEq)]
pub struct RawDeviceId {
    pub handle: DeviceHandle,
    pub name: String,
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub buttons: usize,
    pub axes: usize,
    pub hats: usize,
    /// Enumeration order of the physical device; handles that share it
    /// belong to the same physical controller
    pub enumeration: u32,
}

impl RawDeviceId {
    pub fn signature(&self) -> Option<Signature> {
        match (self.vendor_id, self.product_id) {
            (Some(v), Some(p)) => Some(Signature::new(v, p)),
            _ => None,
        }
    }

    /// Stable key: `vvvv:pppp` when IDs are known, else the lowercase name
    pub fn signature_key(&self) -> String {
        self.signature()
            .map(|s| s.to_string())
            .unwrap_or_else(|| self.name.trim().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_model_layout() {
        let model = DeviceModel::generic(16, 4, 0);
        assert_eq!(model.name, "Standard Gamepad (16 Buttons 4 Axes)");
        assert_eq!(model.button_count(), 16);
        assert_eq!(model.sticks.len(), 2);
        assert_eq!(model.sticks[1].x_axis, 2);
        assert_eq!(model.sticks[1].y_axis, Some(3));
        assert!(model.dpad.is_some());
        assert!(model.generic);
    }

    #[test]
    fn test_generic_odd_axes() {
        let model = DeviceModel::generic(6, 3, 0);
        assert_eq!(model.sticks.len(), 2);
        assert_eq!(model.sticks[1].y_axis, None);
        assert!(model.dpad.is_none());
        assert_eq!(model.button_name(40), "Button 40");
    }

    #[test]
    fn test_signature_key_prefers_ids() {
        let raw = RawDeviceId {
            handle: DeviceHandle(0),
            name: "Some Pad".into(),
            vendor_id: Some(0x054c),
            product_id: Some(0x0ce6),
            buttons: 18,
            axes: 4,
            hats: 0,
            enumeration: 0,
        };
        assert_eq!(raw.signature_key(), "054c:0ce6");

        let anonymous = RawDeviceId {
            vendor_id: None,
            ..raw
        };
        assert_eq!(anonymous.signature_key(), "some pad");
    }
}
