//! gilrs buttons and axes in standard layout order
//!
//! gilrs reports buttons by physical position. The standard layout numbers
//! them the same way for every controller:
//!
//! ```text
//!  0 South   1 East    2 West    3 North
//!  4 LB      5 RB      6 LT      7 RT
//!  8 Select  9 Start  10 L3     11 R3
//! 12 Up     13 Down   14 Left   15 Right
//! 16 Home   17 Capture
//! ```
//!
//! Stick axes are 0..=3 (left x/y, right x/y) with y growing downward; the
//! d-pad axes some backends report instead of buttons become hat 0.

use gilrs::{Axis, Button};
use tracing::trace;

/// Buttons in a frame produced by the gilrs backend
pub const STANDARD_BUTTON_COUNT: usize = 18;
/// Stick axes in a frame produced by the gilrs backend
pub const STANDARD_AXIS_COUNT: usize = 4;

/// Every gilrs button with a standard index, in index order
pub const STANDARD_BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

/// Standard index of a gilrs button
pub fn button_index(button: Button) -> Option<u8> {
    if button == Button::Z {
        return Some(17);
    }
    let index = STANDARD_BUTTONS.iter().position(|b| *b == button);
    if index.is_none() {
        trace!("No standard index for {:?}", button);
    }
    index.map(|i| i as u8)
}

/// Where a gilrs axis lands in a raw frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisSlot {
    Stick(u8),
    HatX,
    HatY,
}

/// Map a gilrs axis reading to its slot and frame value
///
/// gilrs reports y up-positive; frames use y down-positive.
pub fn axis_slot(axis: Axis, value: f32) -> Option<(AxisSlot, f32)> {
    let slot = match axis {
        Axis::LeftStickX => (AxisSlot::Stick(0), value),
        Axis::LeftStickY => (AxisSlot::Stick(1), -value),
        Axis::RightStickX => (AxisSlot::Stick(2), value),
        Axis::RightStickY => (AxisSlot::Stick(3), -value),
        Axis::DPadX => (AxisSlot::HatX, value),
        Axis::DPadY => (AxisSlot::HatY, -value),
        _ => {
            trace!("Ignoring axis {:?}", axis);
            return None;
        }
    };
    Some((slot.0, slot.1.clamp(-1.0, 1.0)))
}
