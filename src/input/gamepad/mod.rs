//! gilrs backend
//!
//! Maps gilrs buttons and axes to the standard layout and publishes
//! hot-plug events and frames from a background thread.

pub mod buttons;
pub mod diagnostics;
pub mod provider;

pub use diagnostics::print_gamepad_diagnostics;
pub use provider::{DeviceEvent, GilrsProvider};
