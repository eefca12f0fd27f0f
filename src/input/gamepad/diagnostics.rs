//! Gamepad diagnostics for troubleshooting detection issues

use super::buttons::{button_index, STANDARD_BUTTONS};
use super::provider::{handle_of, raw_device_id, FrameTracker};
use crate::device::DeviceRegistry;
use crate::profile::defaults::default_profile_name;
use gilrs::{Axis, Event, EventType, Gilrs};
use std::thread;
use std::time::Duration;
use tracing::info;

/// Print every detected gamepad and the model it resolves to
pub fn print_gamepad_diagnostics(detect_8bitdo: bool) {
    info!("=== Gamepad Diagnostics ===");
    info!("Platform: {}", std::env::consts::OS);

    let mut gilrs = match Gilrs::new() {
        Ok(g) => {
            info!("✅ gilrs initialized successfully");
            g
        }
        Err(e) => {
            info!("❌ Failed to initialize GilRs: {:?}", e);
            info!("This may indicate missing system libraries or permissions issues.");
            return;
        }
    };

    // Bluetooth controllers may take a moment to wake up
    info!("⏳ Waiting for gamepads to connect (3 seconds)...");
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(3) {
        while let Some(Event { event, .. }) = gilrs.next_event() {
            if event == EventType::Connected {
                info!("   📶 Gamepad connection detected...");
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    let gamepads: Vec<_> = gilrs.gamepads().filter(|(_, gp)| gp.is_connected()).collect();
    if gamepads.is_empty() {
        info!("⚠️  No gamepads detected");
        info!("   Check the cable or Bluetooth pairing and that the OS sees the device.");
        return;
    }

    let registry = DeviceRegistry::new(detect_8bitdo);
    let mut tracker = FrameTracker::default();
    info!("✅ Found {} gamepad(s):", gamepads.len());
    for (id, gamepad) in gamepads {
        let raw = raw_device_id(id, &gamepad, tracker.enumeration(handle_of(id)));
        let model = registry.identify(&raw);

        info!("");
        info!("📋 Gamepad {}", raw.handle);
        info!("   Name: \"{}\"", raw.name);
        info!("   Signature: {}", raw.signature_key());
        info!("   Enumeration: {}", raw.enumeration);
        info!("   Power: {:?}", gamepad.power_info());
        if model.generic {
            info!("   Model: {} (not in the device tables)", model.name);
        } else {
            info!("   Model: {}", model.name);
        }
        info!("   Default profile: \"{}\"", default_profile_name(&model));

        let pressed: Vec<String> = STANDARD_BUTTONS
            .iter()
            .filter(|b| gamepad.is_pressed(**b))
            .filter_map(|b| button_index(*b))
            .map(|i| format!("{} ({})", i, model.button_name(i)))
            .collect();
        if pressed.is_empty() {
            info!("   🎮 No buttons pressed");
        } else {
            info!("   🎮 Pressed: {}", pressed.join(", "));
        }

        for axis in [Axis::LeftStickX, Axis::LeftStickY, Axis::RightStickX, Axis::RightStickY] {
            let value = gamepad.value(axis);
            if value.abs() > 0.01 {
                info!("   🕹️  {:?}: {:.3}", axis, value);
            }
        }
    }
    info!("");
    info!("=== End Diagnostics ===");
}
