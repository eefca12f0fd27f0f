//! gilrs gamepad provider with hot-plug support
//!
//! gilrs is not `Send`, so it lives on a dedicated thread. The thread keeps
//! the latest raw frame per gamepad and publishes connects, disconnects and
//! changed frames into the runtime's single-consumer queue.

use super::buttons::{axis_slot, button_index, AxisSlot, STANDARD_AXIS_COUNT, STANDARD_BUTTON_COUNT};
use crate::device::{DeviceHandle, RawDeviceId};
use crate::input::{RawFrame, RawHat};
use anyhow::Result;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Hardware events for the runtime queue
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Connected(RawDeviceId),
    Disconnected(DeviceHandle),
    /// Latest full state of one gamepad
    Frame { handle: DeviceHandle, frame: RawFrame },
}

/// Per-gamepad raw state and physical-device enumeration
#[derive(Debug, Default)]
pub(crate) struct FrameTracker {
    pads: HashMap<DeviceHandle, (RawFrame, bool)>,
    /// First-connect order of each gilrs handle
    enumerations: HashMap<DeviceHandle, u32>,
    next_enumeration: u32,
}

impl FrameTracker {
    /// Enumeration order of a handle, stable across its reconnects
    ///
    /// gilrs UUIDs are SDL mapping GUIDs built from bus, vendor, product and
    /// version, so two units of one model share them. Each handle counts as
    /// its own physical device.
    pub(crate) fn enumeration(&mut self, handle: DeviceHandle) -> u32 {
        if let Some(existing) = self.enumerations.get(&handle) {
            return *existing;
        }
        let n = self.next_enumeration;
        self.next_enumeration += 1;
        self.enumerations.insert(handle, n);
        n
    }

    pub(crate) fn attach(&mut self, handle: DeviceHandle) {
        let frame = RawFrame::with_sizes(STANDARD_BUTTON_COUNT, STANDARD_AXIS_COUNT, 1);
        self.pads.insert(handle, (frame, true));
    }

    pub(crate) fn detach(&mut self, handle: DeviceHandle) -> bool {
        self.pads.remove(&handle).is_some()
    }

    pub(crate) fn button(&mut self, handle: DeviceHandle, button: Button, pressed: bool) {
        let (Some(index), Some((frame, dirty))) = (button_index(button), self.pads.get_mut(&handle)) else {
            return;
        };
        if let Some(slot) = frame.buttons.get_mut(index as usize) {
            if *slot != pressed {
                *slot = pressed;
                *dirty = true;
            }
        }
    }

    pub(crate) fn axis(&mut self, handle: DeviceHandle, axis: Axis, value: f32) {
        let (Some((slot, value)), Some((frame, dirty))) = (axis_slot(axis, value), self.pads.get_mut(&handle)) else {
            return;
        };
        let hat = frame.hats.first_mut();
        let target = match (slot, hat) {
            (AxisSlot::Stick(i), _) => frame.axes.get_mut(i as usize),
            (AxisSlot::HatX, Some(RawHat { x, .. })) => Some(x),
            (AxisSlot::HatY, Some(RawHat { y, .. })) => Some(y),
            _ => None,
        };
        if let Some(target) = target {
            if *target != value {
                *target = value;
                *dirty = true;
            }
        }
    }

    /// Frames that changed since the last drain
    pub(crate) fn drain_dirty(&mut self) -> Vec<(DeviceHandle, RawFrame)> {
        let mut out: Vec<_> = self
            .pads
            .iter_mut()
            .filter(|(_, (_, dirty))| *dirty)
            .map(|(handle, (frame, dirty))| {
                *dirty = false;
                (*handle, frame.clone())
            })
            .collect();
        out.sort_by_key(|(handle, _)| *handle);
        out
    }
}

pub(crate) fn handle_of(id: GamepadId) -> DeviceHandle {
    DeviceHandle(usize::from(id))
}

pub(crate) fn raw_device_id(id: GamepadId, gamepad: &Gamepad<'_>, enumeration: u32) -> RawDeviceId {
    RawDeviceId {
        handle: handle_of(id),
        name: gamepad.name().to_string(),
        vendor_id: gamepad.vendor_id(),
        product_id: gamepad.product_id(),
        buttons: STANDARD_BUTTON_COUNT,
        axes: STANDARD_AXIS_COUNT,
        hats: 1,
        enumeration,
    }
}

/// Background gilrs thread feeding the runtime queue
pub struct GilrsProvider {
    shutdown_tx: Option<std::sync::mpsc::Sender<()>>,
}

impl GilrsProvider {
    /// Start the provider thread
    ///
    /// Gamepads already plugged in are reported as connected right away.
    pub fn start(events: mpsc::UnboundedSender<DeviceEvent>) -> Result<Self> {
        let (shutdown_tx, shutdown_rx) = std::sync::mpsc::channel::<()>();
        std::thread::Builder::new()
            .name("gilrs".to_string())
            .spawn(move || Self::event_loop_blocking(events, shutdown_rx))?;
        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
        })
    }

    fn event_loop_blocking(
        events: mpsc::UnboundedSender<DeviceEvent>,
        shutdown_rx: std::sync::mpsc::Receiver<()>,
    ) {
        let mut gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("GilRs initialized");
                g
            }
            Err(e) => {
                warn!("Failed to initialize GilRs: {:?}", e);
                return;
            }
        };

        let mut tracker = FrameTracker::default();
        let mut outbox = Vec::new();

        let connected: Vec<GamepadId> = gilrs
            .gamepads()
            .filter(|(_, gp)| gp.is_connected())
            .map(|(id, _)| id)
            .collect();
        if connected.is_empty() {
            info!("⏳ No gamepads yet, waiting for hot-plug");
        }
        for id in connected {
            Self::connect(&gilrs, id, &mut tracker, &mut outbox);
        }

        loop {
            match shutdown_rx.try_recv() {
                Ok(()) | Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    info!("Gamepad provider shutting down");
                    break;
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => {}
            }

            while let Some(Event { id, event, .. }) = gilrs.next_event() {
                let handle = handle_of(id);
                match event {
                    EventType::Connected => Self::connect(&gilrs, id, &mut tracker, &mut outbox),
                    EventType::Disconnected => {
                        if tracker.detach(handle) {
                            outbox.push(DeviceEvent::Disconnected(handle));
                        }
                    }
                    EventType::ButtonPressed(button, _) => tracker.button(handle, button, true),
                    EventType::ButtonReleased(button, _) => tracker.button(handle, button, false),
                    EventType::AxisChanged(axis, value, _) => tracker.axis(handle, axis, value),
                    _ => {}
                }
            }

            outbox.extend(
                tracker
                    .drain_dirty()
                    .into_iter()
                    .map(|(handle, frame)| DeviceEvent::Frame { handle, frame }),
            );
            for event in outbox.drain(..) {
                if events.send(event).is_err() {
                    debug!("Event receiver dropped, stopping gamepad loop");
                    return;
                }
            }

            std::thread::sleep(Duration::from_millis(4));
        }
    }

    fn connect(gilrs: &Gilrs, id: GamepadId, tracker: &mut FrameTracker, outbox: &mut Vec<DeviceEvent>) {
        let gamepad = gilrs.gamepad(id);
        let enumeration = tracker.enumeration(handle_of(id));
        let raw = raw_device_id(id, &gamepad, enumeration);
        debug!(
            "📶 gilrs gamepad {} \"{}\" ({}), enumeration {}",
            raw.handle,
            raw.name,
            raw.signature_key(),
            enumeration
        );
        tracker.attach(raw.handle);
        outbox.push(DeviceEvent::Connected(raw));
    }

    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("Gamepad provider shutdown requested");
        }
    }
}

impl Drop for GilrsProvider {
    fn drop(&mut self) {
        self.shutdown();
    }
}
