use super::*;
use crate::action::Command;
use crate::device::DeviceModel;
use crate::dispatch::recording::{HostCall, RecordingHost};
use crate::dispatch::{CollectingNotifier, MouseButton, NoticeKind};
use crate::profile::defaults::default_profile;
use crate::profile::Context;
use std::sync::Arc;

struct Rig {
    engine: Engine<RecordingHost>,
    notices: CollectingNotifier,
    now: u64,
}

impl Rig {
    fn new() -> Self {
        let notices = CollectingNotifier::new();
        let tables = TableHandle::new(CompiledProfile::empty(Arc::new(DeviceModel::generic(0, 0, 0))));
        let engine = Engine::new(
            RecordingHost::new(),
            Box::new(notices.clone()),
            tables,
            EngineSettings::default(),
        );
        Self {
            engine,
            notices,
            now: 1_000,
        }
    }

    /// Connect and, like the runtime, publish the default profile on activation
    fn connect(&mut self, raw: RawDeviceId) -> AttachOutcome {
        let outcome = self.engine.connect(raw);
        if let AttachOutcome::Activated(session) = &outcome {
            self.activate_default(session.model.clone());
        }
        outcome
    }

    fn disconnect(&mut self, handle: usize) -> DetachOutcome {
        let outcome = self.engine.disconnect(DeviceHandle(handle));
        if let DetachOutcome::Active {
            promoted: Some(next), ..
        } = &outcome
        {
            self.activate_default(next.model.clone());
        }
        outcome
    }

    fn activate_default(&mut self, model: Arc<DeviceModel>) {
        let profile = default_profile(&model);
        self.engine.activate(CompiledProfile::compile(&profile, model));
    }

    fn tick(&mut self, handle: usize, frame: RawFrame) -> TickReport {
        self.now += 16;
        self.engine.tick(DeviceHandle(handle), &frame, self.now)
    }

    /// Press then release, one tick each
    fn tap(&mut self, handle: usize, button: u8) {
        self.tick(handle, frame(&[button]));
        self.tick(handle, frame(&[]));
    }

    fn set_context(&mut self, context: Option<Context>) {
        self.engine.host_mut().context = context;
    }

    fn calls(&self) -> Vec<HostCall> {
        self.engine.host().calls()
    }

    fn commands(&self) -> Vec<Command> {
        self.engine.host().commands()
    }
}

fn pad(handle: usize, name: &str, enumeration: u32) -> RawDeviceId {
    RawDeviceId {
        handle: DeviceHandle(handle),
        name: name.to_string(),
        vendor_id: None,
        product_id: None,
        buttons: 16,
        axes: 4,
        hats: 1,
        enumeration,
    }
}

fn frame(pressed: &[u8]) -> RawFrame {
    let mut frame = RawFrame::with_sizes(16, 4, 1);
    for b in pressed {
        frame.buttons[*b as usize] = true;
    }
    frame
}

fn with_axis(mut frame: RawFrame, axis: usize, value: f32) -> RawFrame {
    frame.axes[axis] = value;
    frame
}

#[test]
fn test_unknown_controller_notice() {
    let mut rig = Rig::new();
    let outcome = rig.connect(pad(0, "Test Pad", 0));
    assert!(matches!(outcome, AttachOutcome::Activated(_)));
    assert_eq!(rig.notices.texts(), vec!["Unknown Controller Connected: Test Pad"]);
    assert_eq!(rig.notices.notices()[0].kind, NoticeKind::Connection);
}

#[test]
fn test_known_controller_notice() {
    let mut rig = Rig::new();
    let raw = RawDeviceId {
        vendor_id: Some(0x054c),
        product_id: Some(0x0ce6),
        buttons: 18,
        hats: 0,
        ..pad(0, "Wireless Controller", 0)
    };
    rig.connect(raw);
    assert_eq!(rig.notices.texts(), vec!["DualSense Connected"]);
}

#[test]
fn test_press_reaches_host_in_context() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.set_context(Some(Context::Review));

    let report = rig.tick(0, frame(&[0]));
    assert_eq!(report.actions, 1);
    assert_eq!(rig.tick(0, frame(&[0])).actions, 0);
    rig.tick(0, frame(&[]));
    assert_eq!(rig.commands(), vec![Command::FlipCard]);

    rig.set_context(Some(Context::DeckBrowser));
    rig.tap(0, 0);
    assert_eq!(rig.commands(), vec![Command::FlipCard, Command::Select]);
}

#[test]
fn test_disconnect_mid_menu_discards_gesture() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));

    rig.tap(0, 3);
    rig.tick(0, frame(&[13]));
    assert!(rig.engine.gesture().quick_select.is_open());

    let outcome = rig.disconnect(0);
    assert!(matches!(outcome, DetachOutcome::Active { promoted: None, .. }));
    assert_eq!(rig.notices.texts().last().map(String::as_str), Some("Controller Disconnected"));
    assert!(rig.engine.gesture().is_idle());
    assert!(rig.calls().is_empty());

    // Frames for the gone handle do nothing
    assert_eq!(rig.tick(0, frame(&[0])).actions, 0);

    rig.connect(pad(0, "Test Pad", 0));
    assert!(!rig.engine.gesture().quick_select.is_open());
    // Confirm button now acts as itself, not as a menu commit
    rig.tap(0, 0);
    assert_eq!(rig.commands(), vec![Command::Enter]);
}

#[test]
fn test_menu_navigation_wraps() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    let entries = rig.engine.tables().load().table(Context::Global).quick_select_entries().to_vec();
    let n = entries.len();
    assert!(n > 1);

    rig.tap(0, 3);
    for _ in 0..n + 2 {
        rig.tap(0, 13);
    }
    assert_eq!(rig.engine.gesture().quick_select.selected(), Some(1 % n));
    assert!(rig.calls().is_empty());

    rig.tap(0, 0);
    assert!(!rig.engine.gesture().quick_select.is_open());
    assert_eq!(rig.commands(), vec![Command::Redo]);
}

#[test]
fn test_duplicate_and_standby_frames_ignored() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    let duplicate = rig.connect(pad(1, "Test Pad", 0));
    assert!(matches!(duplicate, AttachOutcome::Duplicate { of: DeviceHandle(0) }));
    let standby = rig.connect(pad(2, "Test Pad", 1));
    assert!(matches!(standby, AttachOutcome::Standby(_)));

    rig.tap(1, 0);
    rig.tap(2, 0);
    assert!(rig.calls().is_empty());

    rig.tap(0, 0);
    assert_eq!(rig.commands(), vec![Command::Enter]);
    // Only the first controller was announced
    assert_eq!(rig.notices.texts().len(), 1);
}

#[test]
fn test_standby_promoted_on_disconnect() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.connect(pad(1, "Other Pad", 1));

    let outcome = rig.disconnect(0);
    assert!(matches!(outcome, DetachOutcome::Active { promoted: Some(_), .. }));
    assert_eq!(
        rig.notices.texts(),
        vec![
            "Unknown Controller Connected: Test Pad",
            "Controller Disconnected",
            "Unknown Controller Connected: Other Pad",
        ]
    );
    assert_eq!(rig.engine.active().map(|s| s.handle), Some(DeviceHandle(1)));

    rig.tap(1, 2);
    assert_eq!(rig.commands(), vec![Command::Undo]);
}

#[test]
fn test_unfocused_host_skips_frames() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.set_context(None);
    assert_eq!(rig.tick(0, frame(&[0])).actions, 0);

    // Held through the focus change: no press edge
    rig.set_context(Some(Context::Global));
    assert_eq!(rig.tick(0, frame(&[0])).actions, 0);
    rig.tick(0, frame(&[]));
    assert!(rig.calls().is_empty());

    rig.tap(0, 0);
    assert_eq!(rig.commands(), vec![Command::Enter]);
}

#[test]
fn test_cursor_moves_host_pointer() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.engine.host_mut().position = Some((100, 100));

    let first = rig.tick(0, with_axis(frame(&[]), 0, 1.0));
    assert!(first.pointer_moved);
    rig.now += 84;
    rig.tick(0, with_axis(frame(&[]), 0, 1.0));
    // 1200 px/s at full deflection over 100 ms
    assert_eq!(rig.calls().last(), Some(&HostCall::Move(220, 100)));

    let idle = rig.tick(0, frame(&[]));
    assert!(!idle.pointer_moved);
}

#[test]
fn test_cursor_clamped_to_desktop_override() {
    let mut rig = Rig::new();
    rig.engine.apply_settings(EngineSettings {
        desktop: Some(Rect::new(0, 0, 200, 100)),
        ..EngineSettings::default()
    });
    rig.connect(pad(0, "Test Pad", 0));
    rig.engine.host_mut().position = Some((190, 50));

    rig.tick(0, with_axis(frame(&[]), 0, 1.0));
    rig.now += 984;
    rig.tick(0, with_axis(frame(&[]), 0, 1.0));
    assert_eq!(rig.calls().last(), Some(&HostCall::Move(199, 50)));
}

#[test]
fn test_open_menu_owns_its_stick() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.tap(0, 3);

    // Right stick up selects the top entry instead of scrolling
    for _ in 0..3 {
        rig.tick(0, with_axis(frame(&[]), 3, -1.0));
    }
    assert_eq!(rig.engine.gesture().quick_select.selected(), Some(0));
    assert!(!rig.calls().iter().any(|c| matches!(c, HostCall::Scroll(..))));
}

#[test]
fn test_scroll_axis_when_menu_closed() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.tick(0, with_axis(frame(&[]), 3, 1.0));
    rig.now += 484;
    let report = rig.tick(0, with_axis(frame(&[]), 3, 1.0));
    assert!(report.scrolled);
    assert!(rig
        .calls()
        .iter()
        .any(|c| matches!(c, HostCall::Scroll(0, dy) if *dy > 0)));
}

#[test]
fn test_profile_switch_resets_gesture() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.tap(0, 3);
    assert!(rig.engine.gesture().quick_select.is_open());

    let model = Arc::new(DeviceModel::generic(16, 4, 1));
    let mut other = default_profile(&model);
    other.name = "Evening Reviews".to_string();
    rig.engine.tables().publish(CompiledProfile::compile(&other, model));

    rig.tick(0, frame(&[]));
    assert!(!rig.engine.gesture().quick_select.is_open());
    rig.tap(0, 0);
    assert_eq!(rig.commands(), vec![Command::Enter]);
}

#[test]
fn test_modifier_makes_click_secondary() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));

    rig.tick(0, frame(&[4]));
    rig.tick(0, frame(&[4, 10]));
    rig.tick(0, frame(&[4]));
    rig.tick(0, frame(&[]));
    rig.tap(0, 10);
    assert_eq!(
        rig.calls(),
        vec![
            HostCall::Button(MouseButton::Right, true),
            HostCall::Button(MouseButton::Right, false),
            HostCall::Button(MouseButton::Left, true),
            HostCall::Button(MouseButton::Left, false),
        ]
    );
}

#[test]
fn test_dispatch_failure_does_not_stop_processing() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.engine.host_mut().fail_on(Command::Enter);

    rig.tap(0, 0);
    rig.tap(0, 2);
    assert_eq!(rig.commands(), vec![Command::Undo]);
    let errors: Vec<_> = rig
        .notices
        .notices()
        .into_iter()
        .filter(|n| n.kind == NoticeKind::Error)
        .collect();
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_short_frames_read_as_neutral() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    let short = RawFrame {
        buttons: vec![true],
        axes: Vec::new(),
        hats: Vec::new(),
    };
    assert_eq!(rig.tick(0, short).actions, 1);
    assert_eq!(rig.commands(), vec![Command::Enter]);
}

#[test]
fn test_surviving_duplicate_takes_over() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.connect(pad(1, "Test Pad", 0));

    let outcome = rig.disconnect(0);
    assert!(matches!(
        outcome,
        DetachOutcome::Active { promoted: Some(ref s), .. } if s.handle == DeviceHandle(1)
    ));
    assert_eq!(rig.engine.active().map(|s| s.handle), Some(DeviceHandle(1)));

    let report = rig.tick(1, frame(&[0]));
    assert_eq!(report.actions, 1);
    assert_eq!(rig.commands(), vec![Command::Enter]);
}

#[test]
fn test_button_held_through_profile_switch_does_not_refire() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.set_context(Some(Context::DeckBrowser));
    rig.tick(0, frame(&[0]));

    let model = Arc::new(DeviceModel::generic(16, 4, 1));
    let mut other = default_profile(&model);
    other.name = "Other".to_string();
    rig.engine.tables().publish(CompiledProfile::compile(&other, model.clone()));
    assert_eq!(rig.tick(0, frame(&[0])).actions, 0);
    rig.tick(0, frame(&[]));
    assert_eq!(rig.commands(), vec![Command::Select]);

    // Same through an explicit activation
    rig.tick(0, frame(&[0]));
    other.name = "Third".to_string();
    rig.engine.activate(CompiledProfile::compile(&other, model));
    assert_eq!(rig.tick(0, frame(&[0])).actions, 0);
    rig.tick(0, frame(&[]));
    assert_eq!(rig.commands(), vec![Command::Select, Command::Select]);
}

#[test]
fn test_switch_to_standby_controller() {
    let mut rig = Rig::new();
    rig.connect(pad(0, "Test Pad", 0));
    rig.connect(pad(1, "Other Pad", 1));
    assert!(rig.engine.switch_controller(DeviceHandle(7)).is_none());

    let session = rig.engine.switch_controller(DeviceHandle(1)).unwrap();
    rig.activate_default(session.model);
    assert_eq!(
        rig.notices.texts().last().map(String::as_str),
        Some("Unknown Controller Connected: Other Pad")
    );
    assert!(rig.engine.registry().is_active(DeviceHandle(1)));
    assert_eq!(rig.engine.registry().standby()[0].handle, DeviceHandle(0));

    rig.tap(0, 2);
    rig.tap(1, 2);
    assert_eq!(rig.commands(), vec![Command::Undo]);
}
