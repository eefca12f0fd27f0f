//! Per-tick pipeline
//!
//! Owns every piece of mutable per-session state and runs one frame through
//! registry → normalizer → resolver/gesture → dispatcher. A single writer
//! drives it; the only shared piece is the [`TableHandle`], which the
//! configuration surface may republish at any time.

#[cfg(test)]
mod tests;

use crate::device::{AttachOutcome, DetachOutcome, DeviceHandle, DeviceRegistry, RawDeviceId, Session};
use crate::dispatch::{Dispatcher, Host, Notice, NoticeFilter, Notifier};
use crate::gesture::{AnalogInput, GestureState, Rect};
use crate::input::{InputSnapshot, Normalizer, RawFrame};
use crate::profile::{AxisRole, CompiledProfile, TableHandle};
use crate::resolver::{Resolver, ResolverSettings};
use tracing::{debug, info, trace};

/// Runtime-tunable knobs, usually derived from the app config
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub resolver: ResolverSettings,
    pub detect_8bitdo: bool,
    /// Overrides the host's desktop bounds for cursor clamping
    pub desktop: Option<Rect>,
    pub notices: NoticeFilter,
    pub flags: Vec<u8>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            resolver: ResolverSettings::default(),
            detect_8bitdo: false,
            desktop: None,
            notices: NoticeFilter::default(),
            flags: (1..=7).collect(),
        }
    }
}

/// What a tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Resolved actions handed to the dispatcher
    pub actions: usize,
    pub pointer_moved: bool,
    pub scrolled: bool,
}

pub struct Engine<H: Host> {
    registry: DeviceRegistry,
    normalizer: Normalizer,
    resolver: Resolver,
    gesture: GestureState,
    dispatcher: Dispatcher<H>,
    tables: TableHandle,
    /// Epoch and profile name seen by the last tick
    seen: Option<(u64, String)>,
    desktop: Option<Rect>,
}

impl<H: Host> Engine<H> {
    pub fn new(host: H, notifier: Box<dyn Notifier>, tables: TableHandle, settings: EngineSettings) -> Self {
        let mut engine = Self {
            registry: DeviceRegistry::new(settings.detect_8bitdo),
            normalizer: Normalizer::new(),
            resolver: Resolver::new(settings.resolver),
            gesture: GestureState::new(),
            dispatcher: Dispatcher::new(host, notifier),
            tables,
            seen: None,
            desktop: None,
        };
        engine.apply_settings(settings);
        engine
    }

    /// Apply reloaded settings between ticks
    pub fn apply_settings(&mut self, settings: EngineSettings) {
        self.resolver.set_settings(settings.resolver);
        self.registry.set_detect_8bitdo(settings.detect_8bitdo);
        self.dispatcher.set_filter(settings.notices);
        self.dispatcher.set_flags(settings.flags);
        self.desktop = settings.desktop;
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn dispatcher(&self) -> &Dispatcher<H> {
        &self.dispatcher
    }

    pub fn host(&self) -> &H {
        self.dispatcher.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.dispatcher.host_mut()
    }

    pub fn tables(&self) -> &TableHandle {
        &self.tables
    }

    pub fn active(&self) -> Option<&Session> {
        self.registry.active()
    }

    /// Handle a hot-plug connect
    pub fn connect(&mut self, raw: RawDeviceId) -> AttachOutcome {
        let outcome = self.registry.attach(raw);
        match &outcome {
            AttachOutcome::Activated(session) => {
                self.start_session();
                self.announce(session);
            }
            AttachOutcome::Standby(session) => {
                debug!("{} waits on standby", session.model.name);
            }
            AttachOutcome::Duplicate { .. } | AttachOutcome::AlreadyAttached => {}
        }
        outcome
    }

    /// Handle a hot-plug disconnect
    ///
    /// Ending the active session discards every in-flight gesture. Nothing is
    /// dispatched for it, not even releases.
    pub fn disconnect(&mut self, handle: DeviceHandle) -> DetachOutcome {
        let outcome = self.registry.detach(handle);
        if let DetachOutcome::Active { ended, promoted } = &outcome {
            if !self.gesture.is_idle() {
                info!("Discarding in-flight input of {}", ended.model.name);
            }
            self.start_session();
            self.dispatcher.notify(Notice::connection("Controller Disconnected"));
            if let Some(next) = promoted {
                self.announce(next);
            }
        }
        outcome
    }

    /// Hand input over to a standby controller
    ///
    /// The previous controller waits on standby. The caller publishes a
    /// profile for the returned session.
    pub fn switch_controller(&mut self, handle: DeviceHandle) -> Option<Session> {
        let session = self.registry.activate(handle)?.clone();
        info!("🔀 Switched to controller {}: {}", session.handle, session.model.name);
        self.start_session();
        self.announce(&session);
        Some(session)
    }

    /// Publish a profile for the active controller
    ///
    /// Inputs held through the switch do not fire under the new profile.
    pub fn activate(&mut self, profile: CompiledProfile) {
        info!("🎮 Profile \"{}\" active for {}", profile.profile_name, profile.model.name);
        let name = profile.profile_name.clone();
        let epoch = self.tables.publish(profile);
        self.gesture.rebase();
        self.dispatcher.reset();
        self.seen = Some((epoch, name));
    }

    /// Run one frame of the active controller
    ///
    /// Frames from standby or duplicate handles are ignored. While the host
    /// is not focused gestures are dropped and the frame only updates the
    /// edge baseline, so nothing held across a focus change fires later.
    pub fn tick(&mut self, handle: DeviceHandle, frame: &RawFrame, now_ms: u64) -> TickReport {
        let mut report = TickReport::default();
        let Some(model) = self
            .registry
            .active()
            .filter(|s| s.handle == handle)
            .map(|s| s.model.clone())
        else {
            return report;
        };

        let profile = self.tables.load();
        self.track_profile(&profile);

        let snapshot = self.normalizer.normalize(frame, &model, &profile.axes);
        let dt = self.gesture.advance(now_ms);

        let Some(context) = self.dispatcher.host().context() else {
            trace!("Host not focused, skipping frame");
            self.gesture.rebase();
            self.gesture.previous = snapshot;
            self.gesture.last_tick_ms = Some(now_ms);
            return report;
        };

        let actions = self
            .resolver
            .resolve(&snapshot, &mut self.gesture, context, &profile, now_ms);
        for action in &actions {
            self.dispatcher.submit(action);
        }
        report.actions = actions.len();

        let analog = self.analog_input(&snapshot, &profile);
        let bounds = self.desktop.unwrap_or_else(|| self.dispatcher.host().desktop_bounds());
        let origin = self.dispatcher.host().pointer_position();
        let step = self.gesture.cursor.step(analog, &profile.axes, dt, bounds, origin);

        if let Some((x, y)) = step.moved_to {
            match self.dispatcher.host_mut().pointer_move(x, y) {
                Ok(()) => report.pointer_moved = true,
                Err(e) => debug!("Pointer move failed: {:#}", e),
            }
        }
        if step.scroll != (0, 0) {
            match self.dispatcher.host_mut().scroll(step.scroll.0, step.scroll.1) {
                Ok(()) => report.scrolled = true,
                Err(e) => debug!("Scroll failed: {:#}", e),
            }
        }
        report
    }

    fn start_session(&mut self) {
        self.gesture.reset();
        self.normalizer.reset();
        self.dispatcher.reset();
        self.seen = None;
    }

    fn announce(&self, session: &Session) {
        let text = if session.is_recognized() {
            format!("{} Connected", session.model.name)
        } else {
            format!("Unknown Controller Connected: {}", session.raw.name)
        };
        self.dispatcher.notify(Notice::connection(text));
    }

    /// Drop gesture state when a different profile was published
    fn track_profile(&mut self, profile: &CompiledProfile) {
        let epoch = self.tables.epoch();
        match &self.seen {
            Some((seen, _)) if *seen == epoch => return,
            Some((_, name)) if *name != profile.profile_name => {
                info!("🔄 Profile switched to \"{}\"", profile.profile_name);
                self.gesture.rebase();
                self.dispatcher.reset();
            }
            _ => debug!("Profile \"{}\" republished", profile.profile_name),
        }
        self.seen = Some((epoch, profile.profile_name.clone()));
    }

    /// Sum analog axes by role
    ///
    /// The quick-select stick belongs to the menu while it is open.
    fn analog_input(&self, snapshot: &InputSnapshot, profile: &CompiledProfile) -> AnalogInput {
        let menu_stick = (self.gesture.quick_select.is_open() && profile.quick_select.select_with_stick)
            .then(|| profile.model.sticks.get(profile.quick_select.stick as usize))
            .flatten();

        let mut input = AnalogInput::default();
        for (&axis, &role) in &profile.axes.roles {
            if menu_stick.is_some_and(|s| s.x_axis == axis || s.y_axis == Some(axis)) {
                continue;
            }
            let value = snapshot.axis(axis);
            match role {
                AxisRole::CursorHorizontal => input.cursor.0 += value,
                AxisRole::CursorVertical => input.cursor.1 += value,
                AxisRole::ScrollHorizontal => input.scroll.0 += value,
                AxisRole::ScrollVertical => input.scroll.1 += value,
                AxisRole::Buttons | AxisRole::Unassigned => {}
            }
        }
        input.cursor = (input.cursor.0.clamp(-1.0, 1.0), input.cursor.1.clamp(-1.0, 1.0));
        input.scroll = (input.scroll.0.clamp(-1.0, 1.0), input.scroll.1.clamp(-1.0, 1.0));
        input
    }
}
