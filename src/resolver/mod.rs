//! Binding resolver
//!
//! Turns one tick of input into zero or more actions. Per tick:
//!
//! 1. releases: pending release edges, deferred taps, hold-mode menu commit
//! 2. long-press timers that came due
//! 3. presses: chords longest first, then single buttons
//! 4. hat and button-mode stick direction changes
//!
//! While the quick-select menu is open, navigation inputs drive the menu and
//! every other press is swallowed.


use crate::action::{Action, QuickSelectMode};
use crate::gesture::{GestureState, HoldRelease, StickZoneSettings};
use crate::input::{Direction, InputSnapshot};
use crate::profile::{AxisRole, BindingTable, CompiledProfile, Context, InputRef};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Edge an action is dispatched on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Press,
    Release,
}

/// An action ready for the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAction {
    pub action: Action,
    pub phase: Phase,
    /// Input that produced it
    pub source: InputRef,
}

impl ResolvedAction {
    pub fn press(source: InputRef, action: Action) -> Self {
        Self {
            action,
            phase: Phase::Press,
            source,
        }
    }

    pub fn release(source: InputRef, action: Action) -> Self {
        Self {
            action,
            phase: Phase::Release,
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    pub hold_threshold_ms: u64,
    pub stick_activation: f32,
    pub stick_hysteresis_deg: f32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            hold_threshold_ms: 500,
            stick_activation: 0.5,
            stick_hysteresis_deg: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    settings: ResolverSettings,
}

impl Resolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ResolverSettings) {
        self.settings = settings;
    }

    /// Resolve one tick; `state.previous` becomes `snapshot`
    pub fn resolve(
        &self,
        snapshot: &InputSnapshot,
        state: &mut GestureState,
        context: Context,
        profile: &CompiledProfile,
        now_ms: u64,
    ) -> Vec<ResolvedAction> {
        let previous = std::mem::take(&mut state.previous);
        let mut tick = Tick {
            settings: &self.settings,
            profile,
            table: profile.table(context),
            snapshot,
            previous: &previous,
            state: &mut *state,
            now_ms,
            out: Vec::new(),
        };
        tick.run();
        let out = tick.out;
        state.previous = snapshot.clone();
        if !out.is_empty() {
            trace!("Resolved {} actions in {}", out.len(), context);
        }
        out
    }
}

struct Tick<'a> {
    settings: &'a ResolverSettings,
    profile: &'a CompiledProfile,
    table: &'a BindingTable,
    snapshot: &'a InputSnapshot,
    previous: &'a InputSnapshot,
    state: &'a mut GestureState,
    now_ms: u64,
    out: Vec<ResolvedAction>,
}

impl Tick<'_> {
    fn run(&mut self) {
        // Inputs past u8::MAX cannot be bound
        let count = self.snapshot.buttons.len().max(self.previous.buttons.len());
        let newly: Vec<u8> = (0..=u8::MAX)
            .take(count)
            .filter(|b| self.snapshot.is_pressed(*b) && !self.previous.is_pressed(*b))
            .collect();
        let released: Vec<u8> = (0..=u8::MAX)
            .take(count)
            .filter(|b| !self.snapshot.is_pressed(*b) && self.previous.is_pressed(*b))
            .collect();

        for button in released {
            self.release_button(button);
        }
        self.fire_due_long_presses();
        if self.state.quick_select.is_open() {
            self.navigate_with_buttons(&newly);
        } else {
            self.press_buttons(&newly);
        }
        self.hats();
        self.sticks();
    }

    /// Dispatch an action for an input that just triggered
    fn fire(&mut self, source: InputRef, action: Action, still_down: bool) {
        if let Action::QuickSelect(mode) = action {
            let mode = if still_down { mode } else { QuickSelectMode::Toggle };
            if self
                .state
                .quick_select
                .open(mode, source, self.table.quick_select_entries())
            {
                self.swallow_pressed();
            }
            return;
        }
        let needs_release = action.acts_on_release();
        self.out.push(ResolvedAction::press(source.clone(), action.clone()));
        if needs_release {
            if still_down {
                self.state.active.insert(source, action);
            } else {
                self.out.push(ResolvedAction::release(source, action));
            }
        }
    }

    fn fire_bound(&mut self, source: InputRef, still_down: bool) {
        if let Some(action) = self.table.lookup(&source).cloned() {
            self.fire(source, action, still_down);
        }
    }

    /// Everything currently held is ignored until released
    fn swallow_pressed(&mut self) {
        let pressed: Vec<u8> = self.snapshot.pressed().collect();
        for button in pressed {
            self.state.holds.cancel(button);
            self.state.consumed.insert(button);
        }
    }

    /// Emit release edges for actions held through an input
    fn release_active(&mut self, matches: impl Fn(&InputRef) -> bool) {
        let ended: Vec<InputRef> = self
            .state
            .active
            .keys()
            .filter(|input| matches(input))
            .cloned()
            .collect();
        for input in ended {
            if let Some(action) = self.state.active.remove(&input) {
                self.out.push(ResolvedAction::release(input, action));
            }
        }
    }

    /// Hold-mode menus commit (or close) when their opener lets go
    fn release_opener(&mut self, released: impl Fn(&InputRef) -> bool) -> bool {
        let is_opener = self.state.quick_select.is_open()
            && self.state.quick_select.mode() == Some(QuickSelectMode::Hold)
            && self.state.quick_select.opener().is_some_and(|o| released(o));
        if !is_opener {
            return false;
        }
        if self.profile.quick_select.commit_on_release {
            self.commit_menu();
        } else {
            self.state.quick_select.close();
        }
        true
    }

    fn commit_menu(&mut self) {
        let opener = self.state.quick_select.opener().cloned();
        if let (Some(action), Some(opener)) = (self.state.quick_select.commit(), opener) {
            // The entry runs as a complete press; nothing stays held
            self.fire(opener, action, false);
        }
    }

    fn release_button(&mut self, button: u8) {
        let was_consumed = self.state.consumed.remove(&button);
        self.release_active(|input| input.buttons().contains(&button));
        if self.release_opener(|opener| opener.buttons().contains(&button)) {
            self.state.holds.cancel(button);
            return;
        }

        let threshold = self.settings.hold_threshold_ms;
        match self.state.holds.finish(button, threshold, self.now_ms) {
            Some(_) if was_consumed => {}
            Some(HoldRelease::Tap) => {
                self.fire_bound(InputRef::Button(button), false);
            }
            Some(HoldRelease::LongPress) => {
                debug!("Long press on button {} at release", button);
                self.fire_bound(InputRef::LongPress(button), false);
            }
            Some(HoldRelease::AlreadyFired) | None => {}
        }
    }

    fn fire_due_long_presses(&mut self) {
        let due = self
            .state
            .holds
            .due(self.settings.hold_threshold_ms, self.now_ms);
        for button in due {
            if self.state.consumed.contains(&button) {
                continue;
            }
            debug!("Long press on button {}", button);
            self.fire_bound(InputRef::LongPress(button), true);
        }
    }

    fn press_buttons(&mut self, newly: &[u8]) {
        if newly.is_empty() {
            return;
        }
        let table = self.table;
        let mut claimed: BTreeSet<u8> = BTreeSet::new();

        // Longest chord first; each newly pressed button feeds one chord
        for members in table.chords() {
            if self.state.quick_select.is_open() {
                break;
            }
            let all_down = members.iter().all(|m| self.snapshot.is_pressed(*m));
            let fresh: Vec<u8> = members
                .iter()
                .copied()
                .filter(|m| newly.contains(m))
                .collect();
            if !all_down || fresh.is_empty() || fresh.iter().any(|m| claimed.contains(m)) {
                continue;
            }
            claimed.extend(fresh);
            for member in members {
                self.state.holds.cancel(*member);
                self.state.consumed.insert(*member);
            }
            self.fire_bound(InputRef::Chord(members.clone()), true);
        }

        for &button in newly {
            if claimed.contains(&button) {
                continue;
            }
            if self.state.quick_select.is_open() {
                // Opened by an earlier button in this same tick
                self.state.consumed.insert(button);
                continue;
            }
            if table.has_long_press(button) {
                self.state.holds.start(button, self.now_ms);
                continue;
            }
            self.fire_bound(InputRef::Button(button), true);
        }
    }

    fn navigate_with_buttons(&mut self, newly: &[u8]) {
        let profile = self.profile;
        let settings = &profile.quick_select;
        let model = &profile.model;

        // Toggle menus close when their opener fires again
        if self.state.quick_select.mode() == Some(QuickSelectMode::Toggle) {
            let reopened = match self.state.quick_select.opener() {
                Some(InputRef::Button(b)) | Some(InputRef::LongPress(b)) => newly.contains(b),
                Some(InputRef::Chord(members)) => {
                    members.iter().all(|m| self.snapshot.is_pressed(*m))
                        && members.iter().any(|m| newly.contains(m))
                }
                _ => false,
            };
            if reopened {
                debug!("Quick select closed");
                self.state.quick_select.close();
                self.state.consumed.extend(newly.iter().copied());
                return;
            }
        }

        for &button in newly {
            self.state.consumed.insert(button);
            if !self.state.quick_select.is_open() {
                continue;
            }
            let toggle = self.state.quick_select.mode() == Some(QuickSelectMode::Toggle);
            let confirm = button == settings.confirm_button
                && (toggle || !settings.commit_on_release);
            let stick_press =
                settings.commit_on_stick_press && model.stick_button == Some(button);
            if confirm || stick_press {
                self.commit_menu();
                continue;
            }
            if let (true, Some(dpad)) = (settings.select_with_dpad, model.dpad) {
                if button == dpad.down || button == dpad.right {
                    self.state.quick_select.next();
                } else if button == dpad.up || button == dpad.left {
                    self.state.quick_select.previous();
                }
            }
        }
    }

    fn hats(&mut self) {
        let count = self.snapshot.hats.len().max(self.previous.hats.len());
        for hat in (0..=u8::MAX).take(count) {
            let old = self.previous.hat(hat);
            let new = self.snapshot.hat(hat);
            if old == new {
                continue;
            }
            if let Some(direction) = old {
                let released = InputRef::Hat { hat, direction };
                self.release_active(|input| *input == released);
                self.release_opener(|opener| *opener == released);
            }
            let Some(direction) = new else { continue };
            let input = InputRef::Hat { hat, direction };

            if self.state.quick_select.is_open() {
                if self.state.quick_select.mode() == Some(QuickSelectMode::Toggle)
                    && self.state.quick_select.opener() == Some(&input)
                {
                    self.state.quick_select.close();
                } else if self.profile.quick_select.select_with_dpad {
                    match direction {
                        Direction::Down | Direction::Right | Direction::DownRight => {
                            self.state.quick_select.next()
                        }
                        Direction::Up | Direction::Left | Direction::UpLeft => {
                            self.state.quick_select.previous()
                        }
                        _ => {}
                    }
                }
                continue;
            }
            self.fire_bound(input, true);
        }
    }

    fn sticks(&mut self) {
        let profile = self.profile;
        let zones = StickZoneSettings {
            zones: profile.axes.stick_zones,
            activation: self.settings.stick_activation,
            hysteresis_deg: self.settings.stick_hysteresis_deg,
        };
        for (index, pair) in (0..=u8::MAX).zip(profile.model.sticks.iter()) {
            let x = self.snapshot.axis(pair.x_axis);
            let y = pair.y_axis.map(|a| self.snapshot.axis(a)).unwrap_or(0.0);

            let menu_open = self.state.quick_select.is_open();
            if menu_open
                && profile.quick_select.select_with_stick
                && index == profile.quick_select.stick
                && x.hypot(y) >= self.settings.stick_activation
            {
                self.state.quick_select.point(x, y);
            }

            let button_mode = profile.axes.role(pair.x_axis) == AxisRole::Buttons
                && pair
                    .y_axis
                    .map_or(true, |a| profile.axes.role(a) == AxisRole::Buttons);
            if !button_mode {
                continue;
            }
            let Some(change) = self.state.stick(index).update(x, y, &zones) else {
                continue;
            };
            if let Some(direction) = change.released {
                let released = InputRef::Stick { stick: index, direction };
                self.release_active(|input| *input == released);
                self.release_opener(|opener| *opener == released);
            }
            if let Some(direction) = change.entered {
                if !menu_open {
                    self.fire_bound(InputRef::Stick { stick: index, direction }, true);
                }
            }
        }
    }
}
