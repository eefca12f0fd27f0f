//! Action dispatch against the host application
//!
//! The host is reached only through the [`Host`] trait. Built-in commands go
//! out by stable identifier, custom actions as key sequences, pointer
//! commands as pointer operations. Modifier actions never reach the host;
//! they only change how later actions are sent. Every failure ends as a
//! notice, never as an error the polling loop has to handle.

pub mod console;
pub mod notice;
#[cfg(test)]
pub(crate) mod recording;

pub use console::ConsoleHost;
pub use notice::{CollectingNotifier, Notice, NoticeFilter, NoticeKind, Notifier, TracingNotifier};

use crate::action::{Action, Command, KeySequence};
use crate::error::DispatchError;
use crate::gesture::Rect;
use crate::profile::{Context, InputRef};
use crate::resolver::{Phase, ResolvedAction};
use anyhow::Result;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Scroll distance for `scroll-up` / `scroll-down` without a parameter
pub const DEFAULT_SCROLL_STEP: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

/// Capabilities the host application exposes to the engine
///
/// Calls are made from the polling loop and must return promptly.
pub trait Host: Send {
    fn name(&self) -> &str;

    /// Current application context; `None` while the host is not focused
    fn context(&self) -> Option<Context>;

    /// Run a catalog command
    fn invoke(&mut self, command: Command, params: &[Value]) -> Result<()>;

    /// Type a key sequence
    fn send_keys(&mut self, keys: &KeySequence) -> Result<()>;

    fn pointer_move(&mut self, x: i32, y: i32) -> Result<()>;

    /// Where the pointer is, if the host can tell
    fn pointer_position(&self) -> Option<(i32, i32)> {
        None
    }

    fn pointer_button(&mut self, button: MouseButton, pressed: bool) -> Result<()>;

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<()>;

    /// Bounds of the virtual desktop spanning all screens
    fn desktop_bounds(&self) -> Rect;
}

pub struct Dispatcher<H: Host> {
    host: H,
    notifier: Box<dyn Notifier>,
    filter: NoticeFilter,
    /// Enabled flag numbers cycled by a bare `flag`
    flags: Vec<u8>,
    next_flag: usize,
    /// Inputs currently holding a modifier
    modifiers: BTreeSet<InputRef>,
    /// Pointer buttons held down, by the input that pressed them
    pointer_buttons: BTreeMap<InputRef, MouseButton>,
    dispatched: u64,
}

impl<H: Host> Dispatcher<H> {
    pub fn new(host: H, notifier: Box<dyn Notifier>) -> Self {
        Self {
            host,
            notifier,
            filter: NoticeFilter::default(),
            flags: (1..=7).collect(),
            next_flag: 0,
            modifiers: BTreeSet::new(),
            pointer_buttons: BTreeMap::new(),
            dispatched: 0,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn set_filter(&mut self, filter: NoticeFilter) {
        self.filter = filter;
    }

    pub fn set_flags(&mut self, flags: Vec<u8>) {
        self.flags = flags;
        self.next_flag = 0;
    }

    /// Number of actions that reached the host
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn modifier_held(&self) -> bool {
        !self.modifiers.is_empty()
    }

    /// Forget held modifiers and pointer buttons; nothing is sent
    pub fn reset(&mut self) {
        self.modifiers.clear();
        self.pointer_buttons.clear();
        self.next_flag = 0;
    }

    pub fn notify(&self, notice: Notice) {
        if self.filter.allows(notice.kind) {
            self.notifier.notify(notice);
        }
    }

    /// Dispatch and turn any failure into a notice
    pub fn submit(&mut self, resolved: &ResolvedAction) -> bool {
        match self.dispatch(resolved) {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ {}", e);
                self.notify(Notice::error(e.to_string()));
                false
            }
        }
    }

    pub fn dispatch(&mut self, resolved: &ResolvedAction) -> Result<(), DispatchError> {
        let host_err = |action: &Action| {
            let label = action.label();
            move |source: anyhow::Error| DispatchError::Host {
                action: label,
                source,
            }
        };

        match (&resolved.action, resolved.phase) {
            (Action::Modifier, Phase::Press) => {
                self.modifiers.insert(resolved.source.clone());
                Ok(())
            }
            (Action::Modifier, Phase::Release) => {
                self.modifiers.remove(&resolved.source);
                Ok(())
            }
            (Action::QuickSelect(_), _) => Err(DispatchError::Unsupported(resolved.action.label())),
            (Action::Custom(custom), Phase::Press) => {
                debug!("Sending '{}' ({})", custom.name, custom.keys);
                self.host
                    .send_keys(&custom.keys)
                    .map_err(host_err(&resolved.action))?;
                self.dispatched += 1;
                Ok(())
            }
            (Action::Builtin { command, params }, phase) => {
                let sent = self
                    .builtin(&resolved.source, *command, params, phase)
                    .map_err(host_err(&resolved.action))?;
                if sent {
                    self.dispatched += 1;
                }
                Ok(())
            }
            (Action::Custom(_), Phase::Release) => Ok(()),
        }
    }

    /// Returns whether anything was sent
    fn builtin(
        &mut self,
        source: &InputRef,
        command: Command,
        params: &[Value],
        phase: Phase,
    ) -> Result<bool> {
        match (command, phase) {
            (Command::Click | Command::SecondaryClick, Phase::Press) => {
                let button = if command == Command::SecondaryClick || self.modifier_held() {
                    MouseButton::Right
                } else {
                    MouseButton::Left
                };
                self.host.pointer_button(button, true)?;
                self.pointer_buttons.insert(source.clone(), button);
                Ok(true)
            }
            (Command::Click | Command::SecondaryClick, Phase::Release) => {
                // Release the button the press used, even if modifiers changed
                match self.pointer_buttons.remove(source) {
                    Some(button) => {
                        self.host.pointer_button(button, false)?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            (_, Phase::Release) => Ok(false),
            (Command::ScrollUp | Command::ScrollDown, Phase::Press) => {
                let step = params
                    .first()
                    .and_then(Value::as_i64)
                    .unwrap_or(DEFAULT_SCROLL_STEP) as i32;
                let dy = if command == Command::ScrollUp { -step } else { step };
                self.host.scroll(0, dy)?;
                Ok(true)
            }
            (Command::Flag, Phase::Press) if params.is_empty() && !self.flags.is_empty() => {
                let flag = self.flags[self.next_flag % self.flags.len()];
                self.next_flag = (self.next_flag + 1) % self.flags.len();
                self.host.invoke(command, &[json!(flag)])?;
                Ok(true)
            }
            (_, Phase::Press) => {
                self.host.invoke(command, params)?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::{HostCall, RecordingHost};
    use super::*;

    fn dispatcher() -> (Dispatcher<RecordingHost>, CollectingNotifier) {
        let notifier = CollectingNotifier::new();
        let dispatcher = Dispatcher::new(RecordingHost::new(), Box::new(notifier.clone()));
        (dispatcher, notifier)
    }

    fn press(button: u8, action: Action) -> ResolvedAction {
        ResolvedAction::press(InputRef::Button(button), action)
    }

    fn release(button: u8, action: Action) -> ResolvedAction {
        ResolvedAction::release(InputRef::Button(button), action)
    }

    #[test]
    fn test_builtin_invokes_host() {
        let (mut d, _) = dispatcher();
        assert!(d.submit(&press(0, Action::command(Command::Undo))));
        assert!(d.submit(&release(0, Action::command(Command::Undo))));
        assert_eq!(d.host().calls(), vec![HostCall::Invoke(Command::Undo, vec![])]);
        assert_eq!(d.dispatched(), 1);
    }

    #[test]
    fn test_modifier_turns_click_secondary() {
        let (mut d, _) = dispatcher();
        let click = Action::command(Command::Click);
        d.submit(&press(4, Action::Modifier));
        d.submit(&press(10, click.clone()));
        // Modifier let go before the click: the right button is still released
        d.submit(&release(4, Action::Modifier));
        d.submit(&release(10, click.clone()));
        d.submit(&press(10, click.clone()));
        d.submit(&release(10, click));
        assert_eq!(
            d.host().calls(),
            vec![
                HostCall::Button(MouseButton::Right, true),
                HostCall::Button(MouseButton::Right, false),
                HostCall::Button(MouseButton::Left, true),
                HostCall::Button(MouseButton::Left, false),
            ]
        );
    }

    #[test]
    fn test_custom_sends_keys() {
        let (mut d, _) = dispatcher();
        d.submit(&press(2, Action::custom("Zoom", "Ctrl+=").unwrap()));
        assert_eq!(d.host().calls(), vec![HostCall::Keys("Ctrl+=".to_string())]);
    }

    #[test]
    fn test_flag_cycles_enabled_flags() {
        let (mut d, _) = dispatcher();
        d.set_flags(vec![1, 4]);
        let flag = Action::command(Command::Flag);
        for _ in 0..3 {
            d.submit(&press(1, flag.clone()));
        }
        d.submit(&press(1, Action::command_with(Command::Flag, vec![json!(0)]).unwrap()));
        assert_eq!(
            d.host().calls(),
            vec![
                HostCall::Invoke(Command::Flag, vec![json!(1)]),
                HostCall::Invoke(Command::Flag, vec![json!(4)]),
                HostCall::Invoke(Command::Flag, vec![json!(1)]),
                HostCall::Invoke(Command::Flag, vec![json!(0)]),
            ]
        );
    }

    #[test]
    fn test_scroll_commands() {
        let (mut d, _) = dispatcher();
        d.submit(&press(6, Action::command(Command::ScrollUp)));
        d.submit(&press(7, Action::command_with(Command::ScrollDown, vec![json!(40)]).unwrap()));
        assert_eq!(
            d.host().calls(),
            vec![HostCall::Scroll(0, -120), HostCall::Scroll(0, 40)]
        );
    }

    #[test]
    fn test_host_failure_becomes_notice() {
        let (mut d, notices) = dispatcher();
        d.host_mut().fail_on(Command::Sync);
        assert!(!d.submit(&press(9, Action::command(Command::Sync))));
        // Processing continues
        assert!(d.submit(&press(0, Action::command(Command::Undo))));
        let notices = notices.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Error);
        assert!(notices[0].text.contains("Sync"));
    }

    #[test]
    fn test_error_notices_can_be_muted() {
        let (mut d, notices) = dispatcher();
        d.set_filter(NoticeFilter {
            connection: true,
            errors: false,
        });
        d.host_mut().fail_on(Command::Sync);
        d.submit(&press(9, Action::command(Command::Sync)));
        assert!(notices.notices().is_empty());
    }

    #[test]
    fn test_quick_select_is_not_dispatchable() {
        let (mut d, _) = dispatcher();
        let result = d.dispatch(&press(3, Action::QuickSelect(crate::action::QuickSelectMode::Hold)));
        assert!(matches!(result, Err(DispatchError::Unsupported(_))));
        assert!(d.host().calls().is_empty());
    }
}
