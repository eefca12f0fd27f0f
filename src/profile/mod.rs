//! Profiles: named binding sets for one device model

pub mod defaults;
pub mod input_ref;
pub mod record;
pub mod store;
pub mod table;

pub use input_ref::InputRef;
pub use record::ProfileRecord;
pub use store::{sanitize_profile_name, ProfileStore};
pub use table::{BindingTable, CompiledProfile, TableHandle};

use crate::action::Action;
use crate::device::{find_model, generic_model_name, DeviceModel};
use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Most entries a quick-select menu shows
pub const MAX_QUICK_SELECT_ENTRIES: usize = 8;

/// Application mode with its own binding set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Context {
    /// Fallback consulted when the active context has no binding
    #[serde(alias = "all")]
    Global,
    #[serde(alias = "deckBrowser")]
    DeckBrowser,
    Overview,
    Review,
    Question,
    Answer,
    Dialog,
}

impl Context {
    pub const ALL: [Context; 7] = [
        Context::Global,
        Context::DeckBrowser,
        Context::Overview,
        Context::Review,
        Context::Question,
        Context::Answer,
        Context::Dialog,
    ];

    /// Identifier used in profile files
    pub fn id(self) -> &'static str {
        match self {
            Context::Global => "global",
            Context::DeckBrowser => "deck-browser",
            Context::Overview => "overview",
            Context::Review => "review",
            Context::Question => "question",
            Context::Answer => "answer",
            Context::Dialog => "dialog",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Context::Global => "Default",
            Context::DeckBrowser => "Deck Browser",
            Context::Overview => "Overview",
            Context::Review => "Review",
            Context::Question => "Question",
            Context::Answer => "Answer",
            Context::Dialog => "Dialogs",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Context {
    type Err = String;

    /// Accepts the kebab-case id or the display label
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '_'], "-");
        Context::ALL
            .into_iter()
            .find(|c| c.id() == wanted || c.label().to_lowercase().replace(' ', "-") == wanted)
            .ok_or_else(|| format!("unknown context '{}'", s))
    }
}

/// What an analog axis drives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisRole {
    /// Quantized into directional button events
    Buttons,
    CursorHorizontal,
    CursorVertical,
    ScrollHorizontal,
    ScrollVertical,
    #[default]
    Unassigned,
}

fn default_deadzone() -> f32 {
    0.1
}
fn default_cursor_speed() -> f32 {
    1200.0
}
fn default_cursor_acceleration() -> f32 {
    2.0
}
fn default_scroll_speed() -> f32 {
    800.0
}
fn default_stick_zones() -> u8 {
    8
}

/// Analog settings stored with a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSettings {
    #[serde(default)]
    pub roles: BTreeMap<u8, AxisRole>,
    #[serde(default)]
    pub inverted: BTreeSet<u8>,
    #[serde(default = "default_deadzone")]
    pub deadzone: f32,
    /// Cursor speed at full deflection, pixels per second
    #[serde(default = "default_cursor_speed")]
    pub cursor_speed: f32,
    /// Exponent applied to the deflection past the deadzone
    #[serde(default = "default_cursor_acceleration")]
    pub cursor_acceleration: f32,
    /// Scroll speed at full deflection, pixels per second
    #[serde(default = "default_scroll_speed")]
    pub scroll_speed: f32,
    /// 4 or 8 directional zones for sticks in button mode
    #[serde(default = "default_stick_zones")]
    pub stick_zones: u8,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            roles: BTreeMap::new(),
            inverted: BTreeSet::new(),
            deadzone: default_deadzone(),
            cursor_speed: default_cursor_speed(),
            cursor_acceleration: default_cursor_acceleration(),
            scroll_speed: default_scroll_speed(),
            stick_zones: default_stick_zones(),
        }
    }
}

impl AxisSettings {
    pub fn role(&self, axis: u8) -> AxisRole {
        self.roles.get(&axis).copied().unwrap_or_default()
    }

    pub fn is_inverted(&self, axis: u8) -> bool {
        self.inverted.contains(&axis)
    }

    fn validate(&self, name: &str) -> Result<(), ProfileError> {
        let corrupt = |reason: String| ProfileError::Corrupt {
            name: name.to_string(),
            reason,
        };
        if !(0.0..1.0).contains(&self.deadzone) {
            return Err(corrupt(format!("deadzone {} outside [0, 1)", self.deadzone)));
        }
        if self.stick_zones != 4 && self.stick_zones != 8 {
            return Err(corrupt(format!("stick_zones must be 4 or 8, got {}", self.stick_zones)));
        }
        if self.cursor_speed <= 0.0 || self.scroll_speed <= 0.0 || self.cursor_acceleration <= 0.0 {
            return Err(corrupt("cursor and scroll speeds must be positive".to_string()));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

/// Quick-select menu behaviour and entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickSelectSettings {
    #[serde(default = "default_true")]
    pub select_with_stick: bool,
    #[serde(default = "default_true")]
    pub select_with_dpad: bool,
    /// Hold mode: releasing the opener dispatches the selection
    #[serde(default = "default_true")]
    pub commit_on_release: bool,
    /// Pressing the stick confirms, in addition to the confirm button
    #[serde(default)]
    pub commit_on_stick_press: bool,
    #[serde(default)]
    pub confirm_button: u8,
    /// Stick used for radial selection
    #[serde(default)]
    pub stick: u8,
    #[serde(default)]
    pub entries: BTreeMap<Context, Vec<Action>>,
}

impl Default for QuickSelectSettings {
    fn default() -> Self {
        Self {
            select_with_stick: true,
            select_with_dpad: true,
            commit_on_release: true,
            commit_on_stick_press: false,
            confirm_button: 0,
            stick: 0,
            entries: BTreeMap::new(),
        }
    }
}

impl QuickSelectSettings {
    /// Entries offered in a context, falling back to the global list
    pub fn entries_for(&self, context: Context) -> &[Action] {
        self.entries
            .get(&context)
            .filter(|e| !e.is_empty())
            .or_else(|| self.entries.get(&Context::Global))
            .map(|e| &e[..e.len().min(MAX_QUICK_SELECT_ENTRIES)])
            .unwrap_or(&[])
    }
}

/// Declared layout the profile was made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSize {
    pub buttons: usize,
    pub axes: usize,
}

/// Named binding set for one device model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Device model name this profile was made for
    pub device: String,
    pub size: ProfileSize,
    #[serde(default)]
    pub bindings: BTreeMap<Context, BTreeMap<InputRef, Action>>,
    #[serde(default)]
    pub axes: AxisSettings,
    #[serde(default)]
    pub quick_select: QuickSelectSettings,
}

impl Profile {
    pub fn new(name: impl Into<String>, model: &DeviceModel) -> Self {
        Self {
            name: name.into(),
            device: model.name.clone(),
            size: ProfileSize {
                buttons: model.button_count(),
                axes: model.axes,
            },
            bindings: BTreeMap::new(),
            axes: AxisSettings::default(),
            quick_select: QuickSelectSettings::default(),
        }
    }

    /// Binding for an input, consulting the context then the global set
    pub fn get(&self, context: Context, input: &InputRef) -> Option<&Action> {
        self.bindings
            .get(&context)
            .and_then(|b| b.get(input))
            .or_else(|| self.bindings.get(&Context::Global).and_then(|b| b.get(input)))
    }

    /// Set or clear one binding; clearing a context binding lets the
    /// global binding show through
    pub fn update_binding(&mut self, context: Context, input: InputRef, action: Option<Action>) {
        match action {
            Some(action) => {
                self.bindings.entry(context).or_default().insert(input, action);
            }
            None => {
                if let Some(bindings) = self.bindings.get_mut(&context) {
                    bindings.remove(&input);
                    if bindings.is_empty() {
                        self.bindings.remove(&context);
                    }
                }
            }
        }
    }

    pub fn bind(mut self, context: Context, input: InputRef, action: Action) -> Self {
        self.update_binding(context, input, Some(action));
        self
    }

    /// Resolve the device model this profile targets
    ///
    /// Known model names come from the static tables; generic names are
    /// rebuilt from the declared size. Anything else makes the profile inert.
    pub fn model(&self) -> Result<Arc<DeviceModel>, ProfileError> {
        if let Some(model) = find_model(&self.device) {
            return Ok(model);
        }
        if self.device == generic_model_name(self.size.buttons, self.size.axes) {
            return Ok(Arc::new(DeviceModel::generic(self.size.buttons, self.size.axes, 0)));
        }
        Err(ProfileError::UnknownModel {
            profile: self.name.clone(),
            model: self.device.clone(),
        })
    }

    /// Orphaned profiles stay on disk but are never activated
    pub fn is_inert(&self) -> bool {
        self.model().is_err()
    }

    /// Structural checks run on load and save
    pub fn validate(&mut self) -> Result<(), ProfileError> {
        let corrupt = |reason: String| ProfileError::Corrupt {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(corrupt("empty name".to_string()));
        }
        if self.device.trim().is_empty() {
            return Err(corrupt("missing device".to_string()));
        }
        self.axes.validate(&self.name)?;

        for (context, entries) in &self.quick_select.entries {
            if let Some(bad) = entries
                .iter()
                .find(|a| matches!(a, Action::Modifier | Action::QuickSelect(_)))
            {
                return Err(corrupt(format!(
                    "quick-select entry '{}' in {} cannot be a menu or modifier action",
                    bad, context
                )));
            }
        }

        let name = self.name.clone();
        for (context, entries) in self.quick_select.entries.iter_mut() {
            if entries.len() > MAX_QUICK_SELECT_ENTRIES {
                warn!(
                    "Profile '{}': {} quick-select entries for {}, keeping the first {}",
                    name,
                    entries.len(),
                    context,
                    MAX_QUICK_SELECT_ENTRIES
                );
                entries.truncate(MAX_QUICK_SELECT_ENTRIES);
            }
        }

        for (context, bindings) in &self.bindings {
            for (input, action) in bindings {
                if let Action::Builtin { command, .. } = action {
                    if !command.offered_in(*context) {
                        warn!(
                            "Profile '{}': {} bound to '{}' is not offered in {}",
                            self.name, input, command, context
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Command;

    fn sample() -> Profile {
        Profile::new("Test", &DeviceModel::generic(16, 4, 0))
            .bind(Context::Global, InputRef::Button(0), Action::command(Command::Enter))
            .bind(Context::DeckBrowser, InputRef::Button(0), Action::command(Command::Select))
    }

    #[test]
    fn test_context_falls_back_to_global() {
        let profile = sample();
        assert_eq!(
            profile.get(Context::DeckBrowser, &InputRef::Button(0)),
            Some(&Action::command(Command::Select))
        );
        assert_eq!(
            profile.get(Context::Review, &InputRef::Button(0)),
            Some(&Action::command(Command::Enter))
        );
        assert_eq!(profile.get(Context::Global, &InputRef::Button(50)), None);
    }

    #[test]
    fn test_context_parse() {
        assert_eq!("deck-browser".parse::<Context>(), Ok(Context::DeckBrowser));
        assert_eq!("Deck Browser".parse::<Context>(), Ok(Context::DeckBrowser));
        assert_eq!("default".parse::<Context>(), Ok(Context::Global));
        assert!("lobby".parse::<Context>().is_err());
        for context in Context::ALL {
            let yaml = serde_yaml::to_string(&context).unwrap();
            assert_eq!(yaml.trim(), context.id());
        }
    }

    #[test]
    fn test_clearing_context_binding_reveals_global() {
        let mut profile = sample();
        profile.update_binding(Context::Global, InputRef::Button(0), Some(Action::command(Command::Sync)));
        profile.update_binding(Context::DeckBrowser, InputRef::Button(0), None);
        assert_eq!(
            profile.get(Context::DeckBrowser, &InputRef::Button(0)),
            Some(&Action::command(Command::Sync))
        );
        assert!(!profile.bindings.contains_key(&Context::DeckBrowser));
    }

    #[test]
    fn test_generic_model_resolves_from_size() {
        let profile = sample();
        let model = profile.model().unwrap();
        assert!(model.generic);
        assert_eq!(model.button_count(), 16);
    }

    #[test]
    fn test_orphaned_profile_is_inert() {
        let mut profile = sample();
        profile.device = "Retired Prototype Pad".to_string();
        assert!(profile.is_inert());
        assert!(matches!(profile.model(), Err(ProfileError::UnknownModel { .. })));
    }

    #[test]
    fn test_validate_truncates_quick_select() {
        let mut profile = sample();
        profile
            .quick_select
            .entries
            .insert(Context::Review, vec![Action::command(Command::Undo); 11]);
        profile.validate().unwrap();
        assert_eq!(profile.quick_select.entries[&Context::Review].len(), 8);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut profile = sample();
        profile.axes.stick_zones = 6;
        assert!(matches!(profile.validate(), Err(ProfileError::Corrupt { .. })));

        let mut profile = sample();
        profile
            .quick_select
            .entries
            .insert(Context::Review, vec![Action::Modifier]);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_quick_select_entries_fall_back_to_global() {
        let mut settings = QuickSelectSettings::default();
        settings
            .entries
            .insert(Context::Global, vec![Action::command(Command::Sync)]);
        assert_eq!(settings.entries_for(Context::Review).len(), 1);
        assert!(QuickSelectSettings::default().entries_for(Context::Review).is_empty());
    }

    #[test]
    fn test_context_aliases() {
        let context: Context = serde_yaml::from_str("deckBrowser").unwrap();
        assert_eq!(context, Context::DeckBrowser);
        let context: Context = serde_yaml::from_str("all").unwrap();
        assert_eq!(context, Context::Global);
        assert_eq!(serde_yaml::to_string(&Context::DeckBrowser).unwrap().trim(), "deck-browser");
    }
}
