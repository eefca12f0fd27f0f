//! Closed catalog of host commands
//!
//! Every command the host can run has a stable kebab-case identifier, a
//! display label, the contexts it is offered in and a parameter signature.
//! Identifiers not in this table are rejected when a profile loads.

use crate::error::ActionParseError;
use crate::profile::Context;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Parameter signature of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSignature {
    /// Takes no parameters
    Fixed,
    /// Takes zero or one integer within the inclusive range
    OptionalInt { min: i64, max: i64 },
}

/// Which contexts offer a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every context, dialogs included
    Everywhere,
    /// Every context except dialogs
    Common,
    /// Global and deck browser
    Collection,
    DeckBrowser,
    /// Deck browser and overview
    DeckNavigation,
    Overview,
    /// Review, question and answer
    Review,
}

impl Scope {
    fn contains(self, context: Context) -> bool {
        use Context::*;
        match self {
            Scope::Everywhere => true,
            Scope::Common => context != Dialog,
            Scope::Collection => matches!(context, Global | DeckBrowser),
            Scope::DeckBrowser => context == DeckBrowser,
            Scope::DeckNavigation => matches!(context, DeckBrowser | Overview),
            Scope::Overview => context == Overview,
            Scope::Review => matches!(context, Review | Question | Answer),
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub command: Command,
    pub id: &'static str,
    pub label: &'static str,
    pub scope: Scope,
    pub params: ParamSignature,
}

const FIXED: ParamSignature = ParamSignature::Fixed;
const FLAG: ParamSignature = ParamSignature::OptionalInt { min: 0, max: 7 };
const PIXELS: ParamSignature = ParamSignature::OptionalInt { min: 1, max: 2000 };

macro_rules! commands {
    ($( $variant:ident => $id:literal, $label:literal, $scope:ident, $params:expr; )*) => {
        /// Built-in host command
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Command {
            $( $variant, )*
        }

        /// The full catalog, in display order
        pub static CATALOG: &[CommandInfo] = &[
            $( CommandInfo {
                command: Command::$variant,
                id: $id,
                label: $label,
                scope: Scope::$scope,
                params: $params,
            }, )*
        ];
    };
}

commands! {
    // Common
    Sync => "sync", "Sync", Common, FIXED;
    Overview => "overview", "Overview", Common, FIXED;
    Browser => "browser", "Browser", Common, FIXED;
    Statistics => "statistics", "Statistics", Common, FIXED;
    MainScreen => "main-screen", "Main Screen", Common, FIXED;
    Review => "review", "Review", Common, FIXED;
    Undo => "undo", "Undo", Everywhere, FIXED;
    Redo => "redo", "Redo", Everywhere, FIXED;
    Back => "back", "Back", Common, FIXED;
    Forward => "forward", "Forward", Common, FIXED;
    Enter => "enter", "Enter", Everywhere, FIXED;
    Fullscreen => "fullscreen", "Fullscreen", Everywhere, FIXED;
    VolumeUp => "volume-up", "Volume Up", Everywhere, FIXED;
    VolumeDown => "volume-down", "Volume Down", Everywhere, FIXED;
    Add => "add", "Add", Common, FIXED;
    Preferences => "preferences", "Preferences", Common, FIXED;
    Quit => "quit", "Quit", Everywhere, FIXED;
    HideCursor => "hide-cursor", "Hide Cursor", Everywhere, FIXED;
    Options => "options", "Options", Common, FIXED;

    // Pointer and focus
    Click => "click", "Click", Everywhere, FIXED;
    SecondaryClick => "secondary-click", "Secondary Click", Everywhere, FIXED;
    SelectNext => "select-next", "Select Next", Everywhere, FIXED;
    SelectPrevious => "select-previous", "Select Previous", Everywhere, FIXED;
    Select => "select", "Select", Everywhere, FIXED;
    SwitchWindow => "switch-window", "Switch Window", Everywhere, FIXED;
    Escape => "escape", "Escape", Everywhere, FIXED;
    Up => "up", "Up", Everywhere, FIXED;
    Down => "down", "Down", Everywhere, FIXED;
    UpBy10 => "up-by-10", "Up by 10", Everywhere, FIXED;
    DownBy10 => "down-by-10", "Down by 10", Everywhere, FIXED;
    ScrollUp => "scroll-up", "Scroll Up", Everywhere, PIXELS;
    ScrollDown => "scroll-down", "Scroll Down", Everywhere, PIXELS;

    // Deck browser
    NextDeck => "next-deck", "Next Deck", DeckNavigation, FIXED;
    PreviousDeck => "previous-deck", "Previous Deck", DeckNavigation, FIXED;
    NextDueDeck => "next-due-deck", "Next Due Deck", DeckNavigation, FIXED;
    PreviousDueDeck => "previous-due-deck", "Previous Due Deck", DeckNavigation, FIXED;
    CollapseExpand => "collapse-expand", "Collapse/Expand", DeckNavigation, FIXED;
    CheckDatabase => "check-database", "Check Database", Collection, FIXED;
    CheckMedia => "check-media", "Check Media", Collection, FIXED;
    EmptyCards => "empty-cards", "Empty Cards", Collection, FIXED;
    ManageNoteTypes => "manage-note-types", "Manage Note Types", Collection, FIXED;
    StudyDeck => "study-deck", "Study Deck", Collection, FIXED;

    // Overview
    Filter => "filter", "Filter", Overview, FIXED;
    CustomStudy => "custom-study", "Custom Study", Overview, FIXED;
    Rebuild => "rebuild", "Rebuild", Overview, FIXED;
    Empty => "empty", "Empty", Overview, FIXED;

    // Reviewer
    Again => "again", "Again", Review, FIXED;
    Hard => "hard", "Hard", Review, FIXED;
    Good => "good", "Good", Review, FIXED;
    Easy => "easy", "Easy", Review, FIXED;
    FlipCard => "flip-card", "Flip Card", Review, FIXED;
    NextCard => "next-card", "Next Card", Review, FIXED;
    SuspendCard => "suspend-card", "Suspend Card", Review, FIXED;
    SuspendNote => "suspend-note", "Suspend Note", Review, FIXED;
    BuryCard => "bury-card", "Bury Card", Review, FIXED;
    BuryNote => "bury-note", "Bury Note", Review, FIXED;
    Flag => "flag", "Flag", Review, FLAG;
    MarkNote => "mark-note", "Mark Note", Review, FIXED;
    DeleteNote => "delete-note", "Delete Note", Review, FIXED;
    RecordVoice => "record-voice", "Record Voice", Review, FIXED;
    ReplayVoice => "replay-voice", "Replay Voice", Review, FIXED;
    CardInfo => "card-info", "Card Info", Review, FIXED;
    PreviousCardInfo => "previous-card-info", "Previous Card Info", Review, FIXED;
    PauseAudio => "pause-audio", "Pause Audio", Review, FIXED;
    AudioForward => "audio-forward", "Audio +5s", Review, FIXED;
    AudioBack => "audio-back", "Audio -5s", Review, FIXED;
    ReplayAudio => "replay-audio", "Replay Audio", Review, FIXED;
    EditNote => "edit-note", "Edit Note", Review, FIXED;
    SetDueDate => "set-due-date", "Set Due Date", Review, FIXED;
}

impl Command {
    pub fn info(self) -> &'static CommandInfo {
        // CATALOG is generated in declaration order, so the discriminant indexes it
        &CATALOG[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.info().id
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn params(self) -> ParamSignature {
        self.info().params
    }

    pub fn offered_in(self, context: Context) -> bool {
        self.info().scope.contains(context)
    }

    /// Whether the command also acts on the release edge
    pub fn has_release(self) -> bool {
        matches!(self, Command::Click | Command::SecondaryClick)
    }

    /// Look up by identifier or display label, case-insensitively
    pub fn parse(name: &str) -> Result<Command, ActionParseError> {
        let name = name.trim();
        CATALOG
            .iter()
            .find(|c| c.id.eq_ignore_ascii_case(name) || c.label.eq_ignore_ascii_case(name))
            .map(|c| c.command)
            .ok_or_else(|| ActionParseError::UnknownCommand(name.to_string()))
    }

    /// Check parameters against the command's signature
    pub fn validate_params(self, params: &[Value]) -> Result<(), ActionParseError> {
        let bad = |reason: String| ActionParseError::BadParameter {
            command: self.id().to_string(),
            reason,
        };
        match self.params() {
            ParamSignature::Fixed if params.is_empty() => Ok(()),
            ParamSignature::Fixed => Err(bad(format!("takes no parameters, got {}", params.len()))),
            ParamSignature::OptionalInt { min, max } => match params {
                [] => Ok(()),
                [value] => match value.as_i64() {
                    Some(n) if (min..=max).contains(&n) => Ok(()),
                    Some(n) => Err(bad(format!("parameter {} outside {}..={}", n, min, max))),
                    None => Err(bad(format!("expects an integer, got {}", value))),
                },
                _ => Err(bad(format!("takes at most one parameter, got {}", params.len()))),
            },
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Command {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_order_matches_discriminants() {
        for (index, info) in CATALOG.iter().enumerate() {
            assert_eq!(info.command as usize, index, "{} out of order", info.id);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        for info in CATALOG {
            assert_eq!(CATALOG.iter().filter(|c| c.id == info.id).count(), 1);
        }
    }

    #[test]
    fn test_parse_id_and_label() {
        assert_eq!(Command::parse("suspend-card"), Ok(Command::SuspendCard));
        assert_eq!(Command::parse("Suspend Card"), Ok(Command::SuspendCard));
        assert_eq!(Command::parse("audio +5s"), Ok(Command::AudioForward));
        assert_eq!(
            Command::parse("launch-rocket"),
            Err(ActionParseError::UnknownCommand("launch-rocket".into()))
        );
    }

    #[test]
    fn test_param_validation() {
        assert!(Command::Undo.validate_params(&[]).is_ok());
        assert!(Command::Undo.validate_params(&[json!(1)]).is_err());
        assert!(Command::Flag.validate_params(&[]).is_ok());
        assert!(Command::Flag.validate_params(&[json!(3)]).is_ok());
        assert!(Command::Flag.validate_params(&[json!(9)]).is_err());
        assert!(Command::Flag.validate_params(&[json!("red")]).is_err());
        assert!(Command::ScrollDown.validate_params(&[json!(120)]).is_ok());
    }

    #[test]
    fn test_scope() {
        assert!(Command::Again.offered_in(Context::Answer));
        assert!(!Command::Again.offered_in(Context::DeckBrowser));
        assert!(Command::Undo.offered_in(Context::Dialog));
        assert!(!Command::Sync.offered_in(Context::Dialog));
        assert!(Command::StudyDeck.offered_in(Context::Global));
    }

    #[test]
    fn test_release_commands() {
        assert!(Command::Click.has_release());
        assert!(!Command::Undo.has_release());
    }
}
