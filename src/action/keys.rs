//! Key sequences simulated by custom commands
//!
//! Format: chords separated by commas, each chord `Mod+Mod+Key`, e.g.
//! `Ctrl+Shift+Z` or `Ctrl+K, Ctrl+C`. At most four chords.

use crate::error::ActionParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_CHORDS: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    fn set(&mut self, name: &str) -> bool {
        match name.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => self.ctrl = true,
            "alt" | "option" => self.alt = true,
            "shift" => self.shift = true,
            "meta" | "cmd" | "command" | "super" | "win" => self.meta = true,
            _ => return false,
        }
        true
    }
}

/// One key with its held modifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub modifiers: Modifiers,
    pub key: String,
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (on, name) in [(m.ctrl, "Ctrl"), (m.alt, "Alt"), (m.shift, "Shift"), (m.meta, "Meta")] {
            if on {
                write!(f, "{}+", name)?;
            }
        }
        f.write_str(&self.key)
    }
}

impl FromStr for KeyChord {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ActionParseError::BadKeySequence(s.trim().to_string());
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();

        // "Ctrl++" names the plus key itself
        let (mods, key) = match parts.as_slice() {
            [rest @ .., "", ""] if !rest.is_empty() => (rest, "+".to_string()),
            [rest @ .., key] => (rest, key.to_string()),
            [] => return Err(bad()),
        };
        if key.is_empty() {
            return Err(bad());
        }

        let mut modifiers = Modifiers::default();
        for name in mods {
            if !modifiers.set(name) {
                return Err(bad());
            }
        }

        // Single letters are stored uppercase so "ctrl+z" equals "Ctrl+Z"
        let key = if key.chars().count() == 1 {
            key.to_uppercase()
        } else {
            key
        };
        Ok(KeyChord { modifiers, key })
    }
}

/// Ordered chords a custom command types into the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeySequence {
    chords: Vec<KeyChord>,
}

impl KeySequence {
    pub fn chords(&self) -> &[KeyChord] {
        &self.chords
    }
}

impl FromStr for KeySequence {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ActionParseError::BadKeySequence(s.to_string()));
        }
        let chords = s
            .split(',')
            .map(str::parse::<KeyChord>)
            .collect::<Result<Vec<_>, _>>()?;
        if chords.len() > MAX_CHORDS {
            return Err(ActionParseError::BadKeySequence(s.to_string()));
        }
        Ok(KeySequence { chords })
    }
}

impl TryFrom<String> for KeySequence {
    type Error = ActionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeySequence> for String {
    fn from(value: KeySequence) -> Self {
        value.to_string()
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.chords.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", chord)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_chord() {
        let seq: KeySequence = "ctrl+shift+z".parse().unwrap();
        assert_eq!(seq.chords().len(), 1);
        let chord = &seq.chords()[0];
        assert!(chord.modifiers.ctrl && chord.modifiers.shift && !chord.modifiers.alt);
        assert_eq!(chord.key, "Z");
        assert_eq!(seq.to_string(), "Ctrl+Shift+Z");
    }

    #[test]
    fn test_parse_multi_chord_and_named_keys() {
        let seq: KeySequence = "Ctrl+K, Escape".parse().unwrap();
        assert_eq!(seq.chords().len(), 2);
        assert_eq!(seq.chords()[1].key, "Escape");
        assert_eq!(seq.to_string(), "Ctrl+K, Escape");
    }

    #[test]
    fn test_plus_key() {
        let seq: KeySequence = "Ctrl++".parse().unwrap();
        assert_eq!(seq.chords()[0].key, "+");
        assert!(seq.chords()[0].modifiers.ctrl);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("".parse::<KeySequence>().is_err());
        assert!("Hyper+Q".parse::<KeySequence>().is_err());
        assert!("Ctrl+".parse::<KeySequence>().is_err());
        assert!("A, B, C, D, E".parse::<KeySequence>().is_err());
    }
}
