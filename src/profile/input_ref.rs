//! Input references: the left-hand side of a binding
//!
//! Written in profile files as short strings:
//!
//! | form            | meaning                                  |
//! |-----------------|------------------------------------------|
//! | `btn:3`         | button 3                                 |
//! | `hold:3`        | button 3 held past the long-press time   |
//! | `chord:4+0`     | buttons 4 and 0 held together            |
//! | `stick0:up`     | first stick in button mode, pushed up    |
//! | `hat0:up-left`  | first hat switch, diagonal               |

use crate::error::InputRefParseError;
use crate::input::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InputRef {
    Button(u8),
    LongPress(u8),
    /// Sorted, deduplicated, at least two buttons
    Chord(Vec<u8>),
    Stick { stick: u8, direction: Direction },
    Hat { hat: u8, direction: Direction },
}

impl InputRef {
    /// Build a chord, normalizing member order
    pub fn chord(buttons: impl IntoIterator<Item = u8>) -> Option<InputRef> {
        let mut members: Vec<u8> = buttons.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        (members.len() >= 2).then_some(InputRef::Chord(members))
    }

    pub fn chord_members(&self) -> Option<&[u8]> {
        match self {
            InputRef::Chord(members) => Some(members),
            _ => None,
        }
    }

    /// Buttons this reference is made of
    pub fn buttons(&self) -> Vec<u8> {
        match self {
            InputRef::Button(b) | InputRef::LongPress(b) => vec![*b],
            InputRef::Chord(members) => members.clone(),
            InputRef::Stick { .. } | InputRef::Hat { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for InputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputRef::Button(b) => write!(f, "btn:{}", b),
            InputRef::LongPress(b) => write!(f, "hold:{}", b),
            InputRef::Chord(members) => {
                let parts: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "chord:{}", parts.join("+"))
            }
            InputRef::Stick { stick, direction } => write!(f, "stick{}:{}", stick, direction),
            InputRef::Hat { hat, direction } => write!(f, "hat{}:{}", hat, direction),
        }
    }
}

impl FromStr for InputRef {
    type Err = InputRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| InputRefParseError::new(s, "expected '<kind>:<value>'"))?;
        let index = |text: &str| {
            text.trim()
                .parse::<u8>()
                .map_err(|_| InputRefParseError::new(s, format!("'{}' is not an index", text)))
        };
        let direction = |text: &str| {
            text.parse::<Direction>()
                .map_err(|e| InputRefParseError::new(s, e))
        };

        match kind {
            "btn" => Ok(InputRef::Button(index(value)?)),
            "hold" => Ok(InputRef::LongPress(index(value)?)),
            "chord" => {
                let members = value
                    .split('+')
                    .map(index)
                    .collect::<Result<Vec<_>, _>>()?;
                InputRef::chord(members)
                    .ok_or_else(|| InputRefParseError::new(s, "a chord needs two distinct buttons"))
            }
            _ if kind.starts_with("stick") => Ok(InputRef::Stick {
                stick: index(&kind["stick".len()..])?,
                direction: direction(value)?,
            }),
            _ if kind.starts_with("hat") => Ok(InputRef::Hat {
                hat: index(&kind["hat".len()..])?,
                direction: direction(value)?,
            }),
            _ => Err(InputRefParseError::new(s, format!("unknown input kind '{}'", kind))),
        }
    }
}

impl TryFrom<String> for InputRef {
    type Error = InputRefParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InputRef> for String {
    fn from(value: InputRef) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("btn:3".parse(), Ok(InputRef::Button(3)));
        assert_eq!("hold:9".parse(), Ok(InputRef::LongPress(9)));
        assert_eq!("chord:4+0".parse(), Ok(InputRef::Chord(vec![0, 4])));
        assert_eq!(
            "stick1:down-left".parse(),
            Ok(InputRef::Stick {
                stick: 1,
                direction: Direction::DownLeft
            })
        );
        assert_eq!(
            "hat0:up".parse(),
            Ok(InputRef::Hat {
                hat: 0,
                direction: Direction::Up
            })
        );
    }

    #[test]
    fn test_display_is_canonical() {
        let chord: InputRef = "chord:5+1+5".parse().unwrap();
        assert_eq!(chord.to_string(), "chord:1+5");
        assert_eq!(InputRef::LongPress(2).to_string(), "hold:2");
    }

    #[test]
    fn test_rejects_bad_refs() {
        assert!("btn".parse::<InputRef>().is_err());
        assert!("btn:300".parse::<InputRef>().is_err());
        assert!("chord:4".parse::<InputRef>().is_err());
        assert!("chord:4+4".parse::<InputRef>().is_err());
        assert!("hat0:north".parse::<InputRef>().is_err());
        assert!("wheel:1".parse::<InputRef>().is_err());
    }
}
