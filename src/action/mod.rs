//! Actions bound to controller inputs
//!
//! In profile files an action is written either as a bare name
//! (`undo`, `Suspend Card`, `modifier`, `toggle-quick-select`) or as a map:
//!
//! ```yaml
//! btn:3: { command: flag, params: [2] }
//! btn:4: { custom: { name: Zoom In, keys: "Ctrl+=" } }
//! ```

pub mod command;
pub mod keys;

pub use command::{Command, CommandInfo, ParamSignature, CATALOG};
pub use keys::{KeyChord, KeySequence, Modifiers};

use crate::error::ActionParseError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How a quick-select opener behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickSelectMode {
    /// Open while held, commit on release
    Hold,
    /// Open on press, commit with confirm, close on second press
    Toggle,
}

/// User-defined command that types a key sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomCommand {
    pub name: String,
    pub keys: KeySequence,
}

/// What a binding does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ActionRepr", into = "ActionRepr")]
pub enum Action {
    Builtin { command: Command, params: Vec<Value> },
    Custom(CustomCommand),
    /// Marks the bound button as a chord modifier
    Modifier,
    QuickSelect(QuickSelectMode),
}

impl Action {
    pub fn command(command: Command) -> Self {
        Action::Builtin {
            command,
            params: Vec::new(),
        }
    }

    /// Builtin with parameters, validated against the catalog signature
    pub fn command_with(command: Command, params: Vec<Value>) -> Result<Self, ActionParseError> {
        command.validate_params(&params)?;
        Ok(Action::Builtin { command, params })
    }

    pub fn custom(name: impl Into<String>, keys: &str) -> Result<Self, ActionParseError> {
        Ok(Action::Custom(CustomCommand {
            name: name.into(),
            keys: keys.parse()?,
        }))
    }

    /// Parse a bare action name
    pub fn parse_name(name: &str) -> Result<Self, ActionParseError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "modifier" | "mod" => Ok(Action::Modifier),
            "show-quick-select" | "show quick select" => Ok(Action::QuickSelect(QuickSelectMode::Hold)),
            "toggle-quick-select" | "toggle quick select" => {
                Ok(Action::QuickSelect(QuickSelectMode::Toggle))
            }
            _ => Command::parse(name).map(Action::command),
        }
    }

    /// Whether the action does anything on the release edge
    pub fn acts_on_release(&self) -> bool {
        match self {
            Action::Builtin { command, .. } => command.has_release(),
            Action::QuickSelect(QuickSelectMode::Hold) => true,
            Action::Modifier => true,
            _ => false,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Action::Builtin { command, params } if params.is_empty() => command.label().to_string(),
            Action::Builtin { command, params } => {
                let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                format!("{} ({})", command.label(), params.join(", "))
            }
            Action::Custom(custom) => custom.name.clone(),
            Action::Modifier => "Modifier".to_string(),
            Action::QuickSelect(QuickSelectMode::Hold) => "Show Quick Select".to_string(),
            Action::QuickSelect(QuickSelectMode::Toggle) => "Toggle Quick Select".to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CustomRepr {
    name: String,
    keys: String,
}

/// Wire form of [`Action`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ActionRepr {
    Name(String),
    Command {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        params: Vec<Value>,
    },
    Custom {
        custom: CustomRepr,
    },
    QuickSelect {
        quick_select: QuickSelectMode,
    },
}

impl TryFrom<ActionRepr> for Action {
    type Error = ActionParseError;

    fn try_from(repr: ActionRepr) -> Result<Self, Self::Error> {
        match repr {
            ActionRepr::Name(name) => Action::parse_name(&name),
            ActionRepr::Command { command, params } => {
                Action::command_with(Command::parse(&command)?, params)
            }
            ActionRepr::Custom { custom } => Action::custom(custom.name, &custom.keys),
            ActionRepr::QuickSelect { quick_select } => Ok(Action::QuickSelect(quick_select)),
        }
    }
}

impl From<Action> for ActionRepr {
    fn from(action: Action) -> Self {
        match action {
            Action::Builtin { command, params } if params.is_empty() => {
                ActionRepr::Name(command.id().to_string())
            }
            Action::Builtin { command, params } => ActionRepr::Command {
                command: command.id().to_string(),
                params,
            },
            Action::Custom(custom) => ActionRepr::Custom {
                custom: CustomRepr {
                    name: custom.name,
                    keys: custom.keys.to_string(),
                },
            },
            Action::Modifier => ActionRepr::Name("modifier".to_string()),
            Action::QuickSelect(QuickSelectMode::Hold) => {
                ActionRepr::Name("show-quick-select".to_string())
            }
            Action::QuickSelect(QuickSelectMode::Toggle) => {
                ActionRepr::Name("toggle-quick-select".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_names() {
        assert_eq!(Action::parse_name("undo").unwrap(), Action::command(Command::Undo));
        assert_eq!(Action::parse_name("mod").unwrap(), Action::Modifier);
        assert_eq!(
            Action::parse_name("Show Quick Select").unwrap(),
            Action::QuickSelect(QuickSelectMode::Hold)
        );
        assert!(Action::parse_name("self-destruct").is_err());
    }

    #[test]
    fn test_yaml_forms() {
        let yaml = r#"
- good
- { command: flag, params: [2] }
- { custom: { name: Zoom, keys: "Ctrl+=" } }
- toggle-quick-select
"#;
        let actions: Vec<Action> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(actions[0], Action::command(Command::Good));
        assert_eq!(
            actions[1],
            Action::Builtin {
                command: Command::Flag,
                params: vec![json!(2)]
            }
        );
        assert!(matches!(&actions[2], Action::Custom(c) if c.name == "Zoom"));
        assert_eq!(actions[3], Action::QuickSelect(QuickSelectMode::Toggle));

        let text = serde_yaml::to_string(&actions).unwrap();
        let again: Vec<Action> = serde_yaml::from_str(&text).unwrap();
        assert_eq!(actions, again);
    }

    #[test]
    fn test_unknown_command_fails_deserialization() {
        let result: Result<Action, _> = serde_yaml::from_str("\"warp-drive\"");
        assert!(result.is_err());
        let result: Result<Action, _> = serde_yaml::from_str("{ command: undo, params: [1] }");
        assert!(result.is_err());
    }

    #[test]
    fn test_release_behaviour() {
        assert!(Action::command(Command::Click).acts_on_release());
        assert!(!Action::command(Command::Again).acts_on_release());
        assert!(Action::QuickSelect(QuickSelectMode::Hold).acts_on_release());
        assert!(!Action::QuickSelect(QuickSelectMode::Toggle).acts_on_release());
    }
}
