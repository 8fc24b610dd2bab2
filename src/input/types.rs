use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{InjectError, Result};

/// Electron accelerator modifier names understood by `sendInputEvent`.
///
/// Encoders take plain strings, so names outside this table still pass
/// through untouched; the remote side decides whether they are legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum Modifier {
    #[strum(serialize = "Command")]
    Command,
    #[strum(serialize = "Control")]
    Control,
    #[strum(serialize = "CommandOrControl")]
    CommandOrControl,
    #[strum(serialize = "Alt")]
    Alt,
    #[strum(serialize = "Option")]
    OptionKey,
    #[strum(serialize = "AltGr")]
    AltGr,
    #[strum(serialize = "Shift")]
    Shift,
    #[strum(serialize = "Super")]
    Super,
    /// Lowercase on purpose: this is the spelling Electron matches for the Meta key.
    #[strum(serialize = "meta")]
    Meta,
}

impl Modifier {
    pub const CMD: Modifier = Modifier::Command;
    pub const CTRL: Modifier = Modifier::Control;
    pub const CMD_OR_CTRL: Modifier = Modifier::CommandOrControl;
    pub const SHIFT: Modifier = Modifier::Shift;
    pub const ALT: Modifier = Modifier::Alt;
    pub const OPTION: Modifier = Modifier::OptionKey;
    pub const META: Modifier = Modifier::Meta;
}

impl From<Modifier> for String {
    fn from(m: Modifier) -> Self {
        m.as_ref().to_string()
    }
}

/// Primitive event handed to the remote injection procedure, one per call.
///
/// Wire shape:
/// - `{"type":"keyDown","key":"P","modifiers":["Shift","meta"]}`
/// - `{"type":"char","text":"a","key":"a"}`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputEvent {
    #[serde(rename = "keyDown")]
    KeyDown {
        key: String,
        #[serde(default)]
        modifiers: BTreeSet<String>,
    },
    #[serde(rename = "char")]
    Char { text: String, key: String },
}

impl InputEvent {
    pub fn key_down<I, S>(key: impl Into<String>, modifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InputEvent::KeyDown {
            key: key.into(),
            modifiers: modifiers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn char(c: char) -> Self {
        InputEvent::Char {
            text: c.to_string(),
            key: c.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            InputEvent::KeyDown { key, .. } | InputEvent::Char { key, .. } => key,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InputEvent::KeyDown { .. } => "keyDown",
            InputEvent::Char { .. } => "char",
        }
    }

    /// Checks the shape the injection procedure relies on.
    pub fn validate(&self) -> Result<()> {
        match self {
            InputEvent::KeyDown { key, .. } => {
                if key.is_empty() {
                    return Err(InjectError::validation("keyDown event without a key"));
                }
            }
            InputEvent::Char { text, key } => {
                let mut chars = text.chars();
                if chars.next().is_none() || chars.next().is_some() {
                    return Err(InjectError::validation(format!(
                        "char event must carry exactly one character, got {text:?}"
                    )));
                }
                if text != key {
                    return Err(InjectError::validation(format!(
                        "char event text {text:?} does not match key {key:?}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputEvent::KeyDown { key, modifiers } if modifiers.is_empty() => {
                write!(f, "keyDown {key}")
            }
            InputEvent::KeyDown { key, modifiers } => {
                let mods: Vec<&str> = modifiers.iter().map(String::as_str).collect();
                write!(f, "keyDown {}+{key}", mods.join("+"))
            }
            InputEvent::Char { text, .. } => write!(f, "char {text:?}"),
        }
    }
}
