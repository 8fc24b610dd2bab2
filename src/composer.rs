// composer.rs
//! Named input scripts. The default one drives the editor's AI composer.

use crate::input::{
    InputEvent, Modifier,
    encode::{key, shortcut, text},
};

/// Tag appended in web mode so the composer pulls in web search.
pub const WEB_SUFFIX: &str = " @Web";

/// An ordered, immutable script of input groups. Each group is what one
/// semantic action expands to; execution flattens them in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    name: String,
    groups: Vec<Vec<InputEvent>>,
}

impl Macro {
    pub fn builder(name: impl Into<String>) -> MacroBuilder {
        MacroBuilder {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &[Vec<InputEvent>] {
        &self.groups
    }

    /// Flattened event stream in execution order.
    pub fn events(&self) -> impl Iterator<Item = &InputEvent> {
        self.groups.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct MacroBuilder {
    name: String,
    groups: Vec<Vec<InputEvent>>,
}

impl MacroBuilder {
    pub fn push(mut self, group: Vec<InputEvent>) -> Self {
        self.groups.push(group);
        self
    }

    pub fn push_if(self, cond: bool, group: Vec<InputEvent>) -> Self {
        if cond { self.push(group) } else { self }
    }

    pub fn build(self) -> Macro {
        Macro {
            name: self.name,
            groups: self.groups,
        }
    }
}

/// Open the composer, type `message`, and send it.
///
/// `Shift+meta+P` first drops focus from any open chat input. The open
/// shortcut goes out twice because a single press toggles when the panel is
/// already up. With `web` set, `" @Web"` is typed and confirmed before the
/// final Enter.
pub fn compose_message(message: &str, web: bool) -> Macro {
    let chord = [Modifier::META, Modifier::SHIFT];
    Macro::builder(if web { "send-message-web" } else { "send-message" })
        .push(shortcut(chord, "P"))
        .push(shortcut(chord, "Y"))
        .push(shortcut(chord, "Y"))
        .push(text(message))
        .push_if(web, text(WEB_SUFFIX))
        .push_if(web, key("Enter"))
        .push(key("Enter"))
        .build()
}
