//! Semantic input -> primitive events. Pure functions, no hidden state.

use super::InputEvent;

/// One keyDown for `key` with every modifier held.
#[inline]
pub fn shortcut<I, S>(mods: I, key: impl Into<String>) -> Vec<InputEvent>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    vec![InputEvent::key_down(key, mods)]
}

#[inline]
pub fn key(key: impl Into<String>) -> Vec<InputEvent> {
    shortcut(Vec::<String>::new(), key)
}

/// One char event per character, in order, whitespace and punctuation included.
#[inline]
pub fn text(s: &str) -> Vec<InputEvent> {
    s.chars().map(InputEvent::char).collect()
}
