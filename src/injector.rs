// injector.rs
use std::{fmt, fs, path::Path, sync::Arc};

use serde_json::Value;

use crate::{
    error::{InjectError, Result},
    input::InputEvent,
    protocol,
};

/// Substring the bundled injector returns once an event is dispatched.
pub const DEFAULT_MARKER: &str = "sent_keydown_event";

const BUNDLED_SOURCE: &str = include_str!("../assets/inject_input.js");

/// The remote injection procedure: JavaScript function source evaluated in
/// the target with one `InputEvent` argument, plus the marker it emits on
/// success.
#[derive(Clone)]
pub struct InjectorScript {
    source: Arc<str>,
    marker: String,
}

impl InjectorScript {
    pub fn bundled() -> Self {
        Self::from_source(BUNDLED_SOURCE)
    }

    pub fn from_source(source: impl AsRef<str>) -> Self {
        Self {
            source: Arc::from(source.as_ref().trim()),
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| InjectError::Script {
            path: path.to_path_buf(),
            source,
        })?;
        if source.trim().is_empty() {
            return Err(InjectError::Config(format!(
                "injector script {} is empty",
                path.display()
            )));
        }
        Ok(Self::from_source(source))
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// `Runtime.evaluate` params applying the script to `event`.
    pub fn evaluate_params(&self, event: &InputEvent) -> Result<Value> {
        let arg = serde_json::to_value(event)
            .map_err(|e| InjectError::protocol(format!("failed to encode {event}: {e}")))?;
        Ok(protocol::evaluate_params(&self.source, &arg))
    }
}

impl fmt::Debug for InjectorScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectorScript")
            .field("source_len", &self.source.len())
            .field("marker", &self.marker)
            .finish()
    }
}
