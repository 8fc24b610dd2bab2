// lib.rs
//! Drive an Electron editor through its DevTools port: find the one
//! debuggable window, attach over websocket, and replay a macro of synthetic
//! key events, each acknowledged before the next is sent.

pub mod channel;
pub mod composer;
pub mod config;
pub mod error;
pub mod injector;
pub mod input;
pub mod locator;
pub mod logger;
pub mod protocol;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

// Public surface (root-level re-exports)
pub use crate::channel::{DEFAULT_READ_TIMEOUT, EventChannel};
pub use crate::composer::{Macro, MacroBuilder, WEB_SUFFIX, compose_message};
pub use crate::config::Config;
pub use crate::error::{DiscoveryError, InjectError, Result};
pub use crate::injector::{DEFAULT_MARKER, InjectorScript};
pub use crate::input::encode::{key, shortcut, text};
pub use crate::input::{InputEvent, Modifier};
pub use crate::locator::{
    ChannelAddress, DEFAULT_DISCOVERY_URL, HttpLocator, Locate, TargetInfo, select_target,
};
pub use crate::session::{DEFAULT_SETTLE_DELAY, InjectionSession, SessionReport};
pub use crate::transport::{Connect, Transport, WsConnector, WsTransport};

pub mod prelude {
    pub use crate::composer::{Macro, compose_message};
    pub use crate::config::Config;
    pub use crate::error::{InjectError, Result};
    pub use crate::input::encode::{key, shortcut, text};
    pub use crate::input::{InputEvent, Modifier};
    pub use crate::locator::{HttpLocator, Locate};
    pub use crate::session::InjectionSession;
    pub use crate::transport::WsConnector;
}

/// Discover, connect and play `script` with settings from `cfg`.
pub fn run_macro(cfg: &Config, script: &Macro) -> Result<SessionReport> {
    let session = InjectionSession::from_config(cfg)?;
    let locator = HttpLocator::new(&cfg.discovery_url, cfg.discovery_timeout)?;
    session.run(script, &locator, &WsConnector)
}
