// session.rs
use std::{
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
    channel::EventChannel,
    composer::Macro,
    config::Config,
    error::{InjectError, Result},
    injector::InjectorScript,
    locator::Locate,
    transport::{Connect, Transport},
};

/// Default pause between acknowledged events.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub macro_name: String,
    pub events: usize,
    pub elapsed: Duration,
}

/// Plays one macro against one target, strictly in order.
///
/// Each event must be acknowledged before the next is sent, and the target UI
/// gets `settle_delay` between events. The first failure ends the session;
/// nothing is retried and later events are never sent.
#[derive(Debug, Clone)]
pub struct InjectionSession {
    injector: InjectorScript,
    read_timeout: Duration,
    settle_delay: Duration,
}

impl InjectionSession {
    pub fn new(injector: InjectorScript, read_timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            injector,
            read_timeout,
            settle_delay,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(cfg.injector()?, cfg.read_timeout, cfg.settle_delay))
    }

    /// Validate, discover, connect, play. The channel is closed on every path.
    pub fn run<L, C>(&self, script: &Macro, locator: &L, connector: &C) -> Result<SessionReport>
    where
        L: Locate + ?Sized,
        C: Connect + ?Sized,
    {
        let started = Instant::now();
        validate(script)?;

        let address = locator.locate()?;
        let transport = connector.connect(&address)?;
        let mut channel =
            EventChannel::with_transport(transport, self.injector.clone(), self.read_timeout);

        let played = self.play(script, &mut channel);
        channel.close();
        let events = played?;

        let report = SessionReport {
            macro_name: script.name().to_string(),
            events,
            elapsed: started.elapsed(),
        };
        info!(
            name = %report.macro_name,
            events = report.events,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "macro completed"
        );
        Ok(report)
    }

    /// Send every event of `script` over an already-open channel.
    pub fn play<T: Transport>(&self, script: &Macro, channel: &mut EventChannel<T>) -> Result<usize> {
        let total = script.len();
        info!(name = script.name(), total, "playing macro");

        for (index, event) in script.events().enumerate() {
            if index > 0 && !self.settle_delay.is_zero() {
                thread::sleep(self.settle_delay);
            }
            debug!(index, %event, "injecting");
            if let Err(source) = channel.inject(event) {
                warn!(index, %event, error = %source, "macro aborted");
                return Err(InjectError::Step {
                    index,
                    total,
                    event: event.to_string(),
                    source: Box::new(source),
                });
            }
        }
        Ok(total)
    }
}

/// Reject malformed events before anything is sent.
pub fn validate(script: &Macro) -> Result<()> {
    let total = script.len();
    for (index, event) in script.events().enumerate() {
        event.validate().map_err(|source| InjectError::Step {
            index,
            total,
            event: event.to_string(),
            source: Box::new(source),
        })?;
    }
    Ok(())
}
