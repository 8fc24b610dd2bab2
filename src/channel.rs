// channel.rs
use std::{
    fmt,
    time::{Duration, Instant},
};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::{
    error::{InjectError, Result},
    injector::InjectorScript,
    input::InputEvent,
    locator::ChannelAddress,
    protocol::{self, Inbound, Request},
    transport::{Transport, WsTransport},
};

/// Default per-call read deadline.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

const ID_BASE_RANGE: u64 = 1_000_000;

/// Random starting id in `1..=1_000_000`, so independent runs attached to the
/// same target do not reuse each other's ids.
fn random_id_base() -> u64 {
    rand::random_range(1..=ID_BASE_RANGE)
}

fn truncate_for_log(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// One request/response channel to a debuggable target.
///
/// Owns the transport, the id counter and the `Runtime.enable` handshake
/// flag. Only one request is in flight at a time. The transport is closed on
/// `close()` or drop, whichever comes first.
pub struct EventChannel<T: Transport> {
    transport: Option<T>,
    injector: InjectorScript,
    read_timeout: Duration,
    next_id: u64,
    runtime_enabled: bool,
}

impl EventChannel<WsTransport> {
    pub fn open(
        address: &ChannelAddress,
        injector: InjectorScript,
        read_timeout: Duration,
    ) -> Result<Self> {
        let transport = WsTransport::connect(address)?;
        Ok(Self::with_transport(transport, injector, read_timeout))
    }
}

impl<T: Transport> EventChannel<T> {
    pub fn with_transport(transport: T, injector: InjectorScript, read_timeout: Duration) -> Self {
        Self {
            transport: Some(transport),
            injector,
            read_timeout,
            next_id: random_id_base(),
            runtime_enabled: false,
        }
    }

    /// Override the random id base.
    pub fn starting_at(mut self, id: u64) -> Self {
        self.next_id = id;
        self
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    pub fn runtime_enabled(&self) -> bool {
        self.runtime_enabled
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn send(&mut self, req: &Request) -> Result<()> {
        let text = protocol::serialize_request(req)
            .map_err(|e| InjectError::protocol(format!("failed to serialize request: {e}")))?;
        debug!(id = req.id, method = %req.method, "sending request");
        self.transport
            .as_mut()
            .ok_or_else(|| InjectError::protocol("channel is closed"))?
            .send_text(text)
    }

    /// Sends `Runtime.enable` the first time through. Its ack is not awaited;
    /// it shows up as an unrelated frame during the next call.
    fn ensure_runtime_enabled(&mut self) -> Result<()> {
        if self.runtime_enabled {
            return Ok(());
        }
        let id = self.allocate_id();
        self.send(&Request::new(id, protocol::RUNTIME_ENABLE, None))?;
        self.runtime_enabled = true;
        Ok(())
    }

    /// Send one request and wait for its acknowledgment.
    ///
    /// Succeeds on a frame for this id carrying the injector's completion
    /// marker (or an id-less frame carrying it). Fails on any `error` frame,
    /// on our own response without the marker, or when the read deadline
    /// passes. Every other frame is skipped.
    pub fn call(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        self.ensure_runtime_enabled()?;

        let id = self.allocate_id();
        self.send(&Request::new(id, method, params))?;

        let deadline = Instant::now() + self.read_timeout;
        loop {
            let transport = self
                .transport
                .as_mut()
                .ok_or_else(|| InjectError::protocol("channel is closed"))?;
            let Some(text) = transport.recv_text(deadline)? else {
                warn!(id, method, "no acknowledgment before deadline");
                return Err(InjectError::Timeout {
                    method: method.to_string(),
                    after: self.read_timeout,
                });
            };

            match protocol::classify(&text, id, self.injector.marker()) {
                Inbound::Completed(result) => {
                    debug!(id, method, "acknowledged");
                    return Ok(result);
                }
                Inbound::Error(payload) => {
                    warn!(id, method, %payload, "remote reported an error");
                    return Err(InjectError::Remote { payload });
                }
                Inbound::Rejected(result) => {
                    warn!(id, method, %result, "injection not confirmed");
                    return Err(InjectError::Rejected { result });
                }
                Inbound::Noise => {
                    trace!(id, frame = truncate_for_log(&text, 512), "skipping unrelated frame");
                }
            }
        }
    }

    /// Evaluate the injector against one event in the target.
    pub fn inject(&mut self, event: &InputEvent) -> Result<Value> {
        let params = self.injector.evaluate_params(event)?;
        self.call(protocol::RUNTIME_EVALUATE, Some(params))
    }

    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}

impl<T: Transport> Drop for EventChannel<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Transport> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("open", &self.is_open())
            .field("next_id", &self.next_id)
            .field("runtime_enabled", &self.runtime_enabled)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}
