//! In-memory transport used by unit tests.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

use serde_json::{Value, json};

use crate::{
    error::{InjectError, Result},
    injector::DEFAULT_MARKER,
    locator::ChannelAddress,
    transport::{Connect, Transport},
};

/// How the fake target answers one `Runtime.evaluate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ack,
    NoiseThenAck,
    Error,
    Reject,
    Silent,
}

fn frames_for(reply: Reply, id: u64) -> Vec<String> {
    let ack = json!({"id": id, "result": {"result": {"type": "string", "value": DEFAULT_MARKER}}});
    match reply {
        Reply::Ack => vec![ack.to_string()],
        Reply::NoiseThenAck => vec![
            json!({"method": "Runtime.consoleAPICalled", "params": {"type": "clear", "args": []}})
                .to_string(),
            json!({"id": id + 10_000, "result": {}}).to_string(),
            "<<garbage>>".to_string(),
            ack.to_string(),
        ],
        Reply::Error => vec![
            json!({"id": id, "error": {"code": -32000, "message": "Execution context was destroyed."}})
                .to_string(),
        ],
        Reply::Reject => vec![
            json!({"id": id, "result": {"result": {"type": "string", "value": "no BrowserWindow available"}}})
                .to_string(),
        ],
        Reply::Silent => vec![],
    }
}

/// Shared view of what a `ScriptedTransport` saw.
#[derive(Clone, Default)]
pub struct Recorder {
    sent: Arc<Mutex<Vec<Value>>>,
    closes: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|m| m["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.sent().iter().filter_map(|m| m["id"].as_u64()).collect()
    }

    /// Decoded `InputEvent` arguments of every evaluate request, in order.
    pub fn injected(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .filter(|m| m["method"] == "Runtime.evaluate")
            .map(|m| {
                let expr = m["params"]["expression"].as_str().unwrap_or_default();
                let start = expr.rfind(")(").map(|i| i + 2).unwrap_or(0);
                let arg = expr[start..].trim_end_matches(')');
                serde_json::from_str(arg).unwrap_or(Value::Null)
            })
            .collect()
    }

    pub fn evaluate_count(&self) -> usize {
        self.methods().iter().filter(|m| *m == "Runtime.evaluate").count()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Answers each evaluate with the next scripted `Reply` (then `Ack` once the
/// script runs out). A silent reply times out immediately instead of waiting.
pub struct ScriptedTransport {
    replies: VecDeque<Reply>,
    pending: VecDeque<String>,
    recorder: Recorder,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> (Self, Recorder) {
        let recorder = Recorder::default();
        let transport = Self {
            replies: replies.into(),
            pending: VecDeque::new(),
            recorder: recorder.clone(),
        };
        (transport, recorder)
    }
}

impl Transport for ScriptedTransport {
    fn send_text(&mut self, text: String) -> Result<()> {
        let msg: Value = serde_json::from_str(&text)
            .map_err(|e| InjectError::protocol(format!("bad request json: {e}")))?;
        let id = msg["id"].as_u64().unwrap_or_default();
        match msg["method"].as_str() {
            Some("Runtime.enable") => self.pending.push_back(json!({"id": id, "result": {}}).to_string()),
            Some("Runtime.evaluate") => {
                let reply = self.replies.pop_front().unwrap_or(Reply::Ack);
                self.pending.extend(frames_for(reply, id));
            }
            _ => {}
        }
        self.recorder.sent.lock().unwrap().push(msg);
        Ok(())
    }

    fn recv_text(&mut self, _deadline: Instant) -> Result<Option<String>> {
        Ok(self.pending.pop_front())
    }

    fn close(&mut self) {
        self.recorder.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out one prepared transport and counts connection attempts.
pub struct ScriptedConnector {
    transport: RefCell<Option<ScriptedTransport>>,
    attempts: Cell<usize>,
}

impl ScriptedConnector {
    pub fn new(replies: Vec<Reply>) -> (Self, Recorder) {
        let (transport, recorder) = ScriptedTransport::new(replies);
        let connector = Self {
            transport: RefCell::new(Some(transport)),
            attempts: Cell::new(0),
        };
        (connector, recorder)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }
}

impl Connect for ScriptedConnector {
    type Transport = ScriptedTransport;

    fn connect(&self, address: &ChannelAddress) -> Result<ScriptedTransport> {
        self.attempts.set(self.attempts.get() + 1);
        self.transport
            .borrow_mut()
            .take()
            .ok_or_else(|| InjectError::Connection {
                address: address.to_string(),
                reason: "scripted transport already used".into(),
            })
    }
}
