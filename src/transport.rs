// transport.rs
use std::{
    net::TcpStream,
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::Instant,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use tracing::{debug, info, warn};
use websocket::{ClientBuilder, OwnedMessage, receiver::Reader, sender::Writer};

use crate::{
    error::{InjectError, Result},
    locator::ChannelAddress,
};

/// A duplex text-frame connection to one debuggable target.
pub trait Transport {
    fn send_text(&mut self, text: String) -> Result<()>;

    /// Next inbound text frame, or `Ok(None)` once `deadline` has passed.
    fn recv_text(&mut self, deadline: Instant) -> Result<Option<String>>;

    /// Release the connection. Must be safe to call more than once.
    fn close(&mut self);
}

/// Opens transports for a resolved address.
pub trait Connect {
    type Transport: Transport;

    fn connect(&self, address: &ChannelAddress) -> Result<Self::Transport>;
}

/// Production connector: plain `ws://` to the DevTools endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connect for WsConnector {
    type Transport = WsTransport;

    fn connect(&self, address: &ChannelAddress) -> Result<WsTransport> {
        WsTransport::connect(address)
    }
}

enum Frame {
    Text(String),
    Closed(String),
}

type SharedWriter = Arc<Mutex<Writer<TcpStream>>>;

/// Websocket transport. A reader thread forwards frames into a channel so the
/// caller can wait on it with a deadline.
pub struct WsTransport {
    address: ChannelAddress,
    writer: SharedWriter,
    frames: Receiver<Frame>,
    reader: Option<JoinHandle<()>>,
    closed: bool,
}

impl WsTransport {
    pub fn connect(address: &ChannelAddress) -> Result<Self> {
        info!(url = %address, "connecting to devtools websocket");

        let conn_err = |reason: String| InjectError::Connection {
            address: address.to_string(),
            reason,
        };

        let client = ClientBuilder::new(address.as_str())
            .map_err(|e| conn_err(e.to_string()))?
            .connect_insecure()
            .map_err(|e| conn_err(e.to_string()))?;
        let (reader, writer) = client.split().map_err(|e| conn_err(e.to_string()))?;
        let writer: SharedWriter = Arc::new(Mutex::new(writer));

        let (tx, rx) = unbounded::<Frame>();
        let writer_for_reader = Arc::clone(&writer);
        let join = thread::Builder::new()
            .name("devtools-reader".into())
            .spawn(move || read_loop(reader, writer_for_reader, tx))
            .map_err(|e| conn_err(format!("failed to spawn reader: {e}")))?;

        info!(url = %address, "devtools websocket connected");

        Ok(Self {
            address: address.clone(),
            writer,
            frames: rx,
            reader: Some(join),
            closed: false,
        })
    }
}

fn read_loop(
    mut reader: Reader<TcpStream>,
    writer: SharedWriter,
    tx: Sender<Frame>,
) {
    for incoming in reader.incoming_messages() {
        let frame = match incoming {
            Ok(OwnedMessage::Text(text)) => Frame::Text(text),
            Ok(OwnedMessage::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => Frame::Text(text),
                Err(_) => {
                    warn!("dropping non-utf8 binary frame");
                    continue;
                }
            },
            Ok(OwnedMessage::Ping(payload)) => {
                if let Ok(mut w) = writer.lock() {
                    let _ = w.send_message(&OwnedMessage::Pong(payload));
                }
                continue;
            }
            Ok(OwnedMessage::Pong(_)) => continue,
            Ok(OwnedMessage::Close(data)) => {
                let reason = data
                    .map(|d| format!("closed by remote ({}) {}", d.status_code, d.reason))
                    .unwrap_or_else(|| "closed by remote".to_string());
                let _ = tx.send(Frame::Closed(reason));
                break;
            }
            Err(e) => {
                let _ = tx.send(Frame::Closed(format!("read failed: {e}")));
                break;
            }
        };
        if tx.send(frame).is_err() {
            break;
        }
    }
    debug!("devtools reader stopped");
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: String) -> Result<()> {
        if self.closed {
            return Err(InjectError::protocol("transport already closed"));
        }
        let mut w = self
            .writer
            .lock()
            .map_err(|_| InjectError::protocol("writer mutex poisoned"))?;
        w.send_message(&OwnedMessage::Text(text))
            .map_err(|e| InjectError::protocol(format!("websocket send failed: {e}")))
    }

    fn recv_text(&mut self, deadline: Instant) -> Result<Option<String>> {
        match self.frames.recv_deadline(deadline) {
            Ok(Frame::Text(text)) => Ok(Some(text)),
            Ok(Frame::Closed(reason)) => Err(InjectError::protocol(format!(
                "connection to {} lost: {reason}",
                self.address
            ))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(InjectError::protocol("websocket reader is gone"))
            }
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Ok(mut w) = self.writer.lock() {
            let _ = w.send_message(&OwnedMessage::Close(None));
            // Unblocks the reader thread.
            let _ = w.shutdown_all();
        }
        if let Some(join) = self.reader.take() {
            let _ = join.join();
        }
        info!(url = %self.address, "devtools websocket closed");
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
    }
}
