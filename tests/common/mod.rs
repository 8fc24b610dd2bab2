//! Fake DevTools endpoints for integration tests.
#![allow(dead_code)]

use std::{
    io::{Read, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, unbounded};
use serde_json::{Value, json};
use websocket::{OwnedMessage, sync::Server};

pub const MARKER: &str = "sent_keydown_event";

/// Serve exactly one HTTP response on a loopback port. Returns the
/// `/json/list` URL.
pub fn serve_http_once(status: &str, body: String) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let status = status.to_string();
    let handle = thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut req = Vec::new();
        let mut buf = [0u8; 1024];
        while !req.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => req.extend_from_slice(&buf[..n]),
            }
        }
        let resp = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(resp.as_bytes());
        let _ = stream.flush();
    });
    (format!("http://127.0.0.1:{port}/json/list"), handle)
}

/// Discovery listing with one page per websocket URL.
pub fn listing(ws_urls: &[&str]) -> String {
    let targets: Vec<Value> = ws_urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            json!({
                "id": format!("PAGE{i}"),
                "type": "page",
                "title": "workbench",
                "url": "vscode-file://vscode-app/workbench.html",
                "webSocketDebuggerUrl": url,
            })
        })
        .collect();
    Value::Array(targets).to_string()
}

/// What the fake target does with the n-th (1-based) `Runtime.evaluate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    AckAll,
    ErrorOn(usize),
    SilentOn(usize),
    CloseOn(usize),
}

pub struct FakeDevtools {
    pub ws_url: String,
    pub received: Receiver<Value>,
    pub handle: JoinHandle<()>,
}

impl FakeDevtools {
    pub fn start(behavior: Behavior) -> Self {
        let mut server = Server::bind("127.0.0.1:0").unwrap();
        let port = server.local_addr().unwrap().port();
        let (tx, rx) = unbounded();

        let handle = thread::spawn(move || {
            let Ok(upgrade) = server.accept() else {
                return;
            };
            let Ok(mut client) = upgrade.accept() else {
                return;
            };
            let _ = client.send_message(&OwnedMessage::Ping(b"hi".to_vec()));

            let mut evaluations = 0usize;
            loop {
                let text = match client.recv_message() {
                    Ok(OwnedMessage::Text(text)) => text,
                    Ok(OwnedMessage::Close(_)) | Err(_) => break,
                    Ok(_) => continue,
                };
                let msg: Value = serde_json::from_str(&text).unwrap();
                let id = msg["id"].as_u64().unwrap();
                let method = msg["method"].as_str().unwrap_or_default().to_string();
                let _ = tx.send(msg);

                let replies: Vec<Value> = match method.as_str() {
                    "Runtime.enable" => vec![
                        json!({"method": "Runtime.executionContextCreated", "params": {"context": {"id": 1}}}),
                        json!({"id": id, "result": {}}),
                    ],
                    "Runtime.evaluate" => {
                        evaluations += 1;
                        match behavior {
                            Behavior::ErrorOn(n) if n == evaluations => vec![json!({
                                "id": id,
                                "error": {"code": -32000, "message": "Cannot find context with specified id"}
                            })],
                            Behavior::SilentOn(n) if n == evaluations => vec![],
                            Behavior::CloseOn(n) if n == evaluations => {
                                let _ = client.send_message(&OwnedMessage::Close(None));
                                break;
                            }
                            _ => vec![
                                json!({"method": "Runtime.consoleAPICalled", "params": {"type": "clear", "args": []}}),
                                json!({"id": id, "result": {"result": {"type": "string", "value": MARKER}}}),
                            ],
                        }
                    }
                    _ => vec![json!({"id": id, "error": {"code": -32601, "message": "method not found"}})],
                };
                for reply in replies {
                    if client.send_message(&OwnedMessage::Text(reply.to_string())).is_err() {
                        return;
                    }
                }
            }
        });

        Self {
            ws_url: format!("ws://127.0.0.1:{port}/devtools/page/PAGE0"),
            received: rx,
            handle,
        }
    }

    /// Requests seen so far, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.received.try_iter().collect()
    }
}
