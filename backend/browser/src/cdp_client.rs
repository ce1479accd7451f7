//! Chrome DevTools Protocol Client
//!
//! Holds one WebSocket to the browser endpoint and correlates JSON-RPC
//! responses with their commands. Page-level commands are routed through a
//! flattened target session by passing its `sessionId`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::DriverError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CdpCommand<'a> {
    id: u64,
    method: &'a str,
    params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct CdpResponse {
    pub id: u64,
    pub result: Option<Value>,
    pub error: Option<CdpResponseError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponseError {
    pub code: i64,
    pub message: String,
}

pub struct CdpClient {
    next_id: AtomicU64,
    pending: Pending,
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: JoinHandle<()>,
    command_timeout: Duration,
}

impl CdpClient {
    /// Open the WebSocket at `ws_endpoint` and start the response reader.
    pub async fn connect(ws_endpoint: &str, command_timeout: Duration) -> Result<Self, DriverError> {
        info!("Connecting to CDP websocket at {}", ws_endpoint);
        let (stream, _) = tokio_tungstenite::connect_async(ws_endpoint)
            .await
            .map_err(|e| DriverError::ConnectionFailed {
                url: ws_endpoint.to_string(),
                reason: e.to_string(),
            })?;
        let (writer, reader) = stream.split();

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(read_loop(reader, Arc::clone(&pending)));

        Ok(Self {
            next_id: AtomicU64::new(1),
            pending,
            writer: Mutex::new(writer),
            reader,
            command_timeout,
        })
    }

    /// Send a browser-level command.
    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value, DriverError> {
        self.dispatch(method, params, None).await
    }

    /// Send a command to the target attached as `session_id`.
    pub async fn send_session_command(
        &self,
        session_id: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, DriverError> {
        self.dispatch(method, params, Some(session_id)).await
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Value,
        session_id: Option<&str>,
    ) -> Result<Value, DriverError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let payload = serde_json::to_string(&CdpCommand {
            id,
            method,
            params,
            session_id,
        })
        .map_err(|e| DriverError::Protocol {
            detail: format!("failed to serialize {method}: {e}"),
        })?;

        // Register before sending so a fast response is never dropped.
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        debug!(id, method, "Sending CDP command");
        let sent = self
            .writer
            .lock()
            .await
            .send(Message::Text(payload.into()))
            .await;
        if let Err(e) = sent {
            self.pending.lock().await.remove(&id);
            return Err(DriverError::Protocol {
                detail: format!("failed to send {method}: {e}"),
            });
        }

        let response = match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(DriverError::Protocol {
                    detail: "response channel closed".into(),
                })
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(DriverError::CommandTimeout {
                    method: method.into(),
                    duration: self.command_timeout,
                });
            }
        };

        if let Some(err) = response.error {
            return Err(DriverError::Cdp {
                code: err.code,
                message: err.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Route responses to their waiting commands until the socket closes.
async fn read_loop(mut reader: SplitStream<WsStream>, pending: Pending) {
    while let Some(frame) = reader.next().await {
        let text = match frame {
            Ok(Message::Text(t)) => t.to_string(),
            Ok(Message::Binary(b)) => match String::from_utf8(b.to_vec()) {
                Ok(s) => s,
                Err(_) => continue,
            },
            Ok(Message::Close(_)) => {
                info!("CDP websocket closed by browser");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "CDP websocket read failed");
                break;
            }
        };

        let Ok(json) = serde_json::from_str::<Value>(&text) else {
            warn!("Ignoring non-JSON CDP frame");
            continue;
        };
        match parse_cdp_response(&json) {
            Some(response) => {
                if let Some(tx) = pending.lock().await.remove(&response.id) {
                    let _ = tx.send(response);
                }
            }
            // Events are not consumed; page state is polled instead.
            None => debug!(method = ?json.get("method"), "Dropping CDP event"),
        }
    }

    for (id, tx) in pending.lock().await.drain() {
        let _ = tx.send(CdpResponse {
            id,
            result: None,
            error: Some(CdpResponseError {
                code: -1,
                message: "websocket closed".into(),
            }),
        });
    }
}

/// Parse a frame carrying a command `id` into a response.
pub fn parse_cdp_response(json: &Value) -> Option<CdpResponse> {
    let id = json.get("id")?.as_u64()?;
    Some(CdpResponse {
        id,
        result: json.get("result").cloned(),
        error: json
            .get("error")
            .and_then(|e| serde_json::from_value(e.clone()).ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_carries_session_id_when_set() {
        let cmd = CdpCommand {
            id: 3,
            method: "Runtime.evaluate",
            params: json!({ "expression": "1" }),
            session_id: Some("S1"),
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["sessionId"], "S1");
        assert_eq!(value["method"], "Runtime.evaluate");
    }

    #[test]
    fn browser_command_omits_session_id() {
        let cmd = CdpCommand {
            id: 1,
            method: "Target.createBrowserContext",
            params: json!({}),
            session_id: None,
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert!(value.get("sessionId").is_none());
    }

    #[test]
    fn parses_error_response() {
        let frame = json!({ "id": 9, "error": { "code": -32000, "message": "No node" } });
        let response = parse_cdp_response(&frame).unwrap();
        assert_eq!(response.id, 9);
        let err = response.error.unwrap();
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "No node");
    }

    #[test]
    fn events_are_not_responses() {
        let frame = json!({ "method": "Page.loadEventFired", "params": {} });
        assert!(parse_cdp_response(&frame).is_none());
    }
}
