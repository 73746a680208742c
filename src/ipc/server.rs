//! Local IPC server for `meeting-bridge-ctl` and host processes.
//!
//! Listens on a named pipe (Windows) or Unix domain socket (Linux/macOS)
//! using the `interprocess` crate. Each request line is either a bridge
//! command or a topic subscription.
//!
//! ## Protocol
//!
//! Request (one JSON object per line):
//! ```json
//! {"method": "init", "arguments": {"appKey": "...", "appSecret": "..."}}
//! {"method": "meeting_status"}
//! {"method": "listen", "topic": "meeting_status"}
//! {"method": "cancel"}
//! ```
//!
//! Response (one JSON object per line):
//! ```json
//! {"ok": true, "data": ["MEETING_STATUS_INMEETING", ""]}
//! {"ok": false, "error": "unimplemented: frobnicate"}
//! ```
//!
//! While listening, the connection carries event lines until the client
//! sends `cancel` or disconnects:
//! ```json
//! {"event": "meeting_status", "data": "MEETING_STATUS_CONNECTING"}
//! {"event": "device_audio", "data": 1}
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use interprocess::local_socket::{tokio::prelude::*, GenericNamespaced, ListenerOptions};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Encoder, FramedRead};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::ipc::codec::CommandCodec;
use crate::models::command::Command;
use crate::models::reply::Reply;
use crate::models::status::{EventPayload, Topic};
use crate::state::AppState;
use crate::{AppError, Result};

/// Inbound IPC request.
#[derive(Debug, Deserialize)]
struct IpcRequest {
    /// Command name, or `listen` / `cancel`.
    method: String,
    /// Command arguments.
    #[serde(default)]
    arguments: HashMap<String, String>,
    /// Topic to subscribe to (for `listen`).
    topic: Option<Topic>,
}

/// Outbound IPC response.
#[derive(Debug, Serialize)]
struct IpcResponse {
    /// Whether the command succeeded.
    ok: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IpcResponse {
    fn success(data: serde_json::Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }

    fn from_reply(name: &str, reply: &Reply) -> Self {
        if *reply == Reply::NotImplemented {
            return Self::error(AppError::Unimplemented(name.to_owned()).to_string());
        }
        match serde_json::to_value(reply) {
            Ok(data) => Self::success(data),
            Err(err) => Self::error(format!("serialization failed: {err}")),
        }
    }
}

/// One event line on a listening connection.
#[derive(Debug, Serialize)]
struct IpcEvent<'a> {
    event: Topic,
    data: &'a EventPayload,
}

/// Writes newline-terminated JSON through [`CommandCodec`].
struct LineWriter<W> {
    writer: W,
    codec: CommandCodec,
    buf: BytesMut,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            codec: CommandCodec::new(),
            buf: BytesMut::new(),
        }
    }

    async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let line = serde_json::to_string(message)
            .map_err(|err| AppError::Ipc(format!("serialization failed: {err}")))?;
        self.buf.clear();
        self.codec.encode(line, &mut self.buf)?;
        self.writer.write_all(&self.buf).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Spawn the IPC server task.
///
/// # Errors
///
/// Returns `AppError::Ipc` if the listener cannot be created.
pub fn spawn_ipc_server(
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<tokio::task::JoinHandle<()>> {
    let name = state.config.ipc_name.clone();

    let listener_name = name
        .clone()
        .to_ns_name::<GenericNamespaced>()
        .map_err(|err| AppError::Ipc(format!("invalid ipc socket name '{name}': {err}")))?;

    let listener = ListenerOptions::new()
        .name(listener_name)
        .create_tokio()
        .map_err(|err| AppError::Ipc(format!("failed to create ipc listener: {err}")))?;

    info!(ipc_name = %name, "IPC server listening");

    let handle = tokio::spawn(async move {
        let span = info_span!("ipc_server", name = %name);
        async move {
            loop {
                tokio::select! {
                    () = ct.cancelled() => {
                        info!("IPC server shutting down");
                        break;
                    }
                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok(stream) => {
                                let state = Arc::clone(&state);
                                let (reader, writer) = stream.split();
                                tokio::spawn(serve_connection(reader, writer, state));
                            }
                            Err(err) => {
                                warn!(%err, "IPC accept failed");
                            }
                        }
                    }
                }
            }
        }
        .instrument(span)
        .await;
    });

    Ok(handle)
}

/// Serve one client connection until it disconnects.
///
/// Generic over the transport so any byte stream pair can carry the
/// protocol.
pub async fn serve_connection<R, W>(reader: R, writer: W, state: Arc<AppState>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let conn_id = Uuid::new_v4();
    let span = info_span!("ipc_conn", %conn_id);
    async move {
        let mut reader = FramedRead::new(reader, CommandCodec::new());
        let mut writer = LineWriter::new(writer);

        if let Err(err) = run_connection(&mut reader, &mut writer, &state).await {
            warn!(%err, "IPC connection failed");
        }
        info!("IPC connection closed");
    }
    .instrument(span)
    .await;
}

async fn run_connection<R, W>(
    reader: &mut FramedRead<R, CommandCodec>,
    writer: &mut LineWriter<W>,
    state: &AppState,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = reader.next().await {
        let line = match frame {
            Ok(line) => line,
            Err(err) => {
                writer.send(&IpcResponse::error(err.to_string())).await?;
                return Err(err);
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request = match serde_json::from_str::<IpcRequest>(trimmed) {
            Ok(request) => request,
            Err(err) => {
                writer
                    .send(&IpcResponse::error(format!("invalid json: {err}")))
                    .await?;
                continue;
            }
        };

        match request.method.as_str() {
            "listen" => {
                let Some(topic) = request.topic else {
                    writer
                        .send(&IpcResponse::error("missing required 'topic' field"))
                        .await?;
                    continue;
                };
                if !stream_events(topic, reader, writer, state).await? {
                    return Ok(());
                }
            }
            "cancel" => {
                writer
                    .send(&IpcResponse::error("no active subscription"))
                    .await?;
            }
            _ => {
                let response = dispatch_command(request, state).await;
                writer.send(&response).await?;
            }
        }
    }
    Ok(())
}

/// Relay `topic` events to the client until it cancels or disconnects.
/// Returns whether the connection is still open.
async fn stream_events<R, W>(
    topic: Topic,
    reader: &mut FramedRead<R, CommandCodec>,
    writer: &mut LineWriter<W>,
    state: &AppState,
) -> Result<bool>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stream = state.relay.subscribe(topic).await;
    writer
        .send(&IpcResponse::success(
            serde_json::json!({ "subscribed": topic }),
        ))
        .await?;

    let outcome = loop {
        tokio::select! {
            event = stream.recv() => {
                let Some(event) = event else {
                    debug!(%topic, "subscription taken over by another listener");
                    break Ok(true);
                };
                let line = IpcEvent { event: event.topic, data: &event.payload };
                if let Err(err) = writer.send(&line).await {
                    break Err(err);
                }
            }
            frame = reader.next() => {
                match frame {
                    None => break Ok(false),
                    Some(Err(err)) => break Err(err),
                    Some(Ok(line)) => {
                        let cancelled = serde_json::from_str::<IpcRequest>(line.trim())
                            .is_ok_and(|request| request.method == "cancel");
                        if cancelled {
                            break Ok(true);
                        }
                        let reply = IpcResponse::error("listening; send cancel first");
                        if let Err(err) = writer.send(&reply).await {
                            break Err(err);
                        }
                    }
                }
            }
        }
    };

    state.relay.cancel(&stream).await;

    if matches!(outcome, Ok(true)) {
        writer
            .send(&IpcResponse::success(
                serde_json::json!({ "cancelled": topic }),
            ))
            .await?;
    }
    outcome
}

/// Forward a command to the bridge and wait for its reply.
async fn dispatch_command(request: IpcRequest, state: &AppState) -> IpcResponse {
    let span = info_span!("ipc_command", command = %request.method);
    let command = Command {
        name: request.method,
        arguments: request.arguments,
    };
    let name = command.name.clone();
    let limit = Duration::from_secs(state.config.timeouts.command_seconds);

    async move {
        match tokio::time::timeout(limit, state.bridge.dispatch(command)).await {
            Ok(Ok(reply)) => IpcResponse::from_reply(&name, &reply),
            Ok(Err(err)) => IpcResponse::error(err.to_string()),
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "command timed out");
                IpcResponse::error(format!("timed out after {}s", limit.as_secs()))
            }
        }
    }
    .instrument(span)
    .await
}
