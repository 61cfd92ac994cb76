//! WebSocket handler.
//!
//! Responsibilities:
//! - Resolve the session token before upgrading (unknown token: plain 404)
//! - Upgrade HTTP -> WS and split the socket
//! - Feed inbound text frames to the connection adapter
//! - Write outbound frames and close frames through `WsSink`

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{
            rejection::WebSocketUpgradeRejection, CloseFrame, Message, WebSocket, WebSocketUpgrade,
        },
        Path, State,
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::{
    stream::{self, SplitSink, SplitStream},
    SinkExt, Stream, StreamExt,
};
use tracing::Instrument;

use roomcast_core::error::{Result, RoomcastError};
use roomcast_core::CloseReason;

use crate::app_state::AppState;
use crate::obs::GatewayMetrics;
use crate::realtime::core::{run_connection, ConnectionCtx, FrameSink};
use crate::transport::codec::{decode, Inbound};
use crate::web::ApiError;

/// Outbound half of an upgraded socket.
pub struct WsSink {
    tx: SplitSink<WebSocket, Message>,
}

impl WsSink {
    pub fn new(tx: SplitSink<WebSocket, Message>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, frame: Bytes) -> Result<()> {
        // Payloads originate from text frames, so this is valid UTF-8.
        let text = String::from_utf8_lossy(&frame).into_owned();
        self.tx
            .send(Message::Text(text))
            .await
            .map_err(|e| RoomcastError::Transport(e.to_string()))
    }

    async fn close(&mut self, reason: CloseReason) -> Result<()> {
        let frame = CloseFrame {
            code: reason.code(),
            reason: reason.reason().into(),
        };
        self.tx
            .send(Message::Close(Some(frame)))
            .await
            .map_err(|e| RoomcastError::Transport(e.to_string()))?;
        self.tx
            .close()
            .await
            .map_err(|e| RoomcastError::Transport(e.to_string()))
    }
}

/// Inbound text payloads. Binary frames are counted and dropped; a close
/// frame or read error ends the stream.
fn inbound_frames(
    rx: SplitStream<WebSocket>,
    metrics: Arc<GatewayMetrics>,
) -> impl Stream<Item = Result<Bytes>> + Send {
    stream::unfold(Some(rx), move |rx| {
        let metrics = Arc::clone(&metrics);
        async move {
            let mut rx = rx?;
            loop {
                let msg = match rx.next().await? {
                    Ok(msg) => msg,
                    Err(e) => return Some((Err(RoomcastError::Transport(e.to_string())), None)),
                };
                match decode(msg) {
                    Inbound::Text(payload) => return Some((Ok(payload), Some(rx))),
                    Inbound::Binary { bytes_len } => {
                        metrics.frames_ignored.inc(&[("kind", "binary")]);
                        tracing::debug!(bytes_len, "binary frame ignored");
                    }
                    Inbound::Ping | Inbound::Pong => {}
                    Inbound::Close { code } => {
                        let reason = code.and_then(CloseReason::from_code).map(CloseReason::as_str);
                        tracing::debug!(?code, ?reason, "peer sent close");
                        return None;
                    }
                }
            }
        }
    })
}

// --------------------
// Entry
// --------------------

/// The session is resolved before the upgrade headers are checked, so an
/// unknown token gets the same 404 whether or not this is a WebSocket request.
pub async fn ws_upgrade(
    State(app): State<AppState>,
    Path(token): Path<String>,
    ws: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if app.is_draining() {
        app.metrics().ws_rejected.inc(&[("reason", "draining")]);
        return ApiError::from(RoomcastError::Cancelled).into_response();
    }

    let session = match app.sessions().lookup(&token) {
        Ok(session) => session,
        Err(e) => {
            app.metrics().ws_rejected.inc(&[("reason", "unknown_session")]);
            return ApiError::from(e).into_response();
        }
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            app.metrics().ws_rejected.inc(&[("reason", "not_websocket")]);
            return rejection.into_response();
        }
    };

    app.metrics().ws_upgrades.inc(&[]);
    let ctx = ConnectionCtx {
        hub: session.hub().clone(),
        write_timeout: app.cfg().hub.write_timeout(),
        cancel: app.shutdown().child_token(),
        metrics: app.metrics(),
    };
    let span = tracing::info_span!("conn", session = %session.token());

    ws.on_upgrade(move |socket| {
        async move {
            let (tx, rx) = socket.split();
            let source = inbound_frames(rx, Arc::clone(&ctx.metrics));
            run_connection(ctx, source, WsSink::new(tx)).await;
        }
        .instrument(span)
    })
}
