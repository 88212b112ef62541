//! §4.1 CDP Transport: a single WebSocket endpoint. Serializes outbound
//! envelopes, parses inbound ones, and surfaces connection loss as a
//! terminal error rather than something a caller can recover by retrying
//! the same transport.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use async_tungstenite::tokio::{connect_async_with_config, ConnectStream};
use async_tungstenite::tungstenite::protocol::WebSocketConfig;
use async_tungstenite::tungstenite::Message as WsMessage;
use async_tungstenite::WebSocketStream;
use futures::ready;
use futures::{Sink, SinkExt, Stream, StreamExt};

use crate::cdp::{CallId, Message, MethodId, Request};
use crate::error::{CdpError, Result};
use crate::job::PeriodicJob;

/// Minimum message size this crate insists the browser accept, matching the
/// "at least 100 MiB" contract in the spec (large `Network.getResponseBody`
/// payloads and full-page screenshots routinely exceed tungstenite's 64 KiB
/// default).
const MIN_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Application-level keepalive. If no pong arrives within this window after
/// a ping, the transport is considered dead.
pub const PING_INTERVAL: Duration = Duration::from_secs(20);

pub struct Transport {
    pending_commands: VecDeque<Request>,
    ws: WebSocketStream<ConnectStream>,
    next_id: CallId,
    needs_flush: bool,
    pending_flush: Option<Request>,
    ping_tick: PeriodicJob,
    ping_pending: bool,
    last_pong: Instant,
}

impl Transport {
    pub async fn connect(url: &str) -> Result<Self> {
        let config = WebSocketConfig {
            max_message_size: Some(MIN_MESSAGE_SIZE),
            max_frame_size: Some(MIN_MESSAGE_SIZE),
            ..Default::default()
        };
        let (ws, _) = connect_async_with_config(url, Some(config), false).await?;
        Ok(Self {
            pending_commands: VecDeque::new(),
            ws,
            next_id: 0,
            needs_flush: false,
            pending_flush: None,
            ping_tick: PeriodicJob::new(PING_INTERVAL),
            ping_pending: false,
            last_pong: Instant::now(),
        })
    }

    /// Sends a keepalive ping when `PING_INTERVAL` has elapsed, and fails
    /// the transport if the previous ping never got a pong back within
    /// that same window.
    fn poll_keepalive(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        if self.ping_tick.poll(cx) {
            if self.ping_pending && self.last_pong.elapsed() >= PING_INTERVAL {
                return Poll::Ready(Err(CdpError::PongTimeout));
            }
            ready!(Pin::new(&mut self.ws).poll_ready(cx)).map_err(CdpError::from)?;
            Pin::new(&mut self.ws)
                .start_send(WsMessage::Ping(Vec::new().into()))
                .map_err(CdpError::from)?;
            self.needs_flush = true;
            self.ping_pending = true;
        }
        Poll::Ready(Ok(()))
    }

    /// Queue an outbound command, returning the `id` allocated to it.
    /// `id` values are strictly monotonically increasing and never reused.
    pub fn submit_command(
        &mut self,
        method: MethodId,
        session_id: Option<String>,
        params: serde_json::Value,
    ) -> CallId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending_commands.push_back(Request {
            id,
            method,
            session_id,
            params,
        });
        id
    }

    fn start_send_next(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        loop {
            if self.needs_flush {
                ready!(Pin::new(&mut self.ws).poll_flush(cx)).map_err(CdpError::from)?;
                self.needs_flush = false;
            }
            if let Some(req) = self.pending_flush.take() {
                let text = serde_json::to_string(&req)?;
                Pin::new(&mut self.ws)
                    .start_send(WsMessage::Text(text.into()))
                    .map_err(CdpError::from)?;
                self.needs_flush = true;
                continue;
            }
            if let Some(req) = self.pending_commands.pop_front() {
                self.pending_flush = Some(req);
                continue;
            }
            return Poll::Ready(Ok(()));
        }
    }
}

impl Stream for Transport {
    type Item = Result<Message>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let pin = self.get_mut();

        if let Poll::Ready(Err(err)) = pin.poll_keepalive(cx) {
            return Poll::Ready(Some(Err(err)));
        }
        if let Poll::Ready(Err(err)) = pin.start_send_next(cx) {
            return Poll::Ready(Some(Err(err)));
        }

        loop {
            return match ready!(pin.ws.poll_next_unpin(cx)) {
                Some(Ok(WsMessage::Text(text))) => match serde_json::from_str::<Message>(&text) {
                    Ok(msg) => Poll::Ready(Some(Ok(msg))),
                    Err(err) => {
                        tracing::warn!(%err, "skipping malformed CDP frame");
                        continue;
                    }
                },
                Some(Ok(WsMessage::Close(_))) | None => Poll::Ready(None),
                Some(Ok(WsMessage::Pong(_))) => {
                    pin.last_pong = Instant::now();
                    pin.ping_pending = false;
                    continue;
                }
                Some(Ok(WsMessage::Ping(_))) => continue,
                Some(Ok(other)) => {
                    Poll::Ready(Some(Err(CdpError::UnexpectedWsMessage(other))))
                }
                Some(Err(err)) => Poll::Ready(Some(Err(err.into()))),
            };
        }
    }
}
