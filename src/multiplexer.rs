//! §4.2 Session Multiplexer: the concurrency core. Owns the transport, the
//! `id` counter (via [`Transport`]), the pending-call table, and the event
//! subscription tables. One background task drives all of it; it must
//! never await a user handler while doing so.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use fnv::FnvHashMap;
use futures::channel::mpsc;
use futures::channel::oneshot;
use futures::StreamExt;

use crate::cdp::{CallId, Message, MethodId, Response};
use crate::error::{CdpError, Result};
use crate::events::{EventListenerRequest, EventListeners, RawEvent};
use crate::job::PeriodicJob;
use crate::transport::Transport;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
const EVICTION_INTERVAL: Duration = Duration::from_secs(1);

struct PendingCall {
    method: MethodId,
    deadline: Instant,
    sender: oneshot::Sender<Result<Response>>,
}

/// A command submission crossing from a `Session`/`Page` into the
/// multiplexer's background task.
pub struct Submission {
    pub method: MethodId,
    pub session_id: Option<String>,
    pub params: serde_json::Value,
    pub deadline: Duration,
    pub sender: oneshot::Sender<Result<Response>>,
}

pub enum MultiplexerMessage {
    Submit(Submission),
    Subscribe(EventListenerRequest),
}

/// Handle used by the rest of the crate to talk to the background
/// multiplexer task.
#[derive(Clone)]
pub struct MultiplexerHandle {
    tx: mpsc::UnboundedSender<MultiplexerMessage>,
}

impl MultiplexerHandle {
    pub async fn send(
        &self,
        method: MethodId,
        session_id: Option<String>,
        params: serde_json::Value,
        deadline: Duration,
    ) -> Result<Response> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .unbounded_send(MultiplexerMessage::Submit(Submission {
                method,
                session_id,
                params,
                deadline,
                sender: tx,
            }))
            .map_err(|e| CdpError::from(e.into_send_error()))?;
        rx.await?
    }

    pub fn subscribe(
        &self,
        method: MethodId,
        session_id: Option<String>,
    ) -> mpsc::UnboundedReceiver<RawEvent> {
        let (tx, rx) = mpsc::unbounded();
        let _ = self
            .tx
            .unbounded_send(MultiplexerMessage::Subscribe(EventListenerRequest {
                listener: tx,
                method,
                session_id,
            }));
        rx
    }
}

/// The background task: reads envelopes from the transport, resolves
/// PendingCalls, and fans events out, never blocking on either.
pub struct Multiplexer {
    transport: Transport,
    inbox: mpsc::UnboundedReceiver<MultiplexerMessage>,
    pending: FnvHashMap<CallId, PendingCall>,
    listeners: EventListeners,
    eviction: PeriodicJob,
}

impl Multiplexer {
    pub fn spawn(transport: Transport) -> MultiplexerHandle {
        let (tx, rx) = mpsc::unbounded();
        let mux = Multiplexer {
            transport,
            inbox: rx,
            pending: Default::default(),
            listeners: Default::default(),
            eviction: PeriodicJob::new(EVICTION_INTERVAL),
        };
        tokio::spawn(mux.run());
        MultiplexerHandle { tx }
    }

    async fn run(mut self) {
        futures::future::poll_fn(move |cx| self.poll_drive(cx)).await;
    }

    fn poll_drive(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        while let Poll::Ready(Some(msg)) = Pin::new(&mut self.inbox).poll_next(cx) {
            match msg {
                MultiplexerMessage::Submit(sub) => self.submit(sub),
                MultiplexerMessage::Subscribe(req) => self.listeners.add_listener(req),
            }
        }

        if self.eviction.poll(cx) {
            self.evict_timed_out_commands();
        }

        loop {
            match Pin::new(&mut self.transport).poll_next(cx) {
                Poll::Ready(Some(Ok(Message::Response(resp)))) => self.on_response(resp),
                Poll::Ready(Some(Ok(Message::Event(ev)))) => self.on_event(ev),
                Poll::Ready(Some(Err(err))) => {
                    tracing::error!(%err, "transport error, failing all pending commands");
                    self.fail_all();
                    return Poll::Ready(());
                }
                Poll::Ready(None) => {
                    self.fail_all();
                    return Poll::Ready(());
                }
                Poll::Pending => break,
            }
        }

        self.listeners.poll(cx);
        Poll::Pending
    }

    fn submit(&mut self, sub: Submission) {
        let call_id = self
            .transport
            .submit_command(sub.method.clone(), sub.session_id, sub.params);
        self.pending.insert(
            call_id,
            PendingCall {
                method: sub.method,
                deadline: Instant::now() + sub.deadline,
                sender: sub.sender,
            },
        );
    }

    fn on_response(&mut self, resp: Response) {
        if let Some(call) = self.pending.remove(&resp.id) {
            let _ = call.sender.send(Ok(resp));
        }
    }

    fn on_event(&mut self, ev: crate::cdp::EventEnvelope) {
        let method = ev.method.clone();
        self.listeners.start_send(
            &method,
            RawEvent {
                method: ev.method,
                session_id: ev.session_id,
                params: ev.params,
            },
        );
    }

    fn evict_timed_out_commands(&mut self) {
        let now = Instant::now();
        let expired: Vec<CallId> = self
            .pending
            .iter()
            .filter(|(_, call)| now > call.deadline)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(call) = self.pending.remove(&id) {
                tracing::warn!(method = %call.method, "command exceeded its deadline");
                let _ = call.sender.send(Err(CdpError::Timeout));
            }
        }
    }

    /// Both callers reach this after the transport stream has ended, so
    /// every pending command fails the same way; `CdpError` isn't `Clone`
    /// (it wraps `tungstenite::Error`/`io::Error`), so there is no per-call
    /// error to thread through without fabricating one.
    fn fail_all(&mut self) {
        for (_, call) in self.pending.drain() {
            let _ = call.sender.send(Err(CdpError::TransportClosed));
        }
    }
}
