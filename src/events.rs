//! §4.10 Event Bus: per-method-name fan-out with a non-blocking,
//! per-subscriber queue so the transport read loop never awaits a user
//! handler. Payloads travel as raw `serde_json::Value` and are deserialized
//! into a concrete [`crate::cdp::Event`] type at the subscriber boundary —
//! the "single JSON-value type with typed accessors" intermediate the
//! design notes call pragmatic for CDP params not worth hand-typing twice.

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::{SendError, UnboundedReceiver, UnboundedSender};
use futures::Stream;

use crate::cdp::{Event, MethodId};

#[derive(Debug, Clone)]
pub struct RawEvent {
    pub method: MethodId,
    pub session_id: Option<String>,
    pub params: serde_json::Value,
}

pub struct EventListenerRequest {
    pub listener: UnboundedSender<RawEvent>,
    pub method: MethodId,
    /// `None` subscribes to the event regardless of session.
    pub session_id: Option<String>,
}

struct EventListener {
    listener: UnboundedSender<RawEvent>,
    session_id: Option<String>,
    queued: std::collections::VecDeque<RawEvent>,
}

impl EventListener {
    fn start_send(&mut self, event: RawEvent) {
        self.queued.push_back(event);
    }

    fn poll(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), SendError>> {
        loop {
            if self.queued.is_empty() {
                return Poll::Ready(Ok(()));
            }
            match self.listener.poll_ready(cx) {
                Poll::Ready(Ok(())) => {
                    let ev = self.queued.pop_front().unwrap();
                    if self.listener.start_send(ev).is_err() {
                        return Poll::Ready(Ok(()));
                    }
                }
                Poll::Ready(Err(_)) => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Global + per-session subscription tables, keyed by CDP method name.
#[derive(Default)]
pub struct EventListeners {
    listeners: HashMap<MethodId, Vec<EventListener>>,
}

impl EventListeners {
    pub fn add_listener(&mut self, req: EventListenerRequest) {
        self.listeners
            .entry(req.method)
            .or_default()
            .push(EventListener {
                listener: req.listener,
                session_id: req.session_id,
                queued: Default::default(),
            });
    }

    /// Fan an event out to every subscriber of `method` whose session
    /// filter matches (`None` subscribers receive everything).
    pub fn start_send(&mut self, method: &MethodId, event: RawEvent) {
        if let Some(listeners) = self.listeners.get_mut(method) {
            listeners.retain(|l| !l.listener.is_closed());
            for l in listeners.iter_mut() {
                if l.session_id.is_none() || l.session_id == event.session_id {
                    l.start_send(event.clone());
                }
            }
        }
    }

    /// Drain every subscriber's queue without ever blocking the caller on a
    /// slow consumer.
    pub fn poll(&mut self, cx: &mut Context<'_>) {
        for listeners in self.listeners.values_mut() {
            let mut i = 0;
            while i < listeners.len() {
                match listeners[i].poll(cx) {
                    Poll::Ready(Ok(())) => i += 1,
                    Poll::Ready(Err(_)) => {
                        listeners.swap_remove(i);
                    }
                    Poll::Pending => i += 1,
                }
            }
        }
    }
}

/// A typed stream of one event kind, handed to callers of `Page::events`.
pub struct EventStream<T> {
    rx: UnboundedReceiver<RawEvent>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Event> EventStream<T> {
    pub fn new(rx: UnboundedReceiver<RawEvent>) -> Self {
        Self {
            rx,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Event> Stream for EventStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let pin = self.get_mut();
        loop {
            return match Pin::new(&mut pin.rx).poll_next(cx) {
                Poll::Ready(Some(raw)) => match serde_json::from_value::<T>(raw.params) {
                    Ok(typed) => Poll::Ready(Some(typed)),
                    Err(err) => {
                        tracing::warn!(%err, method = %raw.method, "dropping unparseable event");
                        continue;
                    }
                },
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[derive(Debug, Clone, serde::Deserialize)]
    struct Ping {
        n: u32,
    }
    impl Event for Ping {
        const METHOD: &'static str = "Test.ping";
    }

    #[tokio::test]
    async fn subscriber_receives_events_it_registered_for() {
        let mut listeners = EventListeners::default();
        let (tx, rx) = futures::channel::mpsc::unbounded();
        listeners.add_listener(EventListenerRequest {
            listener: tx,
            method: "Test.ping".into(),
            session_id: None,
        });

        listeners.start_send(
            &"Test.ping".into(),
            RawEvent {
                method: "Test.ping".into(),
                session_id: None,
                params: serde_json::json!({"n": 7}),
            },
        );
        futures::future::poll_fn(|cx| {
            listeners.poll(cx);
            Poll::Ready(())
        })
        .await;

        let mut stream = EventStream::<Ping>::new(rx);
        let received = stream.next().await.unwrap();
        assert_eq!(received.n, 7);
    }
}
