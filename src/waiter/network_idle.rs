//! Network-Idle Tracker (§4.7, §8 invariant 6): `check()` is true iff the
//! in-flight set is empty AND `now - last_activity >= idle_time`. No
//! allowance for a small residual in-flight count (resolved Open Question,
//! see DESIGN.md).

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;

use crate::cdp::network::{LoadingFailedEvent, LoadingFinishedEvent, RequestId, RequestWillBeSentEvent, ResponseReceivedEvent};
use crate::error::Result;
use crate::multiplexer::MultiplexerHandle;
use crate::session::Session;

use super::Condition;

pub const DEFAULT_IDLE_TIME: Duration = Duration::from_millis(500);

struct State {
    in_flight: HashSet<RequestId>,
    last_activity: Instant,
}

pub struct NetworkIdleTracker {
    state: Mutex<State>,
    idle_time: Duration,
}

impl NetworkIdleTracker {
    /// Subscribes to `Network.requestWillBeSent` / `responseReceived` /
    /// `loadingFinished` / `loadingFailed` on `session` and spawns a task
    /// that keeps the in-flight set current for the lifetime of `session`.
    pub fn attach(mux: &MultiplexerHandle, session: &Session, idle_time: Duration) -> std::sync::Arc<Self> {
        let tracker = std::sync::Arc::new(Self {
            state: Mutex::new(State {
                in_flight: HashSet::new(),
                last_activity: Instant::now(),
            }),
            idle_time,
        });

        let session_id = Some(session.session_id().0.clone());

        let started = tracker.clone();
        let mut requests = crate::events::EventStream::<RequestWillBeSentEvent>::new(
            mux.subscribe("Network.requestWillBeSent".into(), session_id.clone()),
        );
        tokio::spawn(async move {
            while let Some(ev) = requests.next().await {
                let mut state = started.state.lock().unwrap();
                state.in_flight.insert(ev.request_id);
                state.last_activity = Instant::now();
            }
        });

        let responded = tracker.clone();
        let mut responses = crate::events::EventStream::<ResponseReceivedEvent>::new(
            mux.subscribe("Network.responseReceived".into(), session_id.clone()),
        );
        tokio::spawn(async move {
            while let Some(_ev) = responses.next().await {
                responded.state.lock().unwrap().last_activity = Instant::now();
            }
        });

        let finished = tracker.clone();
        let mut done = crate::events::EventStream::<LoadingFinishedEvent>::new(
            mux.subscribe("Network.loadingFinished".into(), session_id.clone()),
        );
        tokio::spawn(async move {
            while let Some(ev) = done.next().await {
                let mut state = finished.state.lock().unwrap();
                state.in_flight.remove(&ev.request_id);
                state.last_activity = Instant::now();
            }
        });

        let failed = tracker.clone();
        let mut errs = crate::events::EventStream::<LoadingFailedEvent>::new(
            mux.subscribe("Network.loadingFailed".into(), session_id),
        );
        tokio::spawn(async move {
            while let Some(ev) = errs.next().await {
                let mut state = failed.state.lock().unwrap();
                state.in_flight.remove(&ev.request_id);
                state.last_activity = Instant::now();
            }
        });

        tracker
    }

    pub fn in_flight_count(&self) -> usize {
        self.state.lock().unwrap().in_flight.len()
    }
}

#[async_trait]
impl Condition for NetworkIdleTracker {
    async fn check(&self) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.in_flight.is_empty() && state.last_activity.elapsed() >= self.idle_time)
    }

    fn description(&self) -> String {
        format!("network idle for {:?}", self.idle_time)
    }
}
