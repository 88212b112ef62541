//! A tick-on-interval primitive, generalized by the Waiter Engine's polling
//! driver and used directly by the Multiplexer's command-eviction sweep.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Future;
use futures_timer::Delay;

pub struct PeriodicJob {
    interval: Duration,
    delay: Delay,
}

impl PeriodicJob {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            delay: Delay::new(interval),
        }
    }

    /// Returns `true` once per `interval`, resetting itself for the next
    /// tick. Never produces a `Poll::Ready(None)` — it runs forever.
    pub fn poll(&mut self, cx: &mut Context<'_>) -> bool {
        match Pin::new(&mut self.delay).poll(cx) {
            Poll::Ready(()) => {
                self.delay.reset(self.interval);
                true
            }
            Poll::Pending => false,
        }
    }
}

impl Default for PeriodicJob {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
