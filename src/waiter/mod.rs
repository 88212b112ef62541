//! §4.7 Waiter Engine: polled conditions and event waits compose
//! uniformly through the [`Condition`] trait; [`wait_until`] is the
//! shared polling driver for both.

pub mod condition;
pub mod network_idle;

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::{CdpError, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A predicate with a human-readable description, used both standalone and
/// as a building block for `All`/`Any`/`Not` composites.
#[async_trait]
pub trait Condition: Send + Sync {
    async fn check(&self) -> Result<bool>;
    fn description(&self) -> String;
}

/// Repeatedly invokes `condition.check()` at `poll_interval`, returning the
/// first truthy value. The final sleep before the deadline is truncated so
/// the driver never overshoots it. `check()` exceptions are logged and
/// treated as falsy rather than propagated.
pub async fn wait_until(
    condition: &dyn Condition,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        match condition.check().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(err) => {
                tracing::debug!(description = %condition.description(), %err, "check() failed, treated as falsy");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(CdpError::WaitTimeout {
                description: condition.description(),
                timeout,
            });
        }
        let remaining = deadline - now;
        tokio::time::sleep(poll_interval.min(remaining)).await;
    }
}

/// `All(a, b, ...)`: short-circuits on the first falsy condition.
pub struct All(pub Vec<Box<dyn Condition>>);

#[async_trait]
impl Condition for All {
    async fn check(&self) -> Result<bool> {
        for c in &self.0 {
            if !c.check().await.unwrap_or(false) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn description(&self) -> String {
        format!(
            "all of [{}]",
            self.0.iter().map(|c| c.description()).collect::<Vec<_>>().join(", ")
        )
    }
}

/// `Any(a, b, ...)`: returns the first truthy condition.
pub struct Any(pub Vec<Box<dyn Condition>>);

#[async_trait]
impl Condition for Any {
    async fn check(&self) -> Result<bool> {
        for c in &self.0 {
            if c.check().await.unwrap_or(false) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn description(&self) -> String {
        format!(
            "any of [{}]",
            self.0.iter().map(|c| c.description()).collect::<Vec<_>>().join(", ")
        )
    }
}

/// `Not(a)`.
pub struct Not(pub Box<dyn Condition>);

#[async_trait]
impl Condition for Not {
    async fn check(&self) -> Result<bool> {
        Ok(!self.0.check().await.unwrap_or(false))
    }

    fn description(&self) -> String {
        format!("not({})", self.0.description())
    }
}

/// Registers a one-shot handler on `method`, resolved by the first event
/// whose deserialized payload satisfies `predicate`.
pub async fn wait_for_event<T, F>(
    mux: &crate::multiplexer::MultiplexerHandle,
    method: crate::cdp::MethodId,
    session_id: Option<String>,
    timeout: Duration,
    mut predicate: F,
) -> Result<T>
where
    T: crate::cdp::Event,
    F: FnMut(&T) -> bool + Send,
{
    use futures::StreamExt;
    let mut stream = crate::events::EventStream::<T>::new(mux.subscribe(method, session_id));
    let sleep = tokio::time::sleep(timeout);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            next = stream.next() => {
                match next {
                    Some(ev) if predicate(&ev) => return Ok(ev),
                    Some(_) => continue,
                    None => return Err(CdpError::TransportClosed),
                }
            }
            _ = &mut sleep => {
                return Err(CdpError::WaitTimeout {
                    description: format!("event wait on {}", std::any::type_name::<T>()),
                    timeout,
                });
            }
        }
    }
}
