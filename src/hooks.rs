//! Hook manager (§4.10): a closed-enum specialization of the pub/sub idea
//! in `events.rs`, for cross-component lifecycle notifications that have
//! nothing to do with a CDP method name — browser/context/page lifecycle,
//! network request lifecycle, console/dialog/error surfaces. New code; no
//! teacher equivalent, phase list cross-checked against
//! `examples/original_source/kuromi_browser/events`.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

/// Fixed lifecycle phases a hook can subscribe to. Deliberately closed —
/// new phases are a breaking change, not a string callers can typo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    BrowserLaunch,
    BrowserConnected,
    BrowserClose,
    ContextCreated,
    ContextClose,
    PageCreated,
    PageNavigate,
    PageLoad,
    PageClose,
    RequestStart,
    RequestComplete,
    RequestFailed,
    PageError,
    ConsoleMessage,
    DialogOpened,
}

/// Payload handed to a hook. `cancel` is observed only at pre-operation
/// sites (`PageNavigate`, `RequestStart`); setting it elsewhere is a no-op.
#[derive(Debug, Clone, Default)]
pub struct HookEvent {
    pub phase: Option<HookPhase>,
    pub message: String,
    pub data: serde_json::Value,
    pub cancel: bool,
}

impl HookEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            phase: None,
            message: message.into(),
            data: serde_json::Value::Null,
            cancel: false,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

pub type HookFn = Arc<dyn Fn(&mut HookEvent) + Send + Sync>;

struct HookEntry {
    id: u64,
    priority: i32,
    once: bool,
    fired: bool,
    handler: HookFn,
}

/// Priority-ordered, optionally one-shot hook registry for one phase enum.
/// Execution within a phase is strictly sequential (§5 "Hook phases within
/// a single operation run sequentially in priority order"), so handlers
/// never need their own synchronization to observe each other's `cancel`.
#[derive(Default)]
pub struct HookManager {
    phases: Mutex<HashMap<HookPhase, Vec<HookEntry>>>,
    next_id: AtomicU64,
}

/// Handle returned by `on`/`once`, usable to unregister the hook later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookId(u64, HookPhase);

impl HookManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn on(&self, phase: HookPhase, priority: i32, handler: HookFn) -> HookId {
        self.register(phase, priority, false, handler).await
    }

    pub async fn once(&self, phase: HookPhase, priority: i32, handler: HookFn) -> HookId {
        self.register(phase, priority, true, handler).await
    }

    async fn register(&self, phase: HookPhase, priority: i32, once: bool, handler: HookFn) -> HookId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut phases = self.phases.lock().await;
        let entries = phases.entry(phase).or_default();
        entries.push(HookEntry {
            id,
            priority,
            once,
            fired: false,
            handler,
        });
        entries.sort_by_key(|e| Reverse(e.priority));
        HookId(id, phase)
    }

    pub async fn off(&self, id: HookId) {
        let mut phases = self.phases.lock().await;
        if let Some(entries) = phases.get_mut(&id.1) {
            entries.retain(|e| e.id != id.0);
        }
    }

    /// Runs every hook registered for `phase` in descending-priority order,
    /// stopping early if a handler sets `cancel`. Returns the event with
    /// whatever `cancel`/`data` mutations the handlers left on it.
    pub async fn fire(&self, phase: HookPhase, mut event: HookEvent) -> HookEvent {
        event.phase = Some(phase);
        let mut phases = self.phases.lock().await;
        let Some(entries) = phases.get_mut(&phase) else {
            return event;
        };

        for entry in entries.iter_mut() {
            (entry.handler)(&mut event);
            if entry.once {
                entry.fired = true;
            }
            if event.cancel {
                break;
            }
        }
        entries.retain(|e| !e.fired);
        event
    }

    pub async fn listener_count(&self, phase: HookPhase) -> usize {
        self.phases
            .lock()
            .await
            .get(&phase)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn runs_in_descending_priority_order() {
        let manager = HookManager::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        manager
            .on(HookPhase::PageNavigate, 1, Arc::new(move |_| o1.lock().unwrap().push(1)))
            .await;
        let o2 = Arc::clone(&order);
        manager
            .on(HookPhase::PageNavigate, 10, Arc::new(move |_| o2.lock().unwrap().push(10)))
            .await;

        manager
            .fire(HookPhase::PageNavigate, HookEvent::new("navigate"))
            .await;
        assert_eq!(*order.lock().unwrap(), vec![10, 1]);
    }

    #[tokio::test]
    async fn once_hook_fires_a_single_time() {
        let manager = HookManager::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        manager
            .once(
                HookPhase::BrowserLaunch,
                0,
                Arc::new(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;

        manager
            .fire(HookPhase::BrowserLaunch, HookEvent::new("launch"))
            .await;
        manager
            .fire(HookPhase::BrowserLaunch, HookEvent::new("launch"))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_stops_remaining_hooks() {
        let manager = HookManager::new();
        let calls = Arc::new(AtomicUsize::new(0));

        manager
            .on(
                HookPhase::RequestStart,
                10,
                Arc::new(|ev: &mut HookEvent| ev.cancel = true),
            )
            .await;
        let c = Arc::clone(&calls);
        manager
            .on(
                HookPhase::RequestStart,
                1,
                Arc::new(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;

        let result = manager
            .fire(HookPhase::RequestStart, HookEvent::new("request"))
            .await;

        assert!(result.cancel);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
