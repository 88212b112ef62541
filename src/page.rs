//! §4.4 Page Runtime: orchestrates the domain enables for one target,
//! tracks per-frame load state, and owns the DOM Service and Network
//! Monitor instances for that target.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use futures::StreamExt;

use crate::cdp::network::RequestId;
use crate::cdp::page::{
    DomContentEventFiredEvent, FrameNavigatedEvent, FrameStartedLoadingEvent,
    FrameStoppedLoadingEvent, JavascriptDialogOpeningEvent, LoadEventFiredEvent, NavigateParams,
};
use crate::cdp::runtime::{ConsoleApiCalledEvent, EvaluateParams, ExceptionThrownEvent};
use crate::dom::{DomService, Element};
use crate::error::{CdpError, Result};
use crate::events::EventStream;
use crate::frame::FrameManager;
use crate::hooks::{HookEvent, HookManager, HookPhase};
use crate::input::{Keyboard, Mouse};
use crate::multiplexer::MultiplexerHandle;
use crate::network::{InterceptRule, NetworkMonitor, RequestInterceptor};
use crate::session::Session;
use crate::stealth::{FingerprintProfile, StealthPatcher};
use crate::waiter::network_idle::{NetworkIdleTracker, DEFAULT_IDLE_TIME};
use crate::waiter::{wait_until, Condition, DEFAULT_POLL_INTERVAL};

/// Navigation wait states, §6 External Interfaces' navigation vocabulary
/// (distinct from the selector wait states in [`crate::dom::WaitState`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    Commit,
    DomContentLoaded,
    Load,
    NetworkIdle,
}

impl WaitUntil {
    fn as_str(self) -> &'static str {
        match self {
            WaitUntil::Commit => "commit",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::Load => "load",
            WaitUntil::NetworkIdle => "networkidle",
        }
    }
}

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_ELEMENT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Page {
    session: Arc<Session>,
    mux: MultiplexerHandle,
    hooks: Arc<HookManager>,
    frames: Mutex<FrameManager>,
    dom: Arc<DomService>,
    network: NetworkMonitor,
    mouse: Mouse,
    keyboard: Keyboard,
    network_idle: OnceLock<Arc<NetworkIdleTracker>>,
    interceptor: tokio::sync::OnceCell<RequestInterceptor>,
    /// Bumped whenever the main frame commits a new document, shared with
    /// `dom`'s own generation counter is not enough on its own: `DomService`
    /// needs to be told, not merely observed, which is why `on_navigated`'s
    /// return value is wired straight into `dom.invalidate()` below rather
    /// than read from here. Kept for diagnostics / tests only.
    navigation_count: AtomicU64,
}

impl Page {
    /// Enables `Page`, `DOM`, `Network` on `session` (idempotently, per
    /// §4.4) and starts the background tasks that keep frame load state
    /// current for the session's lifetime.
    pub async fn attach(
        mux: &MultiplexerHandle,
        session: Arc<Session>,
        hooks: Arc<HookManager>,
    ) -> Result<Arc<Self>> {
        if session.mark_enabled("Page") {
            session.execute(crate::cdp::page::EnableParams {}).await?;
        }
        let dom = Arc::new(DomService::for_session(Arc::clone(&session)).await?);
        let network = NetworkMonitor::attach(mux, Arc::clone(&session), Arc::clone(&hooks)).await?;

        let page = Arc::new(Self {
            session: Arc::clone(&session),
            mux: mux.clone(),
            hooks,
            frames: Mutex::new(FrameManager::default()),
            dom,
            network,
            mouse: Mouse::new(),
            keyboard: Keyboard::new(),
            network_idle: OnceLock::new(),
            interceptor: tokio::sync::OnceCell::new(),
            navigation_count: AtomicU64::new(0),
        });

        page.spawn_frame_tracking(mux, &session);
        page.spawn_hook_subscriptions(mux, &session);
        Ok(page)
    }

    fn spawn_frame_tracking(self: &Arc<Self>, mux: &MultiplexerHandle, session: &Arc<Session>) {
        let session_id = Some(session.session_id().0.clone());

        let started = Arc::clone(self);
        let mut starts = EventStream::<FrameStartedLoadingEvent>::new(
            mux.subscribe("Page.frameStartedLoading".into(), session_id.clone()),
        );
        tokio::spawn(async move {
            while let Some(ev) = starts.next().await {
                started.frames.lock().unwrap().on_started_loading(ev.frame_id);
            }
        });

        let navigated = Arc::clone(self);
        let mut navs = EventStream::<FrameNavigatedEvent>::new(
            mux.subscribe("Page.frameNavigated".into(), session_id.clone()),
        );
        tokio::spawn(async move {
            while let Some(ev) = navs.next().await {
                let is_main = ev.frame.parent_id.is_none();
                let became_main = navigated
                    .frames
                    .lock()
                    .unwrap()
                    .on_navigated(ev.frame.id, ev.frame.url, is_main);
                if became_main {
                    navigated.navigation_count.fetch_add(1, Ordering::AcqRel);
                    navigated.dom.invalidate();
                }
            }
        });

        let dcl = Arc::clone(self);
        let mut dom_events = EventStream::<DomContentEventFiredEvent>::new(
            mux.subscribe("Page.domContentEventFired".into(), session_id.clone()),
        );
        tokio::spawn(async move {
            while dom_events.next().await.is_some() {
                dcl.frames.lock().unwrap().on_dom_content_loaded();
            }
        });

        let loaded = Arc::clone(self);
        let mut load_events = EventStream::<LoadEventFiredEvent>::new(
            mux.subscribe("Page.loadEventFired".into(), session_id.clone()),
        );
        tokio::spawn(async move {
            while load_events.next().await.is_some() {
                loaded.frames.lock().unwrap().on_load();
            }
        });

        let stopped = Arc::clone(self);
        let mut stops = EventStream::<FrameStoppedLoadingEvent>::new(
            mux.subscribe("Page.frameStoppedLoading".into(), session_id),
        );
        tokio::spawn(async move {
            while let Some(ev) = stops.next().await {
                stopped.frames.lock().unwrap().on_stopped_loading(&ev.frame_id);
            }
        });
    }

    /// Enables `Runtime` and forwards console/dialog/uncaught-exception CDP
    /// events into the hook manager for the session's lifetime (§4.10).
    fn spawn_hook_subscriptions(self: &Arc<Self>, mux: &MultiplexerHandle, session: &Arc<Session>) {
        let session_id = Some(session.session_id().0.clone());
        let session = Arc::clone(session);
        let page = Arc::clone(self);
        let mux = mux.clone();
        tokio::spawn(async move {
            if session.mark_enabled("Runtime") {
                let _ = session.execute(crate::cdp::runtime::EnableParams {}).await;
            }

            let mut console = EventStream::<ConsoleApiCalledEvent>::new(
                mux.subscribe("Runtime.consoleAPICalled".into(), session_id.clone()),
            );
            let console_page = Arc::clone(&page);
            tokio::spawn(async move {
                while let Some(ev) = console.next().await {
                    let message = ev
                        .args
                        .first()
                        .and_then(|a| a.value.as_ref())
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| ev.kind.clone());
                    console_page
                        .hooks
                        .fire(
                            HookPhase::ConsoleMessage,
                            HookEvent::new(message).with_data(serde_json::json!({"type": ev.kind})),
                        )
                        .await;
                }
            });

            let mut dialogs = EventStream::<JavascriptDialogOpeningEvent>::new(
                mux.subscribe("Page.javascriptDialogOpening".into(), session_id.clone()),
            );
            let dialog_page = Arc::clone(&page);
            tokio::spawn(async move {
                while let Some(ev) = dialogs.next().await {
                    dialog_page
                        .hooks
                        .fire(
                            HookPhase::DialogOpened,
                            HookEvent::new(ev.message)
                                .with_data(serde_json::json!({"type": ev.dialog_type, "url": ev.url})),
                        )
                        .await;
                }
            });

            let mut exceptions = EventStream::<ExceptionThrownEvent>::new(
                mux.subscribe("Runtime.exceptionThrown".into(), session_id),
            );
            tokio::spawn(async move {
                while let Some(ev) = exceptions.next().await {
                    page.hooks
                        .fire(HookPhase::PageError, HookEvent::new(ev.exception_details.message()))
                        .await;
                }
            });
        });
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn dom(&self) -> &Arc<DomService> {
        &self.dom
    }

    pub fn network(&self) -> &NetworkMonitor {
        &self.network
    }

    pub fn mouse(&self) -> &Mouse {
        &self.mouse
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn current_url(&self) -> Option<String> {
        self.frames.lock().unwrap().main_frame().map(|f| f.url.clone())
    }

    /// §4.9: applies a fingerprint profile to this session before any
    /// further navigation — the injected script only affects documents
    /// created after it is registered.
    pub async fn apply_stealth(&self, profile: &FingerprintProfile) -> Result<()> {
        StealthPatcher::apply(&self.session, profile).await
    }

    fn network_idle_tracker(&self) -> Arc<NetworkIdleTracker> {
        self.network_idle
            .get_or_init(|| NetworkIdleTracker::attach(&self.mux, &self.session, DEFAULT_IDLE_TIME))
            .clone()
    }

    /// Lazily enables `Fetch` and starts intercepting with `rules`; a
    /// second call just replaces the rule set (§4.8).
    pub async fn enable_interception(&self, rules: Vec<InterceptRule>) -> Result<()> {
        if let Some(existing) = self.interceptor.get() {
            existing.set_rules(rules);
            return Ok(());
        }
        let interceptor = RequestInterceptor::attach(&self.mux, Arc::clone(&self.session), rules).await?;
        let _ = self.interceptor.set(interceptor);
        Ok(())
    }

    /// §4.4 navigation contract: issue `Page.navigate`, then wait for the
    /// condition `wait_until` names. Event subscriptions are opened before
    /// `Page.navigate` is sent so a fast-firing event can't be missed
    /// between submission and subscription — the multiplexer processes
    /// inbox messages (subscribe, then submit) strictly in send order
    /// (§4.2), so this ordering is sufficient without extra locking.
    pub async fn goto(&self, url: &str, wait_until: WaitUntil, deadline: Duration) -> Result<String> {
        let nav_event = self
            .hooks
            .fire(HookPhase::PageNavigate, HookEvent::new(url.to_string()))
            .await;
        if nav_event.cancel {
            return Err(CdpError::msg(format!("navigation to {url:?} cancelled by a hook")));
        }

        let overall_deadline = Instant::now() + deadline;
        let session_id = Some(self.session.session_id().0.clone());

        let mut dom_content: Option<EventStream<DomContentEventFiredEvent>> =
            matches!(wait_until, WaitUntil::DomContentLoaded).then(|| {
                EventStream::new(
                    self.mux
                        .subscribe("Page.domContentEventFired".into(), session_id.clone()),
                )
            });
        let mut load: Option<EventStream<LoadEventFiredEvent>> =
            matches!(wait_until, WaitUntil::Load | WaitUntil::NetworkIdle).then(|| {
                EventStream::new(self.mux.subscribe("Page.loadEventFired".into(), session_id.clone()))
            });

        let nav = self
            .session
            .execute(NavigateParams {
                url: url.to_string(),
                referrer: None,
                frame_id: None,
            })
            .await?;
        if let Some(err) = nav.error_text {
            return Err(CdpError::NavigationError(err));
        }

        match wait_until {
            WaitUntil::Commit => {}
            WaitUntil::DomContentLoaded => {
                wait_for_one(dom_content.as_mut().unwrap(), overall_deadline, wait_until).await?;
            }
            WaitUntil::Load => {
                wait_for_one(load.as_mut().unwrap(), overall_deadline, wait_until).await?;
            }
            WaitUntil::NetworkIdle => {
                wait_for_one(load.as_mut().unwrap(), overall_deadline, wait_until).await?;
                let tracker = self.network_idle_tracker();
                let remaining = overall_deadline.saturating_duration_since(Instant::now());
                wait_until_deadline(tracker.as_ref(), remaining).await?;
            }
        }

        Ok(self.current_url().unwrap_or_else(|| url.to_string()))
    }

    /// §4.4 evaluation: maps to `Runtime.evaluate`; exceptions surface as
    /// `ScriptError`.
    pub async fn evaluate(
        &self,
        expression: impl Into<String>,
        await_promise: bool,
        return_by_value: bool,
    ) -> Result<serde_json::Value> {
        let resp = self
            .session
            .execute(EvaluateParams {
                expression: expression.into(),
                await_promise: Some(await_promise),
                return_by_value: Some(return_by_value),
                context_id: None,
            })
            .await?;
        if let Some(exception) = resp.exception_details {
            return Err(CdpError::ScriptError {
                message: exception.message(),
                stack: exception.stack_trace.map(|v| v.to_string()),
            });
        }
        Ok(resp.result.value.unwrap_or(serde_json::Value::Null))
    }

    pub async fn find_element(&self, selector: &str) -> Result<Element> {
        self.dom.find_element(selector).await
    }

    pub async fn find_elements(&self, selector: &str) -> Result<Vec<Element>> {
        self.dom.find_elements(selector).await
    }

    pub async fn click(&self, selector: &str, force: bool) -> Result<()> {
        self.find_element(selector).await?.click(&self.mouse, force).await
    }

    pub async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.find_element(selector)
            .await?
            .type_text(&self.keyboard, text)
            .await
    }

    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.find_element(selector).await?.fill(value).await
    }

    pub async fn press_key(&self, name: &str) -> Result<()> {
        self.keyboard.press_named(&self.session, name).await
    }

    /// Holds every key but the last as a modifier and presses the last
    /// (e.g. `["Control", "a"]` for select-all).
    pub async fn shortcut(&self, keys: &[&str]) -> Result<()> {
        self.keyboard.shortcut(&self.session, keys).await
    }

    /// Waits on an arbitrary [`Condition`], e.g. one of the built-ins in
    /// [`crate::waiter::condition`].
    pub async fn wait_for(&self, condition: &dyn Condition, timeout: Duration) -> Result<()> {
        wait_until(condition, timeout, DEFAULT_POLL_INTERVAL).await
    }

    pub async fn wait_for_selector(
        &self,
        selector: &str,
        state: crate::dom::WaitState,
        timeout: Duration,
    ) -> Result<()> {
        let condition = crate::waiter::condition::SelectorState::new(Arc::clone(&self.dom), selector, state);
        self.wait_for(&condition, timeout).await
    }

    pub async fn get_response_body(&self, request_id: &RequestId) -> Result<Vec<u8>> {
        self.network.get_response_body(request_id).await
    }
}

/// Awaits the next item on `stream`, turning "nothing before `deadline`"
/// into a `WaitTimeout` for `wait_until`'s description.
async fn wait_for_one<T>(
    stream: &mut EventStream<T>,
    deadline: Instant,
    wait_until: WaitUntil,
) -> Result<T>
where
    T: crate::cdp::Event,
{
    let remaining = deadline.saturating_duration_since(Instant::now());
    let sleep = tokio::time::sleep(remaining);
    tokio::pin!(sleep);
    tokio::select! {
        ev = stream.next() => ev.ok_or(CdpError::TransportClosed),
        _ = &mut sleep => Err(CdpError::navigation_timeout(wait_until.as_str())),
    }
}

async fn wait_until_deadline(condition: &dyn Condition, remaining: Duration) -> Result<()> {
    if remaining.is_zero() {
        return Err(CdpError::navigation_timeout(WaitUntil::NetworkIdle.as_str()));
    }
    wait_until(condition, remaining, DEFAULT_POLL_INTERVAL)
        .await
        .map_err(|_| CdpError::navigation_timeout(WaitUntil::NetworkIdle.as_str()))
}
