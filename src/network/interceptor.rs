//! Request Interceptor (active): §4.8. Enables `Fetch` with URL patterns;
//! for each `Fetch.requestPaused`, scans the rule list top to bottom and
//! takes exactly one action per request.

use std::sync::{Arc, Mutex};

use futures::StreamExt;

use crate::cdp::fetch::{
    ContinueRequestParams, ErrorReason, FailRequestParams, FulfillRequestParams, HeaderEntry,
    RequestPattern, RequestPausedEvent,
};
use crate::cdp::network::RequestData;
use crate::error::Result;
use crate::multiplexer::MultiplexerHandle;
use crate::session::Session;

pub struct MockResponse {
    pub status: i64,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

pub enum InterceptAction {
    Block,
    Mock(MockResponse),
    Modify(Box<dyn Fn(&RequestData) -> RequestModification + Send + Sync>),
}

#[derive(Default)]
pub struct RequestModification {
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<Vec<(String, String)>>,
    pub post_data: Option<String>,
}

pub struct InterceptRule {
    pub pattern: String,
    pub action: InterceptAction,
    pub priority: i32,
}

use super::glob_match as matches_pattern;

pub struct RequestInterceptor {
    rules: Arc<Mutex<Vec<InterceptRule>>>,
}

impl RequestInterceptor {
    /// Enables `Fetch` with a catch-all pattern and spawns the background
    /// task that evaluates `rules` against every paused request.
    pub async fn attach(
        mux: &MultiplexerHandle,
        session: Arc<Session>,
        mut rules: Vec<InterceptRule>,
    ) -> Result<Self> {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        let rules = Arc::new(Mutex::new(rules));

        if session.mark_enabled("Fetch") {
            session
                .execute(crate::cdp::fetch::EnableParams {
                    patterns: Some(vec![RequestPattern { url_pattern: Some("*".to_string()) }]),
                })
                .await?;
        }

        let session_id = Some(session.session_id().0.clone());
        let task_rules = Arc::clone(&rules);
        let task_session = Arc::clone(&session);
        let mut paused = crate::events::EventStream::<RequestPausedEvent>::new(
            mux.subscribe("Fetch.requestPaused".into(), session_id),
        );
        tokio::spawn(async move {
            while let Some(ev) = paused.next().await {
                if let Err(err) = handle_paused(&task_session, &task_rules, ev).await {
                    tracing::warn!(%err, "failed to resolve a paused request");
                }
            }
        });

        Ok(Self { rules })
    }

    pub fn set_rules(&self, mut rules: Vec<InterceptRule>) {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        *self.rules.lock().unwrap() = rules;
    }
}

async fn handle_paused(
    session: &Session,
    rules: &Mutex<Vec<InterceptRule>>,
    ev: RequestPausedEvent,
) -> Result<()> {
    let action_taken = {
        let rules = rules.lock().unwrap();
        rules
            .iter()
            .find(|rule| matches_pattern(&rule.pattern, &ev.request.url))
            .map(|rule| resolve_action(&rule.action, &ev.request))
    };

    match action_taken {
        Some(Action::Block) => {
            session
                .execute(FailRequestParams {
                    request_id: ev.request_id,
                    error_reason: ErrorReason::BlockedByClient,
                })
                .await?;
        }
        Some(Action::Mock { status, headers, body }) => {
            use base64::Engine;
            session
                .execute(FulfillRequestParams {
                    request_id: ev.request_id,
                    response_code: status,
                    response_headers: Some(
                        headers
                            .into_iter()
                            .map(|(name, value)| HeaderEntry { name, value })
                            .collect(),
                    ),
                    body: Some(base64::engine::general_purpose::STANDARD.encode(body)),
                })
                .await?;
        }
        Some(Action::Modify(modification)) => {
            session
                .execute(ContinueRequestParams {
                    request_id: ev.request_id,
                    url: modification.url,
                    method: modification.method,
                    post_data: modification.post_data,
                    headers: modification.headers.map(|hs| {
                        hs.into_iter()
                            .map(|(name, value)| HeaderEntry { name, value })
                            .collect()
                    }),
                })
                .await?;
        }
        None => {
            session
                .execute(ContinueRequestParams {
                    request_id: ev.request_id,
                    url: None,
                    method: None,
                    post_data: None,
                    headers: None,
                })
                .await?;
        }
    }
    Ok(())
}

enum Action {
    Block,
    Mock { status: i64, headers: Vec<(String, String)>, body: Vec<u8> },
    Modify(RequestModification),
}

/// Can't hold the rules-table lock across an `.await`; the modifier closure
/// itself is synchronous, so the matched rule's effect — including the
/// `Modify` closure's result — is captured as an owned [`Action`] while the
/// lock is still held.
fn resolve_action(action: &InterceptAction, request: &RequestData) -> Action {
    match action {
        InterceptAction::Block => Action::Block,
        InterceptAction::Mock(response) => Action::Mock {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
        },
        InterceptAction::Modify(modifier) => Action::Modify(modifier(request)),
    }
}
