//! Network Monitor (passive): accumulates request records, answers
//! `get_requests`/`get_response_body`/`wait_for_request`/`wait_for_response`
//! (§4.8, §3 Data Model "Network request record").

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;

use crate::cdp::network::{
    GetResponseBodyParams, LoadingFailedEvent, LoadingFinishedEvent, RequestData, RequestId,
    RequestWillBeSentEvent, ResponseData, ResponseReceivedEvent,
};
use crate::error::{CdpError, Result};
use crate::hooks::{HookEvent, HookManager, HookPhase};
use crate::multiplexer::MultiplexerHandle;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub request_id: RequestId,
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub post_data: Option<String>,
    pub resource_type: Option<String>,
    pub timestamp: f64,
    pub redirect_chain: Vec<ResponseData>,
    pub response: Option<ResponseData>,
    pub response_timestamp: Option<f64>,
    pub finished: bool,
    pub failed: Option<String>,
}

impl RequestRecord {
    fn from_event(ev: RequestWillBeSentEvent) -> Self {
        let mut redirect_chain = Vec::new();
        if let Some(redirect) = ev.redirect_response {
            redirect_chain.push(redirect);
        }
        Self {
            request_id: ev.request_id,
            url: ev.request.url,
            method: ev.request.method,
            headers: ev.request.headers,
            post_data: ev.request.post_data,
            resource_type: ev.resource_type,
            timestamp: ev.timestamp,
            redirect_chain,
            response: None,
            response_timestamp: None,
            finished: false,
            failed: None,
        }
    }
}

use super::glob_match;

pub struct NetworkMonitor {
    session: Arc<Session>,
    mux: MultiplexerHandle,
    records: Arc<Mutex<HashMap<RequestId, RequestRecord>>>,
}

impl NetworkMonitor {
    /// Enables `Network` and starts the background listeners that keep the
    /// request-record table current for the lifetime of `session`.
    pub async fn attach(
        mux: &MultiplexerHandle,
        session: Arc<Session>,
        hooks: Arc<HookManager>,
    ) -> Result<Self> {
        if session.mark_enabled("Network") {
            session.execute(crate::cdp::network::EnableParams {}).await?;
        }
        let records: Arc<Mutex<HashMap<RequestId, RequestRecord>>> = Arc::new(Mutex::new(HashMap::new()));
        let session_id = Some(session.session_id().0.clone());

        let started = Arc::clone(&records);
        let request_hooks = Arc::clone(&hooks);
        let mut requests = crate::events::EventStream::<RequestWillBeSentEvent>::new(
            mux.subscribe("Network.requestWillBeSent".into(), session_id.clone()),
        );
        tokio::spawn(async move {
            while let Some(ev) = requests.next().await {
                request_hooks
                    .fire(
                        HookPhase::RequestStart,
                        HookEvent::new(ev.request.url.clone()).with_data(serde_json::json!({
                            "requestId": ev.request_id.0.clone(),
                            "method": ev.request.method.clone(),
                        })),
                    )
                    .await;
                let mut records = started.lock().unwrap();
                records.insert(ev.request_id.clone(), RequestRecord::from_event(ev));
            }
        });

        let responded = Arc::clone(&records);
        let mut responses = crate::events::EventStream::<ResponseReceivedEvent>::new(
            mux.subscribe("Network.responseReceived".into(), session_id.clone()),
        );
        tokio::spawn(async move {
            while let Some(ev) = responses.next().await {
                if let Some(record) = responded.lock().unwrap().get_mut(&ev.request_id) {
                    record.response = Some(ev.response);
                    record.response_timestamp = Some(ev.timestamp);
                }
            }
        });

        let finished = Arc::clone(&records);
        let complete_hooks = Arc::clone(&hooks);
        let mut done = crate::events::EventStream::<LoadingFinishedEvent>::new(
            mux.subscribe("Network.loadingFinished".into(), session_id.clone()),
        );
        tokio::spawn(async move {
            while let Some(ev) = done.next().await {
                let url = {
                    let mut records = finished.lock().unwrap();
                    records.get_mut(&ev.request_id).map(|record| {
                        record.finished = true;
                        record.url.clone()
                    })
                };
                complete_hooks
                    .fire(
                        HookPhase::RequestComplete,
                        HookEvent::new(url.unwrap_or_default())
                            .with_data(serde_json::json!({"requestId": ev.request_id.0})),
                    )
                    .await;
            }
        });

        let failed = Arc::clone(&records);
        let fail_hooks = Arc::clone(&hooks);
        let mut errs = crate::events::EventStream::<LoadingFailedEvent>::new(
            mux.subscribe("Network.loadingFailed".into(), session_id),
        );
        tokio::spawn(async move {
            while let Some(ev) = errs.next().await {
                if let Some(record) = failed.lock().unwrap().get_mut(&ev.request_id) {
                    record.failed = Some(ev.error_text.clone());
                }
                fail_hooks
                    .fire(
                        HookPhase::RequestFailed,
                        HookEvent::new(ev.error_text)
                            .with_data(serde_json::json!({"requestId": ev.request_id.0})),
                    )
                    .await;
            }
        });

        Ok(Self {
            session,
            mux: mux.clone(),
            records,
        })
    }

    pub fn get_requests(&self, url_glob: Option<&str>) -> Vec<RequestRecord> {
        let records = self.records.lock().unwrap();
        records
            .values()
            .filter(|r| url_glob.map_or(true, |glob| glob_match(glob, &r.url)))
            .cloned()
            .collect()
    }

    pub async fn get_response_body(&self, request_id: &RequestId) -> Result<Vec<u8>> {
        let resp = self
            .session
            .execute(GetResponseBodyParams {
                request_id: request_id.clone(),
            })
            .await?;
        if resp.base64_encoded {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(resp.body.as_bytes())
                .map_err(|e| CdpError::msg(format!("response body is not valid base64: {e}")))
        } else {
            Ok(resp.body.into_bytes())
        }
    }

    pub async fn wait_for_request(&self, url_glob: &str, timeout: Duration) -> Result<RequestRecord> {
        if let Some(existing) = self.get_requests(Some(url_glob)).into_iter().next() {
            return Ok(existing);
        }
        let glob = url_glob.to_string();
        crate::waiter::wait_for_event::<RequestWillBeSentEvent, _>(
            &self.mux,
            "Network.requestWillBeSent".into(),
            Some(self.session.session_id().0.clone()),
            timeout,
            move |ev| glob_match(&glob, &ev.request.url),
        )
        .await
        .map(RequestRecord::from_event)
    }

    pub async fn wait_for_response(&self, url_glob: &str, timeout: Duration) -> Result<ResponseData> {
        let glob = url_glob.to_string();
        crate::waiter::wait_for_event::<ResponseReceivedEvent, _>(
            &self.mux,
            "Network.responseReceived".into(),
            Some(self.session.session_id().0.clone()),
            timeout,
            move |ev| glob_match(&glob, &ev.response.url),
        )
        .await
        .map(|ev| ev.response)
    }
}
