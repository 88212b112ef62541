use serde::{Deserialize, Serialize};

use super::network::{Headers, RequestData, RequestId};
use super::{Event, Method, MethodId};

#[derive(Debug, Clone, Serialize)]
pub struct RequestPattern {
    #[serde(rename = "urlPattern", skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<RequestPattern>>,
}
impl Method for EnableParams {
    fn identifier(&self) -> MethodId {
        "Fetch.enable".into()
    }
}
impl super::Command for EnableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueRequestParams {
    pub request_id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<HeaderEntry>>,
}
impl Method for ContinueRequestParams {
    fn identifier(&self) -> MethodId {
        "Fetch.continueRequest".into()
    }
}
impl super::Command for ContinueRequestParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorReason {
    Failed,
    BlockedByClient,
    Aborted,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailRequestParams {
    pub request_id: RequestId,
    pub error_reason: ErrorReason,
}
impl Method for FailRequestParams {
    fn identifier(&self) -> MethodId {
        "Fetch.failRequest".into()
    }
}
impl super::Command for FailRequestParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillRequestParams {
    pub request_id: RequestId,
    pub response_code: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Vec<HeaderEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}
impl Method for FulfillRequestParams {
    fn identifier(&self) -> MethodId {
        "Fetch.fulfillRequest".into()
    }
}
impl super::Command for FulfillRequestParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPausedEvent {
    pub request_id: RequestId,
    pub request: RequestData,
    #[serde(default)]
    pub resource_type: Option<String>,
}
impl Event for RequestPausedEvent {
    const METHOD: &'static str = "Fetch.requestPaused";
}

pub use Headers as FetchHeaders;
