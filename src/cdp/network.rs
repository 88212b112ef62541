use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Event, Method, MethodId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

pub type Headers = HashMap<String, String>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnableParams {}
impl Method for EnableParams {
    fn identifier(&self) -> MethodId {
        "Network.enable".into()
    }
}
impl super::Command for EnableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetExtraHttpHeadersParams {
    pub headers: Headers,
}
impl Method for SetExtraHttpHeadersParams {
    fn identifier(&self) -> MethodId {
        "Network.setExtraHTTPHeaders".into()
    }
}
impl super::Command for SetExtraHttpHeadersParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAgentBrandVersion {
    pub brand: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAgentMetadata {
    pub brands: Vec<UserAgentBrandVersion>,
    pub full_version_list: Vec<UserAgentBrandVersion>,
    pub platform: String,
    pub platform_version: String,
    pub architecture: String,
    pub model: String,
    pub mobile: bool,
    pub bitness: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUserAgentOverrideParams {
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent_metadata: Option<UserAgentMetadata>,
}
impl Method for SetUserAgentOverrideParams {
    fn identifier(&self) -> MethodId {
        "Network.setUserAgentOverride".into()
    }
}
impl super::Command for SetUserAgentOverrideParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponseBodyParams {
    pub request_id: RequestId,
}
impl Method for GetResponseBodyParams {
    fn identifier(&self) -> MethodId {
        "Network.getResponseBody".into()
    }
}
impl super::Command for GetResponseBodyParams {
    type Response = GetResponseBodyReturns;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponseBodyReturns {
    pub body: String,
    pub base64_encoded: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWillBeSentEvent {
    pub request_id: RequestId,
    pub request: RequestData,
    pub timestamp: f64,
    #[serde(rename = "type", default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub redirect_response: Option<ResponseData>,
}
impl Event for RequestWillBeSentEvent {
    const METHOD: &'static str = "Network.requestWillBeSent";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub post_data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    pub url: String,
    pub status: i64,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub mime_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceivedEvent {
    pub request_id: RequestId,
    pub response: ResponseData,
    pub timestamp: f64,
}
impl Event for ResponseReceivedEvent {
    const METHOD: &'static str = "Network.responseReceived";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFinishedEvent {
    pub request_id: RequestId,
    pub timestamp: f64,
}
impl Event for LoadingFinishedEvent {
    const METHOD: &'static str = "Network.loadingFinished";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFailedEvent {
    pub request_id: RequestId,
    pub timestamp: f64,
    pub error_text: String,
}
impl Event for LoadingFailedEvent {
    const METHOD: &'static str = "Network.loadingFailed";
}
