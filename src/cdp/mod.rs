//! Hand-written subset of the Chrome DevTools Protocol: only the domains
//! and methods this crate actually drives (`Target`, `Page`, `DOM`,
//! `Runtime`, `Network`, `Fetch`, `Input`, `Emulation`). The full protocol
//! is normally machine-generated from Google's `.pdl` sources at build
//! time; those sources aren't available here, so the commands/events
//! consumed by the rest of this crate are typed by hand, and anything not
//! worth hand-typing stays a `serde_json::Value` at the boundary (see the
//! design note on a "pragmatic intermediate").

pub mod dom;
pub mod emulation;
pub mod fetch;
pub mod input;
pub mod network;
pub mod page;
pub mod runtime;
pub mod target;

use std::borrow::Cow;

use serde::{de::DeserializeOwned, Serialize};

/// A CDP method name, e.g. `"Page.navigate"`.
pub type MethodId = Cow<'static, str>;

/// A unique identifier of an outbound command on one transport.
pub type CallId = usize;

pub trait Method {
    fn identifier(&self) -> MethodId;
}

/// A typed CDP command: its params serialize to the `params` field of the
/// outbound envelope, and it names the type its `result` field deserializes
/// into.
pub trait Command: Serialize + Method {
    type Response: DeserializeOwned + std::fmt::Debug;
}

/// A typed CDP event: its payload deserializes from the `params` field of
/// an inbound event envelope.
pub trait Event: DeserializeOwned + std::fmt::Debug + Send + Sync + 'static {
    const METHOD: &'static str;
}

/// The outbound wire envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub id: CallId,
    pub method: MethodId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub params: serde_json::Value,
}

/// `{code, message, data?}` as returned by the browser for a failed
/// command.
#[derive(Debug, Clone, serde::Deserialize, thiserror::Error)]
#[error("({code}) {message}")]
pub struct CdpCallError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// An inbound response envelope, `id` always present.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Response {
    pub id: CallId,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<CdpCallError>,
}

impl Response {
    pub fn into_result<T: DeserializeOwned>(self) -> crate::error::Result<T> {
        if let Some(result) = self.result {
            Ok(serde_json::from_value(result)?)
        } else if let Some(err) = self.error {
            Err(err.into())
        } else {
            Err(crate::error::CdpError::NoResponse)
        }
    }
}

/// An inbound event envelope, no `id`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct EventEnvelope {
    pub method: MethodId,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

/// Either half of an inbound frame, discriminated by presence of `id`.
#[derive(Debug, Clone)]
pub enum Message {
    Response(Response),
    Event(EventEnvelope),
}

impl<'de> serde::Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.get("id").is_some() {
            serde_json::from_value(value)
                .map(Message::Response)
                .map_err(serde::de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(Message::Event)
                .map_err(serde::de::Error::custom)
        }
    }
}
