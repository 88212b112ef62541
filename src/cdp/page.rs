use serde::{Deserialize, Serialize};

use super::{Event, Method, MethodId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub String);

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnableParams {}
impl Method for EnableParams {
    fn identifier(&self) -> MethodId {
        "Page.enable".into()
    }
}
impl super::Command for EnableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<FrameId>,
}

impl NavigateParams {
    pub const IDENTIFIER: &'static str = "Page.navigate";
}

impl Method for NavigateParams {
    fn identifier(&self) -> MethodId {
        Self::IDENTIFIER.into()
    }
}
impl super::Command for NavigateParams {
    type Response = NavigateReturns;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateReturns {
    pub frame_id: FrameId,
    #[serde(default)]
    pub error_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddScriptToEvaluateOnNewDocumentParams {
    pub source: String,
}

impl Method for AddScriptToEvaluateOnNewDocumentParams {
    fn identifier(&self) -> MethodId {
        "Page.addScriptToEvaluateOnNewDocument".into()
    }
}
impl super::Command for AddScriptToEvaluateOnNewDocumentParams {
    type Response = AddScriptToEvaluateOnNewDocumentReturns;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddScriptToEvaluateOnNewDocumentReturns {
    pub identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStartedLoadingEvent {
    pub frame_id: FrameId,
}
impl Event for FrameStartedLoadingEvent {
    const METHOD: &'static str = "Page.frameStartedLoading";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: FrameId,
    #[serde(default)]
    pub parent_id: Option<FrameId>,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameNavigatedEvent {
    pub frame: Frame,
}
impl Event for FrameNavigatedEvent {
    const METHOD: &'static str = "Page.frameNavigated";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomContentEventFiredEvent {
    pub timestamp: f64,
}
impl Event for DomContentEventFiredEvent {
    const METHOD: &'static str = "Page.domContentEventFired";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadEventFiredEvent {
    pub timestamp: f64,
}
impl Event for LoadEventFiredEvent {
    const METHOD: &'static str = "Page.loadEventFired";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStoppedLoadingEvent {
    pub frame_id: FrameId,
}
impl Event for FrameStoppedLoadingEvent {
    const METHOD: &'static str = "Page.frameStoppedLoading";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavascriptDialogOpeningEvent {
    pub url: String,
    pub message: String,
    #[serde(rename = "type")]
    pub dialog_type: String,
}
impl Event for JavascriptDialogOpeningEvent {
    const METHOD: &'static str = "Page.javascriptDialogOpening";
}
