use serde::{Deserialize, Serialize};

use super::{Event, Method, MethodId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl From<String> for TargetId {
    fn from(s: String) -> Self {
        TargetId(s)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        SessionId(s)
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub target_id: TargetId,
    #[serde(rename = "type")]
    pub target_type: String,
    pub title: String,
    pub url: String,
    pub attached: bool,
    #[serde(default)]
    pub opener_id: Option<TargetId>,
    #[serde(default)]
    pub browser_context_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsParams {}

impl Method for GetTargetsParams {
    fn identifier(&self) -> MethodId {
        "Target.getTargets".into()
    }
}
impl super::Command for GetTargetsParams {
    type Response = GetTargetsReturns;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsReturns {
    pub target_infos: Vec<TargetInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetParams {
    pub target_id: TargetId,
    pub flatten: bool,
}

impl Method for AttachToTargetParams {
    fn identifier(&self) -> MethodId {
        "Target.attachToTarget".into()
    }
}
impl super::Command for AttachToTargetParams {
    type Response = AttachToTargetReturns;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetReturns {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachFromTargetParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl Method for DetachFromTargetParams {
    fn identifier(&self) -> MethodId {
        "Target.detachFromTarget".into()
    }
}
impl super::Command for DetachFromTargetParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetParams {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_context_id: Option<String>,
}

impl Method for CreateTargetParams {
    fn identifier(&self) -> MethodId {
        "Target.createTarget".into()
    }
}
impl super::Command for CreateTargetParams {
    type Response = CreateTargetReturns;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetReturns {
    pub target_id: TargetId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTargetParams {
    pub target_id: TargetId,
}

impl Method for CloseTargetParams {
    fn identifier(&self) -> MethodId {
        "Target.closeTarget".into()
    }
}
impl super::Command for CloseTargetParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAutoAttachParams {
    pub auto_attach: bool,
    pub wait_for_debugger_on_start: bool,
    pub flatten: bool,
}

impl Method for SetAutoAttachParams {
    fn identifier(&self) -> MethodId {
        "Target.setAutoAttach".into()
    }
}
impl super::Command for SetAutoAttachParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDiscoverTargetsParams {
    pub discover: bool,
}

impl Method for SetDiscoverTargetsParams {
    fn identifier(&self) -> MethodId {
        "Target.setDiscoverTargets".into()
    }
}
impl super::Command for SetDiscoverTargetsParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCreatedEvent {
    pub target_info: TargetInfo,
}
impl Event for TargetCreatedEvent {
    const METHOD: &'static str = "Target.targetCreated";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDestroyedEvent {
    pub target_id: TargetId,
}
impl Event for TargetDestroyedEvent {
    const METHOD: &'static str = "Target.targetDestroyed";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfoChangedEvent {
    pub target_info: TargetInfo,
}
impl Event for TargetInfoChangedEvent {
    const METHOD: &'static str = "Target.targetInfoChanged";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedToTargetEvent {
    pub session_id: SessionId,
    pub target_info: TargetInfo,
}
impl Event for AttachedToTargetEvent {
    const METHOD: &'static str = "Target.attachedToTarget";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedFromTargetEvent {
    pub session_id: SessionId,
    #[serde(default)]
    pub target_id: Option<TargetId>,
}
impl Event for DetachedFromTargetEvent {
    const METHOD: &'static str = "Target.detachedFromTarget";
}
