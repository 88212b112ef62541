use serde::{Deserialize, Serialize};

use super::{Event, Method, MethodId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteObjectId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionContextId(pub i64);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub object_id: Option<RemoteObjectId>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnableParams {}
impl Method for EnableParams {
    fn identifier(&self) -> MethodId {
        "Runtime.enable".into()
    }
}
impl super::Command for EnableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExceptionDetails {
    pub text: String,
    #[serde(default)]
    pub exception: Option<RemoteObject>,
    #[serde(default)]
    pub stack_trace: Option<serde_json::Value>,
}

impl ExceptionDetails {
    pub fn message(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.value.as_ref())
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.text.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<ExecutionContextId>,
}
impl Method for EvaluateParams {
    fn identifier(&self) -> MethodId {
        "Runtime.evaluate".into()
    }
}
impl super::Command for EvaluateParams {
    type Response = EvaluateReturns;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateReturns {
    pub result: RemoteObject,
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallArgument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "objectId")]
    pub object_id: Option<RemoteObjectId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnParams {
    pub function_declaration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<CallArgument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
}
impl Method for CallFunctionOnParams {
    fn identifier(&self) -> MethodId {
        "Runtime.callFunctionOn".into()
    }
}
impl super::Command for CallFunctionOnParams {
    type Response = CallFunctionOnReturns;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnReturns {
    pub result: RemoteObject,
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleApiCalledEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub args: Vec<RemoteObject>,
}
impl Event for ConsoleApiCalledEvent {
    const METHOD: &'static str = "Runtime.consoleAPICalled";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionThrownEvent {
    pub timestamp: f64,
    pub exception_details: ExceptionDetails,
}
impl Event for ExceptionThrownEvent {
    const METHOD: &'static str = "Runtime.exceptionThrown";
}
