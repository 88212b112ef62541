use serde::{Deserialize, Serialize};

use super::{Method, MethodId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendNodeId(pub i64);

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnableParams {}
impl Method for EnableParams {
    fn identifier(&self) -> MethodId {
        "DOM.enable".into()
    }
}
impl super::Command for EnableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetDocumentParams {
    pub depth: Option<i64>,
    pub pierce: Option<bool>,
}
impl Method for GetDocumentParams {
    fn identifier(&self) -> MethodId {
        "DOM.getDocument".into()
    }
}
impl super::Command for GetDocumentParams {
    type Response = GetDocumentReturns;
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetDocumentReturns {
    pub root: Node,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub node_id: NodeId,
    pub backend_node_id: BackendNodeId,
    pub node_name: String,
    #[serde(default)]
    pub node_value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorParams {
    pub node_id: NodeId,
    pub selector: String,
}
impl Method for QuerySelectorParams {
    fn identifier(&self) -> MethodId {
        "DOM.querySelector".into()
    }
}
impl super::Command for QuerySelectorParams {
    type Response = QuerySelectorReturns;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorReturns {
    pub node_id: NodeId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorAllParams {
    pub node_id: NodeId,
    pub selector: String,
}
impl Method for QuerySelectorAllParams {
    fn identifier(&self) -> MethodId {
        "DOM.querySelectorAll".into()
    }
}
impl super::Command for QuerySelectorAllParams {
    type Response = QuerySelectorAllReturns;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorAllReturns {
    pub node_ids: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeNodeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<crate::cdp::runtime::RemoteObjectId>,
    pub depth: Option<i64>,
}
impl Method for DescribeNodeParams {
    fn identifier(&self) -> MethodId {
        "DOM.describeNode".into()
    }
}
impl super::Command for DescribeNodeParams {
    type Response = DescribeNodeReturns;
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescribeNodeReturns {
    pub node: Node,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveNodeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
}
impl Method for ResolveNodeParams {
    fn identifier(&self) -> MethodId {
        "DOM.resolveNode".into()
    }
}
impl super::Command for ResolveNodeParams {
    type Response = ResolveNodeReturns;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveNodeReturns {
    pub object: crate::cdp::runtime::RemoteObject,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBoxModelParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
}
impl Method for GetBoxModelParams {
    fn identifier(&self) -> MethodId {
        "DOM.getBoxModel".into()
    }
}
impl super::Command for GetBoxModelParams {
    type Response = GetBoxModelReturns;
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetBoxModelReturns {
    pub model: BoxModel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxModel {
    pub content: [f64; 8],
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAttributeValueParams {
    pub node_id: NodeId,
    pub name: String,
    pub value: String,
}
impl Method for SetAttributeValueParams {
    fn identifier(&self) -> MethodId {
        "DOM.setAttributeValue".into()
    }
}
impl super::Command for SetAttributeValueParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAttributeParams {
    pub node_id: NodeId,
    pub name: String,
}
impl Method for RemoveAttributeParams {
    fn identifier(&self) -> MethodId {
        "DOM.removeAttribute".into()
    }
}
impl super::Command for RemoveAttributeParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
}
impl Method for FocusParams {
    fn identifier(&self) -> MethodId {
        "DOM.focus".into()
    }
}
impl super::Command for FocusParams {
    type Response = serde_json::Value;
}
