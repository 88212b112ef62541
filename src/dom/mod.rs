//! §4.5 DOM Service: converts selectors into node references, maintains
//! element handles, and traverses shadow roots and iframes.

pub mod element;
pub mod selector;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cdp::dom::{GetDocumentParams, QuerySelectorAllParams, QuerySelectorParams};
use crate::cdp::runtime::EvaluateParams;
use crate::error::{CdpError, Result};
use crate::session::Session;

pub use element::{Element, Rect};
pub use selector::{Selector, WaitState};

/// A recursive-descent shadow-pierce query, run as a single injected JS
/// function to avoid O(tree) round-trips (§4.5).
const PIERCE_QUERY_ALL: &str = "function(selector) {
    const out = [];
    const walk = (root) => {
        for (const el of root.querySelectorAll('*')) {
            if (el.matches(selector)) out.push(el);
            if (el.shadowRoot) walk(el.shadowRoot);
        }
    };
    walk(this);
    return out;
}";

/// Resolves a remote object to a `node_id` via `DOM.requestNode`; shared by
/// `DomService`'s xpath/shadow-pierce queries and `Element`'s relation
/// queries, which need the same object-to-node-id step scoped to their own
/// remote object instead of the document root.
pub(crate) async fn request_node_id(
    session: &Session,
    object_id: &crate::cdp::runtime::RemoteObjectId,
) -> Result<crate::cdp::dom::NodeId> {
    #[derive(serde::Serialize)]
    #[serde(rename_all = "camelCase")]
    struct RequestNodeParams {
        object_id: crate::cdp::runtime::RemoteObjectId,
    }
    #[derive(serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RequestNodeReturns {
        node_id: crate::cdp::dom::NodeId,
    }
    impl crate::cdp::Method for RequestNodeParams {
        fn identifier(&self) -> crate::cdp::MethodId {
            "DOM.requestNode".into()
        }
    }
    impl crate::cdp::Command for RequestNodeParams {
        type Response = RequestNodeReturns;
    }
    let resp = session
        .execute(RequestNodeParams {
            object_id: object_id.clone(),
        })
        .await?;
    Ok(resp.node_id)
}

/// Root-scoped view over one document. Each iframe entry
/// (`Element::content_document`) constructs a new `DomService` bound to the
/// same session with the frame's `contentDocument` as root; cross-origin
/// frames are separate targets reached through the Target Manager instead.
pub struct DomService {
    session: Arc<Session>,
    root_node_id: crate::cdp::dom::NodeId,
    /// Bumped on every same-target navigation of the main frame; `Element`
    /// handles capture the value at resolution time and compare against it
    /// to detect staleness without a protocol round-trip.
    generation: Arc<AtomicU64>,
}

impl DomService {
    pub async fn for_session(session: Arc<Session>) -> Result<Self> {
        if session.mark_enabled("DOM") {
            session.execute(crate::cdp::dom::EnableParams {}).await?;
        }
        let doc = session
            .execute(GetDocumentParams {
                depth: Some(-1),
                pierce: Some(false),
            })
            .await?;
        Ok(Self {
            session,
            root_node_id: doc.root.node_id,
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Invalidates every outstanding `Element` handle resolved against the
    /// previous document (§4.5 handle invalidation).
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Binds a `DomService` to an already-known root, e.g. an iframe's
    /// `contentDocument` (§4.5 Frame entry). Starts its own generation
    /// counter since the frame's document navigates independently of
    /// whichever document reached it.
    pub(crate) fn from_root(session: Arc<Session>, root_node_id: crate::cdp::dom::NodeId) -> Self {
        Self {
            session,
            root_node_id,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    async fn element_from(&self, node_id: crate::cdp::dom::NodeId) -> Result<Element> {
        Element::resolve(Arc::clone(&self.session), node_id, Arc::clone(&self.generation)).await
    }

    /// Evaluates `document.evaluate(xpath, ...)` via `Runtime.evaluate`,
    /// then resolves each snapshot item to a `NodeId` via `DOM.requestNode`
    /// (§4.5: "each returned object resolved to a `node_id`").
    async fn xpath_node_ids(&self, xpath: &str) -> Result<Vec<crate::cdp::dom::NodeId>> {
        let xpath_json = serde_json::to_string(xpath)?;
        let count_expr = format!(
            "document.evaluate({xpath_json}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength"
        );
        let eval = self
            .session
            .execute(EvaluateParams {
                expression: count_expr,
                await_promise: Some(false),
                return_by_value: Some(true),
                context_id: None,
            })
            .await?;
        let count = eval.result.value.and_then(|v| v.as_i64()).unwrap_or(0);

        let mut ids = Vec::with_capacity(count as usize);
        for index in 0..count {
            let item_expr = format!(
                "document.evaluate({xpath_json}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotItem({index})"
            );
            let resolve = self
                .session
                .execute(EvaluateParams {
                    expression: item_expr,
                    await_promise: Some(false),
                    return_by_value: Some(false),
                    context_id: None,
                })
                .await?;
            let object_id = resolve
                .result
                .object_id
                .ok_or_else(|| CdpError::msg("xpath result has no remote object"))?;
            ids.push(self.node_id_for_object(&object_id).await?);
        }
        Ok(ids)
    }

    async fn node_id_for_object(
        &self,
        object_id: &crate::cdp::runtime::RemoteObjectId,
    ) -> Result<crate::cdp::dom::NodeId> {
        request_node_id(&self.session, object_id).await
    }

    pub async fn find_element(&self, raw_selector: &str) -> Result<Element> {
        match Selector::parse(raw_selector) {
            Selector::Css(css) => {
                let resp = self
                    .session
                    .execute(QuerySelectorParams {
                        node_id: self.root_node_id,
                        selector: css,
                    })
                    .await?;
                if resp.node_id.0 == 0 {
                    return Err(CdpError::msg(format!("no element matches {raw_selector:?}")));
                }
                self.element_from(resp.node_id).await
            }
            Selector::XPath(xpath) => {
                let ids = self.xpath_node_ids(&xpath).await?;
                let id = ids
                    .into_iter()
                    .next()
                    .ok_or_else(|| CdpError::msg(format!("no element matches {raw_selector:?}")))?;
                self.element_from(id).await
            }
        }
    }

    pub async fn find_elements(&self, raw_selector: &str) -> Result<Vec<Element>> {
        match Selector::parse(raw_selector) {
            Selector::Css(css) => {
                let resp = self
                    .session
                    .execute(QuerySelectorAllParams {
                        node_id: self.root_node_id,
                        selector: css,
                    })
                    .await?;
                let mut elements = Vec::with_capacity(resp.node_ids.len());
                for id in resp.node_ids {
                    elements.push(self.element_from(id).await?);
                }
                Ok(elements)
            }
            Selector::XPath(xpath) => {
                let ids = self.xpath_node_ids(&xpath).await?;
                let mut elements = Vec::with_capacity(ids.len());
                for id in ids {
                    elements.push(self.element_from(id).await?);
                }
                Ok(elements)
            }
        }
    }

    /// Recursive descent through `shadowRoot`s looking for `css_selector`,
    /// performed by a single injected JS function (§4.5).
    pub async fn pierce_shadow(&self, css_selector: &str) -> Result<Vec<Element>> {
        // Run against `document.body` via `Runtime.evaluate`, since `this`
        // inside `PIERCE_QUERY_ALL` needs an explicit receiver object.
        let eval = self
            .session
            .execute(EvaluateParams {
                expression: format!(
                    "({PIERCE_QUERY_ALL}).call(document.body, {})",
                    serde_json::to_string(css_selector)?
                ),
                await_promise: Some(false),
                return_by_value: Some(false),
                context_id: None,
            })
            .await?;
        let array_id = eval
            .result
            .object_id
            .ok_or_else(|| CdpError::msg("shadow pierce returned no array"))?;
        let length = self
            .session
            .execute(crate::cdp::runtime::CallFunctionOnParams {
                function_declaration: "function() { return this.length; }".to_string(),
                object_id: Some(array_id.clone()),
                arguments: None,
                await_promise: Some(false),
                return_by_value: Some(true),
            })
            .await?
            .result
            .value
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        let mut elements = Vec::with_capacity(length as usize);
        for index in 0..length {
            let item = self
                .session
                .execute(crate::cdp::runtime::CallFunctionOnParams {
                    function_declaration: format!("function() {{ return this[{index}]; }}"),
                    object_id: Some(array_id.clone()),
                    arguments: None,
                    await_promise: Some(false),
                    return_by_value: Some(false),
                })
                .await?;
            let object_id = item
                .result
                .object_id
                .ok_or_else(|| CdpError::msg("shadow pierce item has no remote object"))?;
            let node_id = self.node_id_for_object(&object_id).await?;
            elements.push(self.element_from(node_id).await?);
        }
        Ok(elements)
    }
}
