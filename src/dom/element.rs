//! Element handle runtime (§3 Data Model, §4.5).
//!
//! An `Element` is `{session, node_id, backend_node_id, remote_object_id}`.
//! `node_id` is invalidated by a same-target navigation; every operation
//! re-checks the handle's generation against the owning `DomService` and
//! fails with `StaleNode` rather than silently operating on garbage.

use std::sync::Arc;

use crate::cdp::dom::{
    BackendNodeId, BoxModel, DescribeNodeParams, FocusParams, GetBoxModelParams, NodeId,
    QuerySelectorAllParams, QuerySelectorParams, RemoveAttributeParams, ResolveNodeParams,
    SetAttributeValueParams,
};
use crate::cdp::runtime::{CallArgument, CallFunctionOnParams, RemoteObject, RemoteObjectId};
use crate::dom::selector::Selector;
use crate::dom::DomService;
use crate::error::{CdpError, Result};
use crate::session::Session;

/// Content-box axis-aligned bounding box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

pub struct Element {
    session: Arc<Session>,
    node_id: NodeId,
    backend_node_id: BackendNodeId,
    remote_object_id: RemoteObjectId,
    /// Document generation this handle was resolved against; compared
    /// against `DomService::generation()` to detect staleness cheaply
    /// without a round-trip on every call.
    generation: u64,
    generation_of: Arc<std::sync::atomic::AtomicU64>,
}

impl Element {
    pub(crate) async fn resolve(
        session: Arc<Session>,
        node_id: NodeId,
        generation_of: Arc<std::sync::atomic::AtomicU64>,
    ) -> Result<Self> {
        let generation = generation_of.load(std::sync::atomic::Ordering::Acquire);
        let described = session
            .execute(DescribeNodeParams {
                node_id: Some(node_id),
                backend_node_id: None,
                object_id: None,
                depth: Some(1),
            })
            .await?;
        let backend_node_id = described.node.backend_node_id;
        let resolved = session
            .execute(ResolveNodeParams {
                node_id: None,
                backend_node_id: Some(backend_node_id),
            })
            .await?;
        let remote_object_id = resolved
            .object
            .object_id
            .ok_or_else(|| CdpError::msg(format!("no remote object for node {node_id:?}")))?;
        Ok(Self {
            session,
            node_id,
            backend_node_id,
            remote_object_id,
            generation,
            generation_of,
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn backend_node_id(&self) -> BackendNodeId {
        self.backend_node_id
    }

    fn check_fresh(&self) -> Result<()> {
        if self.generation_of.load(std::sync::atomic::Ordering::Acquire) != self.generation {
            return Err(CdpError::StaleNode);
        }
        Ok(())
    }

    async fn call_js_fn(&self, function_declaration: &str, await_promise: bool) -> Result<crate::cdp::runtime::RemoteObject> {
        self.check_fresh()?;
        let resp = self
            .session
            .execute(CallFunctionOnParams {
                function_declaration: function_declaration.to_string(),
                object_id: Some(self.remote_object_id.clone()),
                arguments: None,
                await_promise: Some(await_promise),
                return_by_value: Some(true),
            })
            .await?;
        if let Some(exc) = resp.exception_details {
            return Err(CdpError::ScriptError {
                message: exc.message(),
                stack: exc.stack_trace.map(|v| v.to_string()),
            });
        }
        Ok(resp.result)
    }

    pub async fn focus(&self) -> Result<()> {
        self.check_fresh()?;
        self.session
            .execute(FocusParams {
                node_id: Some(self.node_id),
                backend_node_id: None,
            })
            .await?;
        Ok(())
    }

    pub async fn bounding_box(&self) -> Result<Option<Rect>> {
        self.check_fresh()?;
        let resp = self
            .session
            .execute(GetBoxModelParams {
                node_id: Some(self.node_id),
                backend_node_id: None,
            })
            .await;
        let model: BoxModel = match resp {
            Ok(r) => r.model,
            Err(CdpError::Chrome(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(Rect {
            x: model.content[0],
            y: model.content[1],
            width: model.width,
            height: model.height,
        }))
    }

    async fn scroll_into_view(&self) -> Result<()> {
        self.call_js_fn(
            "function() { this.scrollIntoView({block: 'center', inline: 'center', behavior: 'instant'}); }",
            false,
        )
        .await?;
        Ok(())
    }

    /// Scroll into view, read the box model, compute the geometric center,
    /// and dispatch `mouseMoved → mousePressed → mouseReleased`. Falls back
    /// to `this.click()` via JS when `force` is set and the node has no box.
    pub async fn click(&self, mouse: &crate::input::mouse::Mouse, force: bool) -> Result<()> {
        self.scroll_into_view().await?;
        match self.bounding_box().await? {
            Some(rect) => {
                let (cx, cy) = rect.center();
                mouse.click_at(self.session.as_ref(), cx, cy, 1).await
            }
            None if force => {
                self.call_js_fn("function() { this.click(); }", false).await?;
                Ok(())
            }
            None => Err(CdpError::NotVisible),
        }
    }

    /// Focuses the node, then types `text` one keystroke at a time through
    /// the keyboard synthesizer.
    pub async fn type_text(&self, keyboard: &crate::input::keyboard::Keyboard, text: &str) -> Result<()> {
        self.focus().await?;
        keyboard.type_text(self.session.as_ref(), text).await
    }

    /// Clears the value and dispatches synthetic `input` then `change`
    /// bubbling events, in that order (§4.5).
    pub async fn fill(&self, value: &str) -> Result<()> {
        let escaped = serde_json::to_string(value)?;
        let script = format!(
            "function() {{
                this.value = {escaped};
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
            }}"
        );
        self.call_js_fn(&script, false).await?;
        Ok(())
    }

    pub async fn attr(&self, name: &str) -> Result<Option<String>> {
        let script = format!("function() {{ return this.getAttribute({}); }}", serde_json::to_string(name)?);
        let obj = self.call_js_fn(&script, false).await?;
        Ok(obj.value.and_then(|v| v.as_str().map(String::from)))
    }

    pub async fn set_attr(&self, name: &str, value: &str) -> Result<()> {
        self.check_fresh()?;
        self.session
            .execute(SetAttributeValueParams {
                node_id: self.node_id,
                name: name.to_string(),
                value: value.to_string(),
            })
            .await?;
        Ok(())
    }

    pub async fn remove_attr(&self, name: &str) -> Result<()> {
        self.check_fresh()?;
        self.session
            .execute(RemoveAttributeParams {
                node_id: self.node_id,
                name: name.to_string(),
            })
            .await?;
        Ok(())
    }

    pub async fn property(&self, name: &str) -> Result<serde_json::Value> {
        let script = format!("function() {{ return this[{}]; }}", serde_json::to_string(name)?);
        let obj = self.call_js_fn(&script, false).await?;
        Ok(obj.value.unwrap_or(serde_json::Value::Null))
    }

    pub async fn text_content(&self) -> Result<String> {
        let obj = self
            .call_js_fn("function() { return this.textContent; }", false)
            .await?;
        Ok(obj
            .value
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default())
    }

    pub async fn is_visible(&self) -> Result<bool> {
        let obj = self
            .call_js_fn(
                "function() {
                    const r = this.getBoundingClientRect();
                    const style = getComputedStyle(this);
                    return r.width > 0 && r.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
                }",
                false,
            )
            .await?;
        Ok(obj.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Like `call_js_fn`, but leaves the result as a remote object instead
    /// of coercing it to a value — used by the relation queries below,
    /// whose results are themselves elements (or `null`).
    async fn call_js_fn_object(
        &self,
        function_declaration: &str,
        arguments: Option<Vec<CallArgument>>,
    ) -> Result<RemoteObject> {
        self.check_fresh()?;
        let resp = self
            .session
            .execute(CallFunctionOnParams {
                function_declaration: function_declaration.to_string(),
                object_id: Some(self.remote_object_id.clone()),
                arguments,
                await_promise: Some(false),
                return_by_value: Some(false),
            })
            .await?;
        if let Some(exc) = resp.exception_details {
            return Err(CdpError::ScriptError {
                message: exc.message(),
                stack: exc.stack_trace.map(|v| v.to_string()),
            });
        }
        Ok(resp.result)
    }

    /// `None` when the remote object is `null`/`undefined` rather than an
    /// element (e.g. `parentElement` of `<html>`).
    async fn object_to_element(&self, object: RemoteObject) -> Result<Option<Element>> {
        match object.object_id {
            Some(object_id) => {
                let node_id = super::request_node_id(&self.session, &object_id).await?;
                Ok(Some(self.resolve_sibling(node_id).await?))
            }
            None => Ok(None),
        }
    }

    async fn resolve_sibling(&self, node_id: NodeId) -> Result<Element> {
        Element::resolve(Arc::clone(&self.session), node_id, Arc::clone(&self.generation_of)).await
    }

    /// Reads `this.length`/`this[i]` off a remote array-like object
    /// (`HTMLCollection`, XPath snapshot result, ...) and resolves each
    /// entry to an `Element`.
    async fn collect_array_node_ids(&self, array_object_id: RemoteObjectId) -> Result<Vec<NodeId>> {
        let length = self
            .session
            .execute(CallFunctionOnParams {
                function_declaration: "function() { return this.length; }".to_string(),
                object_id: Some(array_object_id.clone()),
                arguments: None,
                await_promise: Some(false),
                return_by_value: Some(true),
            })
            .await?
            .result
            .value
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        let mut ids = Vec::with_capacity(length as usize);
        for index in 0..length {
            let item = self
                .session
                .execute(CallFunctionOnParams {
                    function_declaration: format!("function() {{ return this[{index}]; }}"),
                    object_id: Some(array_object_id.clone()),
                    arguments: None,
                    await_promise: Some(false),
                    return_by_value: Some(false),
                })
                .await?;
            let object_id = item
                .result
                .object_id
                .ok_or_else(|| CdpError::msg("array item has no remote object"))?;
            ids.push(super::request_node_id(&self.session, &object_id).await?);
        }
        Ok(ids)
    }

    async fn resolve_many(&self, ids: Vec<NodeId>) -> Result<Vec<Element>> {
        let mut elements = Vec::with_capacity(ids.len());
        for id in ids {
            elements.push(self.resolve_sibling(id).await?);
        }
        Ok(elements)
    }

    /// §4.5 Relations: `this.parentElement`, scoped to this element's
    /// remote object. `None` for the document element.
    pub async fn parent(&self) -> Result<Option<Element>> {
        let obj = self
            .call_js_fn_object("function() { return this.parentElement; }", None)
            .await?;
        self.object_to_element(obj).await
    }

    /// §4.5 Relations: `this.nextElementSibling`.
    pub async fn next(&self) -> Result<Option<Element>> {
        let obj = self
            .call_js_fn_object("function() { return this.nextElementSibling; }", None)
            .await?;
        self.object_to_element(obj).await
    }

    /// §4.5 Relations: `this.previousElementSibling`.
    pub async fn prev(&self) -> Result<Option<Element>> {
        let obj = self
            .call_js_fn_object("function() { return this.previousElementSibling; }", None)
            .await?;
        self.object_to_element(obj).await
    }

    /// §4.5 Relations: direct element children, in document order.
    pub async fn children(&self) -> Result<Vec<Element>> {
        let obj = self
            .call_js_fn_object("function() { return this.children; }", None)
            .await?;
        let array_object_id = obj
            .object_id
            .ok_or_else(|| CdpError::msg("element has no children collection"))?;
        let ids = self.collect_array_node_ids(array_object_id).await?;
        self.resolve_many(ids).await
    }

    /// §4.5 Relations: first descendant matching `raw_selector`, scoped to
    /// this element (`DOM.querySelector` for CSS; an injected
    /// `document.evaluate(xpath, this, ...)` evaluator for XPath).
    pub async fn query(&self, raw_selector: &str) -> Result<Element> {
        self.check_fresh()?;
        match Selector::parse(raw_selector) {
            Selector::Css(css) => {
                let resp = self
                    .session
                    .execute(QuerySelectorParams {
                        node_id: self.node_id,
                        selector: css,
                    })
                    .await?;
                if resp.node_id.0 == 0 {
                    return Err(CdpError::msg(format!("no element matches {raw_selector:?}")));
                }
                self.resolve_sibling(resp.node_id).await
            }
            Selector::XPath(xpath) => {
                let id = self
                    .xpath_node_ids(&xpath)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| CdpError::msg(format!("no element matches {raw_selector:?}")))?;
                self.resolve_sibling(id).await
            }
        }
    }

    /// §4.5 Relations: every descendant matching `raw_selector`, scoped to
    /// this element.
    pub async fn query_all(&self, raw_selector: &str) -> Result<Vec<Element>> {
        self.check_fresh()?;
        match Selector::parse(raw_selector) {
            Selector::Css(css) => {
                let resp = self
                    .session
                    .execute(QuerySelectorAllParams {
                        node_id: self.node_id,
                        selector: css,
                    })
                    .await?;
                self.resolve_many(resp.node_ids).await
            }
            Selector::XPath(xpath) => {
                let ids = self.xpath_node_ids(&xpath).await?;
                self.resolve_many(ids).await
            }
        }
    }

    /// XPath evaluated with this element as the context node, via a single
    /// injected function rather than one round-trip per snapshot item.
    async fn xpath_node_ids(&self, xpath: &str) -> Result<Vec<NodeId>> {
        let xpath_json = serde_json::to_string(xpath)?;
        let snapshot_fn = format!(
            "function() {{
                const r = document.evaluate({xpath_json}, this, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                const out = [];
                for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i));
                return out;
            }}"
        );
        let obj = self.call_js_fn_object(&snapshot_fn, None).await?;
        let array_object_id = obj
            .object_id
            .ok_or_else(|| CdpError::msg("xpath query returned no array"))?;
        self.collect_array_node_ids(array_object_id).await
    }

    /// §4.5 Frame entry: obtains this `<iframe>`'s `contentDocument` remote
    /// object, describes it, and binds a new `DomService` to the same
    /// session with that document as root. Cross-origin frames have no
    /// same-process `contentDocument` and must be reached through the
    /// Target Manager instead.
    pub async fn content_document(&self) -> Result<DomService> {
        let obj = self
            .call_js_fn_object("function() { return this.contentDocument; }", None)
            .await?;
        let object_id = obj.object_id.ok_or_else(|| {
            CdpError::msg("frame has no same-origin contentDocument; attach to it as a separate target instead")
        })?;
        let described = self
            .session
            .execute(DescribeNodeParams {
                node_id: None,
                backend_node_id: None,
                object_id: Some(object_id),
                depth: Some(1),
            })
            .await?;
        Ok(DomService::from_root(Arc::clone(&self.session), described.node.node_id))
    }
}
