//! Built-in polled conditions (§4.7).

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use super::Condition;
use crate::cdp::runtime::EvaluateParams;
use crate::dom::DomService;
use crate::error::Result;
use crate::session::Session;

/// `attached | detached | visible | hidden` — re-queries the selector on
/// every `check()` rather than holding a handle, since the element may not
/// exist yet (or may come and go) while the condition is polled.
pub struct SelectorState {
    dom: Arc<DomService>,
    selector: String,
    state: crate::dom::WaitState,
}

impl SelectorState {
    pub fn new(dom: Arc<DomService>, selector: impl Into<String>, state: crate::dom::WaitState) -> Self {
        Self {
            dom,
            selector: selector.into(),
            state,
        }
    }
}

#[async_trait]
impl Condition for SelectorState {
    async fn check(&self) -> Result<bool> {
        use crate::dom::WaitState::*;
        let found = self.dom.find_element(&self.selector).await.ok();
        Ok(match self.state {
            Attached => found.is_some(),
            Detached => found.is_none(),
            Visible => match found {
                Some(el) => el.is_visible().await.unwrap_or(false),
                None => false,
            },
            Hidden => match found {
                Some(el) => !el.is_visible().await.unwrap_or(true),
                None => true,
            },
        })
    }

    fn description(&self) -> String {
        format!("selector {:?} is {}", self.selector, self.state)
    }
}

pub enum TextMatch {
    Equals(String),
    Contains(String),
    Regex(Regex),
}

/// Element text (equals/contains/regex).
pub struct ElementText {
    dom: Arc<DomService>,
    selector: String,
    matcher: TextMatch,
}

impl ElementText {
    pub fn new(dom: Arc<DomService>, selector: impl Into<String>, matcher: TextMatch) -> Self {
        Self {
            dom,
            selector: selector.into(),
            matcher,
        }
    }
}

#[async_trait]
impl Condition for ElementText {
    async fn check(&self) -> Result<bool> {
        let element = match self.dom.find_element(&self.selector).await {
            Ok(el) => el,
            Err(_) => return Ok(false),
        };
        let text = element.text_content().await?;
        Ok(match &self.matcher {
            TextMatch::Equals(expected) => &text == expected,
            TextMatch::Contains(needle) => text.contains(needle.as_str()),
            TextMatch::Regex(re) => re.is_match(&text),
        })
    }

    fn description(&self) -> String {
        format!("text of {:?} matches", self.selector)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementEnabledState {
    Enabled,
    Disabled,
    Checked,
    Unchecked,
}

/// Element enabled/disabled/checked, via `this.disabled`/`this.checked`.
pub struct ElementProperty {
    dom: Arc<DomService>,
    selector: String,
    state: ElementEnabledState,
}

impl ElementProperty {
    pub fn new(dom: Arc<DomService>, selector: impl Into<String>, state: ElementEnabledState) -> Self {
        Self {
            dom,
            selector: selector.into(),
            state,
        }
    }
}

#[async_trait]
impl Condition for ElementProperty {
    async fn check(&self) -> Result<bool> {
        let element = match self.dom.find_element(&self.selector).await {
            Ok(el) => el,
            Err(_) => return Ok(false),
        };
        let value = match self.state {
            ElementEnabledState::Enabled | ElementEnabledState::Disabled => {
                element.property("disabled").await?.as_bool().unwrap_or(false)
            }
            ElementEnabledState::Checked | ElementEnabledState::Unchecked => {
                element.property("checked").await?.as_bool().unwrap_or(false)
            }
        };
        Ok(match self.state {
            ElementEnabledState::Enabled => !value,
            ElementEnabledState::Disabled => value,
            ElementEnabledState::Checked => value,
            ElementEnabledState::Unchecked => !value,
        })
    }

    fn description(&self) -> String {
        format!("{:?} of {:?}", self.state, self.selector)
    }
}

/// CSS-class membership.
pub struct HasClass {
    dom: Arc<DomService>,
    selector: String,
    class_name: String,
}

impl HasClass {
    pub fn new(dom: Arc<DomService>, selector: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            dom,
            selector: selector.into(),
            class_name: class_name.into(),
        }
    }
}

#[async_trait]
impl Condition for HasClass {
    async fn check(&self) -> Result<bool> {
        let element = match self.dom.find_element(&self.selector).await {
            Ok(el) => el,
            Err(_) => return Ok(false),
        };
        let class_attr = element.attr("class").await?.unwrap_or_default();
        Ok(class_attr.split_whitespace().any(|c| c == self.class_name))
    }

    fn description(&self) -> String {
        format!("{:?} has class {:?}", self.selector, self.class_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    fn as_str(self) -> &'static str {
        match self {
            ReadyState::Loading => "loading",
            ReadyState::Interactive => "interactive",
            ReadyState::Complete => "complete",
        }
    }
}

/// `document.readyState ∈ {loading, interactive, complete}`.
pub struct DocumentReadyState {
    session: Arc<Session>,
    expected: ReadyState,
}

impl DocumentReadyState {
    pub fn new(session: Arc<Session>, expected: ReadyState) -> Self {
        Self { session, expected }
    }
}

#[async_trait]
impl Condition for DocumentReadyState {
    async fn check(&self) -> Result<bool> {
        let resp = self
            .session
            .execute(EvaluateParams {
                expression: "document.readyState".to_string(),
                await_promise: Some(false),
                return_by_value: Some(true),
                context_id: None,
            })
            .await?;
        Ok(resp.result.value.and_then(|v| v.as_str().map(String::from)) == Some(self.expected.as_str().to_string()))
    }

    fn description(&self) -> String {
        format!("document.readyState == {:?}", self.expected.as_str())
    }
}

pub enum UrlMatch {
    Equals(String),
    Contains(String),
    Regex(Regex),
    Predicate(Box<dyn Fn(&str) -> bool + Send + Sync>),
}

/// URL (equals/contains/regex/predicate).
pub struct UrlState {
    session: Arc<Session>,
    matcher: UrlMatch,
}

impl UrlState {
    pub fn new(session: Arc<Session>, matcher: UrlMatch) -> Self {
        Self { session, matcher }
    }

    async fn current_url(&self) -> Result<String> {
        let resp = self
            .session
            .execute(EvaluateParams {
                expression: "location.href".to_string(),
                await_promise: Some(false),
                return_by_value: Some(true),
                context_id: None,
            })
            .await?;
        Ok(resp
            .result
            .value
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default())
    }
}

#[async_trait]
impl Condition for UrlState {
    async fn check(&self) -> Result<bool> {
        let url = self.current_url().await?;
        Ok(match &self.matcher {
            UrlMatch::Equals(expected) => &url == expected,
            UrlMatch::Contains(needle) => url.contains(needle.as_str()),
            UrlMatch::Regex(re) => re.is_match(&url),
            UrlMatch::Predicate(f) => f(&url),
        })
    }

    fn description(&self) -> String {
        "url matches".to_string()
    }
}

/// Page title.
pub struct TitleEquals {
    session: Arc<Session>,
    expected: String,
}

impl TitleEquals {
    pub fn new(session: Arc<Session>, expected: impl Into<String>) -> Self {
        Self {
            session,
            expected: expected.into(),
        }
    }
}

#[async_trait]
impl Condition for TitleEquals {
    async fn check(&self) -> Result<bool> {
        let resp = self
            .session
            .execute(EvaluateParams {
                expression: "document.title".to_string(),
                await_promise: Some(false),
                return_by_value: Some(true),
                context_id: None,
            })
            .await?;
        Ok(resp.result.value.and_then(|v| v.as_str().map(String::from)) == Some(self.expected.clone()))
    }

    fn description(&self) -> String {
        format!("title == {:?}", self.expected)
    }
}

/// Arbitrary JS expression, truthy-coerced per JS semantics.
pub struct JsExpression {
    session: Arc<Session>,
    expression: String,
}

impl JsExpression {
    pub fn new(session: Arc<Session>, expression: impl Into<String>) -> Self {
        Self {
            session,
            expression: expression.into(),
        }
    }
}

#[async_trait]
impl Condition for JsExpression {
    async fn check(&self) -> Result<bool> {
        let resp = self
            .session
            .execute(EvaluateParams {
                expression: format!("!!({})", self.expression),
                await_promise: Some(false),
                return_by_value: Some(true),
                context_id: None,
            })
            .await?;
        Ok(resp.result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    fn description(&self) -> String {
        format!("`{}`", self.expression)
    }
}
