use std::fmt;
use std::time::Instant;

use async_tungstenite::tungstenite;
use async_tungstenite::tungstenite::Message;
use futures::channel::mpsc::SendError;
use futures::channel::oneshot::Canceled;
use thiserror::Error;

use crate::cdp::CdpCallError;
use crate::dom::selector::WaitState;

pub type Result<T, E = CdpError> = std::result::Result<T, E>;

/// Error kinds a public operation of this crate can fail with, per the
/// error-handling design: every call returns a value or one of these, never
/// a silent loss.
#[derive(Debug, Error)]
pub enum CdpError {
    #[error("{0}")]
    Ws(#[from] tungstenite::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    ChannelSendError(#[from] ChannelError),

    #[error("received unexpected websocket message: {0:?}")]
    UnexpectedWsMessage(Message),
    #[error("transport closed")]
    TransportClosed,
    #[error("no pong received within the keepalive window")]
    PongTimeout,
    #[error("browser returned an error for the command: {0}")]
    Chrome(#[from] CdpCallError),
    #[error("received no response from the browser")]
    NoResponse,
    #[error("command exceeded its deadline")]
    Timeout,

    #[error("navigation failed: {0}")]
    NavigationError(String),
    #[error("navigation did not reach `{wait_state}` before the deadline")]
    NavigationTimeout { wait_state: String },
    #[error("script evaluation threw: {message}{}", stack.as_deref().map(|s| format!("\n{s}")).unwrap_or_default())]
    ScriptError {
        message: String,
        stack: Option<String>,
    },
    #[error("element has no box model and force=false")]
    NotVisible,
    #[error("node_id was invalidated by a navigation")]
    StaleNode,
    #[error("session is detached")]
    SessionGone,
    #[error("target died before or during attach")]
    TargetGone,
    #[error("wait for {description:?} timed out after {timeout:?}")]
    WaitTimeout {
        description: String,
        timeout: std::time::Duration,
    },
    #[error("browser refused to create a target")]
    BrowserBusy,
    #[error("{0}")]
    Msg(String),
}

impl CdpError {
    pub fn msg(msg: impl Into<String>) -> Self {
        CdpError::Msg(msg.into())
    }

    pub fn wait_timeout(state: WaitState, timeout: std::time::Duration) -> Self {
        CdpError::WaitTimeout {
            description: state.as_str().to_string(),
            timeout,
        }
    }

    pub fn navigation_timeout(wait_state: &'static str) -> Self {
        CdpError::NavigationTimeout {
            wait_state: wait_state.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("{0}")]
    Send(#[from] SendError),
    #[error("{0}")]
    Canceled(#[from] Canceled),
}

impl From<Canceled> for CdpError {
    fn from(err: Canceled) -> Self {
        ChannelError::from(err).into()
    }
}

impl From<SendError> for CdpError {
    fn from(err: SendError) -> Self {
        ChannelError::from(err).into()
    }
}

/// An error where `now > deadline`.
#[derive(Debug, Clone)]
pub struct DeadlineExceeded {
    pub deadline: Instant,
    pub now: Instant,
}

impl DeadlineExceeded {
    pub fn new(now: Instant, deadline: Instant) -> Self {
        Self { deadline, now }
    }
}

impl fmt::Display for DeadlineExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "deadline exceeded by {:?}",
            self.now.saturating_duration_since(self.deadline)
        )
    }
}
