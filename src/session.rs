//! A `Session` represents attachment to one target (§3 Data Model). It
//! exclusively owns its target's command stream and tracks which CDP
//! domains it has enabled.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cdp::target::{SessionId, TargetId};
use crate::cdp::{Command, Method};
use crate::error::{CdpError, Result};
use crate::multiplexer::{MultiplexerHandle, DEFAULT_COMMAND_TIMEOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Attaching,
    Attached,
    Detaching,
    Detached,
}

pub struct Session {
    target_id: TargetId,
    session_id: SessionId,
    state: std::sync::atomic::AtomicU8,
    enabled_domains: std::sync::Mutex<HashSet<&'static str>>,
    mux: MultiplexerHandle,
}

const STATE_ATTACHING: u8 = 0;
const STATE_ATTACHED: u8 = 1;
const STATE_DETACHING: u8 = 2;
const STATE_DETACHED: u8 = 3;

impl Session {
    pub fn new(target_id: TargetId, session_id: SessionId, mux: MultiplexerHandle) -> Arc<Self> {
        Arc::new(Self {
            target_id,
            session_id,
            state: std::sync::atomic::AtomicU8::new(STATE_ATTACHING),
            enabled_domains: std::sync::Mutex::new(HashSet::new()),
            mux,
        })
    }

    pub fn target_id(&self) -> &TargetId {
        &self.target_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(std::sync::atomic::Ordering::Acquire) {
            STATE_ATTACHING => SessionState::Attaching,
            STATE_ATTACHED => SessionState::Attached,
            STATE_DETACHING => SessionState::Detaching,
            _ => SessionState::Detached,
        }
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        let code = match state {
            SessionState::Attaching => STATE_ATTACHING,
            SessionState::Attached => STATE_ATTACHED,
            SessionState::Detaching => STATE_DETACHING,
            SessionState::Detached => STATE_DETACHED,
        };
        self.state.store(code, std::sync::atomic::Ordering::Release);
    }

    pub fn is_attached(&self) -> bool {
        self.state() == SessionState::Attached
    }

    /// Idempotently mark `domain` enabled; returns `true` if this call is
    /// the one that actually needs to send the enable command.
    pub fn mark_enabled(&self, domain: &'static str) -> bool {
        self.enabled_domains.lock().unwrap().insert(domain)
    }

    pub async fn execute<C: Command>(&self, cmd: C) -> Result<C::Response> {
        self.execute_with_timeout(cmd, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    pub async fn execute_with_timeout<C: Command>(
        &self,
        cmd: C,
        timeout: Duration,
    ) -> Result<C::Response> {
        if !self.is_attached() {
            return Err(CdpError::SessionGone);
        }
        let method = cmd.identifier();
        let params = serde_json::to_value(cmd)?;
        let resp = self
            .mux
            .send(method, Some(self.session_id.0.clone()), params, timeout)
            .await?;
        resp.into_result()
    }
}
