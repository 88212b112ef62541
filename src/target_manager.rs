//! §4.3 Target Manager: discover targets, create/close pages, open and
//! cache sessions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::cdp::target::{
    AttachToTargetParams, CreateTargetParams, DetachFromTargetParams, GetTargetsParams,
    SetAutoAttachParams, SetDiscoverTargetsParams, TargetId, TargetInfo,
};
use crate::error::{CdpError, Result};
use crate::multiplexer::{MultiplexerHandle, DEFAULT_COMMAND_TIMEOUT};
use crate::session::{Session, SessionState};

pub struct TargetManager {
    mux: MultiplexerHandle,
    cache: RwLock<HashMap<TargetId, TargetInfo>>,
}

impl TargetManager {
    pub fn new(mux: MultiplexerHandle) -> Self {
        Self {
            mux,
            cache: RwLock::new(HashMap::new()),
        }
    }

    async fn execute<C: crate::cdp::Command>(&self, cmd: C) -> Result<C::Response> {
        use crate::cdp::Method;
        let method = cmd.identifier();
        let params = serde_json::to_value(cmd)?;
        let resp = self
            .mux
            .send(method, None, params, DEFAULT_COMMAND_TIMEOUT)
            .await?;
        resp.into_result()
    }

    /// Fetch `Target.getTargets`, merging into the cache refreshed by
    /// `targetInfoChanged` events elsewhere.
    pub async fn targets(&self) -> Result<Vec<TargetInfo>> {
        let resp = self.execute(GetTargetsParams {}).await?;
        let mut cache = self.cache.write().unwrap();
        for info in &resp.target_infos {
            cache.insert(info.target_id.clone(), info.clone());
        }
        Ok(resp.target_infos)
    }

    pub fn update_cached_target(&self, info: TargetInfo) {
        self.cache.write().unwrap().insert(info.target_id.clone(), info);
    }

    pub fn remove_cached_target(&self, id: &TargetId) {
        self.cache.write().unwrap().remove(id);
    }

    pub async fn enable_discovery(&self) -> Result<()> {
        self.execute(SetDiscoverTargetsParams { discover: true })
            .await?;
        Ok(())
    }

    /// Subscribe to new targets and construct child sessions automatically
    /// for them (used for frames and workers).
    pub async fn enable_auto_attach(&self) -> Result<()> {
        self.execute(SetAutoAttachParams {
            auto_attach: true,
            wait_for_debugger_on_start: false,
            flatten: true,
        })
        .await?;
        Ok(())
    }

    pub async fn attach(&self, target_id: TargetId) -> Result<Arc<Session>> {
        let resp = self
            .execute(AttachToTargetParams {
                target_id: target_id.clone(),
                flatten: true,
            })
            .await
            .map_err(|_| CdpError::TargetGone)?;
        let session = Session::new(target_id, resp.session_id, self.mux.clone());
        session.set_state(SessionState::Attached);
        Ok(session)
    }

    pub async fn detach(&self, session: &Session) -> Result<()> {
        session.set_state(SessionState::Detaching);
        let _ = self
            .execute(DetachFromTargetParams {
                session_id: Some(session.session_id().clone()),
            })
            .await;
        session.set_state(SessionState::Detached);
        Ok(())
    }

    pub async fn create_page(&self, url: impl Into<String>) -> Result<Arc<Session>> {
        let resp = self
            .execute(CreateTargetParams {
                url: url.into(),
                browser_context_id: None,
            })
            .await
            .map_err(|_| CdpError::BrowserBusy)?;
        self.attach(resp.target_id).await
    }

    pub async fn close_page(&self, target_id: TargetId) -> Result<()> {
        self.execute(crate::cdp::target::CloseTargetParams { target_id })
            .await?;
        Ok(())
    }
}

pub const DEFAULT_ATTACH_TIMEOUT: Duration = Duration::from_secs(30);
