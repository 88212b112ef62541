//! Top-level entry point (§6 External Interfaces): wires Transport →
//! Multiplexer → Target Manager together and hands out attached `Page`s.
//! Launching a browser process, profile management, and executable
//! discovery are out of scope — callers point this at an already-running
//! Chromium's remote-debugging endpoint, mirroring `Browser::connect` in
//! `spider_chrome/src/browser.rs` minus the process-spawning half.

use std::sync::Arc;

use crate::discovery::Discovery;
use crate::error::Result;
use crate::hooks::{HookEvent, HookManager, HookPhase};
use crate::multiplexer::{Multiplexer, MultiplexerHandle};
use crate::page::Page;
use crate::target_manager::TargetManager;
use crate::transport::Transport;

/// A live connection to one Chromium instance, reachable over CDP.
pub struct Browser {
    mux: MultiplexerHandle,
    targets: TargetManager,
    hooks: Arc<HookManager>,
}

impl Browser {
    /// Connects to a browser already listening at `debugger_url`, an
    /// `http(s)://host:port` remote-debugging address or a `ws(s)://` URL
    /// straight to the browser-level WebSocket.
    pub async fn connect(debugger_url: &str) -> Result<Arc<Self>> {
        let ws_url = if debugger_url.starts_with("ws") {
            debugger_url.to_string()
        } else {
            let discovery = Discovery::new(debugger_url.trim_end_matches('/'));
            discovery.version().await?.web_socket_debugger_url
        };

        let transport = Transport::connect(&ws_url).await?;
        let mux = Multiplexer::spawn(transport);
        let targets = TargetManager::new(mux.clone());
        targets.enable_discovery().await?;
        targets.enable_auto_attach().await?;

        let hooks = Arc::new(HookManager::new());
        hooks
            .fire(HookPhase::BrowserConnected, HookEvent::new(ws_url))
            .await;

        Ok(Arc::new(Self { mux, targets, hooks }))
    }

    pub fn hooks(&self) -> &Arc<HookManager> {
        &self.hooks
    }

    pub fn multiplexer(&self) -> &MultiplexerHandle {
        &self.mux
    }

    /// Lists every target the browser currently reports.
    pub async fn targets(&self) -> Result<Vec<crate::cdp::target::TargetInfo>> {
        self.targets.targets().await
    }

    /// Opens a new page target, attaches a session, and builds the Page
    /// Runtime around it.
    pub async fn new_page(&self, url: impl Into<String>) -> Result<Arc<Page>> {
        let session = self.targets.create_page(url).await?;
        let page = Page::attach(&self.mux, session, Arc::clone(&self.hooks)).await?;
        self.hooks
            .fire(HookPhase::PageCreated, HookEvent::new("page created"))
            .await;
        Ok(page)
    }

    /// Attaches to an already-existing target (e.g. one found via
    /// `targets()`) instead of opening a new one.
    pub async fn attach_page(&self, target_id: crate::cdp::target::TargetId) -> Result<Arc<Page>> {
        let session = self.targets.attach(target_id).await?;
        let page = Page::attach(&self.mux, session, Arc::clone(&self.hooks)).await?;
        self.hooks
            .fire(HookPhase::PageCreated, HookEvent::new("page attached"))
            .await;
        Ok(page)
    }

    pub async fn close_page(&self, target_id: crate::cdp::target::TargetId) -> Result<()> {
        self.hooks
            .fire(HookPhase::PageClose, HookEvent::new("page close"))
            .await;
        self.targets.close_page(target_id).await
    }

    /// Detaches a session without closing its target (leaves the tab open).
    pub async fn detach(&self, session: &crate::session::Session) -> Result<()> {
        self.targets.detach(session).await
    }

    pub async fn close(&self) -> Result<()> {
        self.hooks
            .fire(HookPhase::BrowserClose, HookEvent::new("browser close"))
            .await;
        Ok(())
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser").finish_non_exhaustive()
    }
}
