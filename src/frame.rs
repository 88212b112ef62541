//! Per-frame navigation load-state machine (§3 Data Model, §4.4).
//!
//! `idle → navigating → domcontentloaded → loaded → idle`, driven by
//! `Page.frameStartedLoading`, `frameNavigated`, `domContentEventFired`,
//! `loadEventFired`, `frameStoppedLoading`.

use std::collections::HashMap;

use crate::cdp::page::FrameId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLoadState {
    Idle,
    Navigating,
    DomContentLoaded,
    Loaded,
}

#[derive(Debug, Clone)]
pub struct FrameState {
    pub id: FrameId,
    pub url: String,
    pub state: FrameLoadState,
}

/// Tracks the load state of every frame known to one `Page`.
#[derive(Default)]
pub struct FrameManager {
    frames: HashMap<FrameId, FrameState>,
    main_frame: Option<FrameId>,
}

impl FrameManager {
    pub fn main_frame(&self) -> Option<&FrameState> {
        self.main_frame.as_ref().and_then(|id| self.frames.get(id))
    }

    pub fn frame(&self, id: &FrameId) -> Option<&FrameState> {
        self.frames.get(id)
    }

    pub fn on_started_loading(&mut self, id: FrameId) {
        let entry = self.frames.entry(id.clone()).or_insert_with(|| FrameState {
            id: id.clone(),
            url: String::new(),
            state: FrameLoadState::Idle,
        });
        entry.state = FrameLoadState::Navigating;
        if self.main_frame.is_none() {
            self.main_frame = Some(id);
        }
    }

    /// Same-document navigation of the main frame invalidates every
    /// `node_id` handed out against the previous document (§4.5).
    pub fn on_navigated(&mut self, id: FrameId, url: String, is_main_frame: bool) -> bool {
        let entry = self.frames.entry(id.clone()).or_insert_with(|| FrameState {
            id: id.clone(),
            url: url.clone(),
            state: FrameLoadState::Navigating,
        });
        entry.url = url;
        if is_main_frame {
            self.main_frame = Some(id);
        }
        is_main_frame
    }

    pub fn on_dom_content_loaded(&mut self) {
        if let Some(id) = self.main_frame.clone() {
            if let Some(frame) = self.frames.get_mut(&id) {
                frame.state = FrameLoadState::DomContentLoaded;
            }
        }
    }

    pub fn on_load(&mut self) {
        if let Some(id) = self.main_frame.clone() {
            if let Some(frame) = self.frames.get_mut(&id) {
                frame.state = FrameLoadState::Loaded;
            }
        }
    }

    pub fn on_stopped_loading(&mut self, id: &FrameId) {
        if let Some(frame) = self.frames.get_mut(id) {
            frame.state = FrameLoadState::Idle;
        }
    }

    pub fn main_frame_state(&self) -> FrameLoadState {
        self.main_frame()
            .map(|f| f.state)
            .unwrap_or(FrameLoadState::Idle)
    }
}
