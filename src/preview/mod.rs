/// Interactive preview synchronised with pointer input
///
/// State machine:
///
/// ```text
/// Empty --select--> Loading(t) --load ok (token t)--> Displayed(t)
///   ^                  |   \--load error (token t)--> Empty
///   |                  |--select other target--> Loading(t')
///   +--clear-----------+--------------------------- Displayed(t)
/// ```
///
/// Every new target mints a fresh `SessionToken`. Loads run elsewhere and
/// hand their result back with the token they were started for; a result
/// whose token is not the current one is dropped without touching the rig.
///
/// - `layout.rs` - anchor rectangles and layout change notifications

pub mod layout;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::catalog::ModelFile;
use crate::error::LoadError;
use crate::render::{self, RenderSettings};
use crate::rig::RenderRig;
use crate::scene::SceneGraph;
use layout::{AnchorId, LayoutNotifier, LayoutSource, LayoutSubscription, Rect};

/// Identifies one preview session; strictly increasing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSession {
    pub anchor: Option<AnchorId>,
    pub target: Option<ModelFile>,
    pub token: SessionToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Empty,
    Loading(SessionToken),
    Displayed(SessionToken),
}

/// Where the preview is drawn and whether it is drawn at all
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Last known anchor rectangle
    pub rect: Option<Rect>,
    pub visible: bool,
}

/// A load the caller has to run and report back through `load_finished`
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub token: SessionToken,
    pub file: ModelFile,
}

pub struct PreviewController {
    rig: RenderRig,
    notifier: LayoutNotifier,
    subscription: Option<LayoutSubscription>,
    session: Option<PreviewSession>,
    state: PreviewState,
    viewport: Viewport,
    last_token: u64,
}

impl PreviewController {
    pub fn new(rig: RenderRig, notifier: LayoutNotifier) -> Self {
        Self {
            rig,
            notifier,
            subscription: None,
            session: None,
            state: PreviewState::Empty,
            viewport: Viewport::default(),
            last_token: 0,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn session(&self) -> Option<&PreviewSession> {
        self.session.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[cfg(test)]
    pub fn rig(&self) -> &RenderRig {
        &self.rig
    }

    #[cfg(test)]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Pointer moved over a thumbnail; ignored while a button is held
    pub fn pointer_move(
        &mut self,
        anchor: AnchorId,
        file: ModelFile,
        buttons_pressed: bool,
    ) -> Option<LoadRequest> {
        if buttons_pressed {
            return None;
        }
        self.select(anchor, file)
    }

    /// Pointer pressed on a thumbnail
    pub fn pointer_down(&mut self, anchor: AnchorId, file: ModelFile) -> Option<LoadRequest> {
        self.select(anchor, file)
    }

    /// Pointer pressed on the grid background
    pub fn pointer_down_background(&mut self) {
        self.clear();
    }

    /// Pointer left the preview; ignored while a button is held (orbit drag)
    pub fn pointer_leave(&mut self, buttons_pressed: bool) {
        if !buttons_pressed {
            self.clear();
        }
    }

    pub fn filter_changed(&mut self) {
        self.clear();
    }

    /// Make `file` the preview target
    ///
    /// Returns the load to start, or `None` when the target is unchanged
    /// (repeated pointer moves over the same thumbnail).
    fn select(&mut self, anchor: AnchorId, file: ModelFile) -> Option<LoadRequest> {
        if let Some(session) = &self.session {
            if session.anchor.as_ref() == Some(&anchor) && session.target.as_ref() == Some(&file) {
                return None;
            }
        }

        self.last_token += 1;
        let token = SessionToken(self.last_token);

        // Reset before any load resolves so a new model never shows the
        // previous model's orbit
        self.rig.camera.reset_orbit();
        self.viewport.visible = false;

        if self.subscription.is_none() {
            self.subscription = Some(self.notifier.subscribe());
        }

        debug!("👆 Preview target {} (session {:?})", file.id, token);

        self.session = Some(PreviewSession {
            anchor: Some(anchor),
            target: Some(file.clone()),
            token,
        });
        self.state = PreviewState::Loading(token);

        Some(LoadRequest { token, file })
    }

    /// Drop the session and hide the preview
    pub fn clear(&mut self) {
        if self.session.is_some() {
            debug!("🧹 Preview cleared");
        }
        self.session = None;
        self.subscription = None;
        self.state = PreviewState::Empty;
        self.viewport.visible = false;
        self.rig.clear();
    }

    /// Report the outcome of a load started for `token`
    ///
    /// Returns false when the result was stale and discarded.
    pub fn load_finished(
        &mut self,
        token: SessionToken,
        result: Result<SceneGraph, LoadError>,
        layout: &impl LayoutSource,
    ) -> bool {
        if self.state != PreviewState::Loading(token) {
            debug!("⏭️  Discarding stale preview load (session {:?})", token);
            return false;
        }

        match result {
            Ok(graph) => {
                self.rig.frame(graph);
                self.reposition(layout);
                // Notifications queued while loading are covered by the
                // reposition above
                if let Some(subscription) = self.subscription.as_mut() {
                    subscription.drain();
                }
                self.viewport.visible = true;
                self.state = PreviewState::Displayed(token);
            }
            Err(e) => {
                warn!("⚠️  Preview of {} failed: {}", e.file_id(), e);
                self.clear();
            }
        }
        true
    }

    /// Apply pending layout changes; returns true if the viewport moved
    pub fn sync_layout(&mut self, layout: &impl LayoutSource) -> bool {
        let changed = self
            .subscription
            .as_mut()
            .map(LayoutSubscription::drain)
            .unwrap_or(false);

        if !changed || self.state == PreviewState::Empty {
            return false;
        }

        let before = self.viewport.rect;
        self.reposition(layout);
        self.viewport.rect != before
    }

    /// Query the anchor rectangle; a missing rectangle keeps the last position
    fn reposition(&mut self, layout: &impl LayoutSource) {
        let anchor = self.session.as_ref().and_then(|s| s.anchor.as_ref());
        if let Some(rect) = anchor.and_then(|a| layout.anchor_rect(a)) {
            self.viewport.rect = Some(rect);
        }
    }

    /// Rotate the displayed model around the origin
    pub fn orbit(&mut self, azimuth: f32, elevation: f32) -> bool {
        if !matches!(self.state, PreviewState::Displayed(_)) {
            return false;
        }
        self.rig.camera.rotate(azimuth, elevation);
        true
    }

    pub fn zoom(&mut self, factor: f32) -> bool {
        if !matches!(self.state, PreviewState::Displayed(_)) {
            return false;
        }
        self.rig.camera.zoom_by(factor);
        true
    }

    /// Render the current view; `None` unless a model is displayed
    pub fn render(&self, settings: &RenderSettings) -> Option<RgbaImage> {
        match self.state {
            PreviewState::Displayed(_) => Some(render::render(&self.rig, settings)),
            _ => None,
        }
    }
}
