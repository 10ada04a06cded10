//! Navigation controller: the viewer's state machine and the only writer of
//! its [`ViewerSession`].
//!
//! Every asynchronous input (asset completion, engine events, camera
//! results, timers, orientation samples) enters through a method here. Engine
//! events carry the generation of the instance that produced them; anything
//! from an older generation, or arriving after unmount, is dropped before it
//! can touch state.

use std::rc::Rc;

use foundation::Generation;
use foundation::angles::normalize360;
use formats::{EngineConfig, ViewerSettings};
use runtime::event_bus::EventLog;
use runtime::metrics::Metrics;
use runtime::timers::TimerQueue;
use scene::{Hotspot, HotspotKind, Panorama, SceneId, SpherePoint, resolve_scene, validate};
use tracing::{debug, info, warn};

use crate::assets::SharedAssets;
use crate::calibrator::OrientationSample;
use crate::engine::{EngineAdapter, EngineEvent, InitProgress, RenderBackend, SceneChange};
use crate::error::{CameraError, ConfigError, EngineError};
use crate::overlay::{CameraSource, CameraStatus, MediaStream, OverlayController, OverlayMode};
use crate::sensors::{SharedOrientationSource, Subscription};
use crate::session::{ViewerSession, ViewerState};

/// Host-provided collaborators of one viewer.
pub struct Collaborators {
    pub backend: Box<dyn RenderBackend>,
    pub assets: SharedAssets,
    pub camera: Box<dyn CameraSource>,
    pub orientation: SharedOrientationSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotspotOutcome {
    /// A scene change was issued.
    Navigated,
    /// Another change is in flight; this one runs when it completes.
    Queued,
    AlreadyThere,
    /// Display-only hotspot.
    Info,
    /// The host should open this URL.
    External(String),
    /// Not ready, or the hotspot does not exist.
    Ignored,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneThumbnail {
    pub id: SceneId,
    pub title: String,
    /// Thumbnail, or the full image when none is set.
    pub image: String,
    pub is_current: bool,
}

/// What the AR/VR overlay renders.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub mode: OverlayMode,
    pub heading: f64,
    pub calibrating: bool,
    pub location: Option<String>,
    pub image: String,
    pub camera: CameraStatus,
}

#[derive(Debug, Clone, PartialEq)]
struct PendingChange {
    scene: SceneId,
    view: SpherePoint,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Timer {
    LoadTimeout(Generation),
    CalibrationFlash,
}

pub struct NavigationController {
    panorama: Rc<Panorama>,
    settings: ViewerSettings,
    state: ViewerState,
    session: ViewerSession,
    adapter: EngineAdapter,
    overlay: OverlayController,
    orientation: SharedOrientationSource,
    subscription: Option<Subscription>,
    timers: TimerQueue<Timer>,
    generation: Generation,
    in_flight: Option<SceneId>,
    queued: Option<PendingChange>,
    interacting: bool,
    log: EventLog,
    metrics: Metrics,
}

impl NavigationController {
    /// Rejects an inconsistent scene graph before anything is mounted.
    pub fn new(
        panorama: Rc<Panorama>,
        settings: ViewerSettings,
        parts: Collaborators,
    ) -> Result<Self, ConfigError> {
        let violations = validate(&panorama);
        if !violations.is_empty() {
            return Err(ConfigError { violations });
        }
        let session = ViewerSession::new(&panorama, &settings);
        Ok(Self {
            panorama,
            settings,
            state: ViewerState::Idle,
            session,
            adapter: EngineAdapter::new(parts.backend, parts.assets),
            overlay: OverlayController::new(parts.camera),
            orientation: parts.orientation,
            subscription: None,
            timers: TimerQueue::new(),
            generation: Generation::default(),
            in_flight: None,
            queued: None,
            interacting: false,
            log: EventLog::new(),
            metrics: Metrics::new(),
        })
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn session(&self) -> &ViewerSession {
        &self.session
    }

    pub fn panorama(&self) -> &Panorama {
        &self.panorama
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    /// Generation of the current engine instance; engine events must carry
    /// it.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn engine_metrics(&self) -> &Metrics {
        self.adapter.metrics()
    }

    pub fn mount(&mut self) {
        if self.state != ViewerState::Idle {
            debug!(state = self.state.label(), "mount ignored");
            return;
        }
        self.start_loading();
    }

    /// Leaves `Error` for a fresh `Loading`, tearing everything down first.
    pub fn retry(&mut self) -> bool {
        if !matches!(self.state, ViewerState::Error(_)) {
            return false;
        }
        self.release_resources();
        self.session.current_scene = self.panorama.id.clone();
        self.metrics.inc("viewer.retry");
        self.start_loading();
        true
    }

    /// Unconditional teardown; repeated calls are no-ops.
    pub fn unmount(&mut self) {
        if self.state == ViewerState::Unmounted {
            return;
        }
        self.release_resources();
        self.generation = self.generation.next();
        self.transition(ViewerState::Unmounted);
    }

    /// The shared engine assets finished loading or failed.
    pub fn assets_settled(&mut self) {
        if self.state != ViewerState::Loading {
            debug!(state = self.state.label(), "asset completion ignored");
            return;
        }
        match self.adapter.assets_settled() {
            Ok(InitProgress::AwaitingAssets) => {}
            Ok(_) => self.cancel_load_timeout(),
            Err(err) => self.fail(err),
        }
    }

    pub fn handle_engine_event(&mut self, generation: Generation, event: EngineEvent) {
        if self.state == ViewerState::Unmounted || generation != self.generation {
            debug!(
                generation = generation.get(),
                current = self.generation.get(),
                ?event,
                "discarding stale engine event"
            );
            return;
        }
        match event {
            EngineEvent::Loaded => {
                if self.state != ViewerState::Loading {
                    return;
                }
                self.cancel_load_timeout();
                self.session.engine_ready = true;
                self.session.current_scene = self.panorama.id.clone();
                self.transition(ViewerState::Ready);
                self.adapter
                    .set_auto_rotate(self.session.auto_rotate && !self.interacting);
                self.adapter.set_compass_visible(self.session.compass_visible);
            }
            EngineEvent::SceneChanged(scene) => {
                if self.state != ViewerState::Ready {
                    return;
                }
                self.adapter.confirm_scene(&scene);
                self.session.current_scene = SceneId::new(scene);
                self.in_flight = None;
                if let Some(next) = self.queued.take() {
                    if next.scene != self.session.current_scene {
                        let scene = next.scene.clone();
                        if let Err(err) = self.issue(next) {
                            warn!(%scene, %err, "queued scene change rejected");
                        }
                    }
                }
            }
            EngineEvent::Error(message) => match self.state {
                ViewerState::Loading => self.fail(EngineError::Load(message)),
                ViewerState::Ready => self.fail(EngineError::Viewer(message)),
                _ => debug!(%message, "engine error outside an active session"),
            },
        }
    }

    /// Activates hotspot `index` of scene `owner`.
    pub fn activate_hotspot(
        &mut self,
        owner: &SceneId,
        index: usize,
    ) -> Result<HotspotOutcome, EngineError> {
        let panorama = Rc::clone(&self.panorama);
        let Some(hotspot) = resolve_scene(&panorama, owner)
            .ok()
            .and_then(|scene| scene.hotspots().get(index))
        else {
            debug!(%owner, index, "no such hotspot");
            return Ok(HotspotOutcome::Ignored);
        };
        self.activate(hotspot)
    }

    pub fn activate(&mut self, hotspot: &Hotspot) -> Result<HotspotOutcome, EngineError> {
        match &hotspot.kind {
            HotspotKind::Info { .. } => Ok(HotspotOutcome::Info),
            HotspotKind::ExternalLink { url } => Ok(HotspotOutcome::External(url.clone())),
            HotspotKind::SceneLink { scene, .. } => self.request_scene(PendingChange {
                scene: scene.clone(),
                view: hotspot.arrival_view().unwrap_or(SpherePoint::ORIGIN),
            }),
        }
    }

    /// Jumps to a scene from the thumbnail strip, view reset to `(0, 0)`.
    pub fn go_to_scene(&mut self, scene: &SceneId) -> Result<HotspotOutcome, EngineError> {
        if resolve_scene(&self.panorama, scene).is_err() {
            return Err(EngineError::SceneNotFound(scene.to_string()));
        }
        self.request_scene(PendingChange {
            scene: scene.clone(),
            view: SpherePoint::ORIGIN,
        })
    }

    fn request_scene(&mut self, change: PendingChange) -> Result<HotspotOutcome, EngineError> {
        if self.state != ViewerState::Ready {
            debug!(scene = %change.scene, state = self.state.label(), "scene request ignored");
            return Ok(HotspotOutcome::Ignored);
        }
        if self.in_flight.is_some() {
            if change.scene == self.session.current_scene {
                self.queued = None;
                return Ok(HotspotOutcome::AlreadyThere);
            }
            debug!(scene = %change.scene, "scene change in flight; queued");
            self.queued = Some(change);
            return Ok(HotspotOutcome::Queued);
        }
        if change.scene == self.session.current_scene {
            return Ok(HotspotOutcome::AlreadyThere);
        }
        self.issue(change)
    }

    fn issue(&mut self, change: PendingChange) -> Result<HotspotOutcome, EngineError> {
        let PendingChange { scene, view } = change;
        match self.adapter.change_scene(scene.as_str(), view.pitch, view.yaw) {
            Ok(SceneChange::Issued) => {
                self.log.emit(
                    "scene",
                    format!("{} -> {}", self.session.current_scene, scene),
                );
                self.metrics.inc("viewer.scene_change");
                self.in_flight = Some(scene.clone());
                self.session.current_scene = scene;
                Ok(HotspotOutcome::Navigated)
            }
            Ok(SceneChange::Unchanged) => {
                self.session.current_scene = scene;
                Ok(HotspotOutcome::AlreadyThere)
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    pub fn move_view(&mut self, direction: Direction) -> bool {
        if self.state != ViewerState::Ready {
            return false;
        }
        let step = self.settings.move_step_deg;
        let (yaw, pitch) = match direction {
            Direction::Left => (-step, 0.0),
            Direction::Right => (step, 0.0),
            Direction::Up => (0.0, step),
            Direction::Down => (0.0, -step),
        };
        self.adapter.pan_by(yaw, pitch, self.settings.pan_duration_ms);
        true
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.session.auto_rotate = enabled;
        if !self.interacting {
            self.adapter.set_auto_rotate(enabled);
        }
    }

    pub fn set_compass_visible(&mut self, visible: bool) {
        self.session.compass_visible = visible;
        self.adapter.set_compass_visible(visible);
    }

    /// Pauses auto-rotate while the user drags.
    pub fn begin_interaction(&mut self) {
        if !self.interacting {
            self.interacting = true;
            self.adapter.set_auto_rotate(false);
        }
    }

    pub fn end_interaction(&mut self) {
        if self.interacting {
            self.interacting = false;
            self.adapter.set_auto_rotate(self.session.auto_rotate);
        }
    }

    /// Following stays off once orientation access was denied.
    pub fn set_follow_orientation(&mut self, follow: bool) {
        self.session.follow_orientation = follow && !self.session.orientation_denied;
    }

    /// The host could not get orientation events (permission refused or no
    /// sensor). The overlay compass falls back to the configured offset.
    pub fn orientation_denied(&mut self, reason: &str) {
        if self.session.orientation_denied {
            return;
        }
        warn!(%reason, "device orientation unavailable");
        self.log.emit("orientation", format!("denied: {reason}"));
        self.session.orientation_denied = true;
        self.session.follow_orientation = false;
    }

    /// Feeds one sensor sample; returns the calibrated heading. Samples are
    /// ignored unless the listener is registered.
    pub fn on_orientation(&mut self, sample: OrientationSample) -> Option<f64> {
        if !self.subscription.as_ref().is_some_and(Subscription::is_active) {
            return None;
        }
        let heading = self.session.calibrator.ingest(sample);
        if self.session.follow_orientation && self.state == ViewerState::Ready {
            self.adapter.set_heading(heading);
        }
        Some(heading)
    }

    /// Zeroes the heading at the device's current facing and flashes the
    /// calibration indicator.
    pub fn calibrate(&mut self) -> f64 {
        let offset = self.session.calibrator.calibrate();
        self.session.calibrating = true;
        self.timers.cancel_where(|t| *t == Timer::CalibrationFlash);
        self.timers
            .schedule(self.settings.calibration_flash_ms, Timer::CalibrationFlash);
        self.log.emit("calibrate", format!("offset {offset:.1}"));
        offset
    }

    /// Advances the timer clock.
    pub fn advance(&mut self, elapsed_ms: u64) {
        for timer in self.timers.advance(elapsed_ms) {
            match timer {
                Timer::LoadTimeout(generation) => {
                    if generation == self.generation
                        && self.state == ViewerState::Loading
                        && !self.adapter.is_live()
                    {
                        let ms = self.settings.load_timeout_ms;
                        self.fail(EngineError::Load(format!(
                            "engine assets did not load within {ms} ms"
                        )));
                    }
                }
                Timer::CalibrationFlash => self.session.calibrating = false,
            }
        }
    }

    pub fn open_overlay(&mut self, mode: OverlayMode) -> bool {
        if self.state == ViewerState::Unmounted {
            return false;
        }
        let changed = self.overlay.open(mode);
        self.session.overlay = self.overlay.mode();
        if changed {
            self.log.emit("overlay", format!("{mode:?}"));
        }
        changed
    }

    pub fn close_overlay(&mut self) {
        self.overlay.close();
        self.session.overlay = OverlayMode::None;
    }

    pub fn camera_result(
        &mut self,
        ticket: Generation,
        result: Result<Box<dyn MediaStream>, CameraError>,
    ) -> bool {
        self.overlay.camera_result(ticket, result)
    }

    pub fn retry_camera(&mut self) -> bool {
        self.overlay.retry()
    }

    pub fn camera_tracks(&self) -> usize {
        self.overlay.live_tracks()
    }

    pub fn scene_thumbnails(&self) -> Vec<SceneThumbnail> {
        self.panorama
            .all_scenes()
            .map(|s| SceneThumbnail {
                id: s.id().clone(),
                title: s.title().to_string(),
                image: s.thumbnail().unwrap_or(s.image()).to_string(),
                is_current: *s.id() == self.session.current_scene,
            })
            .collect()
    }

    /// Image for the open overlay: the current scene's variant for that
    /// mode, or its regular image.
    pub fn overlay_image(&self) -> String {
        let Ok(scene) = resolve_scene(&self.panorama, &self.session.current_scene) else {
            return self.panorama.image.clone();
        };
        let variant = scene.variants().and_then(|v| match self.session.overlay {
            OverlayMode::Ar => v.ar.as_deref(),
            OverlayMode::Vr => v.vr.as_deref(),
            OverlayMode::None => None,
        });
        variant.unwrap_or(scene.image()).to_string()
    }

    pub fn overlay_view(&self) -> OverlayView {
        OverlayView {
            mode: self.session.overlay,
            heading: self
                .session
                .calibrator
                .heading()
                .filter(|_| !self.session.orientation_denied)
                .unwrap_or_else(|| normalize360(self.settings.compass_offset)),
            calibrating: self.session.calibrating,
            location: self.panorama.location.map(|g| g.readout()),
            image: self.overlay_image(),
            camera: self.overlay.status().clone(),
        }
    }

    fn start_loading(&mut self) {
        self.generation = self.generation.next();
        self.transition(ViewerState::Loading);
        if self.subscription.is_none() {
            self.subscription = Some(Subscription::open(&self.orientation));
        }
        let config = EngineConfig::for_panorama(&self.panorama, &self.settings);
        match self.adapter.initialize(config, self.generation) {
            Ok(InitProgress::AwaitingAssets) => {
                self.timers.schedule(
                    self.settings.load_timeout_ms,
                    Timer::LoadTimeout(self.generation),
                );
            }
            Ok(_) => {}
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: EngineError) {
        warn!(%err, state = self.state.label(), "viewer failed");
        self.metrics.inc("viewer.error");
        self.cancel_load_timeout();
        self.in_flight = None;
        self.queued = None;
        self.session.engine_ready = false;
        self.transition(ViewerState::Error(err));
    }

    fn cancel_load_timeout(&mut self) {
        self.timers
            .cancel_where(|t| matches!(t, Timer::LoadTimeout(_)));
    }

    fn release_resources(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
        }
        self.overlay.close();
        self.adapter.destroy();
        self.timers.clear();
        self.in_flight = None;
        self.queued = None;
        self.interacting = false;
        self.session.overlay = OverlayMode::None;
        self.session.engine_ready = false;
        self.session.calibrating = false;
    }

    fn transition(&mut self, next: ViewerState) {
        info!(from = self.state.label(), to = next.label(), "viewer state");
        self.log.emit(
            "state",
            format!("{} -> {}", self.state.label(), next.label()),
        );
        self.state = next;
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        self.unmount();
    }
}
