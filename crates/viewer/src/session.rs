use formats::ViewerSettings;
use scene::{Panorama, SceneId};

use crate::calibrator::OrientationCalibrator;
use crate::error::EngineError;
use crate::overlay::OverlayMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerState {
    /// No engine yet.
    Idle,
    Loading,
    Ready,
    /// Terminal until retried.
    Error(EngineError),
    Unmounted,
}

impl ViewerState {
    pub fn label(&self) -> &'static str {
        match self {
            ViewerState::Idle => "idle",
            ViewerState::Loading => "loading",
            ViewerState::Ready => "ready",
            ViewerState::Error(_) => "error",
            ViewerState::Unmounted => "unmounted",
        }
    }
}

/// Runtime state of one mounted viewer. Written only by the navigation
/// controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSession {
    pub current_scene: SceneId,
    pub calibrator: OrientationCalibrator,
    pub engine_ready: bool,
    pub overlay: OverlayMode,
    pub auto_rotate: bool,
    pub compass_visible: bool,
    pub follow_orientation: bool,
    /// The platform refused orientation events; headings use the configured
    /// compass offset.
    pub orientation_denied: bool,
    /// Raised for a short while after calibration.
    pub calibrating: bool,
}

impl ViewerSession {
    pub fn new(panorama: &Panorama, settings: &ViewerSettings) -> Self {
        Self {
            current_scene: panorama.id.clone(),
            calibrator: OrientationCalibrator::new(),
            engine_ready: false,
            overlay: OverlayMode::None,
            auto_rotate: settings.auto_rotate_enabled(),
            compass_visible: settings.compass,
            follow_orientation: settings.follow_orientation,
            orientation_denied: false,
            calibrating: false,
        }
    }
}
