use std::fmt;

use scene::Violation;

/// Failures of the external render engine, as seen through the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Runtime assets failed to load or did not load in time.
    Load(String),
    /// The engine threw while constructing a viewer instance.
    Init(String),
    /// The engine rejected a scene id.
    SceneNotFound(String),
    /// Engine-reported failure during an otherwise healthy session.
    Viewer(String),
}

impl EngineError {
    /// Text for the error panel shown next to the retry control.
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineError::Load(_) | EngineError::Viewer(_) => {
                "Failed to load panorama. Please try again."
            }
            EngineError::Init(_) => "Failed to initialize panorama viewer. Please try again.",
            EngineError::SceneNotFound(_) => "Failed to change scene. Please try again.",
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Load(msg) => write!(f, "engine assets failed to load: {msg}"),
            EngineError::Init(msg) => write!(f, "engine construction failed: {msg}"),
            EngineError::SceneNotFound(id) => write!(f, "engine rejected scene {id:?}"),
            EngineError::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    PermissionDenied,
    Unavailable(String),
}

impl CameraError {
    pub fn user_message(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied => {
                "Camera access denied. Please enable camera access to use AR mode."
            }
            CameraError::Unavailable(_) => "No camera is available for AR mode.",
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "camera permission denied"),
            CameraError::Unavailable(msg) => write!(f, "camera unavailable: {msg}"),
        }
    }
}

impl std::error::Error for CameraError {}

/// The scene graph handed to a viewer is not internally consistent.
///
/// Raised before mount; a content bug, never a runtime condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scene graph:")?;
        for v in &self.violations {
            write!(f, "\n  - {v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}
