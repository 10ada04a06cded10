pub mod assets;
pub mod calibrator;
pub mod engine;
pub mod error;
pub mod navigation;
pub mod overlay;
pub mod sensors;
pub mod session;

#[cfg(test)]
mod testing;

pub use assets::{AssetLoader, AssetRegistry, AssetStatus, SharedAssets};
pub use calibrator::{OrientationCalibrator, OrientationSample};
pub use engine::{EngineAdapter, EngineEvent, InitProgress, RenderBackend, SceneChange};
pub use error::{CameraError, ConfigError, EngineError};
pub use navigation::{
    Collaborators, Direction, HotspotOutcome, NavigationController, OverlayView, SceneThumbnail,
};
pub use overlay::{CameraSource, CameraStatus, MediaStream, OverlayController, OverlayMode};
pub use sensors::{ListenerKey, OrientationSource, SharedOrientationSource, Subscription};
pub use session::{ViewerSession, ViewerState};
