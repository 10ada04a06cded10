//! Adapter over the external spherical render engine.
//!
//! The engine is driven through [`RenderBackend`]; its asynchronous
//! notifications travel the other way as [`EngineEvent`]s tagged with the
//! generation the instance was created under, and are consumed by the
//! navigation controller only.

use foundation::Generation;
use foundation::angles::{clamp_pitch, normalize_signed180};
use formats::EngineConfig;
use runtime::metrics::Metrics;
use tracing::{debug, info, warn};

use crate::assets::{AssetStatus, SharedAssets};
use crate::error::EngineError;

/// Speed used when auto-rotate is switched on for an engine configured
/// without it.
const FALLBACK_ROTATE_SPEED: f64 = -2.0;

/// Call contract of the external engine.
///
/// `create` binds a new instance to the host's container; the backend must
/// tag every later [`EngineEvent`] of that instance with `generation`.
pub trait RenderBackend {
    fn create(&mut self, config: &EngineConfig, generation: Generation) -> Result<(), String>;
    fn load_scene(&mut self, scene: &str, pitch: f64, yaw: f64) -> Result<(), String>;
    fn yaw(&self) -> f64;
    fn pitch(&self) -> f64;
    /// Animated move; returns immediately.
    fn look_to(&mut self, yaw: f64, pitch: f64, duration_ms: u32);
    fn set_yaw(&mut self, yaw: f64);
    /// `0.0` stops rotation.
    fn set_auto_rotate(&mut self, speed: f64);
    fn set_compass(&mut self, visible: bool);
    fn destroy(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// First scene finished loading. Also fires after later scene loads.
    Loaded,
    SceneChanged(String),
    Error(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InitProgress {
    /// Assets still loading; construction happens in
    /// [`EngineAdapter::assets_settled`].
    AwaitingAssets,
    Constructed,
    /// No initialization is pending.
    Inactive,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SceneChange {
    Issued,
    Unchanged,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Instance {
    None,
    AwaitingAssets,
    Live,
}

pub struct EngineAdapter {
    backend: Box<dyn RenderBackend>,
    assets: SharedAssets,
    holds_assets: bool,
    instance: Instance,
    config: Option<EngineConfig>,
    generation: Generation,
    current_scene: Option<String>,
    rotate_speed: f64,
    auto_rotating: bool,
    compass_visible: bool,
    metrics: Metrics,
}

impl EngineAdapter {
    pub fn new(backend: Box<dyn RenderBackend>, assets: SharedAssets) -> Self {
        Self {
            backend,
            assets,
            holds_assets: false,
            instance: Instance::None,
            config: None,
            generation: Generation::default(),
            current_scene: None,
            rotate_speed: FALLBACK_ROTATE_SPEED,
            auto_rotating: false,
            compass_visible: false,
            metrics: Metrics::new(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.instance == Instance::Live
    }

    pub fn current_scene(&self) -> Option<&str> {
        self.current_scene.as_deref()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Acquires the shared assets and constructs an instance once they are
    /// loaded. Any previous instance is destroyed first.
    pub fn initialize(
        &mut self,
        config: EngineConfig,
        generation: Generation,
    ) -> Result<InitProgress, EngineError> {
        if self.instance != Instance::None || self.holds_assets {
            self.destroy();
        }
        self.generation = generation;
        self.rotate_speed = config.auto_rotate.unwrap_or(FALLBACK_ROTATE_SPEED);
        self.config = Some(config);

        let status = self.assets.borrow_mut().acquire();
        self.holds_assets = true;
        self.instance = Instance::AwaitingAssets;
        self.proceed(status)
    }

    /// Called by the host once the shared assets finished loading (or
    /// failed).
    pub fn assets_settled(&mut self) -> Result<InitProgress, EngineError> {
        match self.instance {
            Instance::AwaitingAssets => {
                let status = self.assets.borrow().status().clone();
                self.proceed(status)
            }
            Instance::Live => Ok(InitProgress::Constructed),
            Instance::None => Ok(InitProgress::Inactive),
        }
    }

    fn proceed(&mut self, status: AssetStatus) -> Result<InitProgress, EngineError> {
        match status {
            AssetStatus::Loading => Ok(InitProgress::AwaitingAssets),
            AssetStatus::Loaded => self.construct().map(|()| InitProgress::Constructed),
            AssetStatus::Failed(reason) => Err(EngineError::Load(reason)),
            AssetStatus::Absent => Err(EngineError::Load("engine assets were removed".into())),
        }
    }

    fn construct(&mut self) -> Result<(), EngineError> {
        let Some(config) = &self.config else {
            return Err(EngineError::Init("no configuration".into()));
        };
        self.backend
            .create(config, self.generation)
            .map_err(EngineError::Init)?;

        self.instance = Instance::Live;
        self.current_scene = Some(config.default.first_scene.clone());
        self.auto_rotating = config.auto_rotate.is_some();
        self.compass_visible = config.compass;
        self.metrics.inc("engine.create");
        info!(generation = self.generation.get(), scene = %config.default.first_scene, "engine instance created");
        Ok(())
    }

    /// No-op when `scene` is already displayed.
    pub fn change_scene(&mut self, scene: &str, pitch: f64, yaw: f64) -> Result<SceneChange, EngineError> {
        if !self.is_live() {
            return Err(EngineError::Viewer("engine is not ready".into()));
        }
        if self.current_scene.as_deref() == Some(scene) {
            debug!(scene, "scene already displayed");
            return Ok(SceneChange::Unchanged);
        }
        let known = self.config.as_ref().is_some_and(|c| c.has_scene(scene));
        if !known {
            return Err(EngineError::SceneNotFound(scene.to_string()));
        }
        self.backend.load_scene(scene, pitch, yaw).map_err(|reason| {
            warn!(scene, %reason, "engine rejected scene");
            EngineError::SceneNotFound(scene.to_string())
        })?;
        self.current_scene = Some(scene.to_string());
        self.metrics.inc("engine.scene_change");
        Ok(SceneChange::Issued)
    }

    /// Records the scene the engine reports as displayed.
    pub fn confirm_scene(&mut self, scene: &str) {
        if self.is_live() {
            self.current_scene = Some(scene.to_string());
        }
    }

    pub fn yaw(&self) -> Option<f64> {
        self.is_live().then(|| self.backend.yaw())
    }

    pub fn set_heading(&mut self, yaw: f64) {
        if self.is_live() {
            self.backend.set_yaw(normalize_signed180(yaw));
        }
    }

    pub fn pan_by(&mut self, delta_yaw: f64, delta_pitch: f64, duration_ms: u32) {
        if !self.is_live() {
            return;
        }
        let yaw = normalize_signed180(self.backend.yaw() + delta_yaw);
        let pitch = clamp_pitch(self.backend.pitch() + delta_pitch);
        self.backend.look_to(yaw, pitch, duration_ms);
    }

    /// Returns whether the engine was told anything.
    pub fn set_auto_rotate(&mut self, enabled: bool) -> bool {
        if !self.is_live() || self.auto_rotating == enabled {
            return false;
        }
        self.auto_rotating = enabled;
        self.backend
            .set_auto_rotate(if enabled { self.rotate_speed } else { 0.0 });
        true
    }

    pub fn set_compass_visible(&mut self, visible: bool) -> bool {
        if !self.is_live() || self.compass_visible == visible {
            return false;
        }
        self.compass_visible = visible;
        self.backend.set_compass(visible);
        true
    }

    /// Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.instance == Instance::Live {
            self.backend.destroy();
            self.metrics.inc("engine.destroy");
            info!(generation = self.generation.get(), "engine instance destroyed");
        }
        self.instance = Instance::None;
        if self.holds_assets {
            self.holds_assets = false;
            self.assets.borrow_mut().release();
        }
        self.current_scene = None;
        self.auto_rotating = false;
        self.compass_visible = false;
    }
}

impl Drop for EngineAdapter {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineAdapter, InitProgress, SceneChange};
    use crate::assets::{AssetRegistry, AssetStatus};
    use crate::error::EngineError;
    use crate::testing::{
        BackendCall, RecordingBackend, RecordingLoader, sample_panorama, settle_assets,
    };
    use formats::{EngineConfig, ViewerSettings};
    use foundation::Generation;

    fn config() -> EngineConfig {
        EngineConfig::for_panorama(&sample_panorama(), &ViewerSettings::default())
    }

    fn live_adapter() -> (EngineAdapter, RecordingBackend) {
        let (loader, _) = RecordingLoader::new();
        let assets = AssetRegistry::shared(Box::new(loader));
        let backend = RecordingBackend::new();
        let mut adapter = EngineAdapter::new(Box::new(backend.clone()), assets.clone());
        assert_eq!(
            adapter.initialize(config(), Generation::new(1)),
            Ok(InitProgress::AwaitingAssets)
        );
        settle_assets(&assets, Ok(()));
        assert_eq!(adapter.assets_settled(), Ok(InitProgress::Constructed));
        backend.clear();
        (adapter, backend)
    }

    #[test]
    fn second_adapter_reuses_loaded_assets() {
        let (loader, log) = RecordingLoader::new();
        let assets = AssetRegistry::shared(Box::new(loader));
        let mut first = EngineAdapter::new(Box::new(RecordingBackend::new()), assets.clone());
        first.initialize(config(), Generation::new(1)).unwrap();
        settle_assets(&assets, Ok(()));
        first.assets_settled().unwrap();

        let mut second = EngineAdapter::new(Box::new(RecordingBackend::new()), assets.clone());
        assert_eq!(
            second.initialize(config(), Generation::new(1)),
            Ok(InitProgress::Constructed)
        );
        assert_eq!(log.borrow().injected, 1);

        first.destroy();
        assert_eq!(log.borrow().removed, 0);
        second.destroy();
        assert_eq!(log.borrow().removed, 1);
    }

    #[test]
    fn asset_failure_is_a_load_error() {
        let (loader, _) = RecordingLoader::new();
        let assets = AssetRegistry::shared(Box::new(loader));
        let mut adapter = EngineAdapter::new(Box::new(RecordingBackend::new()), assets.clone());
        adapter.initialize(config(), Generation::new(1)).unwrap();
        settle_assets(&assets, Err("network".into()));
        assert_eq!(
            adapter.assets_settled(),
            Err(EngineError::Load("network".into()))
        );
        adapter.destroy();
        assert_eq!(assets.borrow().status(), &AssetStatus::Absent);
    }

    #[test]
    fn construction_failure_is_an_init_error() {
        let (loader, _) = RecordingLoader::new();
        let assets = AssetRegistry::shared(Box::new(loader));
        let backend = RecordingBackend::new();
        backend.fail_create("bad container");
        let mut adapter = EngineAdapter::new(Box::new(backend), assets.clone());
        adapter.initialize(config(), Generation::new(1)).unwrap();
        settle_assets(&assets, Ok(()));
        assert_eq!(
            adapter.assets_settled(),
            Err(EngineError::Init("bad container".into()))
        );
        assert!(!adapter.is_live());
    }

    #[test]
    fn change_scene_to_current_is_a_no_op() {
        let (mut adapter, backend) = live_adapter();
        assert_eq!(
            adapter.change_scene("mountain-peak", 0.0, 0.0),
            Ok(SceneChange::Unchanged)
        );
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn change_scene_rejects_unknown_ids() {
        let (mut adapter, backend) = live_adapter();
        assert_eq!(
            adapter.change_scene("nowhere", 0.0, 0.0),
            Err(EngineError::SceneNotFound("nowhere".into()))
        );
        backend.reject_scenes();
        assert_eq!(
            adapter.change_scene("north-view", 0.0, 0.0),
            Err(EngineError::SceneNotFound("north-view".into()))
        );
        assert_eq!(adapter.current_scene(), Some("mountain-peak"));
    }

    #[test]
    fn pan_by_is_relative_and_clamped() {
        let (mut adapter, backend) = live_adapter();
        backend.set_view(170.0, 80.0);
        adapter.pan_by(45.0, 45.0, 1000);
        assert_eq!(
            backend.calls(),
            vec![BackendCall::LookTo {
                yaw: -145.0,
                pitch: 90.0,
                duration_ms: 1000
            }]
        );
    }

    #[test]
    fn toggles_are_idempotent() {
        let (mut adapter, backend) = live_adapter();
        // Default settings start rotating with the compass shown.
        assert!(!adapter.set_auto_rotate(true));
        assert!(adapter.set_auto_rotate(false));
        assert!(!adapter.set_auto_rotate(false));
        assert!(!adapter.set_compass_visible(true));
        assert!(adapter.set_compass_visible(false));
        assert_eq!(
            backend.calls(),
            vec![BackendCall::SetAutoRotate(0.0), BackendCall::SetCompass(false)]
        );
    }

    #[test]
    fn destroy_twice_is_safe() {
        let (mut adapter, backend) = live_adapter();
        adapter.destroy();
        adapter.destroy();
        assert_eq!(backend.calls(), vec![BackendCall::Destroy]);
        assert_eq!(adapter.metrics().counter("engine.destroy"), 1);
    }

    #[test]
    fn reinitialize_tears_down_previous_instance() {
        let (loader, log) = RecordingLoader::new();
        let assets = AssetRegistry::shared(Box::new(loader));
        let backend = RecordingBackend::new();
        let mut adapter = EngineAdapter::new(Box::new(backend.clone()), assets.clone());
        adapter.initialize(config(), Generation::new(1)).unwrap();
        settle_assets(&assets, Ok(()));
        adapter.assets_settled().unwrap();
        backend.clear();

        // The only holder let go, so the assets are injected again.
        assert_eq!(
            adapter.initialize(config(), Generation::new(2)),
            Ok(InitProgress::AwaitingAssets)
        );
        settle_assets(&assets, Ok(()));
        assert_eq!(adapter.assets_settled(), Ok(InitProgress::Constructed));
        assert_eq!(log.borrow().injected, 2);
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Destroy,
                BackendCall::Create {
                    first_scene: "mountain-peak".into(),
                    generation: Generation::new(2)
                }
            ]
        );
    }
}
