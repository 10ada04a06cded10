//! Recording doubles for the engine, asset loader, camera and orientation
//! source.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use foundation::{GeoPoint, Generation};
use formats::EngineConfig;
use scene::{Hotspot, ImageVariants, Panorama, Scene, SceneId, SpherePoint};

use crate::assets::{AssetLoader, SharedAssets};
use crate::engine::RenderBackend;
use crate::overlay::{CameraSource, MediaStream};
use crate::sensors::{ListenerKey, OrientationSource};

/// `mountain-peak` with scenes `north-view` and `valley`.
///
/// Root hotspots: north-view link, valley link, info, external link.
/// `north-view` links back to the root looking south.
pub fn sample_panorama() -> Panorama {
    let mut p = Panorama::new("mountain-peak", "Mountain Peak", "peak.jpg");
    p.description = "Summit at dawn".into();
    p.category = "mountains".into();
    p.thumbnail = Some("peak-thumb.jpg".into());
    p.location = GeoPoint::new(45.832622, 6.865175);
    p.hotspots = vec![
        Hotspot::scene_link(SpherePoint::new(-5.0, 0.0), "To the north", SceneId::new("north-view")),
        Hotspot::scene_link(SpherePoint::new(-10.0, 120.0), "Down to the valley", SceneId::new("valley")),
        Hotspot::info(SpherePoint::new(10.0, 45.0), "Summit cross"),
        Hotspot::external_link(SpherePoint::new(0.0, 200.0), "Weather", "https://example.org/weather"),
    ];
    p.scenes = vec![
        Scene {
            id: SceneId::new("north-view"),
            title: "North View".into(),
            image: "north.jpg".into(),
            thumbnail: None,
            variants: ImageVariants {
                ar: Some("north-ar.jpg".into()),
                vr: None,
            },
            hotspots: vec![
                Hotspot::scene_link(SpherePoint::new(0.0, 180.0), "Back to main", SceneId::new("mountain-peak"))
                    .with_target(SpherePoint::new(0.0, 180.0)),
            ],
        },
        Scene {
            id: SceneId::new("valley"),
            title: "Valley".into(),
            image: "valley.jpg".into(),
            thumbnail: Some("valley-thumb.jpg".into()),
            variants: ImageVariants::default(),
            hotspots: vec![Hotspot::scene_link(
                SpherePoint::new(20.0, 0.0),
                "Up to the peak",
                SceneId::new("mountain-peak"),
            )],
        },
    ];
    p
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Create { first_scene: String, generation: Generation },
    LoadScene { scene: String, pitch: f64, yaw: f64 },
    LookTo { yaw: f64, pitch: f64, duration_ms: u32 },
    SetYaw(f64),
    SetAutoRotate(f64),
    SetCompass(bool),
    Destroy,
}

#[derive(Debug, Default)]
struct BackendState {
    calls: Vec<BackendCall>,
    fail_create: Option<String>,
    reject_scenes: bool,
    yaw: f64,
    pitch: f64,
}

/// Cloning shares the call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    state: Rc<RefCell<BackendState>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.borrow().calls.clone()
    }

    pub fn scene_loads(&self) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, BackendCall::LoadScene { .. }))
            .collect()
    }

    pub fn clear(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn fail_create(&self, reason: &str) {
        self.state.borrow_mut().fail_create = Some(reason.to_string());
    }

    pub fn reject_scenes(&self) {
        self.state.borrow_mut().reject_scenes = true;
    }

    pub fn set_view(&self, yaw: f64, pitch: f64) {
        let mut state = self.state.borrow_mut();
        state.yaw = yaw;
        state.pitch = pitch;
    }

    fn record(&self, call: BackendCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl RenderBackend for RecordingBackend {
    fn create(&mut self, config: &EngineConfig, generation: Generation) -> Result<(), String> {
        if let Some(reason) = self.state.borrow().fail_create.clone() {
            return Err(reason);
        }
        self.record(BackendCall::Create {
            first_scene: config.default.first_scene.clone(),
            generation,
        });
        Ok(())
    }

    fn load_scene(&mut self, scene: &str, pitch: f64, yaw: f64) -> Result<(), String> {
        if self.state.borrow().reject_scenes {
            return Err(format!("no scene {scene}"));
        }
        self.record(BackendCall::LoadScene {
            scene: scene.to_string(),
            pitch,
            yaw,
        });
        Ok(())
    }

    fn yaw(&self) -> f64 {
        self.state.borrow().yaw
    }

    fn pitch(&self) -> f64 {
        self.state.borrow().pitch
    }

    fn look_to(&mut self, yaw: f64, pitch: f64, duration_ms: u32) {
        self.record(BackendCall::LookTo {
            yaw,
            pitch,
            duration_ms,
        });
    }

    fn set_yaw(&mut self, yaw: f64) {
        self.state.borrow_mut().yaw = yaw;
        self.record(BackendCall::SetYaw(yaw));
    }

    fn set_auto_rotate(&mut self, speed: f64) {
        self.record(BackendCall::SetAutoRotate(speed));
    }

    fn set_compass(&mut self, visible: bool) {
        self.record(BackendCall::SetCompass(visible));
    }

    fn destroy(&mut self) {
        self.record(BackendCall::Destroy);
    }
}

/// Completes the registry's latest injection.
pub fn settle_assets(assets: &SharedAssets, result: Result<(), String>) {
    let mut registry = assets.borrow_mut();
    let ticket = registry.ticket();
    registry.finish_loading(ticket, result);
}

#[derive(Debug, Default)]
pub struct LoaderLog {
    pub injected: u32,
    pub removed: u32,
    pub tickets: Vec<Generation>,
}

pub struct RecordingLoader {
    log: Rc<RefCell<LoaderLog>>,
    fail_with: Option<String>,
}

impl RecordingLoader {
    pub fn new() -> (Self, Rc<RefCell<LoaderLog>>) {
        let log = Rc::new(RefCell::new(LoaderLog::default()));
        (
            Self {
                log: Rc::clone(&log),
                fail_with: None,
            },
            log,
        )
    }

    pub fn failing(reason: &str) -> (Self, Rc<RefCell<LoaderLog>>) {
        let (mut loader, log) = Self::new();
        loader.fail_with = Some(reason.to_string());
        (loader, log)
    }
}

impl AssetLoader for RecordingLoader {
    fn inject(&mut self, ticket: Generation) -> Result<(), String> {
        let mut log = self.log.borrow_mut();
        log.injected += 1;
        log.tickets.push(ticket);
        match &self.fail_with {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    fn remove(&mut self) {
        self.log.borrow_mut().removed += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingCamera {
    tickets: Rc<RefCell<Vec<Generation>>>,
}

impl RecordingCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tickets(&self) -> Vec<Generation> {
        self.tickets.borrow().clone()
    }

    pub fn last_ticket(&self) -> Generation {
        self.tickets.borrow().last().copied().unwrap_or_default()
    }
}

impl CameraSource for RecordingCamera {
    fn request_rear_camera(&mut self, ticket: Generation) {
        self.tickets.borrow_mut().push(ticket);
    }
}

/// Stream whose live-track count stays observable after it is handed off.
pub struct FakeStream {
    live: Rc<Cell<usize>>,
}

impl FakeStream {
    pub fn new(tracks: usize) -> (Self, Rc<Cell<usize>>) {
        let live = Rc::new(Cell::new(tracks));
        (
            Self {
                live: Rc::clone(&live),
            },
            live,
        )
    }
}

impl MediaStream for FakeStream {
    fn stop_tracks(&mut self) {
        self.live.set(0);
    }

    fn live_tracks(&self) -> usize {
        self.live.get()
    }
}

#[derive(Debug, Default)]
pub struct OrientationHub {
    next: u64,
    listeners: BTreeSet<u64>,
    pub removed: usize,
}

impl OrientationHub {
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn active(&self) -> usize {
        self.listeners.len()
    }
}

impl OrientationSource for OrientationHub {
    fn subscribe(&mut self) -> ListenerKey {
        self.next += 1;
        self.listeners.insert(self.next);
        ListenerKey(self.next)
    }

    fn unsubscribe(&mut self, key: ListenerKey) {
        if self.listeners.remove(&key.0) {
            self.removed += 1;
        }
    }
}
