use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use catalog::{Catalog, CategoryFilter, MapSelection};
use console_error_panic_hook::set_once;
use foundation::Generation;
use formats::{EngineAssets, EngineConfig, ViewerSettings, load_tour_from_str};
use gloo_net::http::Request;
use js_sys::{Function, Object};
use scene::SceneId;
use serde_json::json;
use viewer::{
    AssetLoader, AssetRegistry, CameraError, CameraSource, CameraStatus, Collaborators, Direction,
    EngineEvent, HotspotOutcome, ListenerKey, MediaStream, NavigationController, OrientationSample,
    OrientationSource, OverlayMode, RenderBackend, SharedAssets, SharedOrientationSource,
    ViewerState,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

const AR_VIDEO_ID: &str = "tour-ar-video";

#[wasm_bindgen(inline_js = r#"
export function tour_inject_assets(scriptUrl, styleUrl, onDone) {
    const link = document.createElement('link');
    link.rel = 'stylesheet';
    link.href = styleUrl;
    link.dataset.tourEngine = '';
    document.head.appendChild(link);

    const script = document.createElement('script');
    script.src = scriptUrl;
    script.async = true;
    script.dataset.tourEngine = '';
    script.onload = () => onDone(null);
    script.onerror = () => onDone('failed to load ' + scriptUrl);
    document.head.appendChild(script);
}

export function tour_remove_assets() {
    document.querySelectorAll('[data-tour-engine]').forEach((el) => el.remove());
}

// Hotspot clicks are routed back to wasm; the engine must not navigate itself.
function rewire(spots, owner, onHotspot) {
    return (spots || []).map((h, i) => {
        const spot = Object.assign({}, h);
        delete spot.sceneId;
        delete spot.targetPitch;
        delete spot.targetYaw;
        delete spot.URL;
        spot.clickHandlerFunc = () => onHotspot(owner, i);
        return spot;
    });
}

export function tour_create_viewer(containerId, configJson, onLoad, onError, onSceneChange, onHotspot) {
    const config = JSON.parse(configJson);
    config.hotSpots = rewire(config.hotSpots, config.default.firstScene, onHotspot);
    for (const [id, scene] of Object.entries(config.scenes || {})) {
        scene.hotSpots = rewire(scene.hotSpots, id, onHotspot);
    }
    const viewer = window.pannellum.viewer(containerId, config);
    viewer.on('load', () => onLoad());
    viewer.on('error', (msg) => onError(String(msg)));
    viewer.on('scenechange', (id) => onSceneChange(String(id)));
    return viewer;
}

export function tour_load_scene(viewer, scene, pitch, yaw) {
    viewer.loadScene(scene, pitch, yaw);
}

export function tour_get_yaw(viewer) { return viewer.getYaw(); }
export function tour_get_pitch(viewer) { return viewer.getPitch(); }

export function tour_look_to(viewer, yaw, pitch, durationMs) {
    viewer.lookAt(pitch, yaw, viewer.getHfov(), durationMs);
}

export function tour_set_yaw(viewer, yaw) { viewer.setYaw(yaw, false); }

export function tour_set_auto_rotate(viewer, speed) {
    if (speed === 0) {
        viewer.stopAutoRotate();
    } else {
        viewer.startAutoRotate(speed);
    }
}

export function tour_set_compass(viewer, visible) {
    const container = viewer.getContainer();
    const compass = container && container.querySelector('.pnlm-compass');
    if (compass) {
        compass.style.display = visible ? 'inline' : 'none';
    }
}

export function tour_destroy(viewer) { viewer.destroy(); }

export function tour_request_camera(onResult) {
    if (!navigator.mediaDevices || !navigator.mediaDevices.getUserMedia) {
        onResult(null, 'unavailable: no media devices');
        return;
    }
    navigator.mediaDevices
        .getUserMedia({ video: { facingMode: 'environment' } })
        .then(
            (stream) => onResult(stream, null),
            (err) => onResult(null, err && err.name === 'NotAllowedError' ? 'denied' : 'unavailable: ' + String(err)),
        );
}

export function tour_stop_tracks(stream) {
    stream.getTracks().forEach((t) => t.stop());
}

export function tour_live_tracks(stream) {
    return stream.getTracks().filter((t) => t.readyState === 'live').length;
}

export function tour_attach_stream(videoId, stream) {
    const video = document.getElementById(videoId);
    if (video) {
        video.srcObject = stream;
    }
}

// iOS only delivers sensor events after an explicit grant, which must be
// requested from a user gesture. Asked once; later subscriptions reuse it.
let sensorGrant = null;

function requestSensors() {
    if (sensorGrant) {
        return sensorGrant;
    }
    const asks = [window.DeviceOrientationEvent, window.DeviceMotionEvent]
        .filter((api) => api && typeof api.requestPermission === 'function')
        .map((api) => api.requestPermission());
    sensorGrant = Promise.all(asks).then((states) => {
        const refused = states.find((s) => s !== 'granted');
        if (refused) {
            throw new Error('permission ' + refused);
        }
    });
    // A request outside a user gesture is rejected; let the next one ask again.
    sensorGrant.catch(() => { sensorGrant = null; });
    return sensorGrant;
}

export function tour_listen_orientation(onOrientation, onMotion, onDenied) {
    const token = { cancelled: false, orientation: null, motion: null };
    const grant = window.DeviceOrientationEvent
        ? requestSensors()
        : Promise.reject(new Error('no orientation sensor'));
    grant.then(
        () => {
            if (token.cancelled) {
                return;
            }
            token.orientation = (e) => onOrientation(e.alpha, e.beta, e.gamma);
            window.addEventListener('deviceorientation', token.orientation);
            if (window.DeviceMotionEvent) {
                token.motion = (e) => {
                    const a = e.accelerationIncludingGravity;
                    onMotion(a ? a.x : null, a ? a.y : null, a ? a.z : null);
                };
                window.addEventListener('devicemotion', token.motion);
            }
        },
        (err) => {
            if (!token.cancelled) {
                onDenied(String(err && err.message ? err.message : err));
            }
        },
    );
    return token;
}

export function tour_unlisten_orientation(token) {
    token.cancelled = true;
    if (token.orientation) {
        window.removeEventListener('deviceorientation', token.orientation);
    }
    if (token.motion) {
        window.removeEventListener('devicemotion', token.motion);
    }
}
"#)]
extern "C" {
    fn tour_inject_assets(script_url: &str, style_url: &str, on_done: &Function);
    fn tour_remove_assets();
    #[wasm_bindgen(catch)]
    fn tour_create_viewer(
        container_id: &str,
        config_json: &str,
        on_load: &Function,
        on_error: &Function,
        on_scene_change: &Function,
        on_hotspot: &Function,
    ) -> Result<Object, JsValue>;
    #[wasm_bindgen(catch)]
    fn tour_load_scene(viewer: &Object, scene: &str, pitch: f64, yaw: f64) -> Result<(), JsValue>;
    fn tour_get_yaw(viewer: &Object) -> f64;
    fn tour_get_pitch(viewer: &Object) -> f64;
    fn tour_look_to(viewer: &Object, yaw: f64, pitch: f64, duration_ms: u32);
    fn tour_set_yaw(viewer: &Object, yaw: f64);
    fn tour_set_auto_rotate(viewer: &Object, speed: f64);
    fn tour_set_compass(viewer: &Object, visible: bool);
    fn tour_destroy(viewer: &Object);
    fn tour_request_camera(on_result: &Function);
    fn tour_stop_tracks(stream: &JsValue);
    fn tour_live_tracks(stream: &JsValue) -> u32;
    fn tour_attach_stream(video_id: &str, stream: &JsValue);
    fn tour_listen_orientation(
        on_orientation: &Function,
        on_motion: &Function,
        on_denied: &Function,
    ) -> Object;
    fn tour_unlisten_orientation(token: &Object);
}

#[derive(Default)]
struct App {
    catalog: Catalog,
    settings: ViewerSettings,
    selection: MapSelection,
    assets: Option<SharedAssets>,
    orientation: Option<SharedOrientationSource>,
    viewer: Option<NavigationController>,
    /// Bumped per mounted viewer; callbacks of earlier viewers are dropped.
    serial: u64,
}

impl App {
    fn shared_assets(&mut self) -> SharedAssets {
        let urls = &self.settings.assets;
        self.assets
            .get_or_insert_with(|| AssetRegistry::shared(Box::new(DomAssetLoader::new(urls))))
            .clone()
    }

    fn orientation(&mut self) -> SharedOrientationSource {
        self.orientation
            .get_or_insert_with(|| Rc::new(RefCell::new(BrowserOrientation::default())))
            .clone()
    }
}

thread_local! {
    static APP: RefCell<App> = RefCell::new(App::default());
    /// Latest `devicemotion` acceleration including gravity, m/s².
    static MOTION: Cell<Option<[f64; 3]>> = const { Cell::new(None) };
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn log_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Runs `f` against the viewer mounted as `serial`, after the current call
/// stack unwinds. Engine callbacks may fire while the viewer is mid-call.
fn dispatch(serial: u64, f: impl FnOnce(&mut NavigationController) + 'static) {
    spawn_local(async move {
        APP.with(|app| {
            let Ok(mut app) = app.try_borrow_mut() else {
                log("viewer busy; callback dropped");
                return;
            };
            if app.serial != serial {
                return;
            }
            if let Some(viewer) = app.viewer.as_mut() {
                f(viewer);
            }
        });
    });
}

fn with_viewer<R>(f: impl FnOnce(&mut NavigationController) -> R) -> Result<R, JsValue> {
    APP.with(|app| {
        let mut app = app.borrow_mut();
        let viewer = app
            .viewer
            .as_mut()
            .ok_or_else(|| JsValue::from_str("no panorama selected"))?;
        Ok(f(viewer))
    })
}

struct DomAssetLoader {
    script_url: String,
    stylesheet_url: String,
}

impl DomAssetLoader {
    fn new(urls: &EngineAssets) -> Self {
        Self {
            script_url: urls.script_url.clone(),
            stylesheet_url: urls.stylesheet_url.clone(),
        }
    }
}

impl AssetLoader for DomAssetLoader {
    fn inject(&mut self, ticket: Generation) -> Result<(), String> {
        let on_done = Closure::once_into_js(move |error: Option<String>| {
            spawn_local(async move {
                APP.with(|app| {
                    let mut app = app.borrow_mut();
                    if let Some(assets) = &app.assets {
                        assets
                            .borrow_mut()
                            .finish_loading(ticket, error.map_or(Ok(()), Err));
                    }
                    if let Some(viewer) = app.viewer.as_mut() {
                        viewer.assets_settled();
                    }
                });
            });
        });
        tour_inject_assets(&self.script_url, &self.stylesheet_url, on_done.unchecked_ref());
        Ok(())
    }

    fn remove(&mut self) {
        tour_remove_assets();
    }
}

struct EngineCallbacks {
    _load: Closure<dyn FnMut()>,
    _error: Closure<dyn FnMut(String)>,
    _scene: Closure<dyn FnMut(String)>,
    _hotspot: Closure<dyn FnMut(String, u32)>,
}

struct PannellumBackend {
    container_id: String,
    serial: u64,
    handle: Option<Object>,
    callbacks: Option<EngineCallbacks>,
}

impl PannellumBackend {
    fn new(container_id: &str, serial: u64) -> Self {
        Self {
            container_id: container_id.to_string(),
            serial,
            handle: None,
            callbacks: None,
        }
    }
}

impl RenderBackend for PannellumBackend {
    fn create(&mut self, config: &EngineConfig, generation: Generation) -> Result<(), String> {
        let json = config.to_json().map_err(|e| e.to_string())?;
        let serial = self.serial;

        let load = Closure::<dyn FnMut()>::new(move || {
            dispatch(serial, move |v| v.handle_engine_event(generation, EngineEvent::Loaded));
        });
        let error = Closure::<dyn FnMut(String)>::new(move |msg: String| {
            dispatch(serial, move |v| v.handle_engine_event(generation, EngineEvent::Error(msg)));
        });
        let scene = Closure::<dyn FnMut(String)>::new(move |id: String| {
            dispatch(serial, move |v| {
                v.handle_engine_event(generation, EngineEvent::SceneChanged(id))
            });
        });
        let hotspot = Closure::<dyn FnMut(String, u32)>::new(move |owner: String, index: u32| {
            dispatch(serial, move |v| {
                match v.activate_hotspot(&SceneId::new(owner), index as usize) {
                    Ok(HotspotOutcome::External(url)) => open_external(&url),
                    Ok(_) => {}
                    Err(err) => log_error(&err.to_string()),
                }
            });
        });

        let handle = tour_create_viewer(
            &self.container_id,
            &json,
            load.as_ref().unchecked_ref(),
            error.as_ref().unchecked_ref(),
            scene.as_ref().unchecked_ref(),
            hotspot.as_ref().unchecked_ref(),
        )
        .map_err(|e| e.as_string().unwrap_or_else(|| format!("{e:?}")))?;

        self.handle = Some(handle);
        self.callbacks = Some(EngineCallbacks {
            _load: load,
            _error: error,
            _scene: scene,
            _hotspot: hotspot,
        });
        Ok(())
    }

    fn load_scene(&mut self, scene: &str, pitch: f64, yaw: f64) -> Result<(), String> {
        let handle = self.handle.as_ref().ok_or("no engine instance")?;
        tour_load_scene(handle, scene, pitch, yaw)
            .map_err(|e| e.as_string().unwrap_or_else(|| format!("{e:?}")))
    }

    fn yaw(&self) -> f64 {
        self.handle.as_ref().map_or(0.0, tour_get_yaw)
    }

    fn pitch(&self) -> f64 {
        self.handle.as_ref().map_or(0.0, tour_get_pitch)
    }

    fn look_to(&mut self, yaw: f64, pitch: f64, duration_ms: u32) {
        if let Some(handle) = &self.handle {
            tour_look_to(handle, yaw, pitch, duration_ms);
        }
    }

    fn set_yaw(&mut self, yaw: f64) {
        if let Some(handle) = &self.handle {
            tour_set_yaw(handle, yaw);
        }
    }

    fn set_auto_rotate(&mut self, speed: f64) {
        if let Some(handle) = &self.handle {
            tour_set_auto_rotate(handle, speed);
        }
    }

    fn set_compass(&mut self, visible: bool) {
        if let Some(handle) = &self.handle {
            tour_set_compass(handle, visible);
        }
    }

    fn destroy(&mut self) {
        if let Some(handle) = self.handle.take() {
            tour_destroy(&handle);
        }
        self.callbacks = None;
    }
}

fn open_external(url: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(e) = window.open_with_url_and_target(url, "_blank") {
        log_error(&format!("open {url}: {e:?}"));
    }
}

struct BrowserStream {
    stream: JsValue,
}

impl MediaStream for BrowserStream {
    fn stop_tracks(&mut self) {
        tour_stop_tracks(&self.stream);
    }

    fn live_tracks(&self) -> usize {
        tour_live_tracks(&self.stream) as usize
    }
}

struct BrowserCamera {
    serial: u64,
}

impl CameraSource for BrowserCamera {
    fn request_rear_camera(&mut self, ticket: Generation) {
        let serial = self.serial;
        let on_result = Closure::once_into_js(move |stream: JsValue, error: Option<String>| {
            let result = match error {
                None => Ok(stream),
                Some(e) if e == "denied" => Err(CameraError::PermissionDenied),
                Some(e) => Err(CameraError::Unavailable(e)),
            };
            spawn_local(async move { deliver_camera(serial, ticket, result) });
        });
        tour_request_camera(on_result.unchecked_ref());
    }
}

/// Streams nobody will own are stopped here.
fn deliver_camera(serial: u64, ticket: Generation, result: Result<JsValue, CameraError>) {
    let attach = result.as_ref().ok().cloned();
    let accepted = APP.with(|app| {
        let Ok(mut app) = app.try_borrow_mut() else {
            return false;
        };
        if app.serial != serial {
            return false;
        }
        let Some(viewer) = app.viewer.as_mut() else {
            return false;
        };
        let boxed = result
            .clone()
            .map(|stream| Box::new(BrowserStream { stream }) as Box<dyn MediaStream>);
        viewer.camera_result(ticket, boxed)
    });
    match (attach, accepted) {
        (Some(stream), true) => tour_attach_stream(AR_VIDEO_ID, &stream),
        (Some(stream), false) => tour_stop_tracks(&stream),
        (None, _) => {}
    }
}

type SensorReading = Closure<dyn FnMut(Option<f64>, Option<f64>, Option<f64>)>;

struct SensorListener {
    token: Object,
    _orientation: SensorReading,
    _motion: SensorReading,
    _denied: Closure<dyn FnMut(String)>,
}

/// `deviceorientation` and `devicemotion` listeners, registered and removed
/// together under one key.
#[derive(Default)]
struct BrowserOrientation {
    next: u64,
    listeners: BTreeMap<u64, SensorListener>,
}

impl OrientationSource for BrowserOrientation {
    fn subscribe(&mut self) -> ListenerKey {
        self.next += 1;
        let orientation = SensorReading::new(
            |alpha: Option<f64>, beta: Option<f64>, gamma: Option<f64>| {
                let Some(sample) = OrientationSample::from_event(alpha, beta, gamma) else {
                    return;
                };
                // Only the latest sample matters; a busy viewer just misses one.
                APP.with(|app| {
                    if let Ok(mut app) = app.try_borrow_mut() {
                        if let Some(viewer) = app.viewer.as_mut() {
                            viewer.on_orientation(sample);
                        }
                    }
                });
            },
        );
        // Acceleration carries no heading; it is reported in the status only.
        let motion = SensorReading::new(|x: Option<f64>, y: Option<f64>, z: Option<f64>| {
            let reading = match (x, y, z) {
                (Some(x), Some(y), Some(z)) => Some([x, y, z]),
                _ => None,
            };
            MOTION.with(|m| m.set(reading));
        });
        let denied = Closure::<dyn FnMut(String)>::new(|reason: String| {
            log_error(&format!("orientation unavailable: {reason}"));
            APP.with(|app| {
                if let Ok(mut app) = app.try_borrow_mut() {
                    if let Some(viewer) = app.viewer.as_mut() {
                        viewer.orientation_denied(&reason);
                    }
                }
            });
        });
        let token = tour_listen_orientation(
            orientation.as_ref().unchecked_ref(),
            motion.as_ref().unchecked_ref(),
            denied.as_ref().unchecked_ref(),
        );
        self.listeners.insert(
            self.next,
            SensorListener {
                token,
                _orientation: orientation,
                _motion: motion,
                _denied: denied,
            },
        );
        ListenerKey(self.next)
    }

    fn unsubscribe(&mut self, key: ListenerKey) {
        if let Some(listener) = self.listeners.remove(&key.0) {
            tour_unlisten_orientation(&listener.token);
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    set_once();
}

/// Fetches and validates a tour manifest, replacing the current catalog.
#[wasm_bindgen]
pub fn load_tour(url: String) {
    spawn_local(async move {
        let payload = match fetch_text(&url).await {
            Ok(p) => p,
            Err(err) => {
                log_error(&format!("Failed to fetch tour manifest: {err:?}"));
                return;
            }
        };
        if let Err(err) = load_tour_json(&payload) {
            log_error(&format!("Invalid tour manifest: {err:?}"));
        }
    });
}

#[wasm_bindgen]
pub fn load_tour_json(payload: &str) -> Result<(), JsValue> {
    let tour = load_tour_from_str(payload).map_err(to_js)?;
    APP.with(|app| {
        let mut app = app.borrow_mut();
        if let Some(mut viewer) = app.viewer.take() {
            viewer.unmount();
        }
        app.catalog = Catalog::from_tour(&tour);
        app.settings = tour.settings;
        app.selection.clear();
        log(&format!("tour loaded: {} panoramas", app.catalog.panoramas().len()));
    });
    Ok(())
}

async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let resp = Request::get(url).send().await.map_err(to_js)?;
    resp.text().await.map_err(to_js)
}

/// `[{id, title, latitude, longitude}]` for the map overlay.
#[wasm_bindgen]
pub fn map_pins() -> Result<String, JsValue> {
    APP.with(|app| app.borrow().catalog.map_pins_json().map_err(to_js))
}

#[wasm_bindgen]
pub fn search(query: &str, category: &str) -> Result<String, JsValue> {
    APP.with(|app| {
        let app = app.borrow();
        let hits: Vec<_> = app
            .catalog
            .search(query, &CategoryFilter::parse(category))
            .into_iter()
            .map(|p| {
                json!({
                    "id": p.id.as_str(),
                    "title": p.title,
                    "description": p.description,
                    "category": p.category,
                    "thumbnail": p.thumbnail.as_deref().unwrap_or(&p.image),
                })
            })
            .collect();
        serde_json::to_string(&hits).map_err(to_js)
    })
}

/// Applies a selected-id event from the map or gallery. Mounts a new viewer
/// into `container_id` when the selection changed.
#[wasm_bindgen]
pub fn select_panorama(id: &str, container_id: &str) -> Result<bool, JsValue> {
    APP.with(|app| {
        let mut guard = app.borrow_mut();
        let app = &mut *guard;
        let (panorama, changed) = app.selection.select(&app.catalog, id).map_err(to_js)?;
        if !changed {
            return Ok(false);
        }
        let panorama = Rc::new(panorama.clone());

        // The replacement mounts before the old viewer lets go, so the shared
        // engine assets stay injected across the switch.
        let serial = app.serial + 1;
        let parts = Collaborators {
            backend: Box::new(PannellumBackend::new(container_id, serial)),
            assets: app.shared_assets(),
            camera: Box::new(BrowserCamera { serial }),
            orientation: app.orientation(),
        };
        let mut viewer =
            NavigationController::new(panorama, app.settings.clone(), parts).map_err(to_js)?;
        app.serial = serial;
        viewer.mount();
        if let Some(mut old) = app.viewer.replace(viewer) {
            old.unmount();
        }
        Ok(true)
    })
}

#[wasm_bindgen]
pub fn unmount_viewer() {
    APP.with(|app| {
        let mut app = app.borrow_mut();
        if let Some(mut viewer) = app.viewer.take() {
            viewer.unmount();
        }
        app.selection.clear();
    });
}

#[wasm_bindgen]
pub fn retry() -> Result<bool, JsValue> {
    with_viewer(|v| v.retry())
}

#[wasm_bindgen]
pub fn go_to_scene(id: &str) -> Result<(), JsValue> {
    with_viewer(|v| v.go_to_scene(&SceneId::new(id)).map(|_| ()))?.map_err(to_js)
}

/// `left`, `right`, `up` or `down`.
#[wasm_bindgen]
pub fn move_view(direction: &str) -> Result<bool, JsValue> {
    let direction = match direction {
        "left" => Direction::Left,
        "right" => Direction::Right,
        "up" => Direction::Up,
        "down" => Direction::Down,
        other => return Err(JsValue::from_str(&format!("unknown direction {other:?}"))),
    };
    with_viewer(|v| v.move_view(direction))
}

#[wasm_bindgen]
pub fn set_auto_rotate(enabled: bool) -> Result<(), JsValue> {
    with_viewer(|v| v.set_auto_rotate(enabled))
}

#[wasm_bindgen]
pub fn set_compass_visible(visible: bool) -> Result<(), JsValue> {
    with_viewer(|v| v.set_compass_visible(visible))
}

#[wasm_bindgen]
pub fn set_follow_orientation(follow: bool) -> Result<(), JsValue> {
    with_viewer(|v| v.set_follow_orientation(follow))
}

#[wasm_bindgen]
pub fn begin_interaction() -> Result<(), JsValue> {
    with_viewer(|v| v.begin_interaction())
}

#[wasm_bindgen]
pub fn end_interaction() -> Result<(), JsValue> {
    with_viewer(|v| v.end_interaction())
}

#[wasm_bindgen]
pub fn calibrate() -> Result<f64, JsValue> {
    with_viewer(|v| v.calibrate())
}

/// `ar`, `vr` or `none`.
#[wasm_bindgen]
pub fn open_overlay(mode: &str) -> Result<bool, JsValue> {
    let mode = match mode {
        "ar" => OverlayMode::Ar,
        "vr" => OverlayMode::Vr,
        "none" => OverlayMode::None,
        other => return Err(JsValue::from_str(&format!("unknown overlay mode {other:?}"))),
    };
    with_viewer(|v| v.open_overlay(mode))
}

#[wasm_bindgen]
pub fn close_overlay() -> Result<(), JsValue> {
    with_viewer(|v| v.close_overlay())
}

#[wasm_bindgen]
pub fn retry_camera() -> Result<bool, JsValue> {
    with_viewer(|v| v.retry_camera())
}

/// Drives the viewer's timers; call from the page's animation loop.
#[wasm_bindgen]
pub fn tick(elapsed_ms: u32) -> Result<(), JsValue> {
    with_viewer(|v| v.advance(u64::from(elapsed_ms)))
}

/// Snapshot of everything the page renders around the viewer, as JSON.
#[wasm_bindgen]
pub fn viewer_status() -> Result<String, JsValue> {
    with_viewer(|v| {
        let session = v.session();
        let error = match v.state() {
            ViewerState::Error(err) => json!({
                "message": err.user_message(),
                "detail": err.to_string(),
            }),
            _ => serde_json::Value::Null,
        };
        let overlay = v.overlay_view();
        let camera_error = match &overlay.camera {
            CameraStatus::Failed(err) => Some(err.user_message()),
            _ => None,
        };
        let thumbnails: Vec<_> = v
            .scene_thumbnails()
            .into_iter()
            .map(|t| {
                json!({
                    "id": t.id.as_str(),
                    "title": t.title,
                    "image": t.image,
                    "current": t.is_current,
                })
            })
            .collect();
        json!({
            "state": v.state().label(),
            "error": error,
            "currentScene": session.current_scene.as_str(),
            "autoRotate": session.auto_rotate,
            "compass": session.compass_visible,
            "followOrientation": session.follow_orientation,
            "orientationDenied": session.orientation_denied,
            "motion": MOTION.with(Cell::get),
            "overlay": {
                "mode": format!("{:?}", overlay.mode).to_lowercase(),
                "heading": overlay.heading,
                "calibrating": overlay.calibrating,
                "location": overlay.location,
                "image": overlay.image,
                "cameraError": camera_error,
            },
            "scenes": thumbnails,
        })
        .to_string()
    })
}
