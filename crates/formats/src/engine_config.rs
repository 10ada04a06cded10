//! Configuration schema consumed by the spherical render engine.
//!
//! The whole scene graph is flattened into one document: the panorama's own
//! id names the root entry of `scenes` and is the `firstScene`, so the engine
//! can load any scene of the graph, including the way back to the root.
//! Callback fields (`onLoad`, `onError`, `onScenechange`) are not data and
//! are attached by the host binding after deserialisation.

use std::collections::BTreeMap;

use scene::{Hotspot, HotspotKind, Panorama, SceneRef};
use serde::Serialize;

use crate::settings::ViewerSettings;

pub const PROJECTION_EQUIRECTANGULAR: &str = "equirectangular";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineHotspot {
    pub pitch: f64,
    pub yaw: f64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_yaw: Option<f64>,
    #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<&Hotspot> for EngineHotspot {
    fn from(h: &Hotspot) -> Self {
        let mut out = EngineHotspot {
            pitch: h.position.pitch,
            yaw: h.position.yaw,
            kind: "info",
            text: h.text.clone(),
            scene_id: None,
            target_pitch: None,
            target_yaw: None,
            url: None,
            image_url: None,
        };
        match &h.kind {
            HotspotKind::Info { image } => out.image_url = image.clone(),
            HotspotKind::SceneLink { scene, target } => {
                out.kind = "scene";
                out.scene_id = Some(scene.as_str().to_string());
                if let Some(t) = target {
                    out.target_pitch = Some(t.pitch);
                    out.target_yaw = Some(t.yaw);
                }
            }
            // The engine renders external links as info markers carrying a URL.
            HotspotKind::ExternalLink { url } => out.url = Some(url.clone()),
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineScene {
    pub title: String,
    #[serde(rename = "type")]
    pub projection: &'static str,
    pub panorama: String,
    /// Always emitted, even when empty: a scene without the key inherits the
    /// top-level (root) hotspots.
    pub hot_spots: Vec<EngineHotspot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hfov: Option<f64>,
}

impl EngineScene {
    fn from_scene(scene: SceneRef<'_>) -> Self {
        let view = match scene {
            SceneRef::Root(p) => p.initial_view,
            SceneRef::Scene(_) => None,
        };
        Self {
            title: scene.title().to_string(),
            projection: PROJECTION_EQUIRECTANGULAR,
            panorama: scene.image().to_string(),
            hot_spots: scene.hotspots().iter().map(EngineHotspot::from).collect(),
            pitch: view.map(|v| v.pitch),
            yaw: view.map(|v| v.yaw),
            hfov: view.map(|v| v.hfov),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDefaults {
    pub first_scene: String,
    pub scene_fade_duration: u32,
    #[serde(rename = "type")]
    pub projection: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(rename = "type")]
    pub projection: &'static str,
    pub panorama: String,
    pub title: String,
    pub hot_spots: Vec<EngineHotspot>,
    pub compass: bool,
    pub compass_offset: f64,
    pub auto_load: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_rotate: Option<f64>,
    pub scene_fade_duration: u32,
    pub default: EngineDefaults,
    pub scenes: BTreeMap<String, EngineScene>,
}

impl EngineConfig {
    pub fn for_panorama(panorama: &Panorama, settings: &ViewerSettings) -> Self {
        let root = EngineScene::from_scene(panorama.root());
        let scenes = panorama
            .all_scenes()
            .map(|s| (s.id().as_str().to_string(), EngineScene::from_scene(s)))
            .collect();

        Self {
            projection: PROJECTION_EQUIRECTANGULAR,
            panorama: root.panorama,
            title: root.title,
            hot_spots: root.hot_spots,
            compass: settings.compass,
            compass_offset: settings.compass_offset,
            auto_load: true,
            auto_rotate: settings
                .auto_rotate_enabled()
                .then_some(settings.auto_rotate_speed),
            scene_fade_duration: settings.scene_fade_ms,
            default: EngineDefaults {
                first_scene: panorama.id.as_str().to_string(),
                scene_fade_duration: settings.scene_fade_ms,
                projection: PROJECTION_EQUIRECTANGULAR,
            },
            scenes,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn has_scene(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;
    use crate::settings::ViewerSettings;
    use scene::{Hotspot, ImageVariants, Panorama, Scene, SceneId, SpherePoint};
    use serde_json::json;

    fn panorama() -> Panorama {
        let mut p = Panorama::new("mountain-peak", "Mountain Peak", "peak.jpg");
        p.hotspots.push(Hotspot::info(SpherePoint::new(-0.6, 37.1), "Summit"));
        p.hotspots.push(Hotspot::external_link(
            SpherePoint::new(-1.1, 67.2),
            "Virtual Tour",
            "/tour/peak",
        ));
        p.scenes.push(Scene {
            id: SceneId::new("north-view"),
            title: "North View".to_string(),
            image: "north.jpg".to_string(),
            thumbnail: None,
            variants: ImageVariants::default(),
            hotspots: vec![
                Hotspot::scene_link(SpherePoint::new(0.0, 180.0), "Back", SceneId::new("mountain-peak"))
                    .with_target(SpherePoint::new(0.0, 180.0)),
            ],
        });
        p
    }

    #[test]
    fn flattens_root_and_scenes() {
        let config = EngineConfig::for_panorama(&panorama(), &ViewerSettings::default());
        assert_eq!(config.default.first_scene, "mountain-peak");
        assert!(config.has_scene("mountain-peak"));
        assert!(config.has_scene("north-view"));
        assert_eq!(config.auto_rotate, Some(-2.0));
        assert_eq!(config.scenes["north-view"].panorama, "north.jpg");
    }

    #[test]
    fn serialises_engine_hotspot_schema() {
        let config = EngineConfig::for_panorama(&panorama(), &ViewerSettings::default());
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["type"], json!("equirectangular"));
        assert_eq!(value["hotSpots"][0], json!({"pitch": -0.6, "yaw": 37.1, "type": "info", "text": "Summit"}));
        assert_eq!(value["hotSpots"][1]["URL"], json!("/tour/peak"));
        assert_eq!(
            value["scenes"]["north-view"]["hotSpots"][0],
            json!({
                "pitch": 0.0,
                "yaw": 180.0,
                "type": "scene",
                "text": "Back",
                "sceneId": "mountain-peak",
                "targetPitch": 0.0,
                "targetYaw": 180.0
            })
        );
    }

    #[test]
    fn scene_without_hotspots_overrides_root_hotspots() {
        let mut p = panorama();
        p.scenes.push(Scene {
            id: SceneId::new("valley"),
            title: "Valley".to_string(),
            image: "valley.jpg".to_string(),
            thumbnail: None,
            variants: ImageVariants::default(),
            hotspots: Vec::new(),
        });
        let config = EngineConfig::for_panorama(&p, &ViewerSettings::default());
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["hotSpots"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["scenes"]["valley"]["hotSpots"], json!([]));
        assert_eq!(
            value["scenes"]["mountain-peak"]["hotSpots"],
            value["hotSpots"]
        );
    }

    #[test]
    fn auto_rotate_is_omitted_when_disabled() {
        let settings = ViewerSettings {
            auto_rotate_speed: 0.0,
            ..ViewerSettings::default()
        };
        let config = EngineConfig::for_panorama(&panorama(), &settings);
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("autoRotate").is_none());
    }
}
