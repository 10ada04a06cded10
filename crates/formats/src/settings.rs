use serde::{Deserialize, Serialize};

pub const DEFAULT_ENGINE_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/pannellum@2.5.6/build/pannellum.js";
pub const DEFAULT_ENGINE_STYLESHEET_URL: &str =
    "https://cdn.jsdelivr.net/npm/pannellum@2.5.6/build/pannellum.css";

/// Where the spherical engine's runtime assets are fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineAssets {
    pub script_url: String,
    pub stylesheet_url: String,
}

impl Default for EngineAssets {
    fn default() -> Self {
        Self {
            script_url: DEFAULT_ENGINE_SCRIPT_URL.to_string(),
            stylesheet_url: DEFAULT_ENGINE_STYLESHEET_URL.to_string(),
        }
    }
}

/// Viewer behaviour knobs. Every field has a default, so `{}` is a valid
/// settings block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerSettings {
    /// Degrees per second; negative spins left. `0` disables auto-rotate.
    pub auto_rotate_speed: f64,
    pub compass: bool,
    /// Heading of the panorama's yaw 0, shown by the compass.
    pub compass_offset: f64,
    pub scene_fade_ms: u32,
    /// Angular step of the move buttons.
    pub move_step_deg: f64,
    pub pan_duration_ms: u32,
    pub load_timeout_ms: u64,
    pub calibration_flash_ms: u64,
    /// Mirror calibrated device heading onto the camera.
    pub follow_orientation: bool,
    pub assets: EngineAssets,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            auto_rotate_speed: -2.0,
            compass: true,
            compass_offset: 0.0,
            scene_fade_ms: 1000,
            move_step_deg: 45.0,
            pan_duration_ms: 1000,
            load_timeout_ms: 10_000,
            calibration_flash_ms: 1000,
            follow_orientation: false,
            assets: EngineAssets::default(),
        }
    }
}

impl ViewerSettings {
    pub fn auto_rotate_enabled(&self) -> bool {
        self.auto_rotate_speed != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::ViewerSettings;

    #[test]
    fn empty_block_takes_defaults() {
        let s: ViewerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(s, ViewerSettings::default());
        assert_eq!(s.move_step_deg, 45.0);
        assert!(s.auto_rotate_enabled());
    }

    #[test]
    fn partial_block_overrides_only_named_fields() {
        let s: ViewerSettings =
            serde_json::from_str(r#"{"autoRotateSpeed": 0, "followOrientation": true}"#).unwrap();
        assert!(!s.auto_rotate_enabled());
        assert!(s.follow_orientation);
        assert_eq!(s.load_timeout_ms, 10_000);
    }
}
