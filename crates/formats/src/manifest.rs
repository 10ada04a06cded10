//! Tour manifest: the static JSON configuration of categories, panoramas and
//! their scene graphs.
//!
//! The wire shape follows the authoring format (`type` strings plus optional
//! payload fields). Conversion into the [`scene`] model rejects payloads that
//! do not match their kind, then validates every scene graph, so a manifest
//! that loads is free of dangling scene links.

use std::collections::BTreeSet;
use std::fmt;

use foundation::geo::GeoPoint;
use scene::{
    Hotspot, HotspotKind, ImageVariants, InitialView, Panorama, Scene, SceneId, SpherePoint,
    Violation,
};
use serde::{Deserialize, Serialize};

use crate::settings::ViewerSettings;

pub const MANIFEST_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TourManifest {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerSettings>,
    pub panoramas: Vec<PanoramaEntry>,
}

fn default_version() -> String {
    MANIFEST_VERSION.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PanoramaEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_view: Option<InitialViewEntry>,
    #[serde(default)]
    pub hotspots: Vec<HotspotEntry>,
    #[serde(default)]
    pub scenes: Vec<SceneEntry>,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitialViewEntry {
    pub pitch: f64,
    pub yaw: f64,
    pub hfov: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneEntry {
    pub id: String,
    pub title: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ar_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vr_image_url: Option<String>,
    #[serde(default)]
    pub hotspots: Vec<HotspotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HotspotEntry {
    pub pitch: f64,
    pub yaw: f64,
    pub text: String,
    /// `info`, `scene` / `scene-link`, or `link` / `external-link`.
    /// When absent the kind is inferred from the payload.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_yaw: Option<f64>,
}

/// A fully converted and validated manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    pub categories: Vec<Category>,
    pub panoramas: Vec<Panorama>,
    pub settings: ViewerSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManifestError {
    Json(String),
    InvalidHotspot {
        owner: String,
        text: String,
        reason: &'static str,
    },
    InvalidLocation {
        panorama: String,
    },
    DuplicatePanorama {
        id: String,
    },
    UnknownCategory {
        panorama: String,
        category: String,
    },
    Violations {
        panorama: SceneId,
        violations: Vec<Violation>,
    },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Json(msg) => write!(f, "manifest json error: {msg}"),
            ManifestError::InvalidHotspot {
                owner,
                text,
                reason,
            } => write!(f, "{owner}: hotspot {text:?}: {reason}"),
            ManifestError::InvalidLocation { panorama } => {
                write!(f, "{panorama}: latitude/longitude missing or out of range")
            }
            ManifestError::DuplicatePanorama { id } => {
                write!(f, "panorama id {id:?} is declared twice")
            }
            ManifestError::UnknownCategory { panorama, category } => {
                write!(f, "{panorama}: unknown category {category:?}")
            }
            ManifestError::Violations {
                panorama,
                violations,
            } => {
                write!(f, "panorama {panorama} has {} violation(s)", violations.len())?;
                for v in violations {
                    write!(f, "\n  - {v}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ManifestError {}

impl TourManifest {
    pub fn from_json_str(payload: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(payload).map_err(|e| ManifestError::Json(e.to_string()))
    }

    /// Converts into the scene model and validates every scene graph.
    /// Stops at the first problem; see [`TourManifest::problems`] for all.
    pub fn into_tour(self) -> Result<Tour, ManifestError> {
        let mut check = EntryCheck::new(&self.categories);
        let panoramas = self
            .panoramas
            .iter()
            .map(|entry| check.entry(entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Tour {
            categories: self.categories,
            panoramas,
            settings: self.viewer.unwrap_or_default(),
        })
    }

    /// Every problem of every panorama, in manifest order.
    pub fn problems(&self) -> Vec<ManifestError> {
        let mut check = EntryCheck::new(&self.categories);
        self.panoramas
            .iter()
            .filter_map(|entry| check.entry(entry).err())
            .collect()
    }
}

struct EntryCheck<'a> {
    declared: BTreeSet<&'a str>,
    seen: BTreeSet<String>,
}

impl<'a> EntryCheck<'a> {
    fn new(categories: &'a [Category]) -> Self {
        Self {
            declared: categories.iter().map(|c| c.id.as_str()).collect(),
            seen: BTreeSet::new(),
        }
    }

    fn entry(&mut self, entry: &PanoramaEntry) -> Result<Panorama, ManifestError> {
        if !self.seen.insert(entry.id.clone()) {
            return Err(ManifestError::DuplicatePanorama {
                id: entry.id.clone(),
            });
        }
        if !self.declared.contains(entry.category.as_str()) {
            return Err(ManifestError::UnknownCategory {
                panorama: entry.id.clone(),
                category: entry.category.clone(),
            });
        }

        let panorama = entry.to_panorama()?;
        let violations = scene::validate(&panorama);
        if !violations.is_empty() {
            return Err(ManifestError::Violations {
                panorama: panorama.id.clone(),
                violations,
            });
        }
        Ok(panorama)
    }
}

/// Parses and validates a manifest in one step.
pub fn load_tour_from_str(payload: &str) -> Result<Tour, ManifestError> {
    TourManifest::from_json_str(payload)?.into_tour()
}

impl PanoramaEntry {
    pub fn to_panorama(&self) -> Result<Panorama, ManifestError> {
        let location = match (self.latitude, self.longitude) {
            (None, None) => None,
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon).ok_or_else(|| {
                ManifestError::InvalidLocation {
                    panorama: self.id.clone(),
                }
            })?),
            _ => {
                return Err(ManifestError::InvalidLocation {
                    panorama: self.id.clone(),
                });
            }
        };

        let hotspots = convert_hotspots(&self.id, &self.hotspots)?;
        let scenes = self
            .scenes
            .iter()
            .map(|s| {
                Ok(Scene {
                    id: SceneId::new(s.id.clone()),
                    title: s.title.clone(),
                    image: s.image_url.clone(),
                    thumbnail: s.thumbnail.clone(),
                    variants: ImageVariants {
                        ar: s.ar_image_url.clone(),
                        vr: s.vr_image_url.clone(),
                    },
                    hotspots: convert_hotspots(&s.id, &s.hotspots)?,
                })
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;

        Ok(Panorama {
            id: SceneId::new(self.id.clone()),
            title: self.title.clone(),
            description: self.description.clone(),
            image: self.image_url.clone(),
            thumbnail: self.thumbnail_url.clone(),
            category: self.category.clone(),
            location,
            initial_view: self.initial_view.map(|v| InitialView {
                pitch: v.pitch,
                yaw: v.yaw,
                hfov: v.hfov,
            }),
            hotspots,
            scenes,
        })
    }
}

fn convert_hotspots(owner: &str, entries: &[HotspotEntry]) -> Result<Vec<Hotspot>, ManifestError> {
    entries.iter().map(|h| h.to_hotspot(owner)).collect()
}

impl HotspotEntry {
    pub fn to_hotspot(&self, owner: &str) -> Result<Hotspot, ManifestError> {
        let invalid = |reason: &'static str| ManifestError::InvalidHotspot {
            owner: owner.to_string(),
            text: self.text.clone(),
            reason,
        };

        let kind = match self.kind.as_deref() {
            Some(k) => k,
            None if self.scene_id.is_some() => "scene",
            None if self.link.is_some() => "link",
            None => "info",
        };

        let has_target = self.target_pitch.is_some() || self.target_yaw.is_some();
        let kind = match kind {
            "info" => {
                if self.scene_id.is_some() || self.link.is_some() || has_target {
                    return Err(invalid("info hotspot must not carry a scene id, link or target"));
                }
                HotspotKind::Info {
                    image: self.image_url.clone(),
                }
            }
            "scene" | "scene-link" => {
                let Some(scene) = &self.scene_id else {
                    return Err(invalid("scene link requires a sceneId"));
                };
                if self.link.is_some() {
                    return Err(invalid("scene link must not carry an external link"));
                }
                let target = has_target.then(|| {
                    SpherePoint::new(
                        self.target_pitch.unwrap_or(0.0),
                        self.target_yaw.unwrap_or(0.0),
                    )
                });
                HotspotKind::SceneLink {
                    scene: SceneId::new(scene.clone()),
                    target,
                }
            }
            "link" | "external-link" => {
                let Some(url) = &self.link else {
                    return Err(invalid("external link requires a link url"));
                };
                if self.scene_id.is_some() || has_target {
                    return Err(invalid("external link must not carry a scene id or target"));
                }
                HotspotKind::ExternalLink { url: url.clone() }
            }
            _ => return Err(invalid("unknown hotspot type")),
        };

        Ok(Hotspot {
            position: SpherePoint::new(self.pitch, self.yaw),
            text: self.text.clone(),
            kind,
        })
    }
}
