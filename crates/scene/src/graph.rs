use std::collections::BTreeSet;
use std::fmt;

use crate::hotspot::{Hotspot, SpherePoint};
use crate::panorama::{Panorama, SceneId, SceneRef};

/// Configuration defect: a scene id that names nothing in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneGraphError {
    UnknownScene { panorama: SceneId, scene: SceneId },
}

impl fmt::Display for SceneGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneGraphError::UnknownScene { panorama, scene } => {
                write!(f, "unknown scene \"{scene}\" in panorama \"{panorama}\"")
            }
        }
    }
}

impl std::error::Error for SceneGraphError {}

/// Returns the panorama itself when `scene` is its id, else the matching scene.
pub fn resolve_scene<'a>(
    panorama: &'a Panorama,
    scene: &SceneId,
) -> Result<SceneRef<'a>, SceneGraphError> {
    if &panorama.id == scene {
        return Ok(SceneRef::Root(panorama));
    }
    panorama
        .scenes
        .iter()
        .find(|s| &s.id == scene)
        .map(SceneRef::Scene)
        .ok_or_else(|| SceneGraphError::UnknownScene {
            panorama: panorama.id.clone(),
            scene: scene.clone(),
        })
}

/// A single finding from [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    DanglingSceneLink {
        owner: SceneId,
        hotspot: String,
        target: SceneId,
    },
    PitchOutOfRange {
        owner: SceneId,
        hotspot: String,
        pitch: f64,
    },
    YawOutOfRange {
        owner: SceneId,
        hotspot: String,
        yaw: f64,
    },
    DuplicateSceneId {
        id: SceneId,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DanglingSceneLink {
                owner,
                hotspot,
                target,
            } => write!(
                f,
                "{owner}: hotspot {hotspot:?} links to unknown scene \"{target}\""
            ),
            Violation::PitchOutOfRange {
                owner,
                hotspot,
                pitch,
            } => write!(f, "{owner}: hotspot {hotspot:?} pitch {pitch} outside [-90, 90]"),
            Violation::YawOutOfRange {
                owner,
                hotspot,
                yaw,
            } => write!(f, "{owner}: hotspot {hotspot:?} yaw {yaw} outside [-180, 360)"),
            Violation::DuplicateSceneId { id } => write!(f, "scene id \"{id}\" is declared twice"),
        }
    }
}

/// Checks referential integrity and angle ranges of a whole scene graph.
///
/// Load-time only. An empty result means every scene link resolves through
/// [`resolve_scene`].
pub fn validate(panorama: &Panorama) -> Vec<Violation> {
    let mut out = Vec::new();

    let mut seen = BTreeSet::new();
    for scene in panorama.all_scenes() {
        if !seen.insert(scene.id()) {
            out.push(Violation::DuplicateSceneId {
                id: scene.id().clone(),
            });
        }
    }

    for scene in panorama.all_scenes() {
        for hotspot in scene.hotspots() {
            check_angles(scene.id(), hotspot, hotspot.position, &mut out);
            if let Some(target) = hotspot.linked_scene() {
                if resolve_scene(panorama, target).is_err() {
                    out.push(Violation::DanglingSceneLink {
                        owner: scene.id().clone(),
                        hotspot: hotspot.text.clone(),
                        target: target.clone(),
                    });
                }
                if let Some(view) = hotspot.arrival_view() {
                    check_angles(scene.id(), hotspot, view, &mut out);
                }
            }
        }
    }

    out
}

fn check_angles(owner: &SceneId, hotspot: &Hotspot, point: SpherePoint, out: &mut Vec<Violation>) {
    if !point.pitch_in_range() {
        out.push(Violation::PitchOutOfRange {
            owner: owner.clone(),
            hotspot: hotspot.text.clone(),
            pitch: point.pitch,
        });
    }
    if !point.yaw_in_range() {
        out.push(Violation::YawOutOfRange {
            owner: owner.clone(),
            hotspot: hotspot.text.clone(),
            yaw: point.yaw,
        });
    }
}
