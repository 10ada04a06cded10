use crate::panorama::SceneId;

/// A point on the viewing sphere, in degrees.
///
/// `pitch` is elevation in `[-90, 90]`; `yaw` is the horizontal angle in
/// `[0, 360)` or the signed range `[-180, 180)`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct SpherePoint {
    pub pitch: f64,
    pub yaw: f64,
}

impl SpherePoint {
    pub const ORIGIN: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
    };

    pub fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }

    pub fn pitch_in_range(&self) -> bool {
        self.pitch.is_finite() && (-90.0..=90.0).contains(&self.pitch)
    }

    pub fn yaw_in_range(&self) -> bool {
        self.yaw.is_finite() && (-180.0..360.0).contains(&self.yaw)
    }
}

/// What activating a hotspot does.
#[derive(Debug, Clone, PartialEq)]
pub enum HotspotKind {
    /// Display-only marker, optionally with an auxiliary image.
    Info { image: Option<String> },
    /// Moves the viewer to another scene of the same panorama graph.
    ///
    /// `target` is the view angle to show on arrival; `None` means `(0, 0)`.
    SceneLink {
        scene: SceneId,
        target: Option<SpherePoint>,
    },
    /// Navigates away from the viewer.
    ExternalLink { url: String },
}

impl HotspotKind {
    pub fn label(&self) -> &'static str {
        match self {
            HotspotKind::Info { .. } => "info",
            HotspotKind::SceneLink { .. } => "scene-link",
            HotspotKind::ExternalLink { .. } => "external-link",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub position: SpherePoint,
    pub text: String,
    pub kind: HotspotKind,
}

impl Hotspot {
    pub fn info(position: SpherePoint, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
            kind: HotspotKind::Info { image: None },
        }
    }

    pub fn info_with_image(
        position: SpherePoint,
        text: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            position,
            text: text.into(),
            kind: HotspotKind::Info {
                image: Some(image.into()),
            },
        }
    }

    pub fn scene_link(position: SpherePoint, text: impl Into<String>, scene: SceneId) -> Self {
        Self {
            position,
            text: text.into(),
            kind: HotspotKind::SceneLink {
                scene,
                target: None,
            },
        }
    }

    pub fn external_link(
        position: SpherePoint,
        text: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            position,
            text: text.into(),
            kind: HotspotKind::ExternalLink { url: url.into() },
        }
    }

    /// Sets the arrival view angle of a scene link. No effect on other kinds.
    pub fn with_target(mut self, target: SpherePoint) -> Self {
        if let HotspotKind::SceneLink { target: t, .. } = &mut self.kind {
            *t = Some(target);
        }
        self
    }

    pub fn linked_scene(&self) -> Option<&SceneId> {
        match &self.kind {
            HotspotKind::SceneLink { scene, .. } => Some(scene),
            _ => None,
        }
    }

    /// Arrival view for a scene link; `(0, 0)` when unspecified.
    pub fn arrival_view(&self) -> Option<SpherePoint> {
        match &self.kind {
            HotspotKind::SceneLink { target, .. } => Some(target.unwrap_or(SpherePoint::ORIGIN)),
            _ => None,
        }
    }
}
