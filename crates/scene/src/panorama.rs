use std::fmt;

use foundation::geo::GeoPoint;

use crate::hotspot::Hotspot;

/// Identifier of a panorama or one of its scenes.
///
/// Panorama ids and scene ids share one namespace inside a scene graph: the
/// panorama's own id names its root scene.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        SceneId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(value: &str) -> Self {
        SceneId::new(value)
    }
}

/// Initial camera for a panorama, in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InitialView {
    pub pitch: f64,
    pub yaw: f64,
    pub hfov: f64,
}

/// Alternative images shown while an overlay mode is active.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageVariants {
    pub ar: Option<String>,
    pub vr: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: SceneId,
    pub title: String,
    pub image: String,
    pub thumbnail: Option<String>,
    pub variants: ImageVariants,
    pub hotspots: Vec<Hotspot>,
}

/// Top-level viewable unit. Immutable once configured.
#[derive(Debug, Clone, PartialEq)]
pub struct Panorama {
    pub id: SceneId,
    pub title: String,
    pub description: String,
    pub image: String,
    pub thumbnail: Option<String>,
    pub category: String,
    pub location: Option<GeoPoint>,
    pub initial_view: Option<InitialView>,
    pub hotspots: Vec<Hotspot>,
    pub scenes: Vec<Scene>,
}

impl Panorama {
    pub fn new(id: impl Into<String>, title: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: SceneId::new(id),
            title: title.into(),
            description: String::new(),
            image: image.into(),
            thumbnail: None,
            category: String::new(),
            location: None,
            initial_view: None,
            hotspots: Vec::new(),
            scenes: Vec::new(),
        }
    }

    pub fn root(&self) -> SceneRef<'_> {
        SceneRef::Root(self)
    }

    /// The root followed by every scene, in declaration order.
    pub fn all_scenes(&self) -> impl Iterator<Item = SceneRef<'_>> + '_ {
        std::iter::once(SceneRef::Root(self)).chain(self.scenes.iter().map(SceneRef::Scene))
    }
}

/// Either the panorama itself (its root scene) or one of its scenes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SceneRef<'a> {
    Root(&'a Panorama),
    Scene(&'a Scene),
}

impl<'a> SceneRef<'a> {
    pub fn id(&self) -> &'a SceneId {
        match self {
            SceneRef::Root(p) => &p.id,
            SceneRef::Scene(s) => &s.id,
        }
    }

    pub fn title(&self) -> &'a str {
        match self {
            SceneRef::Root(p) => &p.title,
            SceneRef::Scene(s) => &s.title,
        }
    }

    pub fn image(&self) -> &'a str {
        match self {
            SceneRef::Root(p) => &p.image,
            SceneRef::Scene(s) => &s.image,
        }
    }

    pub fn thumbnail(&self) -> Option<&'a str> {
        match self {
            SceneRef::Root(p) => p.thumbnail.as_deref(),
            SceneRef::Scene(s) => s.thumbnail.as_deref(),
        }
    }

    pub fn hotspots(&self) -> &'a [Hotspot] {
        match self {
            SceneRef::Root(p) => &p.hotspots,
            SceneRef::Scene(s) => &s.hotspots,
        }
    }

    /// The root panorama carries no overlay variants.
    pub fn variants(&self) -> Option<&'a ImageVariants> {
        match self {
            SceneRef::Root(_) => None,
            SceneRef::Scene(s) => Some(&s.variants),
        }
    }
}
