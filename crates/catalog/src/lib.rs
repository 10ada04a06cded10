//! Gallery and map boundary over the configured panoramas.
//!
//! The gallery UI and the map overlay are external; this crate provides the
//! queries they run: category/search filtering, the list of geo-located pins,
//! and resolution of a selected id coming back from the map.

use formats::{Category, Tour};
use scene::{Panorama, SceneId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NotFound(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound(id) => write!(f, "panorama {id:?} not found"),
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// `"all"` (or empty) selects every category.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "all" => CategoryFilter::All,
            other => CategoryFilter::Only(other.to_string()),
        }
    }

    fn matches(&self, panorama: &Panorama) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(id) => &panorama.category == id,
        }
    }
}

/// What the map overlay needs per marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPin {
    pub id: String,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Catalog {
    categories: Vec<Category>,
    panoramas: Vec<Panorama>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>, panoramas: Vec<Panorama>) -> Self {
        Self {
            categories,
            panoramas,
        }
    }

    pub fn from_tour(tour: &Tour) -> Self {
        Self::new(tour.categories.clone(), tour.panoramas.clone())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn panoramas(&self) -> &[Panorama] {
        &self.panoramas
    }

    pub fn get(&self, id: &str) -> Result<&Panorama, CatalogError> {
        self.panoramas
            .iter()
            .find(|p| p.id.as_str() == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Case-insensitive substring match on title and description, restricted
    /// by category. Declaration order is preserved.
    pub fn search(&self, query: &str, filter: &CategoryFilter) -> Vec<&Panorama> {
        let needle = query.trim().to_lowercase();
        self.panoramas
            .iter()
            .filter(|p| filter.matches(p))
            .filter(|p| {
                needle.is_empty()
                    || p.title.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Geo-located panoramas only.
    pub fn map_pins(&self) -> Vec<MapPin> {
        self.panoramas
            .iter()
            .filter_map(|p| {
                let loc = p.location?;
                Some(MapPin {
                    id: p.id.as_str().to_string(),
                    title: p.title.clone(),
                    latitude: loc.latitude,
                    longitude: loc.longitude,
                })
            })
            .collect()
    }

    pub fn map_pins_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.map_pins())
    }
}

/// Selected-id state shared between the map overlay and the host page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MapSelection {
    selected: Option<SceneId>,
}

impl MapSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&SceneId> {
        self.selected.as_ref()
    }

    /// Applies a selected-id event from the map.
    ///
    /// Returns the panorama to show, and whether the selection changed (the
    /// host re-mounts the viewer only on change).
    pub fn select<'a>(
        &mut self,
        catalog: &'a Catalog,
        id: &str,
    ) -> Result<(&'a Panorama, bool), CatalogError> {
        let panorama = catalog.get(id)?;
        let changed = self.selected.as_ref() != Some(&panorama.id);
        self.selected = Some(panorama.id.clone());
        Ok((panorama, changed))
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, CatalogError, CategoryFilter, MapSelection};
    use formats::Category;
    use foundation::geo::GeoPoint;
    use pretty_assertions::assert_eq;
    use scene::Panorama;

    fn catalog() -> Catalog {
        let mut vista = Panorama::new("mountain-vista", "Mountain Vista", "vista.jpg");
        vista.description = "Snow-capped mountains and valleys".to_string();
        vista.category = "nature".to_string();
        vista.location = GeoPoint::new(-22.908333, -67.775);

        let mut temple = Panorama::new("ancient-temple", "Ancient Temple", "alma.jpg");
        temple.description = "Intricate architecture".to_string();
        temple.category = "architecture".to_string();

        let mut square = Panorama::new("city-square", "City Square", "bma.jpg");
        square.description = "Historic buildings around a bustling square".to_string();
        square.category = "cities".to_string();
        square.location = GeoPoint::new(48.1372, 11.5756);

        Catalog::new(
            vec![Category {
                id: "nature".to_string(),
                title: "Nature".to_string(),
                description: String::new(),
            }],
            vec![vista, temple, square],
        )
    }

    fn ids(found: Vec<&Panorama>) -> Vec<&str> {
        found.into_iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn search_matches_title_and_description_case_insensitively() {
        let c = catalog();
        assert_eq!(ids(c.search("TEMPLE", &CategoryFilter::All)), vec!["ancient-temple"]);
        assert_eq!(ids(c.search("historic", &CategoryFilter::All)), vec!["city-square"]);
        assert_eq!(c.search("", &CategoryFilter::All).len(), 3);
    }

    #[test]
    fn category_filter_restricts_results() {
        let c = catalog();
        let nature = CategoryFilter::parse("nature");
        assert_eq!(ids(c.search("", &nature)), vec!["mountain-vista"]);
        assert!(c.search("temple", &nature).is_empty());
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
    }

    #[test]
    fn map_pins_skip_panoramas_without_location() {
        let pins = catalog().map_pins();
        let pin_ids: Vec<&str> = pins.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(pin_ids, vec!["mountain-vista", "city-square"]);
        assert_eq!(pins[0].latitude, -22.908333);
    }

    #[test]
    fn selection_reports_changes_and_unknown_ids() {
        let c = catalog();
        let mut sel = MapSelection::new();
        let (p, changed) = sel.select(&c, "city-square").unwrap();
        assert_eq!(p.title, "City Square");
        assert!(changed);
        let (_, changed) = sel.select(&c, "city-square").unwrap();
        assert!(!changed);
        assert_eq!(
            sel.select(&c, "atlantis").unwrap_err(),
            CatalogError::NotFound("atlantis".to_string())
        );
        assert_eq!(sel.selected().map(|s| s.as_str()), Some("city-square"));
    }
}
