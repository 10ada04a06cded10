use std::fs;
use std::path::{Path, PathBuf};

use catalog::{Catalog, CategoryFilter};
use clap::{Parser, Subcommand};
use formats::{EngineConfig, ManifestError, Tour, TourManifest};
use scene::{HotspotKind, Panorama};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tour", version, about = "Inspect panorama tour manifests")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a manifest and report every configuration problem.
    Validate { manifest: PathBuf },
    /// Print the render-engine configuration for one panorama.
    EngineConfig {
        manifest: PathBuf,
        id: String,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the map pins of all geo-located panoramas as JSON.
    Pins { manifest: PathBuf },
    /// List panoramas matching a query.
    Search {
        manifest: PathBuf,
        #[arg(default_value = "")]
        query: String,
        #[arg(long, default_value = "all")]
        category: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    match Args::parse().command {
        Command::Validate { manifest } => {
            let parsed = read_manifest(&manifest)?;
            let problems = parsed.problems();
            if !problems.is_empty() {
                return Err(report(&manifest, &problems));
            }
            let tour = parsed.into_tour().map_err(|e| describe(&manifest, &e))?;
            print!("{}", summarize(&tour));
            Ok(())
        }
        Command::EngineConfig {
            manifest,
            id,
            pretty,
        } => {
            let tour = read_tour(&manifest)?;
            let catalog = Catalog::from_tour(&tour);
            let panorama = catalog.get(&id).map_err(|e| e.to_string())?;
            let config = EngineConfig::for_panorama(panorama, &tour.settings);
            let payload = if pretty {
                serde_json::to_string_pretty(&config)
            } else {
                config.to_json()
            }
            .map_err(|e| format!("json: {e}"))?;
            println!("{payload}");
            Ok(())
        }
        Command::Pins { manifest } => {
            let catalog = Catalog::from_tour(&read_tour(&manifest)?);
            let payload = catalog.map_pins_json().map_err(|e| format!("json: {e}"))?;
            println!("{payload}");
            Ok(())
        }
        Command::Search {
            manifest,
            query,
            category,
        } => {
            let catalog = Catalog::from_tour(&read_tour(&manifest)?);
            let filter = CategoryFilter::parse(&category);
            let hits = catalog.search(&query, &filter);
            debug!(query = %query, category = %category, hits = hits.len(), "search");
            for p in hits {
                println!("{}\t{}\t{}", p.id, p.category, p.title);
            }
            Ok(())
        }
    }
}

fn read_manifest(path: &Path) -> Result<TourManifest, String> {
    let payload = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    TourManifest::from_json_str(&payload).map_err(|e| describe(path, &e))
}

fn read_tour(path: &Path) -> Result<Tour, String> {
    let tour = read_manifest(path)?
        .into_tour()
        .map_err(|e| describe(path, &e))?;
    info!(path = ?path, panoramas = tour.panoramas.len(), "loaded tour");
    Ok(tour)
}

fn describe(path: &Path, err: &ManifestError) -> String {
    format!("{}: {err}", path.display())
}

fn report(path: &Path, problems: &[ManifestError]) -> String {
    let mut out = format!("{} problem(s)", problems.len());
    for err in problems {
        out.push('\n');
        out.push_str(&describe(path, err));
    }
    out
}

fn summarize(tour: &Tour) -> String {
    let mut out = String::new();
    for p in &tour.panoramas {
        out.push_str(&summary_line(p));
        out.push('\n');
    }
    out.push_str(&format!(
        "ok: {} panoramas, {} categories\n",
        tour.panoramas.len(),
        tour.categories.len()
    ));
    out
}

fn summary_line(p: &Panorama) -> String {
    let (mut links, mut info, mut external) = (0, 0, 0);
    for scene in p.all_scenes() {
        for h in scene.hotspots() {
            match h.kind {
                HotspotKind::SceneLink { .. } => links += 1,
                HotspotKind::Info { .. } => info += 1,
                HotspotKind::ExternalLink { .. } => external += 1,
            }
        }
    }
    let located = p.location.map_or("-".to_string(), |g| g.readout());
    format!(
        "{}: {} scene(s), {links} link(s), {info} info, {external} external, at {located}",
        p.id,
        p.all_scenes().count()
    )
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{report, summarize, summary_line};
    use formats::{TourManifest, load_tour_from_str};
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = r#"{
        "categories": [{ "id": "mountains", "title": "Mountains" }],
        "panoramas": [{
            "id": "mountain-peak",
            "title": "Mountain Peak",
            "category": "mountains",
            "imageUrl": "peak.jpg",
            "latitude": 45.832622,
            "longitude": 6.865175,
            "hotspots": [
                { "pitch": 0, "yaw": 10, "text": "North", "type": "scene", "sceneId": "north-view" },
                { "pitch": 5, "yaw": 90, "text": "Cross" }
            ],
            "scenes": [{
                "id": "north-view",
                "title": "North View",
                "imageUrl": "north.jpg",
                "hotspots": [
                    { "pitch": 0, "yaw": 180, "text": "Back", "sceneId": "mountain-peak" },
                    { "pitch": 0, "yaw": 0, "text": "Weather", "link": "https://example.org" }
                ]
            }]
        }]
    }"#;

    #[test]
    fn summary_counts_hotspots_across_scenes() {
        let tour = load_tour_from_str(MANIFEST).unwrap();
        assert_eq!(
            summary_line(&tour.panoramas[0]),
            "mountain-peak: 2 scene(s), 2 link(s), 1 info, 1 external, at 45.832622, 6.865175"
        );
        assert!(summarize(&tour).ends_with("ok: 1 panoramas, 1 categories\n"));
    }

    #[test]
    fn report_lists_each_problem() {
        let broken = MANIFEST
            .replace(r#""category": "mountains""#, r#""category": "rivers""#)
            .replace(r#""id": "mountain-peak""#, r#""id": "peak""#);
        let mut manifest = TourManifest::from_json_str(&broken).unwrap();
        let mut twin = manifest.panoramas[0].clone();
        twin.category = "mountains".to_string();
        manifest.panoramas.push(twin);

        let text = report(Path::new("tour.json"), &manifest.problems());
        assert_eq!(
            text,
            "2 problem(s)\n\
             tour.json: peak: unknown category \"rivers\"\n\
             tour.json: panorama id \"peak\" is declared twice"
        );
    }
}
