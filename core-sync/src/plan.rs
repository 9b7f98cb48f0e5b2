//! # Reconciliation Planning
//!
//! Pure functions that turn a source listing, an output listing and the style
//! catalog into the work a sync run has to do. No I/O happens here, which
//! keeps the diff logic testable without storage.

use crate::styles::{StyleCatalog, StyleDefinition, ORIGINAL_FOLDER};
use bridge_traits::storage::{extension, file_name, folder_prefix, join_path, parent_folder};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::warn;

/// Extensions eligible for styling (lowercase, without the dot)
pub const SOURCE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Whether a path names an image the engine styles
pub fn is_source_image(path: &str) -> bool {
    extension(path)
        .map(|ext| SOURCE_IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// One unit of required work
#[derive(Debug, Clone, PartialEq)]
pub struct SyncTask {
    pub source_path: String,
    pub target_path: String,
    /// `None` is the original-copy sentinel
    pub style: Option<StyleDefinition>,
}

impl SyncTask {
    /// Source filename, used as the output filename
    pub fn file_name(&self) -> &str {
        file_name(&self.source_path)
    }

    pub fn is_original_copy(&self) -> bool {
        self.style.is_none()
    }
}

/// Output path for a source file in a managed folder
pub fn target_path(output_prefix: &str, folder: &str, source_file: &str) -> String {
    join_path(&[output_prefix, folder, source_file])
}

/// Diff between expected and actual output state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    /// Every expected target, in planning order
    pub expected: Vec<SyncTask>,
    /// Expected targets absent from the output listing
    pub missing: Vec<SyncTask>,
    /// Expected targets already present
    pub skipped: Vec<String>,
    /// Managed outputs with no expected counterpart, sorted
    pub orphaned: Vec<String>,
}

/// Authoritative source set from a raw listing
///
/// Keeps supported image extensions, drops anything inside a managed output
/// folder and resolves duplicate filenames in favour of the lexicographically
/// first path. The result is sorted by path.
pub fn select_sources(
    listing: &[String],
    output_prefix: &str,
    catalog: &StyleCatalog,
) -> Vec<String> {
    let managed_prefixes: Vec<String> = catalog
        .managed_folders()
        .into_iter()
        .map(|folder| folder_prefix(&join_path(&[output_prefix, folder])))
        .collect();

    let mut candidates: Vec<&String> = listing
        .iter()
        .filter(|path| is_source_image(path))
        .filter(|path| !managed_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())))
        .collect();
    candidates.sort();
    candidates.dedup();

    let mut seen: HashMap<&str, &str> = HashMap::new();
    let mut sources = Vec::with_capacity(candidates.len());

    for path in candidates {
        let name = file_name(path);
        if let Some(kept) = seen.get(name) {
            warn!(
                path = %path,
                kept = %kept,
                "Ignoring source image with duplicate filename"
            );
            continue;
        }
        seen.insert(name, path.as_str());
        sources.push(path.clone());
    }

    sources
}

/// Keep only outputs sitting directly in a managed folder
pub fn select_managed_outputs(
    listing: &[String],
    output_prefix: &str,
    catalog: &StyleCatalog,
) -> BTreeSet<String> {
    let managed: HashSet<String> = catalog
        .managed_folders()
        .into_iter()
        .map(|folder| join_path(&[output_prefix, folder]))
        .collect();

    listing
        .iter()
        .filter(|path| managed.contains(parent_folder(path)))
        .cloned()
        .collect()
}

/// Compute expected tasks and diff them against the actual outputs
///
/// Tasks follow source order, and within a source the original copy comes
/// first followed by styles in catalog order.
pub fn build_plan(
    sources: &[String],
    actual_outputs: &BTreeSet<String>,
    output_prefix: &str,
    catalog: &StyleCatalog,
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for source in sources {
        let name = file_name(source);

        plan.expected.push(SyncTask {
            source_path: source.clone(),
            target_path: target_path(output_prefix, ORIGINAL_FOLDER, name),
            style: None,
        });

        for style in catalog.iter() {
            plan.expected.push(SyncTask {
                source_path: source.clone(),
                target_path: target_path(output_prefix, &style.folder_token, name),
                style: Some(style.clone()),
            });
        }
    }

    let expected_targets: HashSet<&str> = plan
        .expected
        .iter()
        .map(|task| task.target_path.as_str())
        .collect();

    plan.orphaned = actual_outputs
        .iter()
        .filter(|path| !expected_targets.contains(path.as_str()))
        .cloned()
        .collect();

    for task in &plan.expected {
        if actual_outputs.contains(&task.target_path) {
            plan.skipped.push(task.target_path.clone());
        } else {
            plan.missing.push(task.clone());
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> StyleCatalog {
        StyleCatalog::new(vec![
            StyleDefinition::new(1, "Vintage", "old photo").with_strength(0.6),
            StyleDefinition::new(2, "Neon", "neon glow"),
        ])
        .unwrap()
    }

    fn listing(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_is_source_image() {
        assert!(is_source_image("src/a.jpg"));
        assert!(is_source_image("src/a.JPEG"));
        assert!(is_source_image("b.webp"));
        assert!(!is_source_image("notes.txt"));
        assert!(!is_source_image("anim.gif"));
        assert!(!is_source_image("jpg"));
    }

    #[test]
    fn test_target_path() {
        assert_eq!(target_path("out", "vintage", "a.jpg"), "out/vintage/a.jpg");
        assert_eq!(target_path("", "original", "a.jpg"), "original/a.jpg");
    }

    #[test]
    fn test_select_sources_filters_and_sorts() {
        let raw = listing(&["src/b.png", "src/readme.md", "src/a.jpg", "src/c.gif"]);
        assert_eq!(
            select_sources(&raw, "out", &catalog()),
            vec!["src/a.jpg", "src/b.png"]
        );
    }

    #[test]
    fn test_select_sources_skips_managed_outputs() {
        let raw = listing(&[
            "a.jpg",
            "styled/original/a.jpg",
            "styled/vintage/a.jpg",
            "styled/extra/keep.jpg",
        ]);
        assert_eq!(
            select_sources(&raw, "styled", &catalog()),
            vec!["a.jpg", "styled/extra/keep.jpg"]
        );
    }

    #[test]
    fn test_select_sources_first_duplicate_wins() {
        let raw = listing(&["src/z/cat.jpg", "src/a/cat.jpg", "src/dog.png"]);
        assert_eq!(
            select_sources(&raw, "out", &catalog()),
            vec!["src/a/cat.jpg", "src/dog.png"]
        );
    }

    #[test]
    fn test_select_managed_outputs() {
        let raw = listing(&[
            "out/original/a.jpg",
            "out/neon/a.jpg",
            "out/retired/a.jpg",
            "out/vintage/nested/a.jpg",
            "out/index.html",
        ]);
        let managed = select_managed_outputs(&raw, "out", &catalog());
        assert_eq!(
            managed.into_iter().collect::<Vec<_>>(),
            vec!["out/neon/a.jpg", "out/original/a.jpg"]
        );
    }

    #[test]
    fn test_build_plan_orders_tasks() {
        let sources = listing(&["src/a.jpg", "src/b.png"]);
        let plan = build_plan(&sources, &BTreeSet::new(), "out", &catalog());

        let targets: Vec<&str> = plan.missing.iter().map(|t| t.target_path.as_str()).collect();
        assert_eq!(
            targets,
            vec![
                "out/original/a.jpg",
                "out/vintage/a.jpg",
                "out/neon/a.jpg",
                "out/original/b.png",
                "out/vintage/b.png",
                "out/neon/b.png",
            ]
        );
        assert!(plan.missing[0].is_original_copy());
        assert_eq!(plan.missing[1].style.as_ref().unwrap().strength, 0.6);
        assert!(plan.skipped.is_empty());
        assert!(plan.orphaned.is_empty());
    }

    #[test]
    fn test_build_plan_diff() {
        let sources = listing(&["src/b.png"]);
        let actual: BTreeSet<String> = listing(&[
            "out/original/a.jpg",
            "out/vintage/a.jpg",
            "out/original/b.png",
        ])
        .into_iter()
        .collect();

        let plan = build_plan(&sources, &actual, "out", &catalog());

        assert_eq!(plan.skipped, vec!["out/original/b.png"]);
        assert_eq!(
            plan.missing.iter().map(|t| t.target_path.as_str()).collect::<Vec<_>>(),
            vec!["out/vintage/b.png", "out/neon/b.png"]
        );
        assert_eq!(plan.orphaned, vec!["out/original/a.jpg", "out/vintage/a.jpg"]);
        assert_eq!(plan.expected.len(), 3);
    }
}
