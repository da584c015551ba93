//! Merging every dataset file found under a directory.
//!
//! Datasets usually live next to their images, one directory per source
//! (`dir/site_a/annotations.json`, `dir/site_b/annotations.json`, ...). To
//! keep file names unique after merging, each image `file_name` is prefixed
//! with the name of the directory its dataset file sits in.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde_json::Value;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::{MergeOptions, MergeReport, Merger};
use crate::dataset::io_coco_json::{read_coco_json, write_coco_json};
use crate::dataset::Dataset;
use crate::error::CocoKitError;

pub const DEFAULT_PATTERN: &str = "*.json";
pub const DEFAULT_OUTPUT: &str = "merged_annotations.json";

/// Options for [`merge_directory`].
#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Glob matched against file names (or against the path relative to the
    /// root directory when it contains a `/`).
    pub pattern: String,
    /// Output path, relative to the root directory unless absolute.
    pub output: PathBuf,
    pub merge: MergeOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            merge: MergeOptions::default(),
        }
    }
}

/// Result of a batch merge.
#[derive(Clone, Debug)]
pub struct BatchOutcome {
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub report: MergeReport,
}

/// Finds dataset files under `dir`, sorted by path.
///
/// `exclude` is skipped if it turns up (normally the merge output from a
/// previous run).
pub fn discover_files(
    dir: &Path,
    pattern: &str,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>, CocoKitError> {
    let compiled = Pattern::new(pattern).map_err(|source| CocoKitError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    let match_relative = pattern.contains('/');
    let exclude = exclude.and_then(|p| fs::canonicalize(p).ok());

    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let matched = if match_relative {
            compiled.matches_path(path.strip_prefix(dir).unwrap_or(path))
        } else {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| compiled.matches(name))
        };
        if !matched {
            continue;
        }

        if let Some(exclude) = &exclude {
            if fs::canonicalize(path).ok().as_ref() == Some(exclude) {
                warn!(path = %path.display(), "skipping previous merge output");
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Name of the directory containing `path`, or an empty string.
pub fn source_dir_name(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Returns a copy of `dataset` with every image `file_name` prefixed by
/// `prefix/`.
///
/// # Errors
/// [`CocoKitError::Schema`] if an image has no string `file_name`.
pub fn prefix_file_names(
    dataset: &Dataset,
    prefix: &str,
    label: &str,
) -> Result<Dataset, CocoKitError> {
    let mut out = dataset.clone();
    for (idx, image) in out.images.iter_mut().enumerate() {
        let file_name = image.file_name().ok_or_else(|| CocoKitError::Schema {
            dataset: label.to_string(),
            field: format!("images[{}].file_name", idx),
        })?;
        let prefixed = format!("{}/{}", prefix, file_name);
        image
            .fields
            .insert("file_name".to_string(), Value::String(prefixed));
    }
    Ok(out)
}

/// Merges every matching dataset under `dir` into one file.
///
/// Inputs are read, prefixed and folded in path order; the output is written
/// only after all of them merged cleanly.
pub fn merge_directory(dir: &Path, options: &BatchOptions) -> Result<BatchOutcome, CocoKitError> {
    let output = dir.join(&options.output);
    let inputs = discover_files(dir, &options.pattern, Some(&output))?;
    if inputs.is_empty() {
        return Err(CocoKitError::NoInputFiles {
            dir: dir.to_path_buf(),
            pattern: options.pattern.clone(),
        });
    }
    info!("Found {} dataset file(s) under {}", inputs.len(), dir.display());

    let mut merger = Merger::new(options.merge.clone());
    for path in &inputs {
        let label = path.display().to_string();
        let dataset = read_coco_json(path)?;
        let dataset = prefix_file_names(&dataset, &source_dir_name(path), &label)?;
        merger.push(&dataset, label)?;
    }

    let (merged, report) = merger.finish()?;
    write_coco_json(&output, &merged)?;
    info!("Merges done, wrote {}", output.display());

    Ok(BatchOutcome {
        output,
        inputs,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Category, Image};

    fn write(path: &Path, json: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, json).unwrap();
    }

    const SMALL: &str = r#"{
        "images": [{"id": 1, "file_name": "0001.jpg"}],
        "annotations": [{"id": 1, "image_id": 1, "category_id": 1}],
        "categories": [{"id": 1, "name": "person"}]
    }"#;

    #[test]
    fn source_dir_name_uses_parent() {
        assert_eq!(source_dir_name(Path::new("data/site_a/ann.json")), "site_a");
        assert_eq!(source_dir_name(Path::new("ann.json")), "");
    }

    #[test]
    fn prefix_does_not_touch_input() {
        let dataset = Dataset {
            images: vec![Image::new(1i64, "a.jpg")],
            categories: vec![Category::new(1i64, "x")],
            ..Default::default()
        };
        let prefixed = prefix_file_names(&dataset, "site", "test").unwrap();
        assert_eq!(prefixed.images[0].file_name(), Some("site/a.jpg"));
        assert_eq!(dataset.images[0].file_name(), Some("a.jpg"));
    }

    #[test]
    fn prefix_requires_file_name() {
        let mut dataset = Dataset {
            images: vec![Image::new(1i64, "a.jpg")],
            ..Default::default()
        };
        dataset.images[0].fields.clear();
        let err = prefix_file_names(&dataset, "site", "test").unwrap_err();
        assert!(matches!(err, CocoKitError::Schema { field, .. } if field == "images[0].file_name"));
    }

    #[test]
    fn discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("b/ann.json"), SMALL);
        write(&dir.path().join("a/ann.json"), SMALL);
        write(&dir.path().join("a/notes.txt"), "x");

        let files = discover_files(dir.path(), "*.json", None).unwrap();
        assert_eq!(
            files,
            [dir.path().join("a/ann.json"), dir.path().join("b/ann.json")]
        );
    }

    #[test]
    fn discover_rejects_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_files(dir.path(), "[", None),
            Err(CocoKitError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn merge_directory_prefixes_and_skips_output() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("site_a/ann.json"), SMALL);
        write(&dir.path().join("site_b/ann.json"), SMALL);

        let outcome = merge_directory(dir.path(), &BatchOptions::default()).unwrap();
        assert_eq!(outcome.inputs.len(), 2);

        let merged = read_coco_json(&outcome.output).unwrap();
        let names: Vec<&str> = merged.images.iter().filter_map(|i| i.file_name()).collect();
        assert_eq!(names, ["site_a/0001.jpg", "site_b/0001.jpg"]);
        assert_eq!(merged.categories.len(), 1);

        // A second run must not fold the previous output back in.
        let again = merge_directory(dir.path(), &BatchOptions::default()).unwrap();
        assert_eq!(again.inputs.len(), 2);
    }

    #[test]
    fn merge_directory_with_no_matches_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = merge_directory(dir.path(), &BatchOptions::default()).unwrap_err();
        assert!(matches!(err, CocoKitError::NoInputFiles { .. }));
        assert!(!dir.path().join(DEFAULT_OUTPUT).exists());
    }
}
