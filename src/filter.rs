//! Removing images (and their annotations) selected by a [`PropertyRule`].

use std::collections::HashMap;

use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::dataset::{Annotation, Dataset, ImageId};
use crate::rule::PropertyRule;

pub const DEFAULT_OUTPUT: &str = "filtered_annotations.json";

/// Counts of what a filter kept and dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub kept_images: usize,
    pub removed_images: usize,
    pub kept_annotations: usize,
    pub removed_annotations: usize,
}

impl fmt::Display for FilterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  kept {} images, {} annotations",
            self.kept_images, self.kept_annotations
        )?;
        writeln!(
            f,
            "  removed {} images, {} annotations",
            self.removed_images, self.removed_annotations
        )
    }
}

/// Drops every image matching `rule` together with its annotations.
///
/// Categories and metadata are kept as they are and ids are not renumbered.
/// Images keep their order. Annotations are emitted grouped by image, in
/// image order, and keep their input order within each image.
pub fn filter_dataset(dataset: &Dataset, rule: &PropertyRule) -> (Dataset, FilterSummary) {
    info!("Filtering images matching {:?}", rule.criteria);

    let mut out = dataset.skeleton();
    out.categories = dataset.categories.clone();

    let mut by_image: HashMap<ImageId, Vec<&Annotation>> = HashMap::new();
    for ann in &dataset.annotations {
        by_image.entry(ann.image_id).or_default().push(ann);
    }

    for image in &dataset.images {
        if rule.matches(image) {
            continue;
        }
        out.images.push(image.clone());
        if let Some(anns) = by_image.remove(&image.id) {
            out.annotations.extend(anns.into_iter().cloned());
        }
    }

    let summary = FilterSummary {
        kept_images: out.images.len(),
        removed_images: dataset.images.len() - out.images.len(),
        kept_annotations: out.annotations.len(),
        removed_annotations: dataset.annotations.len() - out.annotations.len(),
    };
    info!(
        "Kept {} of {} images",
        summary.kept_images,
        dataset.images.len()
    );

    (out, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Category, Image};
    use serde_json::json;

    fn sample() -> Dataset {
        Dataset {
            info: json!({"description": "sample"}),
            images: vec![
                Image::new(1i64, "night_01.jpg").with_field("weather", "rain"),
                Image::new(2i64, "day_01.jpg").with_field("weather", "rain"),
                Image::new(3i64, "day_02.jpg").with_field("weather", "sun"),
            ],
            categories: vec![Category::new(1i64, "car")],
            annotations: vec![
                Annotation::new(10i64, 1i64, 1i64),
                Annotation::new(11i64, 2i64, 1i64),
                Annotation::new(12i64, 1i64, 1i64),
                Annotation::new(13i64, 3i64, 1i64),
            ],
            ..Default::default()
        }
    }

    fn rule(match_all: bool) -> PropertyRule {
        serde_json::from_value(json!({
            "filter": {"file_name": ["night"], "weather": ["rain"]},
            "match_all": match_all
        }))
        .unwrap()
    }

    fn ids(dataset: &Dataset) -> (Vec<i64>, Vec<i64>) {
        (
            dataset.images.iter().map(|i| i.id.as_i64()).collect(),
            dataset.annotations.iter().map(|a| a.id.as_i64()).collect(),
        )
    }

    #[test]
    fn match_all_removes_only_full_matches() {
        let (out, summary) = filter_dataset(&sample(), &rule(true));
        assert_eq!(ids(&out), (vec![2, 3], vec![11, 13]));
        assert_eq!(summary.removed_images, 1);
        assert_eq!(summary.removed_annotations, 2);
    }

    #[test]
    fn match_any_removes_partial_matches() {
        let (out, summary) = filter_dataset(&sample(), &rule(false));
        assert_eq!(ids(&out), (vec![3], vec![13]));
        assert_eq!(summary.kept_images, 1);
    }

    #[test]
    fn annotations_are_grouped_by_kept_image() {
        let (out, _) = filter_dataset(&sample(), &rule(true));
        let mut input = sample();
        input.annotations.push(Annotation::new(14i64, 2i64, 1i64));

        let (out_extra, summary) = filter_dataset(&input, &rule(true));
        assert_eq!(ids(&out).1, vec![11, 13]);
        assert_eq!(ids(&out_extra), (vec![2, 3], vec![11, 14, 13]));
        assert_eq!(summary.kept_annotations, 3);
    }

    #[test]
    fn annotations_of_unknown_images_are_dropped() {
        let mut input = sample();
        input.annotations.push(Annotation::new(20i64, 99i64, 1i64));

        let (out, summary) = filter_dataset(&input, &rule(true));
        assert_eq!(ids(&out).1, vec![11, 13]);
        assert_eq!(summary.removed_annotations, 3);
    }

    #[test]
    fn metadata_and_categories_survive() {
        let input = sample();
        let (out, _) = filter_dataset(&input, &rule(false));
        assert_eq!(out.info, input.info);
        assert_eq!(out.categories, input.categories);
    }
}
