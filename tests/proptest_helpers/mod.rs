#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};

use cocokit::dataset::{Annotation, Category, CategoryId, Dataset, Image, ImageId};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::{json, Value};

/// Small pool so that independently generated datasets share category names.
pub const CATEGORY_NAMES: &[&str] = &["person", "car", "dog", "cat", "bicycle", "traffic light"];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// What an annotation means, independent of ids.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnSem {
    pub image_file: String,
    pub category: String,
    pub payload: Value,
}

/// Resolves every annotation through its image and category.
pub fn ann_semantics(dataset: &Dataset) -> Result<Vec<AnnSem>, String> {
    let image_by_id: HashMap<ImageId, String> = dataset
        .images
        .iter()
        .map(|img| (img.id, img.file_name().unwrap_or_default().to_string()))
        .collect();
    let category_by_id: HashMap<CategoryId, String> = dataset
        .categories
        .iter()
        .map(|cat| (cat.id, cat.name.clone()))
        .collect();

    let mut out = Vec::with_capacity(dataset.annotations.len());
    for ann in &dataset.annotations {
        let image_file = image_by_id.get(&ann.image_id).ok_or_else(|| {
            format!(
                "annotation {} references missing image_id {}",
                ann.id.as_i64(),
                ann.image_id.as_i64()
            )
        })?;
        let category = category_by_id.get(&ann.category_id).ok_or_else(|| {
            format!(
                "annotation {} references missing category_id {}",
                ann.id.as_i64(),
                ann.category_id.as_i64()
            )
        })?;
        out.push(AnnSem {
            image_file: image_file.clone(),
            category: category.clone(),
            payload: Value::Object(ann.fields.clone()),
        });
    }
    Ok(out)
}

pub fn category_names(dataset: &Dataset) -> BTreeSet<String> {
    dataset.categories.iter().map(|c| c.name.clone()).collect()
}

fn arb_image_ids(max_images: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::btree_set(-5_000i64..5_000, 0..=max_images)
        .prop_map(|ids| ids.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn arb_categories(max_categories: usize) -> impl Strategy<Value = Vec<(i64, &'static str)>> {
    prop::collection::btree_set(-500i64..500, 0..=max_categories).prop_flat_map(|ids| {
        let n = ids.len();
        (
            Just(ids.into_iter().collect::<Vec<_>>()),
            prop::collection::vec(prop::sample::select(CATEGORY_NAMES), n),
        )
            .prop_map(|(ids, names)| ids.into_iter().zip(names).collect::<Vec<_>>())
            .prop_shuffle()
    })
}

/// Generates a referentially valid dataset with arbitrary (unique) image
/// and category ids, possibly repeated category names, and annotations
/// pointing only at existing images and categories.
pub fn arb_dataset(
    max_images: usize,
    max_categories: usize,
    max_annotations: usize,
) -> BoxedStrategy<Dataset> {
    (
        arb_image_ids(max_images),
        arb_categories(max_categories),
        "[a-z]{1,8}",
    )
        .prop_flat_map(move |(image_ids, categories, tag)| {
            let annotations = if image_ids.is_empty() || categories.is_empty() {
                Just(Vec::new()).boxed()
            } else {
                prop::collection::vec(
                    (
                        -50_000i64..50_000,
                        0..image_ids.len(),
                        0..categories.len(),
                        0u32..1_000,
                    ),
                    0..=max_annotations,
                )
                .boxed()
            };
            (Just(image_ids), Just(categories), Just(tag), annotations)
        })
        .prop_map(|(image_ids, categories, tag, annotations)| {
            let images = image_ids
                .iter()
                .map(|&id| {
                    Image::new(id, format!("{}_{}.jpg", tag, id))
                        .with_field("width", 640)
                        .with_field("height", 480)
                })
                .collect();
            let categories_out = categories
                .iter()
                .map(|&(id, name)| Category::new(id, name).with_field("supercategory", "thing"))
                .collect();
            let annotations = annotations
                .into_iter()
                .map(|(id, img_idx, cat_idx, size)| {
                    Annotation::new(id, image_ids[img_idx], categories[cat_idx].0)
                        .with_field("bbox", json!([0, 0, size, size]))
                        .with_field("iscrowd", 0)
                })
                .collect();

            Dataset {
                info: json!({ "description": tag }),
                images,
                categories: categories_out,
                annotations,
                ..Default::default()
            }
        })
        .boxed()
}
