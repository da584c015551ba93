//! Merging several datasets into one.
//!
//! Inputs are folded left to right into an accumulator. For each input:
//!
//! 1. Categories are matched against the accumulated ones by exact `name`.
//!    Unknown names get the next category id (ids start at 1).
//! 2. Images get the next dense, zero-based image id.
//! 3. Annotations get the next dense, zero-based annotation id, and their
//!    `image_id` / `category_id` are rewritten through the maps built in
//!    steps 1 and 2 for the same input.
//!
//! `info` and the extra top-level keys come from the first input. Licenses
//! come from the first input unless [`MergeOptions::concat_licenses`] is set.
//! Inputs are borrowed; every output record is a fresh copy.

pub mod batch;
mod report;

pub use report::{DatasetCounts, InputSummary, MergeReport};

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::dataset::io_coco_json::read_coco_json;
use crate::dataset::{Annotation, AnnotationId, Category, CategoryId, Dataset, Image, ImageId};
use crate::error::CocoKitError;
use crate::validation::validate_references;

/// Options controlling how inputs are combined.
#[derive(Clone, Debug, Default)]
pub struct MergeOptions {
    /// Concatenate the licenses of every input instead of keeping only the
    /// first input's.
    pub concat_licenses: bool,
}

/// Left-fold accumulator for merging datasets.
///
/// A failed [`Merger::push`] leaves the accumulator as it was before the
/// call.
#[derive(Debug)]
pub struct Merger {
    options: MergeOptions,
    output: Option<Dataset>,
    category_by_name: HashMap<String, CategoryId>,
    next_category: CategoryId,
    report: MergeReport,
}

/// One input, remapped but not yet appended.
struct Staged {
    categories: Vec<Category>,
    images: Vec<Image>,
    annotations: Vec<Annotation>,
    reused_categories: usize,
}

impl Merger {
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            output: None,
            category_by_name: HashMap::new(),
            next_category: CategoryId::new(1),
            report: MergeReport::default(),
        }
    }

    /// Number of inputs folded in so far.
    pub fn len(&self) -> usize {
        self.report.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.report.inputs.is_empty()
    }

    /// Folds one more dataset into the accumulator.
    ///
    /// `label` names the input in errors and in the report.
    ///
    /// # Errors
    /// [`CocoKitError::DuplicateId`] if the input repeats an image or
    /// category id, [`CocoKitError::Reference`] if one of its annotations
    /// points at an image or category it does not contain.
    pub fn push(&mut self, input: &Dataset, label: impl Into<String>) -> Result<(), CocoKitError> {
        let label = label.into();
        let counts = DatasetCounts::of(input);
        info!(
            "Input {} ({}): {} images, {} annotations",
            self.len() + 1,
            label,
            counts.images,
            counts.annotations
        );

        let staged = self.stage(input, &label)?;
        self.commit(input, staged, label, counts);
        Ok(())
    }

    /// Remaps `input` against the current state without modifying it.
    fn stage(&self, input: &Dataset, label: &str) -> Result<Staged, CocoKitError> {
        let mut category_map: HashMap<CategoryId, CategoryId> =
            HashMap::with_capacity(input.categories.len());
        let mut staged_names: HashMap<&str, CategoryId> = HashMap::new();
        let mut categories = Vec::new();
        let mut next_category = self.next_category;
        let mut reused_categories = 0;

        for category in &input.categories {
            let known = self
                .category_by_name
                .get(category.name.as_str())
                .or_else(|| staged_names.get(category.name.as_str()))
                .copied();

            let target = match known {
                Some(id) => {
                    reused_categories += 1;
                    id
                }
                None => {
                    let id = next_category;
                    next_category = id.next();
                    staged_names.insert(&category.name, id);
                    categories.push(Category {
                        id,
                        ..category.clone()
                    });
                    id
                }
            };

            if category_map.insert(category.id, target).is_some() {
                return Err(CocoKitError::DuplicateId {
                    dataset: label.to_string(),
                    kind: "category",
                    id: category.id.as_i64(),
                });
            }
        }

        let (image_base, annotation_base) = self
            .output
            .as_ref()
            .map(|o| (o.images.len() as i64, o.annotations.len() as i64))
            .unwrap_or((0, 0));

        let mut image_map: HashMap<ImageId, ImageId> = HashMap::with_capacity(input.images.len());
        let mut images = Vec::with_capacity(input.images.len());
        for (offset, image) in input.images.iter().enumerate() {
            let id = ImageId::new(image_base + offset as i64);
            if image_map.insert(image.id, id).is_some() {
                return Err(CocoKitError::DuplicateId {
                    dataset: label.to_string(),
                    kind: "image",
                    id: image.id.as_i64(),
                });
            }
            images.push(Image {
                id,
                fields: image.fields.clone(),
            });
        }

        let mut annotations = Vec::with_capacity(input.annotations.len());
        for (offset, annotation) in input.annotations.iter().enumerate() {
            let image_id = *image_map.get(&annotation.image_id).ok_or_else(|| {
                CocoKitError::Reference {
                    dataset: label.to_string(),
                    message: format!(
                        "annotation {} references image {}, which is not in this dataset",
                        annotation.id, annotation.image_id
                    ),
                }
            })?;
            let category_id = *category_map.get(&annotation.category_id).ok_or_else(|| {
                CocoKitError::Reference {
                    dataset: label.to_string(),
                    message: format!(
                        "annotation {} references category {}, which is not in this dataset",
                        annotation.id, annotation.category_id
                    ),
                }
            })?;

            annotations.push(Annotation {
                id: AnnotationId::new(annotation_base + offset as i64),
                image_id,
                category_id,
                fields: annotation.fields.clone(),
            });
        }

        Ok(Staged {
            categories,
            images,
            annotations,
            reused_categories,
        })
    }

    fn commit(&mut self, input: &Dataset, staged: Staged, label: String, counts: DatasetCounts) {
        let first = self.output.is_none();
        let output = self.output.get_or_insert_with(|| input.skeleton());
        if !first && self.options.concat_licenses {
            output.licenses.extend(input.licenses.iter().cloned());
        }

        for category in &staged.categories {
            debug!(name = %category.name, id = %category.id, "new category");
            self.category_by_name
                .insert(category.name.clone(), category.id);
            self.next_category = category.id.next();
        }

        output.categories.extend(staged.categories);
        output.images.extend(staged.images);
        output.annotations.extend(staged.annotations);

        self.report.inputs.push(InputSummary {
            label,
            counts,
            reused_categories: staged.reused_categories,
        });
    }

    /// Finishes the merge and returns the combined dataset.
    ///
    /// # Errors
    /// [`CocoKitError::NoInputs`] if nothing was pushed.
    pub fn finish(self) -> Result<(Dataset, MergeReport), CocoKitError> {
        let output = self.output.ok_or(CocoKitError::NoInputs)?;

        let check = validate_references(&output);
        if let Some(issue) = check.issues.iter().find(|i| i.code.is_reference()) {
            return Err(CocoKitError::Reference {
                dataset: "merged output".to_string(),
                message: issue.to_string(),
            });
        }

        let mut report = self.report;
        report.output = DatasetCounts::of(&output);
        info!(
            "Result: {} images, {} annotations, {} categories",
            report.output.images, report.output.annotations, report.output.categories
        );

        Ok((output, report))
    }
}

/// Merges two datasets.
pub fn merge(first: &Dataset, second: &Dataset) -> Result<Dataset, CocoKitError> {
    merge_many([first, second])
}

/// Merges any number of datasets, left to right.
///
/// Equivalent to folding [`merge`] over the sequence.
pub fn merge_many<'a, I>(datasets: I) -> Result<Dataset, CocoKitError>
where
    I: IntoIterator<Item = &'a Dataset>,
{
    let mut merger = Merger::new(MergeOptions::default());
    for (idx, dataset) in datasets.into_iter().enumerate() {
        merger.push(dataset, format!("dataset {}", idx + 1))?;
    }
    merger.finish().map(|(dataset, _)| dataset)
}

/// Reads and merges COCO files in the given order.
pub fn merge_files<P: AsRef<Path>>(
    paths: &[P],
    options: &MergeOptions,
) -> Result<(Dataset, MergeReport), CocoKitError> {
    let mut merger = Merger::new(options.clone());
    for path in paths {
        let path = path.as_ref();
        let dataset = read_coco_json(path)?;
        merger.push(&dataset, path.display().to_string())?;
    }
    merger.finish()
}
