//! Dataset validation.
//!
//! Checks the structural invariants the merger relies on:
//! - unique image, annotation and category ids
//! - every annotation resolves to an image and a category
//! - category names that would silently collapse when merged

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};

use crate::dataset::{AnnotationId, CategoryId, Dataset, ImageId};

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, warnings fail validation too.
    pub strict: bool,
}

impl ValidateOptions {
    /// Returns true when `report` should be treated as a failure.
    pub fn fails(&self, report: &ValidationReport) -> bool {
        report.error_count() > 0 || (self.strict && report.warning_count() > 0)
    }
}

/// Validates a dataset and returns every issue found.
pub fn validate_dataset(dataset: &Dataset) -> ValidationReport {
    let mut report = ValidationReport::new();

    let image_ids = validate_images(dataset, &mut report);
    let category_ids = validate_categories(dataset, &mut report);
    validate_annotations(dataset, &image_ids, &category_ids, &mut report);

    report
}

/// Checks only that annotations resolve to an image and a category.
pub fn validate_references(dataset: &Dataset) -> ValidationReport {
    let image_ids: HashSet<ImageId> = dataset.images.iter().map(|i| i.id).collect();
    let category_ids: HashSet<CategoryId> = dataset.categories.iter().map(|c| c.id).collect();

    let mut report = ValidationReport::new();
    for annotation in &dataset.annotations {
        check_references(
            annotation.id,
            annotation.image_id,
            annotation.category_id,
            &image_ids,
            &category_ids,
            &mut report,
        );
    }
    report
}

fn validate_images(dataset: &Dataset, report: &mut ValidationReport) -> HashSet<ImageId> {
    let mut seen: HashMap<ImageId, usize> = HashMap::new();

    for (idx, image) in dataset.images.iter().enumerate() {
        let id = image.id.as_i64();

        if let Some(first_idx) = seen.get(&image.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateImageId,
                format!("Duplicate image ID {} (first seen at index {})", id, first_idx),
                IssueContext::Image { id },
            ));
        } else {
            seen.insert(image.id, idx);
        }

        if image.file_name().is_none() {
            report.add(ValidationIssue::warning(
                IssueCode::MissingFileName,
                "No string file_name",
                IssueContext::Image { id },
            ));
        }
    }

    seen.into_keys().collect()
}

fn validate_categories(dataset: &Dataset, report: &mut ValidationReport) -> HashSet<CategoryId> {
    let mut seen: HashMap<CategoryId, usize> = HashMap::new();
    let mut seen_names: HashMap<&str, CategoryId> = HashMap::new();

    for (idx, category) in dataset.categories.iter().enumerate() {
        let id = category.id.as_i64();

        if let Some(first_idx) = seen.get(&category.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateCategoryId,
                format!(
                    "Duplicate category ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Category { id },
            ));
        } else {
            seen.insert(category.id, idx);
        }

        if category.name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyCategoryName,
                "Empty category name",
                IssueContext::Category { id },
            ));
        } else if let Some(first_id) = seen_names.get(category.name.as_str()) {
            report.add(ValidationIssue::warning(
                IssueCode::DuplicateCategoryName,
                format!(
                    "Duplicate category name '{}' (also used by category {}); merging collapses them",
                    category.name, first_id
                ),
                IssueContext::Category { id },
            ));
        } else {
            seen_names.insert(&category.name, category.id);
        }
    }

    seen.into_keys().collect()
}

fn validate_annotations(
    dataset: &Dataset,
    image_ids: &HashSet<ImageId>,
    category_ids: &HashSet<CategoryId>,
    report: &mut ValidationReport,
) {
    let mut seen: HashMap<AnnotationId, usize> = HashMap::new();

    for (idx, annotation) in dataset.annotations.iter().enumerate() {
        let id = annotation.id.as_i64();

        if let Some(first_idx) = seen.get(&annotation.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateAnnotationId,
                format!(
                    "Duplicate annotation ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Annotation { id },
            ));
        } else {
            seen.insert(annotation.id, idx);
        }

        check_references(
            annotation.id,
            annotation.image_id,
            annotation.category_id,
            image_ids,
            category_ids,
            report,
        );
    }
}

fn check_references(
    annotation_id: AnnotationId,
    image_id: ImageId,
    category_id: CategoryId,
    image_ids: &HashSet<ImageId>,
    category_ids: &HashSet<CategoryId>,
    report: &mut ValidationReport,
) {
    let id = annotation_id.as_i64();

    if !image_ids.contains(&image_id) {
        report.add(ValidationIssue::error(
            IssueCode::MissingImageRef,
            format!("References non-existent image {}", image_id),
            IssueContext::Annotation { id },
        ));
    }

    if !category_ids.contains(&category_id) {
        report.add(ValidationIssue::error(
            IssueCode::MissingCategoryRef,
            format!("References non-existent category {}", category_id),
            IssueContext::Annotation { id },
        ));
    }
}
