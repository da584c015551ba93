//! Merge report types.

use serde::Serialize;
use std::fmt;

use crate::dataset::Dataset;

/// Entity counts of one dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DatasetCounts {
    pub images: usize,
    pub annotations: usize,
    pub categories: usize,
}

impl DatasetCounts {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            images: dataset.images.len(),
            annotations: dataset.annotations.len(),
            categories: dataset.categories.len(),
        }
    }
}

impl fmt::Display for DatasetCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} images, {} annotations, {} categories",
            self.images, self.annotations, self.categories
        )
    }
}

/// One input of a merge, in fold order.
#[derive(Clone, Debug, Serialize)]
pub struct InputSummary {
    /// File path or caller-supplied label.
    pub label: String,
    pub counts: DatasetCounts,
    /// Categories of this input that matched an already known name.
    pub reused_categories: usize,
}

/// Summary of a completed merge.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MergeReport {
    pub inputs: Vec<InputSummary>,
    pub output: DatasetCounts,
}

impl MergeReport {
    /// Total number of input categories folded into an existing one by name.
    pub fn collapsed_categories(&self) -> usize {
        self.inputs.iter().map(|i| i.reused_categories).sum()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Merged {} dataset(s):", self.inputs.len())?;
        for (idx, input) in self.inputs.iter().enumerate() {
            writeln!(f, "  [{}] {}: {}", idx + 1, input.label, input.counts)?;
        }
        writeln!(f, "  output: {}", self.output)?;

        let collapsed = self.collapsed_categories();
        if collapsed > 0 {
            writeln!(f, "  {} category entries collapsed by name", collapsed)?;
        }
        Ok(())
    }
}
