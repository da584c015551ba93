//! COCO JSON reader and writer.
//!
//! # Reading
//!
//! Input is parsed into a permissive on-disk shape first, so that a missing
//! `images`, `annotations` or `categories` section is reported as a schema
//! error naming the file and the section rather than as a generic serde
//! message. `info` and `licenses` are optional.
//!
//! # Writing
//!
//! Output is pretty-printed with two-space indentation and written through a
//! temporary file in the destination directory, which is only persisted over
//! the target once serialization has finished. A failed write never leaves a
//! truncated dataset behind.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use super::model::{Annotation, Category, Dataset, Image};
use crate::error::CocoKitError;

/// Label used in errors for datasets that were not read from a file.
const INLINE_LABEL: &str = "<inline>";

/// Top-level document as found on disk.
#[derive(Debug, Deserialize)]
struct CocoFile {
    #[serde(default)]
    info: Option<Value>,

    #[serde(default)]
    licenses: Option<Vec<Value>>,

    images: Option<Vec<Image>>,

    annotations: Option<Vec<Annotation>>,

    categories: Option<Vec<Category>>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl CocoFile {
    fn into_dataset(self, label: &str) -> Result<Dataset, CocoKitError> {
        let missing = |field: &str| CocoKitError::Schema {
            dataset: label.to_string(),
            field: field.to_string(),
        };

        Ok(Dataset {
            info: self.info.unwrap_or_else(|| Value::Object(Map::new())),
            licenses: self.licenses.unwrap_or_default(),
            images: self.images.ok_or_else(|| missing("images"))?,
            annotations: self.annotations.ok_or_else(|| missing("annotations"))?,
            categories: self.categories.ok_or_else(|| missing("categories"))?,
            extra: self.extra,
        })
    }
}

/// Reads a dataset from a COCO JSON file.
///
/// # Errors
/// Returns [`CocoKitError::Io`] if the file cannot be opened,
/// [`CocoKitError::CocoJsonParse`] if it is not a well-typed COCO document,
/// and [`CocoKitError::Schema`] if a required section is missing.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use cocokit::dataset::io_coco_json::read_coco_json;
///
/// let dataset = read_coco_json(Path::new("annotations.json"))?;
/// # Ok::<(), cocokit::CocoKitError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<Dataset, CocoKitError> {
    let file = File::open(path).map_err(CocoKitError::Io)?;
    let reader = BufReader::new(file);

    let coco: CocoFile =
        serde_json::from_reader(reader).map_err(|source| CocoKitError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    coco.into_dataset(&path.display().to_string())
}

/// Writes a dataset to a COCO JSON file, atomically.
///
/// The parent directory of `path` must exist.
pub fn write_coco_json(path: &Path, dataset: &Dataset) -> Result<(), CocoKitError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir).map_err(CocoKitError::Io)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, dataset).map_err(|source| {
            CocoKitError::CocoJsonWrite {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    tmp.persist(path).map_err(|err| CocoKitError::Io(err.error))?;
    tracing::debug!(path = %path.display(), "wrote dataset");
    Ok(())
}

/// Reads a dataset from a COCO JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<Dataset, CocoKitError> {
    let coco: CocoFile =
        serde_json::from_str(json).map_err(|source| CocoKitError::CocoJsonParse {
            path: PathBuf::from(INLINE_LABEL),
            source,
        })?;
    coco.into_dataset(INLINE_LABEL)
}

/// Reads a dataset from a COCO JSON byte slice.
///
/// Used by the fuzz target, which feeds arbitrary bytes.
pub fn from_coco_slice(bytes: &[u8]) -> Result<Dataset, CocoKitError> {
    let coco: CocoFile =
        serde_json::from_slice(bytes).map_err(|source| CocoKitError::CocoJsonParse {
            path: PathBuf::from(INLINE_LABEL),
            source,
        })?;
    coco.into_dataset(INLINE_LABEL)
}

/// Writes a dataset to a pretty-printed COCO JSON string.
pub fn to_coco_string(dataset: &Dataset) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(dataset)
}

/// Resolves where an output file goes.
///
/// A bare file name (no directory component) is placed next to `anchor`,
/// which is normally the first input file. Anything with a directory
/// component is used as given.
pub fn resolve_output_path(output: &Path, anchor: &Path) -> PathBuf {
    let has_dir = output
        .parent()
        .is_some_and(|parent| !parent.as_os_str().is_empty());

    if has_dir {
        return output.to_path_buf();
    }

    match anchor.parent() {
        Some(parent) => parent.join(output),
        None => output.to_path_buf(),
    }
}
