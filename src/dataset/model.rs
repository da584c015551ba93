//! Core dataset model.
//!
//! Only the fields the tools actually reason about are typed: entity ids,
//! the annotation references, and category names. Everything else is kept
//! as an insertion-ordered JSON map and written back exactly as read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use super::ids::{AnnotationId, CategoryId, ImageId};

/// A COCO dataset.
///
/// Serialization emits `info`, `licenses`, `images`, `annotations`,
/// `categories` in that order, followed by any unrecognised top-level keys.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dataset {
    /// Free-form metadata block.
    pub info: Value,

    /// License records, opaque.
    pub licenses: Vec<Value>,

    pub images: Vec<Image>,

    pub annotations: Vec<Annotation>,

    pub categories: Vec<Category>,

    /// Top-level keys other than the five sections above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            info: Value::Object(Map::new()),
            licenses: Vec::new(),
            images: Vec::new(),
            annotations: Vec::new(),
            categories: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Dataset {
    /// Returns a copy of this dataset's metadata with all three entity lists
    /// empty.
    pub fn skeleton(&self) -> Self {
        Self {
            info: self.info.clone(),
            licenses: self.licenses.clone(),
            extra: self.extra.clone(),
            ..Default::default()
        }
    }
}

/// An image entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,

    /// Every other field (`file_name`, `width`, `height`, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Image {
    /// Creates an image with a `file_name` field.
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("file_name".to_string(), Value::String(file_name.into()));
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Sets an additional field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The `file_name` field, if present and a string.
    pub fn file_name(&self) -> Option<&str> {
        self.fields.get("file_name").and_then(Value::as_str)
    }

    /// Looks up a property by key, including `id`.
    pub fn property(&self, key: &str) -> Option<Cow<'_, Value>> {
        if key == "id" {
            return Some(Cow::Owned(Value::from(self.id.as_i64())));
        }
        self.fields.get(key).map(Cow::Borrowed)
    }
}

/// A category (class label).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    /// Category identity when merging datasets.
    pub name: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Sets an additional field (e.g. `supercategory`).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// An annotation, attached to one image and one category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,

    pub image_id: ImageId,

    pub category_id: CategoryId,

    /// `bbox`, `area`, `segmentation`, `iscrowd` and anything else.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Annotation {
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            fields: Map::new(),
        }
    }

    /// Sets an additional field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}
