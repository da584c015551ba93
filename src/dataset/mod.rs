//! COCO dataset model and file I/O.
//!
//! A dataset is a JSON document with `info`, `licenses`, `images`,
//! `annotations` and `categories` sections. Annotations reference images and
//! categories by integer id.
//!
//! # Example
//!
//! ```
//! use cocokit::dataset::{Annotation, Category, Dataset, Image};
//!
//! let dataset = Dataset {
//!     images: vec![Image::new(1i64, "image.jpg").with_field("width", 640)],
//!     categories: vec![Category::new(1i64, "person")],
//!     annotations: vec![
//!         Annotation::new(1i64, 1i64, 1i64).with_field("bbox", vec![10.0, 20.0, 90.0, 180.0]),
//!     ],
//!     ..Default::default()
//! };
//! assert_eq!(dataset.annotations[0].fields["bbox"][2], 90.0);
//! ```

mod ids;
pub mod io_coco_json;
mod model;

pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{Annotation, Category, Dataset, Image};
