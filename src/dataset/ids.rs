//! Newtype ids for images, annotations and categories.
//!
//! Merging rewrites all three id spaces at once; keeping them as distinct
//! types stops an image id from being looked up in the category map.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Creates a new id from its raw value.
            #[inline]
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the underlying i64 value.
            #[inline]
            pub fn as_i64(&self) -> i64 {
                self.0
            }

            /// Returns the id that follows this one.
            #[inline]
            pub fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of an image within one dataset.
    ImageId
);

define_id!(
    /// Identifier of an annotation within one dataset.
    AnnotationId
);

define_id!(
    /// Identifier of a category within one dataset.
    CategoryId
);
