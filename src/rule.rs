//! Declarative image-selection rules.
//!
//! A rule is read from a small JSON config:
//!
//! ```json
//! {
//!   "filter": {"file_name": ["night_", "dusk_"], "weather": ["rain"]},
//!   "match_all": true
//! }
//! ```
//!
//! An image matches a key when it has that property and the text of one of
//! the listed values occurs inside the text of the property. With
//! `match_all` every key must match, otherwise any key is enough.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::dataset::Image;
use crate::error::CocoKitError;

/// A property-match rule over image fields.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PropertyRule {
    /// Property name to candidate values.
    #[serde(rename = "filter", alias = "criteria")]
    pub criteria: BTreeMap<String, Vec<Value>>,

    #[serde(default)]
    pub match_all: bool,
}

impl PropertyRule {
    /// Reads a rule from a JSON config file.
    pub fn from_path(path: &Path) -> Result<Self, CocoKitError> {
        let file = File::open(path).map_err(CocoKitError::Io)?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| CocoKitError::RuleParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns true if `image` satisfies the rule.
    ///
    /// An empty rule matches every image under `match_all` and none
    /// otherwise.
    pub fn matches(&self, image: &Image) -> bool {
        let mut keys = self.criteria.iter().map(|(key, values)| {
            image
                .property(key)
                .map(|prop| {
                    let haystack = value_text(&prop);
                    values
                        .iter()
                        .any(|needle| haystack.contains(value_text(needle).as_str()))
                })
                .unwrap_or(false)
        });

        if self.match_all {
            keys.all(|hit| hit)
        } else {
            keys.any(|hit| hit)
        }
    }
}

/// Text form used for substring matching: strings as-is, anything else as
/// compact JSON. Booleans are therefore `true`/`false` and null is `null`.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
