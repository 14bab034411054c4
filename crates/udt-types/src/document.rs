use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::merge::{deep_merge, is_structured};
use crate::sample::{Sample, SampleDraft, SampleId};
use crate::summary::{SampleSummary, Summary};
use crate::JsonMap;

/// Name given to a dataset that has never been named.
pub const DEFAULT_DATASET_NAME: &str = "New Dataset";

fn default_name() -> String {
    DEFAULT_DATASET_NAME.to_string()
}

/// A complete dataset snapshot.
///
/// Snapshots are treated as values: operations that change a document
/// return a new one and leave `self` untouched. `extra` holds every
/// top-level key other than the three known ones (e.g. `training`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub interface: JsonMap,
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Default for Document {
    fn default() -> Self {
        Self::named(DEFAULT_DATASET_NAME)
    }
}

impl Document {
    /// An empty document with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interface: JsonMap::new(),
            samples: Vec::new(),
            extra: JsonMap::new(),
        }
    }

    /// Read a top-level property as JSON. Unknown keys yield `None`.
    pub fn property(&self, key: &str) -> Option<Value> {
        match key {
            "name" => Some(Value::String(self.name.clone())),
            "interface" => Some(Value::Object(self.interface.clone())),
            "samples" => serde_json::to_value(&self.samples).ok(),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Return a copy of this document with `key` updated.
    ///
    /// Structured values are deep-merged into the current value; scalars
    /// replace it. `samples` cannot be set this way, `name` must end up a
    /// string and `interface` an object.
    pub fn with_property(&self, key: &str, value: &Value) -> Result<Self, TypeError> {
        let current = self.property(key);
        let next = if is_structured(value) {
            deep_merge(current.as_ref(), value)
        } else {
            value.clone()
        };

        let mut doc = self.clone();
        match key {
            "samples" => return Err(TypeError::ReservedProperty(key.to_string())),
            "name" => match next {
                Value::String(name) => doc.name = name,
                other => return Err(invalid(key, "expected a string", &other)),
            },
            "interface" => match next {
                Value::Object(interface) => doc.interface = interface,
                other => return Err(invalid(key, "expected an object", &other)),
            },
            other => {
                doc.extra.insert(other.to_string(), next);
            }
        }
        Ok(doc)
    }

    pub fn sample_at(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn sample(&self, id: &SampleId) -> Option<&Sample> {
        self.samples.iter().find(|s| &s.id == id)
    }

    pub fn position_of(&self, id: &SampleId) -> Option<usize> {
        self.samples.iter().position(|s| &s.id == id)
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = &SampleId> {
        self.samples.iter().map(|s| &s.id)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Annotation status of every sample, in document order.
    pub fn summary(&self) -> Summary {
        Summary {
            samples: self.samples.iter().map(SampleSummary::of).collect(),
        }
    }
}

fn invalid(key: &str, reason: &str, got: &Value) -> TypeError {
    TypeError::InvalidProperty {
        key: key.to_string(),
        reason: format!("{reason}, got {got}"),
    }
}

/// An incoming document, as handed to an import.
///
/// Every known field is optional; samples may lack ids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<SampleDraft>>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl DocumentDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_interface(mut self, interface: JsonMap) -> Self {
        self.interface = Some(interface);
        self
    }

    pub fn with_samples(mut self, samples: Vec<SampleDraft>) -> Self {
        self.samples = Some(samples);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Parse a draft from JSON text.
    pub fn from_json(text: &str) -> Result<Self, TypeError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl From<Document> for DocumentDraft {
    fn from(doc: Document) -> Self {
        Self {
            name: Some(doc.name),
            interface: Some(doc.interface),
            samples: Some(doc.samples.into_iter().map(SampleDraft::from).collect()),
            extra: doc.extra,
        }
    }
}
