use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{JsonMap, TypeError};

/// Opaque identifier of a sample.
///
/// Ids are assigned by the dataset store and are only guaranteed unique
/// within the document that holds them. They serialize as plain strings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SampleId({})", self.0)
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SampleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SampleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A sample as held in a document snapshot. The id is always present.
///
/// An `annotation` key that is present with a `null` value is kept as
/// `Some(Value::Null)` so it survives export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonMap")]
pub struct Sample {
    #[serde(rename = "_id")]
    pub id: SampleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Value>,
    /// Any other fields (`imageUrl`, `document`, `brush`, ...).
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Sample {
    pub fn new(id: impl Into<SampleId>) -> Self {
        Self {
            id: id.into(),
            annotation: None,
            extra: JsonMap::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: Value) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn has_annotation(&self) -> bool {
        has_annotation(self.annotation.as_ref())
    }
}

impl TryFrom<JsonMap> for Sample {
    type Error = TypeError;

    fn try_from(mut fields: JsonMap) -> Result<Self, Self::Error> {
        let id = match fields.remove("_id") {
            Some(value) => string_id("_id", value)?,
            None => return Err(TypeError::Serialization("sample is missing `_id`".into())),
        };
        Ok(Self {
            id,
            annotation: fields.remove("annotation"),
            extra: fields,
        })
    }
}

/// A sample supplied by a caller, before the store has assigned its id.
///
/// `_id` is the identifier. A plain `id` is read as the identifier only when
/// `_id` is absent; otherwise it stays an ordinary field. Whether a supplied
/// id is kept depends on the operation: imports try to preserve it, appends
/// discard it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonMap")]
pub struct SampleDraft {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<SampleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Value>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl SampleDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<SampleId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_annotation(mut self, annotation: Value) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The caller-supplied id, if it is present and non-empty.
    pub fn supplied_id(&self) -> Option<&SampleId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }

    /// Finalize the draft under the given id, dropping any supplied one.
    pub fn into_sample(self, id: SampleId) -> Sample {
        Sample {
            id,
            annotation: self.annotation,
            extra: self.extra,
        }
    }
}

impl TryFrom<JsonMap> for SampleDraft {
    type Error = TypeError;

    fn try_from(mut fields: JsonMap) -> Result<Self, Self::Error> {
        let id = match fields.remove("_id") {
            Some(value) => Some(string_id("_id", value)?),
            None => match fields.get("id") {
                Some(Value::String(_)) => fields.remove("id").map(|value| string_id("id", value)).transpose()?,
                _ => None,
            },
        };
        Ok(Self {
            id,
            annotation: fields.remove("annotation"),
            extra: fields,
        })
    }
}

impl From<Sample> for SampleDraft {
    fn from(sample: Sample) -> Self {
        Self {
            id: Some(sample.id),
            annotation: sample.annotation,
            extra: sample.extra,
        }
    }
}

fn string_id(key: &str, value: Value) -> Result<SampleId, TypeError> {
    match value {
        Value::String(id) => Ok(SampleId(id)),
        other => Err(TypeError::Serialization(format!(
            "sample `{key}` must be a string, got {other}"
        ))),
    }
}

/// An annotation counts when it is present and not empty.
///
/// `null`, `{}`, `[]` and `""` are empty. Bare numbers and booleans are not
/// collections and never count as an annotation.
pub fn has_annotation(annotation: Option<&Value>) -> bool {
    match annotation {
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        None | Some(Value::Null) | Some(Value::Bool(_)) | Some(Value::Number(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sample_serializes_id_as_underscore_id() {
        let sample = Sample::new("s1")
            .with_annotation(json!("cat"))
            .with_field("imageUrl", json!("https://example.com/a.png"));
        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(
            value,
            json!({"_id": "s1", "annotation": "cat", "imageUrl": "https://example.com/a.png"})
        );
    }

    #[test]
    fn sample_keeps_unknown_fields() {
        let sample: Sample =
            serde_json::from_value(json!({"_id": "a", "document": "text", "brush": "red"})).unwrap();
        assert_eq!(sample.id.as_str(), "a");
        assert!(sample.annotation.is_none());
        assert_eq!(sample.extra.get("document"), Some(&json!("text")));
        assert_eq!(sample.extra.get("brush"), Some(&json!("red")));
    }

    #[test]
    fn draft_accepts_id_alias() {
        let draft: SampleDraft = serde_json::from_value(json!({"id": "x1", "imageUrl": "u"})).unwrap();
        assert_eq!(draft.supplied_id(), Some(&SampleId::from("x1")));
        assert_eq!(draft.extra.get("imageUrl"), Some(&json!("u")));
    }

    #[test]
    fn draft_without_id() {
        let draft: SampleDraft = serde_json::from_value(json!({"imageUrl": "u"})).unwrap();
        assert!(draft.id.is_none());
        assert!(draft.supplied_id().is_none());
    }

    #[test]
    fn empty_supplied_id_is_ignored() {
        let draft = SampleDraft::new().with_id("");
        assert!(draft.supplied_id().is_none());
    }

    #[test]
    fn into_sample_overrides_supplied_id() {
        let draft = SampleDraft::new()
            .with_id("caller")
            .with_annotation(json!({"label": "dog"}));
        let sample = draft.into_sample(SampleId::from("store"));
        assert_eq!(sample.id.as_str(), "store");
        assert_eq!(sample.annotation, Some(json!({"label": "dog"})));
    }

    #[test]
    fn annotation_emptiness_rules() {
        assert!(!has_annotation(None));
        assert!(!has_annotation(Some(&json!(null))));
        assert!(!has_annotation(Some(&json!({}))));
        assert!(!has_annotation(Some(&json!([]))));
        assert!(!has_annotation(Some(&json!(""))));
        assert!(has_annotation(Some(&json!({"label": "cat"}))));
        assert!(has_annotation(Some(&json!(["a"]))));
        assert!(has_annotation(Some(&json!("cat"))));
        assert!(!has_annotation(Some(&json!(0))));
        assert!(!has_annotation(Some(&json!(5))));
        assert!(!has_annotation(Some(&json!(true))));
        assert!(!has_annotation(Some(&json!(false))));
    }

    #[test]
    fn sample_id_display_and_debug() {
        let id = SampleId::from("sabc");
        assert_eq!(id.to_string(), "sabc");
        assert_eq!(format!("{id:?}"), "SampleId(sabc)");
    }

    #[test]
    fn null_annotation_survives_round_trip() {
        let input = json!({"_id": "a", "imageUrl": "a.png", "annotation": null});
        let sample: Sample = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(sample.annotation, Some(Value::Null));
        assert!(!sample.has_annotation());
        assert_eq!(serde_json::to_value(&sample).unwrap(), input);

        let draft: SampleDraft = serde_json::from_value(json!({"annotation": null})).unwrap();
        assert_eq!(draft.annotation, Some(Value::Null));
        assert_eq!(serde_json::to_value(&draft).unwrap(), json!({"annotation": null}));
    }

    #[test]
    fn absent_annotation_stays_absent() {
        let sample: Sample = serde_json::from_value(json!({"_id": "a"})).unwrap();
        assert!(sample.annotation.is_none());
        assert_eq!(serde_json::to_value(&sample).unwrap(), json!({"_id": "a"}));
    }

    #[test]
    fn underscore_id_wins_over_plain_id() {
        let draft: SampleDraft =
            serde_json::from_value(json!({"_id": "a", "id": "ext-1", "imageUrl": "u"})).unwrap();
        assert_eq!(draft.supplied_id(), Some(&SampleId::from("a")));
        assert_eq!(draft.extra.get("id"), Some(&json!("ext-1")));

        let sample = draft.into_sample(SampleId::from("a"));
        assert_eq!(
            serde_json::to_value(&sample).unwrap(),
            json!({"_id": "a", "id": "ext-1", "imageUrl": "u"})
        );
    }

    #[test]
    fn sample_keeps_plain_id_field() {
        let sample: Sample = serde_json::from_value(json!({"_id": "a", "id": 7})).unwrap();
        assert_eq!(sample.id.as_str(), "a");
        assert_eq!(sample.extra.get("id"), Some(&json!(7)));
    }

    #[test]
    fn non_string_plain_id_is_an_ordinary_field() {
        let draft: SampleDraft = serde_json::from_value(json!({"id": 42})).unwrap();
        assert!(draft.id.is_none());
        assert_eq!(draft.extra.get("id"), Some(&json!(42)));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(serde_json::from_value::<SampleDraft>(json!({"_id": 3})).is_err());
        assert!(serde_json::from_value::<Sample>(json!({"imageUrl": "u"})).is_err());
        assert!(serde_json::from_value::<Sample>(json!("not an object")).is_err());
    }
}
