use serde::{Deserialize, Serialize};

use crate::sample::{Sample, SampleId};

/// Annotation status of every sample in a document, in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub samples: Vec<SampleSummary>,
}

impl Summary {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples that carry a non-empty annotation.
    pub fn annotated(&self) -> usize {
        self.samples.iter().filter(|s| s.has_annotation).count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSummary {
    #[serde(rename = "_id")]
    pub id: SampleId,
    pub has_annotation: bool,
}

impl SampleSummary {
    pub fn of(sample: &Sample) -> Self {
        Self {
            id: sample.id.clone(),
            has_annotation: sample.has_annotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let summary = Summary {
            samples: vec![SampleSummary::of(&Sample::new("s1").with_annotation(json!("x")))],
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({"samples": [{"_id": "s1", "hasAnnotation": true}]})
        );
    }

    #[test]
    fn counts() {
        let summary = Summary {
            samples: vec![
                SampleSummary::of(&Sample::new("a")),
                SampleSummary::of(&Sample::new("b").with_annotation(json!({"k": 1}))),
                SampleSummary::of(&Sample::new("c").with_annotation(json!({}))),
            ],
        };
        assert_eq!(summary.len(), 3);
        assert_eq!(summary.annotated(), 1);
        assert!(Summary::default().is_empty());
    }
}
