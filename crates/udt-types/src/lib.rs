//! Foundation types for Universal Data Tool datasets.
//!
//! A dataset is a single JSON document holding a name, a free-form interface
//! descriptor, an ordered list of samples, and any number of extra top-level
//! keys. Every other `udt` crate depends on `udt-types`.
//!
//! # Key Types
//!
//! - [`Document`] — a complete dataset snapshot with store-assigned sample ids
//! - [`DocumentDraft`] — an incoming document (import input), ids optional
//! - [`Sample`] / [`SampleDraft`] — one record of the sample sequence
//! - [`SampleId`] — opaque sample identifier, unique within a document
//! - [`Summary`] — per-sample annotation status in document order
//! - [`deep_merge`] — the merge rule used by property updates

pub mod document;
pub mod error;
pub mod merge;
pub mod sample;
pub mod summary;

pub use document::{Document, DocumentDraft, DEFAULT_DATASET_NAME};
pub use error::TypeError;
pub use merge::{deep_merge, is_structured};
pub use sample::{has_annotation, Sample, SampleDraft, SampleId};
pub use summary::{SampleSummary, Summary};

/// Free-form JSON object used for interfaces and extra fields.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
