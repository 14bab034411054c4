//! The [`DatasetManager`] trait defining the dataset access interface.
//!
//! Any backend (in-memory, filesystem, remote service) implements this trait
//! so that the annotation UI can read and edit a dataset without knowing
//! where it lives.

use async_trait::async_trait;
use serde_json::Value;
use udt_types::{Document, DocumentDraft, Sample, SampleDraft, SampleId, Summary};

use crate::config::AppConfig;
use crate::error::StoreResult;
use crate::events::{DatasetEvent, DatasetEvents, EventFilter, EventStream, SubscriptionId};

/// Storage backend for one dataset document.
///
/// Implementations must satisfy these invariants:
/// - Every sample in the document has a non-empty id, unique within it.
/// - Mutations replace the document as a whole; readers never observe a
///   partially applied change.
/// - Events are emitted after the change is visible to readers.
/// - Writes to an unknown sample fail with `NotFound`; reads of unknown
///   samples or keys return `None`.
#[async_trait]
pub trait DatasetManager: Send + Sync {
    /// Short backend identifier, e.g. `"in-memory"`.
    fn kind(&self) -> &'static str;

    /// The event registry for this dataset.
    fn events(&self) -> &DatasetEvents;

    /// Whether the dataset can be read. Remote backends check connectivity
    /// here; callers should poll this and tolerate `false`.
    async fn is_ready(&self) -> StoreResult<bool>;

    /// Whether mutations are currently permitted.
    async fn is_writable(&self) -> StoreResult<bool> {
        Ok(true)
    }

    /// Called by the host whenever application configuration changes.
    async fn on_update_app_config(&self, _config: AppConfig) -> StoreResult<()> {
        Ok(())
    }

    /// Annotation status of every sample, in document order.
    async fn summary(&self) -> StoreResult<Summary>;

    /// Read a top-level property (`name`, `interface`, or any extra key).
    async fn property(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Write a top-level property. Objects deep-merge into the current
    /// value; anything else replaces it. Emits `dataset-property-changed`.
    async fn set_property(&self, key: &str, value: Value) -> StoreResult<()>;

    async fn sample_by_index(&self, index: usize) -> StoreResult<Option<Sample>>;

    async fn sample(&self, id: &SampleId) -> StoreResult<Option<Sample>>;

    /// Replace the sample with id `id`. Emits `summary-changed`.
    async fn set_sample(&self, id: &SampleId, sample: Sample) -> StoreResult<()>;

    /// Append samples with freshly assigned ids. Caller-supplied ids are
    /// discarded. Emits `summary-changed`.
    async fn add_samples(&self, samples: Vec<SampleDraft>) -> StoreResult<Vec<SampleId>>;

    /// Remove every sample whose id is listed. Unknown ids are ignored.
    /// Emits `summary-changed`.
    async fn remove_samples(&self, ids: &[SampleId]) -> StoreResult<()>;

    /// The whole current document.
    async fn dataset(&self) -> StoreResult<Document>;

    /// Replace the whole document with an import. Supplied sample ids are
    /// kept where they are present and not duplicated.
    async fn set_dataset(&self, draft: DocumentDraft) -> StoreResult<()>;

    /// Register a synchronous listener.
    fn on<F>(&self, filter: EventFilter, listener: F) -> SubscriptionId
    where
        F: Fn(&DatasetEvent) + Send + Sync + 'static,
        Self: Sized,
    {
        self.events().on(filter, listener)
    }

    /// Register a channel subscriber.
    fn subscribe(&self, filter: EventFilter) -> EventStream {
        self.events().subscribe(filter)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events().unsubscribe(id)
    }
}
