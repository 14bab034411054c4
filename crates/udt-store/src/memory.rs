//! In-memory dataset store.
//!
//! [`InMemoryDatasetManager`] keeps the current document behind an
//! `RwLock<Arc<Document>>`. Readers clone the `Arc`; writers build a new
//! document from the current one and swap the `Arc` while holding the
//! write lock, then emit events after the lock is released.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use udt_types::{Document, DocumentDraft, Sample, SampleDraft, SampleId, Summary};

use crate::config::{AppConfig, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::events::{DatasetEvent, DatasetEvents};
use crate::ids::{IdAllocator, IdSource, RandomIdSource};
use crate::traits::DatasetManager;

/// A dataset held entirely in memory. Data is lost when the store is dropped.
pub struct InMemoryDatasetManager {
    snapshot: RwLock<Arc<Document>>,
    events: DatasetEvents,
    ids: Box<dyn IdSource>,
    app_config: RwLock<AppConfig>,
    config: StoreConfig,
}

impl InMemoryDatasetManager {
    /// Create a store holding an empty `"New Dataset"` document.
    pub fn new() -> Self {
        let config = StoreConfig::default();
        let ids = RandomIdSource::new(config.id_prefix.clone(), config.id_length);
        Self::build(config, Box::new(ids))
    }

    /// Create a store from a validated configuration.
    pub fn with_config(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let ids = RandomIdSource::new(config.id_prefix.clone(), config.id_length);
        Ok(Self::build(config, Box::new(ids)))
    }

    /// Create a store that draws sample ids from `ids`.
    pub fn with_id_source(config: StoreConfig, ids: Box<dyn IdSource>) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self::build(config, ids))
    }

    /// Create a store whose first snapshot is `document`.
    ///
    /// Every sample id must be non-empty and unique. Nothing is emitted.
    pub fn with_document(config: StoreConfig, document: Document) -> StoreResult<Self> {
        let mut seen = HashSet::new();
        for sample in &document.samples {
            if sample.id.is_empty() {
                return Err(StoreError::InvalidSample {
                    id: sample.id.clone(),
                    reason: "sample id is empty".into(),
                });
            }
            if !seen.insert(&sample.id) {
                return Err(StoreError::InvalidSample {
                    id: sample.id.clone(),
                    reason: "sample id appears more than once".into(),
                });
            }
        }
        let store = Self::with_config(config)?;
        *store.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(document);
        Ok(store)
    }

    fn build(config: StoreConfig, ids: Box<dyn IdSource>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Document::named(config.default_name.clone()))),
            events: DatasetEvents::new(config.channel_capacity),
            ids,
            app_config: RwLock::new(AppConfig::default()),
            config,
        }
    }

    /// The current snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<Document> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// The most recent configuration passed to `on_update_app_config`.
    pub fn app_config(&self) -> AppConfig {
        self.app_config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Build the next document from the current one and install it.
    ///
    /// Returns the previous and the installed snapshot. Nothing is
    /// installed if `update` fails.
    fn replace<F>(&self, update: F) -> StoreResult<(Arc<Document>, Arc<Document>)>
    where
        F: FnOnce(&Document) -> StoreResult<Document>,
    {
        if !self.config.writable {
            return Err(StoreError::NotWritable);
        }
        let mut slot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(update(&**slot)?);
        let prev = std::mem::replace(&mut *slot, Arc::clone(&next));
        Ok((prev, next))
    }
}

impl Default for InMemoryDatasetManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatasetManager for InMemoryDatasetManager {
    fn kind(&self) -> &'static str {
        "in-memory"
    }

    fn events(&self) -> &DatasetEvents {
        &self.events
    }

    async fn is_ready(&self) -> StoreResult<bool> {
        Ok(true)
    }

    async fn is_writable(&self) -> StoreResult<bool> {
        Ok(self.config.writable)
    }

    async fn on_update_app_config(&self, config: AppConfig) -> StoreResult<()> {
        debug!(keys = config.as_map().len(), "app config updated");
        *self.app_config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    async fn summary(&self) -> StoreResult<Summary> {
        Ok(self.snapshot().summary())
    }

    async fn property(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.snapshot().property(key))
    }

    async fn set_property(&self, key: &str, value: Value) -> StoreResult<()> {
        self.replace(|doc| Ok(doc.with_property(key, &value)?))?;
        debug!(key, "dataset property set");
        self.events.emit(&DatasetEvent::property(key));
        Ok(())
    }

    async fn sample_by_index(&self, index: usize) -> StoreResult<Option<Sample>> {
        Ok(self.snapshot().sample_at(index).cloned())
    }

    async fn sample(&self, id: &SampleId) -> StoreResult<Option<Sample>> {
        Ok(self.snapshot().sample(id).cloned())
    }

    async fn set_sample(&self, id: &SampleId, sample: Sample) -> StoreResult<()> {
        self.replace(|doc| {
            let pos = doc
                .position_of(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            if sample.id.is_empty() {
                return Err(StoreError::InvalidSample {
                    id: id.clone(),
                    reason: "replacement has an empty id".into(),
                });
            }
            let clash = doc
                .samples
                .iter()
                .enumerate()
                .any(|(i, s)| i != pos && s.id == sample.id);
            if clash {
                return Err(StoreError::InvalidSample {
                    id: id.clone(),
                    reason: format!("id {} belongs to another sample", sample.id),
                });
            }
            let mut next = doc.clone();
            next.samples[pos] = sample;
            Ok(next)
        })?;
        debug!(%id, "sample replaced");
        self.events.emit(&DatasetEvent::SummaryChanged);
        Ok(())
    }

    async fn add_samples(&self, samples: Vec<SampleDraft>) -> StoreResult<Vec<SampleId>> {
        let mut assigned = Vec::with_capacity(samples.len());
        self.replace(|doc| {
            let mut alloc = IdAllocator::new(self.ids.as_ref(), doc.sample_ids().cloned());
            let mut next = doc.clone();
            next.samples.reserve(samples.len());
            for draft in samples {
                let id = alloc.allocate()?;
                assigned.push(id.clone());
                next.samples.push(draft.into_sample(id));
            }
            Ok(next)
        })?;
        debug!(added = assigned.len(), "samples added");
        self.events.emit(&DatasetEvent::SummaryChanged);
        Ok(assigned)
    }

    async fn remove_samples(&self, ids: &[SampleId]) -> StoreResult<()> {
        let doomed: HashSet<&SampleId> = ids.iter().collect();
        let (prev, next) = self.replace(|doc| {
            let mut next = doc.clone();
            next.samples.retain(|s| !doomed.contains(&s.id));
            Ok(next)
        })?;
        debug!(
            requested = ids.len(),
            removed = prev.len() - next.len(),
            "samples removed"
        );
        self.events.emit(&DatasetEvent::SummaryChanged);
        Ok(())
    }

    async fn dataset(&self) -> StoreResult<Document> {
        Ok(Document::clone(&self.snapshot()))
    }

    async fn set_dataset(&self, draft: DocumentDraft) -> StoreResult<()> {
        let DocumentDraft {
            name,
            interface,
            samples,
            extra,
        } = draft;

        let mut alloc = IdAllocator::new(self.ids.as_ref(), std::iter::empty());
        let samples = samples
            .unwrap_or_default()
            .into_iter()
            .map(|draft| {
                let id = alloc.claim_or_allocate(draft.supplied_id())?;
                Ok(draft.into_sample(id))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let imported = Document {
            name: name.unwrap_or_else(|| self.config.default_name.clone()),
            interface: interface.unwrap_or_default(),
            samples,
            extra,
        };
        let (prev, next) = self.replace(move |_| Ok(imported))?;
        info!(name = %next.name, samples = next.len(), "dataset imported");

        self.events.emit(&DatasetEvent::Reloaded);
        if prev.samples != next.samples {
            self.events.emit(&DatasetEvent::SummaryChanged);
        }
        if prev.name != next.name {
            self.events.emit(&DatasetEvent::property("name"));
        }
        if prev.interface != next.interface {
            self.events.emit(&DatasetEvent::property("interface"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryDatasetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("InMemoryDatasetManager")
            .field("name", &snapshot.name)
            .field("sample_count", &snapshot.len())
            .field("writable", &self.config.writable)
            .finish()
    }
}
