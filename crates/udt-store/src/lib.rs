//! Dataset managers for Universal Data Tool documents.
//!
//! A dataset manager owns exactly one document snapshot, hands out reads,
//! applies mutations by replacing the snapshot, and tells subscribers what
//! changed. The interface is async so that backends doing real I/O can sit
//! behind the same contract as the in-memory one.
//!
//! # Backends
//!
//! All backends implement the [`DatasetManager`] trait:
//!
//! - [`InMemoryDatasetManager`] -- a single `Arc<Document>` swapped on write
//!
//! # Design Rules
//!
//! 1. Snapshots are never edited in place. A mutation builds a new document
//!    and swaps the stored reference.
//! 2. Notify after swap: listeners always observe the new snapshot.
//! 3. Sample ids are assigned by the store and are unique within a document.
//! 4. Lookups of missing samples or keys return `None`; writes to a missing
//!    sample fail with [`StoreError::NotFound`].

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod memory;
pub mod traits;

pub use config::{AppConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use events::{DatasetEvent, DatasetEvents, EventFilter, EventKind, EventStream, SubscriptionId};
pub use ids::{IdAllocator, IdSource, RandomIdSource};
pub use memory::InMemoryDatasetManager;
pub use traits::DatasetManager;
