//! Sample id generation.
//!
//! An [`IdSource`] proposes candidate ids; an [`IdAllocator`] checks them
//! against the ids already taken in the document and retries on collision.
//! Uniqueness is only guaranteed within one document.

use std::collections::HashSet;

use rand::Rng;
use udt_types::SampleId;

use crate::error::{StoreError, StoreResult};

/// Upper bound on candidates drawn for a single id.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 64;

/// Produces candidate sample ids. Candidates need not be unique.
pub trait IdSource: Send + Sync {
    fn candidate(&self) -> String;
}

/// Random ids of the form `prefix` + `length` lowercase base-36 characters.
#[derive(Clone, Debug)]
pub struct RandomIdSource {
    prefix: String,
    length: usize,
}

impl RandomIdSource {
    pub fn new(prefix: impl Into<String>, length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            length,
        }
    }
}

impl Default for RandomIdSource {
    fn default() -> Self {
        Self::new("s", 8)
    }
}

impl IdSource for RandomIdSource {
    fn candidate(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut id = String::with_capacity(self.prefix.len() + self.length);
        id.push_str(&self.prefix);
        for _ in 0..self.length {
            let digit = rng.gen_range(0..36u32);
            id.extend(char::from_digit(digit, 36));
        }
        id
    }
}

/// Hands out ids that are not yet taken, tracking every id it has seen.
pub struct IdAllocator<'a> {
    source: &'a dyn IdSource,
    taken: HashSet<SampleId>,
}

impl<'a> IdAllocator<'a> {
    /// Start with `taken` already reserved.
    pub fn new<I>(source: &'a dyn IdSource, taken: I) -> Self
    where
        I: IntoIterator<Item = SampleId>,
    {
        Self {
            source,
            taken: taken.into_iter().collect(),
        }
    }

    pub fn is_taken(&self, id: &SampleId) -> bool {
        self.taken.contains(id)
    }

    /// Generate a fresh id and reserve it.
    pub fn allocate(&mut self) -> StoreResult<SampleId> {
        for _ in 0..MAX_ALLOCATION_ATTEMPTS {
            let id = SampleId::new(self.source.candidate());
            if !id.is_empty() && !self.taken.contains(&id) {
                self.taken.insert(id.clone());
                return Ok(id);
            }
        }
        Err(StoreError::IdExhausted {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }

    /// Keep `supplied` if it is non-empty and free, otherwise allocate.
    pub fn claim_or_allocate(&mut self, supplied: Option<&SampleId>) -> StoreResult<SampleId> {
        match supplied {
            Some(id) if !id.is_empty() && !self.taken.contains(id) => {
                self.taken.insert(id.clone());
                Ok(id.clone())
            }
            _ => self.allocate(),
        }
    }
}
