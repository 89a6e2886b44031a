//! Kind Mapper
//!
//! Bidirectional registry between symbolic graph kinds (node and relationship labels) and the
//! small integer ids the storage tables encode them as.
//!
//! Kinds are registered once per physical schema and are read-mostly afterwards. Strict
//! resolution ([`KindMapper::map_kinds`]) is a pure read and may run on many threads at once;
//! assertive resolution ([`KindMapper::assert_kinds`]) allocates missing ids under an exclusive
//! lock so two callers never mint different ids for the same new kind.

pub mod errors;

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

pub use errors::KindError;

/// Storage identifier for a kind.
pub type KindId = i16;

/// A symbolic node or relationship label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Kind(String);

impl Kind {
    pub fn new(name: impl Into<String>) -> Self {
        Kind(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Kind::new(name)
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        Kind(name)
    }
}

/// Render kinds as a comma separated list for diagnostics.
pub fn kind_names(kinds: &[Kind]) -> Vec<String> {
    kinds.iter().map(|kind| kind.to_string()).collect()
}

/// Resolution of kinds to storage ids.
#[cfg_attr(test, mockall::automock)]
pub trait KindMapper: Send + Sync {
    /// Partition `kinds` into resolved ids and unresolved kinds. Never allocates.
    fn map_kinds(&self, kinds: &[Kind]) -> (Vec<KindId>, Vec<Kind>);

    /// Resolve `kinds`, allocating and registering an id for every kind not yet mapped.
    fn assert_kinds(&self, kinds: &[Kind]) -> Result<Vec<KindId>, KindError>;
}

#[derive(Debug, Default)]
struct KindTable {
    ids_by_kind: HashMap<Kind, KindId>,
    kinds_by_id: HashMap<KindId, Kind>,
    next_id: KindId,
}

impl KindTable {
    fn map(&self, kinds: &[Kind]) -> (Vec<KindId>, Vec<Kind>) {
        let mut ids = Vec::with_capacity(kinds.len());
        let mut missing = Vec::new();

        for kind in kinds {
            match self.ids_by_kind.get(kind) {
                Some(id) => ids.push(*id),
                None => missing.push(kind.clone()),
            }
        }

        (ids, missing)
    }

    fn insert(&mut self, kind: Kind, id: KindId) -> Result<(), KindError> {
        if let Some(existing) = self.ids_by_kind.get(&kind) {
            if *existing == id {
                return Ok(());
            }

            return Err(KindError::KindRemapped {
                kind,
                existing: *existing,
                requested: id,
            });
        }

        if let Some(existing) = self.kinds_by_id.get(&id) {
            return Err(KindError::IdReassigned {
                id,
                existing: existing.clone(),
                requested: kind,
            });
        }

        self.ids_by_kind.insert(kind.clone(), id);
        self.kinds_by_id.insert(id, kind);

        // Ids are never reused, so the counter always moves past the largest id handed out
        if id >= self.next_id {
            self.next_id = id.saturating_add(1);
        }

        Ok(())
    }

    fn allocate(&mut self, kind: Kind) -> Result<KindId, KindError> {
        if let Some(id) = self.ids_by_kind.get(&kind) {
            return Ok(*id);
        }

        let mut candidate = self.next_id;

        while self.kinds_by_id.contains_key(&candidate) {
            candidate = candidate
                .checked_add(1)
                .ok_or_else(|| KindError::Exhausted(kind.clone()))?;
        }

        if candidate == KindId::MAX && self.kinds_by_id.contains_key(&candidate) {
            return Err(KindError::Exhausted(kind));
        }

        self.insert(kind.clone(), candidate)?;
        log::info!("Allocated kind id {} for kind {}", candidate, kind);

        Ok(candidate)
    }
}

/// In-memory [`KindMapper`] guarded by a read-write lock.
#[derive(Debug, Default)]
pub struct SchemaKindMapper {
    table: RwLock<KindTable>,
}

impl SchemaKindMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapper from already-registered `(kind, id)` pairs.
    pub fn with_kinds<I, K>(kinds: I) -> Result<Self, KindError>
    where
        I: IntoIterator<Item = (K, KindId)>,
        K: Into<Kind>,
    {
        let mapper = Self::new();

        for (kind, id) in kinds {
            mapper.put(kind.into(), id)?;
        }

        Ok(mapper)
    }

    /// Register `kind` under an explicit id.
    pub fn put(&self, kind: Kind, id: KindId) -> Result<(), KindError> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.insert(kind, id)
    }

    /// Register `kind` under the next free id, returning the id it ends up mapped to.
    pub fn put_next(&self, kind: Kind) -> Result<KindId, KindError> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.allocate(kind)
    }

    pub fn kind_of(&self, id: KindId) -> Option<Kind> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.kinds_by_id.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.ids_by_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KindMapper for SchemaKindMapper {
    fn map_kinds(&self, kinds: &[Kind]) -> (Vec<KindId>, Vec<Kind>) {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.map(kinds)
    }

    fn assert_kinds(&self, kinds: &[Kind]) -> Result<Vec<KindId>, KindError> {
        {
            let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
            let (ids, missing) = table.map(kinds);

            if missing.is_empty() {
                return Ok(ids);
            }
        }

        // Another writer may have registered the missing kinds between the two locks, so the
        // check is repeated under the write lock before allocating.
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let mut ids = Vec::with_capacity(kinds.len());

        for kind in kinds {
            ids.push(table.allocate(kind.clone())?);
        }

        Ok(ids)
    }
}
