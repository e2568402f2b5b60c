//! # Storage Layer
//!
//! The storage layer is the relational engine the attribute core runs against.
//! It is deliberately narrow: a [`StorageBackend`] knows how to load the last
//! committed [`Tables`] and how to durably replace them, and [`Database`] turns
//! that into explicit transactions.
//!
//! ## Transactions
//!
//! [`Database::begin`] hands out a [`Transaction`] holding a private working
//! copy of every table. Writes are staged on that copy and become visible only
//! through [`Transaction::commit`]. Any other exit path (an early `?` return,
//! a validation failure, a panic) drops the transaction, which discards the
//! staged rows. There is no partially-applied state to clean up.
//!
//! Commit runs under a mutex and enforces two rules before handing the tables
//! to the backend:
//!
//! 1. **Revision check**: the store must still be at the revision the
//!    transaction started from. Otherwise another writer committed first and
//!    this commit fails with [`AttrError::Conflict`].
//! 2. **Unique constraints**: among non-deleted attributes no two share a
//!    name or an alias ([`AttrError::UniqueViolation`]).
//!
//! Together these close the gap between the name/alias pre-check done by the
//! commands and the insert that follows it. The checks run in that order, so
//! a stale transaction always fails as a conflict.
//!
//! ## Implementations
//!
//! - [`mem_backend::MemBackend`]: in-memory, with write-failure injection
//! - [`fs_backend::FsBackend`]: one JSON document, replaced atomically
//!
//! ## Layout
//!
//! ```text
//! <data_dir>/
//! └── attributes.json     # Tables, including revision and id sequences
//! ```

use crate::choice::ChoiceRow;
use crate::error::{AttrError, Result};
use crate::model::{
    AttrId, Attribute, CiTypeAttribute, CiTypeAttributeGroupItem, PreferenceShowAttribute,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::ops::{Deref, DerefMut};
use tracing::debug;

pub mod fs_backend;
pub mod mem_backend;

/// Abstract interface for raw storage I/O.
///
/// Backends only move whole snapshots. Consistency rules live in
/// [`Database`] so every backend gets them for free.
pub trait StorageBackend: Send + Sync {
    /// Load the last committed state. An empty store yields `Tables::default()`.
    fn load(&self) -> Result<Tables>;

    /// Durably replace the committed state.
    /// MUST be all-or-nothing: a failed call leaves the previous state intact.
    fn store(&self, tables: &Tables) -> Result<()>;
}

/// Every table the attribute core reads or writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub revision: u64,
    sequences: BTreeMap<String, u64>,
    pub attributes: BTreeMap<AttrId, Attribute>,
    pub int_choices: Vec<ChoiceRow<i64>>,
    pub float_choices: Vec<ChoiceRow<f64>>,
    pub text_choices: Vec<ChoiceRow<String>>,
    pub ci_type_attributes: Vec<CiTypeAttribute>,
    pub preference_show_attributes: Vec<PreferenceShowAttribute>,
    pub ci_type_attribute_group_items: Vec<CiTypeAttributeGroupItem>,
}

impl Tables {
    /// Next value of the per-table id sequence. Ids start at 1.
    pub fn next_id(&mut self, table: &str) -> u64 {
        let seq = self.sequences.entry(table.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    /// Non-deleted attributes in id order.
    pub fn active_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values().filter(|a| !a.deleted)
    }

    pub fn attribute(&self, id: AttrId) -> Option<&Attribute> {
        self.attributes.get(&id).filter(|a| !a.deleted)
    }

    pub fn attribute_mut(&mut self, id: AttrId) -> Option<&mut Attribute> {
        self.attributes.get_mut(&id).filter(|a| !a.deleted)
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.active_attributes().find(|a| a.name == name)
    }

    pub fn attribute_by_alias(&self, alias: &str) -> Option<&Attribute> {
        self.active_attributes().find(|a| a.alias == alias)
    }

    /// Insert a new attribute row, assigning its id.
    pub fn insert_attribute(&mut self, mut attr: Attribute) -> AttrId {
        let id = self.next_id("c_attributes");
        attr.id = id;
        self.attributes.insert(id, attr);
        id
    }

    /// Bind an attribute to a CI type.
    pub fn bind_ci_type(&mut self, type_id: u64, attr_id: AttrId) -> u64 {
        let id = self.next_id("c_ci_type_attributes");
        self.ci_type_attributes.push(CiTypeAttribute {
            id,
            type_id,
            attr_id,
            deleted: false,
            deleted_at: None,
        });
        id
    }

    /// Record that user `uid` shows the attribute when listing `type_id`.
    pub fn show_in_preference(&mut self, uid: u64, type_id: u64, attr_id: AttrId, order: u32) -> u64 {
        let id = self.next_id("c_preference_show_attributes");
        self.preference_show_attributes.push(PreferenceShowAttribute {
            id,
            uid,
            type_id,
            attr_id,
            order,
            deleted: false,
            deleted_at: None,
        });
        id
    }

    /// Add the attribute to a CI type attribute group.
    pub fn add_to_group(&mut self, group_id: u64, attr_id: AttrId, order: u32) -> u64 {
        let id = self.next_id("c_ci_type_attribute_group_items");
        self.ci_type_attribute_group_items.push(CiTypeAttributeGroupItem {
            id,
            group_id,
            attr_id,
            order,
            deleted: false,
            deleted_at: None,
        });
        id
    }

    /// Enforce the storage-level unique constraints on names and aliases.
    pub fn check_constraints(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut aliases = HashSet::new();
        for attr in self.active_attributes() {
            if !names.insert(attr.name.as_str()) {
                return Err(AttrError::UniqueViolation {
                    column: "name",
                    value: attr.name.clone(),
                });
            }
            if !aliases.insert(attr.alias.as_str()) {
                return Err(AttrError::UniqueViolation {
                    column: "alias",
                    value: attr.alias.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Transactional front of a [`StorageBackend`].
pub struct Database<B: StorageBackend> {
    backend: B,
    commit_lock: Mutex<()>,
}

impl<B: StorageBackend> Database<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            commit_lock: Mutex::new(()),
        }
    }

    /// Read-only view of the last committed state.
    pub fn snapshot(&self) -> Result<Tables> {
        self.backend.load()
    }

    pub fn begin(&self) -> Result<Transaction<'_, B>> {
        let tables = self.backend.load()?;
        debug!(revision = tables.revision, "transaction started");
        Ok(Transaction {
            db: self,
            base_revision: tables.revision,
            tables,
            finished: false,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// A unit of work against [`Database`].
///
/// Dereferences to the staged [`Tables`]. Dropping it without calling
/// [`commit`](Transaction::commit) rolls back.
pub struct Transaction<'a, B: StorageBackend> {
    db: &'a Database<B>,
    base_revision: u64,
    tables: Tables,
    finished: bool,
}

impl<B: StorageBackend> Transaction<'_, B> {
    /// Publish the staged tables.
    ///
    /// The revision check runs first. When two writers race from the same
    /// revision the loser gets [`AttrError::Conflict`] even if its rows would
    /// also break a unique constraint; [`AttrError::UniqueViolation`] is only
    /// reported for a transaction that was current but staged a duplicate.
    pub fn commit(mut self) -> Result<()> {
        let _guard = self.db.commit_lock.lock();

        let current = self.db.backend.load()?.revision;
        if current != self.base_revision {
            return Err(AttrError::Conflict {
                expected: self.base_revision,
                actual: current,
            });
        }
        self.tables.check_constraints()?;

        self.tables.revision = self.base_revision + 1;
        self.db.backend.store(&self.tables)?;
        self.finished = true;
        debug!(revision = self.tables.revision, "transaction committed");
        Ok(())
    }

    pub fn rollback(mut self) {
        self.finished = true;
        debug!(revision = self.base_revision, "transaction rolled back");
    }
}

impl<B: StorageBackend> Deref for Transaction<'_, B> {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        &self.tables
    }
}

impl<B: StorageBackend> DerefMut for Transaction<'_, B> {
    fn deref_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }
}

impl<B: StorageBackend> Drop for Transaction<'_, B> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                revision = self.base_revision,
                "transaction dropped without commit, rolled back"
            );
        }
    }
}
