//! # Commands
//!
//! One module per operation. Each exposes a `run` function taking the shared
//! [`Context`]; the [`api`](crate::api) facade only dispatches to them.
//!
//! Every write follows the same shape:
//!
//! 1. open a transaction
//! 2. validate against the transaction's view of the tables
//! 3. stage rows
//! 4. [`commit`]
//! 5. only then touch the cache and the search index
//!
//! An error in steps 1 to 4 drops the transaction, so nothing is persisted and
//! the cache is never touched.

use crate::cache::AttributeCache;
use crate::cascade::CascadeDeleteCoordinator;
use crate::choice::ChoiceValueStore;
use crate::error::{AttrError, Result};
use crate::model::{Attribute, AttributeView};
use crate::search_index::SearchIndexSync;
use crate::store::{Database, StorageBackend, Tables, Transaction};
use std::sync::Arc;
use tracing::error;

pub mod add;
pub mod delete;
pub mod get;
pub mod search;
pub mod update;

/// Everything a command needs to run.
pub struct Context<B: StorageBackend> {
    pub db: Database<B>,
    pub choices: ChoiceValueStore,
    pub cache: Arc<AttributeCache>,
    pub index_sync: Option<SearchIndexSync>,
    pub cascade: CascadeDeleteCoordinator,
}

impl<B: StorageBackend> Context<B> {
    pub fn new(backend: B) -> Self {
        Self {
            db: Database::new(backend),
            choices: ChoiceValueStore::new(),
            cache: Arc::new(AttributeCache::new()),
            index_sync: None,
            cascade: CascadeDeleteCoordinator::new(),
        }
    }
}

/// Attach the attribute's legal values.
pub(crate) fn enrich(choices: &ChoiceValueStore, tables: &Tables, attribute: Attribute) -> Result<AttributeView> {
    let choice_values = if attribute.is_choice {
        choices.get(tables, attribute.id, attribute.value_type)?
    } else {
        Vec::new()
    };
    Ok(AttributeView {
        attribute,
        choice_values,
    })
}

/// Treat blank optional input as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Commit `tx` for operation `op` on attribute `subject`.
///
/// Unique-constraint violations keep their meaning as duplicate errors. Any
/// other failure is logged with its cause and reported as
/// [`AttrError::WriteFailed`]. That includes losing a race to another writer:
/// the revision conflict is detected before the constraints are checked.
pub(crate) fn commit<B: StorageBackend>(tx: Transaction<'_, B>, op: &str, subject: &str) -> Result<()> {
    match tx.commit() {
        Ok(()) => Ok(()),
        Err(AttrError::UniqueViolation { column: "name", value }) => Err(AttrError::DuplicateName(value)),
        Err(AttrError::UniqueViolation { column: "alias", value }) => Err(AttrError::DuplicateAlias(value)),
        Err(e) => {
            error!(op, attribute = subject, error = %e, "{} attribute error", op);
            Err(AttrError::WriteFailed(format!("{} attribute {} failed", op, subject)))
        }
    }
}
