//! # API Facade
//!
//! [`AttributeManager`] is the single entry point to the attribute core. It is
//! a **thin facade** over the command layer:
//!
//! - it **dispatches** each call to `commands/*.rs`
//! - it **owns** the shared [`Context`] (database, choice tables, cache, index sync)
//! - it **returns structured types**, never formatted output
//!
//! Business rules live in the commands, storage rules in [`crate::store`].
//!
//! ## Generic Over StorageBackend
//!
//! - Production: `AttributeManager<FsBackend>`
//! - Testing and embedding: `AttributeManager<MemBackend>`
//!
//! ## Sharing
//!
//! All methods take `&self`, so a manager can be wrapped in an `Arc` and used
//! from several threads. Managers that must observe each other's writes
//! through the cache should be built over the same
//! [`AttributeCache`] with [`AttributeManager::with_cache`].

use crate::cache::AttributeCache;
use crate::commands::{self, Context};
use crate::error::Result;
use crate::model::{AttrId, AttributeUpdate, AttributeView, NewAttribute};
use crate::search_index::SearchIndexSync;
use crate::store::{Database, StorageBackend};
use std::sync::Arc;

pub use crate::commands::search::{AttributeQuery, SearchPage};

pub struct AttributeManager<B: StorageBackend> {
    ctx: Context<B>,
}

impl<B: StorageBackend> AttributeManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            ctx: Context::new(backend),
        }
    }

    /// Use a cache shared with other managers.
    pub fn with_cache(mut self, cache: Arc<AttributeCache>) -> Self {
        self.ctx.cache = cache;
        self
    }

    /// Enable (or, with `None`, disable) search index sync.
    pub fn with_index_sync(mut self, sync: Option<SearchIndexSync>) -> Self {
        self.ctx.index_sync = sync;
        self
    }

    pub fn database(&self) -> &Database<B> {
        &self.ctx.db
    }

    pub fn cache(&self) -> &Arc<AttributeCache> {
        &self.ctx.cache
    }

    pub fn search(&self, query: &AttributeQuery) -> Result<SearchPage> {
        commands::search::run(&self.ctx, query)
    }

    pub fn get_by_id(&self, id: AttrId) -> Result<Option<AttributeView>> {
        commands::get::by_id(&self.ctx, id)
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<AttributeView>> {
        commands::get::by_name(&self.ctx, name)
    }

    pub fn get_by_alias(&self, alias: &str) -> Result<Option<AttributeView>> {
        commands::get::by_alias(&self.ctx, alias)
    }

    /// Cached lookup by name, id or alias.
    pub fn get_by_cache_key(&self, key: &str) -> Result<Option<AttributeView>> {
        commands::get::by_cache_key(&self.ctx, key)
    }

    pub fn add(&self, new: NewAttribute) -> Result<AttrId> {
        commands::add::run(&self.ctx, new)
    }

    pub fn update(&self, id: AttrId, update: AttributeUpdate) -> Result<AttrId> {
        commands::update::run(&self.ctx, id, update)
    }

    /// Returns the deleted attribute's name.
    pub fn delete(&self, id: AttrId) -> Result<String> {
        commands::delete::run(&self.ctx, id)
    }
}
