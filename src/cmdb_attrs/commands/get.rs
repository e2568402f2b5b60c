use super::{enrich, Context};
use crate::error::Result;
use crate::model::{AttrId, Attribute, AttributeView};
use crate::store::{StorageBackend, Tables};
use tracing::debug;

pub fn by_id<B: StorageBackend>(ctx: &Context<B>, id: AttrId) -> Result<Option<AttributeView>> {
    find(ctx, |tables| tables.attribute(id))
}

pub fn by_name<B: StorageBackend>(ctx: &Context<B>, name: &str) -> Result<Option<AttributeView>> {
    find(ctx, |tables| tables.attribute_by_name(name))
}

pub fn by_alias<B: StorageBackend>(ctx: &Context<B>, alias: &str) -> Result<Option<AttributeView>> {
    find(ctx, |tables| tables.attribute_by_alias(alias))
}

/// Read-through lookup by a raw key: a name, a numeric id or an alias, tried
/// in that order. A store hit fills the cache, unless an invalidation ran
/// after the snapshot was taken.
pub fn by_cache_key<B: StorageBackend>(ctx: &Context<B>, key: &str) -> Result<Option<AttributeView>> {
    if let Some(attr) = ctx.cache.lookup(key) {
        debug!(key, "attribute cache hit");
        if !attr.is_choice {
            return Ok(Some(AttributeView {
                attribute: attr,
                choice_values: Vec::new(),
            }));
        }
        let tables = ctx.db.snapshot()?;
        return enrich(&ctx.choices, &tables, attr).map(Some);
    }

    debug!(key, "attribute cache miss");
    let generation = ctx.cache.generation();
    let tables = ctx.db.snapshot()?;
    match resolve_key(&tables, key).cloned() {
        Some(attr) => {
            ctx.cache.insert_if_current(attr.clone(), generation);
            enrich(&ctx.choices, &tables, attr).map(Some)
        }
        None => Ok(None),
    }
}

fn resolve_key<'t>(tables: &'t Tables, key: &str) -> Option<&'t Attribute> {
    tables
        .attribute_by_name(key)
        .or_else(|| key.parse().ok().and_then(|id| tables.attribute(id)))
        .or_else(|| tables.attribute_by_alias(key))
}

fn find<B, F>(ctx: &Context<B>, select: F) -> Result<Option<AttributeView>>
where
    B: StorageBackend,
    F: for<'t> FnOnce(&'t Tables) -> Option<&'t Attribute>,
{
    let tables = ctx.db.snapshot()?;
    select(&tables)
        .cloned()
        .map(|attr| enrich(&ctx.choices, &tables, attr))
        .transpose()
}
