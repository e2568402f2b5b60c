use super::{enrich, non_blank, Context};
use crate::error::{AttrError, Result};
use crate::model::{Attribute, AttributeView};
use crate::store::StorageBackend;
use serde::Serialize;

/// Filter and page for [`run`].
///
/// `name` wins over `alias` when both are given. Matching is a
/// case-insensitive substring test. Pages start at 1; without a page size the
/// first page holds every match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeQuery {
    pub name: Option<String>,
    pub alias: Option<String>,
    pub page: usize,
    pub page_size: Option<usize>,
}

impl Default for AttributeQuery {
    fn default() -> Self {
        Self {
            name: None,
            alias: None,
            page: 1,
            page_size: None,
        }
    }
}

impl AttributeQuery {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn by_alias(alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Default::default()
        }
    }

    pub fn paged(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = Some(page_size);
        self
    }

    fn matches(&self, attr: &Attribute) -> bool {
        let contains = |field: &str, needle: &str| {
            field.to_lowercase().contains(&needle.to_lowercase())
        };
        if let Some(name) = non_blank(self.name.as_deref()) {
            contains(&attr.name, name)
        } else if let Some(alias) = non_blank(self.alias.as_deref()) {
            contains(&attr.alias, alias)
        } else {
            true
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    /// Matches across all pages.
    pub total: usize,
    pub items: Vec<AttributeView>,
}

pub fn run<B: StorageBackend>(ctx: &Context<B>, query: &AttributeQuery) -> Result<SearchPage> {
    if query.page == 0 {
        return Err(AttrError::Validation("page numbers start at 1".to_string()));
    }
    if query.page_size == Some(0) {
        return Err(AttrError::Validation("page size must be at least 1".to_string()));
    }

    let tables = ctx.db.snapshot()?;
    let matched: Vec<&Attribute> = tables.active_attributes().filter(|a| query.matches(a)).collect();
    let total = matched.len();

    let (offset, limit) = match query.page_size {
        Some(size) => ((query.page - 1).saturating_mul(size), size),
        None if query.page == 1 => (0, total),
        None => (total, 0),
    };
    let items = matched
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|attr| enrich(&ctx.choices, &tables, attr.clone()))
        .collect::<Result<Vec<_>>>()?;

    Ok(SearchPage { total, items })
}
