use super::{commit, non_blank, Context};
use crate::error::{AttrError, Result};
use crate::model::{AttrId, Attribute, NewAttribute};
use crate::store::StorageBackend;
use chrono::Utc;
use tracing::info;

pub fn run<B: StorageBackend>(ctx: &Context<B>, new: NewAttribute) -> Result<AttrId> {
    let name = non_blank(Some(new.name.as_str()))
        .ok_or_else(|| AttrError::Validation("attribute name is required".to_string()))?
        .to_string();
    let alias = non_blank(new.alias.as_deref()).unwrap_or(&name).to_string();

    let mut tx = ctx.db.begin()?;
    if tx.attribute_by_name(&name).is_some() {
        return Err(AttrError::DuplicateName(name));
    }
    if tx.attribute_by_alias(&alias).is_some() {
        return Err(AttrError::DuplicateAlias(alias));
    }

    let now = Utc::now();
    let mut attr = Attribute {
        id: 0,
        name,
        alias,
        value_type: new.value_type,
        is_choice: !new.choice_values.is_empty(),
        flags: new.flags,
        created_at: now,
        updated_at: now,
        deleted: false,
        deleted_at: None,
    };
    attr.id = tx.insert_attribute(attr.clone());
    if attr.is_choice {
        ctx.choices
            .replace_all(&mut tx, attr.id, attr.value_type, &new.choice_values)?;
    }
    commit(tx, "add", &attr.name)?;

    ctx.cache.invalidate(&attr);
    if let Some(sync) = &ctx.index_sync {
        sync.on_created(&attr);
    }
    info!(attr_id = attr.id, name = %attr.name, "attribute added");
    Ok(attr.id)
}
