use super::{commit, non_blank, Context};
use crate::error::{AttrError, Result};
use crate::model::{AttrId, AttributeUpdate};
use crate::store::StorageBackend;
use chrono::Utc;
use tracing::info;

/// Edit an attribute's definition.
///
/// Blank `name` or `alias` means "leave unchanged". The choice set is always
/// rewritten: a non-empty payload replaces it, anything else clears it.
pub fn run<B: StorageBackend>(ctx: &Context<B>, id: AttrId, update: AttributeUpdate) -> Result<AttrId> {
    let mut tx = ctx.db.begin()?;
    let before = tx
        .attribute(id)
        .cloned()
        .ok_or_else(|| AttrError::NotFound(id.to_string()))?;

    let mut after = before.clone();
    if let Some(name) = non_blank(update.name.as_deref()) {
        if tx.attribute_by_name(name).is_some_and(|other| other.id != id) {
            return Err(AttrError::DuplicateName(name.to_string()));
        }
        after.name = name.to_string();
    }
    if let Some(alias) = non_blank(update.alias.as_deref()) {
        if tx.attribute_by_alias(alias).is_some_and(|other| other.id != id) {
            return Err(AttrError::DuplicateAlias(alias.to_string()));
        }
        after.alias = alias.to_string();
    }
    if let Some(value_type) = update.value_type {
        if value_type != before.value_type {
            return Err(AttrError::Validation(format!(
                "value type of attribute <{}> is {} and cannot change to {}",
                before.name, before.value_type, value_type
            )));
        }
    }
    update.flags.apply(&mut after.flags);

    match update.choice_values.as_deref().filter(|v| !v.is_empty()) {
        Some(values) => {
            ctx.choices.replace_all(&mut tx, id, after.value_type, values)?;
            after.is_choice = true;
        }
        None => {
            ctx.choices.delete_all(&mut tx, id, after.value_type)?;
            after.is_choice = false;
        }
    }

    after.updated_at = Utc::now();
    tx.attributes.insert(id, after.clone());
    commit(tx, "update", &before.name)?;

    ctx.cache.invalidate(&before);
    ctx.cache.invalidate(&after);
    if let Some(sync) = &ctx.index_sync {
        sync.on_updated(&before, &after);
    }
    info!(attr_id = id, name = %after.name, "attribute updated");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{add, get};
    use crate::model::{ChoiceValue, FlagsUpdate, NewAttribute, ValueType};
    use crate::store::mem_backend::MemBackend;

    fn ctx_with(new: NewAttribute) -> (Context<MemBackend>, AttrId) {
        let ctx = Context::new(MemBackend::new());
        let id = add::run(&ctx, new).unwrap();
        (ctx, id)
    }

    #[test]
    fn missing_attribute_is_not_found() {
        let ctx = Context::new(MemBackend::new());
        let err = run(&ctx, 9, AttributeUpdate::default()).unwrap_err();
        assert!(matches!(err, AttrError::NotFound(ref k) if k == "9"));
    }

    #[test]
    fn renames_attribute() {
        let (ctx, id) = ctx_with(NewAttribute::new("cpu"));
        run(&ctx, id, AttributeUpdate::default().with_name("cpu_count").with_alias("CPUs")).unwrap();

        let view = get::by_id(&ctx, id).unwrap().unwrap();
        assert_eq!(view.attribute.name, "cpu_count");
        assert_eq!(view.attribute.alias, "CPUs");
        assert!(get::by_name(&ctx, "cpu").unwrap().is_none());
    }

    #[test]
    fn blank_name_keeps_current_name() {
        let (ctx, id) = ctx_with(NewAttribute::new("cpu"));
        run(&ctx, id, AttributeUpdate::default().with_name("")).unwrap();
        assert_eq!(get::by_id(&ctx, id).unwrap().unwrap().attribute.name, "cpu");
    }

    #[test]
    fn keeping_own_name_is_not_a_duplicate() {
        let (ctx, id) = ctx_with(NewAttribute::new("cpu"));
        run(&ctx, id, AttributeUpdate::default().with_name("cpu").with_alias("cpu")).unwrap();
    }

    #[test]
    fn taking_another_name_is_rejected() {
        let (ctx, cpu) = ctx_with(NewAttribute::new("cpu"));
        add::run(&ctx, NewAttribute::new("mem")).unwrap();

        let err = run(&ctx, cpu, AttributeUpdate::default().with_name("mem")).unwrap_err();
        assert!(matches!(err, AttrError::DuplicateName(ref n) if n == "mem"));

        let err = run(&ctx, cpu, AttributeUpdate::default().with_alias("mem")).unwrap_err();
        assert!(matches!(err, AttrError::DuplicateAlias(ref a) if a == "mem"));
    }

    #[test]
    fn value_type_is_immutable() {
        let (ctx, id) = ctx_with(NewAttribute::new("cores").with_value_type(ValueType::Int));
        let update = AttributeUpdate {
            value_type: Some(ValueType::Float),
            ..Default::default()
        };
        assert!(matches!(run(&ctx, id, update).unwrap_err(), AttrError::Validation(_)));

        let same = AttributeUpdate {
            value_type: Some(ValueType::Int),
            ..Default::default()
        };
        run(&ctx, id, same).unwrap();
    }

    #[test]
    fn choice_payload_replaces_the_set() {
        let (ctx, id) = ctx_with(
            NewAttribute::new("cores")
                .with_value_type(ValueType::Int)
                .with_choices([1i64, 2i64]),
        );
        run(&ctx, id, AttributeUpdate::default().with_choices([3i64])).unwrap();

        let view = get::by_id(&ctx, id).unwrap().unwrap();
        assert!(view.attribute.is_choice);
        assert_eq!(view.choice_values, vec![ChoiceValue::Int(3)]);
        assert_eq!(ctx.db.snapshot().unwrap().int_choices.len(), 1);
    }

    #[test]
    fn missing_payload_clears_the_set() {
        let (ctx, id) = ctx_with(NewAttribute::new("env").with_choices(["prod", "test"]));
        run(&ctx, id, AttributeUpdate::default()).unwrap();

        let view = get::by_id(&ctx, id).unwrap().unwrap();
        assert!(!view.attribute.is_choice);
        assert!(view.choice_values.is_empty());
        assert!(ctx.db.snapshot().unwrap().text_choices.is_empty());
    }

    #[test]
    fn empty_payload_clears_the_set() {
        let (ctx, id) = ctx_with(NewAttribute::new("env").with_choices(["prod"]));
        let update = AttributeUpdate {
            choice_values: Some(Vec::new()),
            ..Default::default()
        };
        run(&ctx, id, update).unwrap();
        assert!(!get::by_id(&ctx, id).unwrap().unwrap().attribute.is_choice);
    }

    #[test]
    fn only_given_flags_change() {
        let (ctx, id) = ctx_with(NewAttribute::new("hostname"));
        let update = AttributeUpdate {
            flags: FlagsUpdate {
                is_index: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        run(&ctx, id, update).unwrap();

        let attr = get::by_id(&ctx, id).unwrap().unwrap().attribute;
        assert!(attr.flags.is_index);
        assert!(!attr.flags.is_list);
    }

    #[test]
    fn rename_invalidates_old_and_new_cache_keys() {
        let (ctx, id) = ctx_with(NewAttribute::new("cpu"));
        get::by_cache_key(&ctx, "cpu").unwrap().unwrap();

        run(&ctx, id, AttributeUpdate::default().with_name("cpu_count")).unwrap();

        assert!(ctx.cache.lookup("cpu").is_none());
        let fresh = get::by_cache_key(&ctx, &id.to_string()).unwrap().unwrap();
        assert_eq!(fresh.attribute.name, "cpu_count");
        // "cpu" is still the alias
        let by_alias = get::by_cache_key(&ctx, "cpu").unwrap().unwrap();
        assert_eq!(by_alias.attribute.name, "cpu_count");
    }

    #[test]
    fn failed_commit_keeps_previous_definition_and_cache() {
        let (ctx, id) = ctx_with(NewAttribute::new("env").with_choices(["prod"]));
        get::by_cache_key(&ctx, "env").unwrap().unwrap();
        ctx.db.backend().set_simulate_write_error(true);

        let err = run(&ctx, id, AttributeUpdate::default().with_name("stage")).unwrap_err();
        assert!(matches!(err, AttrError::WriteFailed(ref m) if m == "update attribute env failed"));

        let snap = ctx.db.snapshot().unwrap();
        assert_eq!(snap.attribute(id).unwrap().name, "env");
        assert_eq!(snap.text_choices.len(), 1);
        assert!(ctx.cache.lookup("env").is_some());
    }
}
