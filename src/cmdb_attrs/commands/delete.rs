use super::{commit, Context};
use crate::error::{AttrError, Result};
use crate::model::AttrId;
use crate::store::StorageBackend;
use chrono::Utc;
use tracing::info;

/// Soft-delete an attribute and everything that references it.
/// Returns the attribute's name.
pub fn run<B: StorageBackend>(ctx: &Context<B>, id: AttrId) -> Result<String> {
    let mut tx = ctx.db.begin()?;
    let attr = tx
        .attribute(id)
        .cloned()
        .ok_or_else(|| AttrError::NotFound(id.to_string()))?;

    if attr.is_choice {
        ctx.choices.delete_all(&mut tx, id, attr.value_type)?;
    }

    let now = Utc::now();
    if let Some(row) = tx.attribute_mut(id) {
        row.soft_delete(now);
    }
    let report = ctx.cascade.run(&mut tx, id, now);
    commit(tx, "delete", &attr.name)?;

    ctx.cache.invalidate(&attr);
    info!(
        attr_id = id,
        name = %attr.name,
        cascaded = report.total(),
        "attribute deleted"
    );
    Ok(attr.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{add, get};
    use crate::model::{NewAttribute, ValueType};
    use crate::store::mem_backend::fixtures::StoreFixture;
    use crate::store::mem_backend::MemBackend;

    #[test]
    fn returns_name_and_hides_attribute() {
        let ctx = Context::new(MemBackend::new());
        let id = add::run(&ctx, NewAttribute::new("cpu")).unwrap();

        assert_eq!(run(&ctx, id).unwrap(), "cpu");
        assert!(get::by_id(&ctx, id).unwrap().is_none());
        assert!(get::by_name(&ctx, "cpu").unwrap().is_none());

        let snap = ctx.db.snapshot().unwrap();
        let row = &snap.attributes[&id];
        assert!(row.deleted);
        assert!(row.deleted_at.is_some());
    }

    #[test]
    fn cascades_and_clears_choices() {
        let ctx = Context::new(MemBackend::new());
        let id = add::run(
            &ctx,
            NewAttribute::new("cores")
                .with_value_type(ValueType::Int)
                .with_choices([2i64, 4i64]),
        )
        .unwrap();
        {
            let mut tx = ctx.db.begin().unwrap();
            tx.bind_ci_type(1, id);
            tx.show_in_preference(7, 1, id, 0);
            tx.add_to_group(3, id, 1);
            tx.commit().unwrap();
        }

        run(&ctx, id).unwrap();

        let snap = ctx.db.snapshot().unwrap();
        assert!(snap.int_choices.is_empty());
        assert!(snap.ci_type_attributes.iter().all(|r| r.deleted));
        assert!(snap.preference_show_attributes.iter().all(|r| r.deleted));
        assert!(snap.ci_type_attribute_group_items.iter().all(|r| r.deleted));
        assert_eq!(snap.ci_type_attributes.len(), 1);
    }

    #[test]
    fn second_delete_is_not_found() {
        let ctx = Context::new(StoreFixture::new().with_attribute("cpu", ValueType::Int).build());
        run(&ctx, 1).unwrap();
        assert!(matches!(run(&ctx, 1).unwrap_err(), AttrError::NotFound(_)));
    }

    #[test]
    fn evicts_cached_definition() {
        let ctx = Context::new(MemBackend::new());
        let id = add::run(&ctx, NewAttribute::new("cpu")).unwrap();
        get::by_cache_key(&ctx, "cpu").unwrap().unwrap();

        run(&ctx, id).unwrap();
        assert!(ctx.cache.is_empty());
        assert!(get::by_cache_key(&ctx, "cpu").unwrap().is_none());
    }

    #[test]
    fn failed_commit_changes_nothing() {
        let ctx = Context::new(
            StoreFixture::new()
                .with_attribute("cpu", ValueType::Int)
                .with_references(1)
                .build(),
        );
        get::by_cache_key(&ctx, "cpu").unwrap().unwrap();
        ctx.db.backend().set_simulate_write_error(true);

        let err = run(&ctx, 1).unwrap_err();
        assert!(matches!(err, AttrError::WriteFailed(ref m) if m == "delete attribute cpu failed"));

        let snap = ctx.db.snapshot().unwrap();
        assert!(snap.attribute(1).is_some());
        assert!(snap.ci_type_attributes.iter().all(|r| !r.deleted));
        assert!(ctx.cache.lookup("cpu").is_some());
    }
}
