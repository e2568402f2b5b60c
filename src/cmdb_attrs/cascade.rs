use crate::model::{AssociationSet, AttrId, AttrReference};
use crate::store::Tables;
use chrono::{DateTime, Utc};
use tracing::debug;

/// How many rows each association set soft-deleted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    pub ci_type_attributes: usize,
    pub preference_show_attributes: usize,
    pub ci_type_attribute_group_items: usize,
}

impl CascadeReport {
    pub fn total(&self) -> usize {
        self.ci_type_attributes + self.preference_show_attributes + self.ci_type_attribute_group_items
    }

    pub fn count(&self, set: AssociationSet) -> usize {
        match set {
            AssociationSet::CiTypeAttributes => self.ci_type_attributes,
            AssociationSet::PreferenceShowAttributes => self.preference_show_attributes,
            AssociationSet::CiTypeAttributeGroupItems => self.ci_type_attribute_group_items,
        }
    }

    fn slot(&mut self, set: AssociationSet) -> &mut usize {
        match set {
            AssociationSet::CiTypeAttributes => &mut self.ci_type_attributes,
            AssociationSet::PreferenceShowAttributes => &mut self.preference_show_attributes,
            AssociationSet::CiTypeAttributeGroupItems => &mut self.ci_type_attribute_group_items,
        }
    }
}

/// Soft-deletes association rows that point at a removed attribute.
///
/// Sets are independent of each other, so they are visited in a fixed but
/// arbitrary order. Rows already soft-deleted are left as they are, which
/// makes a second run over the same attribute a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct CascadeDeleteCoordinator;

impl CascadeDeleteCoordinator {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, tables: &mut Tables, attr_id: AttrId, at: DateTime<Utc>) -> CascadeReport {
        let mut report = CascadeReport::default();
        for set in AssociationSet::ALL {
            let n = match set {
                AssociationSet::CiTypeAttributes => {
                    soft_delete_refs(&mut tables.ci_type_attributes, attr_id, at)
                }
                AssociationSet::PreferenceShowAttributes => {
                    soft_delete_refs(&mut tables.preference_show_attributes, attr_id, at)
                }
                AssociationSet::CiTypeAttributeGroupItems => {
                    soft_delete_refs(&mut tables.ci_type_attribute_group_items, attr_id, at)
                }
            };
            if n > 0 {
                debug!(attr_id, set = set.as_str(), rows = n, "cascaded soft delete");
            }
            *report.slot(set) = n;
        }
        report
    }
}

fn soft_delete_refs<R: AttrReference>(rows: &mut [R], attr_id: AttrId, at: DateTime<Utc>) -> usize {
    let mut n = 0;
    for row in rows
        .iter_mut()
        .filter(|r| r.attr_id() == attr_id && !r.is_deleted())
    {
        row.soft_delete(at);
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn referenced(attr_id: AttrId) -> Tables {
        let mut tables = Tables::default();
        tables.bind_ci_type(10, attr_id);
        tables.bind_ci_type(11, attr_id);
        tables.show_in_preference(1, 10, attr_id, 0);
        tables.add_to_group(5, attr_id, 2);
        tables
    }

    #[test]
    fn soft_deletes_every_reference() {
        let mut tables = referenced(7);
        let report = CascadeDeleteCoordinator::new().run(&mut tables, 7, Utc::now());

        assert_eq!(report.count(AssociationSet::CiTypeAttributes), 2);
        assert_eq!(report.count(AssociationSet::PreferenceShowAttributes), 1);
        assert_eq!(report.count(AssociationSet::CiTypeAttributeGroupItems), 1);
        assert_eq!(report.total(), 4);

        assert!(tables.ci_type_attributes.iter().all(|r| r.deleted && r.deleted_at.is_some()));
        assert!(tables.preference_show_attributes.iter().all(|r| r.deleted));
        assert!(tables.ci_type_attribute_group_items.iter().all(|r| r.deleted));
    }

    #[test]
    fn rows_are_kept_not_removed() {
        let mut tables = referenced(7);
        CascadeDeleteCoordinator::new().run(&mut tables, 7, Utc::now());
        assert_eq!(tables.ci_type_attributes.len(), 2);
        assert_eq!(tables.preference_show_attributes.len(), 1);
        assert_eq!(tables.ci_type_attribute_group_items.len(), 1);
    }

    #[test]
    fn leaves_other_attributes_alone() {
        let mut tables = referenced(7);
        tables.bind_ci_type(10, 8);
        CascadeDeleteCoordinator::new().run(&mut tables, 7, Utc::now());

        let other = tables.ci_type_attributes.iter().find(|r| r.attr_id == 8).unwrap();
        assert!(!other.deleted);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut tables = referenced(7);
        let coordinator = CascadeDeleteCoordinator::new();
        let first_at = Utc::now();
        coordinator.run(&mut tables, 7, first_at);

        let report = coordinator.run(&mut tables, 7, Utc::now());
        assert_eq!(report.total(), 0);
        assert_eq!(tables.ci_type_attributes[0].deleted_at, Some(first_at));
    }

    #[test]
    fn no_references_is_not_an_error() {
        let mut tables = Tables::default();
        let report = CascadeDeleteCoordinator::new().run(&mut tables, 1, Utc::now());
        assert_eq!(report, CascadeReport::default());
    }
}
