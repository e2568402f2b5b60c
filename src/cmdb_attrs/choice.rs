//! # Choice Values
//!
//! A choice attribute restricts its values to an enumerated set. The set is
//! stored in one of three typed tables, picked by the attribute's
//! [`ValueType`]:
//!
//! | Value type | Table |
//! |------------|-------|
//! | `int` | `c_choice_integers` |
//! | `float` | `c_choice_floats` |
//! | `text`, `datetime`, `date`, `time` | `c_choice_texts` |
//!
//! [`ChoiceValueStore`] resolves that mapping once, at construction, into a
//! map of [`ChoiceTable`] strategies. All three strategies share one generic
//! implementation parameterized by the row's scalar type.
//!
//! The set is always written as a unit: [`ChoiceValueStore::replace_all`]
//! deletes every row of the attribute and inserts the new ones. There is no
//! diffing.

use crate::error::{AttrError, Result};
use crate::model::{AttrId, ChoiceValue, ValueType};
use crate::store::Tables;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRow<T> {
    pub id: u64,
    pub attr_id: AttrId,
    pub value: T,
}

/// A scalar type with its own choice table.
pub trait ChoiceScalar: Clone + Send + Sync + 'static {
    const TABLE: &'static str;

    fn rows(tables: &Tables) -> &Vec<ChoiceRow<Self>>;
    fn rows_mut(tables: &mut Tables) -> &mut Vec<ChoiceRow<Self>>;

    /// Convert a caller-supplied value into this column type.
    fn coerce(value: &ChoiceValue) -> Option<Self>;

    fn to_value(&self) -> ChoiceValue;
}

impl ChoiceScalar for i64 {
    const TABLE: &'static str = "c_choice_integers";

    fn rows(tables: &Tables) -> &Vec<ChoiceRow<Self>> {
        &tables.int_choices
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<ChoiceRow<Self>> {
        &mut tables.int_choices
    }

    fn coerce(value: &ChoiceValue) -> Option<Self> {
        match value {
            ChoiceValue::Int(v) => Some(*v),
            ChoiceValue::Float(_) => None,
            ChoiceValue::Text(s) => s.trim().parse().ok(),
        }
    }

    fn to_value(&self) -> ChoiceValue {
        ChoiceValue::Int(*self)
    }
}

impl ChoiceScalar for f64 {
    const TABLE: &'static str = "c_choice_floats";

    fn rows(tables: &Tables) -> &Vec<ChoiceRow<Self>> {
        &tables.float_choices
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<ChoiceRow<Self>> {
        &mut tables.float_choices
    }

    fn coerce(value: &ChoiceValue) -> Option<Self> {
        match value {
            ChoiceValue::Int(v) => Some(*v as f64),
            ChoiceValue::Float(v) => Some(*v),
            ChoiceValue::Text(s) => s.trim().parse().ok(),
        }
        .filter(|v: &f64| v.is_finite())
    }

    fn to_value(&self) -> ChoiceValue {
        ChoiceValue::Float(*self)
    }
}

impl ChoiceScalar for String {
    const TABLE: &'static str = "c_choice_texts";

    fn rows(tables: &Tables) -> &Vec<ChoiceRow<Self>> {
        &tables.text_choices
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<ChoiceRow<Self>> {
        &mut tables.text_choices
    }

    fn coerce(value: &ChoiceValue) -> Option<Self> {
        Some(value.to_string())
    }

    fn to_value(&self) -> ChoiceValue {
        ChoiceValue::Text(self.clone())
    }
}

/// Storage strategy for one choice table.
pub trait ChoiceTable: Send + Sync {
    fn name(&self) -> &'static str;

    /// Values for `attr_id`, in insertion order.
    fn get(&self, tables: &Tables, attr_id: AttrId) -> Vec<ChoiceValue>;

    /// Delete all rows for `attr_id`, then insert one row per value.
    fn replace_all(&self, tables: &mut Tables, attr_id: AttrId, values: &[ChoiceValue]) -> Result<()>;

    /// Delete all rows for `attr_id`. Returns how many were removed.
    fn delete_all(&self, tables: &mut Tables, attr_id: AttrId) -> usize;
}

struct TypedChoiceTable<T>(PhantomData<fn() -> T>);

impl<T> TypedChoiceTable<T> {
    fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: ChoiceScalar> ChoiceTable for TypedChoiceTable<T> {
    fn name(&self) -> &'static str {
        T::TABLE
    }

    fn get(&self, tables: &Tables, attr_id: AttrId) -> Vec<ChoiceValue> {
        T::rows(tables)
            .iter()
            .filter(|row| row.attr_id == attr_id)
            .map(|row| row.value.to_value())
            .collect()
    }

    fn replace_all(&self, tables: &mut Tables, attr_id: AttrId, values: &[ChoiceValue]) -> Result<()> {
        // Coerce everything before touching rows so a bad value stages nothing.
        let coerced = values
            .iter()
            .map(|v| {
                T::coerce(v).ok_or_else(|| {
                    AttrError::Validation(format!(
                        "choice value <{}> does not fit table {}",
                        v,
                        T::TABLE
                    ))
                })
            })
            .collect::<Result<Vec<T>>>()?;

        self.delete_all(tables, attr_id);
        for value in coerced {
            let id = tables.next_id(T::TABLE);
            T::rows_mut(tables).push(ChoiceRow { id, attr_id, value });
        }
        Ok(())
    }

    fn delete_all(&self, tables: &mut Tables, attr_id: AttrId) -> usize {
        let rows = T::rows_mut(tables);
        let before = rows.len();
        rows.retain(|row| row.attr_id != attr_id);
        before - rows.len()
    }
}

/// Per value-type dispatch to the typed choice tables.
pub struct ChoiceValueStore {
    tables: HashMap<ValueType, Arc<dyn ChoiceTable>>,
}

impl Default for ChoiceValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChoiceValueStore {
    pub fn new() -> Self {
        let ints: Arc<dyn ChoiceTable> = Arc::new(TypedChoiceTable::<i64>::new());
        let floats: Arc<dyn ChoiceTable> = Arc::new(TypedChoiceTable::<f64>::new());
        let texts: Arc<dyn ChoiceTable> = Arc::new(TypedChoiceTable::<String>::new());

        let tables = ValueType::ALL
            .into_iter()
            .map(|vt| {
                let table = match vt {
                    ValueType::Int => ints.clone(),
                    ValueType::Float => floats.clone(),
                    ValueType::Text | ValueType::Datetime | ValueType::Date | ValueType::Time => {
                        texts.clone()
                    }
                };
                (vt, table)
            })
            .collect();

        Self { tables }
    }

    fn table(&self, value_type: ValueType) -> Result<&dyn ChoiceTable> {
        self.tables
            .get(&value_type)
            .map(|t| t.as_ref())
            .ok_or_else(|| AttrError::Store(format!("no choice table for value type {}", value_type)))
    }

    pub fn table_name(&self, value_type: ValueType) -> Result<&'static str> {
        Ok(self.table(value_type)?.name())
    }

    pub fn get(&self, tables: &Tables, attr_id: AttrId, value_type: ValueType) -> Result<Vec<ChoiceValue>> {
        Ok(self.table(value_type)?.get(tables, attr_id))
    }

    pub fn replace_all(
        &self,
        tables: &mut Tables,
        attr_id: AttrId,
        value_type: ValueType,
        values: &[ChoiceValue],
    ) -> Result<()> {
        self.table(value_type)?.replace_all(tables, attr_id, values)
    }

    pub fn delete_all(&self, tables: &mut Tables, attr_id: AttrId, value_type: ValueType) -> Result<usize> {
        Ok(self.table(value_type)?.delete_all(tables, attr_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_value_types_to_tables() {
        let store = ChoiceValueStore::new();
        assert_eq!(store.table_name(ValueType::Int).unwrap(), "c_choice_integers");
        assert_eq!(store.table_name(ValueType::Float).unwrap(), "c_choice_floats");
        for vt in [ValueType::Text, ValueType::Datetime, ValueType::Date, ValueType::Time] {
            assert_eq!(store.table_name(vt).unwrap(), "c_choice_texts");
        }
    }

    #[test]
    fn replace_all_is_a_full_replace() {
        let store = ChoiceValueStore::new();
        let mut tables = Tables::default();
        store
            .replace_all(&mut tables, 1, ValueType::Int, &[1i64.into(), 2i64.into()])
            .unwrap();
        store.replace_all(&mut tables, 1, ValueType::Int, &[3i64.into()]).unwrap();

        assert_eq!(store.get(&tables, 1, ValueType::Int).unwrap(), vec![ChoiceValue::Int(3)]);
        assert_eq!(tables.int_choices.len(), 1);
    }

    #[test]
    fn replace_all_with_empty_input_leaves_no_rows() {
        let store = ChoiceValueStore::new();
        let mut tables = Tables::default();
        store
            .replace_all(&mut tables, 1, ValueType::Text, &["a".into()])
            .unwrap();
        store.replace_all(&mut tables, 1, ValueType::Text, &[]).unwrap();
        assert!(store.get(&tables, 1, ValueType::Text).unwrap().is_empty());
    }

    #[test]
    fn replace_all_keeps_other_attributes() {
        let store = ChoiceValueStore::new();
        let mut tables = Tables::default();
        store.replace_all(&mut tables, 1, ValueType::Text, &["a".into()]).unwrap();
        store.replace_all(&mut tables, 2, ValueType::Text, &["b".into()]).unwrap();
        store.replace_all(&mut tables, 1, ValueType::Text, &["c".into()]).unwrap();

        assert_eq!(
            store.get(&tables, 2, ValueType::Text).unwrap(),
            vec![ChoiceValue::Text("b".into())]
        );
    }

    #[test]
    fn values_keep_insertion_order() {
        let store = ChoiceValueStore::new();
        let mut tables = Tables::default();
        let values: Vec<ChoiceValue> = vec!["z".into(), "a".into(), "m".into()];
        store.replace_all(&mut tables, 7, ValueType::Text, &values).unwrap();
        assert_eq!(store.get(&tables, 7, ValueType::Text).unwrap(), values);
    }

    #[test]
    fn coerces_into_column_type() {
        let store = ChoiceValueStore::new();
        let mut tables = Tables::default();
        store
            .replace_all(&mut tables, 1, ValueType::Float, &[1i64.into(), "2.5".into()])
            .unwrap();
        store
            .replace_all(&mut tables, 2, ValueType::Int, &[" 42 ".into()])
            .unwrap();
        store
            .replace_all(&mut tables, 3, ValueType::Date, &[7i64.into()])
            .unwrap();

        assert_eq!(
            store.get(&tables, 1, ValueType::Float).unwrap(),
            vec![ChoiceValue::Float(1.0), ChoiceValue::Float(2.5)]
        );
        assert_eq!(store.get(&tables, 2, ValueType::Int).unwrap(), vec![ChoiceValue::Int(42)]);
        assert_eq!(
            store.get(&tables, 3, ValueType::Date).unwrap(),
            vec![ChoiceValue::Text("7".into())]
        );
    }

    #[test]
    fn rejects_uncoercible_value_without_staging_rows() {
        let store = ChoiceValueStore::new();
        let mut tables = Tables::default();
        store.replace_all(&mut tables, 1, ValueType::Int, &[5i64.into()]).unwrap();

        let err = store
            .replace_all(&mut tables, 1, ValueType::Int, &[6i64.into(), "six".into()])
            .unwrap_err();
        assert!(matches!(err, AttrError::Validation(_)));
        assert_eq!(store.get(&tables, 1, ValueType::Int).unwrap(), vec![ChoiceValue::Int(5)]);
    }

    #[test]
    fn delete_all_is_idempotent() {
        let store = ChoiceValueStore::new();
        let mut tables = Tables::default();
        store
            .replace_all(&mut tables, 1, ValueType::Int, &[1i64.into(), 2i64.into()])
            .unwrap();
        assert_eq!(store.delete_all(&mut tables, 1, ValueType::Int).unwrap(), 2);
        assert_eq!(store.delete_all(&mut tables, 1, ValueType::Int).unwrap(), 0);
    }
}
