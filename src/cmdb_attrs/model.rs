use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type AttrId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Float,
    #[default]
    Text,
    Datetime,
    Date,
    Time,
}

impl ValueType {
    pub const ALL: [ValueType; 6] = [
        ValueType::Int,
        ValueType::Float,
        ValueType::Text,
        ValueType::Datetime,
        ValueType::Date,
        ValueType::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Text => "text",
            ValueType::Datetime => "datetime",
            ValueType::Date => "date",
            ValueType::Time => "time",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueType::ALL
            .into_iter()
            .find(|vt| vt.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown value type: {}", s))
    }
}

/// A raw legal value of a choice attribute, as supplied by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ChoiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceValue::Int(v) => write!(f, "{}", v),
            ChoiceValue::Float(v) => write!(f, "{}", v),
            ChoiceValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ChoiceValue {
    fn from(v: i64) -> Self {
        ChoiceValue::Int(v)
    }
}

impl From<f64> for ChoiceValue {
    fn from(v: f64) -> Self {
        ChoiceValue::Float(v)
    }
}

impl From<&str> for ChoiceValue {
    fn from(v: &str) -> Self {
        ChoiceValue::Text(v.to_string())
    }
}

impl From<String> for ChoiceValue {
    fn from(v: String) -> Self {
        ChoiceValue::Text(v)
    }
}

/// Definition flags that do not take part in the consistency rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeFlags {
    /// Whether the search index should index this field.
    pub is_index: bool,
    pub is_list: bool,
    pub is_uniq: bool,
    pub is_link: bool,
    pub is_password: bool,
    pub is_sortable: bool,
}

/// Partial flag edits; `None` leaves the stored flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagsUpdate {
    pub is_index: Option<bool>,
    pub is_list: Option<bool>,
    pub is_uniq: Option<bool>,
    pub is_link: Option<bool>,
    pub is_password: Option<bool>,
    pub is_sortable: Option<bool>,
}

impl FlagsUpdate {
    pub fn apply(&self, flags: &mut AttributeFlags) {
        let pairs = [
            (self.is_index, &mut flags.is_index),
            (self.is_list, &mut flags.is_list),
            (self.is_uniq, &mut flags.is_uniq),
            (self.is_link, &mut flags.is_link),
            (self.is_password, &mut flags.is_password),
            (self.is_sortable, &mut flags.is_sortable),
        ];
        for (update, slot) in pairs {
            if let Some(value) = update {
                *slot = value;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttrId,
    pub name: String,
    pub alias: String,
    pub value_type: ValueType,
    pub is_choice: bool,
    #[serde(flatten)]
    pub flags: AttributeFlags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Attribute {
    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}

/// Input for creating an attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAttribute {
    pub name: String,
    /// Defaults to `name` when absent or blank.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub flags: AttributeFlags,
    #[serde(default)]
    pub choice_values: Vec<ChoiceValue>,
}

impl NewAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_flags(mut self, flags: AttributeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_choices<V: Into<ChoiceValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.choice_values = values.into_iter().map(Into::into).collect();
        self
    }
}

/// Input for editing an attribute.
///
/// `choice_values` is not a partial edit: `Some(non-empty)` replaces the
/// whole set, while `None` or an empty list removes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeUpdate {
    pub name: Option<String>,
    pub alias: Option<String>,
    pub value_type: Option<ValueType>,
    pub flags: FlagsUpdate,
    pub choice_values: Option<Vec<ChoiceValue>>,
}

impl AttributeUpdate {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_choices<V: Into<ChoiceValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.choice_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// An attribute as returned to callers, enriched with its legal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeView {
    #[serde(flatten)]
    pub attribute: Attribute,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choice_values: Vec<ChoiceValue>,
}

// --- Dependent associations ---

/// A row holding a weak back-reference to an attribute.
pub trait AttrReference {
    fn attr_id(&self) -> AttrId;
    fn is_deleted(&self) -> bool;
    fn soft_delete(&mut self, at: DateTime<Utc>);
}

macro_rules! attr_reference {
    ($ty:ty) => {
        impl AttrReference for $ty {
            fn attr_id(&self) -> AttrId {
                self.attr_id
            }

            fn is_deleted(&self) -> bool {
                self.deleted
            }

            fn soft_delete(&mut self, at: DateTime<Utc>) {
                self.deleted = true;
                self.deleted_at = Some(at);
            }
        }
    };
}

/// Binding of an attribute to a CI type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiTypeAttribute {
    pub id: u64,
    pub type_id: u64,
    pub attr_id: AttrId,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A user's choice to show an attribute when listing a CI type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceShowAttribute {
    pub id: u64,
    pub uid: u64,
    pub type_id: u64,
    pub attr_id: AttrId,
    pub order: u32,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Membership of an attribute in a CI type attribute group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiTypeAttributeGroupItem {
    pub id: u64,
    pub group_id: u64,
    pub attr_id: AttrId,
    pub order: u32,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

attr_reference!(CiTypeAttribute);
attr_reference!(PreferenceShowAttribute);
attr_reference!(CiTypeAttributeGroupItem);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationSet {
    CiTypeAttributes,
    PreferenceShowAttributes,
    CiTypeAttributeGroupItems,
}

impl AssociationSet {
    pub const ALL: [AssociationSet; 3] = [
        AssociationSet::CiTypeAttributes,
        AssociationSet::PreferenceShowAttributes,
        AssociationSet::CiTypeAttributeGroupItems,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssociationSet::CiTypeAttributes => "c_ci_type_attributes",
            AssociationSet::PreferenceShowAttributes => "c_preference_show_attributes",
            AssociationSet::CiTypeAttributeGroupItems => "c_ci_type_attribute_group_items",
        }
    }
}
