//! Allow-listed field comparison.
//!
//! Each entity kind publishes a static accessor table mapping a field name to
//! a getter. A [`FieldComparator`] is built from a list of field names and
//! compares only those fields.

use super::result::FieldChange;
use crate::error::{DriftError, Result};
use crate::model::{Component, Library, Property, SecurityRequirement, TestCase, Threat};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A comparable field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Text(String),
    Integer(i64),
    Flag(bool),
    Uuid(Uuid),
    List(Vec<String>),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    fn text(value: &str) -> Self {
        Self::Text(value.to_string())
    }

    fn opt_text(value: Option<&String>) -> Self {
        value.map_or(Self::Absent, |v| Self::Text(v.clone()))
    }

    fn opt_int(value: Option<i64>) -> Self {
        value.map_or(Self::Absent, Self::Integer)
    }

    fn opt_flag(value: Option<bool>) -> Self {
        value.map_or(Self::Absent, Self::Flag)
    }

    fn opt_uuid(value: Option<Uuid>) -> Self {
        value.map_or(Self::Absent, Self::Uuid)
    }

    fn opt_time(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Absent, Self::Timestamp)
    }

    fn list(values: &[String]) -> Self {
        Self::List(values.to_vec())
    }

    /// Text compares after trimming; everything else by value.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.trim() == b.trim(),
            (a, b) => a == b,
        }
    }

    /// Stringified form used in [`FieldChange`].
    #[must_use]
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Absent => None,
            Self::Text(v) => Some(v.clone()),
            Self::Integer(v) => Some(v.to_string()),
            Self::Flag(v) => Some(v.to_string()),
            Self::Uuid(v) => Some(v.to_string()),
            Self::List(v) => Some(v.join(", ")),
            Self::Timestamp(v) => Some(v.to_rfc3339()),
        }
    }
}

/// Named getter for one field of `T`.
pub struct FieldAccessor<T: 'static> {
    pub name: &'static str,
    pub get: fn(&T) -> FieldValue,
}

/// Per-kind accessor table and default allow-list.
pub trait FieldTable: Sized + 'static {
    /// Kind name used in configuration and messages
    const KIND: &'static str;

    fn accessors() -> &'static [FieldAccessor<Self>];

    /// Fields compared when no allow-list is configured
    fn default_fields() -> &'static [&'static str];
}

/// Compares the allow-listed fields of two entities.
pub struct FieldComparator<T: 'static> {
    fields: Vec<&'static FieldAccessor<T>>,
}

impl<T: FieldTable> FieldComparator<T> {
    /// Build from field names. Unknown names are a configuration error.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let table = T::accessors();
        let mut fields = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let accessor = table.iter().find(|a| a.name == name).ok_or_else(|| {
                DriftError::config(format!(
                    "unknown {} field '{name}' (known: {})",
                    T::KIND,
                    table.iter().map(|a| a.name).collect::<Vec<_>>().join(", ")
                ))
            })?;
            if !fields.iter().any(|f: &&FieldAccessor<T>| f.name == accessor.name) {
                fields.push(accessor);
            }
        }
        Ok(Self { fields })
    }

    /// Comparator over the kind's default allow-list.
    #[must_use]
    pub fn with_defaults() -> Self {
        let table = T::accessors();
        let fields = T::default_fields()
            .iter()
            .filter_map(|name| table.iter().find(|a| a.name == *name))
            .collect();
        Self { fields }
    }

    /// Whether `name` is a comparable field of `T`.
    #[must_use]
    pub fn is_known(name: &str) -> bool {
        T::accessors().iter().any(|a| a.name == name)
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Changes between `old` and `new`, in allow-list order.
    #[must_use]
    pub fn compare(&self, old: &T, new: &T) -> Vec<FieldChange> {
        self.fields
            .iter()
            .filter_map(|accessor| {
                let before = (accessor.get)(old);
                let after = (accessor.get)(new);
                (!before.same_as(&after)).then(|| FieldChange {
                    field: accessor.name.to_string(),
                    old_value: before.render(),
                    new_value: after.render(),
                })
            })
            .collect()
    }
}

impl<T: FieldTable> Default for FieldComparator<T> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<T: 'static> std::fmt::Debug for FieldComparator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.fields.iter().map(|a| a.name)).finish()
    }
}

macro_rules! accessor {
    ($ty:ty, $name:literal, $get:expr) => {
        FieldAccessor::<$ty> {
            name: $name,
            get: $get,
        }
    };
}

static LIBRARY_FIELDS: &[FieldAccessor<Library>] = &[
    accessor!(Library, "uuid", |e| FieldValue::Uuid(e.uuid)),
    accessor!(Library, "id", |e| FieldValue::opt_int(e.id)),
    accessor!(Library, "name", |e| FieldValue::text(&e.name)),
    accessor!(Library, "description", |e| FieldValue::opt_text(e.description.as_ref())),
    accessor!(Library, "revision", |e| FieldValue::opt_int(e.revision)),
    accessor!(Library, "library_type", |e| FieldValue::opt_text(e.library_type.as_ref())),
    accessor!(Library, "enabled", |e| FieldValue::opt_flag(e.enabled)),
    accessor!(Library, "tags", |e| FieldValue::list(&e.tags)),
    accessor!(Library, "created_at", |e| FieldValue::opt_time(e.created_at)),
    accessor!(Library, "updated_at", |e| FieldValue::opt_time(e.updated_at)),
];

static COMPONENT_FIELDS: &[FieldAccessor<Component>] = &[
    accessor!(Component, "uuid", |e| FieldValue::Uuid(e.uuid)),
    accessor!(Component, "id", |e| FieldValue::opt_int(e.id)),
    accessor!(Component, "library_uuid", |e| FieldValue::opt_uuid(e.library_uuid)),
    accessor!(Component, "name", |e| FieldValue::text(&e.name)),
    accessor!(Component, "description", |e| FieldValue::opt_text(e.description.as_ref())),
    accessor!(Component, "component_type_uuid", |e| FieldValue::opt_uuid(e.component_type_uuid)),
    accessor!(Component, "category", |e| FieldValue::opt_text(e.category.as_ref())),
    accessor!(Component, "visible", |e| FieldValue::opt_flag(e.visible)),
    accessor!(Component, "tags", |e| FieldValue::list(&e.tags)),
    accessor!(Component, "created_at", |e| FieldValue::opt_time(e.created_at)),
    accessor!(Component, "updated_at", |e| FieldValue::opt_time(e.updated_at)),
];

static THREAT_FIELDS: &[FieldAccessor<Threat>] = &[
    accessor!(Threat, "uuid", |e| FieldValue::Uuid(e.uuid)),
    accessor!(Threat, "id", |e| FieldValue::opt_int(e.id)),
    accessor!(Threat, "library_uuid", |e| FieldValue::opt_uuid(e.library_uuid)),
    accessor!(Threat, "name", |e| FieldValue::text(&e.name)),
    accessor!(Threat, "description", |e| FieldValue::opt_text(e.description.as_ref())),
    accessor!(Threat, "risk_rating", |e| FieldValue::opt_int(e.risk_rating)),
    accessor!(Threat, "categories", |e| FieldValue::list(&e.categories)),
    accessor!(Threat, "references", |e| FieldValue::list(&e.references)),
    accessor!(Threat, "created_at", |e| FieldValue::opt_time(e.created_at)),
    accessor!(Threat, "updated_at", |e| FieldValue::opt_time(e.updated_at)),
];

static SECURITY_REQUIREMENT_FIELDS: &[FieldAccessor<SecurityRequirement>] = &[
    accessor!(SecurityRequirement, "uuid", |e| FieldValue::Uuid(e.uuid)),
    accessor!(SecurityRequirement, "id", |e| FieldValue::opt_int(e.id)),
    accessor!(SecurityRequirement, "library_uuid", |e| FieldValue::opt_uuid(e.library_uuid)),
    accessor!(SecurityRequirement, "name", |e| FieldValue::text(&e.name)),
    accessor!(SecurityRequirement, "description", |e| FieldValue::opt_text(e.description.as_ref())),
    accessor!(SecurityRequirement, "priority", |e| FieldValue::opt_text(e.priority.as_ref())),
    accessor!(SecurityRequirement, "cost", |e| FieldValue::opt_int(e.cost)),
    accessor!(SecurityRequirement, "references", |e| FieldValue::list(&e.references)),
    accessor!(SecurityRequirement, "created_at", |e| FieldValue::opt_time(e.created_at)),
    accessor!(SecurityRequirement, "updated_at", |e| FieldValue::opt_time(e.updated_at)),
];

static TEST_CASE_FIELDS: &[FieldAccessor<TestCase>] = &[
    accessor!(TestCase, "uuid", |e| FieldValue::Uuid(e.uuid)),
    accessor!(TestCase, "id", |e| FieldValue::opt_int(e.id)),
    accessor!(TestCase, "library_uuid", |e| FieldValue::opt_uuid(e.library_uuid)),
    accessor!(TestCase, "security_requirement_uuid", |e| FieldValue::opt_uuid(e.security_requirement_uuid)),
    accessor!(TestCase, "name", |e| FieldValue::text(&e.name)),
    accessor!(TestCase, "description", |e| FieldValue::opt_text(e.description.as_ref())),
    accessor!(TestCase, "steps", |e| FieldValue::list(&e.steps)),
    accessor!(TestCase, "expected_result", |e| FieldValue::opt_text(e.expected_result.as_ref())),
    accessor!(TestCase, "created_at", |e| FieldValue::opt_time(e.created_at)),
    accessor!(TestCase, "updated_at", |e| FieldValue::opt_time(e.updated_at)),
];

static PROPERTY_FIELDS: &[FieldAccessor<Property>] = &[
    accessor!(Property, "uuid", |e| FieldValue::Uuid(e.uuid)),
    accessor!(Property, "id", |e| FieldValue::opt_int(e.id)),
    accessor!(Property, "library_uuid", |e| FieldValue::opt_uuid(e.library_uuid)),
    accessor!(Property, "name", |e| FieldValue::text(&e.name)),
    accessor!(Property, "description", |e| FieldValue::opt_text(e.description.as_ref())),
    accessor!(Property, "property_type_uuid", |e| FieldValue::opt_uuid(e.property_type_uuid)),
    accessor!(Property, "required", |e| FieldValue::opt_flag(e.required)),
    accessor!(Property, "created_at", |e| FieldValue::opt_time(e.created_at)),
    accessor!(Property, "updated_at", |e| FieldValue::opt_time(e.updated_at)),
];

macro_rules! field_table {
    ($ty:ty, $kind:literal, $table:ident, [$($default:literal),* $(,)?]) => {
        impl FieldTable for $ty {
            const KIND: &'static str = $kind;

            fn accessors() -> &'static [FieldAccessor<Self>] {
                $table
            }

            fn default_fields() -> &'static [&'static str] {
                &[$($default),*]
            }
        }
    };
}

field_table!(Library, "library", LIBRARY_FIELDS, [
    "name", "description", "revision", "library_type", "enabled", "tags",
]);
field_table!(Component, "component", COMPONENT_FIELDS, [
    "name", "description", "component_type_uuid", "category", "visible", "tags",
]);
field_table!(Threat, "threat", THREAT_FIELDS, [
    "name", "description", "risk_rating", "categories", "references",
]);
field_table!(SecurityRequirement, "security_requirement", SECURITY_REQUIREMENT_FIELDS, [
    "name", "description", "priority", "cost", "references",
]);
field_table!(TestCase, "test_case", TEST_CASE_FIELDS, [
    "name", "description", "security_requirement_uuid", "steps", "expected_result",
]);
field_table!(Property, "property", PROPERTY_FIELDS, [
    "name", "description", "property_type_uuid", "required",
]);

/// One comparator per entity kind.
#[derive(Debug, Default)]
pub struct FieldPolicy {
    pub library: FieldComparator<Library>,
    pub component: FieldComparator<Component>,
    pub threat: FieldComparator<Threat>,
    pub security_requirement: FieldComparator<SecurityRequirement>,
    pub test_case: FieldComparator<TestCase>,
    pub property: FieldComparator<Property>,
}

/// Optional allow-list overrides per kind; `None` keeps the default list.
#[derive(Debug, Clone, Default)]
pub struct FieldLists<'a> {
    pub library: Option<&'a [String]>,
    pub component: Option<&'a [String]>,
    pub threat: Option<&'a [String]>,
    pub security_requirement: Option<&'a [String]>,
    pub test_case: Option<&'a [String]>,
    pub property: Option<&'a [String]>,
}

impl FieldPolicy {
    /// Build comparators, failing on the first unknown field name.
    pub fn from_lists(lists: &FieldLists<'_>) -> Result<Self> {
        fn build<T: FieldTable>(names: Option<&[String]>) -> Result<FieldComparator<T>> {
            names.map_or_else(|| Ok(FieldComparator::with_defaults()), FieldComparator::new)
        }
        Ok(Self {
            library: build(lists.library)?,
            component: build(lists.component)?,
            threat: build(lists.threat)?,
            security_requirement: build(lists.security_requirement)?,
            test_case: build(lists.test_case)?,
            property: build(lists.property)?,
        })
    }
}
