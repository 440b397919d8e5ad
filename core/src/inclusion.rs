//! Allow-list field filtering for outgoing payloads.
//!
//! An `InclusionPolicy` is an ordered list of `(EntityType, allowed fields)`
//! entries. Applying it to a serialized tree keeps a field only when the type
//! that declares it has an entry naming that field. Types without an entry
//! contribute no fields at all. One policy can name a root type and any
//! number of nested types, so a single pass filters e.g. a loan account and
//! its embedded disbursement details together. A kept field holding objects
//! whose type the registry does not know is treated as a type without an
//! entry: its objects are emptied.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::registry::{EntityType, Registry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionPolicy {
    entries: Vec<(EntityType, BTreeSet<String>)>,
}

impl InclusionPolicy {
    /// Policy for a primary type and its allowed fields.
    pub fn new<I, S>(entity: EntityType, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().and(entity, fields)
    }

    /// Add (or extend) the allowed fields of another type.
    pub fn and<I, S>(mut self, entity: EntityType, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields.into_iter().map(Into::into);
        match self.entries.iter_mut().find(|(e, _)| *e == entity) {
            Some((_, allowed)) => allowed.extend(fields),
            None => self.entries.push((entity, fields.collect())),
        }
        self
    }

    pub fn should_include(&self, declaring: EntityType, field: &str) -> bool {
        self.entries
            .iter()
            .find(|(e, _)| *e == declaring)
            .is_some_and(|(_, allowed)| allowed.contains(field))
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityType> + '_ {
        self.entries.iter().map(|(e, _)| *e)
    }

    /// Filter `tree`, an object of type `root`, using the registry to find the
    /// declaring type of nested objects. Non-object roots pass through as-is.
    pub fn apply(&self, tree: Value, root: EntityType, registry: &Registry) -> Value {
        match tree {
            Value::Object(map) => Value::Object(self.filter_object(map, root, registry)),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.apply(item, root, registry))
                    .collect(),
            ),
            other => other,
        }
    }

    fn filter_object(
        &self,
        map: Map<String, Value>,
        declaring: EntityType,
        registry: &Registry,
    ) -> Map<String, Value> {
        map.into_iter()
            .filter(|(field, _)| self.should_include(declaring, field))
            .map(|(field, value)| {
                let value = match registry.nested_type(declaring, &field) {
                    Some(nested) => self.apply(value, nested, registry),
                    None => empty_objects(value),
                };
                (field, value)
            })
            .collect()
    }
}

fn empty_objects(value: Value) -> Value {
    match value {
        Value::Object(_) => Value::Object(Map::new()),
        Value::Array(items) => Value::Array(items.into_iter().map(empty_objects).collect()),
        other => other,
    }
}
