//! Post-serialization rewrites that give a payload the exact shape an
//! endpoint expects.
//!
//! Every adjustment is total: when the field it targets is missing, or does
//! not have the expected JSON type, the tree is returned unchanged. Applying
//! a field adjustment a second time is a no-op. `Envelope` always adds a
//! level, so `unwrap_envelope` recovers exactly the tree it wrapped; a spec
//! lists it once. Adjustments only touch the fields they name, so their
//! order relative to each other does not matter unless two of them name the
//! same field.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustment {
    /// Move scalars out of a nested object onto the root, renaming each
    /// `(from, to)`. The nested object is removed once it is empty.
    Promote {
        container: String,
        fields: Vec<(String, String)>,
    },
    /// Replace an embedded object with the value of its `id_key`, stored at
    /// the root under `target`.
    ReplaceWithId {
        field: String,
        id_key: String,
        target: String,
    },
    /// Turn an array of scalars into a comma-joined string; drop the field
    /// when the result is empty. Empty strings, nulls and nested values are
    /// skipped, so `["", "a"]` joins to `"a"` and `[null]` drops the field.
    JoinArray { field: String },
    /// Nest the whole payload under a single root key.
    Envelope { key: String },
    /// Rebuild the object under `from` as a new object under `to`, copying
    /// only `fields`.
    RebuildNested {
        from: String,
        to: String,
        fields: Vec<String>,
    },
}

impl Adjustment {
    pub fn promote<I, A, B>(container: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Adjustment::Promote {
            container: container.into(),
            fields: fields
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        }
    }

    pub fn replace_with_id(
        field: impl Into<String>,
        id_key: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Adjustment::ReplaceWithId {
            field: field.into(),
            id_key: id_key.into(),
            target: target.into(),
        }
    }

    pub fn join_array(field: impl Into<String>) -> Self {
        Adjustment::JoinArray {
            field: field.into(),
        }
    }

    pub fn envelope(key: impl Into<String>) -> Self {
        Adjustment::Envelope { key: key.into() }
    }

    pub fn rebuild_nested<I, S>(from: impl Into<String>, to: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Adjustment::RebuildNested {
            from: from.into(),
            to: to.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Adjustment::Promote { .. } => "promote",
            Adjustment::ReplaceWithId { .. } => "replace-with-id",
            Adjustment::JoinArray { .. } => "join-array",
            Adjustment::Envelope { .. } => "envelope",
            Adjustment::RebuildNested { .. } => "rebuild-nested",
        }
    }

    pub fn apply(&self, tree: Value) -> Value {
        match self {
            Adjustment::Envelope { key } => wrap(tree, key),
            _ => match tree {
                Value::Object(mut root) => {
                    self.rewrite_root(&mut root);
                    Value::Object(root)
                }
                other => other,
            },
        }
    }

    fn rewrite_root(&self, root: &mut Map<String, Value>) {
        match self {
            Adjustment::Promote { container, fields } => promote(root, container, fields),
            Adjustment::ReplaceWithId {
                field,
                id_key,
                target,
            } => replace_with_id(root, field, id_key, target),
            Adjustment::JoinArray { field } => join_array(root, field),
            Adjustment::RebuildNested { from, to, fields } => {
                rebuild_nested(root, from, to, fields)
            }
            Adjustment::Envelope { .. } => {}
        }
    }
}

/// Apply `adjustments` in order.
pub fn apply_all(adjustments: &[Adjustment], tree: Value) -> Value {
    adjustments
        .iter()
        .fold(tree, |tree, adjustment| adjustment.apply(tree))
}

/// Recover the payload nested under `key` by an envelope adjustment.
pub fn unwrap_envelope(tree: Value, key: &str) -> Option<Value> {
    match tree {
        Value::Object(mut map) if map.len() == 1 => map.remove(key),
        _ => None,
    }
}

fn promote(root: &mut Map<String, Value>, container: &str, fields: &[(String, String)]) {
    let Some(Value::Object(nested)) = root.get_mut(container) else {
        return;
    };
    let mut promoted = Vec::new();
    for (from, to) in fields {
        if let Some(value) = nested.remove(from) {
            promoted.push((to.clone(), value));
        }
    }
    if nested.is_empty() {
        root.remove(container);
    }
    root.extend(promoted);
}

fn replace_with_id(root: &mut Map<String, Value>, field: &str, id_key: &str, target: &str) {
    let Some(Value::Object(reference)) = root.get(field) else {
        return;
    };
    let id = reference.get(id_key).filter(|v| is_scalar(v)).cloned();
    root.remove(field);
    if let Some(id) = id {
        root.insert(target.to_string(), id);
    }
}

fn join_array(root: &mut Map<String, Value>, field: &str) {
    let Some(Value::Array(items)) = root.get(field) else {
        return;
    };
    let joined = items
        .iter()
        .filter_map(scalar_text)
        .collect::<Vec<_>>()
        .join(",");
    if joined.is_empty() {
        root.remove(field);
    } else {
        root.insert(field.to_string(), Value::String(joined));
    }
}

fn rebuild_nested(root: &mut Map<String, Value>, from: &str, to: &str, fields: &[String]) {
    let Some(Value::Object(source)) = root.remove(from) else {
        return;
    };
    let rebuilt: Map<String, Value> = fields
        .iter()
        .filter_map(|name| source.get(name).map(|v| (name.clone(), v.clone())))
        .collect();
    root.insert(to.to_string(), Value::Object(rebuilt));
}

fn wrap(tree: Value, key: &str) -> Value {
    let mut envelope = Map::new();
    envelope.insert(key.to_string(), tree);
    Value::Object(envelope)
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
