//! Dynamic field values and the ordered property bag

use crate::types::RecordId;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// Field value as received from (or sent to) the server
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Link(RecordId),
    List(Vec<Value>),
    Map(PropertyBag),
}

/// Scalar kinds a declared field can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    /// 16-bit integer; wider values do not convert
    Int16,
    /// 32-bit integer; wider values do not convert
    Int32,
    Int,
    Float,
    String,
    DateTime,
    Link,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "Bool",
            PrimitiveKind::Int16 => "Int16",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::Int => "Int",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::String => "String",
            PrimitiveKind::DateTime => "DateTime",
            PrimitiveKind::Link => "Link",
        }
    }
}

impl Value {
    /// Variant name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::DateTime(_) => "DateTime",
            Value::Link(_) => "Link",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Scalar values that [`Value::coerce`] can convert between kinds
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::String(_)
                | Value::DateTime(_)
                | Value::Link(_)
        )
    }

    /// Convert a scalar into `kind`, the way a wire value is changed into a
    /// declared field type. Returns `None` for incompatible kinds.
    pub fn coerce(&self, kind: PrimitiveKind) -> Option<Value> {
        match kind {
            PrimitiveKind::Bool => match self {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::Int(i) => Some(Value::Bool(*i != 0)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(Value::Bool(true)),
                    "false" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            PrimitiveKind::Int16 => self
                .coerce(PrimitiveKind::Int)
                .filter(|v| matches!(v, Value::Int(i) if i16::try_from(*i).is_ok())),
            PrimitiveKind::Int32 => self
                .coerce(PrimitiveKind::Int)
                .filter(|v| matches!(v, Value::Int(i) if i32::try_from(*i).is_ok())),
            PrimitiveKind::Int => match self {
                Value::Int(i) => Some(Value::Int(*i)),
                Value::Bool(b) => Some(Value::Int(i64::from(*b))),
                Value::Float(f) => {
                    // Halves go to the even neighbour
                    let rounded = f.round_ties_even();
                    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded <= i64::MAX as f64 {
                        Some(Value::Int(rounded as i64))
                    } else {
                        None
                    }
                }
                Value::String(s) => s.trim().parse::<i64>().ok().map(Value::Int),
                _ => None,
            },
            PrimitiveKind::Float => match self {
                Value::Float(f) => Some(Value::Float(*f)),
                Value::Int(i) => Some(Value::Float(*i as f64)),
                Value::Bool(b) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
                Value::String(s) => s.trim().parse::<f64>().ok().map(Value::Float),
                _ => None,
            },
            PrimitiveKind::String => match self {
                Value::String(s) => Some(Value::String(s.clone())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                Value::Int(i) => Some(Value::String(i.to_string())),
                Value::Float(f) => Some(Value::String(f.to_string())),
                Value::DateTime(dt) => Some(Value::String(dt.to_rfc3339())),
                Value::Link(rid) => Some(Value::String(rid.to_string())),
                _ => None,
            },
            PrimitiveKind::DateTime => match self {
                Value::DateTime(dt) => Some(Value::DateTime(*dt)),
                Value::Int(millis) => Utc.timestamp_millis_opt(*millis).single().map(Value::DateTime),
                Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                    .ok()
                    .map(|dt| Value::DateTime(dt.with_timezone(&Utc))),
                _ => None,
            },
            PrimitiveKind::Link => match self {
                Value::Link(rid) => Some(Value::Link(*rid)),
                Value::String(s) => RecordId::parse(s.trim()).ok().map(Value::Link),
                _ => None,
            },
        }
    }

    /// View this value as `T`, falling back to `T::default()`
    pub fn view_or_default<T: FromValue + Default>(&self) -> T {
        T::view(self).unwrap_or_default()
    }

    /// Build from JSON. Integers that do not fit `i64` become floats.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// JSON form. Links and timestamps are written as their text forms.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::Link(rid) => serde_json::Value::String(rid.to_string()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(bag) => serde_json::Value::Object(
                bag.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}

/// Ordered string-keyed mapping of field values.
///
/// Keeps the insertion order of first-seen keys; overwriting a key keeps
/// its original position.
#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Insert or overwrite. Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let i = self.index.remove(key)?;
        let (_, value) = self.entries.remove(i);
        for (k, _) in &self.entries[i..] {
            if let Some(slot) = self.index.get_mut(k) {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Overwrite-or-insert every entry of `other`, in its order
    pub fn merge(&mut self, other: &PropertyBag) {
        for (k, v) in other.iter() {
            self.insert(k, v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl PartialEq for PropertyBag {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for PropertyBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for PropertyBag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Map(bag) => Ok(bag),
            other => Err(serde::de::Error::custom(format!(
                "expected a map, got {}",
                other.type_name()
            ))),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut bag = PropertyBag::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}

impl IntoIterator for PropertyBag {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Typed read access to a [`Value`].
///
/// `view` never performs lossy conversions; it returns `None` when the
/// stored value is not of the requested shape.
pub trait FromValue: Sized {
    fn view(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn view(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromValue for i32 {
    fn view(value: &Value) -> Option<Self> {
        i64::view(value).and_then(|i| i32::try_from(i).ok())
    }
}

impl FromValue for i16 {
    fn view(value: &Value) -> Option<Self> {
        i64::view(value).and_then(|i| i16::try_from(i).ok())
    }
}

impl FromValue for f64 {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

// Links arrive either typed or as their `#c:p` text.
impl FromValue for RecordId {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::Link(rid) => Some(*rid),
            Value::String(s) => RecordId::parse(s).ok(),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::view(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::view).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::view).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue + Eq + Hash> FromValue for HashSet<T> {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::view).collect(),
            _ => None,
        }
    }
}

impl FromValue for PropertyBag {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::Map(bag) => Some(bag.clone()),
            _ => None,
        }
    }
}

impl FromValue for HashMap<String, Value> {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::Map(bag) => Some(bag.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()),
            _ => None,
        }
    }
}

impl FromValue for BTreeMap<String, Value> {
    fn view(value: &Value) -> Option<Self> {
        match value {
            Value::Map(bag) => Some(bag.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<RecordId> for Value {
    fn from(v: RecordId) -> Self {
        Value::Link(v)
    }
}

impl From<PropertyBag> for Value {
    fn from(v: PropertyBag) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(v: BTreeSet<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Value::Map(v.into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v.into_iter().collect())
    }
}
