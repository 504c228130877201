//! Hydration of statically declared entity types
//!
//! A typed entity describes its fields once, in an [`EntityModel`] built at
//! startup (usually behind a `Lazy`). Each [`FieldDescriptor`] names the
//! wire key, the declared [`FieldShape`] and plain function pointers that
//! read and write the Rust field. [`hydrate_model`] walks an incoming
//! property bag against that table; [`model_to_wire`] goes the other way.
//!
//! Hydration is atomic: every value is converted before the first setter
//! runs, so a type mismatch leaves the entity untouched.

use crate::document::Entity;
use crate::error::{OrientError, Result};
use crate::types::RecordId;
use crate::value::{PrimitiveKind, PropertyBag, Value};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::trace;

/// Declared shape of an entity field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Primitive(PrimitiveKind),
    List(PrimitiveKind),
    Set(PrimitiveKind),
    /// String-keyed mapping, values copied verbatim
    Map,
    /// Nested object graphs and other shapes hydration does not handle
    Unsupported,
}

impl FieldShape {
    /// Type name for error messages
    pub fn name(&self) -> String {
        match self {
            FieldShape::Primitive(kind) => kind.name().to_string(),
            FieldShape::List(kind) => format!("List<{}>", kind.name()),
            FieldShape::Set(kind) => format!("Set<{}>", kind.name()),
            FieldShape::Map => "Map<String, Value>".to_string(),
            FieldShape::Unsupported => "Unsupported".to_string(),
        }
    }

    /// Convert an incoming wire value into this shape.
    ///
    /// `Ok(None)` means the key is skipped.
    fn convert(&self, key: &str, value: &Value) -> Result<Option<Value>> {
        if value.is_null() {
            return Ok(Some(Value::Null));
        }

        let mismatch = || OrientError::type_mismatch(key, self.name(), value.type_name());

        match self {
            FieldShape::Primitive(kind) => {
                if !value.is_primitive() {
                    return Err(mismatch());
                }
                value.coerce(*kind).map(Some).ok_or_else(mismatch)
            }
            FieldShape::List(kind) | FieldShape::Set(kind) => {
                let items = match value {
                    Value::List(items) => items,
                    _ => return Err(mismatch()),
                };

                let dedupe = matches!(self, FieldShape::Set(_));
                let mut seen: HashSet<SetKey> = HashSet::new();
                let mut converted: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    let element = item.coerce(*kind).ok_or_else(|| {
                        OrientError::type_mismatch(key, self.name(), format!("List<{}>", item.type_name()))
                    })?;
                    if dedupe {
                        if let Some(set_key) = SetKey::of(&element) {
                            if !seen.insert(set_key) {
                                continue;
                            }
                        }
                    }
                    converted.push(element);
                }
                Ok(Some(Value::List(converted)))
            }
            FieldShape::Map => match value {
                Value::Map(bag) => Ok(Some(Value::Map(bag.clone()))),
                _ => Err(mismatch()),
            },
            FieldShape::Unsupported => Ok(None),
        }
    }
}

/// Hashable identity of a coerced set element
#[derive(PartialEq, Eq, Hash)]
enum SetKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    String(String),
    DateTime(DateTime<Utc>),
    Link(RecordId),
}

impl SetKey {
    fn of(value: &Value) -> Option<SetKey> {
        match value {
            Value::Bool(b) => Some(SetKey::Bool(*b)),
            Value::Int(i) => Some(SetKey::Int(*i)),
            // -0.0 and 0.0 are the same element
            Value::Float(f) if *f == 0.0 => Some(SetKey::Float(0.0f64.to_bits())),
            Value::Float(f) => Some(SetKey::Float(f.to_bits())),
            Value::String(s) => Some(SetKey::String(s.clone())),
            Value::DateTime(dt) => Some(SetKey::DateTime(*dt)),
            Value::Link(rid) => Some(SetKey::Link(*rid)),
            _ => None,
        }
    }
}

/// Field metadata for one declared property of `T`
pub struct FieldDescriptor<T> {
    pub name: &'static str,
    /// Wire key when it differs from `name`
    pub alias: Option<&'static str>,
    pub shape: FieldShape,
    pub serializable: bool,
    pub deserializable: bool,
    getter: fn(&T) -> Value,
    setter: Option<fn(&mut T, Value)>,
}

impl<T> FieldDescriptor<T> {
    /// Writable field. The setter receives a value already converted to
    /// `shape` (or `Value::Null`). Fields narrower than `i64` declare
    /// `Int32`/`Int16` so out-of-range input fails conversion.
    pub fn new(
        name: &'static str,
        shape: FieldShape,
        getter: fn(&T) -> Value,
        setter: fn(&mut T, Value),
    ) -> Self {
        FieldDescriptor {
            name,
            alias: None,
            shape,
            serializable: true,
            deserializable: true,
            getter,
            setter: Some(setter),
        }
    }

    /// Field with no setter; hydration never writes it
    pub fn read_only(name: &'static str, shape: FieldShape, getter: fn(&T) -> Value) -> Self {
        FieldDescriptor {
            name,
            alias: None,
            shape,
            serializable: true,
            deserializable: true,
            getter,
            setter: None,
        }
    }

    pub fn with_alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn skip_serializing(mut self) -> Self {
        self.serializable = false;
        self
    }

    pub fn skip_deserializing(mut self) -> Self {
        self.deserializable = false;
        self
    }

    /// Key used on the wire
    pub fn wire_key(&self) -> &'static str {
        self.alias.unwrap_or(self.name)
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some() && self.deserializable
    }

    pub fn read(&self, entity: &T) -> Value {
        (self.getter)(entity)
    }
}

/// Descriptor table of one entity type
pub struct EntityModel<T> {
    pub type_name: &'static str,
    pub class_name: &'static str,
    pub fields: Vec<FieldDescriptor<T>>,
}

impl<T> EntityModel<T> {
    pub fn new(type_name: &'static str, class_name: &'static str) -> Self {
        EntityModel {
            type_name,
            class_name,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDescriptor<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Descriptor whose wire key is `key`
    pub fn get_field(&self, key: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|f| f.wire_key() == key)
    }
}

/// Typed entity with a static descriptor table
pub trait Modeled: Entity + Sized + 'static {
    fn model() -> &'static EntityModel<Self>;
}

/// Populate `entity` from `bag` using `model`.
///
/// Unknown keys and unsupported shapes are skipped. The first conversion
/// failure aborts before anything is written.
pub fn hydrate_model<T>(entity: &mut T, model: &EntityModel<T>, bag: &PropertyBag) -> Result<()> {
    let mut assignments: Vec<(&FieldDescriptor<T>, Value)> = Vec::new();

    for (key, value) in bag.iter() {
        let field = match model.get_field(key) {
            Some(field) if field.is_writable() => field,
            _ => {
                trace!(entity = model.type_name, key, "Ignoring undeclared or read-only key");
                continue;
            }
        };

        match field.shape.convert(key, value)? {
            Some(converted) => assignments.push((field, converted)),
            None => trace!(entity = model.type_name, key, "Skipping field with unsupported shape"),
        }
    }

    for (field, value) in assignments {
        if let Some(setter) = field.setter {
            setter(entity, value);
        }
    }

    Ok(())
}

/// Serializable fields of `entity` keyed by their wire names
pub fn model_to_wire<T>(entity: &T, model: &EntityModel<T>) -> PropertyBag {
    model
        .fields
        .iter()
        .filter(|f| f.serializable)
        .map(|f| (f.wire_key(), f.read(entity)))
        .collect()
}
