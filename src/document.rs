//! Entities and the property-bag document
//!
//! Every record carries an [`EntityHeader`] (identity, version, class).
//! [`Document`] is the schemaless entity: its fields live in an ordered
//! [`PropertyBag`] and absorb whatever keys the server returns.

use crate::error::Result;
use crate::types::RecordId;
use crate::value::{FromValue, PropertyBag, Value};
use serde::{Deserialize, Serialize};

/// Identity and class metadata shared by all entities
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityHeader {
    pub record_id: RecordId,
    pub version: i32,
    pub class_id: i16,
    pub class_name: String,
}

impl EntityHeader {
    pub fn with_class(class_name: impl Into<String>) -> Self {
        EntityHeader {
            class_name: class_name.into(),
            ..Self::default()
        }
    }
}

/// Capability set of anything that maps to a server record
pub trait Entity {
    fn header(&self) -> &EntityHeader;

    fn header_mut(&mut self) -> &mut EntityHeader;

    /// Populate this entity from a wire property bag
    fn hydrate(&mut self, bag: &PropertyBag) -> Result<()>;

    /// Properties to send back to the server
    fn to_wire(&self) -> PropertyBag;

    /// Name of the concrete entity type
    fn type_name(&self) -> &'static str;

    fn record_id(&self) -> RecordId {
        self.header().record_id
    }

    fn version(&self) -> i32 {
        self.header().version
    }

    fn class_name(&self) -> &str {
        &self.header().class_name
    }

    /// Current id, allocating a temporary one if the entity has none
    fn ensure_record_id(&mut self) -> RecordId {
        let header = self.header_mut();
        if header.record_id.is_unset() {
            header.record_id = RecordId::new_temporary();
        }
        header.record_id
    }

    /// Header plus wire properties, detached from the concrete type
    fn snapshot(&self) -> Document {
        Document::from_parts(self.header().clone(), self.to_wire())
    }
}

/// Turn a raw record into a typed entity: copy the header, then hydrate.
pub fn materialize<T: Entity + Default>(record: &Document) -> Result<T> {
    let mut entity = T::default();
    let class_name = record.header().class_name.clone();
    {
        let header = entity.header_mut();
        header.record_id = record.header().record_id;
        header.version = record.header().version;
        header.class_id = record.header().class_id;
        // Keep the type's default class when the record carries none
        if !class_name.is_empty() {
            header.class_name = class_name;
        }
    }
    entity.hydrate(record.fields())?;
    Ok(entity)
}

/// Property-bag entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    header: EntityHeader,
    fields: PropertyBag,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(class_name: impl Into<String>) -> Self {
        Document {
            header: EntityHeader::with_class(class_name),
            fields: PropertyBag::new(),
        }
    }

    pub fn from_parts(header: EntityHeader, fields: PropertyBag) -> Self {
        Document { header, fields }
    }

    pub fn fields(&self) -> &PropertyBag {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut PropertyBag {
        &mut self.fields
    }

    /// Field value viewed as `T`; missing or mismatched yields the default
    pub fn get<T: FromValue + Default>(&self, key: &str) -> T {
        self.fields
            .get(key)
            .map(|v| v.view_or_default::<T>())
            .unwrap_or_default()
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Insert or overwrite a field
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key, value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Bulk overwrite-or-insert. Applying the same bag twice is a no-op
    /// the second time.
    pub fn merge(&mut self, bag: &PropertyBag) {
        self.fields.merge(bag);
    }

    /// Bag without `@`-prefixed metadata keys, minus `excluded`
    pub(crate) fn wire_fields(&self, excluded: &[&str]) -> PropertyBag {
        self.fields
            .iter()
            .filter(|(k, _)| !k.starts_with('@') && !excluded.contains(k))
            .map(|(k, v)| (k, v.clone()))
            .collect()
    }
}

impl Entity for Document {
    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }

    fn hydrate(&mut self, bag: &PropertyBag) -> Result<()> {
        self.merge(bag);
        Ok(())
    }

    fn to_wire(&self) -> PropertyBag {
        self.wire_fields(&[])
    }

    fn type_name(&self) -> &'static str {
        "Document"
    }
}
