//! Graph element views: vertices and edges
//!
//! Both are property-bag documents; their graph accessors are derived
//! reads over reserved keys that live in the same bag as every other
//! field. Nothing here keeps independent state.

use crate::document::{Document, Entity, EntityHeader};
use crate::error::Result;
use crate::types::RecordId;
use crate::value::{FromValue, PropertyBag, Value};
use std::collections::BTreeSet;

/// Reserved bag key backing a derived accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedKey {
    /// Key in the property bag
    pub key: &'static str,
    /// Accessor reading it
    pub accessor: &'static str,
    /// Whether the key is re-emitted by `to_wire`
    pub serializable: bool,
}

/// Bag key carrying the record's class name
pub const CLASS_NAME_KEY: &str = "@OClassName";

/// Graph element capability layered over a [`Document`]
pub trait GraphElement: Entity {
    /// Declared type name, used as the label fallback
    const TYPE_NAME: &'static str;

    /// Class given to new elements
    const DEFAULT_CLASS: &'static str;

    fn document(&self) -> &Document;

    fn document_mut(&mut self) -> &mut Document;

    fn reserved_keys() -> &'static [ReservedKey];

    /// Class-name field, else the declared type name
    fn label(&self) -> String {
        match self.document().get::<String>(CLASS_NAME_KEY) {
            label if !label.is_empty() => label,
            _ => Self::TYPE_NAME.to_string(),
        }
    }

    fn get<T: FromValue + Default>(&self, key: &str) -> T
    where
        Self: Sized,
    {
        self.document().get(key)
    }

    fn set(&mut self, key: impl Into<String>, value: impl Into<Value>)
    where
        Self: Sized,
    {
        self.document_mut().set(key, value);
    }
}

const VERTEX_KEYS: &[ReservedKey] = &[
    ReservedKey {
        key: "in_",
        accessor: "incoming_edge_ids",
        serializable: true,
    },
    ReservedKey {
        key: "out_",
        accessor: "outgoing_edge_ids",
        serializable: true,
    },
];

const EDGE_KEYS: &[ReservedKey] = &[
    ReservedKey {
        key: "in",
        accessor: "from_vertex_id",
        serializable: false,
    },
    ReservedKey {
        key: "out",
        accessor: "to_vertex_id",
        serializable: false,
    },
    ReservedKey {
        key: CLASS_NAME_KEY,
        accessor: "label",
        serializable: false,
    },
];

fn non_serializable(keys: &'static [ReservedKey]) -> Vec<&'static str> {
    keys.iter().filter(|k| !k.serializable).map(|k| k.key).collect()
}

/// Graph vertex
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    doc: Document,
}

impl Vertex {
    pub fn new() -> Self {
        Vertex {
            doc: Document::with_class(Self::DEFAULT_CLASS),
        }
    }

    pub fn with_class(class_name: impl Into<String>) -> Self {
        Vertex {
            doc: Document::with_class(class_name),
        }
    }

    /// Ids of edges pointing at this vertex
    pub fn incoming_edge_ids(&self) -> BTreeSet<RecordId> {
        self.doc.get("in_")
    }

    /// Ids of edges leaving this vertex
    pub fn outgoing_edge_ids(&self) -> BTreeSet<RecordId> {
        self.doc.get("out_")
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphElement for Vertex {
    const TYPE_NAME: &'static str = "Vertex";
    const DEFAULT_CLASS: &'static str = "V";

    fn document(&self) -> &Document {
        &self.doc
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn reserved_keys() -> &'static [ReservedKey] {
        VERTEX_KEYS
    }
}

impl Entity for Vertex {
    fn header(&self) -> &EntityHeader {
        self.doc.header()
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        self.doc.header_mut()
    }

    fn hydrate(&mut self, bag: &PropertyBag) -> Result<()> {
        self.doc.merge(bag);
        Ok(())
    }

    fn to_wire(&self) -> PropertyBag {
        self.doc.wire_fields(&non_serializable(VERTEX_KEYS))
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }
}

/// Graph edge
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    doc: Document,
}

impl Edge {
    pub fn new() -> Self {
        Edge {
            doc: Document::with_class(Self::DEFAULT_CLASS),
        }
    }

    /// Edge of class `label`; the label is also recorded in the bag
    pub fn with_label(label: impl Into<String>) -> Self {
        let label = label.into();
        let mut doc = Document::with_class(label.clone());
        doc.set(CLASS_NAME_KEY, label);
        Edge { doc }
    }

    /// Vertex read from the `in` key
    pub fn from_vertex_id(&self) -> RecordId {
        self.doc.get("in")
    }

    /// Vertex read from the `out` key
    pub fn to_vertex_id(&self) -> RecordId {
        self.doc.get("out")
    }

    /// Record both endpoints in the bag
    pub(crate) fn bind(&mut self, from: RecordId, to: RecordId) {
        self.doc.set("in", from);
        self.doc.set("out", to);
    }
}

impl Default for Edge {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphElement for Edge {
    const TYPE_NAME: &'static str = "Edge";
    const DEFAULT_CLASS: &'static str = "E";

    fn document(&self) -> &Document {
        &self.doc
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn reserved_keys() -> &'static [ReservedKey] {
        EDGE_KEYS
    }
}

impl Entity for Edge {
    fn header(&self) -> &EntityHeader {
        self.doc.header()
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        self.doc.header_mut()
    }

    fn hydrate(&mut self, bag: &PropertyBag) -> Result<()> {
        self.doc.merge(bag);
        Ok(())
    }

    fn to_wire(&self) -> PropertyBag {
        self.doc.wire_fields(&non_serializable(EDGE_KEYS))
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }
}
