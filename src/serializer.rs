//! Record serializer boundary and the JSON record format
//!
//! A serializer turns entities into wire data and wire data into raw
//! [`Document`]s; typed entities are then produced by hydration.

use crate::document::{materialize, Document, Entity, EntityHeader};
use crate::error::{OrientError, Result};
use crate::graph::CLASS_NAME_KEY;
use crate::types::{RecordFormat, RecordId};
use crate::value::{PropertyBag, Value};
use serde_json::{Map, Value as Json};

/// Converts between entities and a wire representation
pub trait RecordSerializer: Send + Sync {
    type Data;

    fn record_format(&self) -> RecordFormat;

    fn serialize(&self, entity: &dyn Entity) -> Result<Self::Data>;

    /// Header and raw property bag of one record
    fn deserialize_record(&self, data: &Self::Data) -> Result<Document>;

    fn deserialize<T: Entity + Default>(&self, data: &Self::Data) -> Result<T>
    where
        Self: Sized,
    {
        materialize(&self.deserialize_record(data)?)
    }
}

const RID_KEY: &str = "@rid";
const VERSION_KEY: &str = "@version";
const CLASS_KEY: &str = "@class";

/// JSON records in the server's REST shape:
/// `{"@rid": "#12:0", "@version": 1, "@class": "Person", "name": ...}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordSerializer;

impl JsonRecordSerializer {
    pub fn new() -> Self {
        JsonRecordSerializer
    }

    /// Records of a result set, given either as an array or as
    /// `{"result": [...]}`
    pub fn deserialize_result_set(&self, text: &str) -> Result<Vec<Document>> {
        let json: Json = serde_json::from_str(text)?;
        let records = match &json {
            Json::Array(items) => items,
            Json::Object(object) => match object.get("result") {
                Some(Json::Array(items)) => items,
                _ => {
                    return Err(OrientError::Serialization(
                        "expected a \"result\" array".to_string(),
                    ))
                }
            },
            other => {
                return Err(OrientError::Serialization(format!(
                    "expected a result set, got {}",
                    json_type(other)
                )))
            }
        };

        records.iter().map(|r| self.deserialize_record(r)).collect()
    }

    pub fn serialize_to_string(&self, entity: &dyn Entity) -> Result<String> {
        Ok(serde_json::to_string(&self.serialize(entity)?)?)
    }
}

fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

impl RecordSerializer for JsonRecordSerializer {
    type Data = Json;

    fn record_format(&self) -> RecordFormat {
        RecordFormat::Json
    }

    fn serialize(&self, entity: &dyn Entity) -> Result<Json> {
        let header = entity.header();
        let mut object = Map::new();

        if !header.record_id.is_unset() {
            object.insert(RID_KEY.to_string(), Json::String(header.record_id.to_string()));
        }
        object.insert(VERSION_KEY.to_string(), Json::from(header.version));
        if !header.class_name.is_empty() {
            object.insert(CLASS_KEY.to_string(), Json::String(header.class_name.clone()));
        }

        for (key, value) in entity.to_wire().iter() {
            object.insert(key.to_string(), value.to_json());
        }

        Ok(Json::Object(object))
    }

    fn deserialize_record(&self, data: &Json) -> Result<Document> {
        let object = data.as_object().ok_or_else(|| {
            OrientError::Serialization(format!("expected a record object, got {}", json_type(data)))
        })?;

        let mut header = EntityHeader::default();
        let mut fields = PropertyBag::new();

        for (key, value) in object {
            match key.as_str() {
                RID_KEY => {
                    let text = value.as_str().ok_or_else(|| {
                        OrientError::Serialization(format!("{} must be a string", RID_KEY))
                    })?;
                    header.record_id = RecordId::parse(text)?;
                }
                VERSION_KEY => {
                    header.version = value
                        .as_i64()
                        .and_then(|v| i32::try_from(v).ok())
                        .ok_or_else(|| {
                            OrientError::Serialization(format!("{} must be a 32-bit integer", VERSION_KEY))
                        })?;
                }
                CLASS_KEY => {
                    let class_name = value.as_str().ok_or_else(|| {
                        OrientError::Serialization(format!("{} must be a string", CLASS_KEY))
                    })?;
                    header.class_name = class_name.to_string();
                    fields.insert(CLASS_NAME_KEY, Value::from(class_name));
                }
                // @type, @fieldTypes and other server metadata
                k if k.starts_with('@') => continue,
                _ => {
                    fields.insert(key.clone(), Value::from_json(value.clone()));
                }
            }
        }

        Ok(Document::from_parts(header, fields))
    }
}
