//! Typed entity hydration through a static descriptor table

use once_cell::sync::Lazy;
use orient_core::*;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq)]
struct Person {
    header: EntityHeader,
    name: String,
    age: i32,
    nicknames: Vec<String>,
    friends: BTreeSet<RecordId>,
    attributes: HashMap<String, Value>,
    manager: Option<RecordId>,
    address: Option<Document>,
}

impl Default for Person {
    fn default() -> Self {
        Person {
            header: EntityHeader::with_class("Person"),
            name: String::new(),
            age: 0,
            nicknames: Vec::new(),
            friends: BTreeSet::new(),
            attributes: HashMap::new(),
            manager: None,
            address: None,
        }
    }
}

static PERSON_MODEL: Lazy<EntityModel<Person>> = Lazy::new(|| {
    EntityModel::new("Person", "Person")
        .field(FieldDescriptor::new(
            "name",
            FieldShape::Primitive(PrimitiveKind::String),
            |p: &Person| Value::from(p.name.clone()),
            |p: &mut Person, v: Value| p.name = v.view_or_default(),
        ))
        .field(FieldDescriptor::new(
            "age",
            FieldShape::Primitive(PrimitiveKind::Int32),
            |p: &Person| Value::from(p.age),
            |p: &mut Person, v: Value| p.age = v.view_or_default(),
        ))
        .field(FieldDescriptor::new(
            "nicknames",
            FieldShape::List(PrimitiveKind::String),
            |p: &Person| Value::from(p.nicknames.clone()),
            |p: &mut Person, v: Value| p.nicknames = v.view_or_default(),
        ))
        .field(
            FieldDescriptor::new(
                "friends",
                FieldShape::Set(PrimitiveKind::Link),
                |p: &Person| Value::from(p.friends.clone()),
                |p: &mut Person, v: Value| p.friends = v.view_or_default(),
            )
            .with_alias("out_Knows"),
        )
        .field(FieldDescriptor::new(
            "attributes",
            FieldShape::Map,
            |p: &Person| Value::from(p.attributes.clone()),
            |p: &mut Person, v: Value| p.attributes = v.view_or_default(),
        ))
        .field(FieldDescriptor::new(
            "manager",
            FieldShape::Primitive(PrimitiveKind::Link),
            |p: &Person| Value::from(p.manager),
            |p: &mut Person, v: Value| p.manager = v.view_or_default(),
        ))
        .field(FieldDescriptor::new(
            "address",
            FieldShape::Unsupported,
            |_: &Person| Value::Null,
            |_: &mut Person, _: Value| {},
        ))
});

impl Modeled for Person {
    fn model() -> &'static EntityModel<Self> {
        &PERSON_MODEL
    }
}

impl Entity for Person {
    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }

    fn hydrate(&mut self, bag: &PropertyBag) -> Result<()> {
        hydrate_model(self, Self::model(), bag)
    }

    fn to_wire(&self) -> PropertyBag {
        model_to_wire(self, Self::model())
    }

    fn type_name(&self) -> &'static str {
        Self::model().type_name
    }
}

fn alice_record() -> Document {
    let json = serde_json::json!({
        "@rid": "#11:0",
        "@version": 3,
        "@class": "Person",
        "name": "Alice",
        "age": "34",
        "nicknames": ["Al", "Ali"],
        "out_Knows": ["#11:1", "#11:2", "#11:1"],
        "attributes": { "team": "storage", "remote": true },
        "manager": "#11:9",
        "address": { "city": "Lyon" },
        "shoe_size": 41
    });
    JsonRecordSerializer::new().deserialize_record(&json).unwrap()
}

#[test]
fn test_materialize_typed_entity() {
    let person: Person = materialize(&alice_record()).unwrap();

    assert_eq!(person.record_id(), RecordId::new(11, 0));
    assert_eq!(person.version(), 3);
    assert_eq!(person.class_name(), "Person");
    assert_eq!(person.name, "Alice");
    assert_eq!(person.age, 34);
    assert_eq!(person.nicknames, vec!["Al".to_string(), "Ali".to_string()]);
    assert_eq!(
        person.friends,
        [RecordId::new(11, 1), RecordId::new(11, 2)].into_iter().collect()
    );
    assert_eq!(person.attributes.get("team"), Some(&Value::from("storage")));
    assert_eq!(person.attributes.get("remote"), Some(&Value::Bool(true)));
    assert_eq!(person.manager, Some(RecordId::new(11, 9)));
    // Unsupported shape is skipped
    assert_eq!(person.address, None);
}

#[test]
fn test_hydration_is_idempotent() {
    let record = alice_record();
    let mut person: Person = materialize(&record).unwrap();
    let first = person.clone();

    person.hydrate(record.fields()).unwrap();
    assert_eq!(person, first);
}

#[test]
fn test_unknown_and_metadata_keys_ignored() {
    let mut bag = PropertyBag::new();
    bag.insert("shoe_size", Value::Int(41));
    bag.insert(CLASS_NAME_KEY, Value::from("Person"));

    let mut person = Person::default();
    person.hydrate(&bag).unwrap();
    assert_eq!(person, Person::default());
}

#[test]
fn test_mismatch_is_atomic() {
    let mut person: Person = materialize(&alice_record()).unwrap();
    let before = person.clone();

    let bag: PropertyBag = vec![
        ("name", Value::from("Mallory")),
        ("age", Value::from("not a number")),
    ]
    .into_iter()
    .collect();

    match person.hydrate(&bag) {
        Err(OrientError::HydrationTypeMismatch { key, .. }) => assert_eq!(key, "age"),
        other => panic!("expected a type mismatch, got {:?}", other),
    }
    assert_eq!(person, before);
}

#[test]
fn test_out_of_range_int_is_mismatch() {
    let mut person: Person = materialize(&alice_record()).unwrap();
    let bag: PropertyBag = vec![("name", Value::from("Al")), ("age", Value::Int(5_000_000_000))]
        .into_iter()
        .collect();

    match person.hydrate(&bag) {
        Err(OrientError::HydrationTypeMismatch { key, expected, actual }) => {
            assert_eq!(key, "age");
            assert_eq!(expected, "Int32");
            assert_eq!(actual, "Int");
        }
        other => panic!("expected a type mismatch, got {:?}", other),
    }
    assert_eq!(person.age, 34);
    assert_eq!(person.name, "Alice");
}

#[test]
fn test_collection_into_primitive_is_mismatch() {
    let bag: PropertyBag = vec![("name", Value::from(vec!["a", "b"]))].into_iter().collect();
    let err = Person::default().hydrate(&bag).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HydrationTypeMismatch);
}

#[test]
fn test_null_clears_field() {
    let mut person: Person = materialize(&alice_record()).unwrap();
    let bag: PropertyBag = vec![("manager", Value::Null), ("nicknames", Value::Null)]
        .into_iter()
        .collect();

    person.hydrate(&bag).unwrap();
    assert_eq!(person.manager, None);
    assert!(person.nicknames.is_empty());
    assert_eq!(person.name, "Alice");
}

#[test]
fn test_to_wire_uses_aliases() {
    let person: Person = materialize(&alice_record()).unwrap();
    let wire = person.to_wire();

    assert!(wire.contains_key("out_Knows"));
    assert!(!wire.contains_key("friends"));
    assert_eq!(wire.get("age"), Some(&Value::Int(34)));

    let json = JsonRecordSerializer::new().serialize(&person).unwrap();
    assert_eq!(json["@rid"], "#11:0");
    assert_eq!(json["name"], "Alice");
}

#[test]
fn test_typed_query_results() {
    let serializer = JsonRecordSerializer::new();
    let records = serializer
        .deserialize_result_set(
            r##"{"result": [
                {"@rid": "#11:0", "@class": "Person", "name": "Alice", "age": 34},
                {"@rid": "#11:1", "@class": "Person", "name": "Bob", "age": 29.0}
            ]}"##,
        )
        .unwrap();

    let people: Vec<Person> = records.iter().map(|r| materialize::<Person>(r)).collect::<Result<_>>().unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(people[1].name, "Bob");
    assert_eq!(people[1].age, 29);
}
