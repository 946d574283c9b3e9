//! End-to-end scenarios through model types.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use crate::model::{Model, Polymorphic, RegistryCell, Schema, SchemaCell, Subtype, SubtypeRegistry};
use crate::property::{
    Datetime, Enumeration, Float, Integer, LinkByUid, LinkOr, LinkOrElse, List, Mapping, Object,
    Optional, Raw, Set, SpecifiedMixedList, Str, Uuid,
};
use crate::{Datum, Member, PropertyError};

// -----------------------------------------------------------------------------
// Descriptors

#[derive(Debug, Clone, Default, PartialEq)]
struct RealDescriptor {
    key: String,
    lower_bound: f64,
    upper_bound: f64,
    units: Option<String>,
}

impl Model for RealDescriptor {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<RealDescriptor> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::builder("RealDescriptor")
                .constant("type", Str::new(), "Real")
                .field("key", Str::at("descriptor_key"), |m| &m.key, |m| &mut m.key)
                .field("lower_bound", Float::new(), |m| &m.lower_bound, |m| &mut m.lower_bound)
                .field("upper_bound", Float::new(), |m| &m.upper_bound, |m| &mut m.upper_bound)
                .field("units", Optional::new(Str::new()), |m| &m.units, |m| &mut m.units)
                .build()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct CategoricalDescriptor {
    key: String,
    categories: BTreeSet<String>,
}

impl Model for CategoricalDescriptor {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<CategoricalDescriptor> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::builder("CategoricalDescriptor")
                .constant("type", Str::new(), "Categorical")
                .field("key", Str::at("descriptor_key"), |m| &m.key, |m| &mut m.key)
                .field("categories", Set::new(Str::new()), |m| &m.categories, |m| &mut m.categories)
                .build()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Descriptor {
    Real(RealDescriptor),
    Categorical(CategoricalDescriptor),
}

impl Model for Descriptor {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<Descriptor> = SchemaCell::new();
        SCHEMA.get_or_init(|| Schema::polymorphic("Descriptor"))
    }
}

impl Polymorphic for Descriptor {
    fn registry() -> &'static SubtypeRegistry<Self> {
        static REGISTRY: RegistryCell<Descriptor> = RegistryCell::new();
        REGISTRY.get_or_init(|| {
            SubtypeRegistry::<Self>::new("Descriptor")
                .register(Subtype::of("Real", Descriptor::Real, |d| match d {
                    Descriptor::Real(real) => Some(real),
                    _ => None,
                }))
                .register(Subtype::of("Categorical", Descriptor::Categorical, |d| match d {
                    Descriptor::Categorical(cat) => Some(cat),
                    _ => None,
                }))
        })
    }
}

crate::model_datum!(RealDescriptor, CategoricalDescriptor, Descriptor);

#[derive(Debug, Clone, Default, PartialEq)]
struct Predictor {
    name: String,
    inputs: Vec<Descriptor>,
    output: Option<Descriptor>,
}

impl Model for Predictor {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<Predictor> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::builder("Predictor")
                .field("name", Str::at("config.name"), |m| &m.name, |m| &mut m.name)
                .field(
                    "inputs",
                    List::at("config.inputs", Object::<Descriptor>::new()),
                    |m| &m.inputs,
                    |m| &mut m.inputs,
                )
                .field(
                    "output",
                    Optional::at("config.output", Object::<Descriptor>::new()),
                    |m| &m.output,
                    |m| &mut m.output,
                )
                .build()
        })
    }
}

fn real(key: &str) -> RealDescriptor {
    RealDescriptor {
        key: key.into(),
        lower_bound: 0.0,
        upper_bound: 1.0,
        units: None,
    }
}

#[test]
fn polymorphic_dispatch_resolves_subtype() {
    let value = json!({ "type": "Real", "descriptor_key": "x", "lower_bound": 0, "upper_bound": 1 });

    assert_eq!(Descriptor::get_type(&value).unwrap().tag(), "Real");
    assert_eq!(Descriptor::get_type(&value).unwrap().class_name(), "RealDescriptor");

    let descriptor = Descriptor::build(&value).unwrap();
    assert_eq!(descriptor, Descriptor::Real(real("x")));
    assert_eq!(Descriptor::build(&descriptor.dump().unwrap()).unwrap(), descriptor);
}

#[test]
fn polymorphic_dispatch_rejects_unknown_tag() {
    let value = json!({ "type": "NoSuchType", "descriptor_key": "x" });
    let err = Descriptor::build(&value).unwrap_err();

    let PropertyError::UnrecognizedType { tag, valid, .. } = err.root() else {
        panic!("expected an unrecognized type, got {err:?}");
    };
    assert_eq!(tag, "NoSuchType");
    assert_eq!(valid, &["Real", "Categorical"]);
    assert!(err.to_string().contains("NoSuchType"));
}

#[test]
fn polymorphic_dispatch_needs_discriminator() {
    let err = Descriptor::build(&json!({ "descriptor_key": "x" })).unwrap_err();
    assert!(matches!(
        err.root(),
        PropertyError::MissingField { segment, .. } if segment == "type"
    ));
}

#[test]
fn duplicate_tags_are_ambiguous() {
    let registry = SubtypeRegistry::<Descriptor>::new("Descriptor")
        .register(Subtype::of("Real", Descriptor::Real, |_| None))
        .register(Subtype::of("Real", Descriptor::Categorical, |_| None));

    let err = registry.get_type(&json!({ "type": "Real" })).unwrap_err();
    assert!(matches!(err, PropertyError::AmbiguousType { .. }));
    assert!(registry.tags().is_empty());
}

#[test]
fn nested_polymorphic_objects() {
    let value = json!({
        "config": {
            "name": "p",
            "inputs": [
                { "type": "Real", "descriptor_key": "x", "lower_bound": 0.0, "upper_bound": 1.0, "units": null },
                { "type": "Categorical", "descriptor_key": "c", "categories": ["a", "b"] },
            ],
            "output": null,
        }
    });

    let predictor = Predictor::build(&value).unwrap();
    assert_eq!(predictor.inputs.len(), 2);
    assert!(matches!(predictor.inputs[1], Descriptor::Categorical(_)));
    assert_eq!(predictor.output, None);
    assert_eq!(predictor.dump().unwrap(), value);
}

#[test]
fn subtype_objects_are_upcast_on_assignment() {
    let schema = Predictor::schema();
    let mut predictor = Predictor::default();

    schema
        .set_value(&mut predictor, "output", Datum::object(real("y")))
        .unwrap();
    assert_eq!(predictor.output, Some(Descriptor::Real(real("y"))));

    schema
        .set_serialized(
            &mut predictor,
            "output",
            &json!({ "type": "Categorical", "descriptor_key": "c", "categories": ["b", "a", "b"] }),
        )
        .unwrap();
    let Some(Descriptor::Categorical(cat)) = &predictor.output else {
        panic!("expected a categorical descriptor");
    };
    assert_eq!(cat.categories.len(), 2);

    let err = schema
        .set_value(&mut predictor, "output", Datum::Str("x".into()))
        .unwrap_err();
    assert!(matches!(err.root(), PropertyError::TypeMismatch { .. }));
}

#[test]
fn typed_and_serialized_elements_mix() {
    let schema = Predictor::schema();
    let mut predictor = Predictor::default();

    schema
        .set(
            &mut predictor,
            "inputs",
            Member::Elements(vec![
                Member::typed(Descriptor::Real(real("a"))),
                Member::typed(real("b")),
                Member::Serialized(json!({ "type": "Categorical", "descriptor_key": "c", "categories": [] })),
            ]),
        )
        .unwrap();

    assert_eq!(predictor.inputs.len(), 3);
    assert_eq!(predictor.inputs[1], Descriptor::Real(real("b")));
}

#[test]
fn field_errors_name_class_and_path() {
    let value = json!({ "config": { "name": 5, "inputs": [] } });
    let err = Predictor::build(&value).unwrap_err();

    let PropertyError::TypeMismatch { class, path, .. } = err.root() else {
        panic!("expected a type mismatch, got {err:?}");
    };
    assert_eq!(*class, Some("Predictor"));
    assert_eq!(path.as_deref(), Some("config.name"));

    let err = Predictor::build(&json!({ "config": { "name": "p" } })).unwrap_err();
    assert!(matches!(
        err.root(),
        PropertyError::MissingField { segment, path, .. } if segment == "inputs" && path == "config.inputs"
    ));
}

// -----------------------------------------------------------------------------
// Overrides

#[derive(Debug, Clone, Default, PartialEq)]
struct Named {
    name: String,
}

impl Model for Named {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<Named> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::builder("Named")
                .field("name", Str::new(), |m| &m.name, |m| &mut m.name)
                .build()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Labelled {
    name: String,
    tags: Vec<String>,
}

impl Model for Labelled {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<Labelled> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::builder("Labelled")
                .field("name", Str::new(), |m| &m.name, |m| &mut m.name)
                .field("tags", List::new(Str::new()).default(Vec::<String>::new()), |m| &m.tags, |m| &mut m.tags)
                .build()
        })
    }
}

/// Overrides `name`, declared by exactly one base.
#[derive(Debug, Clone, Default, PartialEq)]
struct SingleBase {
    named: Named,
    name: String,
}

impl Model for SingleBase {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<SingleBase> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::builder("SingleBase")
                .extends::<Named>(|m| &m.named, |m| &mut m.named)
                .field("name", Str::new().overrides(), |m| &m.name, |m| &mut m.name)
                .build()
        })
    }
}

/// Overrides `name`, declared by two bases.
#[derive(Debug, Clone, Default, PartialEq)]
struct TwoBases {
    named: Named,
    labelled: Labelled,
    name: String,
}

impl Model for TwoBases {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<TwoBases> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::builder("TwoBases")
                .extends::<Named>(|m| &m.named, |m| &mut m.named)
                .extends::<Labelled>(|m| &m.labelled, |m| &mut m.labelled)
                .field("name", Str::new().overrides(), |m| &m.name, |m| &mut m.name)
                .build()
        })
    }
}

/// Redeclares `name` without overriding.
#[derive(Debug, Clone, Default, PartialEq)]
struct Shadowing {
    named: Named,
    name: String,
}

impl Model for Shadowing {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<Shadowing> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::builder("Shadowing")
                .extends::<Named>(|m| &m.named, |m| &mut m.named)
                .field("name", Str::at("label"), |m| &m.name, |m| &mut m.name)
                .build()
        })
    }
}

#[test]
fn override_delegates_to_single_base() {
    let schema = SingleBase::schema();
    let mut object = SingleBase::default();

    schema.set_value(&mut object, "name", "x").unwrap();
    assert_eq!(object.named.name, "x");
    assert_eq!(object.name, "");
    assert_eq!(schema.get(&object, "name").unwrap(), Datum::Str("x".into()));

    let built = SingleBase::build(&json!({ "name": "y" })).unwrap();
    assert_eq!(built.named.name, "y");
    assert_eq!(built.name, "");
    assert_eq!(built.dump().unwrap(), json!({ "name": "y" }));
}

#[test]
fn override_is_skipped_with_two_bases() {
    let schema = TwoBases::schema();
    let mut object = TwoBases::default();

    schema.set_value(&mut object, "name", "x").unwrap();
    assert_eq!(object.name, "x");
    assert_eq!(object.named.name, "");
    assert_eq!(object.labelled.name, "");

    // Inherited fields still go through their base.
    schema
        .set_serialized(&mut object, "tags", &json!(["a"]))
        .unwrap();
    assert_eq!(object.labelled.tags, ["a"]);

    let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
    assert_eq!(names, ["name", "tags"]);
    assert_eq!(schema.field("name").unwrap().owner(), "TwoBases");
    assert_eq!(schema.field("tags").unwrap().owner(), "Labelled");
}

#[test]
fn local_field_replaces_inherited_one() {
    let built = Shadowing::build(&json!({ "label": "l", "name": "ignored" })).unwrap();
    assert_eq!(built.name, "l");
    assert_eq!(built.named.name, "");
    assert_eq!(Shadowing::schema().fields().len(), 1);
}

#[test]
fn unknown_field_by_name() {
    let mut object = Named::default();
    let err = Named::schema()
        .set_value(&mut object, "nope", "x")
        .unwrap_err();
    assert!(matches!(err, PropertyError::UnknownField { class: "Named", .. }));
}

// -----------------------------------------------------------------------------
// Scalars through a model

crate::symbol_enum! {
    enum Role: "Role" {
        Input = "input",
        Output = "output",
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Dataset {
    name: String,
}

impl Model for Dataset {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<Dataset> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::builder("Dataset")
                .constant("type", Str::new(), "dataset")
                .field("name", Str::new(), |m| &m.name, |m| &mut m.name)
                .build()
        })
    }
}

crate::model_datum!(Dataset);

#[derive(Debug, Clone, Default, PartialEq)]
struct Table {
    id: Option<uuid::Uuid>,
    name: String,
    created: Option<DateTime<Utc>>,
    weights: BTreeMap<String, f64>,
    columns: Vec<(String, i64)>,
    role: Option<Role>,
    extra: Value,
    source: Option<LinkOr<Dataset>>,
}

impl Model for Table {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<Table> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::builder("Table")
                .field("id", Optional::new(Uuid::new()), |m| &m.id, |m| &mut m.id)
                .field("name", Str::at("config.name"), |m| &m.name, |m| &mut m.name)
                .field("created", Optional::new(Datetime::new()), |m| &m.created, |m| &mut m.created)
                .field("weights", Mapping::new(Str::new(), Float::new()), |m| &m.weights, |m| &mut m.weights)
                .field(
                    "columns",
                    List::new(SpecifiedMixedList::new().with(Str::new()).with(Integer::new().default(0_i64))),
                    |m| &m.columns,
                    |m| &mut m.columns,
                )
                .field("role", Optional::new(Enumeration::<Role>::new()), |m| &m.role, |m| &mut m.role)
                .field("extra", Raw::new().optional(), |m| &m.extra, |m| &mut m.extra)
                .field("source", Optional::new(LinkOrElse::new()), |m| &m.source, |m| &mut m.source)
                .build()
        })
    }
}

#[test]
fn table_round_trip() {
    let value = json!({
        "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
        "config": { "name": "t" },
        "created": 1577836800000_i64,
        "weights": { "a": 0.5, "b": 2.0 },
        "columns": [["x", 1], ["y", 2]],
        "role": "input",
        "extra": { "k": [1, 2] },
        "source": { "type": "link_by_uid", "scope": "id", "id": "7" },
    });

    let table = Table::build(&value).unwrap();
    assert_eq!(table.created, Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()));
    assert_eq!(table.columns, [("x".to_string(), 1), ("y".to_string(), 2)]);
    assert_eq!(table.role, Some(Role::Input));
    assert_eq!(table.source, Some(LinkOr::Link(LinkByUid::new("id", "7"))));

    assert_eq!(table.dump().unwrap(), value);
    assert_eq!(Table::build(&table.dump().unwrap()).unwrap(), table);
}

#[test]
fn table_defaults_and_padding() {
    let table = Table::build(&json!({
        "config": { "name": "t" },
        "weights": {},
        "columns": [["x"]],
    }))
    .unwrap();

    assert_eq!(table.id, None);
    assert_eq!(table.columns, [("x".to_string(), 0)]);
    assert_eq!(table.extra, Value::Null);
    assert_eq!(table.source, None);
}

#[test]
fn linked_objects_dump_but_do_not_build() {
    let table = Table {
        name: "t".into(),
        source: Some(LinkOr::Object(Dataset { name: "d".into() })),
        ..Table::default()
    };

    let value = table.dump().unwrap();
    assert_eq!(value["source"], json!({ "type": "dataset", "name": "d" }));

    let err = Table::build(&value).unwrap_err();
    assert!(matches!(err.root(), PropertyError::NotLinkable { .. }));
}

#[test]
fn datetime_field_scenario() {
    let schema = Table::schema();
    let mut table = Table::default();
    let instant = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

    schema
        .set_serialized(&mut table, "created", &json!("2020-01-01T00:00:00+00:00"))
        .unwrap();
    assert_eq!(table.created, Some(instant));

    schema
        .set_serialized(&mut table, "created", &json!(1577836800000_i64))
        .unwrap();
    assert_eq!(table.created, Some(instant));
    assert_eq!(table.dump().unwrap()["created"], json!(1577836800000_i64));
}

#[test]
fn booleans_are_rejected_by_numeric_fields() {
    let mut table = Table::default();
    let err = Table::schema()
        .set_serialized(&mut table, "weights", &json!({ "a": true }))
        .unwrap_err();
    assert!(matches!(err.root(), PropertyError::TypeMismatch { .. }));
}

// -----------------------------------------------------------------------------
// Opaque records and empty schemas

#[derive(Debug, Clone, PartialEq)]
struct Record(Value);

impl Model for Record {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<Record> = SchemaCell::new();
        SCHEMA.get_or_init(|| {
            Schema::<Self>::opaque(
                "Record",
                |value| Ok(Record(value.clone())),
                |record| Ok(record.0.clone()),
            )
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Empty;

impl Model for Empty {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: SchemaCell<Empty> = SchemaCell::new();
        SCHEMA.get_or_init(|| Schema::<Self>::builder("Empty").build())
    }
}

#[test]
fn opaque_records_use_their_own_codec() {
    let prop = Object::<Record>::new();
    let value = json!({ "anything": [1, 2, 3] });
    let datum = crate::Property::deserialize(&prop, &value).unwrap();
    assert_eq!(crate::Property::serialize(&prop, &datum).unwrap(), value);
    assert!(Record::schema().is_opaque());
}

#[test]
fn empty_schemas_fail_loudly() {
    assert!(matches!(
        Empty::build(&json!({})),
        Err(PropertyError::NoBuilder { class: "Empty" })
    ));
    assert!(matches!(
        Empty.dump(),
        Err(PropertyError::NoSerializer { class: "Empty" })
    ));
}

#[test]
fn configured_object_property() {
    let prop = Object::<Dataset>::at("source.dataset").optional().write_only();
    assert!(!crate::Property::meta(&prop).is_deserializable());

    let datum = crate::Property::read_from_container(&prop, &serde_json::Map::new()).unwrap();
    assert_eq!(datum, Datum::Null);

    let mut container = serde_json::Map::new();
    let dataset = Datum::object(Dataset { name: "d".into() });
    crate::Property::write_into_container(&prop, &mut container, &dataset).unwrap();
    assert_eq!(
        Value::Object(container),
        json!({ "source": { "dataset": { "type": "dataset", "name": "d" } } })
    );
}
