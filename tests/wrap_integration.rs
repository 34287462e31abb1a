//! Integration tests for the rewrap public API

use std::sync::Arc;

use rewrap::{
    apply_wraps, Bindings, DelegateMapper, MapperConfig, MapperDef, NamedModel, Record, Value,
    WrapError, WrapSpec,
};

fn joe() -> Record {
    Record::new()
        .with_attribute("id", 1)
        .with_attribute("name", "Joe")
        .with_attribute("contact_email", "a@b.com")
        .with_attribute("contact_skype", "joe")
}

#[test]
fn test_basic_extraction() {
    let mapper = MapperDef::builder()
        .wrap(
            WrapSpec::builder("contact")
                .source_keys(["contact_email", "contact_skype"])
                .build(),
        )
        .build()
        .unwrap();

    let output = mapper.apply(&joe()).unwrap();

    let keys: Vec<&String> = output.keys().collect();
    assert_eq!(keys, vec!["id", "name", "contact"]);

    let contact = output.get("contact").unwrap().as_record().unwrap();
    assert_eq!(
        contact.get("contact_email").and_then(Value::as_str),
        Some("a@b.com")
    );
    assert_eq!(
        contact.get("contact_skype").and_then(Value::as_str),
        Some("joe")
    );
}

#[test]
fn test_prefix_stripping() {
    let mapper = MapperDef::builder()
        .wrap(
            WrapSpec::builder("contacts")
                .prefix("contact")
                .attr("email")
                .attr("skype")
                .build(),
        )
        .build()
        .unwrap();

    let output = mapper.apply(&joe()).unwrap();

    assert_eq!(output.get("id").and_then(Value::as_int), Some(1));
    assert_eq!(output.get("name").and_then(Value::as_str), Some("Joe"));

    let contacts = output.get("contacts").unwrap().as_record().unwrap();
    let keys: Vec<&String> = contacts.keys().collect();
    assert_eq!(keys, vec!["email", "skype"]);
    assert_eq!(contacts.get("skype").and_then(Value::as_str), Some("joe"));
}

#[test]
fn test_self_named_wrap() {
    let record = Record::new()
        .with_attribute("place", "Hall")
        .with_attribute("agenda", "Future")
        .with_attribute("thesis", "Bankruptcy");

    let mapper = MapperDef::builder()
        .wrap(
            WrapSpec::builder("agenda")
                .attr("agenda")
                .attr_from("main_thesis", "thesis")
                .build(),
        )
        .build()
        .unwrap();

    let output = mapper.apply(&record).unwrap();

    assert_eq!(output.get("place").and_then(Value::as_str), Some("Hall"));

    // The target key holds the nested record, not the original scalar.
    let agenda = output.get("agenda").unwrap().as_record().unwrap();
    assert_eq!(agenda.get("agenda").and_then(Value::as_str), Some("Future"));
    assert_eq!(
        agenda.get("main_thesis").and_then(Value::as_str),
        Some("Bankruptcy")
    );
}

#[test]
fn test_unconsumed_keys_survive_by_default() {
    let mapper = MapperDef::builder()
        .wrap(WrapSpec::builder("contact").source_keys(["contact_email"]).build())
        .build()
        .unwrap();

    let output = mapper.apply(&joe()).unwrap();

    assert_eq!(output.get("id").and_then(Value::as_int), Some(1));
    assert_eq!(output.get("name").and_then(Value::as_str), Some("Joe"));
    assert_eq!(
        output.get("contact_skype").and_then(Value::as_str),
        Some("joe")
    );
}

#[test]
fn test_reject_unlisted() {
    // "name" is declared AND consumed by a wrap: the wrap removal wins.
    let mapper = MapperDef::builder()
        .attribute("id")
        .attribute("name")
        .wrap(
            WrapSpec::builder("contact")
                .source_keys(["contact_email", "name"])
                .build(),
        )
        .reject_unlisted(true)
        .build()
        .unwrap();

    let output = mapper.apply(&joe()).unwrap();

    let keys: Vec<&String> = output.keys().collect();
    assert_eq!(keys, vec!["id", "contact"]);
}

struct RedactingDelegate;

impl DelegateMapper for RedactingDelegate {
    fn transform(&self, record: Record) -> Result<Record, WrapError> {
        Ok(record
            .into_iter()
            .map(|(key, _)| (key, Value::String("<redacted>".to_string())))
            .collect())
    }
}

#[test]
fn test_delegate_precedence_over_inline() {
    let mapper = MapperDef::builder()
        .wrap(
            WrapSpec::builder("contact")
                .source_keys(["contact_email", "contact_skype"])
                .delegate(Arc::new(RedactingDelegate))
                .wrap(WrapSpec::builder("ignored").source_keys(["contact_email"]).build())
                .build(),
        )
        .build()
        .unwrap();

    let output = mapper.apply(&joe()).unwrap();

    let contact = output.get("contact").unwrap().as_record().unwrap();
    assert!(!contact.contains("ignored"));
    assert_eq!(
        contact.get("contact_email").and_then(Value::as_str),
        Some("<redacted>")
    );
    assert_eq!(
        contact.get("contact_skype").and_then(Value::as_str),
        Some("<redacted>")
    );
}

#[test]
fn test_nested_wraps_depth_two_bottom_up() {
    let record = Record::new()
        .with_attribute("id", 1)
        .with_attribute("street", "Main St 1")
        .with_attribute("city", "Wellington")
        .with_attribute("geo_lat", "-41.3")
        .with_attribute("geo_lng", "174.8");

    let mapper = MapperDef::builder()
        .wrap(
            WrapSpec::builder("address")
                .source_keys(["street", "city", "geo_lat", "geo_lng"])
                .model(Arc::new(NamedModel::new("Address")))
                .wrap(
                    WrapSpec::builder("geo")
                        .prefix("geo")
                        .attr("lat")
                        .attr("lng")
                        .model(Arc::new(NamedModel::new("Geo")))
                        .build(),
                )
                .build(),
        )
        .build()
        .unwrap();

    let output = mapper.apply(&record).unwrap();

    let address = output.get("address").unwrap().as_model().unwrap();
    assert_eq!(address.name, "Address");
    assert_eq!(address.get("city").and_then(Value::as_str), Some("Wellington"));

    // Each level's model is applied after its own children are resolved.
    let geo = address.get("geo").unwrap().as_model().unwrap();
    assert_eq!(geo.name, "Geo");
    assert_eq!(geo.get("lng").and_then(Value::as_str), Some("174.8"));
}

#[test]
fn test_untouched_keys_copied_by_identity() {
    let record = Record::new()
        .with_attribute("id", 1)
        .with_attribute(
            "payload",
            Value::List(vec![Value::Int(1), Value::String("x".to_string())]),
        )
        .with_attribute("contact_email", "a@b.com");

    let specs = [WrapSpec::builder("contact").source_keys(["contact_email"]).build()];

    let output = apply_wraps(&record, &specs).unwrap();

    assert_eq!(output.get("id"), record.get("id"));
    assert_eq!(output.get("payload"), record.get("payload"));
}

#[test]
fn test_yaml_definition_matches_builder_definition() {
    let yaml = r#"
mapper:
  attributes: [id]
  reject_unlisted: true
  wraps:
    - target: contacts
      prefix: contact
      sources:
        - email
        - skype
      model: Contact
"#;

    let config = MapperConfig::from_yaml_str(yaml).unwrap();
    let mut bindings = Bindings::new();
    bindings.register_model("Contact", Arc::new(NamedModel::new("Contact")));
    let from_yaml = config.bind(&bindings).unwrap();

    let from_builder = MapperDef::builder()
        .attribute("id")
        .wrap(
            WrapSpec::builder("contacts")
                .prefix("contact")
                .attr("email")
                .attr("skype")
                .model(Arc::new(NamedModel::new("Contact")))
                .build(),
        )
        .reject_unlisted(true)
        .build()
        .unwrap();

    let record = joe();
    assert_eq!(
        from_yaml.apply(&record).unwrap(),
        from_builder.apply(&record).unwrap()
    );
}

#[test]
fn test_spec_shared_across_threads() {
    let mapper = Arc::new(
        MapperDef::builder()
            .wrap(
                WrapSpec::builder("contacts")
                    .prefix("contact")
                    .attr("email")
                    .attr("skype")
                    .build(),
            )
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mapper = Arc::clone(&mapper);
            std::thread::spawn(move || mapper.apply(&joe()).unwrap())
        })
        .collect();

    let outputs: Vec<Record> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for output in &outputs {
        assert_eq!(output, &outputs[0]);
    }
}
