use ingot::{load_json, load_ndjson, load_xml, Error, FieldKind, LoadConfig, Object, RecordWriter};
use serde_json::{json, Value};
use std::fs;
use std::io::BufReader;

const CENSUS: &str = r#"{
    "source": "census",
    "results": [
        {"state": "Ohio", "race": "all", "origin": "total", "sex": "F", "population_2010": 5905208,
         "population_estimate_2010": 5910000, "population_estimate_2011": 5912000},
        {"state": "Iowa", "race": "white", "origin": "total", "sex": "M", "population_2010": 1508319,
         "population_estimate_2010": null, "population_estimate_2011": 1510000}
    ],
    "notes": ["provisional"]
}"#;

fn collect<F>(load: F) -> (Vec<Value>, ingot::LoadSummary)
where
    F: FnOnce(&mut dyn FnMut(Object)) -> ingot::Result<ingot::LoadSummary>,
{
    let mut records = Vec::new();
    let summary = load(&mut |record: Object| records.push(Value::Object(record))).unwrap();
    (records, summary)
}

#[test]
fn census_records_are_compacted_with_fixture_codes() {
    let config = LoadConfig::default()
        .with_records_array("results")
        .with_compaction(true);
    let (records, summary) = collect(|listener| load_json(CENSUS.as_bytes(), &config, listener));

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0],
        json!({"9": "Ohio", "2": "all", "7": "total", "3c": "F", "0": 5905208, "f": 5910000, "34": 5912000})
    );

    let key_map = summary.key_map.as_ref().unwrap();
    let expanded = key_map.expand(records[1].as_object().unwrap());
    assert_eq!(expanded["state"], json!("Iowa"));
    assert_eq!(expanded["population_estimate_2010"], Value::Null);

    let estimate = &summary.fields[5];
    assert_eq!(estimate.name, "population_estimate_2010");
    assert_eq!(estimate.code.as_deref(), Some("f"));
    assert_eq!(estimate.kind, FieldKind::Integer);
    assert!(estimate.nullable);
}

#[test]
fn summary_serializes_key_map_in_first_seen_order() {
    let config = LoadConfig::default()
        .with_records_array("results")
        .with_compaction(true);
    let (_, summary) = collect(|listener| load_json(CENSUS.as_bytes(), &config, listener));

    let metadata = serde_json::to_value(&summary).unwrap();
    assert_eq!(metadata["records"], json!(2));
    let codes: Vec<_> = metadata["key_map"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(key, code)| format!("{key}={}", code.as_str().unwrap()))
        .collect();
    assert_eq!(codes[0], "state=9");
    assert_eq!(codes[3], "sex=3c");
    assert_eq!(metadata["fields"][0]["kind"], json!("string"));
}

#[test]
fn missing_records_array_emits_the_root() {
    let config = LoadConfig::default().with_records_array("rows");
    let (records, _) = collect(|listener| load_json(CENSUS.as_bytes(), &config, listener));

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["source"], json!("census"));
    assert_eq!(records[0]["results"].as_array().unwrap().len(), 2);
}

#[test]
fn ndjson_file_round_trip_through_writer() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("rows.jsonl");
    let output = dir.path().join("out.jsonl");
    fs::write(
        &input,
        "{\"id\": 1, \"tags\": [\"a\"]}\n{\"id\": 2, \"tags\": []}\n\n{\"id\": 3, \"tags\": null}\n",
    )
    .unwrap();

    let mut writer = RecordWriter::create(&output).unwrap();
    let reader = BufReader::new(fs::File::open(&input).unwrap());
    let summary = load_ndjson(reader, &LoadConfig::default(), &mut writer).unwrap();
    writer.flush().unwrap();

    assert_eq!(summary.records, 3);
    assert_eq!(writer.written(), 3);
    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<Value> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines[0], json!({"id": 1, "tags": ["a"]}));
    assert_eq!(lines[2], json!({"id": 3, "tags": null}));
    assert!(summary.fields[1].nullable);
}

#[test]
fn xml_export_with_attributes() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <response xmlns="urn:example">
          <row>
            <row _id="1"><state>Ohio</state><population>11536504</population></row>
            <row _id="2"><state>Iowa</state><population>3046355</population></row>
          </row>
        </response>"#;
    let config = LoadConfig::default()
        .with_records_array("row")
        .with_compaction(true);
    let (records, summary) = collect(|listener| load_xml(xml.as_bytes(), &config, listener));

    assert_eq!(records.len(), 2);
    let key_map = summary.key_map.unwrap();
    let first = key_map.expand(records[0].as_object().unwrap());
    assert_eq!(
        Value::Object(first),
        json!({"@_id": 1, "state": "Ohio", "population": 11536504})
    );
}

#[test]
fn structural_errors_surface_from_every_format() {
    let config = LoadConfig::default();

    let err = load_json(r#"{"a": 1}}"#.as_bytes(), &config, &mut |_: Object| {}).unwrap_err();
    assert!(matches!(err, Error::Json(_)));

    let err = load_ndjson("{\"a\": 1}\n[1]\n".as_bytes(), &config, &mut |_: Object| {}).unwrap_err();
    assert!(matches!(err, Error::Build(_)));

    let err = load_xml("<a><b></c></a>".as_bytes(), &config, &mut |_: Object| {}).unwrap_err();
    assert!(matches!(err, Error::Xml(_)));
}

#[test]
fn ndjson_keys_coded_late_keep_earlier_records_decodable() {
    let input = "{\"origin\": \"total\"}\n{\"age\": 30}\n{\"field_25\": \"x\"}\n";
    let config = LoadConfig::default().with_compaction(true);
    let (records, summary) = collect(|listener| load_ndjson(input.as_bytes(), &config, listener));

    assert_eq!(records, vec![json!({"7": "total"}), json!({"7d": 30}), json!({"70": "x"})]);

    let key_map = summary.key_map.unwrap();
    let first = key_map.expand(records[0].as_object().unwrap());
    assert_eq!(Value::Object(first), json!({"origin": "total"}));
    let last = key_map.expand(records[2].as_object().unwrap());
    assert_eq!(Value::Object(last), json!({"field_25": "x"}));
}
