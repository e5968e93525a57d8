/// Quickstart example - load an API response and compact its field names
use ingot::document::write_summary;
use ingot::{load_json, load_xml, LoadConfig, Object};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    println!("=== Ingot Quick Start ===\n");

    // Step 1: A paged API response; the rows live under "results"
    let response = json!({
        "page": 1,
        "results": [
            {"state": "Ohio", "race": "all", "origin": "total", "sex": "F", "population_2010": 5905208},
            {"state": "Iowa", "race": "all", "origin": "total", "sex": "M", "population_2010": 1508319},
            {"state": "Utah", "race": "all", "origin": "total", "sex": "F", "population_2010": 1381507}
        ]
    });
    let input = serde_json::to_vec(&response)?;

    // Step 2: One record per "results" element, with compacted keys
    let config = LoadConfig::default()
        .with_records_array("results")
        .with_compaction(true);

    let mut records = Vec::new();
    let summary = load_json(input.as_slice(), &config, &mut |record: Object| records.push(record))?;

    println!("Extracted {} records:\n", records.len());
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }

    // Step 3: The key map restores the original names
    if let Some(key_map) = &summary.key_map {
        println!("\nKey map:");
        for (key, code) in key_map.iter() {
            println!("  {code:>4} -> {key}");
        }
        println!("\nFirst record expanded:");
        println!("{}", serde_json::to_string_pretty(&key_map.expand(&records[0]))?);
    }

    // Step 4: Metadata for schema registration
    println!("\nMetadata:");
    write_summary(std::io::stdout().lock(), &summary)?;

    // Step 5: XML goes through the same pipeline
    let xml = "<export><row><id>1</id><name>first</name></row><row><id>2</id><name>second</name></row></export>";
    let mut rows = Vec::new();
    load_xml(xml.as_bytes(), &LoadConfig::default().with_records_array("row"), &mut |record: Object| {
        rows.push(record)
    })?;

    println!("\nXML rows:");
    for row in &rows {
        println!("{}", serde_json::to_string(row)?);
    }

    println!("\n✓ Done!");
    Ok(())
}
