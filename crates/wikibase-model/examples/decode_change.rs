//! Simple decoder to inspect change envelope files.

use std::fs;

use wikibase_model::{decode_change, DataValue, DiffOp, Snak, Statement};

fn format_value(v: &DataValue) -> String {
    match v {
        DataValue::String(s) => {
            let preview: String = s.chars().take(80).collect();
            if s.len() > 80 {
                format!("\"{}...\"", preview)
            } else {
                format!("\"{}\"", preview)
            }
        }
        DataValue::MonolingualText { text, language } => format!("\"{}\"@{}", text, language),
        DataValue::Quantity { amount, unit, .. } => format!("{} ({})", amount, unit),
        DataValue::Time { time, precision, .. } => format!("TIME({}, precision={})", time, precision),
        DataValue::GlobeCoordinate { latitude, longitude, .. } => format!("POINT({}, {})", latitude, longitude),
        DataValue::EntityId(id) => id.to_string(),
    }
}

fn format_snak(snak: &Snak) -> String {
    match snak.data_value() {
        Some(value) => format!("{} = {}", snak.property_id(), format_value(value)),
        None => format!("{} = <{}>", snak.property_id(), snak.snak_type().as_str()),
    }
}

fn format_statement(statement: &Statement) -> String {
    let mut out = format_snak(statement.main_snak());
    if !statement.qualifiers().is_empty() {
        out.push_str(&format!(" [{} qualifiers]", statement.qualifiers().len()));
    }
    if !statement.references().is_empty() {
        out.push_str(&format!(" [{} references]", statement.references().len()));
    }
    out
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "change.wbchz".to_string());

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let change = decode_change(&data).expect("Failed to decode");

    println!("\n=== Change Info ===");
    println!("Type: {}", change.type_string());
    println!("Entity: {}", change.entity_id);
    println!("Revision: {}", change.revision_id);
    if change.timestamp != 0 {
        println!("Timestamp: {} (µs since epoch)", change.timestamp);
    }

    let diff = &change.diff;
    println!("\n=== Diff ({} operations) ===", diff.op_count());
    println!("  labels: {}", diff.labels().len());
    println!("  descriptions: {}", diff.descriptions().len());
    println!("  aliases: {}", diff.aliases().len());
    println!("  claims: {}", diff.claims().len());
    println!("  links: {}", diff.site_links().len());

    for (language, op) in diff.labels().iter() {
        match op {
            DiffOp::Add(new) => println!("  + label {}: {}", language, new),
            DiffOp::Remove(old) => println!("  - label {}: {}", language, old),
            DiffOp::Change { old, new } => println!("  ~ label {}: {} -> {}", language, old, new),
        }
    }

    // Show first few claim operations in detail
    for (key, op) in diff.claims().iter().take(20) {
        match op {
            DiffOp::Add(new) => println!("  + claim {}: {}", key, format_statement(new)),
            DiffOp::Remove(old) => println!("  - claim {}: {}", key, format_statement(old)),
            DiffOp::Change { old, new } => {
                println!("  ~ claim {}", key);
                println!("      old: {}", format_statement(old));
                println!("      new: {}", format_statement(new));
            }
        }
    }

    for (site, op) in diff.site_links().iter() {
        match (op.old_value(), op.new_value()) {
            (_, Some(new)) => println!("  + link {}: {}", site, new.page_name()),
            (Some(old), None) => println!("  - link {}: {}", site, old.page_name()),
            (None, None) => {}
        }
    }
}
