use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_section(None, map);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(res_map) = result {
        print_section(None, res_map);
    } else {
        print_section(None, envelope);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalars go in a Field/Value table; nested objects and lists of records
/// (candidates, frontier points, fund summaries) get their own tables.
fn print_section(title: Option<&str>, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut scalars = 0;
    let mut nested: Vec<(&str, &Value)> = Vec::new();

    for (key, val) in map {
        match val {
            Value::Object(_) => nested.push((key.as_str(), val)),
            Value::Array(arr) if arr.first().map_or(false, Value::is_object) => {
                nested.push((key.as_str(), val))
            }
            _ => {
                builder.push_record([key.as_str(), &format_value(val)]);
                scalars += 1;
            }
        }
    }

    if let Some(t) = title {
        println!("\n{}:", t);
    }
    if scalars > 0 {
        println!("{}", Table::from(builder));
    }

    for (key, val) in nested {
        match val {
            Value::Object(inner) => print_section(Some(key), inner),
            Value::Array(arr) => {
                println!("\n{}:", key);
                print_array_table(arr);
            }
            _ => {}
        }
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            // Matrix rows are separated by semicolons
            let sep = if arr.first().map_or(false, Value::is_array) {
                "; "
            } else {
                ", "
            };
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(sep)
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
