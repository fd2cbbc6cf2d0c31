pub mod file;
pub mod stdin;

use serde_json::{Map, Value};

/// Load a request object from `--input` or piped stdin.
///
/// A `.csv` file becomes `{"dataset": ...}`. A JSON document that is a bare
/// dataset (has `rows` at the top level) is wrapped the same way; anything
/// else is taken as the full request.
pub fn read_request(path: Option<&str>, what: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let value = match path {
        Some(p) if file::is_csv(p) => {
            let dataset = serde_json::to_value(file::read_csv_dataset(p)?)?;
            return Ok(serde_json::json!({ "dataset": dataset }));
        }
        Some(p) => file::read_json_value(p)?,
        None => match stdin::read_stdin()? {
            Some(v) => v,
            None => {
                return Err(
                    format!("--input <file.csv|file.json> or stdin required for {}", what).into(),
                )
            }
        },
    };

    if !value.is_object() {
        return Err(format!("expected a JSON object for {}", what).into());
    }
    if value.get("rows").is_some() {
        return Ok(serde_json::json!({ "dataset": value }));
    }
    Ok(value)
}

/// Set `key` on a request object when a command-line override was given.
pub fn override_field(request: &mut Value, key: &str, value: Option<Value>) {
    if let (Value::Object(map), Some(v)) = (request, value) {
        map.insert(key.to_string(), v);
    }
}

/// Nested object under `key`, created when absent or null.
pub fn object_at<'a>(request: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    let slot = request
        .as_object_mut()?
        .entry(key.to_string())
        .or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    Some(slot)
}
