use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = [
        "best_candidate",
        "allocation",
        "additional_target",
        "weight_target",
        "sharpe_ratio",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Frontier output nests its answer one level down
        if let Some(Value::Object(frontier)) = map.get("frontier") {
            if let Some(optimal) = frontier.get("optimal") {
                println!("{}", format_minimal(optimal));
                return;
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Object(map) => {
            // Compact one-line summary of a candidate, frontier point or plan
            let fields = [
                "candidate_fund",
                "weight_target",
                "weight_candidate",
                "additional_target",
                "additional_candidate",
                "sharpe_ratio",
            ];
            let parts: Vec<String> = fields
                .iter()
                .filter_map(|f| map.get(*f).map(|v| format!("{}={}", f, format_minimal(v))))
                .collect();
            if parts.is_empty() {
                serde_json::to_string(value).unwrap_or_default()
            } else {
                parts.join(" ")
            }
        }
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
