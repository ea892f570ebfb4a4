//! JSON output envelope: `{ data, warnings? }`.

use anyhow::Result;
use serde_json::{Value, json};

pub fn print_json(data: Value, warnings: Vec<String>, pretty: bool) -> Result<()> {
    let mut root = json!({ "data": data });
    if !warnings.is_empty() {
        root["warnings"] = warnings.into_iter().map(Value::String).collect();
    }
    if pretty {
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        println!("{}", serde_json::to_string(&root)?);
    }
    Ok(())
}
