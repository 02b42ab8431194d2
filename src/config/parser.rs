use crate::errors::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

/// Loads a settings tree from a JSON, TOML or YAML file
///
/// The format is chosen from the file extension; anything other than
/// `.toml`, `.yml` or `.yaml` is read as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_settings(file_path: &Path) -> Result<Value> {
    let text = fs::read_to_string(file_path)?;
    let settings = match extension(file_path).as_deref() {
        Some("toml") => toml::from_str::<Value>(&text)?,
        Some("yml") | Some("yaml") => serde_yaml::from_str::<Value>(&text)?,
        _ => serde_json::from_str::<Value>(&text)?,
    };
    info!("Loaded settings from {}", file_path.display());
    Ok(settings)
}

/// Loads a flat key/value table, e.g. the experiment file paths or system overrides
///
/// Non-string scalars are kept in their textual form.
pub fn load_string_map(file_path: &Path) -> Result<BTreeMap<String, String>> {
    let settings = load_settings(file_path)?;
    Ok(to_string_map(&settings))
}

/// Flattens the top level of a table into strings
pub fn to_string_map(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), text)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
