//! Recipe transfer: bulk application of `{symbol_path, value}` pairs to the
//! controller and bulk capture of current values back into the same file.
//!
//! The recipe document is round-tripped as raw JSON so fields this console
//! does not know about survive an upload untouched.

use std::{fs, path::Path};

use serde_json::Value;

use crate::error::{ConsoleError, Result};
use crate::plc::{Plc, PlcValue};
use crate::symbols;

/// Writes every recipe value to its symbol.
pub fn download(plc: &mut dyn Plc, path: &Path) -> Result<usize> {
    let entries = read_recipe(path)?;
    let mut written = 0;
    for entry in &entries {
        let (symbol_path, value) = entry_parts(entry)?;
        plc.write_by_name(symbol_path, json_to_plc(value)?)?;
        written += 1;
    }
    Ok(written)
}

/// Reads every recipe symbol's current value and rewrites the file with
/// those values substituted in place.
pub fn upload(plc: &mut dyn Plc, path: &Path) -> Result<usize> {
    let mut entries = read_recipe(path)?;
    let mut captured = 0;
    for entry in &mut entries {
        let symbol_path = entry
            .get("symbol_path")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ConsoleError::Validation("recipe entry is missing 'symbol_path'".to_string())
            })?
            .to_string();
        let symbol = symbols::read_symbol(plc, &symbol_path)?;
        let value = symbol
            .value
            .ok_or_else(|| ConsoleError::Protocol(format!("symbol '{symbol_path}' has no value")))?;
        if let Some(object) = entry.as_object_mut() {
            object.insert("value".to_string(), plc_to_json(&value));
        }
        captured += 1;
    }
    fs::write(path, serde_json::to_string_pretty(&Value::Array(entries))?)?;
    Ok(captured)
}

fn read_recipe(path: &Path) -> Result<Vec<Value>> {
    if !path.is_file() {
        return Err(ConsoleError::NotFound(format!(
            "recipe file {} not found",
            path.display()
        )));
    }
    let document: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    match document {
        Value::Array(entries) => Ok(entries),
        _ => Err(ConsoleError::Validation(
            "recipe file must contain a JSON array".to_string(),
        )),
    }
}

fn entry_parts(entry: &Value) -> Result<(&str, &Value)> {
    let symbol_path = entry
        .get("symbol_path")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ConsoleError::Validation("recipe entry is missing 'symbol_path'".to_string())
        })?;
    let value = entry
        .get("value")
        .ok_or_else(|| ConsoleError::Validation("recipe entry is missing 'value'".to_string()))?;
    Ok((symbol_path, value))
}

fn json_to_plc(value: &Value) -> Result<PlcValue> {
    match value {
        Value::Bool(v) => Ok(PlcValue::Bool(*v)),
        Value::Number(number) => {
            if let Some(v) = number.as_i64() {
                Ok(PlcValue::I64(v))
            } else if let Some(v) = number.as_f64() {
                Ok(PlcValue::F64(v))
            } else {
                Err(ConsoleError::Conversion(format!(
                    "unsupported recipe number {number}"
                )))
            }
        }
        Value::String(v) => Ok(PlcValue::String(v.clone())),
        other => Err(ConsoleError::Conversion(format!(
            "unsupported recipe value {other}"
        ))),
    }
}

fn plc_to_json(value: &PlcValue) -> Value {
    match value {
        PlcValue::Bool(v) => Value::Bool(*v),
        PlcValue::I8(v) => Value::from(*v),
        PlcValue::U8(v) => Value::from(*v),
        PlcValue::I16(v) => Value::from(*v),
        PlcValue::U16(v) => Value::from(*v),
        PlcValue::I32(v) => Value::from(*v),
        PlcValue::U32(v) => Value::from(*v),
        PlcValue::I64(v) => Value::from(*v),
        PlcValue::U64(v) => Value::from(*v),
        PlcValue::F32(v) => Value::from(f64::from(*v)),
        PlcValue::F64(v) => Value::from(*v),
        PlcValue::String(_) | PlcValue::Bytes(_) => Value::String(value.to_string()),
    }
}
