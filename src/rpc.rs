//! RPC definition parsing, validation and call planning.
//!
//! Definitions are declared in a JSON file mapping controller symbol paths to
//! callable methods. The file is re-read on every `RPC` command so edits take
//! effect immediately. A structurally invalid file is not a fatal error: the
//! parser prints the deserializer's diagnostic, writes a JSON schema of the
//! expected shape next to the user as a correction aid and reports "nothing
//! to parse".

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ConsoleError, Result};
use crate::plc::PlcValue;
use crate::value::{self, WireShape, to_wire_value};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcArgument {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcMethod {
    pub name: String,
    pub arguments: Vec<RpcArgument>,
    pub return_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcDefinition {
    pub symbol_path: String,
    pub methods: Vec<RpcMethod>,
}

/// Parses the definitions document. On a structural mismatch the error is
/// printed, a corrective schema file is written to `schema_out` and `None`
/// comes back; callers treat `None` as "nothing to do".
pub fn parse_definitions(doc: &str, schema_out: &Path) -> Result<Option<Vec<RpcDefinition>>> {
    match serde_json::from_str::<Vec<RpcDefinition>>(doc) {
        Ok(definitions) => Ok(Some(definitions)),
        Err(err) => {
            println!("invalid rpc definitions: {err}");
            fs::write(
                schema_out,
                serde_json::to_string_pretty(&definitions_schema())?,
            )?;
            println!(
                "Schema file {} created to help in the creation of the rpc definition file.",
                schema_out.display()
            );
            Ok(None)
        }
    }
}

/// Case-sensitive exact match; the first matching entry wins when the file
/// carries duplicate symbol paths.
pub fn find_definition<'a>(
    definitions: &'a [RpcDefinition],
    symbol_path: &str,
) -> Result<&'a RpcDefinition> {
    definitions
        .iter()
        .find(|definition| definition.symbol_path == symbol_path)
        .ok_or_else(|| {
            ConsoleError::NotFound(format!("Symbol {symbol_path} not found in rpc definitions"))
        })
}

pub fn find_method<'a>(definition: &'a RpcDefinition, method_name: &str) -> Result<&'a RpcMethod> {
    definition
        .methods
        .iter()
        .find(|method| method.name == method_name)
        .ok_or_else(|| {
            ConsoleError::NotFound(format!("Method {method_name} not found in rpc methods"))
        })
}

pub fn check_arg_count(provided: &[String], method: &RpcMethod) -> Result<()> {
    if provided.len() != method.arguments.len() {
        return Err(ConsoleError::Validation(format!(
            "Missing argument values.\nAvailable method arguments: {:?}\nProvided arguments: {:?}",
            method.arguments, provided
        )));
    }
    Ok(())
}

/// A method invoked without user-supplied values must not declare required
/// arguments; those model controller-internal inputs the console cannot
/// provide.
pub fn check_no_required_args_omitted(method: &RpcMethod) -> Result<()> {
    for argument in &method.arguments {
        if argument.required {
            return Err(ConsoleError::Validation(format!(
                "Required argument type {}",
                argument.type_tag
            )));
        }
    }
    Ok(())
}

/// Fully validated call: converted argument values plus the wire shapes of
/// the input and output slots.
#[derive(Debug)]
pub struct CallPlan {
    pub args: Vec<PlcValue>,
    pub input: WireShape,
    pub returns: WireShape,
}

/// Resolves the call shape from the number of provided tokens: zero tokens
/// means a no-argument call (after the required-argument check), one token a
/// single strictly-converted scalar, two or more a fixed-size array sized to
/// the declared argument count.
pub fn plan_call(method: &RpcMethod, provided: &[String]) -> Result<CallPlan> {
    let (args, input) = match provided.len() {
        0 => {
            check_no_required_args_omitted(method)?;
            (Vec::new(), WireShape::Void)
        }
        1 => {
            check_arg_count(provided, method)?;
            let argument = &method.arguments[0];
            let converted = to_wire_value(&provided[0], &argument.type_tag)?;
            let tag = argument.type_tag.parse()?;
            (vec![converted], WireShape::Scalar(tag))
        }
        _ => {
            check_arg_count(provided, method)?;
            let mut converted = Vec::with_capacity(provided.len());
            for (text, argument) in provided.iter().zip(&method.arguments) {
                converted.push(to_wire_value(text, &argument.type_tag)?);
            }
            let shape = value::array_type_for(&method.arguments[0].type_tag)?
                .with_len(method.arguments.len());
            (converted, shape)
        }
    };

    let returns = return_shape(method)?;
    Ok(CallPlan {
        args,
        input,
        returns,
    })
}

fn return_shape(method: &RpcMethod) -> Result<WireShape> {
    match method.return_types.len() {
        0 => Ok(WireShape::Void),
        1 => Ok(WireShape::Scalar(method.return_types[0].parse()?)),
        n => Ok(value::array_type_for(&method.return_types[0])?.with_len(n)),
    }
}

fn definitions_schema() -> serde_json::Value {
    json!({
        "title": "RpcDefinitions",
        "type": "array",
        "items": {
            "title": "RpcDefinition",
            "type": "object",
            "required": ["symbol_path", "methods"],
            "additionalProperties": false,
            "properties": {
                "symbol_path": { "type": "string" },
                "methods": {
                    "type": "array",
                    "items": {
                        "title": "RpcMethod",
                        "type": "object",
                        "required": ["name", "arguments", "return_types"],
                        "additionalProperties": false,
                        "properties": {
                            "name": { "type": "string" },
                            "arguments": {
                                "type": "array",
                                "items": {
                                    "title": "Argument",
                                    "type": "object",
                                    "required": ["type", "required"],
                                    "additionalProperties": false,
                                    "properties": {
                                        "type": { "type": "string" },
                                        "required": { "type": "boolean" }
                                    }
                                }
                            },
                            "return_types": {
                                "type": "array",
                                "items": { "type": "string" }
                            }
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ScalarTag;
    use tempfile::tempdir;

    fn sample_doc() -> &'static str {
        r#"[
            {
                "symbol_path": "MAIN.fbDoor",
                "methods": [
                    {
                        "name": "Open",
                        "arguments": [],
                        "return_types": ["bool"]
                    },
                    {
                        "name": "MoveTo",
                        "arguments": [
                            { "type": "int16", "required": true },
                            { "type": "int16", "required": true },
                            { "type": "int16", "required": false }
                        ],
                        "return_types": ["bool", "int32"]
                    }
                ]
            },
            {
                "symbol_path": "MAIN.fbDoor",
                "methods": [
                    { "name": "Close", "arguments": [], "return_types": [] }
                ]
            }
        ]"#
    }

    fn parse_sample(dir: &Path) -> Vec<RpcDefinition> {
        parse_definitions(sample_doc(), &dir.join("schema.json"))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn malformed_document_writes_schema_and_returns_none() {
        let tmp = tempdir().unwrap();
        let schema_path = tmp.path().join("rpc_definitions_schema.json");
        let doc = r#"[ { "symbol_path": "MAIN.fbDoor" } ]"#;
        let parsed = parse_definitions(doc, &schema_path).unwrap();
        assert!(parsed.is_none());
        let schema: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&schema_path).unwrap()).unwrap();
        assert_eq!(schema["items"]["required"][1], "methods");
    }

    #[test]
    fn unknown_fields_are_a_structural_mismatch() {
        let tmp = tempdir().unwrap();
        let doc = r#"[ { "symbol_path": "a", "methods": [], "extra": 1 } ]"#;
        let parsed = parse_definitions(doc, &tmp.path().join("schema.json")).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn find_definition_is_first_match_wins() {
        let tmp = tempdir().unwrap();
        let definitions = parse_sample(tmp.path());
        let definition = find_definition(&definitions, "MAIN.fbDoor").unwrap();
        assert_eq!(definition.methods[0].name, "Open");
        assert!(find_definition(&definitions, "main.fbdoor").is_err());
    }

    #[test]
    fn arg_count_mismatch_reports_both_sides() {
        let tmp = tempdir().unwrap();
        let definitions = parse_sample(tmp.path());
        let method = find_method(&definitions[0], "MoveTo").unwrap();

        let two = vec!["1".to_string(), "2".to_string()];
        let err = check_arg_count(&two, method).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Available method arguments"));
        assert!(message.contains("Provided arguments"));

        let three = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        assert!(check_arg_count(&three, method).is_ok());
    }

    #[test]
    fn zero_arg_call_with_required_arguments_is_rejected() {
        let method = RpcMethod {
            name: "Reset".to_string(),
            arguments: vec![RpcArgument {
                type_tag: "int32".to_string(),
                required: true,
            }],
            return_types: vec![],
        };
        assert!(plan_call(&method, &[]).is_err());
    }

    #[test]
    fn no_arg_call_plans_scalar_return() {
        let tmp = tempdir().unwrap();
        let definitions = parse_sample(tmp.path());
        let method = find_method(&definitions[0], "Open").unwrap();
        let plan = plan_call(method, &[]).unwrap();
        assert!(plan.args.is_empty());
        assert_eq!(plan.input, WireShape::Void);
        assert_eq!(plan.returns, WireShape::Scalar(ScalarTag::Bool));
    }

    #[test]
    fn multi_arg_call_packs_into_sized_array() {
        let tmp = tempdir().unwrap();
        let definitions = parse_sample(tmp.path());
        let method = find_method(&definitions[0], "MoveTo").unwrap();
        let provided = vec!["10".to_string(), "20".to_string(), "30".to_string()];
        let plan = plan_call(method, &provided).unwrap();
        assert_eq!(plan.args.len(), 3);
        assert_eq!(plan.input, WireShape::Array(ScalarTag::Int16, 3));
        assert_eq!(plan.returns, WireShape::Array(ScalarTag::Bool, 2));
    }

    #[test]
    fn single_arg_call_converts_strictly() {
        let method = RpcMethod {
            name: "SetSpeed".to_string(),
            arguments: vec![RpcArgument {
                type_tag: "uint16".to_string(),
                required: true,
            }],
            return_types: vec![],
        };
        let plan = plan_call(&method, &["250".to_string()]).unwrap();
        assert_eq!(plan.args, vec![PlcValue::U16(250)]);
        assert!(plan_call(&method, &["70000".to_string()]).is_err());
    }
}
