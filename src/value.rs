//! Textual value to controller wire value conversion.
//!
//! Two conversion flavours live here. [`to_wire_value`] is the strict,
//! schema-driven path used for RPC arguments: the declared type tag decides
//! the parse and anything that does not fit is a [`ConsoleError::Conversion`].
//! [`coerce_loose`] is the CLI-friendly trial parse used by `SetSymbol` and
//! recipes: try integer, then float, else keep the text.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConsoleError, Result};
use crate::plc::PlcValue;

/// Scalar type tags accepted in RPC definition files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarTag {
    Bool,
    Byte,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Char,
}

impl ScalarTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarTag::Bool => "bool",
            ScalarTag::Byte => "byte",
            ScalarTag::Int8 => "int8",
            ScalarTag::UInt8 => "uint8",
            ScalarTag::Int16 => "int16",
            ScalarTag::UInt16 => "uint16",
            ScalarTag::Int32 => "int32",
            ScalarTag::UInt32 => "uint32",
            ScalarTag::Int64 => "int64",
            ScalarTag::UInt64 => "uint64",
            ScalarTag::Float => "float",
            ScalarTag::Double => "double",
            ScalarTag::Char => "char",
        }
    }
}

impl FromStr for ScalarTag {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bool" => Ok(ScalarTag::Bool),
            "byte" => Ok(ScalarTag::Byte),
            "int8" => Ok(ScalarTag::Int8),
            "uint8" => Ok(ScalarTag::UInt8),
            "int16" => Ok(ScalarTag::Int16),
            "uint16" => Ok(ScalarTag::UInt16),
            "int32" => Ok(ScalarTag::Int32),
            "uint32" => Ok(ScalarTag::UInt32),
            "int64" => Ok(ScalarTag::Int64),
            "uint64" => Ok(ScalarTag::UInt64),
            "float" => Ok(ScalarTag::Float),
            "double" => Ok(ScalarTag::Double),
            "char" => Ok(ScalarTag::Char),
            other => Err(ConsoleError::Conversion(format!(
                "unsupported type: {other}"
            ))),
        }
    }
}

impl fmt::Display for ScalarTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of an RPC call's output slots on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireShape {
    Void,
    Scalar(ScalarTag),
    Array(ScalarTag, usize),
}

/// Maps a scalar type tag to its fixed-size-array wire representation, used
/// when an RPC call carries more than one input or output slot.
pub fn array_type_for(tag: &str) -> Result<ArrayType> {
    let tag = tag
        .parse::<ScalarTag>()
        .map_err(|_| ConsoleError::Conversion(format!("wrong return type detected: {tag}")))?;
    Ok(ArrayType(tag))
}

/// Array constructor produced by [`array_type_for`]; becomes a concrete
/// [`WireShape`] once the slot count is known.
#[derive(Debug, Clone, Copy)]
pub struct ArrayType(ScalarTag);

impl ArrayType {
    pub fn with_len(self, len: usize) -> WireShape {
        WireShape::Array(self.0, len)
    }

    pub fn element(self) -> ScalarTag {
        self.0
    }
}

/// Converts user-supplied text into the typed wire value the declared tag
/// calls for.
pub fn to_wire_value(text: &str, tag: &str) -> Result<PlcValue> {
    let tag = tag.parse::<ScalarTag>()?;
    match tag {
        ScalarTag::Bool => parse_bool(text),
        ScalarTag::Byte => parse_byte(text),
        ScalarTag::Int8 => parse_signed(text, tag, i8::MIN as i128, i8::MAX as i128),
        ScalarTag::Int16 => parse_signed(text, tag, i16::MIN as i128, i16::MAX as i128),
        ScalarTag::Int32 => parse_signed(text, tag, i32::MIN as i128, i32::MAX as i128),
        ScalarTag::Int64 => parse_signed(text, tag, i64::MIN as i128, i64::MAX as i128),
        ScalarTag::UInt8 => parse_signed(text, tag, 0, u8::MAX as i128),
        ScalarTag::UInt16 => parse_signed(text, tag, 0, u16::MAX as i128),
        ScalarTag::UInt32 => parse_signed(text, tag, 0, u32::MAX as i128),
        ScalarTag::UInt64 => parse_signed(text, tag, 0, u64::MAX as i128),
        ScalarTag::Float => text
            .parse::<f32>()
            .map(PlcValue::F32)
            .map_err(|_| ConsoleError::Conversion(format!("invalid float value '{text}'"))),
        ScalarTag::Double => text
            .parse::<f64>()
            .map(PlcValue::F64)
            .map_err(|_| ConsoleError::Conversion(format!("invalid double value '{text}'"))),
        // Char arguments travel as string payloads, unmodified.
        ScalarTag::Char => Ok(PlcValue::String(text.to_string())),
    }
}

fn parse_bool(text: &str) -> Result<PlcValue> {
    match text {
        "true" | "1" => Ok(PlcValue::Bool(true)),
        "false" | "0" => Ok(PlcValue::Bool(false)),
        other => Err(ConsoleError::Conversion(format!(
            "invalid bool value '{other}'"
        ))),
    }
}

/// `byte` input must be exactly two hex characters. The parsed value is
/// masked to the low 8 bits; the wraparound is intentional and mirrors how
/// the controller treats oversized byte writes.
fn parse_byte(text: &str) -> Result<PlcValue> {
    if text.len() != 2 || !text.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConsoleError::Conversion(format!(
            "byte value must be exactly 2 hex characters, got '{text}'"
        )));
    }
    let raw = u32::from_str_radix(text, 16)
        .map_err(|_| ConsoleError::Conversion(format!("invalid byte value '{text}'")))?;
    Ok(PlcValue::U8((raw & 0xFF) as u8))
}

fn parse_signed(text: &str, tag: ScalarTag, min: i128, max: i128) -> Result<PlcValue> {
    let parsed = text
        .parse::<i128>()
        .map_err(|_| ConsoleError::Conversion(format!("invalid {tag} value '{text}'")))?;
    if parsed < min || parsed > max {
        return Err(ConsoleError::Conversion(format!(
            "{tag} value '{text}' out of range"
        )));
    }
    Ok(match tag {
        ScalarTag::Int8 => PlcValue::I8(parsed as i8),
        ScalarTag::Int16 => PlcValue::I16(parsed as i16),
        ScalarTag::Int32 => PlcValue::I32(parsed as i32),
        ScalarTag::Int64 => PlcValue::I64(parsed as i64),
        ScalarTag::UInt8 => PlcValue::U8(parsed as u8),
        ScalarTag::UInt16 => PlcValue::U16(parsed as u16),
        ScalarTag::UInt32 => PlcValue::U32(parsed as u32),
        ScalarTag::UInt64 => PlcValue::U64(parsed as u64),
        _ => unreachable!("parse_signed called with non-integer tag"),
    })
}

/// Trial coercion for interactive writes: integer first, then float, else
/// the text is written as a string.
pub fn coerce_loose(text: &str) -> PlcValue {
    if let Ok(v) = text.parse::<i64>() {
        return PlcValue::I64(v);
    }
    if let Ok(v) = text.parse::<f64>() {
        return PlcValue::F64(v);
    }
    PlcValue::String(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_accepts_exactly_two_hex_digits() {
        assert_eq!(to_wire_value("ff", "byte").unwrap(), PlcValue::U8(0xFF));
        assert_eq!(to_wire_value("0A", "byte").unwrap(), PlcValue::U8(0x0A));
        assert!(to_wire_value("f", "byte").is_err());
        assert!(to_wire_value("fff", "byte").is_err());
        assert!(to_wire_value("zz", "byte").is_err());
    }

    #[test]
    fn integer_bounds_round_trip_and_overflow_fails() {
        let cases: &[(&str, i128, i128)] = &[
            ("int8", i8::MIN as i128, i8::MAX as i128),
            ("uint8", 0, u8::MAX as i128),
            ("int16", i16::MIN as i128, i16::MAX as i128),
            ("uint16", 0, u16::MAX as i128),
            ("int32", i32::MIN as i128, i32::MAX as i128),
            ("uint32", 0, u32::MAX as i128),
            ("int64", i64::MIN as i128, i64::MAX as i128),
            ("uint64", 0, u64::MAX as i128),
        ];
        for (tag, min, max) in cases {
            assert!(to_wire_value(&min.to_string(), tag).is_ok(), "{tag} min");
            assert!(to_wire_value(&max.to_string(), tag).is_ok(), "{tag} max");
            let under = (*min - 1).to_string();
            let over = (*max + 1).to_string();
            assert!(to_wire_value(&under, tag).is_err(), "{tag} below min");
            assert!(to_wire_value(&over, tag).is_err(), "{tag} above max");
        }
    }

    #[test]
    fn float_and_double_reject_bad_syntax() {
        assert_eq!(
            to_wire_value("1.5", "float").unwrap(),
            PlcValue::F32(1.5f32)
        );
        assert_eq!(
            to_wire_value("-2.25", "double").unwrap(),
            PlcValue::F64(-2.25)
        );
        assert!(to_wire_value("abc", "float").is_err());
        assert!(to_wire_value("1.2.3", "double").is_err());
    }

    #[test]
    fn char_passes_through() {
        assert_eq!(
            to_wire_value("hello", "char").unwrap(),
            PlcValue::String("hello".to_string())
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(matches!(
            to_wire_value("1", "wstring"),
            Err(ConsoleError::Conversion(_))
        ));
        assert!(array_type_for("wstring").is_err());
    }

    #[test]
    fn array_type_builds_sized_shape() {
        let shape = array_type_for("int16").unwrap().with_len(3);
        assert_eq!(shape, WireShape::Array(ScalarTag::Int16, 3));
    }

    #[test]
    fn loose_coercion_tries_int_then_float() {
        assert_eq!(coerce_loose("42"), PlcValue::I64(42));
        assert_eq!(coerce_loose("-12.5"), PlcValue::F64(-12.5));
        assert_eq!(coerce_loose("on"), PlcValue::String("on".to_string()));
    }
}
