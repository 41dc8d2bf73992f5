// Licensed under the Apache-2.0 license

//! Serialization of [`ConfigValue`] trees into C struct-literal text.
//!
//! Strings are classified as symbolic constants (emitted bare) when they
//! look like vendor macros or enum values; everything else becomes a
//! quoted string literal. Two field names force hexadecimal integer
//! formatting regardless of the value: the 64-bit `pin_bit_mask` (with a
//! `ULL` suffix) and channel-mask fields.

use crate::value::ConfigValue;
use std::fmt::Write;

/// Vendor macro/enum prefixes whose strings are emitted bare.
pub const SYMBOL_PREFIXES: &[&str] = &[
    "GPIO_NUM_", "GPIO_MODE_", "GPIO_PULL", "SPI", "I2S_", "I2C_", "LEDC_", "ESP_", "ADC_",
    "UART_",
];

const INDENT: &str = "    ";

/// True if the string should be emitted as a bare symbolic constant:
/// entirely upper-case with an underscore, or starting with a registered
/// vendor prefix.
pub fn is_symbolic_constant(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let all_upper = s.contains('_')
        && s.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    all_upper || SYMBOL_PREFIXES.iter().any(|prefix| s.starts_with(prefix))
}

/// Serialize a value as the right-hand side of a struct-literal field.
///
/// `field` is the name of the field being assigned; it drives the
/// hexadecimal special cases. Nested content is indented one level past
/// `indent`.
pub fn serialize_value(field: &str, value: &ConfigValue, indent: usize) -> String {
    match value {
        ConfigValue::Null => "NULL".to_string(),
        ConfigValue::Bool(b) => b.to_string(),
        ConfigValue::Int(i) => serialize_int(field, *i),
        ConfigValue::Float(f) => f.to_string(),
        ConfigValue::Str(s) => serialize_str(s),
        ConfigValue::Mapping(fields) => serialize_mapping(fields, indent),
        ConfigValue::Sequence(items) => serialize_sequence(field, items, indent),
    }
}

fn serialize_int(field: &str, value: i64) -> String {
    // Mask fields are hex regardless of value; a negative value formats
    // as its 64-bit two's-complement bit pattern.
    if field == "pin_bit_mask" {
        return format!("0x{:x}ULL", value);
    }
    if field.ends_with("chan_mask") {
        return format!("0x{:x}", value);
    }
    value.to_string()
}

fn serialize_str(s: &str) -> String {
    if is_symbolic_constant(s) {
        s.to_string()
    } else {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn serialize_mapping(fields: &[(String, ConfigValue)], indent: usize) -> String {
    if fields.is_empty() {
        return "{}".to_string();
    }
    let mut out = String::from("{\n");
    for (key, value) in fields {
        writeln!(
            out,
            "{}.{} = {},",
            INDENT.repeat(indent + 1),
            key,
            serialize_value(key, value, indent + 1)
        )
        .unwrap();
    }
    write!(out, "{}}}", INDENT.repeat(indent)).unwrap();
    out
}

fn serialize_sequence(field: &str, items: &[ConfigValue], indent: usize) -> String {
    if items.is_empty() {
        return "{}".to_string();
    }
    if items.iter().all(|v| matches!(v, ConfigValue::Mapping(_))) {
        // Array of structs: one nested initializer per line.
        let mut out = String::from("{\n");
        for item in items {
            writeln!(
                out,
                "{}{},",
                INDENT.repeat(indent + 1),
                serialize_value(field, item, indent + 1)
            )
            .unwrap();
        }
        write!(out, "{}}}", INDENT.repeat(indent)).unwrap();
        out
    } else {
        let parts: Vec<String> = items
            .iter()
            .map(|item| serialize_value(field, item, indent))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}
