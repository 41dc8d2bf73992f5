// Licensed under the Apache-2.0 license

//! Emission of the per-category generated C source: includes, custom type
//! definitions, static configuration structs, and the linked descriptor
//! array consumed by the firmware at init time.

use crate::declaration::Declaration;
use crate::emit::serialize::serialize_value;
use crate::plugin::{Category, ParseResult, PluginRegistry};
use std::collections::BTreeSet;
use std::fmt::Write;

/// The rendered output for one category.
#[derive(Clone, Debug, Default)]
pub struct Artifact {
    /// The generated C source file content.
    pub source: String,
    /// Custom struct definitions destined for the shared custom-types
    /// header, in first-use order. Empty when no dynamically-shaped type
    /// is present.
    pub custom_definitions: Vec<String>,
}

/// Name of the header holding dynamically-shaped struct definitions.
pub const CUSTOM_TYPES_HEADER: &str = "board_custom_types.h";

/// Header declaring the descriptor types the generated arrays use.
pub const DESCRIPTOR_HEADER: &str = "board_types.h";

impl Category {
    /// C type of this category's descriptor records.
    pub fn descriptor_type(&self) -> &'static str {
        match self {
            Category::Peripheral => "board_periph_desc_t",
            Category::Device => "board_device_desc_t",
        }
    }

    /// Name of this category's generated descriptor array.
    pub fn descriptor_array(&self) -> &'static str {
        match self {
            Category::Peripheral => "g_board_peripherals",
            Category::Device => "g_board_devices",
        }
    }

    /// File name of this category's generated source.
    pub fn artifact_file(&self) -> &'static str {
        match self {
            Category::Peripheral => "board_peripherals.c",
            Category::Device => "board_devices.c",
        }
    }
}

/// Emit the complete source artifact for one category.
///
/// Pairs are consumed in input order. If the input is empty the
/// descriptor array still contains exactly one all-zero sentinel element;
/// consumers iterate until `next == NULL` and must never see a
/// zero-length array.
pub fn emit_category(
    category: Category,
    pairs: &[(Declaration, ParseResult)],
    registry: &PluginRegistry,
) -> Artifact {
    let mut artifact = Artifact::default();

    // Custom struct definitions, deduplicated in first-use order.
    for (_, result) in pairs {
        if let Some(definition) = &result.struct_definition {
            if !artifact.custom_definitions.contains(definition) {
                artifact.custom_definitions.push(definition.clone());
            }
        }
    }

    let out = &mut artifact.source;
    writeln!(out, "/* Generated board support data. Do not edit. */").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#include <stddef.h>").unwrap();
    for include in collect_includes(pairs, registry) {
        writeln!(out, "#include \"{}\"", include).unwrap();
    }
    writeln!(out, "#include \"{}\"", DESCRIPTOR_HEADER).unwrap();
    if !artifact.custom_definitions.is_empty() {
        writeln!(out, "#include \"{}\"", CUSTOM_TYPES_HEADER).unwrap();
    }
    writeln!(out).unwrap();

    for (declaration, result) in pairs {
        for extra in &result.extra_configs {
            writeln!(
                out,
                "static const {} {} = {};",
                extra.struct_type,
                extra.struct_var,
                serialize_value(&extra.struct_var, &extra.struct_init, 0)
            )
            .unwrap();
            writeln!(out).unwrap();
        }
        // SPI peripheral configs are patched at runtime by the bus driver,
        // so they alone lose the const qualifier.
        let qualifier = if category == Category::Peripheral && declaration.type_name == "spi" {
            "static"
        } else {
            "static const"
        };
        writeln!(
            out,
            "{} {} {} = {};",
            qualifier,
            result.struct_type,
            result.struct_var,
            serialize_value(&result.struct_var, &result.struct_init, 0)
        )
        .unwrap();
        writeln!(out).unwrap();
    }

    emit_descriptor_array(out, category, pairs);
    artifact
}

/// Render the custom-types header from the definitions of both categories.
pub fn emit_custom_header(definitions: &[String]) -> String {
    let mut out = String::new();
    writeln!(out, "/* Generated board support data. Do not edit. */").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#pragma once").unwrap();
    writeln!(out).unwrap();
    for definition in definitions {
        writeln!(out, "{}", definition.trim_end()).unwrap();
        writeln!(out).unwrap();
    }
    out
}

fn collect_includes(
    pairs: &[(Declaration, ParseResult)],
    registry: &PluginRegistry,
) -> BTreeSet<String> {
    let mut includes = BTreeSet::new();
    for (declaration, result) in pairs {
        if let Some(plugin) = registry.get(&declaration.type_name) {
            includes.extend(plugin.includes().iter().map(|s| s.to_string()));
        }
        includes.extend(result.extra_includes.iter().cloned());
    }
    includes
}

fn emit_descriptor_array(
    out: &mut String,
    category: Category,
    pairs: &[(Declaration, ParseResult)],
) {
    let desc_type = category.descriptor_type();
    let array = category.descriptor_array();
    writeln!(out, "const {} {}[] = {{", desc_type, array).unwrap();
    if pairs.is_empty() {
        // Sentinel record: a single all-zero element.
        writeln!(out, "    {{").unwrap();
        writeln!(out, "        .name = NULL,").unwrap();
        writeln!(out, "        .type = NULL,").unwrap();
        writeln!(out, "        .role = NULL,").unwrap();
        writeln!(out, "        .format = NULL,").unwrap();
        writeln!(out, "        .cfg = NULL,").unwrap();
        writeln!(out, "        .init_skip = false,").unwrap();
        writeln!(out, "        .next = NULL,").unwrap();
        writeln!(out, "    }},").unwrap();
    } else {
        for (i, (declaration, result)) in pairs.iter().enumerate() {
            let next = if i + 1 < pairs.len() {
                format!("({} *)&{}[{}]", desc_type, array, i + 1)
            } else {
                "NULL".to_string()
            };
            writeln!(out, "    {{").unwrap();
            writeln!(out, "        .name = \"{}\",", declaration.name).unwrap();
            writeln!(out, "        .type = \"{}\",", declaration.type_name).unwrap();
            writeln!(out, "        .role = {},", optional_str(&declaration.role)).unwrap();
            writeln!(out, "        .format = {},", optional_str(&declaration.format)).unwrap();
            writeln!(out, "        .cfg = (void *)&{},", result.struct_var).unwrap();
            writeln!(out, "        .init_skip = {},", declaration.init_skip).unwrap();
            writeln!(out, "        .next = {},", next).unwrap();
            writeln!(out, "    }},").unwrap();
        }
    }
    writeln!(out, "}};").unwrap();
}

fn optional_str(value: &Option<String>) -> String {
    match value {
        Some(s) => format!("\"{}\"", s),
        None => "NULL".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins;
    use crate::plugin::PluginRegistry;
    use crate::value::ConfigValue;

    fn declaration(name: &str, type_name: &str) -> Declaration {
        Declaration {
            name: name.to_string(),
            category: Category::Peripheral,
            type_name: type_name.to_string(),
            sub_type: None,
            role: None,
            format: None,
            init_skip: false,
            peripheral_refs: Vec::new(),
            body: ConfigValue::Null,
        }
    }

    fn registry() -> PluginRegistry {
        PluginRegistry::load(
            Category::Peripheral,
            plugins::peripheral_manifest(),
            "esp32s3",
        )
        .unwrap()
    }

    #[test]
    fn test_empty_category_emits_sentinel() {
        let artifact = emit_category(Category::Device, &[], &registry());
        assert!(artifact
            .source
            .contains("const board_device_desc_t g_board_devices[] = {"));
        // Exactly one element, all zero/null.
        assert_eq!(artifact.source.matches(".next = ").count(), 1);
        assert!(artifact.source.contains(".next = NULL,"));
        assert!(artifact.source.contains(".cfg = NULL,"));
        assert!(!artifact.source.contains("[] = {\n};"));
    }

    #[test]
    fn test_descriptor_chaining() {
        let pairs = vec![
            (
                declaration("i2c-0", "i2c"),
                ParseResult::new(
                    "i2c_master_bus_config_t",
                    "bsp_i2c_0_0_cfg",
                    ConfigValue::Mapping(vec![("sda_io_num".into(), ConfigValue::Int(1))]),
                ),
            ),
            (
                declaration("gpio-3", "gpio"),
                ParseResult::new(
                    "gpio_config_t",
                    "bsp_gpio_3_0_cfg",
                    ConfigValue::Mapping(vec![(
                        "pin_bit_mask".into(),
                        ConfigValue::Int(1 << 3),
                    )]),
                ),
            ),
        ];
        let artifact = emit_category(Category::Peripheral, &pairs, &registry());
        assert!(artifact
            .source
            .contains(".next = (board_periph_desc_t *)&g_board_peripherals[1],"));
        // Last element terminates the chain.
        let last = artifact.source.rfind(".next = ").unwrap();
        assert!(artifact.source[last..].starts_with(".next = NULL,"));
        assert!(artifact.source.contains(".pin_bit_mask = 0x8ULL,"));
    }

    #[test]
    fn test_spi_configs_are_mutable() {
        let pairs = vec![(
            declaration("spi-2", "spi"),
            ParseResult::new(
                "spi_bus_config_t",
                "bsp_spi_2_0_cfg",
                ConfigValue::Mapping(vec![("mosi_io_num".into(), ConfigValue::Int(11))]),
            ),
        )];
        let artifact = emit_category(Category::Peripheral, &pairs, &registry());
        assert!(artifact
            .source
            .contains("static spi_bus_config_t bsp_spi_2_0_cfg = {"));
        assert!(!artifact
            .source
            .contains("static const spi_bus_config_t bsp_spi_2_0_cfg"));
    }

    #[test]
    fn test_includes_are_sorted_and_deduplicated() {
        let pairs = vec![
            (
                declaration("i2c-0", "i2c"),
                ParseResult::new("i2c_master_bus_config_t", "a", ConfigValue::Null),
            ),
            (
                declaration("i2c-1", "i2c"),
                ParseResult::new("i2c_master_bus_config_t", "b", ConfigValue::Null),
            ),
        ];
        let artifact = emit_category(Category::Peripheral, &pairs, &registry());
        let count = artifact
            .source
            .matches("#include \"driver/i2c_master.h\"")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_extra_configs_and_custom_definitions() {
        let mut result = ParseResult::new(
            "board_button_cfg_t",
            "bsp_button_0_0_cfg",
            ConfigValue::Mapping(vec![("gpio_num".into(), ConfigValue::Int(0))]),
        );
        result.struct_definition = Some(
            "typedef struct {\n    int gpio_num;\n} board_button_cfg_t;".to_string(),
        );
        result.extra_configs.push(crate::plugin::ExtraConfig {
            struct_type: "board_debounce_cfg_t".into(),
            struct_var: "bsp_button_0_0_debounce".into(),
            struct_init: ConfigValue::Mapping(vec![("ms".into(), ConfigValue::Int(20))]),
        });
        let pairs = vec![(declaration("button-0", "button"), result)];
        let artifact = emit_category(Category::Device, &pairs, &registry());
        assert_eq!(artifact.custom_definitions.len(), 1);
        assert!(artifact.source.contains("#include \"board_custom_types.h\""));
        // Extra config precedes the primary struct.
        let extra_pos = artifact.source.find("bsp_button_0_0_debounce").unwrap();
        let primary_pos = artifact
            .source
            .find("board_button_cfg_t bsp_button_0_0_cfg")
            .unwrap();
        assert!(extra_pos < primary_pos);

        let header = emit_custom_header(&artifact.custom_definitions);
        assert!(header.contains("#pragma once"));
        assert!(header.contains("typedef struct"));
    }
}
