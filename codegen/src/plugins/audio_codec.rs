// Licensed under the Apache-2.0 license

//! Audio codec device, addressed over an I2C bus reference.

use super::{config_var, optional_i64};
use crate::declaration::PeripheralTable;
use crate::error::CodegenError;
use crate::name::InstanceName;
use crate::plugin::{ParseResult, ParserPlugin};
use crate::resolve::DependencyDescriptor;
use crate::value::{flatten, ConfigValue};

pub struct AudioCodecPlugin;

impl ParserPlugin for AudioCodecPlugin {
    fn type_name(&self) -> &'static str {
        "audio_codec"
    }

    fn version(&self) -> &'static str {
        "1.0"
    }

    fn dependencies(&self) -> Vec<DependencyDescriptor> {
        vec![DependencyDescriptor::on_type("i2c")]
    }

    fn parse(
        &self,
        name: &str,
        config: &ConfigValue,
        peripherals: Option<&PeripheralTable>,
    ) -> Result<ParseResult, CodegenError> {
        let instance = InstanceName::parse(name)?;
        let (bus, address) = i2c_reference(name, config, peripherals)?;
        let init = ConfigValue::Mapping(vec![
            ("i2c_port".into(), ConfigValue::Int(bus)),
            ("i2c_address".into(), ConfigValue::Int(address)),
            (
                "reset_gpio".into(),
                ConfigValue::Int(optional_i64(config, "reset_gpio", -1)),
            ),
        ]);
        Ok(ParseResult::new(
            "board_audio_codec_cfg_t",
            &config_var(&instance.machine_name()),
            init,
        ))
    }
}

/// Find the codec's I2C bus reference: the port comes from the referenced
/// peripheral's declared index, the device address from the reference's
/// inline override.
fn i2c_reference(
    name: &str,
    config: &ConfigValue,
    peripherals: Option<&PeripheralTable>,
) -> Result<(i64, i64), CodegenError> {
    let refs = config
        .get("peripherals")
        .and_then(|v| v.as_sequence())
        .map(flatten)
        .unwrap_or_default();
    for reference in &refs {
        let (ref_name, address) = match reference {
            ConfigValue::Str(s) => (s.as_str(), 0x18),
            ConfigValue::Mapping(_) => {
                let Some(ref_name) = reference.get("name").and_then(|v| v.as_str()) else {
                    continue;
                };
                (ref_name, optional_i64(reference, "address", 0x18))
            }
            _ => continue,
        };
        let Some(table) = peripherals else { continue };
        if let Some(declaration) = table.get(ref_name) {
            if declaration.type_name == "i2c" {
                let port = InstanceName::parse(ref_name)
                    .map(|n| i64::from(n.index.max(0)))
                    .unwrap_or(0);
                return Ok((port, address));
            }
        }
    }
    Err(CodegenError::Plugin {
        name: name.to_string(),
        reason: "no i2c peripheral reference".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{document_from_yaml, parse_peripherals};
    use crate::plugin::{Category, PluginRegistry};
    use crate::plugins;

    fn table() -> PeripheralTable {
        let registry = PluginRegistry::load(
            Category::Peripheral,
            plugins::peripheral_manifest(),
            "esp32s3",
        )
        .unwrap();
        let doc = document_from_yaml(
            std::path::Path::new("test.yml"),
            "peripherals:\n  - {name: i2c-1, type: i2c, sda: 1, scl: 2}",
        )
        .unwrap();
        parse_peripherals(&doc, &registry).unwrap()
    }

    #[test]
    fn test_address_override_and_port_inheritance() {
        let config = ConfigValue::Mapping(vec![(
            "peripherals".into(),
            ConfigValue::Sequence(vec![ConfigValue::Mapping(vec![
                ("name".into(), ConfigValue::Str("i2c-1".into())),
                ("address".into(), ConfigValue::Int(0x36)),
            ])]),
        )]);
        let result = AudioCodecPlugin
            .parse("audio_codec-0", &config, Some(&table()))
            .unwrap();
        assert_eq!(result.struct_init.get("i2c_port"), Some(&ConfigValue::Int(1)));
        assert_eq!(
            result.struct_init.get("i2c_address"),
            Some(&ConfigValue::Int(0x36))
        );
    }

    #[test]
    fn test_missing_bus_reference_is_rejected() {
        let config = ConfigValue::Mapping(vec![]);
        let err = AudioCodecPlugin
            .parse("audio_codec-0", &config, Some(&table()))
            .unwrap_err();
        assert!(matches!(err, CodegenError::Plugin { .. }));
    }
}
