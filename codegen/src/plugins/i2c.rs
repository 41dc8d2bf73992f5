// Licensed under the Apache-2.0 license

//! I2C master bus peripheral.

use super::{config_var, optional_i64, required_i64};
use crate::declaration::PeripheralTable;
use crate::error::CodegenError;
use crate::name::InstanceName;
use crate::plugin::{ParseResult, ParserPlugin};
use crate::value::ConfigValue;

pub struct I2cPlugin;

impl ParserPlugin for I2cPlugin {
    fn type_name(&self) -> &'static str {
        "i2c"
    }

    fn version(&self) -> &'static str {
        "1.0"
    }

    fn includes(&self) -> Vec<&'static str> {
        vec!["driver/i2c_master.h"]
    }

    fn parse(
        &self,
        name: &str,
        config: &ConfigValue,
        _peripherals: Option<&PeripheralTable>,
    ) -> Result<ParseResult, CodegenError> {
        let instance = InstanceName::parse(name)?;
        let port = optional_i64(config, "port", i64::from(instance.index.max(0)));
        let sda = required_i64(name, config, "sda")?;
        let scl = required_i64(name, config, "scl")?;
        let pullup = config
            .get("pullup")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        let init = ConfigValue::Mapping(vec![
            ("i2c_port".into(), ConfigValue::Int(port)),
            ("sda_io_num".into(), ConfigValue::Int(sda)),
            ("scl_io_num".into(), ConfigValue::Int(scl)),
            (
                "clk_source".into(),
                ConfigValue::Str("I2C_CLK_SRC_DEFAULT".into()),
            ),
            ("glitch_ignore_cnt".into(), ConfigValue::Int(7)),
            (
                "flags".into(),
                ConfigValue::Mapping(vec![(
                    "enable_internal_pullup".into(),
                    ConfigValue::Bool(pullup),
                )]),
            ),
        ]);
        Ok(ParseResult::new(
            "i2c_master_bus_config_t",
            &config_var(&instance.machine_name()),
            init,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_port_from_index() {
        let config = ConfigValue::Mapping(vec![
            ("sda".into(), ConfigValue::Int(1)),
            ("scl".into(), ConfigValue::Int(2)),
        ]);
        let result = I2cPlugin.parse("i2c-1", &config, None).unwrap();
        assert_eq!(result.struct_var, "bsp_i2c_1_0_cfg");
        assert_eq!(result.struct_init.get("i2c_port"), Some(&ConfigValue::Int(1)));
    }

    #[test]
    fn test_missing_pin_is_rejected() {
        let config = ConfigValue::Mapping(vec![("sda".into(), ConfigValue::Int(1))]);
        let err = I2cPlugin.parse("i2c-0", &config, None).unwrap_err();
        assert!(matches!(err, CodegenError::Plugin { .. }));
    }
}
