// Licensed under the Apache-2.0 license

//! I2S standard-mode peripheral, typically declared with a role
//! (`mic`, `speaker`) and an audio format.

use super::{config_var, optional_i64, required_i64};
use crate::declaration::PeripheralTable;
use crate::error::CodegenError;
use crate::name::InstanceName;
use crate::plugin::{ParseResult, ParserPlugin};
use crate::value::ConfigValue;

pub struct I2sPlugin;

impl ParserPlugin for I2sPlugin {
    fn type_name(&self) -> &'static str {
        "i2s"
    }

    fn version(&self) -> &'static str {
        "1.0"
    }

    fn includes(&self) -> Vec<&'static str> {
        vec!["driver/i2s_std.h"]
    }

    fn parse(
        &self,
        name: &str,
        config: &ConfigValue,
        _peripherals: Option<&PeripheralTable>,
    ) -> Result<ParseResult, CodegenError> {
        let instance = InstanceName::parse(name)?;
        let bclk = required_i64(name, config, "bclk")?;
        let ws = required_i64(name, config, "ws")?;
        let dout = optional_i64(config, "dout", -1);
        let din = optional_i64(config, "din", -1);
        let sample_rate = optional_i64(config, "sample_rate", 48000);
        let slot_mode = match config.get("channels").and_then(|v| v.as_i64()) {
            Some(1) => "I2S_SLOT_MODE_MONO",
            _ => "I2S_SLOT_MODE_STEREO",
        };

        let init = ConfigValue::Mapping(vec![
            (
                "clk_cfg".into(),
                ConfigValue::Mapping(vec![
                    ("sample_rate_hz".into(), ConfigValue::Int(sample_rate)),
                    (
                        "clk_src".into(),
                        ConfigValue::Str("I2S_CLK_SRC_DEFAULT".into()),
                    ),
                    (
                        "mclk_multiple".into(),
                        ConfigValue::Str("I2S_MCLK_MULTIPLE_256".into()),
                    ),
                ]),
            ),
            (
                "slot_cfg".into(),
                ConfigValue::Mapping(vec![
                    (
                        "data_bit_width".into(),
                        ConfigValue::Str("I2S_DATA_BIT_WIDTH_16BIT".into()),
                    ),
                    ("slot_mode".into(), ConfigValue::Str(slot_mode.into())),
                ]),
            ),
            (
                "gpio_cfg".into(),
                ConfigValue::Mapping(vec![
                    ("bclk".into(), ConfigValue::Int(bclk)),
                    ("ws".into(), ConfigValue::Int(ws)),
                    ("dout".into(), ConfigValue::Int(dout)),
                    ("din".into(), ConfigValue::Int(din)),
                ]),
            ),
        ]);
        Ok(ParseResult::new(
            "i2s_std_config_t",
            &config_var(&instance.machine_name()),
            init,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_config_shape() {
        let config = ConfigValue::Mapping(vec![
            ("bclk".into(), ConfigValue::Int(9)),
            ("ws".into(), ConfigValue::Int(45)),
            ("din".into(), ConfigValue::Int(10)),
            ("channels".into(), ConfigValue::Int(1)),
        ]);
        let result = I2sPlugin.parse("i2s_mic-0", &config, None).unwrap();
        let slot = result.struct_init.get("slot_cfg").unwrap();
        assert_eq!(
            slot.get("slot_mode"),
            Some(&ConfigValue::Str("I2S_SLOT_MODE_MONO".into()))
        );
        assert_eq!(result.struct_var, "bsp_i2s_mic_0_0_cfg");
    }
}
