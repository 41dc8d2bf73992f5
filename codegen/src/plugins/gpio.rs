// Licensed under the Apache-2.0 license

//! GPIO pin-group peripheral.

use super::config_var;
use crate::declaration::PeripheralTable;
use crate::error::CodegenError;
use crate::name::InstanceName;
use crate::plugin::{ParseResult, ParserPlugin};
use crate::value::ConfigValue;

pub struct GpioPlugin;

impl ParserPlugin for GpioPlugin {
    fn type_name(&self) -> &'static str {
        "gpio"
    }

    fn version(&self) -> &'static str {
        "1.0"
    }

    fn includes(&self) -> Vec<&'static str> {
        vec!["driver/gpio.h"]
    }

    fn parse(
        &self,
        name: &str,
        config: &ConfigValue,
        _peripherals: Option<&PeripheralTable>,
    ) -> Result<ParseResult, CodegenError> {
        let instance = InstanceName::parse(name)?;
        let pins = config
            .get("pins")
            .and_then(|v| v.as_sequence())
            .ok_or_else(|| CodegenError::Plugin {
                name: name.to_string(),
                reason: "missing `pins` sequence".to_string(),
            })?;
        let mut mask: i64 = 0;
        for pin in pins {
            let pin = pin.as_i64().ok_or_else(|| CodegenError::Plugin {
                name: name.to_string(),
                reason: "non-integer pin number".to_string(),
            })?;
            if !(0..64).contains(&pin) {
                return Err(CodegenError::Plugin {
                    name: name.to_string(),
                    reason: format!("pin {} out of range", pin),
                });
            }
            mask |= 1 << pin;
        }

        let mode = match config.get("mode").and_then(|v| v.as_str()) {
            Some("input") => "GPIO_MODE_INPUT",
            Some("input_output") => "GPIO_MODE_INPUT_OUTPUT",
            _ => "GPIO_MODE_OUTPUT",
        };
        let pull_up = config
            .get("pull_up")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let pull_down = config
            .get("pull_down")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let init = ConfigValue::Mapping(vec![
            ("pin_bit_mask".into(), ConfigValue::Int(mask)),
            ("mode".into(), ConfigValue::Str(mode.into())),
            (
                "pull_up_en".into(),
                ConfigValue::Str(pull_symbol("GPIO_PULLUP", pull_up).into()),
            ),
            (
                "pull_down_en".into(),
                ConfigValue::Str(pull_symbol("GPIO_PULLDOWN", pull_down).into()),
            ),
            (
                "intr_type".into(),
                ConfigValue::Str("GPIO_INTR_DISABLE".into()),
            ),
        ]);
        Ok(ParseResult::new(
            "gpio_config_t",
            &config_var(&instance.machine_name()),
            init,
        ))
    }
}

fn pull_symbol(base: &str, enabled: bool) -> String {
    if enabled {
        format!("{}_ENABLE", base)
    } else {
        format!("{}_DISABLE", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_mask_accumulates() {
        let config = ConfigValue::Mapping(vec![(
            "pins".into(),
            ConfigValue::Sequence(vec![ConfigValue::Int(3), ConfigValue::Int(35)]),
        )]);
        let result = GpioPlugin.parse("gpio-3", &config, None).unwrap();
        let mask = result.struct_init.get("pin_bit_mask").unwrap();
        assert_eq!(mask, &ConfigValue::Int((1 << 3) | (1i64 << 35)));
    }

    #[test]
    fn test_out_of_range_pin_is_rejected() {
        let config = ConfigValue::Mapping(vec![(
            "pins".into(),
            ConfigValue::Sequence(vec![ConfigValue::Int(64)]),
        )]);
        assert!(GpioPlugin.parse("gpio-0", &config, None).is_err());
    }
}
