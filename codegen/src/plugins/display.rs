// Licensed under the Apache-2.0 license

//! SPI display panel device. Emits a secondary LEDC backlight config
//! alongside the primary panel config.

use super::{config_var, optional_i64, required_i64};
use crate::declaration::PeripheralTable;
use crate::error::CodegenError;
use crate::name::InstanceName;
use crate::plugin::{ExtraConfig, ParseResult, ParserPlugin};
use crate::resolve::DependencyDescriptor;
use crate::value::ConfigValue;

pub struct DisplayPlugin;

impl ParserPlugin for DisplayPlugin {
    fn type_name(&self) -> &'static str {
        "display"
    }

    fn version(&self) -> &'static str {
        "1.1"
    }

    fn includes(&self) -> Vec<&'static str> {
        vec!["esp_lcd_panel_io.h"]
    }

    fn dependencies(&self) -> Vec<DependencyDescriptor> {
        vec![DependencyDescriptor::on_type("spi")]
    }

    fn parse(
        &self,
        name: &str,
        config: &ConfigValue,
        _peripherals: Option<&PeripheralTable>,
    ) -> Result<ParseResult, CodegenError> {
        let instance = InstanceName::parse(name)?;
        let machine = instance.machine_name();
        let width = required_i64(name, config, "width")?;
        let height = required_i64(name, config, "height")?;
        let dc = optional_i64(config, "dc_gpio", -1);
        let cs = optional_i64(config, "cs_gpio", -1);

        let init = ConfigValue::Mapping(vec![
            ("h_res".into(), ConfigValue::Int(width)),
            ("v_res".into(), ConfigValue::Int(height)),
            ("dc_gpio_num".into(), ConfigValue::Int(dc)),
            ("cs_gpio_num".into(), ConfigValue::Int(cs)),
            (
                "pclk_hz".into(),
                ConfigValue::Int(optional_i64(config, "pclk_hz", 40_000_000)),
            ),
        ]);
        let mut result = ParseResult::new(
            "board_display_cfg_t",
            &config_var(&machine),
            init,
        );

        if let Some(backlight) = config.get("backlight_gpio").and_then(|v| v.as_i64()) {
            result.extra_configs.push(ExtraConfig {
                struct_type: "ledc_channel_config_t".to_string(),
                struct_var: format!("bsp_{}_backlight", machine),
                struct_init: ConfigValue::Mapping(vec![
                    ("gpio_num".into(), ConfigValue::Int(backlight)),
                    (
                        "speed_mode".into(),
                        ConfigValue::Str("LEDC_LOW_SPEED_MODE".into()),
                    ),
                    ("channel".into(), ConfigValue::Str("LEDC_CHANNEL_0".into())),
                    ("duty".into(), ConfigValue::Int(0)),
                ]),
            });
            result.extra_includes.push("driver/ledc.h".to_string());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlight_produces_extra_config() {
        let config = ConfigValue::Mapping(vec![
            ("width".into(), ConfigValue::Int(320)),
            ("height".into(), ConfigValue::Int(240)),
            ("backlight_gpio".into(), ConfigValue::Int(47)),
        ]);
        let result = DisplayPlugin.parse("display-0", &config, None).unwrap();
        assert_eq!(result.extra_configs.len(), 1);
        assert_eq!(result.extra_configs[0].struct_var, "bsp_display_0_0_backlight");
        assert_eq!(result.extra_includes, vec!["driver/ledc.h".to_string()]);
    }

    #[test]
    fn test_no_backlight_no_extras() {
        let config = ConfigValue::Mapping(vec![
            ("width".into(), ConfigValue::Int(320)),
            ("height".into(), ConfigValue::Int(240)),
        ]);
        let result = DisplayPlugin.parse("display-0", &config, None).unwrap();
        assert!(result.extra_configs.is_empty());
        assert!(result.extra_includes.is_empty());
    }
}
