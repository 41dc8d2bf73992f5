// Licensed under the Apache-2.0 license

//! Simple GPIO button device.

use super::{config_var, optional_i64, required_i64};
use crate::declaration::PeripheralTable;
use crate::error::CodegenError;
use crate::name::InstanceName;
use crate::plugin::{ParseResult, ParserPlugin};
use crate::resolve::DependencyDescriptor;
use crate::value::ConfigValue;

pub struct ButtonPlugin;

impl ParserPlugin for ButtonPlugin {
    fn type_name(&self) -> &'static str {
        "button"
    }

    fn version(&self) -> &'static str {
        "1.0"
    }

    fn dependencies(&self) -> Vec<DependencyDescriptor> {
        vec![DependencyDescriptor::on_type("gpio")]
    }

    fn parse(
        &self,
        name: &str,
        config: &ConfigValue,
        _peripherals: Option<&PeripheralTable>,
    ) -> Result<ParseResult, CodegenError> {
        let instance = InstanceName::parse(name)?;
        let gpio = required_i64(name, config, "gpio")?;
        let init = ConfigValue::Mapping(vec![
            ("gpio_num".into(), ConfigValue::Int(gpio)),
            (
                "active_level".into(),
                ConfigValue::Int(optional_i64(config, "active_level", 0)),
            ),
            (
                "long_press_ms".into(),
                ConfigValue::Int(optional_i64(config, "long_press_ms", 1500)),
            ),
        ]);
        Ok(ParseResult::new(
            "board_button_cfg_t",
            &config_var(&instance.machine_name()),
            init,
        ))
    }
}
