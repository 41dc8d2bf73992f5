// Licensed under the Apache-2.0 license

//! SPI bus peripheral. The emitted config is the one mutable struct in
//! the generated artifacts; the bus driver patches it at init time.

use super::{config_var, optional_i64, required_i64};
use crate::declaration::PeripheralTable;
use crate::error::CodegenError;
use crate::name::InstanceName;
use crate::plugin::{ParseResult, ParserPlugin};
use crate::value::ConfigValue;

pub struct SpiPlugin;

impl ParserPlugin for SpiPlugin {
    fn type_name(&self) -> &'static str {
        "spi"
    }

    fn version(&self) -> &'static str {
        "1.0"
    }

    fn includes(&self) -> Vec<&'static str> {
        vec!["driver/spi_master.h"]
    }

    fn parse(
        &self,
        name: &str,
        config: &ConfigValue,
        _peripherals: Option<&PeripheralTable>,
    ) -> Result<ParseResult, CodegenError> {
        let instance = InstanceName::parse(name)?;
        let mosi = required_i64(name, config, "mosi")?;
        let sclk = required_i64(name, config, "sclk")?;
        let miso = optional_i64(config, "miso", -1);
        let max_transfer = optional_i64(config, "max_transfer_sz", 4096);

        let init = ConfigValue::Mapping(vec![
            ("mosi_io_num".into(), ConfigValue::Int(mosi)),
            ("miso_io_num".into(), ConfigValue::Int(miso)),
            ("sclk_io_num".into(), ConfigValue::Int(sclk)),
            ("quadwp_io_num".into(), ConfigValue::Int(-1)),
            ("quadhd_io_num".into(), ConfigValue::Int(-1)),
            ("max_transfer_sz".into(), ConfigValue::Int(max_transfer)),
        ]);
        Ok(ParseResult::new(
            "spi_bus_config_t",
            &config_var(&instance.machine_name()),
            init,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miso_defaults_unused() {
        let config = ConfigValue::Mapping(vec![
            ("mosi".into(), ConfigValue::Int(11)),
            ("sclk".into(), ConfigValue::Int(12)),
        ]);
        let result = SpiPlugin.parse("spi-2", &config, None).unwrap();
        assert_eq!(
            result.struct_init.get("miso_io_num"),
            Some(&ConfigValue::Int(-1))
        );
    }
}
