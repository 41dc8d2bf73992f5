// Licensed under the Apache-2.0 license

//! Free-form device type. The struct shape is derived from the declared
//! fields, so a standalone type definition is emitted into the custom
//! types header before the config value is used.

use super::config_var;
use crate::declaration::PeripheralTable;
use crate::error::CodegenError;
use crate::name::InstanceName;
use crate::plugin::{ParseResult, ParserPlugin};
use crate::value::ConfigValue;
use std::fmt::Write;

/// Declaration keys that are not part of the custom payload.
const RESERVED_KEYS: &[&str] = &[
    "name", "type", "subtype", "role", "format", "init_skip", "peripherals",
];

pub struct CustomPlugin;

impl ParserPlugin for CustomPlugin {
    fn type_name(&self) -> &'static str {
        "custom"
    }

    fn version(&self) -> &'static str {
        "1.0"
    }

    fn parse(
        &self,
        name: &str,
        config: &ConfigValue,
        _peripherals: Option<&PeripheralTable>,
    ) -> Result<ParseResult, CodegenError> {
        let instance = InstanceName::parse(name)?;
        let machine = instance.machine_name();
        let struct_type = format!("board_{}_cfg_t", machine);

        let fields = config.as_mapping().unwrap_or(&[]);
        let mut definition = String::from("typedef struct {\n");
        let mut init = Vec::new();
        for (key, value) in fields {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let c_type = match value {
                ConfigValue::Bool(_) => "bool",
                ConfigValue::Int(_) => "int",
                ConfigValue::Float(_) => "float",
                ConfigValue::Str(_) => "const char *",
                _ => {
                    return Err(CodegenError::Plugin {
                        name: name.to_string(),
                        reason: format!("field `{}` has unsupported shape", key),
                    })
                }
            };
            writeln!(definition, "    {} {};", c_type, key).unwrap();
            init.push((key.clone(), value.clone()));
        }
        write!(definition, "}} {};", struct_type).unwrap();

        let mut result = ParseResult::new(
            &struct_type,
            &config_var(&machine),
            ConfigValue::Mapping(init),
        );
        result.struct_definition = Some(definition);
        Ok(result)
    }
}
