// Licensed under the Apache-2.0 license

//! Builtin parser plugins and the explicit registration manifest.
//!
//! Each module translates one component type's declaration body into a
//! [`crate::plugin::ParseResult`]. The per-type field mapping is
//! intentionally mechanical; the interesting contract lives in
//! [`crate::plugin`].

mod audio_codec;
mod button;
mod custom;
mod display;
mod gpio;
mod i2c;
mod i2s;
mod spi;

use crate::error::CodegenError;
use crate::plugin::PluginEntry;
use crate::value::ConfigValue;

/// The peripheral-category manifest, in registration order.
pub fn peripheral_manifest() -> Vec<PluginEntry> {
    vec![
        PluginEntry::new("periph_i2c", Box::new(i2c::I2cPlugin)),
        PluginEntry::new("periph_gpio", Box::new(gpio::GpioPlugin)),
        PluginEntry::new("periph_spi", Box::new(spi::SpiPlugin)),
        PluginEntry::new("periph_i2s", Box::new(i2s::I2sPlugin)),
    ]
}

/// The device-category manifest, in registration order.
pub fn device_manifest() -> Vec<PluginEntry> {
    vec![
        PluginEntry::new("dev_audio_codec", Box::new(audio_codec::AudioCodecPlugin)),
        PluginEntry::new("dev_display", Box::new(display::DisplayPlugin)),
        PluginEntry::new("dev_button", Box::new(button::ButtonPlugin)),
        PluginEntry::new("dev_custom", Box::new(custom::CustomPlugin)),
    ]
}

pub(crate) fn required_i64(
    name: &str,
    config: &ConfigValue,
    field: &str,
) -> Result<i64, CodegenError> {
    config
        .get(field)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| CodegenError::Plugin {
            name: name.to_string(),
            reason: format!("missing or non-integer field `{}`", field),
        })
}

pub(crate) fn optional_i64(config: &ConfigValue, field: &str, default: i64) -> i64 {
    config.get(field).and_then(|v| v.as_i64()).unwrap_or(default)
}

pub(crate) fn config_var(machine_name: &str) -> String {
    format!("bsp_{}_cfg", machine_name)
}
