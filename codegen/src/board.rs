// Licensed under the Apache-2.0 license

//! Board metadata: a small record read from `board.toml`, used to drive
//! chip-specific plugin filtering and written back out as a generated
//! artifact.

use crate::error::CodegenError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BoardInfo {
    pub name: String,
    pub chip: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub manufacturer: String,
}

impl BoardInfo {
    pub fn from_file(path: &Path) -> Result<BoardInfo, CodegenError> {
        let text = std::fs::read_to_string(path).map_err(|err| CodegenError::Document {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        toml::from_str(&text).map_err(|err| CodegenError::Document {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), CodegenError> {
        let text = toml::to_string_pretty(self).map_err(|err| CodegenError::Document {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// The board's Kconfig selection symbol, e.g. `CONFIG_BOARD_CORES3`.
    pub fn board_option(&self) -> String {
        let mut key = String::from("CONFIG_BOARD_");
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                key.push(c.to_ascii_uppercase());
            } else {
                key.push('_');
            }
        }
        key
    }
}
