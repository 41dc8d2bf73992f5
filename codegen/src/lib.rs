// Licensed under the Apache-2.0 license

//! Board support code generator.
//!
//! This crate turns declarative peripheral and device descriptions of a
//! board into C source artifacts: per-category configuration structs, a
//! linked descriptor array walked by the firmware at init time, a Kconfig
//! feature menu, and a patched sdkconfig.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use board_codegen::{generate, BoardContext};
//!
//! let ctx = BoardContext::load(
//!     Path::new("boards/cores3"),
//!     Path::new("build/generated"),
//! ).unwrap();
//! let report = generate(&ctx).unwrap();
//! println!("{} peripherals, {} devices", report.peripherals, report.devices);
//! ```
//!
//! ## Module Organization
//!
//! - [`value`]: The closed configuration value model ([`ConfigValue`])
//! - [`name`]: Instance naming grammar ([`InstanceName`])
//! - [`plugin`]: The parser-plugin contract and registry
//! - [`plugins`]: Builtin per-type plugins and the registration manifest
//! - [`declaration`]: Declaration document parsing
//! - [`resolve`]: Advisory dependency resolution
//! - [`emit`]: Value serialization and artifact emission
//! - [`board`]: Board metadata ([`BoardInfo`])
//! - [`pipeline`]: The end-to-end generation pipeline

pub mod board;
pub mod declaration;
pub mod emit;
pub mod error;
pub mod name;
pub mod pipeline;
pub mod plugin;
pub mod plugins;
pub mod resolve;
pub mod value;

// Re-export main public API
pub use board::BoardInfo;
pub use error::CodegenError;
pub use name::InstanceName;
pub use pipeline::{check, generate, resolve, BoardContext, GenerateReport};
pub use plugin::{Category, ParseResult, ParserPlugin, PluginRegistry};
pub use value::ConfigValue;
