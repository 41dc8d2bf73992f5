// Licensed under the Apache-2.0 license

//! Error types for the board code generator.
//!
//! Two families of conditions exist: per-entry conditions that the
//! declaration parsers recover from by logging and skipping the offending
//! entry ([`CodegenError::is_recoverable`]), and fatal conditions that
//! abort the run before any artifact is written.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    /// A peripheral or device entry is missing a required field.
    /// Logged and skipped; the run continues.
    #[error("{category} entry `{entry}` is missing required field `{field}`")]
    Schema {
        category: &'static str,
        entry: String,
        field: &'static str,
    },

    /// A declared name fails the naming grammar. Logged and skipped, except
    /// when hit while resolving a device's peripheral reference, where it
    /// folds into [`CodegenError::UndefinedReference`].
    #[error("invalid name `{name}`: {reason}")]
    NamingGrammar { name: String, reason: String },

    /// An entry declares a type no loaded plugin handles. Logged and
    /// skipped; the run continues.
    #[error("{category} entry `{entry}` has unknown type `{type_name}`")]
    UnknownType {
        category: &'static str,
        entry: String,
        type_name: String,
    },

    /// Fatal: a device references a peripheral that was never declared.
    #[error("device `{device}` references undefined peripheral `{peripheral}`")]
    UndefinedReference { device: String, peripheral: String },

    /// Fatal: a manifest entry does not satisfy the plugin contract.
    #[error("malformed plugin module `{module}`: {reason}")]
    MalformedPlugin { module: String, reason: String },

    /// Fatal: two plugins resolve to the same (type name, version) pair.
    #[error("duplicate plugin registration for type `{type_name}` version `{version}`")]
    DuplicatePluginVersion { type_name: String, version: String },

    /// Fatal: a top-level declaration or metadata document is unreadable
    /// or malformed.
    #[error("cannot load document `{path}`: {reason}")]
    Document { path: PathBuf, reason: String },

    /// Fatal: a declaration document lacks its required top-level sequence.
    #[error("declaration document has no `{section}` sequence")]
    MissingSection { section: &'static str },

    /// A configuration value is outside the closed value model.
    #[error("unrepresentable configuration value: {reason}")]
    Unrepresentable { reason: String },

    /// A plugin rejected an otherwise well-formed entry. Logged and
    /// skipped; the run continues.
    #[error("plugin rejected `{name}`: {reason}")]
    Plugin { name: String, reason: String },

    #[error(transparent)]
    Patch(#[from] board_kconfig::PatchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CodegenError {
    /// Conditions the parsers recover from by skipping the entry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CodegenError::Schema { .. }
                | CodegenError::NamingGrammar { .. }
                | CodegenError::UnknownType { .. }
                | CodegenError::Plugin { .. }
        )
    }
}
