// Licensed under the Apache-2.0 license

//! The parser-plugin contract and the in-memory plugin registry.
//!
//! One plugin exists per component type. The registry is built from an
//! explicit manifest (see [`crate::plugins`]) rather than filesystem
//! discovery; the manifest is validated at start-up with the same
//! malformed/duplicate checks a dynamic loader would perform.

use crate::declaration::PeripheralTable;
use crate::error::CodegenError;
use crate::resolve::DependencyDescriptor;
use crate::value::ConfigValue;
use std::collections::HashMap;

/// The two declaration categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Peripheral,
    Device,
}

impl Category {
    /// Category-specific prefix of plugin module names
    /// (`periph_i2c`, `dev_audio_codec`).
    pub fn module_prefix(&self) -> &'static str {
        match self {
            Category::Peripheral => "periph_",
            Category::Device => "dev_",
        }
    }

    /// Device plugins are registered under both the stripped type name and
    /// the raw module name; peripheral plugins only under the type name.
    /// The asymmetry is deliberate registry configuration, kept as an
    /// explicit flag so it stays visible and testable.
    pub fn alias_raw_module(&self) -> bool {
        matches!(self, Category::Device)
    }

    /// Top-level sequence key in the declaration document.
    pub fn section(&self) -> &'static str {
        match self {
            Category::Peripheral => "peripherals",
            Category::Device => "devices",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Peripheral => "peripheral",
            Category::Device => "device",
        }
    }
}

/// An additional named struct a plugin wants emitted alongside its
/// primary configuration struct.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtraConfig {
    pub struct_type: String,
    pub struct_var: String,
    pub struct_init: ConfigValue,
}

/// A plugin's description of the struct(s) to emit for one declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseResult {
    /// C type of the primary configuration struct.
    pub struct_type: String,
    /// Variable name of the primary configuration struct.
    pub struct_var: String,
    /// Initializer tree for the primary struct.
    pub struct_init: ConfigValue,
    /// Standalone type definition for dynamically-shaped types. Emitted
    /// once, before any value of the type is used.
    pub struct_definition: Option<String>,
    /// Secondary structs emitted before the primary one.
    pub extra_configs: Vec<ExtraConfig>,
    /// Header identifiers beyond the plugin's static `includes()` set.
    pub extra_includes: Vec<String>,
}

impl ParseResult {
    pub fn new(struct_type: &str, struct_var: &str, struct_init: ConfigValue) -> ParseResult {
        ParseResult {
            struct_type: struct_type.to_string(),
            struct_var: struct_var.to_string(),
            struct_init,
            struct_definition: None,
            extra_configs: Vec::new(),
            extra_includes: Vec::new(),
        }
    }
}

/// The per-type parser contract.
///
/// `parse` receives the declaration name, its full configuration body,
/// and (for device plugins) the resolved peripheral table.
pub trait ParserPlugin {
    /// Stripped type name; must match the manifest module name minus the
    /// category prefix.
    fn type_name(&self) -> &'static str;

    /// Plugin version identifier; must be non-empty.
    fn version(&self) -> &'static str;

    fn parse(
        &self,
        name: &str,
        config: &ConfigValue,
        peripherals: Option<&PeripheralTable>,
    ) -> Result<ParseResult, CodegenError>;

    /// Header identifiers this plugin contributes. A plugin that
    /// contributes none keeps the default.
    fn includes(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Chips this plugin supports; `None` means all chips.
    fn chips(&self) -> Option<&'static [&'static str]> {
        None
    }

    /// Peripheral requirements of this type, for the advisory dependency
    /// resolver. Only meaningful for device plugins.
    fn dependencies(&self) -> Vec<DependencyDescriptor> {
        Vec::new()
    }
}

/// One manifest entry: the raw module name plus its implementation.
pub struct PluginEntry {
    pub module: &'static str,
    pub plugin: Box<dyn ParserPlugin>,
}

impl PluginEntry {
    pub fn new(module: &'static str, plugin: Box<dyn ParserPlugin>) -> PluginEntry {
        PluginEntry { module, plugin }
    }
}

/// Registry of loaded plugins for one category.
///
/// Plugins live in an arena; the lookup map stores indices so a device
/// plugin can be reachable under two keys without duplication.
pub struct PluginRegistry {
    category: Category,
    arena: Vec<Box<dyn ParserPlugin>>,
    by_name: HashMap<String, usize>,
    /// Stripped type names, in registration order.
    types: Vec<String>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("category", &self.category)
            .field("by_name", &self.by_name)
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}

impl PluginRegistry {
    /// Validate and load a manifest for the given category and chip.
    ///
    /// Fatal errors: a module name without the category prefix or with an
    /// empty stripped type name, a type-name mismatch between module and
    /// plugin, an empty version, or two plugins claiming the same
    /// `(type name, version)` pair. Plugins whose `chips()` set excludes
    /// the board chip are skipped.
    pub fn load(
        category: Category,
        manifest: Vec<PluginEntry>,
        chip: &str,
    ) -> Result<PluginRegistry, CodegenError> {
        let mut registry = PluginRegistry {
            category,
            arena: Vec::new(),
            by_name: HashMap::new(),
            types: Vec::new(),
        };
        let mut versions: HashMap<String, String> = HashMap::new();

        for entry in manifest {
            let prefix = category.module_prefix();
            let type_name = match entry.module.strip_prefix(prefix) {
                Some(stripped) if !stripped.is_empty() => stripped.to_string(),
                _ => {
                    return Err(CodegenError::MalformedPlugin {
                        module: entry.module.to_string(),
                        reason: format!("module name must be `{}<type>`", prefix),
                    })
                }
            };
            if entry.plugin.type_name() != type_name {
                return Err(CodegenError::MalformedPlugin {
                    module: entry.module.to_string(),
                    reason: format!(
                        "plugin reports type `{}`, module name implies `{}`",
                        entry.plugin.type_name(),
                        type_name
                    ),
                });
            }
            let version = entry.plugin.version();
            if version.is_empty() {
                return Err(CodegenError::MalformedPlugin {
                    module: entry.module.to_string(),
                    reason: "missing version identifier".to_string(),
                });
            }
            if let Some(chips) = entry.plugin.chips() {
                if !chips.contains(&chip) {
                    log::debug!(
                        "skipping plugin `{}`: chip `{}` not supported",
                        entry.module,
                        chip
                    );
                    continue;
                }
            }
            match versions.get(&type_name) {
                Some(existing) if existing == version => {
                    return Err(CodegenError::DuplicatePluginVersion {
                        type_name,
                        version: version.to_string(),
                    });
                }
                Some(_) => {
                    // Re-registration with a different version keeps the
                    // later plugin, matching module-reload semantics.
                    log::debug!("re-registering plugin type `{}`", type_name);
                }
                None => registry.types.push(type_name.clone()),
            }
            versions.insert(type_name.clone(), version.to_string());

            let idx = registry.arena.len();
            registry.arena.push(entry.plugin);
            registry.by_name.insert(type_name, idx);
            if category.alias_raw_module() {
                registry.by_name.insert(entry.module.to_string(), idx);
            }
        }
        Ok(registry)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Look up a plugin by stripped type name (or, for devices, by raw
    /// module name).
    pub fn get(&self, name: &str) -> Option<&dyn ParserPlugin> {
        self.by_name.get(name).map(|idx| self.arena[*idx].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Stripped type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePlugin {
        type_name: &'static str,
        version: &'static str,
        chips: Option<&'static [&'static str]>,
    }

    impl ParserPlugin for FakePlugin {
        fn type_name(&self) -> &'static str {
            self.type_name
        }
        fn version(&self) -> &'static str {
            self.version
        }
        fn parse(
            &self,
            _name: &str,
            _config: &ConfigValue,
            _peripherals: Option<&PeripheralTable>,
        ) -> Result<ParseResult, CodegenError> {
            Ok(ParseResult::new("fake_t", "fake_cfg", ConfigValue::Null))
        }
        fn chips(&self) -> Option<&'static [&'static str]> {
            self.chips
        }
    }

    fn entry(
        module: &'static str,
        type_name: &'static str,
        version: &'static str,
    ) -> PluginEntry {
        PluginEntry::new(
            module,
            Box::new(FakePlugin {
                type_name,
                version,
                chips: None,
            }),
        )
    }

    #[test]
    fn test_load_and_lookup() {
        let registry = PluginRegistry::load(
            Category::Peripheral,
            vec![entry("periph_i2c", "i2c", "1.0")],
            "esp32s3",
        )
        .unwrap();
        assert!(registry.contains("i2c"));
        assert_eq!(registry.get("i2c").unwrap().version(), "1.0");
        // Peripherals are not aliased under the raw module name.
        assert!(!registry.contains("periph_i2c"));
    }

    #[test]
    fn test_device_dual_key_registration() {
        let registry = PluginRegistry::load(
            Category::Device,
            vec![entry("dev_audio_codec", "audio_codec", "1.0")],
            "esp32s3",
        )
        .unwrap();
        assert!(registry.contains("audio_codec"));
        assert!(registry.contains("dev_audio_codec"));
        assert_eq!(registry.type_names(), vec!["audio_codec"]);
    }

    #[test]
    fn test_bad_module_prefix_is_fatal() {
        let err = PluginRegistry::load(
            Category::Peripheral,
            vec![entry("dev_i2c", "i2c", "1.0")],
            "esp32s3",
        )
        .unwrap_err();
        assert!(matches!(err, CodegenError::MalformedPlugin { .. }));
    }

    #[test]
    fn test_type_name_mismatch_is_fatal() {
        let err = PluginRegistry::load(
            Category::Peripheral,
            vec![entry("periph_i2c", "spi", "1.0")],
            "esp32s3",
        )
        .unwrap_err();
        assert!(matches!(err, CodegenError::MalformedPlugin { .. }));
    }

    #[test]
    fn test_empty_version_is_fatal() {
        let err = PluginRegistry::load(
            Category::Peripheral,
            vec![entry("periph_i2c", "i2c", "")],
            "esp32s3",
        )
        .unwrap_err();
        assert!(matches!(err, CodegenError::MalformedPlugin { .. }));
    }

    #[test]
    fn test_duplicate_version_is_fatal() {
        let err = PluginRegistry::load(
            Category::Peripheral,
            vec![
                entry("periph_i2c", "i2c", "1.0"),
                entry("periph_i2c", "i2c", "1.0"),
            ],
            "esp32s3",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CodegenError::DuplicatePluginVersion { .. }
        ));
    }

    #[test]
    fn test_different_version_re_registers() {
        let registry = PluginRegistry::load(
            Category::Peripheral,
            vec![
                entry("periph_i2c", "i2c", "1.0"),
                entry("periph_i2c", "i2c", "2.0"),
            ],
            "esp32s3",
        )
        .unwrap();
        assert_eq!(registry.get("i2c").unwrap().version(), "2.0");
        assert_eq!(registry.type_names(), vec!["i2c"]);
    }

    #[test]
    fn test_chip_filtering() {
        let manifest = vec![
            entry("periph_i2c", "i2c", "1.0"),
            PluginEntry::new(
                "periph_sdio",
                Box::new(FakePlugin {
                    type_name: "sdio",
                    version: "1.0",
                    chips: Some(&["esp32"]),
                }),
            ),
        ];
        let registry =
            PluginRegistry::load(Category::Peripheral, manifest, "esp32s3").unwrap();
        assert!(registry.contains("i2c"));
        assert!(!registry.contains("sdio"));
    }
}
