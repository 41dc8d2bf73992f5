// Licensed under the Apache-2.0 license

//! Declaration parsing for the `peripherals` and `devices` documents.
//!
//! Per-entry validation failures (missing fields, bad names, unknown
//! types) are logged and the entry is skipped; the run continues for the
//! valid remainder. The one exception is a device referencing an unknown
//! peripheral, which is fatal for the whole run.

use crate::error::CodegenError;
use crate::name::InstanceName;
use crate::plugin::{Category, PluginRegistry};
use crate::value::{flatten, ConfigValue};

/// One named, typed peripheral or device entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub category: Category,
    pub type_name: String,
    pub sub_type: Option<String>,
    pub role: Option<String>,
    pub format: Option<String>,
    pub init_skip: bool,
    /// Only populated for device declarations.
    pub peripheral_refs: Vec<PeripheralRef>,
    /// The full configuration body, as declared.
    pub body: ConfigValue,
}

/// A device's reference to a peripheral declaration, with plugin-specific
/// inline fields carried in `overrides`.
#[derive(Clone, Debug, PartialEq)]
pub struct PeripheralRef {
    pub name: String,
    pub overrides: ConfigValue,
}

/// The resolved, insertion-ordered map of peripheral name -> declaration.
///
/// Built once per run and read-only afterwards; the single source of
/// truth for validating device references.
#[derive(Debug, Default)]
pub struct PeripheralTable {
    entries: Vec<(String, Declaration)>,
}

impl PeripheralTable {
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.entries.iter().map(|(_, d)| d)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, declaration: Declaration) {
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(n, _)| *n == declaration.name)
        {
            // Duplicate names silently overwrite the earlier entry;
            // last one wins. Logged at debug level only so the outcome
            // stays unchanged but observable.
            log::debug!("peripheral `{}` declared twice, keeping last", declaration.name);
            slot.1 = declaration;
        } else {
            self.entries.push((declaration.name.clone(), declaration));
        }
    }
}

/// Parse the `peripherals` document into the peripheral table.
pub fn parse_peripherals(
    doc: &ConfigValue,
    registry: &PluginRegistry,
) -> Result<PeripheralTable, CodegenError> {
    let entries = section_entries(doc, Category::Peripheral)?;
    let mut table = PeripheralTable::default();
    for entry in &entries {
        match parse_entry(entry, Category::Peripheral, registry) {
            Ok(declaration) => table.insert(declaration),
            Err(err) if err.is_recoverable() => {
                log::warn!("skipping peripheral entry: {}", err);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(table)
}

/// Parse the `devices` document, validating every peripheral reference
/// against the already-built table.
pub fn parse_devices(
    doc: &ConfigValue,
    registry: &PluginRegistry,
    peripherals: &PeripheralTable,
) -> Result<Vec<Declaration>, CodegenError> {
    let entries = section_entries(doc, Category::Device)?;
    let mut declarations = Vec::new();
    for entry in &entries {
        let mut declaration = match parse_entry(entry, Category::Device, registry) {
            Ok(declaration) => declaration,
            Err(err) if err.is_recoverable() => {
                log::warn!("skipping device entry: {}", err);
                continue;
            }
            Err(err) => return Err(err),
        };
        declaration.peripheral_refs =
            parse_peripheral_refs(&declaration.name, entry, peripherals)?;
        declarations.push(declaration);
    }
    Ok(declarations)
}

fn section_entries(
    doc: &ConfigValue,
    category: Category,
) -> Result<Vec<ConfigValue>, CodegenError> {
    let section = category.section();
    let entries = doc
        .get(section)
        .and_then(|v| v.as_sequence())
        .ok_or(CodegenError::MissingSection { section })?;
    Ok(flatten(entries))
}

fn parse_entry(
    entry: &ConfigValue,
    category: Category,
    registry: &PluginRegistry,
) -> Result<Declaration, CodegenError> {
    let name = required_str(entry, category, "name")?;
    let type_name = required_str(entry, category, "type")?;
    InstanceName::parse(&name)?;
    if !registry.contains(&type_name) {
        return Err(CodegenError::UnknownType {
            category: category.as_str(),
            entry: name,
            type_name,
        });
    }
    Ok(Declaration {
        name,
        category,
        type_name,
        sub_type: optional_str(entry, "subtype"),
        role: optional_str(entry, "role"),
        format: optional_str(entry, "format"),
        init_skip: entry.get("init_skip").and_then(|v| v.as_bool()).unwrap_or(false),
        peripheral_refs: Vec::new(),
        body: entry.clone(),
    })
}

/// Parse a device entry's optional `peripherals` reference sequence.
///
/// References are flattened first; each is either a bare name or a
/// mapping with `name` plus plugin-specific overrides. Any reference
/// whose name is missing, malformed, or absent from the table is fatal.
fn parse_peripheral_refs(
    device: &str,
    entry: &ConfigValue,
    peripherals: &PeripheralTable,
) -> Result<Vec<PeripheralRef>, CodegenError> {
    let Some(refs) = entry.get("peripherals").and_then(|v| v.as_sequence()) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for reference in flatten(refs) {
        let (name, overrides) = match &reference {
            ConfigValue::Str(name) => (name.clone(), ConfigValue::Null),
            ConfigValue::Mapping(fields) => {
                let Some(name) = reference.get("name").and_then(|v| v.as_str()) else {
                    return Err(undefined(device, "(unnamed reference)"));
                };
                let rest: Vec<(String, ConfigValue)> = fields
                    .iter()
                    .filter(|(k, _)| k != "name")
                    .cloned()
                    .collect();
                (name.to_string(), ConfigValue::Mapping(rest))
            }
            _ => return Err(undefined(device, "(malformed reference)")),
        };
        // Naming errors on a reference fold into the fatal path.
        if InstanceName::parse(&name).is_err() || !peripherals.contains(&name) {
            return Err(undefined(device, &name));
        }
        out.push(PeripheralRef { name, overrides });
    }
    Ok(out)
}

fn undefined(device: &str, peripheral: &str) -> CodegenError {
    CodegenError::UndefinedReference {
        device: device.to_string(),
        peripheral: peripheral.to_string(),
    }
}

fn required_str(
    entry: &ConfigValue,
    category: Category,
    field: &'static str,
) -> Result<String, CodegenError> {
    entry
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| CodegenError::Schema {
            category: category.as_str(),
            entry: entry
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("(unnamed)")
                .to_string(),
            field,
        })
}

fn optional_str(entry: &ConfigValue, field: &str) -> Option<String> {
    entry.get(field).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Load a declaration document from YAML text into the value model.
pub fn document_from_yaml(
    path: &std::path::Path,
    text: &str,
) -> Result<ConfigValue, CodegenError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|err| CodegenError::Document {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    ConfigValue::from_yaml(&value).map_err(|err| CodegenError::Document {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins;

    fn registries() -> (PluginRegistry, PluginRegistry) {
        (
            PluginRegistry::load(
                Category::Peripheral,
                plugins::peripheral_manifest(),
                "esp32s3",
            )
            .unwrap(),
            PluginRegistry::load(Category::Device, plugins::device_manifest(), "esp32s3")
                .unwrap(),
        )
    }

    fn doc(text: &str) -> ConfigValue {
        document_from_yaml(std::path::Path::new("test.yml"), text).unwrap()
    }

    #[test]
    fn test_parse_peripherals_basic() {
        let (periph, _) = registries();
        let table = parse_peripherals(
            &doc(r#"
peripherals:
  - name: i2c-0
    type: i2c
    sda: 1
    scl: 2
  - name: gpio-3
    type: gpio
    pins: [3]
"#),
            &periph,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("i2c-0").unwrap().type_name, "i2c");
        assert!(table.contains("gpio-3"));
    }

    #[test]
    fn test_missing_section_is_fatal() {
        let (periph, _) = registries();
        let err = parse_peripherals(&doc("devices: []"), &periph).unwrap_err();
        assert!(matches!(err, CodegenError::MissingSection { section: "peripherals" }));
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let (periph, _) = registries();
        let table = parse_peripherals(
            &doc(r#"
peripherals:
  - name: i2c-0
    type: i2c
    sda: 1
    scl: 2
  - type: i2c        # missing name
  - name: BAD-NAME
    type: i2c
  - name: uart-0
    type: warp_drive # unknown type
"#),
            &periph,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains("i2c-0"));
    }

    #[test]
    fn test_duplicate_name_keeps_last() {
        let (periph, _) = registries();
        let table = parse_peripherals(
            &doc(r#"
peripherals:
  - name: i2c-0
    type: i2c
    sda: 1
    scl: 2
  - name: i2c-0
    type: i2c
    sda: 8
    scl: 9
"#),
            &periph,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        let body = &table.get("i2c-0").unwrap().body;
        assert_eq!(body.get("sda"), Some(&ConfigValue::Int(8)));
    }

    #[test]
    fn test_nested_entry_lists_are_flattened() {
        let (periph, _) = registries();
        // YAML anchors merging shared fragments produce nested sequences.
        let table = parse_peripherals(
            &doc(r#"
peripherals:
  - - name: i2c-0
      type: i2c
      sda: 1
      scl: 2
    - name: gpio-3
      type: gpio
      pins: [3]
  -
"#),
            &periph,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["i2c-0", "gpio-3"]);
    }

    #[test]
    fn test_device_reference_resolution() {
        let (periph, dev) = registries();
        let table = parse_peripherals(
            &doc(r#"
peripherals:
  - name: i2c-0
    type: i2c
    sda: 1
    scl: 2
"#),
            &periph,
        )
        .unwrap();
        let devices = parse_devices(
            &doc(r#"
devices:
  - name: audio_codec-0
    type: audio_codec
    peripherals:
      - name: i2c-0
        address: 0x18
"#),
            &dev,
            &table,
        )
        .unwrap();
        assert_eq!(devices.len(), 1);
        let refs = &devices[0].peripheral_refs;
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "i2c-0");
        assert_eq!(refs[0].overrides.get("address"), Some(&ConfigValue::Int(0x18)));
    }

    #[test]
    fn test_bare_string_reference() {
        let (periph, dev) = registries();
        let table = parse_peripherals(
            &doc("peripherals:\n  - {name: gpio-3, type: gpio, pins: [3]}"),
            &periph,
        )
        .unwrap();
        let devices = parse_devices(
            &doc(r#"
devices:
  - name: button-0
    type: button
    peripherals: [gpio-3]
"#),
            &dev,
            &table,
        )
        .unwrap();
        assert_eq!(devices[0].peripheral_refs[0].name, "gpio-3");
        assert!(devices[0].peripheral_refs[0].overrides.is_null());
    }

    #[test]
    fn test_undefined_reference_is_fatal() {
        let (periph, dev) = registries();
        let table = parse_peripherals(&doc("peripherals: []"), &periph).unwrap();
        let err = parse_devices(
            &doc(r#"
devices:
  - name: audio_codec-0
    type: audio_codec
    peripherals: [i2c-0]
"#),
            &dev,
            &table,
        )
        .unwrap_err();
        match err {
            CodegenError::UndefinedReference { device, peripheral } => {
                assert_eq!(device, "audio_codec-0");
                assert_eq!(peripheral, "i2c-0");
            }
            other => panic!("expected UndefinedReference, got {:?}", other),
        }
    }

    #[test]
    fn test_init_skip_defaults_false() {
        let (periph, dev) = registries();
        let table = parse_peripherals(&doc("peripherals: []"), &periph).unwrap();
        let devices = parse_devices(
            &doc(r#"
devices:
  - name: display-0
    type: display
  - name: button-0
    type: button
    init_skip: true
"#),
            &dev,
            &table,
        )
        .unwrap();
        assert!(!devices[0].init_skip);
        assert!(devices[1].init_skip);
    }
}
