// Licensed under the Apache-2.0 license

//! Advisory dependency resolution between selected devices and selected
//! peripherals.
//!
//! This resolver answers "what is this device type still missing?" for
//! interactive guidance. It is advisory only: the emission pipeline never
//! gates code generation on it. The fatal check for a device referencing
//! an undeclared peripheral lives in the declaration parser, not here.

use crate::declaration::PeripheralTable;
use crate::name::InstanceName;
use std::collections::BTreeSet;

/// One declared peripheral requirement of a device type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyDescriptor {
    pub peripheral_type: String,
    pub role: Option<String>,
    pub format: Option<String>,
    /// A specific peripheral instance name, when the requirement is not
    /// satisfied by any peripheral of the right type.
    pub instance: Option<String>,
}

impl DependencyDescriptor {
    pub fn on_type(peripheral_type: &str) -> DependencyDescriptor {
        DependencyDescriptor {
            peripheral_type: peripheral_type.to_string(),
            role: None,
            format: None,
            instance: None,
        }
    }

    pub fn on_instance(peripheral_type: &str, instance: &str) -> DependencyDescriptor {
        DependencyDescriptor {
            instance: Some(instance.to_string()),
            ..DependencyDescriptor::on_type(peripheral_type)
        }
    }
}

/// Outcome of a resolution pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// `(device name, missing requirement)` pairs.
    pub missing: BTreeSet<(String, String)>,
    pub all_satisfied: bool,
}

/// Collect the role/format suffix tokens observed across all loaded
/// peripheral declarations. Used for type inference from declared names.
pub fn role_format_tokens(peripherals: &PeripheralTable) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for declaration in peripherals.iter() {
        if let Some(role) = &declaration.role {
            tokens.insert(role.clone());
        }
        if let Some(format) = &declaration.format {
            tokens.insert(format.clone());
        }
    }
    tokens
}

/// Infer a peripheral's type from its declared name by stripping
/// recognized role/format suffix tokens from the label
/// (`i2s_mic` with token `mic` infers `i2s`).
pub fn infer_peripheral_type(name: &str, tokens: &BTreeSet<String>) -> String {
    let mut label = match InstanceName::parse(name) {
        Ok(parsed) => parsed.label,
        Err(_) => name.to_string(),
    };
    loop {
        let mut stripped = false;
        for token in tokens {
            let suffix = format!("_{}", token);
            if let Some(rest) = label.strip_suffix(suffix.as_str()) {
                if !rest.is_empty() {
                    label = rest.to_string();
                    stripped = true;
                    break;
                }
            }
        }
        if !stripped {
            return label;
        }
    }
}

/// Match each selected device's dependency descriptors, in order, against
/// the selected peripheral set.
pub fn resolve_dependencies(
    devices: &[(String, Vec<DependencyDescriptor>)],
    selected_peripherals: &BTreeSet<String>,
    tokens: &BTreeSet<String>,
) -> Resolution {
    let peripheral_types: BTreeSet<String> = selected_peripherals
        .iter()
        .map(|name| infer_peripheral_type(name, tokens))
        .collect();

    let mut missing = BTreeSet::new();
    for (device, descriptors) in devices {
        for descriptor in descriptors {
            if let Some(instance) = &descriptor.instance {
                if !selected_peripherals.contains(instance) {
                    missing.insert((device.clone(), instance.clone()));
                }
            } else if !peripheral_types.contains(&descriptor.peripheral_type) {
                missing.insert((device.clone(), descriptor.peripheral_type.clone()));
            }
        }
    }
    Resolution {
        all_satisfied: missing.is_empty(),
        missing,
    }
}
