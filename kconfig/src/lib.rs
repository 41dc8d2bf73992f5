// Licensed under the Apache-2.0 license

//! Idempotent maintenance of the two persisted configuration files:
//! the generated Kconfig feature menu and the hand-maintained sdkconfig.
//!
//! The sdkconfig holds both machine-managed and hand-authored content.
//! The patcher only rewrites lines inside a header/footer-delimited
//! managed section, plus two whole-file operations: exclusive board
//! selection and a single scalar key. Everything else is preserved
//! byte for byte, and re-applying any operation with unchanged inputs
//! produces byte-identical output.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("managed section delimiter `{delimiter}` not found")]
    MissingDelimiter { delimiter: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Prefix of board selection symbols swept by [`select_board`].
pub const BOARD_OPTION_PREFIX: &str = "CONFIG_BOARD_";

/// Prefixes of the managed feature options. They share the board
/// namespace but are owned by the section sync, so the selection sweep
/// must leave them alone.
pub const FEATURE_OPTION_PREFIXES: &[&str] =
    &["CONFIG_BOARD_PERIPH_", "CONFIG_BOARD_DEV_"];

/// True for keys the exclusive-selection sweep owns: board symbols that
/// are neither feature options nor the protected scalar key.
fn is_selection_key(key: &str) -> bool {
    key.starts_with(BOARD_OPTION_PREFIX)
        && !FEATURE_OPTION_PREFIXES
            .iter()
            .any(|prefix| key.starts_with(prefix))
}

/// One computed difference between the current and desired option state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    Added(String),
    Updated(String),
    Removed(String),
}

/// Parse a recognized option line: `KEY=y`, `KEY=n`, or
/// `# KEY is not set`.
fn parse_option_line(line: &str) -> Option<(&str, bool)> {
    let trimmed = line.trim_end();
    if let Some(rest) = trimmed.strip_prefix("# ") {
        if let Some(key) = rest.strip_suffix(" is not set") {
            if is_option_key(key) {
                return Some((key, false));
            }
        }
        return None;
    }
    if let Some((key, value)) = trimmed.split_once('=') {
        if is_option_key(key) {
            match value {
                "y" => return Some((key, true)),
                "n" => return Some((key, false)),
                _ => {}
            }
        }
    }
    None
}

fn is_option_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn missing_delimiter(delimiter: &str) -> PatchError {
    PatchError::MissingDelimiter {
        delimiter: delimiter.to_string(),
    }
}

fn render_option(key: &str, on: bool) -> String {
    if on {
        format!("{}=y", key)
    } else {
        format!("# {} is not set", key)
    }
}

/// Synchronize the managed section between `header` and `footer` with the
/// desired option states.
///
/// Only lines strictly between the delimiters are touched: recognized
/// option lines with keys outside the desired universe are deleted,
/// recognized lines whose state differs are rewritten in place, and
/// desired keys absent from the section are appended in sorted order,
/// separated from existing content by exactly one blank line. Re-applying
/// with an unchanged desired set is byte-identical.
pub fn sync_section(
    text: &str,
    header: &str,
    footer: &str,
    desired: &BTreeMap<String, bool>,
) -> Result<(String, Vec<Change>), PatchError> {
    let lines: Vec<&str> = text.lines().collect();
    let header_idx = lines
        .iter()
        .position(|l| *l == header)
        .ok_or_else(|| missing_delimiter(header))?;
    let footer_idx = lines[header_idx + 1..]
        .iter()
        .position(|l| *l == footer)
        .map(|i| header_idx + 1 + i)
        .ok_or_else(|| missing_delimiter(footer))?;

    let mut changes = Vec::new();
    let mut present: Vec<String> = Vec::new();
    let mut section: Vec<String> = Vec::new();
    for line in &lines[header_idx + 1..footer_idx] {
        match parse_option_line(line) {
            Some((key, on)) => {
                present.push(key.to_string());
                match desired.get(key) {
                    Some(want) if *want != on => {
                        changes.push(Change::Updated(key.to_string()));
                        section.push(render_option(key, *want));
                    }
                    Some(_) => section.push(line.to_string()),
                    None => changes.push(Change::Removed(key.to_string())),
                }
            }
            None => section.push(line.to_string()),
        }
    }

    let missing_keys: Vec<&String> = desired
        .keys()
        .filter(|k| !present.contains(k))
        .collect();
    if !missing_keys.is_empty() {
        // Exactly one blank line between existing content and appends.
        if section.last().map(|l| !l.trim().is_empty()).unwrap_or(false) {
            section.push(String::new());
        }
        for key in missing_keys {
            changes.push(Change::Added(key.clone()));
            section.push(render_option(key, desired[key]));
        }
    }

    let mut out: Vec<String> = Vec::new();
    out.extend(lines[..=header_idx].iter().map(|l| l.to_string()));
    out.extend(section);
    out.extend(lines[footer_idx..].iter().map(|l| l.to_string()));
    let mut result = out.join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    Ok((result, changes))
}

/// File-level wrapper around [`sync_section`]. In check-only mode the
/// change set is computed without writing.
pub fn sync_file(
    path: &Path,
    header: &str,
    footer: &str,
    desired: &BTreeMap<String, bool>,
    check_only: bool,
) -> Result<Vec<Change>, PatchError> {
    let text = std::fs::read_to_string(path)?;
    let (new_text, changes) = sync_section(&text, header, footer, desired)?;
    if !check_only && new_text != text {
        log::debug!("rewriting {} ({} change(s))", path.display(), changes.len());
        std::fs::write(path, new_text)?;
    }
    Ok(changes)
}

/// Activate `board_key=y` and force every other `CONFIG_BOARD_*=y` line
/// in the whole file to `=n`, so at most one board is active. The
/// protected key (the board-name string option) and the managed feature
/// options ([`FEATURE_OPTION_PREFIXES`]) are exempt from the sweep.
/// A missing `board_key` line is appended at the end.
pub fn select_board(text: &str, board_key: &str, protected_key: &str) -> String {
    let mut found = false;
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        match parse_option_line(line) {
            Some((key, on)) if is_selection_key(key) && key != protected_key => {
                if key == board_key {
                    found = true;
                    if on {
                        out.push(line.to_string());
                    } else {
                        out.push(format!("{}=y", key));
                    }
                } else if on {
                    out.push(format!("{}=n", key));
                } else {
                    out.push(line.to_string());
                }
            }
            _ => out.push(line.to_string()),
        }
    }
    if !found {
        out.push(format!("{}=y", board_key));
    }
    let mut result = out.join("\n");
    if text.ends_with('\n') || !found {
        result.push('\n');
    }
    result
}

/// Idempotently set a single `KEY="value"` assignment: replace the
/// existing line, or insert one at the top of the file.
pub fn set_string_value(text: &str, key: &str, value: &str) -> String {
    let rendered = format!("{}=\"{}\"", key, value);
    let mut found = false;
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        if !found && line.split_once('=').map(|(k, _)| k) == Some(key) {
            found = true;
            out.push(rendered.clone());
        } else {
            out.push(line.to_string());
        }
    }
    if !found {
        out.insert(0, rendered);
    }
    let mut result = out.join("\n");
    if text.ends_with('\n') || text.is_empty() {
        result.push('\n');
    }
    result
}

/// Render the Kconfig feature menu from the discovered type names.
/// This file is generated wholesale, never patched.
pub fn generate_menu(
    board_name: &str,
    peripheral_types: &[&str],
    device_types: &[&str],
) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    writeln!(out, "# Generated board feature menu. Do not edit.").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "menu \"Board support ({})\"", board_name).unwrap();
    writeln!(out).unwrap();
    for (prefix, label, types) in [
        ("BOARD_PERIPH", "peripheral", peripheral_types),
        ("BOARD_DEV", "device", device_types),
    ] {
        for type_name in types {
            writeln!(out, "config {}_{}", prefix, type_name.to_ascii_uppercase()).unwrap();
            writeln!(out, "    bool \"{} {}\"", type_name, label).unwrap();
            writeln!(out, "    default y").unwrap();
            writeln!(out).unwrap();
        }
    }
    writeln!(out, "endmenu").unwrap();
    out
}
