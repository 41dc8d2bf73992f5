// Licensed under the Apache-2.0 license

//! The instance naming grammar shared by peripheral and device
//! declarations.
//!
//! A name is either a bare identifier (`^[a-z][a-z0-9_]*$`) or a legacy
//! triplet `label[-index[-subindex]]`, where `label` follows the bare
//! identifier rule and `index`/`subindex` are decimal integers in
//! `[0, 99]` with no leading zeros. Missing components are represented
//! as `-1`.

use crate::error::CodegenError;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceName {
    pub label: String,
    pub index: i8,
    pub subindex: i8,
}

impl InstanceName {
    pub fn new(label: &str, index: i8, subindex: i8) -> InstanceName {
        InstanceName {
            label: label.to_string(),
            index,
            subindex,
        }
    }

    /// Parse a declared name into its canonical `(label, index, subindex)`
    /// form. Missing components become `-1`.
    pub fn parse(name: &str) -> Result<InstanceName, CodegenError> {
        let segments: Vec<&str> = name.split('-').collect();
        if segments.len() > 3 {
            return Err(grammar_error(name, "more than 3 hyphen-separated segments"));
        }
        let label = segments[0];
        if !is_bare_ident(label) {
            return Err(grammar_error(
                name,
                "label must match ^[a-z][a-z0-9_]*$",
            ));
        }
        let index = match segments.get(1) {
            Some(s) => parse_numeric_segment(name, s)?,
            None => -1,
        };
        let subindex = match segments.get(2) {
            Some(s) => parse_numeric_segment(name, s)?,
            None => -1,
        };
        Ok(InstanceName::new(label, index, subindex))
    }

    /// A machine-safe name: missing components become `0` and segments
    /// join with underscores (`i2c-0` becomes `i2c_0_0`).
    pub fn machine_name(&self) -> String {
        format!(
            "{}_{}_{}",
            self.label,
            self.index.max(0),
            self.subindex.max(0)
        )
    }
}

impl fmt::Display for InstanceName {
    /// Formats the canonical triplet. A subindex is only meaningful when
    /// an index is present; formatting drops it otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        if self.index >= 0 {
            write!(f, "-{}", self.index)?;
            if self.subindex >= 0 {
                write!(f, "-{}", self.subindex)?;
            }
        }
        Ok(())
    }
}

/// True for names matching `^[a-z][a-z0-9_]*$`.
pub fn is_bare_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn parse_numeric_segment(name: &str, segment: &str) -> Result<i8, CodegenError> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(grammar_error(name, "index segments must be decimal integers"));
    }
    if segment.len() > 1 && segment.starts_with('0') {
        return Err(grammar_error(name, "index segments must not have leading zeros"));
    }
    if segment.len() > 2 {
        return Err(grammar_error(name, "index segments must be in [0, 99]"));
    }
    // Two digits max, so this cannot overflow i8.
    Ok(segment.parse::<i8>().unwrap())
}

fn grammar_error(name: &str, reason: &str) -> CodegenError {
    CodegenError::NamingGrammar {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
