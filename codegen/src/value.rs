// Licensed under the Apache-2.0 license

//! The closed configuration-value model shared by every stage of the
//! generator.
//!
//! Declaration bodies, plugin outputs, and serializer inputs are all
//! expressed as [`ConfigValue`]. Anything the YAML front end cannot map
//! into this type (tags, non-string mapping keys, integers outside the
//! i64 range) is rejected at the parse boundary instead of being carried
//! along in a looser shape.

use crate::error::CodegenError;

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Insertion-ordered mapping with unique keys.
    Mapping(Vec<(String, ConfigValue)>),
    Sequence(Vec<ConfigValue>),
}

impl ConfigValue {
    /// Convert a parsed YAML value into the closed model.
    ///
    /// Rejects YAML shapes the model cannot represent: tagged values and
    /// mappings with non-string keys.
    pub fn from_yaml(value: &serde_yaml::Value) -> Result<ConfigValue, CodegenError> {
        use serde_yaml::Value;
        match value {
            Value::Null => Ok(ConfigValue::Null),
            Value::Bool(b) => Ok(ConfigValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ConfigValue::Int(i))
                } else if n.is_u64() {
                    Err(CodegenError::Unrepresentable {
                        reason: format!("integer {} does not fit in i64", n),
                    })
                } else if let Some(f) = n.as_f64() {
                    Ok(ConfigValue::Float(f))
                } else {
                    Err(CodegenError::Unrepresentable {
                        reason: format!("unsupported number {}", n),
                    })
                }
            }
            Value::String(s) => Ok(ConfigValue::Str(s.clone())),
            Value::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(ConfigValue::from_yaml(item)?);
                }
                Ok(ConfigValue::Sequence(out))
            }
            Value::Mapping(map) => {
                let mut out = Vec::with_capacity(map.len());
                for (k, v) in map {
                    let Value::String(key) = k else {
                        return Err(CodegenError::Unrepresentable {
                            reason: format!("non-string mapping key {:?}", k),
                        });
                    };
                    out.push((key.clone(), ConfigValue::from_yaml(v)?));
                }
                Ok(ConfigValue::Mapping(out))
            }
            Value::Tagged(tagged) => Err(CodegenError::Unrepresentable {
                reason: format!("YAML tag `{}` is not representable", tagged.tag),
            }),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(String, ConfigValue)]> {
        match self {
            ConfigValue::Mapping(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a key in a mapping value. Returns `None` for other shapes.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        match self {
            ConfigValue::Mapping(fields) => {
                fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(val: bool) -> Self {
        ConfigValue::Bool(val)
    }
}
impl From<i64> for ConfigValue {
    fn from(val: i64) -> Self {
        ConfigValue::Int(val)
    }
}
impl From<f64> for ConfigValue {
    fn from(val: f64) -> Self {
        ConfigValue::Float(val)
    }
}
impl From<&str> for ConfigValue {
    fn from(val: &str) -> Self {
        ConfigValue::Str(val.into())
    }
}
impl From<String> for ConfigValue {
    fn from(val: String) -> Self {
        ConfigValue::Str(val)
    }
}

/// Expand arbitrarily nested sequences into one ordered sequence,
/// dropping `Null` entries.
///
/// Declaration files reuse shared fragments through YAML anchors, which
/// merge lists of entries as nested sequences; this pass restores a flat
/// entry list before the parsers consume it. Idempotent and
/// order-preserving.
pub fn flatten(values: &[ConfigValue]) -> Vec<ConfigValue> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            ConfigValue::Null => {}
            ConfigValue::Sequence(inner) => out.extend(flatten(inner)),
            other => out.push(other.clone()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> serde_yaml::Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_from_yaml_scalars() {
        assert_eq!(
            ConfigValue::from_yaml(&yaml("~")).unwrap(),
            ConfigValue::Null
        );
        assert_eq!(
            ConfigValue::from_yaml(&yaml("true")).unwrap(),
            ConfigValue::Bool(true)
        );
        assert_eq!(
            ConfigValue::from_yaml(&yaml("42")).unwrap(),
            ConfigValue::Int(42)
        );
        assert_eq!(
            ConfigValue::from_yaml(&yaml("-7")).unwrap(),
            ConfigValue::Int(-7)
        );
        assert_eq!(
            ConfigValue::from_yaml(&yaml("2.5")).unwrap(),
            ConfigValue::Float(2.5)
        );
        assert_eq!(
            ConfigValue::from_yaml(&yaml("hello")).unwrap(),
            ConfigValue::Str("hello".into())
        );
    }

    #[test]
    fn test_from_yaml_preserves_mapping_order() {
        let value = ConfigValue::from_yaml(&yaml("z: 1\na: 2\nm: 3")).unwrap();
        let keys: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_from_yaml_rejects_tags() {
        let err = ConfigValue::from_yaml(&yaml("!custom 1")).unwrap_err();
        assert!(matches!(err, CodegenError::Unrepresentable { .. }));
    }

    #[test]
    fn test_from_yaml_rejects_non_string_keys() {
        let err = ConfigValue::from_yaml(&yaml("1: one")).unwrap_err();
        assert!(matches!(err, CodegenError::Unrepresentable { .. }));
    }

    #[test]
    fn test_from_yaml_rejects_huge_unsigned() {
        let err = ConfigValue::from_yaml(&yaml("18446744073709551615")).unwrap_err();
        assert!(matches!(err, CodegenError::Unrepresentable { .. }));
    }

    #[test]
    fn test_flatten_expands_nested_sequences() {
        let input = vec![
            ConfigValue::Int(1),
            ConfigValue::Sequence(vec![
                ConfigValue::Int(2),
                ConfigValue::Sequence(vec![ConfigValue::Int(3), ConfigValue::Null]),
            ]),
            ConfigValue::Null,
            ConfigValue::Int(4),
        ];
        let flat = flatten(&input);
        assert_eq!(
            flat,
            vec![
                ConfigValue::Int(1),
                ConfigValue::Int(2),
                ConfigValue::Int(3),
                ConfigValue::Int(4),
            ]
        );
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let input = vec![
            ConfigValue::Str("a".into()),
            ConfigValue::Sequence(vec![ConfigValue::Str("b".into()), ConfigValue::Null]),
        ];
        let once = flatten(&input);
        let twice = flatten(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_get_on_mapping() {
        let value = ConfigValue::Mapping(vec![
            ("name".into(), ConfigValue::Str("i2c-0".into())),
            ("port".into(), ConfigValue::Int(0)),
        ]);
        assert_eq!(value.get("port"), Some(&ConfigValue::Int(0)));
        assert_eq!(value.get("missing"), None);
        assert_eq!(ConfigValue::Int(1).get("port"), None);
    }
}
