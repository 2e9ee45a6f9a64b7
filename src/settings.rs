//! Typed, introspectable generator configuration.
//!
//! Every generator exposes the same small API (`supported_keys`,
//! `get_setting`, `set_setting`) over [`SettingKey`] instead of one typed
//! setter per shape. The same map is what gets persisted, as a JSON object
//! keyed by [`SettingKey`]'s camelCase name.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::{Map, Value};
use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::error::{QrRenderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum SettingKey {
    /// 0..1, fraction of the cell removed on each side.
    InsetFraction,
    /// 0..1, fraction of half the short side used as corner radius.
    CornerRadiusFraction,
    /// 0..1, fraction of a half turn.
    RotationFraction,
    UseRandomInset,
    UseRandomRotation,
    HasInnerCorners,
    /// Name of the value generator used when `useRandomInset` is on.
    #[strum(serialize = "insetGeneratorName")]
    InsetGenerator,
    /// Name of the value generator used when `useRandomRotation` is on.
    #[strum(serialize = "rotationGeneratorName")]
    RotationGenerator,
    /// 4-bit corner rounding mask.
    Corners,
    IsFlipped,
}

impl SettingKey {
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            SettingValue::Bool(b) => Value::Bool(*b),
            SettingValue::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            SettingValue::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn from_json(value: &Value) -> Option<SettingValue> {
        match value {
            Value::Bool(b) => Some(SettingValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(SettingValue::Number),
            Value::String(s) => Some(SettingValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Number(v)
    }
}

impl From<u8> for SettingValue {
    fn from(v: u8) -> Self {
        SettingValue::Number(f64::from(v))
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Text(v)
    }
}

/// Ordered key → value map describing one generator's configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneratorSettings {
    values: BTreeMap<SettingKey, SettingValue>,
}

impl GeneratorSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: SettingKey, value: impl Into<SettingValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: SettingKey, value: impl Into<SettingValue>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: SettingKey) -> Option<&SettingValue> {
        self.values.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingKey, &SettingValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.name().to_string(), v.to_json()))
            .collect();
        Value::Object(map)
    }

    /// Reads a settings object. Unknown keys and non-primitive values are
    /// skipped so documents written by newer generator sets still load.
    pub fn from_json(value: &Value) -> GeneratorSettings {
        let mut settings = GeneratorSettings::new();
        let Some(map) = value.as_object() else {
            return settings;
        };
        for (name, raw) in map {
            match (SettingKey::from_str(name), SettingValue::from_json(raw)) {
                (Ok(key), Some(v)) => settings.insert(key, v),
                _ => log::debug!("Skipping unrecognised setting '{}'", name),
            }
        }
        settings
    }
}

/// Validates a 0..1 fraction setting.
pub(crate) fn fraction(key: SettingKey, value: &SettingValue) -> Result<f64> {
    match value.as_f64() {
        Some(v) if (0.0..=1.0).contains(&v) => Ok(v),
        Some(v) => Err(QrRenderError::invalid_setting(key.name(), format!("{} is outside 0..1", v))),
        None => Err(QrRenderError::invalid_setting(key.name(), "expected a number")),
    }
}

pub(crate) fn boolean(key: SettingKey, value: &SettingValue) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| QrRenderError::invalid_setting(key.name(), "expected a boolean"))
}

pub(crate) fn unsupported(key: SettingKey, generator: &str) -> QrRenderError {
    QrRenderError::invalid_setting(key.name(), format!("not supported by '{}'", generator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_key_names() {
        assert_eq!(SettingKey::InsetFraction.name(), "insetFraction");
        assert_eq!(SettingKey::UseRandomRotation.name(), "useRandomRotation");
        assert_eq!(SettingKey::InsetGenerator.name(), "insetGeneratorName");
        assert_eq!("cornerRadiusFraction".parse::<SettingKey>().unwrap(), SettingKey::CornerRadiusFraction);
    }

    #[test]
    fn test_json_skips_unknown_keys() {
        let settings = GeneratorSettings::from_json(&json!({
            "insetFraction": 0.25,
            "sparkles": true,
            "isFlipped": true,
            "corners": [1, 2],
        }));
        assert_eq!(
            settings,
            GeneratorSettings::new()
                .with(SettingKey::InsetFraction, 0.25)
                .with(SettingKey::IsFlipped, true)
        );
        assert_eq!(settings.to_json(), json!({"insetFraction": 0.25, "isFlipped": true}));
    }

    #[test]
    fn test_fraction_validation() {
        assert!(fraction(SettingKey::InsetFraction, &SettingValue::Number(0.5)).is_ok());
        assert!(fraction(SettingKey::InsetFraction, &SettingValue::Number(1.5)).is_err());
        assert!(fraction(SettingKey::InsetFraction, &SettingValue::Bool(true)).is_err());
    }
}
