use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PortaError, Result};

/// One tunable integer dimension with an affine map onto `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    min_value: i64,
    max_value: i64,
}

impl Parameter {
    pub fn new(name: impl Into<String>, min_value: i64, max_value: i64) -> Result<Self> {
        let name = name.into();
        if min_value >= max_value {
            return Err(PortaError::InvalidBounds {
                name,
                min: min_value,
                max: max_value,
            });
        }
        Ok(Self {
            name,
            min_value,
            max_value,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_value(&self) -> i64 {
        self.min_value
    }

    pub fn max_value(&self) -> i64 {
        self.max_value
    }

    /// Distance from the minimum, widened so extreme bounds cannot overflow.
    fn offset(&self, value: i64) -> i128 {
        i128::from(value) - i128::from(self.min_value)
    }

    fn span(&self) -> f64 {
        self.offset(self.max_value) as f64
    }

    /// Rescale a raw value into `[0.0, 1.0]`.
    pub fn to_unit(&self, value: i64) -> f64 {
        self.offset(value) as f64 / self.span()
    }

    /// Map a unit value back to the nearest raw value.
    ///
    /// The unit value is clamped to `[0.0, 1.0]` first, so the result always
    /// lies within `[min_value, max_value]`.
    pub fn from_unit(&self, unit: f64) -> i64 {
        let unit = if unit.is_nan() { 0.0 } else { unit.clamp(0.0, 1.0) };
        let value = i128::from(self.min_value) + (unit * self.span()).round() as i128;
        let value = value.clamp(i128::from(self.min_value), i128::from(self.max_value));
        i64::try_from(value).unwrap_or(self.max_value)
    }

    /// Unit value of this parameter within `config`, if present.
    pub fn unit_value(&self, config: &Configuration) -> Option<f64> {
        config.get(&self.name).map(|v| self.to_unit(v))
    }

    /// Copy of `config` with this parameter set from a unit value.
    pub fn with_unit_value(&self, config: &Configuration, unit: f64) -> Configuration {
        config.with_value(&self.name, self.from_unit(unit))
    }

    /// Copy of `config` with this parameter set to a raw value, clamped to bounds.
    pub fn with_value(&self, config: &Configuration, value: i64) -> Configuration {
        config.with_value(&self.name, value.clamp(self.min_value, self.max_value))
    }
}

/// The ordered list of parameters a search runs over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    parameters: Vec<Parameter>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn add_int(self, name: impl Into<String>, min_value: i64, max_value: i64) -> Result<Self> {
        Ok(self.add_parameter(Parameter::new(name, min_value, max_value)?))
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// One point in the search space: parameter name to integer value.
///
/// Values are never mutated in place; [`Configuration::with_value`] returns a
/// modified copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(BTreeMap<String, i64>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }

    pub fn with_value(&self, name: &str, value: i64) -> Self {
        let mut values = self.0.clone();
        values.insert(name.to_string(), value);
        Self(values)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact `name=value` form for logs.
    pub fn display(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromIterator<(String, i64)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_bounds() {
        assert!(matches!(
            Parameter::new("cpu-quota", 100, 100),
            Err(PortaError::InvalidBounds { .. })
        ));
        assert!(Parameter::new("cpu-quota", 200, 100).is_err());
    }

    #[test]
    fn test_unit_map_endpoints() {
        let p = Parameter::new("mem-bw-limit", 100, 2000).unwrap();
        assert_eq!(p.to_unit(100), 0.0);
        assert_eq!(p.to_unit(2000), 1.0);
        assert_eq!(p.from_unit(0.0), 100);
        assert_eq!(p.from_unit(1.0), 2000);
        assert_eq!(p.from_unit(0.5), 1050);
    }

    #[test]
    fn test_from_unit_clamps_both_ends() {
        let p = Parameter::new("cpu-quota", 5000, 50000).unwrap();
        assert_eq!(p.from_unit(-0.3), 5000);
        assert_eq!(p.from_unit(1.15), 50000);
        assert_eq!(p.from_unit(f64::NAN), 5000);
    }

    #[test]
    fn test_full_i64_range_does_not_overflow() {
        let p = Parameter::new("wide", i64::MIN, i64::MAX).unwrap();
        assert_eq!(p.to_unit(i64::MIN), 0.0);
        assert_eq!(p.to_unit(i64::MAX), 1.0);
        assert_eq!(p.from_unit(0.0), i64::MIN);
        assert_eq!(p.from_unit(0.5), 0);
        assert_eq!(p.from_unit(1.0), i64::MAX);
    }

    #[test]
    fn test_with_unit_value_copies() {
        let p = Parameter::new("cpu-quota", 0, 100).unwrap();
        let base = Configuration::new().with_value("cpu-quota", 100);
        let moved = p.with_unit_value(&base, 0.25);

        assert_eq!(base.get("cpu-quota"), Some(100));
        assert_eq!(moved.get("cpu-quota"), Some(25));
        assert_eq!(p.unit_value(&moved), Some(0.25));
    }

    #[test]
    fn test_configuration_serializes_flat() {
        let cfg = Configuration::new().with_value("cpu-quota", 25000);
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(json, r#"{"cpu-quota":25000}"#);
    }

    #[test]
    fn test_search_space_builder() {
        let space = SearchSpace::new()
            .add_int("cpu-quota", 5000, 50000)
            .unwrap()
            .add_int("mem-bw-limit", 100, 2000)
            .unwrap();
        assert_eq!(space.len(), 2);
        assert_eq!(space.parameters()[1].name(), "mem-bw-limit");
    }
}
