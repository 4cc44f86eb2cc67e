//! Feature filter predicates.
//!
//! Filters arrive as the style JSON arrays `["==", key, value]`,
//! `["in", key, values...]`, `["all", ...]` and friends. They are
//! compiled once per layer and evaluated per feature before bucketing.

use serde_json::Value;

use crate::style::{FeatureProperties, PropertyValue};

#[derive(Debug, Clone)]
pub enum FeatureFilter {
    Equals(String, PropertyValue),
    NotEquals(String, PropertyValue),
    In(String, Vec<PropertyValue>),
    NotIn(String, Vec<PropertyValue>),
    Has(String),
    NotHas(String),
    All(Vec<FeatureFilter>),
    Any(Vec<FeatureFilter>),
    None(Vec<FeatureFilter>),
}

impl FeatureFilter {
    /// Compile a filter expression. Unknown operators yield `None` and a
    /// warning; the layer then accepts all features.
    pub fn from_json(value: &Value) -> Option<Self> {
        let arr = value.as_array()?;
        let op = arr.first()?.as_str()?;

        let key = || arr.get(1).and_then(|v| v.as_str()).map(str::to_string);
        let operand = |i: usize| arr.get(i).and_then(json_to_property_value);
        let operands = || arr[2..].iter().filter_map(json_to_property_value).collect();
        let subfilters = || arr[1..].iter().filter_map(Self::from_json).collect();

        let filter = match op {
            "==" => Self::Equals(key()?, operand(2)?),
            "!=" => Self::NotEquals(key()?, operand(2)?),
            "in" => Self::In(key()?, operands()),
            "!in" => Self::NotIn(key()?, operands()),
            "has" => Self::Has(key()?),
            "!has" => Self::NotHas(key()?),
            "all" => Self::All(subfilters()),
            "any" => Self::Any(subfilters()),
            "none" => Self::None(subfilters()),
            other => {
                log::warn!("unsupported filter operator {other:?}");
                return None;
            }
        };
        Some(filter)
    }

    pub fn evaluate(&self, feature: &FeatureProperties) -> bool {
        match self {
            Self::Equals(key, value) => feature.get(key) == Some(value),
            Self::NotEquals(key, value) => feature.get(key) != Some(value),
            Self::In(key, values) => feature
                .get(key)
                .map(|v| values.contains(v))
                .unwrap_or(false),
            Self::NotIn(key, values) => feature
                .get(key)
                .map(|v| !values.contains(v))
                .unwrap_or(true),
            Self::Has(key) => feature.contains_key(key),
            Self::NotHas(key) => !feature.contains_key(key),
            Self::All(filters) => filters.iter().all(|f| f.evaluate(feature)),
            Self::Any(filters) => filters.iter().any(|f| f.evaluate(feature)),
            Self::None(filters) => !filters.iter().any(|f| f.evaluate(feature)),
        }
    }
}

fn json_to_property_value(value: &Value) -> Option<PropertyValue> {
    match value {
        Value::String(s) => Some(PropertyValue::String(s.clone())),
        Value::Number(n) => n.as_f64().map(PropertyValue::Number),
        Value::Bool(b) => Some(PropertyValue::Bool(*b)),
        _ => None,
    }
}
