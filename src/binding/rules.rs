use crate::engine::BodyOptions;
use crate::error::BindingError;
use crate::Result;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Corner rounding as written in a rule document: `{ "radius": 4 }`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chamfer {
    pub radius: f32,
}

/// Physical properties of one classification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friction: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friction_air: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friction_static: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restitution: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chamfer: Option<Chamfer>,

    /// Initial angle in radians
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,

    /// Engine-specific keys, forwarded as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Classification label → physical properties. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: HashMap<String, RuleRecord>,
}

impl RuleSet {
    /// Parses a rule document: a JSON object of classification → record
    pub fn from_json(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn from_records(records: impl IntoIterator<Item = (String, RuleRecord)>) -> Self {
        Self {
            rules: records.into_iter().collect(),
        }
    }

    pub fn get(&self, classification: &str) -> Option<&RuleRecord> {
        self.rules.get(classification)
    }

    /// Looks up a classification, failing when it is absent
    pub fn record(&self, classification: &str) -> Result<&RuleRecord> {
        self.get(classification)
            .ok_or_else(|| BindingError::UnknownClassification(classification.to_string()))
    }

    /// Whether bodies of this classification are declared static
    pub fn is_static(&self, classification: &str) -> Result<bool> {
        Ok(self.record(classification)?.is_static == Some(true))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Values computed from the element itself before rules are applied
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BaseProperties {
    /// Border radius in pixels
    pub chamfer_radius: f32,

    /// Current visual rotation in radians
    pub angle: f32,
}

/// Merges element-derived values with a classification's rule record.
/// Keys present in the record win.
pub struct ShapeRuleResolver<'a> {
    rules: &'a RuleSet,
}

impl<'a> ShapeRuleResolver<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    pub fn resolve(&self, classification: &str, base: BaseProperties) -> Result<BodyOptions> {
        let record = self.rules.record(classification)?;

        Ok(BodyOptions {
            chamfer_radius: record.chamfer.map_or(base.chamfer_radius, |c| c.radius),
            angle: record.angle.unwrap_or(base.angle),
            is_static: record.is_static.unwrap_or(false),
            density: record.density,
            mass: record.mass,
            friction: record.friction,
            friction_air: record.friction_air,
            friction_static: record.friction_static,
            restitution: record.restitution,
            extra: record.extra.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let rules = RuleSet::from_json(
            r#"{
                "crate": { "density": 0.002, "friction": 0.4, "slop": 0.1 },
                "floor": { "isStatic": true, "frictionAir": 0.0 }
            }"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
        let record = rules.get("crate").unwrap();
        assert_eq!(record.density, Some(0.002));
        assert_eq!(record.extra.get("slop"), Some(&Value::from(0.1)));
        assert!(rules.is_static("floor").unwrap());
        assert!(!rules.is_static("crate").unwrap());
    }

    #[test]
    fn test_rejects_non_object_records() {
        assert!(RuleSet::from_json(r#"{ "crate": 3 }"#).is_err());
        assert!(RuleSet::from_json("[]").is_err());
    }

    #[test]
    fn test_unknown_classification() {
        let rules = RuleSet::default();
        assert!(matches!(
            rules.record("ghost"),
            Err(BindingError::UnknownClassification(label)) if label == "ghost"
        ));
    }
}
