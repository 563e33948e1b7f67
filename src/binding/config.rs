#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration parameters for the binding controller
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct BindingConfig {
    /// Attribute marking an element as physical; its value is the classification label
    pub marker_attribute: String,

    /// Name of the metadata declaration pointing at the rule document
    pub rules_meta_name: String,

    /// Whether to start the engine's debug renderer alongside the simulation clock
    pub debug_render: bool,

    /// Distance in pixels between samples when flattening curved path segments
    pub path_sample_length: f32,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            marker_attribute: "data-physics".to_string(),
            rules_meta_name: "physicsRules".to_string(),
            debug_render: true,
            path_sample_length: 15.0,
        }
    }
}
