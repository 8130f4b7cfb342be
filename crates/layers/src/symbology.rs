//! Style rules, keyed by store identifier.
//!
//! Conditional styling is an explicit registry rather than string
//! matching at the call site: the administrative-boundary store gets an
//! outline-plus-label rule out of the box, every unregistered store
//! falls through to the rendering surface's default style.

use std::collections::BTreeMap;

use boundary::title_case;

/// The store holding administrative boundary polygons.
pub const BOUNDARY_STORE: &str = "panchayat_boundaries";

/// How features of one store are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub stroke: [f32; 4],
    pub stroke_width: f32,
    pub fill: [f32; 4],
    /// Feature attribute whose value becomes a centered text label.
    pub label_attribute: Option<String>,
}

impl StyleRule {
    /// Fixed stroke with a fully transparent fill.
    pub fn outline(stroke: [f32; 4], stroke_width: f32) -> Self {
        Self {
            stroke,
            stroke_width,
            fill: [0.0, 0.0, 0.0, 0.0],
            label_attribute: None,
        }
    }

    pub fn with_label_attribute(mut self, key: impl Into<String>) -> Self {
        self.label_attribute = Some(key.into());
        self
    }
}

/// Style resolved for one concrete feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStyle {
    pub stroke: [f32; 4],
    pub stroke_width: f32,
    pub fill: [f32; 4],
    pub label: Option<String>,
}

/// Style rules keyed by store identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRegistry {
    rules: BTreeMap<String, StyleRule>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            BOUNDARY_STORE,
            StyleRule::outline([0.12, 0.12, 0.12, 1.0], 2.0).with_label_attribute("block_name"),
        );
        registry
    }
}

impl StyleRegistry {
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, store: impl Into<String>, rule: StyleRule) {
        self.rules.insert(store.into(), rule);
    }

    pub fn rule_for(&self, store: &str) -> Option<&StyleRule> {
        self.rules.get(store)
    }

    /// Resolves the style override for one feature. `None` means the
    /// store has no rule and the surface's default style applies.
    pub fn style_feature(
        &self,
        store: &str,
        properties: &serde_json::Map<String, serde_json::Value>,
    ) -> Option<FeatureStyle> {
        let rule = self.rule_for(store)?;
        let label = rule
            .label_attribute
            .as_deref()
            .and_then(|key| properties.get(key))
            .and_then(label_text);
        Some(FeatureStyle {
            stroke: rule.stroke,
            stroke_width: rule.stroke_width,
            fill: rule.fill,
            label,
        })
    }
}

fn label_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(title_case(s)),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
