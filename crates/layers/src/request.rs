//! Logical layer requests and their feature-service type names.
//!
//! A type name is the feature service's compound identifier for a
//! queryable layer (`store:name`). Which naming template applies is
//! decided by the fields present on the request; a field combination
//! matching no template is a programmer error and surfaces synchronously.

/// The store whose layers are named by district/block location alone.
pub const DRAINAGE_STORE: &str = "drainage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    InvalidRequest(String),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::InvalidRequest(detail) => write!(f, "invalid layer request: {detail}"),
        }
    }
}

impl std::error::Error for RequestError {}

/// A logical layer request. Exactly one naming template applies:
///
/// - plan-scoped: `plan_id` given (requires `resource_type`, `district`,
///   `block`) → `{store}:{resource_type}_{plan_id}_{district}_{block}`
/// - drainage-by-location: drainage store with `district` and `block`
///   and no plan → `{store}:{district}_{block}`
/// - plain: `{store}:{layer_name}`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerRequest {
    pub store: String,
    pub layer_name: Option<String>,
    pub resource_type: Option<String>,
    pub plan_id: Option<String>,
    pub district: Option<String>,
    pub block: Option<String>,
}

impl LayerRequest {
    pub fn new(store: impl Into<String>, layer_name: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            layer_name: Some(layer_name.into()),
            ..Self::default()
        }
    }

    /// A request carrying no layer name; the other fields must select a
    /// template or `type_name` rejects it.
    pub fn for_store(store: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            ..Self::default()
        }
    }

    pub fn with_plan(mut self, resource_type: impl Into<String>, plan_id: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self.plan_id = Some(plan_id.into());
        self
    }

    pub fn with_location(mut self, district: impl Into<String>, block: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self.block = Some(block.into());
        self
    }

    /// Selects the one template that applies and builds the type name.
    pub fn type_name(&self) -> Result<String, RequestError> {
        if self.plan_id.is_some() || self.resource_type.is_some() {
            let (Some(resource), Some(plan)) = (&self.resource_type, &self.plan_id) else {
                return Err(RequestError::InvalidRequest(
                    "plan-scoped lookup needs both resource_type and plan_id".into(),
                ));
            };
            let (Some(district), Some(block)) = (&self.district, &self.block) else {
                return Err(RequestError::InvalidRequest(
                    "plan-scoped lookup needs district and block".into(),
                ));
            };
            return Ok(format!(
                "{}:{resource}_{plan}_{district}_{block}",
                self.store
            ));
        }

        if self.store == DRAINAGE_STORE
            && let (Some(district), Some(block)) = (&self.district, &self.block)
        {
            return Ok(format!("{}:{district}_{block}", self.store));
        }

        match &self.layer_name {
            Some(name) if !name.is_empty() => Ok(format!("{}:{name}", self.store)),
            _ => Err(RequestError::InvalidRequest(
                "plain lookup needs a layer name".into(),
            )),
        }
    }
}

/// Lowercases a display name and collapses internal whitespace runs to
/// single underscores (`"Andhra  Pradesh"` → `"andhra_pradesh"`).
pub fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Type name of an organization/project suitability layer, as used by
/// project listings.
pub fn suitability_type_name(organization: &str, project: &str) -> String {
    format!(
        "plantation:{}_{}_suitability",
        slug(organization),
        slug(project)
    )
}

/// Fills a layer's declared preview-name template. Templates carry
/// `distname`/`blockname` placeholders, substituted with the lowercase
/// underscore-joined district/block names; layers without a template
/// fall back to `{district}_{block}`.
pub fn preview_layer_suffix(template: Option<&str>, district: &str, block: &str) -> String {
    let district = slug(district);
    let block = slug(block);
    match template {
        Some(t) => t.replace("distname", &district).replace("blockname", &block),
        None => format!("{district}_{block}"),
    }
}
