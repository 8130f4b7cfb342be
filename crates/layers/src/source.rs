//! Lazy vector layer loading.
//!
//! A created layer carries its resolved queries and an empty shared
//! source; nothing is fetched until the rendering surface asks for
//! features for a view extent. A failed or malformed load is logged
//! with the layer name and leaves the source unchanged, so one broken
//! layer never takes down its siblings or the host map.

use std::sync::Arc;

use boundary::BoxFuture;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::request::{LayerRequest, RequestError};
use crate::symbology::{FeatureStyle, StyleRegistry};
use crate::urls::{Extent, GeoServiceConfig, ResolvedLayer, build_layer_urls, feature_query_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Http { status: u16 },
    Network { detail: String },
    Parse { detail: String },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Http { status } => write!(f, "HTTP error: {status}"),
            LoadError::Network { detail } => write!(f, "request failed: {detail}"),
            LoadError::Parse { detail } => write!(f, "bad feature payload: {detail}"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Trait for feature query transports. Implementations must be
/// `Send + Sync`; methods return boxed futures for dyn-compatibility.
pub trait FeatureFetcher: Send + Sync {
    /// Fetches the raw body of a feature query. Non-success HTTP
    /// statuses map to `LoadError::Http`.
    fn fetch(&self, url: String) -> BoxFuture<'_, Result<String, LoadError>>;
}

/// reqwest-backed fetcher for the feature service.
#[derive(Default)]
pub struct HttpFeatureFetcher {
    client: reqwest::Client,
}

impl HttpFeatureFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeatureFetcher for HttpFeatureFetcher {
    fn fetch(&self, url: String) -> BoxFuture<'_, Result<String, LoadError>> {
        Box::pin(async move {
            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| LoadError::Network {
                    detail: e.to_string(),
                })?;

            if !resp.status().is_success() {
                return Err(LoadError::Http {
                    status: resp.status().as_u16(),
                });
            }

            resp.text().await.map_err(|e| LoadError::Network {
                detail: e.to_string(),
            })
        })
    }
}

/// One decoded feature plus the style override resolved for it (`None`
/// means the surface's default style applies).
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub geometry: serde_json::Value,
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub style: Option<FeatureStyle>,
}

/// Shared feature store a rendering surface reads from. Features are
/// appended incrementally as they are decoded.
#[derive(Clone, Default)]
pub struct VectorSource {
    features: Arc<Mutex<Vec<Feature>>>,
}

impl VectorSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn features(&self) -> Vec<Feature> {
        self.features.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.features.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.lock().is_empty()
    }

    fn push(&self, feature: Feature) {
        self.features.lock().push(feature);
    }
}

/// Handle to one requested layer. Construction resolves the queries but
/// issues no fetch.
#[derive(Clone)]
pub struct VectorLayer {
    pub resolved: ResolvedLayer,
    pub visible: bool,
    pub active: bool,
    source: VectorSource,
}

impl VectorLayer {
    pub fn source(&self) -> &VectorSource {
        &self.source
    }
}

/// Creates layer handles and drives their extent-triggered loads.
pub struct VectorLayerLoader {
    config: GeoServiceConfig,
    fetcher: Arc<dyn FeatureFetcher>,
    styles: StyleRegistry,
}

impl VectorLayerLoader {
    pub fn new(config: GeoServiceConfig, fetcher: Arc<dyn FeatureFetcher>) -> Self {
        Self {
            config,
            fetcher,
            styles: StyleRegistry::default(),
        }
    }

    pub fn with_styles(mut self, styles: StyleRegistry) -> Self {
        self.styles = styles;
        self
    }

    /// Builds a layer handle with an empty source. No network traffic
    /// happens here; features arrive through [`Self::request_features`].
    pub fn create_vector_layer(
        &self,
        request: LayerRequest,
        visible: bool,
        active: bool,
    ) -> Result<VectorLayer, RequestError> {
        let resolved = build_layer_urls(&self.config, &request, None)?;
        Ok(VectorLayer {
            resolved,
            visible,
            active,
            source: VectorSource::new(),
        })
    }

    /// Loads features for one view extent and appends them to the
    /// layer's source, styled per the registry. On HTTP failure or a
    /// malformed payload the failure is logged with the layer name and
    /// the source is left unchanged.
    pub async fn request_features(&self, layer: &VectorLayer, extent: &Extent) {
        let url = feature_query_url(&self.config, &layer.resolved.type_name, Some(extent));

        let body = match self.fetcher.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("layer {} load failed: {e}", layer.resolved.type_name);
                return;
            }
        };

        let collection: FeatureCollectionPayload = match serde_json::from_str(&body) {
            Ok(collection) => collection,
            Err(e) => {
                tracing::warn!(
                    "layer {} load failed: bad feature payload: {e}",
                    layer.resolved.type_name
                );
                return;
            }
        };

        let mut added = 0usize;
        for payload in collection.features {
            let style = self
                .styles
                .style_feature(&layer.resolved.style_rule_id, &payload.properties);
            layer.source.push(Feature {
                id: payload.id.as_ref().and_then(id_text),
                geometry: payload.geometry,
                properties: payload.properties,
                style,
            });
            added += 1;
        }
        tracing::debug!("layer {}: {added} features loaded", layer.resolved.type_name);
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollectionPayload {
    #[serde(default)]
    features: Vec<FeaturePayload>,
}

#[derive(Debug, Deserialize)]
struct FeaturePayload {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    geometry: serde_json::Value,
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
}

fn id_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
