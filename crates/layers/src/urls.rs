//! Deterministic WFS/WMS query synthesis.
//!
//! Pure string building, no I/O. The `store:name` separator is always
//! emitted as `%3A` and bounding-box coordinates are `%2C`-joined in
//! both query kinds, so the extent discovered by a feature query can be
//! fed directly into the paired map-image query.

use crate::request::{LayerRequest, RequestError};

/// Visible bounding region of a map view, in the service's CRS axis
/// order (min_x, min_y, max_x, max_y).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Comma-joined bbox coordinates with the separator pre-encoded.
    pub fn bbox_param(&self) -> String {
        format!(
            "{}%2C{}%2C{}%2C{}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Output of a map-image query: a renderable image, or the service's
/// HTML viewer page for in-browser previews.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapImageFormat {
    Png,
    OpenLayers,
}

impl MapImageFormat {
    pub fn query_value(&self) -> &'static str {
        match self {
            MapImageFormat::Png => "image%2Fpng",
            MapImageFormat::OpenLayers => "application%2Fopenlayers",
        }
    }
}

/// Where and how to query the geographic data service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoServiceConfig {
    pub base_url: String,
    pub image_width: u32,
    pub image_height: u32,
    pub map_image_format: MapImageFormat,
}

impl Default for GeoServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "/geoserver".to_string(),
            image_width: 512,
            image_height: 512,
            map_image_format: MapImageFormat::Png,
        }
    }
}

impl GeoServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// The concrete queries derived from one layer request. Derived once,
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayer {
    pub type_name: String,
    pub feature_query_url: String,
    pub map_image_query_url: String,
    /// Store identifier, used as the style registry key.
    pub style_rule_id: String,
}

/// Builds the paired feature/map-image queries for a layer request.
/// Pure and fully deterministic from its inputs.
pub fn build_layer_urls(
    config: &GeoServiceConfig,
    request: &LayerRequest,
    extent: Option<&Extent>,
) -> Result<ResolvedLayer, RequestError> {
    let type_name = request.type_name()?;
    let feature_query_url = feature_query_url(config, &type_name, extent);
    let map_image_query_url = map_image_query_url(config, &type_name, extent);
    Ok(ResolvedLayer {
        type_name,
        feature_query_url,
        map_image_query_url,
        style_rule_id: request.store.clone(),
    })
}

/// WFS `GetFeature` query returning a GeoJSON feature collection.
pub fn feature_query_url(
    config: &GeoServiceConfig,
    type_name: &str,
    extent: Option<&Extent>,
) -> String {
    let mut url = format!(
        "{}/wfs?service=WFS&version=1.0.0&request=GetFeature&typeName={}&outputFormat=application%2Fjson&srsName=EPSG%3A4326",
        config.base_url.trim_end_matches('/'),
        encode_type_name(type_name),
    );
    if let Some(extent) = extent {
        url.push_str("&bbox=");
        url.push_str(&extent.bbox_param());
    }
    url
}

/// WMS `GetMap` query for the same type name and bbox contract.
pub fn map_image_query_url(
    config: &GeoServiceConfig,
    type_name: &str,
    extent: Option<&Extent>,
) -> String {
    let mut url = format!(
        "{}/wms?service=WMS&version=1.1.1&request=GetMap&layers={}&styles=&srs=EPSG%3A4326&width={}&height={}&format={}",
        config.base_url.trim_end_matches('/'),
        encode_type_name(type_name),
        config.image_width,
        config.image_height,
        config.map_image_format.query_value(),
    );
    if let Some(extent) = extent {
        url.push_str("&bbox=");
        url.push_str(&extent.bbox_param());
    }
    url
}

fn encode_type_name(type_name: &str) -> String {
    type_name.replace(':', "%3A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> GeoServiceConfig {
        GeoServiceConfig::new("https://gis.example.org/geoserver/")
    }

    #[test]
    fn feature_query_encodes_type_name_separator() {
        let request = LayerRequest::new("panchayat_boundaries", "blockX");
        let resolved = build_layer_urls(&config(), &request, None).unwrap();
        assert_eq!(resolved.type_name, "panchayat_boundaries:blockX");
        assert!(
            resolved
                .feature_query_url
                .contains("typeName=panchayat_boundaries%3AblockX")
        );
        assert!(!resolved.feature_query_url.contains("bbox"));
        assert_eq!(resolved.style_rule_id, "panchayat_boundaries");
    }

    #[test]
    fn bbox_is_comma_encoded_identically_in_both_queries() {
        let request = LayerRequest::for_store("drainage").with_location("118", "2207");
        let extent = Extent::new(81.5, 16.25, 81.75, 16.5);
        let resolved = build_layer_urls(&config(), &request, Some(&extent)).unwrap();

        let bbox = "bbox=81.5%2C16.25%2C81.75%2C16.5";
        assert!(resolved.feature_query_url.ends_with(bbox));
        assert!(resolved.map_image_query_url.ends_with(bbox));
        assert!(resolved.map_image_query_url.contains("layers=drainage%3A118_2207"));
    }

    #[test]
    fn map_image_format_is_configurable() {
        let mut config = config();
        config.map_image_format = MapImageFormat::OpenLayers;
        let url = map_image_query_url(&config, "plantation:suitability_42_118_2207", None);
        assert!(url.contains("format=application%2Fopenlayers"));
        assert!(url.contains("width=512&height=512"));
    }

    #[test]
    fn url_building_is_deterministic() {
        let request = LayerRequest::for_store("plantation")
            .with_plan("suitability", "42")
            .with_location("118", "2207");
        let a = build_layer_urls(&config(), &request, None).unwrap();
        let b = build_layer_urls(&config(), &request, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_request_surfaces_synchronously() {
        let mut request = LayerRequest::for_store("plantation");
        request.resource_type = Some("suitability".into());
        assert!(build_layer_urls(&config(), &request, None).is_err());
    }
}
