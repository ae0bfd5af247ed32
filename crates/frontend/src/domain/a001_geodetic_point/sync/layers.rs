use contracts::shared::geo::{Feature, FeatureCollection};
use std::collections::HashSet;

use super::palette::{code_color, NEUTRAL_COLOR};
use crate::shared::config::GeodesyEndpoints;
use crate::shared::leaflet::PathStyle;

/// The map's geometry collections, in refresh order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    Points,
    Polygons,
    /// Photo locations.
    Markers,
}

impl LayerKind {
    pub const ALL: [LayerKind; 3] = [LayerKind::Points, LayerKind::Polygons, LayerKind::Markers];

    pub fn index(&self) -> usize {
        match self {
            LayerKind::Points => 0,
            LayerKind::Polygons => 1,
            LayerKind::Markers => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LayerKind::Points => "Points",
            LayerKind::Polygons => "Polygons",
            LayerKind::Markers => "Photos",
        }
    }

    /// Maximum number of features requested per refresh.
    pub fn limit(&self) -> u32 {
        match self {
            LayerKind::Points => 5000,
            LayerKind::Polygons => 2000,
            LayerKind::Markers => 5000,
        }
    }

    /// Property identifying a feature within the layer.
    pub fn id_property(&self) -> &'static str {
        match self {
            LayerKind::Points => "id_pts",
            LayerKind::Polygons => "id",
            LayerKind::Markers => "id_foto",
        }
    }

    /// Only points honour the code/text/id-range filters.
    pub fn uses_filters(&self) -> bool {
        matches!(self, LayerKind::Points)
    }

    pub fn endpoint<'a>(&self, endpoints: &'a GeodesyEndpoints) -> &'a str {
        match self {
            LayerKind::Points => &endpoints.points,
            LayerKind::Polygons => &endpoints.polygons,
            LayerKind::Markers => &endpoints.markers,
        }
    }

    pub fn style(&self, feature: &Feature) -> PathStyle {
        match self {
            LayerKind::Points => {
                let color = code_color(feature.property_text("code").as_deref()).to_string();
                PathStyle {
                    radius: Some(5.0),
                    color: color.clone(),
                    weight: 1.0,
                    fill_color: Some(color),
                    fill_opacity: 0.85,
                }
            }
            LayerKind::Polygons => PathStyle {
                radius: None,
                color: NEUTRAL_COLOR.to_string(),
                weight: 2.0,
                fill_color: None,
                fill_opacity: 0.05,
            },
            LayerKind::Markers => PathStyle {
                radius: Some(4.0),
                color: NEUTRAL_COLOR.to_string(),
                weight: 1.0,
                fill_color: None,
                fill_opacity: 0.8,
            },
        }
    }
}

/// Features currently drawn for one layer.
///
/// Every refresh replaces the whole set; nothing is merged with the
/// previous contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerState {
    features: Vec<Feature>,
}

impl LayerState {
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Replaces the contents with `collection`. Features repeating an id
    /// already seen are dropped; features without an id are kept. The set is
    /// capped at the layer limit. Returns the number of features kept.
    pub fn replace(&mut self, kind: LayerKind, collection: FeatureCollection) -> usize {
        let key = kind.id_property();
        let mut seen = HashSet::new();
        self.features = collection
            .features
            .into_iter()
            .filter(|f| match f.property_text(key).filter(|id| !id.is_empty()) {
                Some(id) => seen.insert(id),
                None => true,
            })
            .take(kind.limit() as usize)
            .collect();
        self.features.len()
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(ids: &[i64]) -> FeatureCollection {
        let features: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [15.0, 49.0]},
                    "properties": {"id_pts": id, "code": "SU"}
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({"type": "FeatureCollection", "features": features})).unwrap()
    }

    #[test]
    fn test_replace_discards_previous_geometry() {
        let mut layer = LayerState::default();
        layer.replace(LayerKind::Points, collection(&[1, 2, 3]));
        assert_eq!(layer.len(), 3);

        layer.replace(LayerKind::Points, collection(&[4]));
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.features()[0].property_i64("id_pts"), Some(4));
    }

    #[test]
    fn test_duplicate_ids_are_drawn_once() {
        let mut layer = LayerState::default();
        assert_eq!(layer.replace(LayerKind::Points, collection(&[7, 7, 8, 7])), 2);
    }

    #[test]
    fn test_point_style_follows_code() {
        let fc = collection(&[1]);
        let style = LayerKind::Points.style(&fc.features[0]);
        assert_eq!(style.color, "#1f77b4");
        assert_eq!(style.radius, Some(5.0));
        assert_eq!(style.fill_opacity, 0.85);

        let poly = LayerKind::Polygons.style(&fc.features[0]);
        assert_eq!(poly.weight, 2.0);
        assert_eq!(poly.fill_opacity, 0.05);
    }

    #[test]
    fn test_limits_and_endpoints() {
        let endpoints = GeodesyEndpoints::default();
        assert_eq!(LayerKind::Points.limit(), 5000);
        assert_eq!(LayerKind::Polygons.limit(), 2000);
        assert_eq!(LayerKind::Markers.endpoint(&endpoints), "/geodesy/photos-geojson");
        assert!(LayerKind::Points.uses_filters());
        assert!(!LayerKind::Markers.uses_filters());
    }
}
