use contracts::domain::a001_geodetic_point::ExtentResponse;
use contracts::shared::geo::BoundingBox;

use crate::shared::config::MapDefaults;

/// First viewport of the map.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialView {
    Fit { bbox: BoundingBox, padding: u32 },
    Center { lat: f64, lon: f64, zoom: u8 },
}

impl InitialView {
    pub fn fallback(defaults: &MapDefaults) -> Self {
        let (lat, lon) = defaults.default_center;
        InitialView::Center {
            lat,
            lon,
            zoom: defaults.default_zoom,
        }
    }

    /// Fits the data extent when there is one, else the configured default.
    ///
    /// A single-point extent has nothing to fit; the map centres on it at
    /// the maximum zoom.
    pub fn resolve(extent: &Result<ExtentResponse, String>, defaults: &MapDefaults) -> Self {
        match extent.as_ref().ok().and_then(ExtentResponse::extent) {
            Some(bbox) if bbox.is_point() => InitialView::Center {
                lat: bbox.south,
                lon: bbox.west,
                zoom: defaults.max_zoom,
            },
            Some(bbox) => InitialView::Fit {
                bbox,
                padding: defaults.fit_padding,
            },
            None => Self::fallback(defaults),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(json: &str) -> Result<ExtentResponse, String> {
        Ok(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_fits_valid_extent() {
        let view = InitialView::resolve(&extent(r#"{"ok":true,"bbox":[14.1,49.2,14.3,49.4]}"#), &MapDefaults::default());
        assert_eq!(
            view,
            InitialView::Fit {
                bbox: BoundingBox::new(49.2, 14.1, 49.4, 14.3),
                padding: 20
            }
        );
    }

    #[test]
    fn test_single_point_extent_centres_on_the_site() {
        let defaults = MapDefaults::default();
        let view = InitialView::resolve(&extent(r#"{"ok":true,"bbox":[16.6,49.2,16.6,49.2]}"#), &defaults);
        assert_eq!(
            view,
            InitialView::Center {
                lat: 49.2,
                lon: 16.6,
                zoom: defaults.max_zoom
            }
        );
    }

    #[test]
    fn test_points_on_one_meridian_are_fitted() {
        let view = InitialView::resolve(&extent(r#"{"ok":true,"bbox":[16.6,49.2,16.6,49.3]}"#), &MapDefaults::default());
        assert!(matches!(view, InitialView::Fit { .. }));
    }

    #[test]
    fn test_failure_or_empty_extent_falls_back() {
        let defaults = MapDefaults::default();
        let expected = InitialView::Center { lat: 49.0, lon: 15.0, zoom: 6 };
        assert_eq!(InitialView::resolve(&Err("HTTP error: 500".into()), &defaults), expected);
        assert_eq!(InitialView::resolve(&extent(r#"{"ok":true,"bbox":null}"#), &defaults), expected);
        assert_eq!(InitialView::resolve(&extent(r#"{"ok":false}"#), &defaults), expected);
        assert_eq!(
            InitialView::resolve(&extent(r#"{"ok":true,"bbox":[16.0,49.0,15.0,50.0]}"#), &defaults),
            expected
        );
    }
}
