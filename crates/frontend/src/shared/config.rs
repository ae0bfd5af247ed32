//! Runtime configuration of the UI.
//!
//! The hosting page may define `window.ARCHEO_CONFIG` (a plain JS object with
//! the same shape as [`DEFAULT_CONFIG`]); missing keys fall back to defaults.

use leptos::prelude::*;
use serde::Deserialize;
use std::cell::RefCell;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing endpoint for {0}")]
    MissingEndpoint(&'static str),
    #[error("missing field name")]
    MissingFieldName,
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Default configuration embedded in the bundle
pub const DEFAULT_CONFIG: &str = r#"{
    "api_base": null,
    "geodesy": {
        "points": "/geodesy/geojson",
        "polygons": "/geodesy/polygons-geojson",
        "markers": "/geodesy/photos-geojson",
        "extent": "/geodesy/extent",
        "list": "/geodesy/list",
        "update_base": "/geodesy/update",
        "delete_base": "/geodesy/delete"
    },
    "timing": {
        "suggest_debounce_ms": 250,
        "map_debounce_ms": 200,
        "fetch_timeout_ms": 15000
    },
    "map": {
        "default_center": [49.0, 15.0],
        "default_zoom": 6,
        "fit_padding": 20,
        "tile_url": "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
        "tile_attribution": "&copy; OpenStreetMap contributors",
        "max_zoom": 20
    }
}"#;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Prefix for relative endpoint paths; the page origin when absent.
    pub api_base: Option<String>,
    pub geodesy: GeodesyEndpoints,
    pub timing: Timing,
    pub map: MapDefaults,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeodesyEndpoints {
    pub points: String,
    pub polygons: String,
    pub markers: String,
    pub extent: String,
    pub list: String,
    pub update_base: String,
    pub delete_base: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub suggest_debounce_ms: u32,
    pub map_debounce_ms: u32,
    pub fetch_timeout_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapDefaults {
    /// `(lat, lon)` of the fallback view.
    pub default_center: (f64, f64),
    pub default_zoom: u8,
    pub fit_padding: u32,
    pub tile_url: String,
    pub tile_attribution: String,
    pub max_zoom: u8,
}

impl Default for GeodesyEndpoints {
    fn default() -> Self {
        Self {
            points: "/geodesy/geojson".to_string(),
            polygons: "/geodesy/polygons-geojson".to_string(),
            markers: "/geodesy/photos-geojson".to_string(),
            extent: "/geodesy/extent".to_string(),
            list: "/geodesy/list".to_string(),
            update_base: "/geodesy/update".to_string(),
            delete_base: "/geodesy/delete".to_string(),
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            suggest_debounce_ms: 250,
            map_debounce_ms: 200,
            fetch_timeout_ms: 15_000,
        }
    }
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self {
            default_center: (49.0, 15.0),
            default_zoom: 6,
            fit_padding: 20,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tile_attribution: "&copy; OpenStreetMap contributors".to_string(),
            max_zoom: 20,
        }
    }
}

impl GeodesyEndpoints {
    /// The map page needs every endpoint; a blank one disables the page.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("points", &self.points),
            ("polygons", &self.polygons),
            ("markers", &self.markers),
            ("extent", &self.extent),
            ("list", &self.list),
            ("update", &self.update_base),
            ("delete", &self.delete_base),
        ];
        match required.iter().find(|(_, url)| url.trim().is_empty()) {
            Some((name, _)) => Err(ConfigError::MissingEndpoint(name)),
            None => Ok(()),
        }
    }
}

pub fn parse_config(json: &str) -> Result<AppConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Load configuration from the page global `ARCHEO_CONFIG`.
///
/// Falls back to the embedded default when the global is absent or invalid.
pub fn load_config() -> AppConfig {
    if let Some(value) = web_sys::window().and_then(|w| {
        js_sys::Reflect::get(&w, &wasm_bindgen::JsValue::from_str("ARCHEO_CONFIG")).ok()
    }) {
        if !value.is_undefined() && !value.is_null() {
            match serde_wasm_bindgen::from_value::<AppConfig>(value) {
                Ok(config) => {
                    log::info!("Loaded configuration from window.ARCHEO_CONFIG");
                    return config;
                }
                Err(e) => log::warn!("window.ARCHEO_CONFIG ignored: {}", e),
            }
        }
    }

    log::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG).unwrap_or_default()
}

thread_local! {
    static ACTIVE: RefCell<Option<AppConfig>> = const { RefCell::new(None) };
}

/// Makes `config` the process-wide configuration and provides it as context.
pub fn install_config(config: AppConfig) {
    ACTIVE.with(|active| *active.borrow_mut() = Some(config.clone()));
    provide_context(config);
}

/// Installed configuration; usable from async tasks and event handlers,
/// which run without a reactive owner.
pub fn current_config() -> AppConfig {
    ACTIVE
        .with(|active| active.borrow().clone())
        .unwrap_or_default()
}

/// Configuration from context, else the installed one.
pub fn use_config() -> AppConfig {
    use_context::<AppConfig>().unwrap_or_else(current_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.timing.suggest_debounce_ms, 250);
        assert_eq!(config.timing.map_debounce_ms, 200);
        assert_eq!(config.map.default_center, (49.0, 15.0));
        assert_eq!(config.map.default_zoom, 6);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(r#"{"geodesy": {"points": "/api/pts"}}"#).unwrap();
        assert_eq!(config.geodesy.points, "/api/pts");
        assert_eq!(config.geodesy.polygons, "/geodesy/polygons-geojson");
        assert_eq!(config.timing, Timing::default());
    }

    #[test]
    fn test_blank_endpoint_is_a_config_error() {
        let mut endpoints = GeodesyEndpoints::default();
        assert!(endpoints.validate().is_ok());
        endpoints.extent = "  ".to_string();
        assert_eq!(endpoints.validate(), Err(ConfigError::MissingEndpoint("extent")));
    }

    #[test]
    fn test_installed_config_is_visible_without_owner() {
        assert_eq!(current_config(), AppConfig::default());
        let config = AppConfig {
            api_base: Some("https://archeo.example".to_string()),
            ..AppConfig::default()
        };
        Owner::new().with(|| install_config(config.clone()));
        assert_eq!(current_config(), config);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(parse_config("not json"), Err(ConfigError::Parse(_))));
    }
}
