use serde::{Deserialize, Serialize};

use crate::shared::geo::BoundingBox;
use crate::shared::null_as_empty;

/// Geodetic point as listed in the points table (`/geodesy/list`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPointRow {
    pub id_pts: i64,
    pub x: f64,
    pub y: f64,
    pub h: f64,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Filters of the points table. Empty strings mean "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub q: String,
    pub id_from: String,
    pub id_to: String,
    pub limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            id_from: String::new(),
            id_to: String::new(),
            limit: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rows: Vec<GeoPointRow>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ListResponse {
    pub fn into_result(self) -> Result<Vec<GeoPointRow>, String> {
        if self.ok {
            Ok(self.rows)
        } else {
            Err(self.error.unwrap_or_else(|| "list failed".to_string()))
        }
    }
}

/// Body of `POST <update_base>/<id_pts>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGeoPointDto {
    pub x: f64,
    pub y: f64,
    pub h: f64,
    pub code: String,
    pub notes: String,
}

/// `{ok, error?}` envelope of update/delete endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl MutationResponse {
    pub fn into_result(self, fallback: &str) -> Result<(), String> {
        if self.ok {
            Ok(())
        } else {
            Err(self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()))
        }
    }
}

/// `{ok, bbox}` answer of the extent endpoint; `bbox` is `null` when no points exist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtentResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
}

impl ExtentResponse {
    pub fn extent(&self) -> Option<BoundingBox> {
        if !self.ok {
            return None;
        }
        self.bbox.and_then(BoundingBox::from_extent)
    }
}

/// Query of a layer endpoint. Only the points layer carries the text/id filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerQuery {
    pub bbox: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_to: Option<String>,
    pub limit: u32,
}

impl LayerQuery {
    pub fn bbox_only(bbox: &BoundingBox, limit: u32) -> Self {
        Self {
            bbox: bbox.to_param(),
            code: None,
            q: None,
            id_from: None,
            id_to: None,
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_into_result() {
        let ok: ListResponse = serde_json::from_str(
            r#"{"ok": true, "rows": [{"id_pts": 4, "x": 1.5, "y": 2.0, "h": 300.25, "code": "SU", "notes": null}]}"#,
        )
        .unwrap();
        let rows = ok.into_result().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code.as_deref(), Some("SU"));
        assert_eq!(rows[0].notes, None);

        let failed: ListResponse =
            serde_json::from_str(r#"{"ok": false, "error": "db down"}"#).unwrap();
        assert_eq!(failed.into_result().unwrap_err(), "db down");
    }

    #[test]
    fn test_mutation_response_uses_server_text_or_fallback() {
        let rejected: MutationResponse =
            serde_json::from_str(r#"{"ok": false, "error": "Invalid x/y/h"}"#).unwrap();
        assert_eq!(rejected.into_result("update failed").unwrap_err(), "Invalid x/y/h");

        let bare: MutationResponse = serde_json::from_str(r#"{"ok": false}"#).unwrap();
        assert_eq!(bare.into_result("delete failed").unwrap_err(), "delete failed");

        let ok: MutationResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(ok.into_result("x").is_ok());
    }

    #[test]
    fn test_extent_null_or_invalid_is_none() {
        let empty: ExtentResponse = serde_json::from_str(r#"{"ok": true, "bbox": null}"#).unwrap();
        assert!(empty.extent().is_none());

        let inverted: ExtentResponse =
            serde_json::from_str(r#"{"ok": true, "bbox": [16.0, 49.0, 15.0, 50.0]}"#).unwrap();
        assert!(inverted.extent().is_none());

        let not_ok: ExtentResponse =
            serde_json::from_str(r#"{"ok": false, "bbox": [14.0, 49.0, 15.0, 50.0]}"#).unwrap();
        assert!(not_ok.extent().is_none());

        let good: ExtentResponse =
            serde_json::from_str(r#"{"ok": true, "bbox": [14.0, 49.0, 15.0, 50.0]}"#).unwrap();
        assert_eq!(good.extent(), Some(BoundingBox::new(49.0, 14.0, 50.0, 15.0)));
    }

    #[test]
    fn test_bbox_only_query_skips_filters() {
        let q = LayerQuery::bbox_only(&BoundingBox::new(49.0, 14.0, 50.0, 15.0), 2000);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json, serde_json::json!({"bbox": "14,49,15,50", "limit": 2000}));
    }
}
