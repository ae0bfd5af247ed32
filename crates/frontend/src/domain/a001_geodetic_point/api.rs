//! HTTP calls of the geodesy page.

use contracts::domain::a001_geodetic_point::{
    ExtentResponse, GeoPointRow, LayerQuery, ListQuery, ListResponse, MutationResponse,
    UpdateGeoPointDto,
};
use contracts::shared::geo::FeatureCollection;

use crate::shared::api_utils::{api_url, get_json, post_json, with_query, FetchGuard};
use crate::shared::config::GeodesyEndpoints;

/// `<base>/<id>` for the per-record mutation routes.
pub fn item_url(base: &str, id_pts: i64) -> String {
    format!("{}/{}", base.trim_end_matches('/'), id_pts)
}

pub async fn fetch_layer(
    endpoint: &str,
    query: &LayerQuery,
    guard: &FetchGuard,
) -> Result<FeatureCollection, String> {
    let url = with_query(&api_url(endpoint), query)?;
    get_json(&url, guard).await
}

pub async fn fetch_extent(
    endpoints: &GeodesyEndpoints,
    guard: &FetchGuard,
) -> Result<ExtentResponse, String> {
    get_json(&api_url(&endpoints.extent), guard).await
}

pub async fn fetch_list(
    endpoints: &GeodesyEndpoints,
    query: &ListQuery,
    guard: &FetchGuard,
) -> Result<Vec<GeoPointRow>, String> {
    let url = with_query(&api_url(&endpoints.list), query)?;
    let response: ListResponse = get_json(&url, guard).await?;
    response.into_result()
}

pub async fn update_point(
    endpoints: &GeodesyEndpoints,
    id_pts: i64,
    dto: &UpdateGeoPointDto,
    guard: &FetchGuard,
) -> Result<(), String> {
    let url = api_url(&item_url(&endpoints.update_base, id_pts));
    let response: MutationResponse = post_json(&url, Some(dto), guard).await?;
    response.into_result("update failed")
}

pub async fn delete_point(
    endpoints: &GeodesyEndpoints,
    id_pts: i64,
    guard: &FetchGuard,
) -> Result<(), String> {
    let url = api_url(&item_url(&endpoints.delete_base, id_pts));
    let response: MutationResponse = post_json(&url, None::<&()>, guard).await?;
    response.into_result("delete failed")
}
