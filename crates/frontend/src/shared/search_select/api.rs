use contracts::shared::lookup::{LookupItem, SuggestionQuery, SuggestionResponse};

use crate::shared::api_utils::{api_url, get_json, with_query, FetchGuard};

/// Fetch one page of suggestions from a lookup endpoint.
///
/// Items without an id are dropped.
pub async fn fetch_suggestions(
    endpoint: &str,
    query: &SuggestionQuery,
    guard: &FetchGuard,
) -> Result<Vec<LookupItem>, String> {
    let url = with_query(&api_url(endpoint), query)?;
    let response: SuggestionResponse = get_json(&url, guard).await?;
    Ok(response.into_items())
}
