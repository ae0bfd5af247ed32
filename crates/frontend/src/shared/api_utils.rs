//! API utilities for frontend-backend communication
//!
//! URL construction plus JSON GET/POST helpers built on `gloo-net`. Every
//! request can carry an abort signal; [`FetchGuard`] owns one and may abort
//! it on a timer.

use gloo_net::http::{Request, Response};
use gloo_timers::future::TimeoutFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen_futures::spawn_local;
use web_sys::{AbortController, AbortSignal};

use crate::shared::config::current_config;

/// Get the base URL for API requests
///
/// Uses `api_base` from the configuration when present, otherwise the
/// origin of the current page (the catalogue is served same-origin).
///
/// # Returns
/// - API base URL like "https://example.com"
/// - Empty string if window is not available
pub fn api_base() -> String {
    if let Some(base) = current_config().api_base.filter(|b| !b.trim().is_empty()) {
        return base.trim_end_matches('/').to_string();
    }
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

/// Build a full API URL from a path
///
/// Absolute URLs are returned unchanged.
///
/// # Example
/// ```rust,ignore
/// let url = api_url("/geodesy/extent");
/// ```
pub fn api_url(path: &str) -> String {
    join_url(&api_base(), path)
}

pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Appends a serialized query struct to `url`.
pub fn with_query<Q: Serialize>(url: &str, query: &Q) -> Result<String, String> {
    let qs = serde_qs::to_string(query).map_err(|e| format!("Failed to encode query: {}", e))?;
    Ok(append_query(url, &qs))
}

/// Appends repeated `name=value` pairs (e.g. values exported by selectors).
pub fn append_pairs<'a>(url: &str, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let qs = pairs
        .into_iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    append_query(url, &qs)
}

fn append_query(url: &str, qs: &str) -> String {
    if qs.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&{}", url, qs)
    } else {
        format!("{}?{}", url, qs)
    }
}

/// Owns the abort controller of one in-flight request.
///
/// Dropping the guard does not abort; call [`FetchGuard::abort`] to cancel a
/// request that has been superseded.
#[derive(Clone, Default)]
pub struct FetchGuard {
    controller: Option<AbortController>,
}

impl FetchGuard {
    pub fn new() -> Self {
        Self {
            controller: AbortController::new().ok(),
        }
    }

    /// Guard that aborts its request after `timeout_ms`.
    pub fn with_timeout(timeout_ms: u32) -> Self {
        let guard = Self::new();
        if let Some(controller) = guard.controller.clone() {
            spawn_local(async move {
                TimeoutFuture::new(timeout_ms).await;
                // no-op when the request already settled
                controller.abort();
            });
        }
        guard
    }

    pub fn signal(&self) -> Option<AbortSignal> {
        self.controller.as_ref().map(|c| c.signal())
    }

    pub fn abort(&self) {
        if let Some(controller) = &self.controller {
            controller.abort();
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.signal().map(|s| s.aborted()).unwrap_or(false)
    }
}

/// GET `url` and decode a JSON body. Non-2xx answers are errors.
pub async fn get_json<T: DeserializeOwned>(url: &str, guard: &FetchGuard) -> Result<T, String> {
    let signal = guard.signal();
    let response = Request::get(url)
        .abort_signal(signal.as_ref())
        .send()
        .await
        .map_err(|e| send_error(guard, e))?;

    if !response.ok() {
        return Err(error_text(response).await);
    }

    response
        .json::<T>()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))
}

/// POST an optional JSON body and decode the JSON answer.
///
/// The body is decoded even for non-2xx answers: mutation endpoints report
/// validation problems as `{ok: false, error}` with a 4xx/5xx status.
pub async fn post_json<B: Serialize, T: DeserializeOwned>(
    url: &str,
    body: Option<&B>,
    guard: &FetchGuard,
) -> Result<T, String> {
    let signal = guard.signal();
    let builder = Request::post(url).abort_signal(signal.as_ref());
    let sent = match body {
        Some(body) => builder
            .json(body)
            .map_err(|e| format!("Failed to serialize request: {}", e))?
            .send()
            .await,
        None => builder.send().await,
    };
    let response = sent.map_err(|e| send_error(guard, e))?;
    let status = response.status();

    match response.json::<T>().await {
        Ok(decoded) => Ok(decoded),
        Err(_) if !(200..300).contains(&status) => Err(format!("HTTP error: {}", status)),
        Err(e) => Err(format!("Failed to parse response: {}", e)),
    }
}

fn send_error(guard: &FetchGuard, e: gloo_net::Error) -> String {
    if guard.is_aborted() {
        "Request timed out or was cancelled".to_string()
    } else {
        format!("Failed to send request: {}", e)
    }
}

/// Server-provided `error` text if the body carries one, else the status.
async fn error_text(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    server_error_message(&body).unwrap_or_else(|| format!("HTTP error: {}", status))
}

pub fn server_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.as_str())
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}
