//! Drawings filter form: three selectors whose values become the query
//! string of the drawings listing.

use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use leptos_router::NavigateOptions;

use crate::shared::api_utils::append_pairs;
use crate::shared::search_select::{
    use_selector, FieldValue, SearchSelect, SelectorConfig, SelectorHandle, SelectorMode,
};

pub const AUTHORS_ENDPOINT: &str = "/drawings/api/search/authors";
pub const SJ_ENDPOINT: &str = "/drawings/api/search/sj";
pub const SECTIONS_ENDPOINT: &str = "/drawings/api/search/sections";

/// Selector configurations of the form, in display order.
pub fn filter_selectors() -> [(&'static str, SelectorConfig); 3] {
    [
        (
            "Author",
            SelectorConfig::new(SelectorMode::Single, AUTHORS_ENDPOINT, "author")
                .placeholder("Search author..."),
        ),
        (
            "Survey units",
            SelectorConfig::new(SelectorMode::Multi, SJ_ENDPOINT, "ref_sj")
                .placeholder("Search SU...")
                .label_prefix("SU"),
        ),
        (
            "Sections",
            SelectorConfig::new(SelectorMode::Multi, SECTIONS_ENDPOINT, "ref_section")
                .placeholder("Search section...")
                .label_prefix("Section"),
        ),
    ]
}

/// `path?name=value&...` from the exported values of every selector.
pub fn filter_url(path: &str, values: &[FieldValue]) -> String {
    append_pairs(path, values.iter().map(|v| (v.name.as_str(), v.value.as_str())))
}

/// All values of `name` in the current page's query string.
fn query_values(name: &str) -> Vec<String> {
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    web_sys::UrlSearchParams::new_with_str(&search)
        .map(|params| {
            params
                .get_all(name)
                .iter()
                .filter_map(|v| v.as_string())
                .collect()
        })
        .unwrap_or_default()
}

#[component]
#[allow(non_snake_case)]
pub fn DrawingsFilter() -> impl IntoView {
    let navigate = use_navigate();

    let selectors: Vec<(&'static str, SelectorHandle)> = filter_selectors()
        .into_iter()
        .map(|(label, config)| {
            let field_name = config.field_name.clone();
            let handle = use_selector(format!("drawings-filter:{}", field_name), config);
            let existing = query_values(&field_name);
            if !existing.is_empty() {
                handle.prefill_bare(existing);
            }
            (label, handle)
        })
        .collect();
    let handles: Vec<SelectorHandle> = selectors.iter().map(|(_, h)| *h).collect();
    let handles = StoredValue::new(handles);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let values: Vec<FieldValue> = handles.with_value(|hs| hs.iter().flat_map(|h| h.values()).collect());
        let url = filter_url("/drawings", &values);
        log::debug!("drawings filter: {}", url);
        navigate(&url, NavigateOptions::default());
    };

    let on_clear = move |_| {
        handles.with_value(|hs| hs.iter().for_each(|h| h.clear()));
    };

    view! {
        <form class="page drawings-filter" on:submit=on_submit>
            {selectors
                .into_iter()
                .map(|(label, handle)| {
                    view! {
                        <div class="form__field">
                            <span class="form__label">{label}</span>
                            <SearchSelect handle=handle />
                        </div>
                    }
                })
                .collect_view()}
            <div class="drawings-filter__actions">
                <button type="button" class="button button--secondary" on:click=on_clear>
                    "Clear"
                </button>
                <button type="submit" class="button button--primary">
                    "Filter"
                </button>
            </div>
        </form>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_form_selectors() {
        let [author, sj, sections] = filter_selectors();
        assert_eq!(author.1.mode, SelectorMode::Single);
        assert_eq!(author.1.field_name, "author");
        assert_eq!(sj.1.endpoint, "/drawings/api/search/sj");
        assert_eq!(sj.1.mode, SelectorMode::Multi);
        assert_eq!(sj.1.field_name, "ref_sj");
        assert_eq!(sections.1.field_name, "ref_section");
        assert!(filter_selectors().iter().all(|(_, c)| c.validate().is_ok()));
    }

    #[test]
    fn test_prefilled_chips_are_labelled_by_kind() {
        let [author, sj, sections] = filter_selectors();
        assert_eq!(sj.1.bare_item("12").label, "SU 12");
        assert_eq!(sections.1.bare_item("4").label, "Section 4");
        assert_eq!(author.1.bare_item("7").label, "7");
    }

    #[test]
    fn test_filter_url_repeats_multi_values() {
        let values = vec![
            FieldValue { name: "author".into(), value: "7".into() },
            FieldValue { name: "ref_sj".into(), value: "101".into() },
            FieldValue { name: "ref_sj".into(), value: "102".into() },
            FieldValue { name: "ref_section".into(), value: "3".into() },
        ];
        assert_eq!(
            filter_url("/drawings", &values),
            "/drawings?author=7&ref_sj=101&ref_sj=102&ref_section=3"
        );
        assert_eq!(filter_url("/drawings", &[]), "/drawings");
    }
}
