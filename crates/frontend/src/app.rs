use crate::routes::routes::AppRoutes;
use crate::shared::config::{install_config, load_config};
use crate::shared::outside_click::OutsideClickHub;
use crate::shared::search_select::SelectorRegistry;
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    // Configuration first: everything below reads it.
    install_config(load_config());

    // One document click listener for all dropdowns.
    provide_context(OutsideClickHub::install());

    // Selector mounts are shared app-wide so remounts reuse their state.
    provide_context(SelectorRegistry::new());

    view! {
        <AppRoutes />
    }
}
