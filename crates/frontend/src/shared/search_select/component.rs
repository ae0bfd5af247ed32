use contracts::shared::lookup::LookupItem;
use gloo_timers::future::TimeoutFuture;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;

use super::api::fetch_suggestions;
use super::model::{FieldValue, SelectedItem};
use super::registry::SelectorHandle;
use super::session::InputOutcome;
use crate::shared::api_utils::FetchGuard;
use crate::shared::config::use_config;
use crate::shared::icons::icon;
use crate::shared::outside_click::{use_outside_click, ListenerId};
use crate::shared::sequence::Ticket;

/// Renders the selector behind `handle`.
///
/// Rendering the same handle twice shows the same chips: state lives in the
/// handle, not in the component. Only the oldest live render emits the
/// hidden form fields.
#[component]
#[allow(non_snake_case)]
pub fn SearchSelect(
    handle: SelectorHandle,
    /// Extra class for the root element.
    #[prop(optional)]
    class: Option<String>,
) -> impl IntoView {
    let session = handle.session();
    let render = handle.claim_render();
    on_cleanup(move || handle.release_render(render));
    let timing = use_config().timing;
    let root_ref = NodeRef::<html::Div>::new();
    let in_flight: StoredValue<Option<FetchGuard>, LocalStorage> = StoredValue::new_local(None);

    let (endpoint, placeholder, inert) = session.with_untracked(|s| {
        (
            s.config().endpoint.clone(),
            s.config().placeholder.clone(),
            s.is_inert(),
        )
    });
    let endpoint = StoredValue::new(endpoint);

    let abort_in_flight = move || {
        if let Some(Some(guard)) = in_flight.try_update_value(|g| g.take()) {
            guard.abort();
        }
    };

    let run_query = move |ticket: Ticket| {
        let Some((request, query)) = session.try_update(|s| s.on_quiet(ticket)).flatten() else {
            return;
        };
        let guard = FetchGuard::with_timeout(timing.fetch_timeout_ms);
        if let Some(Some(previous)) = in_flight.try_update_value(|g| g.replace(guard.clone())) {
            previous.abort();
        }
        let endpoint = endpoint.get_value();
        spawn_local(async move {
            let result = fetch_suggestions(&endpoint, &query, &guard).await;
            if let Err(e) = &result {
                log::warn!("suggestions from {} failed: {}", endpoint, e);
            }
            let applied = session
                .try_update(|s| s.on_suggestions(request, result))
                .unwrap_or(false);
            if !applied {
                log::debug!("discarded stale suggestions for '{}'", query.q);
            }
        });
    };

    let on_input = move |ev: ev::Event| {
        let text = event_target_value(&ev);
        match session.try_update(|s| s.on_input(text)) {
            Some(InputOutcome::Scheduled(ticket)) => {
                let debounce_ms = timing.suggest_debounce_ms;
                spawn_local(async move {
                    TimeoutFuture::new(debounce_ms).await;
                    run_query(ticket);
                });
            }
            Some(InputOutcome::Cleared) => abort_in_flight(),
            _ => {}
        }
    };

    let close = move || {
        if session.with_untracked(|s| s.is_active()) {
            session.update(|s| s.close_dropdown());
            abort_in_flight();
        }
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Escape" {
            close();
        }
    };

    let pick = move |index: usize| {
        session.update(|s| {
            s.pick_suggestion(index);
        });
        abort_in_flight();
    };

    let remove = move |id: String| {
        session.update(|s| {
            s.remove(&id);
        });
    };

    if let Some(hub) = use_outside_click() {
        let registered: StoredValue<Option<ListenerId>> = StoredValue::new(None);
        Effect::new(move |_| {
            let Some(root) = root_ref.get() else {
                return;
            };
            if registered.get_value().is_none() {
                let id = hub.register(handle.group(), root.into(), Callback::new(move |_| close()));
                registered.set_value(Some(id));
            }
        });
        on_cleanup(move || {
            if let Some(id) = registered.try_get_value().flatten() {
                hub.unregister(id);
            }
        });
    }

    let root_class = match class {
        Some(extra) => format!("search-select {}", extra),
        None => "search-select".to_string(),
    };

    view! {
        <div class=root_class node_ref=root_ref>
            <div class="search-select__chips">
                <For
                    each=move || session.with(|s| s.selection().items().to_vec())
                    key=|item: &SelectedItem| item.id.clone()
                    children=move |item: SelectedItem| {
                        let id = item.id.clone();
                        view! {
                            <span class="search-select__chip" title=item.id.clone()>
                                {item.label}
                                <button
                                    type="button"
                                    class="search-select__chip-remove"
                                    aria-label="Remove"
                                    on:click=move |_| remove(id.clone())
                                >
                                    "×"
                                </button>
                            </span>
                        }
                    }
                />
            </div>
            <input
                type="text"
                class="search-select__input"
                autocomplete="off"
                placeholder=placeholder
                disabled=inert
                prop:value=move || session.with(|s| s.text().to_string())
                on:input=on_input
                on:keydown=on_keydown
            />
            <Show when=move || session.with(|s| s.is_open() || s.is_loading())>
                <ul class="search-select__dropdown" role="listbox">
                    <Show when=move || session.with(|s| s.is_loading())>
                        <li class="search-select__status" aria-live="polite">
                            {icon("search")}
                            "Searching..."
                        </li>
                    </Show>
                    <For
                        each=move || {
                            session.with(|s| {
                                s.suggestions().iter().cloned().enumerate().collect::<Vec<_>>()
                            })
                        }
                        key=|(index, item): &(usize, LookupItem)| (*index, item.id.clone())
                        children=move |(index, item): (usize, LookupItem)| {
                            view! {
                                <li
                                    class="search-select__option"
                                    role="option"
                                    on:mousedown=move |ev: ev::MouseEvent| {
                                        // keep focus in the input
                                        ev.prevent_default();
                                        pick(index);
                                    }
                                >
                                    {item.text}
                                </li>
                            }
                        }
                    />
                </ul>
            </Show>
            <For
                each=move || handle.rendered_fields(render)
                key=|field: &FieldValue| field.value.clone()
                children=move |field: FieldValue| {
                    view! { <input type="hidden" name=field.name value=field.value /> }
                }
            />
        </div>
    }
}
