pub mod state;

use contracts::domain::a001_geodetic_point::GeoPointRow;
use leptos::prelude::*;
use leptos::task::spawn_local;

use self::state::{create_state, delete_prompt, AfterMutation, PointsTableState};
use crate::domain::a001_geodetic_point::api;
use crate::domain::a001_geodetic_point::ui::details::PointEditForm;
use crate::shared::api_utils::FetchGuard;
use crate::shared::config::use_config;
use crate::shared::icons::icon;
use crate::shared::modal_frame::ModalFrame;
use crate::shared::notice::{Notice, NoticeBar};

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// Table of geodetic points with edit and delete.
///
/// `on_changed` runs after every successful mutation so the map can
/// refresh; the table reloads itself.
#[component]
#[allow(non_snake_case)]
pub fn PointsTable(on_changed: Callback<()>) -> impl IntoView {
    let state = create_state();
    let config = StoredValue::new(use_config());
    let in_flight: StoredValue<Option<FetchGuard>, LocalStorage> = StoredValue::new_local(None);
    let (editing, set_editing) = signal::<Option<GeoPointRow>>(None);

    let load = move || {
        let Some((ticket, query)) = state.try_update(|s| s.begin_load()) else {
            return;
        };
        let config = config.get_value();
        let guard = FetchGuard::with_timeout(config.timing.fetch_timeout_ms);
        if let Some(Some(previous)) = in_flight.try_update_value(|g| g.replace(guard.clone())) {
            previous.abort();
        }
        spawn_local(async move {
            let result = api::fetch_list(&config.geodesy, &query, &guard).await;
            if let Err(e) = &result {
                log::error!("points list failed: {}", e);
            }
            let applied = state.try_update(|s| s.on_loaded(ticket, result)).unwrap_or(false);
            if !applied {
                log::debug!("discarded stale points list");
            }
        });
    };

    // Dismissing hides the notice until the next failed load.
    let notice = RwSignal::new(None::<Notice>);
    let load_notice = Memo::new(move |_| state.with(|s| s.load_notice()));
    Effect::new(move |_| notice.set(load_notice.get()));
    let retry = Callback::new(move |_| load());

    let after_mutation = move |after: AfterMutation| {
        if after == AfterMutation::ReloadAll {
            load();
            on_changed.run(());
        }
    };

    let delete = move |id_pts: i64| {
        if !confirm(&delete_prompt(id_pts)) {
            return;
        }
        let config = config.get_value();
        spawn_local(async move {
            let guard = FetchGuard::with_timeout(config.timing.fetch_timeout_ms);
            let result = api::delete_point(&config.geodesy, id_pts, &guard).await;
            match &result {
                Ok(()) => log::info!("point {} deleted", id_pts),
                Err(e) => log::error!("delete of point {} failed: {}", id_pts, e),
            }
            if let Some(after) = state.try_update(|s| s.on_mutation_result(id_pts, result)) {
                after_mutation(after);
            }
        });
    };

    let on_saved = Callback::new(move |_| {
        set_editing.set(None);
        after_mutation(AfterMutation::ReloadAll);
    });
    let on_cancel = Callback::new(move |_| set_editing.set(None));

    Effect::new(move |_| {
        if !state.with_untracked(|s| s.is_loaded) {
            load();
        }
    });

    let filter_input = move |placeholder: &'static str,
                             get: fn(&PointsTableState) -> String,
                             set: fn(&mut PointsTableState, String)| {
        view! {
            <input
                type="text"
                class="form__input points-table__filter"
                placeholder=placeholder
                prop:value=move || state.with(get)
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    state.update(|s| set(s, value));
                }
                on:keydown=move |ev: leptos::ev::KeyboardEvent| {
                    if ev.key() == "Enter" {
                        load();
                    }
                }
            />
        }
    };

    view! {
        <div class="points-table">
            <div class="points-table__toolbar">
                {filter_input("Search", |s| s.filters.q.clone(), |s, v| s.filters.q = v)}
                {filter_input("ID from", |s| s.filters.id_from.clone(), |s, v| s.filters.id_from = v)}
                {filter_input("ID to", |s| s.filters.id_to.clone(), |s, v| s.filters.id_to = v)}
                <button
                    class="button button--secondary"
                    disabled=move || state.with(|s| s.loading)
                    on:click=move |_| load()
                >
                    {icon("refresh")}
                    "Reload"
                </button>
            </div>

            <NoticeBar notice=notice on_retry=retry />

            <table class="table">
                <thead>
                    <tr>
                        <th>"ID"</th>
                        <th>"X"</th>
                        <th>"Y"</th>
                        <th>"H"</th>
                        <th>"Code"</th>
                        <th>"Notes"</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    <For
                        each=move || state.with(|s| s.rows.clone())
                        key=|row: &GeoPointRow| row.id_pts
                        children=move |row: GeoPointRow| {
                            let id_pts = row.id_pts;
                            let edit_row = row.clone();
                            view! {
                                <tr>
                                    <td>{row.id_pts}</td>
                                    <td>{row.x}</td>
                                    <td>{row.y}</td>
                                    <td>{row.h}</td>
                                    <td>{row.code.clone().unwrap_or_default()}</td>
                                    <td>{row.notes.clone().unwrap_or_default()}</td>
                                    <td class="points-table__actions">
                                        <button
                                            class="button button--small"
                                            on:click=move |_| set_editing.set(Some(edit_row.clone()))
                                        >
                                            {icon("edit")}
                                            "Edit"
                                        </button>
                                        <button
                                            class="button button--small button--danger"
                                            on:click=move |_| delete(id_pts)
                                        >
                                            {icon("delete")}
                                            "Delete"
                                        </button>
                                        {move || state.with(|s| s.row_error_for(id_pts).map(str::to_string)).map(|e| view! {
                                            <span class="form__error">{e}</span>
                                        })}
                                    </td>
                                </tr>
                            }
                        }
                    />
                </tbody>
            </table>
            <Show when=move || state.with(|s| s.is_loaded && s.rows.is_empty())>
                <p class="points-table__empty">"No points match the filters."</p>
            </Show>

            {move || editing.get().map(|row| {
                let title = format!("Edit point {}", row.id_pts);
                view! {
                    <ModalFrame title=title on_close=on_cancel z_index=1100>
                        <PointEditForm row=row on_saved=on_saved on_cancel=on_cancel />
                    </ModalFrame>
                }
            })}
        </div>
    }
}
