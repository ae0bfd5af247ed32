use contracts::domain::a001_geodetic_point::GeoPointRow;
use leptos::prelude::*;

use super::model::GeoPointForm;
use super::view_model::PointEditViewModel;
use crate::shared::icons::icon;

#[component]
#[allow(non_snake_case)]
pub fn PointEditForm(row: GeoPointRow, on_saved: Callback<()>, on_cancel: Callback<()>) -> impl IntoView {
    let vm = PointEditViewModel::new(&row);
    let form = vm.form;

    let field = move |label: &'static str,
                      get: fn(&GeoPointForm) -> String,
                      set: fn(&mut GeoPointForm, String)| {
        view! {
            <label class="form__field">
                <span class="form__label">{label}</span>
                <input
                    type="text"
                    class="form__input"
                    prop:value=move || form.with(get)
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        form.update(|f| set(f, value));
                    }
                />
            </label>
        }
    };

    view! {
        <div class="point-edit">
            <div class="point-edit__header">
                <h3>{format!("Point {}", vm.id_pts)}</h3>
            </div>
            <div class="point-edit__body">
                {field("X", |f| f.x.clone(), |f, v| f.x = v)}
                {field("Y", |f| f.y.clone(), |f, v| f.y = v)}
                {field("H", |f| f.h.clone(), |f, v| f.h = v)}
                {field("Code", |f| f.code.clone(), |f, v| f.code = v)}
                {field("Notes", |f| f.notes.clone(), |f, v| f.notes = v)}
            </div>
            <div class="point-edit__actions">
                <Show when=move || vm.error.get().is_some()>
                    <span class="form__error">{move || vm.error.get().unwrap_or_default()}</span>
                </Show>
                <button class="button button--secondary" on:click=move |_| on_cancel.run(())>
                    "Cancel"
                </button>
                <button
                    class="button button--primary"
                    disabled=move || vm.is_saving.get()
                    on:click=move |_| vm.save_command(on_saved)
                >
                    {icon("save")}
                    {move || if vm.is_saving.get() { "Saving..." } else { "Save" }}
                </button>
            </div>
        </div>
    }
}
