use contracts::domain::a001_geodetic_point::GeoPointRow;
use leptos::prelude::*;

use super::model::GeoPointForm;
use crate::domain::a001_geodetic_point::api;
use crate::shared::api_utils::FetchGuard;
use crate::shared::config::current_config;

#[derive(Clone, Copy)]
pub struct PointEditViewModel {
    pub id_pts: i64,
    pub form: RwSignal<GeoPointForm>,
    /// Validation or server error, shown next to the save button.
    pub error: RwSignal<Option<String>>,
    pub is_saving: RwSignal<bool>,
}

impl PointEditViewModel {
    pub fn new(row: &GeoPointRow) -> Self {
        Self {
            id_pts: row.id_pts,
            form: RwSignal::new(GeoPointForm::from_row(row)),
            error: RwSignal::new(None),
            is_saving: RwSignal::new(false),
        }
    }

    /// Validates and posts the form. The form keeps its values on failure.
    pub fn save_command(&self, on_saved: Callback<()>) {
        let dto = match self.form.with_untracked(|f| f.to_dto()) {
            Ok(dto) => dto,
            Err(e) => {
                self.error.set(Some(e));
                return;
            }
        };
        self.error.set(None);
        self.is_saving.set(true);

        let config = current_config();
        let id_pts = self.id_pts;
        let error = self.error;
        let is_saving = self.is_saving;
        wasm_bindgen_futures::spawn_local(async move {
            let guard = FetchGuard::with_timeout(config.timing.fetch_timeout_ms);
            let result = api::update_point(&config.geodesy, id_pts, &dto, &guard).await;
            is_saving.set(false);
            match result {
                Ok(()) => {
                    log::info!("point {} updated", id_pts);
                    on_saved.run(());
                }
                Err(e) => {
                    log::error!("update of point {} failed: {}", id_pts, e);
                    error.set(Some(e));
                }
            }
        });
    }
}
