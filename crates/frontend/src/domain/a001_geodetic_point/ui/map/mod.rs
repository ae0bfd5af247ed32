//! Geodesy map page: Leaflet map with points, polygons and photo markers
//! kept in sync with the viewport and the filters.

use contracts::domain::a001_geodetic_point::ExtentResponse;
use contracts::shared::geo::{Feature, FeatureCollection};
use gloo_timers::future::TimeoutFuture;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::closure::Closure;

use crate::domain::a001_geodetic_point::api;
use crate::domain::a001_geodetic_point::sync::initial_view::InitialView;
use crate::domain::a001_geodetic_point::sync::palette::known_codes;
use crate::domain::a001_geodetic_point::sync::popup::popup_html;
use crate::domain::a001_geodetic_point::sync::{
    ApplyOutcome, FilterField, LayerKind, LayerRequest, RefreshPlan, RefreshStep, ViewportSync,
};
use crate::domain::a001_geodetic_point::ui::list::PointsTable;
use crate::shared::api_utils::FetchGuard;
use crate::shared::config::{use_config, AppConfig};
use crate::shared::icons::icon;
use crate::shared::leaflet::{Layer, LayerGroup, LeafletMap};
use crate::shared::modal_frame::ModalFrame;
use crate::shared::notice::{Notice, NoticeBar};
use crate::shared::sequence::Ticket;

struct MapHandles {
    map: LeafletMap,
    groups: [LayerGroup; 3],
    _on_moveend: Closure<dyn FnMut()>,
}

fn feature_layer(kind: LayerKind, feature: &Feature) -> Option<Layer> {
    let geometry = feature.geometry.as_ref()?;
    let style = kind.style(feature);
    let layer = match geometry.point_lon_lat() {
        Some((lon, lat)) => Layer::circle(lat, lon, &style),
        None => Layer::geo_json(&serde_json::to_value(geometry).ok()?, &style),
    };
    Some(layer.bind_popup(&popup_html(kind, feature)))
}

/// Reactive handles of one mounted map page.
///
/// Async continuations outlive the page when the user navigates away, so
/// every access after an `await` goes through the `try_` accessors and
/// gives up once the page is disposed.
#[derive(Clone, Copy)]
struct MapPage {
    sync: RwSignal<ViewportSync>,
    handles: StoredValue<Option<MapHandles>, LocalStorage>,
    in_flight: StoredValue<Option<FetchGuard>, LocalStorage>,
    ready: RwSignal<bool>,
    notice: RwSignal<Option<Notice>>,
    config: StoredValue<AppConfig>,
}

impl MapPage {
    fn new(config: AppConfig) -> Self {
        Self {
            sync: RwSignal::new(ViewportSync::new()),
            handles: StoredValue::new_local(None),
            in_flight: StoredValue::new_local(None),
            ready: RwSignal::new(false),
            notice: RwSignal::new(None),
            config: StoredValue::new(config),
        }
    }

    fn is_live(self) -> bool {
        !self.sync.is_disposed()
    }

    fn abort_in_flight(self) {
        if let Some(Some(guard)) = self.in_flight.try_update_value(|g| g.take()) {
            guard.abort();
        }
    }

    /// Guard for the next request; replaces (and aborts) the previous one.
    fn track(self, guard: &FetchGuard) {
        if let Some(Some(previous)) = self.in_flight.try_update_value(|g| g.replace(guard.clone())) {
            previous.abort();
        }
    }

    /// Starts a pass right away over the live viewport.
    fn refresh_now(self) {
        if self.ready.try_get_untracked() != Some(true) {
            return;
        }
        let Some(bbox) = self
            .handles
            .try_with_value(|h| h.as_ref().map(|h| h.map.bounds()))
            .flatten()
        else {
            return;
        };
        let Some(plan) = self.sync.try_update(|s| s.begin_refresh(bbox)) else {
            return;
        };
        self.abort_in_flight();
        log::debug!("map refresh pass {} over {}", plan.pass.value(), bbox.to_param());
        spawn_local(self.run_pass(plan));
    }

    /// Arms the shared debounce timer for `ticket`.
    fn schedule(self, ticket: Ticket) {
        let Some(delay) = self.config.try_with_value(|c| c.timing.map_debounce_ms) else {
            return;
        };
        spawn_local(async move {
            TimeoutFuture::new(delay).await;
            if self.sync.try_update(|s| s.on_quiet(ticket)) == Some(true) {
                self.refresh_now();
            }
        });
    }

    async fn run_pass(self, plan: RefreshPlan) {
        let Some(config) = self.config.try_get_value() else {
            return;
        };
        let mut failures = Vec::new();

        for step in plan.steps {
            if self.sync.try_with_untracked(|s| s.is_pass_current(plan.pass)) != Some(true) {
                log::debug!("map refresh pass {} superseded", plan.pass.value());
                return;
            }
            match step {
                RefreshStep::Clear(kind) => {
                    if self.sync.try_update(|s| s.clear_layer(kind)) == Some(true) {
                        self.draw(kind);
                    }
                }
                RefreshStep::Fetch(request) => {
                    let guard = FetchGuard::with_timeout(config.timing.fetch_timeout_ms);
                    self.track(&guard);
                    let endpoint = request.layer.endpoint(&config.geodesy);
                    let result = api::fetch_layer(endpoint, &request.query, &guard).await;
                    if !self.apply_fetched(&request, result, &mut failures) {
                        return;
                    }
                }
            }
        }

        if self.sync.try_update(|s| s.finish_pass(plan.pass)).is_none() {
            return;
        }
        if !failures.is_empty() {
            self.notice.try_set(Some(Notice::retryable(format!(
                "Map refresh failed ({})",
                failures.join("; ")
            ))));
        }
    }

    /// Applies one layer response. Returns `false` once the page is gone.
    fn apply_fetched(
        self,
        request: &LayerRequest,
        result: Result<FeatureCollection, String>,
        failures: &mut Vec<String>,
    ) -> bool {
        let label = request.layer.label();
        match self.sync.try_update(|s| s.apply_layer(request, result)) {
            Some(ApplyOutcome::Applied(count)) => {
                log::debug!("{} layer: {} features", label, count);
                self.draw(request.layer);
            }
            Some(ApplyOutcome::Failed(e)) => {
                log::error!("{} layer refresh failed: {}", label, e);
                failures.push(format!("{}: {}", label, e));
            }
            Some(ApplyOutcome::Stale) => {
                log::debug!("discarded stale {} response", label);
            }
            None => {
                log::debug!("map page gone, dropping {} response", label);
                return false;
            }
        }
        true
    }

    /// Redraws a layer group from the current layer contents.
    fn draw(self, kind: LayerKind) {
        self.handles.try_with_value(|handles| {
            let Some(handles) = handles else {
                return;
            };
            let group = &handles.groups[kind.index()];
            group.clear_layers();
            self.sync.try_with_untracked(|s| {
                for feature in s.layer(kind).features() {
                    if let Some(layer) = feature_layer(kind, feature) {
                        group.add_layer(&layer);
                    }
                }
            });
        });
    }

    /// Fits the data extent (or the default view), then runs the first pass.
    async fn init_view(self) {
        let Some(config) = self.config.try_get_value() else {
            return;
        };
        let guard = FetchGuard::with_timeout(config.timing.fetch_timeout_ms);
        self.track(&guard);
        let extent = api::fetch_extent(&config.geodesy, &guard).await;
        if self.apply_extent(extent) {
            self.refresh_now();
        }
    }

    /// Moves the map to its first view. Returns `false` once the page is gone.
    fn apply_extent(self, extent: Result<ExtentResponse, String>) -> bool {
        let Some(defaults) = self.config.try_with_value(|c| c.map.clone()) else {
            log::debug!("map page gone, dropping extent");
            return false;
        };
        if let Err(e) = &extent {
            log::error!("extent fetch failed: {}", e);
            self.notice
                .try_set(Some(Notice::error(format!("Could not load data extent: {}", e))));
        }
        let view = InitialView::resolve(&extent, &defaults);
        let moved = self.handles.try_with_value(|handles| {
            let Some(handles) = handles else {
                return false;
            };
            match &view {
                InitialView::Fit { bbox, padding } => handles.map.fit_bounds(bbox, *padding),
                InitialView::Center { lat, lon, zoom } => {
                    log::info!("initial view centred on {}, {} at zoom {}", lat, lon, zoom);
                    handles.map.set_view(*lat, *lon, *zoom);
                }
            }
            true
        });
        if moved != Some(true) {
            return false;
        }
        self.ready.try_set(true);
        self.is_live()
    }

    fn mount(self, element: &web_sys::HtmlElement) {
        let Some(config) = self.config.try_get_value() else {
            return;
        };
        let map = match LeafletMap::mount(element) {
            Ok(map) => map,
            Err(e) => {
                log::error!("{}", e);
                self.notice.set(Some(Notice::error(format!("Map unavailable: {}", e))));
                return;
            }
        };
        Layer::tiles(&config.map.tile_url, &config.map.tile_attribution, config.map.max_zoom)
            .add_to(&map);
        let groups = [LayerGroup::new(), LayerGroup::new(), LayerGroup::new()];
        for group in &groups {
            group.add_to(&map);
        }
        let on_moveend = Closure::<dyn FnMut()>::new(move || {
            if let Some(ticket) = self.sync.try_update(|s| s.on_viewport_moved()) {
                self.schedule(ticket);
            }
        });
        map.on("moveend", &on_moveend);
        self.handles.set_value(Some(MapHandles {
            map,
            groups,
            _on_moveend: on_moveend,
        }));
        spawn_local(self.init_view());
    }
}

#[component]
#[allow(non_snake_case)]
pub fn GeodesyMapPage() -> impl IntoView {
    let config = use_config();
    let config_error = config.geodesy.validate().err();
    if let Some(e) = &config_error {
        log::warn!("geodesy map disabled: {}", e);
    }

    let page = MapPage::new(config);
    let sync = page.sync;
    let map_ref = NodeRef::<html::Div>::new();
    let show_table = RwSignal::new(false);
    let inert = config_error.is_some();

    Effect::new(move |_| {
        if inert {
            return;
        }
        if let Some(element) = map_ref.get() {
            if page.handles.try_with_value(|h| h.is_none()) == Some(true) {
                page.mount(&element);
            }
        }
    });

    on_cleanup(move || {
        page.abort_in_flight();
        if let Some(Some(handles)) = page.handles.try_update_value(|h| h.take()) {
            handles.map.remove();
        }
    });

    let refresh = Callback::new(move |_| page.refresh_now());

    let on_typed = move |field: FilterField| {
        move |ev: leptos::ev::Event| {
            let value = event_target_value(&ev);
            if let Some(ticket) = sync.try_update(|s| s.on_filter_typed(field, value)) {
                page.schedule(ticket);
            }
        }
    };

    let toggle = move |kind: LayerKind| {
        view! {
            <label class="map-toolbar__toggle">
                <input
                    type="checkbox"
                    prop:checked=move || sync.with(|s| s.is_enabled(kind))
                    on:change=move |ev| {
                        let enabled = event_target_checked(&ev);
                        sync.update(|s| s.set_layer_enabled(kind, enabled));
                        page.refresh_now();
                    }
                />
                {kind.label()}
                <span class="map-toolbar__count">
                    {move || sync.with(|s| s.layer(kind).len())}
                </span>
            </label>
        }
    };

    if let Some(e) = config_error {
        return view! {
            <div class="page geodesy-map">
                <div class="notice notice--error">{format!("Map is not configured: {}", e)}</div>
            </div>
        }
        .into_any();
    }

    view! {
        <div class="page geodesy-map">
            <div class="map-toolbar">
                <select
                    class="form__input"
                    on:change=move |ev| {
                        let code = event_target_value(&ev);
                        sync.update(|s| s.set_code(code));
                        page.refresh_now();
                    }
                >
                    <option value="">"All codes"</option>
                    {known_codes()
                        .map(|code| view! { <option value=code>{code}</option> })
                        .collect_view()}
                </select>
                <input
                    type="text"
                    class="form__input"
                    placeholder="Search notes"
                    on:input=on_typed(FilterField::Text)
                />
                <input
                    type="text"
                    class="form__input map-toolbar__id"
                    placeholder="ID from"
                    on:input=on_typed(FilterField::IdFrom)
                />
                <input
                    type="text"
                    class="form__input map-toolbar__id"
                    placeholder="ID to"
                    on:input=on_typed(FilterField::IdTo)
                />
                {LayerKind::ALL.into_iter().map(toggle).collect_view()}
                <button class="button button--secondary" on:click=move |_| page.refresh_now()>
                    {icon("refresh")}
                    "Reload"
                </button>
                <button class="button button--secondary" on:click=move |_| show_table.set(true)>
                    {icon("list")}
                    "Points table"
                </button>
            </div>

            <NoticeBar notice=page.notice on_retry=refresh />

            <div class="geodesy-map__canvas" node_ref=map_ref style="height: 70vh;"></div>

            <Show when=move || show_table.get()>
                <ModalFrame
                    title="Geodetic points"
                    on_close=Callback::new(move |_| show_table.set(false))
                    modal_class="modal--wide".to_string()
                >
                    <PointsTable on_changed=refresh />
                </ModalFrame>
            </Show>
        </div>
    }
    .into_any()
}
