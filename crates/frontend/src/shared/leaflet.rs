use contracts::shared::geo::BoundingBox;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// JS bindings to the Leaflet global `L` (loaded by the host page)
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = Map)]
    pub type LeafletMap;

    #[wasm_bindgen(js_namespace = L, js_name = map, catch)]
    fn create_map(element: &web_sys::HtmlElement) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view_raw(this: &LeafletMap, center: &JsValue, zoom: u8) -> LeafletMap;

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds_raw(this: &LeafletMap, bounds: &JsValue, options: &JsValue) -> LeafletMap;

    #[wasm_bindgen(method, js_name = getBounds)]
    fn get_bounds(this: &LeafletMap) -> LatLngBounds;

    #[wasm_bindgen(method, js_name = on)]
    fn on_raw(this: &LeafletMap, event: &str, handler: &js_sys::Function) -> LeafletMap;

    #[wasm_bindgen(method, js_name = remove)]
    pub fn remove(this: &LeafletMap);

    pub type LatLngBounds;

    #[wasm_bindgen(method, js_name = getSouth)]
    fn get_south(this: &LatLngBounds) -> f64;
    #[wasm_bindgen(method, js_name = getWest)]
    fn get_west(this: &LatLngBounds) -> f64;
    #[wasm_bindgen(method, js_name = getNorth)]
    fn get_north(this: &LatLngBounds) -> f64;
    #[wasm_bindgen(method, js_name = getEast)]
    fn get_east(this: &LatLngBounds) -> f64;

    pub type Layer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to_raw(this: &Layer, map: &LeafletMap) -> Layer;

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup_raw(this: &Layer, html: &str) -> Layer;

    #[wasm_bindgen(extends = Layer)]
    pub type LayerGroup;

    #[wasm_bindgen(method, js_name = clearLayers)]
    pub fn clear_layers(this: &LayerGroup);

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_layer_raw(this: &LayerGroup, layer: &Layer) -> LayerGroup;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer_raw(url: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = layerGroup)]
    fn layer_group_raw() -> LayerGroup;

    #[wasm_bindgen(js_namespace = L, js_name = circleMarker)]
    fn circle_marker_raw(latlng: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = geoJSON)]
    fn geo_json_raw(data: &JsValue, options: &JsValue) -> Layer;
}

/// Path options shared by circle markers and GeoJSON shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    pub color: String,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    pub fill_opacity: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TileOptions<'a> {
    max_zoom: u8,
    attribution: &'a str,
}

#[derive(Serialize)]
struct FitOptions {
    padding: [u32; 2],
}

#[derive(Serialize)]
struct GeoJsonOptions<'a> {
    style: &'a PathStyle,
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::UNDEFINED)
}

fn lat_lng(lat: f64, lon: f64) -> JsValue {
    js_sys::Array::of2(&JsValue::from_f64(lat), &JsValue::from_f64(lon)).into()
}

/// `[[south, west], [north, east]]`
fn bounds_value(bbox: &BoundingBox) -> JsValue {
    js_sys::Array::of2(&lat_lng(bbox.south, bbox.west), &lat_lng(bbox.north, bbox.east)).into()
}

impl LeafletMap {
    /// Creates a map inside `element`; fails when Leaflet is not loaded.
    pub fn mount(element: &web_sys::HtmlElement) -> Result<LeafletMap, String> {
        let has_leaflet = web_sys::window()
            .and_then(|w| js_sys::Reflect::has(&w, &JsValue::from_str("L")).ok())
            .unwrap_or(false);
        if !has_leaflet {
            return Err("Leaflet (window.L) is not loaded".to_string());
        }
        create_map(element).map_err(|e| format!("Failed to create map: {:?}", e))
    }

    pub fn set_view(&self, lat: f64, lon: f64, zoom: u8) {
        self.set_view_raw(&lat_lng(lat, lon), zoom);
    }

    pub fn fit_bounds(&self, bbox: &BoundingBox, padding: u32) {
        self.fit_bounds_raw(
            &bounds_value(bbox),
            &to_js(&FitOptions {
                padding: [padding, padding],
            }),
        );
    }

    /// Live viewport corners.
    pub fn bounds(&self) -> BoundingBox {
        let b = self.get_bounds();
        BoundingBox::new(b.get_south(), b.get_west(), b.get_north(), b.get_east())
    }

    pub fn on(&self, event: &str, handler: &Closure<dyn FnMut()>) {
        self.on_raw(event, handler.as_ref().unchecked_ref());
    }
}

impl Layer {
    pub fn tiles(url: &str, attribution: &str, max_zoom: u8) -> Layer {
        tile_layer_raw(
            url,
            &to_js(&TileOptions {
                max_zoom,
                attribution,
            }),
        )
    }

    pub fn circle(lat: f64, lon: f64, style: &PathStyle) -> Layer {
        circle_marker_raw(&lat_lng(lat, lon), &to_js(style))
    }

    /// Any GeoJSON object (feature, geometry or collection).
    pub fn geo_json(data: &serde_json::Value, style: &PathStyle) -> Layer {
        let data = data
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .unwrap_or(JsValue::NULL);
        geo_json_raw(&data, &to_js(&GeoJsonOptions { style }))
    }

    pub fn bind_popup(self, html: &str) -> Layer {
        self.bind_popup_raw(html)
    }

    pub fn add_to(&self, map: &LeafletMap) {
        self.add_to_raw(map);
    }
}

impl LayerGroup {
    pub fn new() -> LayerGroup {
        layer_group_raw()
    }

    pub fn add_to(&self, map: &LeafletMap) {
        let layer: &Layer = self.as_ref();
        layer.add_to_raw(map);
    }

    pub fn add_layer(&self, layer: &Layer) {
        self.add_layer_raw(layer);
    }
}
