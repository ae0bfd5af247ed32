use contracts::shared::geo::Feature;

use super::layers::LayerKind;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn text(feature: &Feature, key: &str) -> String {
    escape_html(&feature.property_text(key).unwrap_or_default())
}

/// Popup HTML for a feature of `kind`. Property values are escaped.
pub fn popup_html(kind: LayerKind, feature: &Feature) -> String {
    match kind {
        LayerKind::Points => format!(
            "<div><strong>ID:</strong> {}<br><strong>Code:</strong> {}<br><strong>Notes:</strong> {}</div>",
            text(feature, "id_pts"),
            text(feature, "code"),
            text(feature, "notes"),
        ),
        LayerKind::Polygons => format!(
            "<strong>Polygon:</strong> {}",
            text(feature, "polygon_name")
        ),
        LayerKind::Markers => format!(
            "<strong>Photo:</strong> {}<br>{}<br>alt: {}",
            text(feature, "id_foto"),
            text(feature, "file_name"),
            text(feature, "gps_alt"),
        ),
    }
}
