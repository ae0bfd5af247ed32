/// Colour for points without a known classification code.
pub const DEFAULT_COLOR: &str = "#111111";

/// Colour of markers and polygons that are not classified.
pub const NEUTRAL_COLOR: &str = "#3388ff";

const CODE_COLORS: [(&str, &str); 7] = [
    ("SU", "#1f77b4"),
    ("FX", "#ff7f0e"),
    ("EP", "#2ca02c"),
    ("FP", "#d62728"),
    ("NI", "#9467bd"),
    ("PF", "#8c564b"),
    ("SP", "#7f7f7f"),
];

/// Fixed colour of a classification code. Codes are matched exactly
/// (surrounding whitespace ignored); anything else gets [`DEFAULT_COLOR`].
pub fn code_color(code: Option<&str>) -> &'static str {
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return DEFAULT_COLOR;
    };
    CODE_COLORS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_COLOR)
}

/// Codes offered by the code filter, in palette order.
pub fn known_codes() -> impl Iterator<Item = &'static str> {
    CODE_COLORS.iter().map(|(code, _)| *code)
}
