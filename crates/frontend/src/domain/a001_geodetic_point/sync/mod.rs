//! Headless core of the geodesy map: which layers to fetch, with which
//! query, and whether a response may still be drawn.

pub mod initial_view;
pub mod layers;
pub mod palette;
pub mod popup;
pub mod scheduler;

pub use layers::{LayerKind, LayerState};
pub use scheduler::{ApplyOutcome, FilterField, LayerRequest, MapFilters, RefreshPlan, RefreshStep, ViewportSync};
