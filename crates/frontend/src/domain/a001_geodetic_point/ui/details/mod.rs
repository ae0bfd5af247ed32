//! Edit form of one geodetic point.
//!
//! - model.rs: form values and client-side validation
//! - view_model.rs: signals and the save command
//! - view.rs: Leptos component

mod model;
mod view;
mod view_model;

pub use model::GeoPointForm;
pub use view::PointEditForm;
pub use view_model::PointEditViewModel;
