//! Search-and-select widget: a text input with server-side suggestions that
//! turns picks into removable chips and hidden form fields.

pub mod api;
pub mod component;
pub mod model;
pub mod registry;
pub mod session;

pub use component::SearchSelect;
pub use model::{FieldValue, SelectedItem, SelectorConfig, SelectorMode};
pub use registry::{use_selector, SelectorHandle, SelectorRegistry};
