pub mod api;
pub mod sync;
pub mod ui;
