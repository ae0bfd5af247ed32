pub mod api_utils;
pub mod config;
pub mod icons;
pub mod leaflet;
pub mod modal_frame;
pub mod notice;
pub mod outside_click;
pub mod search_select;
pub mod sequence;
