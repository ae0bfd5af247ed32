pub mod a001_geodetic_point;
pub mod a002_drawing;
