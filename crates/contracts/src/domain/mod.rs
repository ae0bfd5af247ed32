pub mod a001_geodetic_point;
