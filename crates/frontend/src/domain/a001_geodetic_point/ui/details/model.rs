use contracts::domain::a001_geodetic_point::{GeoPointRow, UpdateGeoPointDto};

/// Edit form of one point; numbers are kept as typed until saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoPointForm {
    pub x: String,
    pub y: String,
    pub h: String,
    pub code: String,
    pub notes: String,
}

fn parse_coord(value: &str) -> Option<f64> {
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

impl GeoPointForm {
    pub fn from_row(row: &GeoPointRow) -> Self {
        Self {
            x: row.x.to_string(),
            y: row.y.to_string(),
            h: row.h.to_string(),
            code: row.code.clone().unwrap_or_default(),
            notes: row.notes.clone().unwrap_or_default(),
        }
    }

    /// Checks the coordinates before anything is sent.
    pub fn to_dto(&self) -> Result<UpdateGeoPointDto, String> {
        match (parse_coord(&self.x), parse_coord(&self.y), parse_coord(&self.h)) {
            (Some(x), Some(y), Some(h)) => Ok(UpdateGeoPointDto {
                x,
                y,
                h,
                code: self.code.trim().to_string(),
                notes: self.notes.trim().to_string(),
            }),
            _ => Err("Invalid x/y/h".to_string()),
        }
    }
}
