use serde::{Deserialize, Serialize};

/// One entry of the bank's ATM lookup API, field names as on the wire.
/// The API omits fields freely and sends coordinates as decimal strings,
/// so everything is a defaulted `String`; coordinates are parsed during
/// processing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AtmRecord {
    pub address: String,
    pub house: String,
    pub gps_x: String,
    pub gps_y: String,
    pub currency: String,
    pub install_place_full: String,
    pub install_place: String,
    pub work_time_full: String,
    pub work_time: String,
    #[serde(rename = "ATM_error")]
    pub atm_error: String,
    pub cash_in: String,
}

/// A deduplicated, presentation-ready map marker.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub popup: String,
}
