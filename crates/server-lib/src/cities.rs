//! Static table of supported cities

use serde::Serialize;

/// Geographic coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A city the weather endpoint can serve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub id: &'static str,
    pub name: &'static str,
    pub country: &'static str,
    pub coordinates: Coordinates,
}

const fn city(id: &'static str, name: &'static str, latitude: f64, longitude: f64) -> City {
    City {
        id,
        name,
        country: "IN",
        coordinates: Coordinates { latitude, longitude },
    }
}

pub const CITIES: &[City] = &[
    city("hyd", "Hyderabad", 17.3850, 78.4867),
    city("vij", "Vijayawada", 16.5062, 80.6480),
    city("ndl", "Nellore", 14.4426, 79.9865),
    city("vskp", "Visakhapatnam", 17.6868, 83.2185),
    city("blr", "Bengaluru", 12.9716, 77.5946),
];

/// Look up a city by its exact id
pub fn find(id: &str) -> Option<&'static City> {
    CITIES.iter().find(|c| c.id == id)
}
