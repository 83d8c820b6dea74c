//! Real Madurai locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub interest: &'static str,
    pub visit_minutes: u32,
}

impl Location {
    pub const fn new(
        name: &'static str,
        lat: f64,
        lng: f64,
        interest: &'static str,
        visit_minutes: u32,
    ) -> Self {
        Self {
            name,
            lat,
            lng,
            interest,
            visit_minutes,
        }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

// ============================================================================
// Starting points
// ============================================================================

pub const MADURAI_JUNCTION: Location =
    Location::new("Madurai Junction", 9.9196, 78.1106, "Transit", 0);

pub const PERIYAR_BUS_STAND: Location =
    Location::new("Periyar Bus Stand", 9.9167, 78.1135, "Transit", 0);

// ============================================================================
// Sights
// ============================================================================

pub const TEMPLES: &[Location] = &[
    Location::new("Meenakshi Amman Temple", 9.9195, 78.1193, "Temples", 90),
    Location::new("Koodal Azhagar Temple", 9.9159, 78.1142, "Temples", 30),
    Location::new("Thiruparankundram Murugan Temple", 9.8794, 78.0725, "Temples", 60),
];

pub const HERITAGE: &[Location] = &[
    Location::new("Thirumalai Nayakkar Mahal", 9.9149, 78.1240, "History", 60),
    Location::new("Gandhi Memorial Museum", 9.9293, 78.1388, "History", 45),
    Location::new("Vandiyur Mariamman Teppakulam", 9.9138, 78.1474, "History", 30),
];
