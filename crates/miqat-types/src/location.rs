//! Geographic coordinates and the location registry.

use crate::error::MiqatError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Geographic position in decimal degrees (east and north positive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub lat: f64,
    pub lng: f64,
}

impl GeoCoordinate {
    /// Creates a validated coordinate.
    ///
    /// # Errors
    /// Returns `InvalidCoordinate` for non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, MiqatError> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        if valid {
            Ok(Self { lat, lng })
        } else {
            Err(MiqatError::InvalidCoordinate { lat, lng })
        }
    }

    /// Creates a coordinate without validation.
    pub const fn new_unchecked(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A named place prayer times are resolved for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Display name, unique within a registry.
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self { name: name.into(), lat, lng }
    }

    pub fn coords(&self) -> GeoCoordinate {
        GeoCoordinate::new_unchecked(self.lat, self.lng)
    }
}

/// Cities of the reference deployment (Pakistan, UTC+5).
const REFERENCE_CITIES: [(&str, f64, f64); 10] = [
    ("Karachi", 24.8607, 67.0011),
    ("Lahore", 31.5204, 74.3587),
    ("Faisalabad", 31.4167, 73.0833),
    ("Rawalpindi", 33.5651, 73.0169),
    ("Islamabad", 33.6844, 73.0479),
    ("Multan", 30.1575, 71.5249),
    ("Peshawar", 34.0151, 71.5249),
    ("Quetta", 30.1798, 66.9750),
    ("Hyderabad", 25.3960, 68.3578),
    ("Gujranwala", 32.1877, 74.1945),
];

/// Immutable, name-indexed set of locations.
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    locations: Vec<Location>,
    index: HashMap<String, usize>,
}

impl LocationRegistry {
    /// Builds a registry, rejecting duplicate names and invalid coordinates.
    pub fn new(locations: Vec<Location>) -> Result<Self, MiqatError> {
        let mut index = HashMap::with_capacity(locations.len());
        for (i, loc) in locations.iter().enumerate() {
            GeoCoordinate::new(loc.lat, loc.lng)?;
            if index.insert(loc.name.clone(), i).is_some() {
                return Err(MiqatError::invalid_config(format!(
                    "Duplicate location name {:?}",
                    loc.name
                )));
            }
        }
        Ok(Self { locations, index })
    }

    /// The ten-city reference registry.
    pub fn reference() -> Self {
        let locations: Vec<Location> = REFERENCE_CITIES
            .iter()
            .map(|(name, lat, lng)| Location::new(*name, *lat, *lng))
            .collect();
        let index = locations
            .iter()
            .enumerate()
            .map(|(i, loc)| (loc.name.clone(), i))
            .collect();
        Self { locations, index }
    }

    pub fn reference_locations() -> Vec<Location> {
        Self::reference().locations
    }

    /// Exact-name lookup.
    ///
    /// # Errors
    /// Returns `InvalidLocation` when the name is not registered.
    pub fn get(&self, name: &str) -> Result<&Location, MiqatError> {
        self.index
            .get(name)
            .map(|&i| &self.locations[i])
            .ok_or_else(|| MiqatError::invalid_location(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
