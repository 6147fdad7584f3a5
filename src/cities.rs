//! City registry for the Algerian weather alert service.
//!
//! Defines the canonical list of monitored cities, grouped by region
//! (6 coastal, 6 near-coastal, 6 high plateaux, 6 Saharan). This is the
//! single source of truth for the national aggregation input set; a TOML
//! file can replace it at startup (see `config`), after which it never
//! changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::ConfigError;
use crate::model::City;

// ---------------------------------------------------------------------------
// Built-in registry
// ---------------------------------------------------------------------------

struct CitySeed {
    name: &'static str,
    lat: f64,
    lon: f64,
}

struct GroupSeed {
    label: &'static str,
    cities: &'static [CitySeed],
}

/// City selected when the caller does not name one.
pub const DEFAULT_CITY: &str = "Alger";

static BUILTIN_GROUPS: &[GroupSeed] = &[
    GroupSeed {
        label: "Littoral",
        cities: &[
            CitySeed { name: "Alger", lat: 36.7538, lon: 3.0588 },
            CitySeed { name: "Oran", lat: 35.6971, lon: -0.6308 },
            CitySeed { name: "Annaba", lat: 36.9, lon: 7.7667 },
            CitySeed { name: "Skikda", lat: 36.879, lon: 6.906 },
            CitySeed { name: "Mostaganem", lat: 35.931, lon: 0.089 },
            CitySeed { name: "Chlef", lat: 36.165, lon: 1.334 },
        ],
    },
    GroupSeed {
        label: "Proche littoral",
        cities: &[
            CitySeed { name: "Blida", lat: 36.47, lon: 2.83 },
            CitySeed { name: "Boumerdès", lat: 36.766, lon: 3.477 },
            CitySeed { name: "Tipaza", lat: 36.59, lon: 2.45 },
            CitySeed { name: "Tizi Ouzou", lat: 36.7167, lon: 4.05 },
            CitySeed { name: "Bouira", lat: 36.373, lon: 3.9 },
            CitySeed { name: "Médéa", lat: 36.264, lon: 2.763 },
        ],
    },
    GroupSeed {
        label: "Hauts Plateaux",
        cities: &[
            CitySeed { name: "Sétif", lat: 36.19, lon: 5.41 },
            CitySeed { name: "Bordj Bou Arréridj", lat: 36.07, lon: 4.76 },
            CitySeed { name: "M'Sila", lat: 35.705, lon: 4.541 },
            CitySeed { name: "Tiaret", lat: 35.37, lon: 1.32 },
            CitySeed { name: "Saïda", lat: 34.83, lon: 0.15 },
            CitySeed { name: "Tébessa", lat: 35.41, lon: 8.12 },
        ],
    },
    GroupSeed {
        label: "Sud",
        cities: &[
            CitySeed { name: "Ghardaïa", lat: 32.49, lon: 3.67 },
            CitySeed { name: "Ouargla", lat: 31.95, lon: 5.33 },
            CitySeed { name: "Biskra", lat: 34.85, lon: 5.73 },
            CitySeed { name: "Laghouat", lat: 33.8, lon: 2.87 },
            CitySeed { name: "Adrar", lat: 27.87, lon: -0.29 },
            CitySeed { name: "Tamanrasset", lat: 22.79, lon: 5.52 },
        ],
    },
];

// ---------------------------------------------------------------------------
// Registry types
// ---------------------------------------------------------------------------

/// A labelled group of cities, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityGroup {
    pub label: String,
    pub cities: Vec<City>,
}

/// Ordered collection of city groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityRegistry {
    pub groups: Vec<CityGroup>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    group: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    label: String,
    #[serde(default)]
    city: Vec<CityEntry>,
}

#[derive(Debug, Deserialize)]
struct CityEntry {
    name: String,
    lat: f64,
    lon: f64,
}

impl CityRegistry {
    /// The 24 built-in cities.
    pub fn builtin() -> Self {
        let groups = BUILTIN_GROUPS
            .iter()
            .map(|g| CityGroup {
                label: g.label.to_string(),
                cities: g
                    .cities
                    .iter()
                    .map(|c| City::new(c.name, c.lat, c.lon, g.label))
                    .collect(),
            })
            .collect();
        Self { groups }
    }

    /// Parses a registry from TOML:
    ///
    /// ```toml
    /// [[group]]
    /// label = "Littoral"
    /// [[group.city]]
    /// name = "Alger"
    /// lat = 36.7538
    /// lon = 3.0588
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = toml::from_str(contents)
            .map_err(|e| ConfigError::Registry(format!("malformed registry: {}", e)))?;

        let groups: Vec<CityGroup> = file
            .group
            .into_iter()
            .map(|g| {
                let cities = g
                    .city
                    .into_iter()
                    .map(|c| City::new(c.name, c.lat, c.lon, g.label.as_str()))
                    .collect();
                CityGroup { label: g.label, cities }
            })
            .collect();

        let registry = Self { groups };
        registry.validate()?;
        Ok(registry)
    }

    /// Loads a registry file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::Registry("registry contains no cities".to_string()));
        }
        for city in self.cities() {
            if city.name.trim().is_empty() {
                return Err(ConfigError::Registry(format!(
                    "city in group '{}' has an empty name",
                    city.group
                )));
            }
            if !(-90.0..=90.0).contains(&city.lat) || !(-180.0..=180.0).contains(&city.lon) {
                return Err(ConfigError::Registry(format!(
                    "{} has out-of-range coordinates ({}, {})",
                    city.name, city.lat, city.lon
                )));
            }
        }
        Ok(())
    }

    /// All cities in registry order, each tagged with its group label.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.groups.iter().flat_map(|g| g.cities.iter())
    }

    /// Flattened owned copy of `cities()`, suitable for the aggregator.
    pub fn all_cities(&self) -> Vec<City> {
        self.cities().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.cities.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Case-insensitive lookup by name. Returns the first match.
    pub fn find(&self, name: &str) -> Option<&City> {
        let wanted = name.trim().to_lowercase();
        self.cities().find(|c| c.name.to_lowercase() == wanted)
    }

    /// `DEFAULT_CITY` if present, otherwise the first registered city.
    pub fn default_city(&self) -> Option<&City> {
        self.find(DEFAULT_CITY).or_else(|| self.cities().next())
    }
}

impl Default for CityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
