//! Core domain types: planning years, the horizon, ship categories, and fuels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One planning period (a calendar year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Year(pub u16);

impl Year {
    /// The calendar year as an integer.
    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Year {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Spreadsheet exports often write years as `2020.0`.
        let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
        trimmed
            .parse::<u16>()
            .map(Year)
            .map_err(|_| format!("`{s}` is not a valid year"))
    }
}

/// Inclusive, ordered range of planning years.
///
/// # Examples
///
/// ```
/// use fleet_transition::types::{Horizon, Year};
///
/// let horizon = Horizon::new(Year(2020), Year(2022));
/// assert_eq!(horizon.len(), 3);
/// assert_eq!(horizon.index_of(Year(2021)), Some(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    first: Year,
    last: Year,
}

impl Horizon {
    /// First year of the default planning horizon.
    pub const DEFAULT_FIRST: Year = Year(2020);
    /// Last year of the default planning horizon.
    pub const DEFAULT_LAST: Year = Year(2050);

    /// Creates a horizon covering `first..=last`.
    ///
    /// # Panics
    ///
    /// Panics if `first > last`.
    pub fn new(first: Year, last: Year) -> Self {
        assert!(first <= last, "horizon must satisfy first <= last");
        Self { first, last }
    }

    pub fn first(&self) -> Year {
        self.first
    }

    pub fn last(&self) -> Year {
        self.last
    }

    /// Number of years in the horizon.
    pub fn len(&self) -> usize {
        usize::from(self.last.0 - self.first.0) + 1
    }

    /// Always false; a horizon holds at least one year.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, year: Year) -> bool {
        self.first <= year && year <= self.last
    }

    /// Position of `year` within the horizon, if it lies inside.
    pub fn index_of(&self, year: Year) -> Option<usize> {
        self.contains(year)
            .then(|| usize::from(year.0 - self.first.0))
    }

    /// Years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = Year> + use<> {
        (self.first.0..=self.last.0).map(Year)
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FIRST, Self::DEFAULT_LAST)
    }
}

/// A fleet category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShipType {
    Container,
    Tanker,
    Bulk,
    GeneralCargo,
    Other,
}

impl ShipType {
    /// Every category, in the canonical reporting order.
    pub const ALL: [ShipType; 5] = [
        ShipType::Container,
        ShipType::Tanker,
        ShipType::Bulk,
        ShipType::GeneralCargo,
        ShipType::Other,
    ];

    /// One-letter code used in input tables and column names.
    pub fn code(self) -> &'static str {
        match self {
            ShipType::Container => "C",
            ShipType::Tanker => "T",
            ShipType::Bulk => "B",
            ShipType::GeneralCargo => "G",
            ShipType::Other => "O",
        }
    }
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Returned when a ship-type label matches no known category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ship type `{0}` (expected one of C, T, B, G, O)")]
pub struct UnknownShipType(pub String);

impl FromStr for ShipType {
    type Err = UnknownShipType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "container" => Ok(ShipType::Container),
            "t" | "tanker" => Ok(ShipType::Tanker),
            "b" | "bulk" => Ok(ShipType::Bulk),
            "g" | "general_cargo" | "general-cargo" | "generalcargo" => {
                Ok(ShipType::GeneralCargo)
            }
            "o" | "other" => Ok(ShipType::Other),
            _ => Err(UnknownShipType(s.to_string())),
        }
    }
}

/// A fuel identifier such as `HFO`, `MeOH` or `H2`.
///
/// The fuel set is scenario-local: it is whatever the scenario's fuel-cost
/// table lists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuelType(String);

impl FuelType {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FuelType {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
