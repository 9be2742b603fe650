//! Typed parameter tables keyed by ship type, year, fuel, or combinations.

use std::collections::BTreeMap;
use std::fmt;

use super::TableName;
use crate::types::{FuelType, ShipType, Year};

/// A key shape a parameter table can be indexed by.
///
/// `COLUMNS` names the CSV columns holding the key, in the order
/// [`TableKey::parse_key`] expects them.
pub trait TableKey: Ord + Clone + fmt::Debug + Send + Sync {
    const COLUMNS: &'static [&'static str];

    /// Builds a key from the raw key fields of one CSV row.
    fn parse_key(fields: &[&str]) -> Result<Self, String>;

    /// Human-readable form used in warnings and error messages.
    fn label(&self) -> String;

    /// The year component of the key, if the shape has one.
    fn year(&self) -> Option<Year> {
        None
    }
}

fn field<'a>(fields: &[&'a str], i: usize) -> Result<&'a str, String> {
    fields
        .get(i)
        .copied()
        .ok_or_else(|| format!("missing key field #{i}"))
}

fn ship(fields: &[&str], i: usize) -> Result<ShipType, String> {
    field(fields, i)?.parse().map_err(|e| format!("{e}"))
}

fn year(fields: &[&str], i: usize) -> Result<Year, String> {
    field(fields, i)?.parse()
}

fn fuel(fields: &[&str], i: usize) -> Result<FuelType, String> {
    let id = field(fields, i)?.trim();
    if id.is_empty() {
        return Err("empty fuel_type".to_string());
    }
    Ok(FuelType::new(id))
}

impl TableKey for ShipType {
    const COLUMNS: &'static [&'static str] = &["ship_type"];

    fn parse_key(fields: &[&str]) -> Result<Self, String> {
        ship(fields, 0)
    }

    fn label(&self) -> String {
        self.to_string()
    }
}

impl TableKey for Year {
    const COLUMNS: &'static [&'static str] = &["year"];

    fn parse_key(fields: &[&str]) -> Result<Self, String> {
        year(fields, 0)
    }

    fn label(&self) -> String {
        self.to_string()
    }

    fn year(&self) -> Option<Year> {
        Some(*self)
    }
}

impl TableKey for FuelType {
    const COLUMNS: &'static [&'static str] = &["fuel_type"];

    fn parse_key(fields: &[&str]) -> Result<Self, String> {
        fuel(fields, 0)
    }

    fn label(&self) -> String {
        self.to_string()
    }
}

impl TableKey for (Year, ShipType) {
    const COLUMNS: &'static [&'static str] = &["year", "ship_type"];

    fn parse_key(fields: &[&str]) -> Result<Self, String> {
        Ok((year(fields, 0)?, ship(fields, 1)?))
    }

    fn label(&self) -> String {
        format!("{}/{}", self.0, self.1)
    }

    fn year(&self) -> Option<Year> {
        Some(self.0)
    }
}

impl TableKey for (ShipType, Year) {
    const COLUMNS: &'static [&'static str] = &["ship_type", "year"];

    fn parse_key(fields: &[&str]) -> Result<Self, String> {
        Ok((ship(fields, 0)?, year(fields, 1)?))
    }

    fn label(&self) -> String {
        format!("{}/{}", self.0, self.1)
    }

    fn year(&self) -> Option<Year> {
        Some(self.1)
    }
}

impl TableKey for (FuelType, Year) {
    const COLUMNS: &'static [&'static str] = &["fuel_type", "year"];

    fn parse_key(fields: &[&str]) -> Result<Self, String> {
        Ok((fuel(fields, 0)?, year(fields, 1)?))
    }

    fn label(&self) -> String {
        format!("{}/{}", self.0, self.1)
    }

    fn year(&self) -> Option<Year> {
        Some(self.1)
    }
}

impl TableKey for (ShipType, FuelType, Year) {
    const COLUMNS: &'static [&'static str] = &["ship_type", "fuel_type", "year"];

    fn parse_key(fields: &[&str]) -> Result<Self, String> {
        Ok((ship(fields, 0)?, fuel(fields, 1)?, year(fields, 2)?))
    }

    fn label(&self) -> String {
        format!("{}/{}/{}", self.0, self.1, self.2)
    }

    fn year(&self) -> Option<Year> {
        Some(self.2)
    }
}

/// A named mapping from key to numeric value.
///
/// Lookups distinguish an absent key (`get` returns `None`) from a stored
/// zero. The optimization model reads absent keys as zero through
/// [`Table::value_or_zero`]; coverage reporting uses [`Table::contains_key`].
#[derive(Debug, Clone, PartialEq)]
pub struct Table<K> {
    name: TableName,
    values: BTreeMap<K, f64>,
}

impl<K: Ord> Table<K> {
    pub fn new(name: TableName) -> Self {
        Self {
            name,
            values: BTreeMap::new(),
        }
    }

    /// Builds a table from `(key, value)` pairs; later pairs overwrite earlier ones.
    pub fn from_pairs(name: TableName, pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self {
            name,
            values: pairs.into_iter().collect(),
        }
    }

    pub fn name(&self) -> TableName {
        self.name
    }

    /// Stores `value` under `key`, returning the previous value if any.
    pub fn insert(&mut self, key: K, value: f64) -> Option<f64> {
        self.values.insert(key, value)
    }

    /// Builder-style [`Table::insert`].
    pub fn with(mut self, key: K, value: f64) -> Self {
        self.values.insert(key, value);
        self
    }

    pub fn get(&self, key: &K) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Value under `key`, or `0.0` when the key is absent.
    pub fn value_or_zero(&self, key: &K) -> f64 {
        self.get(key).unwrap_or(0.0)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }
}

/// Fuel prices, either one price per fuel or one per fuel and year.
#[derive(Debug, Clone, PartialEq)]
pub enum FuelCostTable {
    Flat(Table<FuelType>),
    ByYear(Table<(FuelType, Year)>),
}

impl FuelCostTable {
    /// An empty table of the requested shape.
    pub fn empty(by_year: bool) -> Self {
        if by_year {
            FuelCostTable::ByYear(Table::new(TableName::FuelCost))
        } else {
            FuelCostTable::Flat(Table::new(TableName::FuelCost))
        }
    }

    pub fn is_by_year(&self) -> bool {
        matches!(self, FuelCostTable::ByYear(_))
    }

    /// Price of `fuel` in `year`; flat tables ignore the year.
    pub fn get(&self, fuel: &FuelType, year: Year) -> Option<f64> {
        match self {
            FuelCostTable::Flat(t) => t.get(fuel),
            FuelCostTable::ByYear(t) => t.get(&(fuel.clone(), year)),
        }
    }

    pub fn value_or_zero(&self, fuel: &FuelType, year: Year) -> f64 {
        self.get(fuel, year).unwrap_or(0.0)
    }

    /// Fuels with at least one price, in ascending order.
    pub fn fuels(&self) -> Vec<FuelType> {
        let mut fuels: Vec<FuelType> = match self {
            FuelCostTable::Flat(t) => t.iter().map(|(f, _)| f.clone()).collect(),
            FuelCostTable::ByYear(t) => t.iter().map(|((f, _), _)| f.clone()).collect(),
        };
        fuels.dedup();
        fuels
    }
}
