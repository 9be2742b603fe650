//! CSV ingestion of scenario parameter tables.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::{FuelCostTable, ParameterSet, Table, TableKey, TableName};
use crate::error::ScenarioError;
use crate::model::ModelVariant;
use crate::types::{FuelType, Horizon, ShipType, Year};

/// Failure while reading one parameter table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read `{path}`: {err}")]
    Io {
        path: String,
        #[source]
        err: io::Error,
    },
    #[error("malformed CSV in `{path}`: {err}")]
    Csv {
        path: String,
        #[source]
        err: csv::Error,
    },
    #[error("`{path}` has no `{column}` column")]
    MissingColumn { path: String, column: String },
    #[error("`{path}` line {line}: {message}")]
    InvalidKey {
        path: String,
        line: u64,
        message: String,
    },
    #[error("`{path}` line {line}: `{column}` value `{value}` is not a finite number")]
    InvalidValue {
        path: String,
        line: u64,
        column: String,
        value: String,
    },
    #[error("`{path}` line {line}: duplicate key {key}")]
    DuplicateKey {
        path: String,
        line: u64,
        key: String,
    },
}

fn column_index(headers: &csv::StringRecord, column: &str, path: &str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == column)
        .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(column)))
        .ok_or_else(|| LoadError::MissingColumn {
            path: path.to_string(),
            column: column.to_string(),
        })
}

/// Reads the `(key, value)` rows of one table in file order.
///
/// Key columns come from [`TableKey::COLUMNS`], the value column from
/// [`TableName::value_column`]. Extra columns are ignored.
///
/// # Arguments
///
/// * `name` - Which table is being read
/// * `reader` - CSV source with a header row
/// * `path` - Source label used in error messages
///
/// # Errors
///
/// Returns a [`LoadError`] for malformed CSV, missing columns, unparsable
/// keys, or non-finite values.
pub fn read_rows<K: TableKey>(
    name: TableName,
    reader: impl Read,
    path: &str,
) -> Result<Vec<(K, u64, f64)>, LoadError> {
    let csv_err = |err| LoadError::Csv {
        path: path.to_string(),
        err,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let key_idx = K::COLUMNS
        .iter()
        .map(|c| column_index(&headers, c, path))
        .collect::<Result<Vec<_>, _>>()?;
    let value_column = name.value_column();
    let value_idx = column_index(&headers, value_column, path)?;

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map_or(i as u64 + 2, |p| p.line());
        let fields: Vec<&str> = key_idx.iter().map(|&j| record.get(j).unwrap_or("")).collect();
        let key = K::parse_key(&fields).map_err(|message| LoadError::InvalidKey {
            path: path.to_string(),
            line,
            message,
        })?;
        let raw = record.get(value_idx).unwrap_or("");
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| LoadError::InvalidValue {
                path: path.to_string(),
                line,
                column: value_column.to_string(),
                value: raw.to_string(),
            })?;
        rows.push((key, line, value));
    }
    Ok(rows)
}

/// Builds a table from rows, dropping years outside `horizon`.
fn table_from_rows<K: TableKey>(
    name: TableName,
    rows: Vec<(K, u64, f64)>,
    horizon: &Horizon,
    path: &str,
) -> Result<Table<K>, LoadError> {
    let mut table = Table::new(name);
    let mut skipped = 0usize;
    for (key, line, value) in rows {
        if key.year().is_some_and(|y| !horizon.contains(y)) {
            skipped += 1;
            continue;
        }
        let label = key.label();
        if table.insert(key, value).is_some() {
            return Err(LoadError::DuplicateKey {
                path: path.to_string(),
                line,
                key: label,
            });
        }
    }
    if skipped > 0 {
        debug!(table = %name, skipped, "ignored rows outside the planning horizon");
    }
    Ok(table)
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| LoadError::Io {
            path: path.display().to_string(),
            err,
        })
}

/// Reads one parameter table from a CSV file.
///
/// # Errors
///
/// Returns a [`LoadError`] if the file cannot be opened or parsed, or if a
/// key appears twice within the horizon.
pub fn read_table<K: TableKey>(
    name: TableName,
    path: &Path,
    horizon: &Horizon,
) -> Result<Table<K>, LoadError> {
    let label = path.display().to_string();
    let rows = read_rows(name, open(path)?, &label)?;
    table_from_rows(name, rows, horizon, &label)
}

struct Sources<'a> {
    scenario: &'a str,
    files: &'a BTreeMap<TableName, PathBuf>,
    horizon: &'a Horizon,
    variant: &'a ModelVariant,
}

impl Sources<'_> {
    fn path(&self, table: TableName) -> Result<Option<&Path>, ScenarioError> {
        let Some(path) = self.files.get(&table) else {
            if table.is_required(self.variant) {
                return Err(ScenarioError::ConfigurationNotFound {
                    scenario: self.scenario.to_string(),
                    table,
                    detail: "no file configured".to_string(),
                });
            }
            return Ok(None);
        };
        if !path.is_file() {
            return Err(ScenarioError::ConfigurationNotFound {
                scenario: self.scenario.to_string(),
                table,
                detail: format!("`{}` does not exist", path.display()),
            });
        }
        Ok(Some(path))
    }

    fn table<K: TableKey>(&self, table: TableName) -> Result<Table<K>, ScenarioError> {
        match self.path(table)? {
            Some(path) => Ok(read_table(table, path, self.horizon)?),
            None => Ok(Table::new(table)),
        }
    }

    /// Fuel prices plus the fuel set in first-appearance order.
    fn fuel_cost(&self) -> Result<(FuelCostTable, Vec<FuelType>), ScenarioError> {
        let name = TableName::FuelCost;
        let Some(path) = self.path(name)? else {
            return Ok((FuelCostTable::empty(self.variant.fuel_cost_by_year), Vec::new()));
        };
        let label = path.display().to_string();
        let (table, fuels) = if self.variant.fuel_cost_by_year {
            let rows = read_rows::<(FuelType, Year)>(name, open(path)?, &label)?;
            let fuels = fuels_in_horizon(&rows, self.horizon, |(f, _)| f);
            let table = table_from_rows(name, rows, self.horizon, &label)?;
            (FuelCostTable::ByYear(table), fuels)
        } else {
            let rows = read_rows::<FuelType>(name, open(path)?, &label)?;
            let fuels = fuels_in_horizon(&rows, self.horizon, |f| f);
            let table = table_from_rows(name, rows, self.horizon, &label)?;
            (FuelCostTable::Flat(table), fuels)
        };
        Ok((table, fuels))
    }
}

/// Fuels priced within the horizon, in first-appearance order.
fn fuels_in_horizon<K: TableKey>(
    rows: &[(K, u64, f64)],
    horizon: &Horizon,
    fuel: impl Fn(&K) -> &FuelType,
) -> Vec<FuelType> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|(key, _, _)| key)
        .filter(|key| key.year().is_none_or(|y| horizon.contains(y)))
        .map(fuel)
        .filter(|f| seen.insert((*f).clone()))
        .cloned()
        .collect()
}

/// Loads every table a scenario needs.
///
/// # Arguments
///
/// * `scenario` - Scenario id, used in errors and logs
/// * `files` - Resolved path per table
/// * `horizon` - Planning years; rows outside are ignored
/// * `ship_types` - Fleet categories modelled
/// * `variant` - Decides which optional tables are required
///
/// # Errors
///
/// Returns [`ScenarioError::ConfigurationNotFound`] when a required table
/// has no configured file or a configured file is absent, and
/// [`ScenarioError::Load`] when a file cannot be parsed.
pub fn load_parameter_set(
    scenario: &str,
    files: &BTreeMap<TableName, PathBuf>,
    horizon: Horizon,
    ship_types: &[ShipType],
    variant: &ModelVariant,
) -> Result<ParameterSet, ScenarioError> {
    let src = Sources {
        scenario,
        files,
        horizon: &horizon,
        variant,
    };
    let (fuel_cost, fuel_types) = src.fuel_cost()?;
    let params = ParameterSet {
        horizon,
        ship_types: ship_types.to_vec(),
        fuel_types,
        init_capacity_fleet: src.table(TableName::InitCapacityFleet)?,
        minim_capacity_fleet: src.table(TableName::MinimCapacityFleet)?,
        fleet_age: src.table(TableName::FleetAge)?,
        lifetime: src.table(TableName::Lifetime)?,
        investment_cost: src.table(TableName::InvestmentCost)?,
        op_cost: src.table(TableName::OpCost)?,
        cap: src.table(TableName::Cap)?,
        demand_shipping: src.table(TableName::DemandShipping)?,
        prod_capacity: src.table(TableName::ProdCapacity)?,
        emissions_factor: src.table(TableName::EmissionsFactor)?,
        fuel_cost,
        fuel_avail: src.table(TableName::FuelAvail)?,
        fuel_consumption: src.table(TableName::FuelConsumption)?,
        cii_desired: src.table(TableName::CiiDesired)?,
        ets_price: src.table(TableName::EtsPrice)?,
        co2_cap: src.table(TableName::Co2Cap)?,
    };
    info!(
        scenario,
        fuels = params.fuel_types.len(),
        ship_types = params.ship_types.len(),
        "loaded parameter set"
    );
    Ok(params)
}
