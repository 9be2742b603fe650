//! Scenario input parameters: typed tables, key coverage, and validation.

pub mod load;
pub mod table;

use std::fmt;

use tracing::warn;

pub use load::{LoadError, load_parameter_set, read_rows, read_table};
pub use table::{FuelCostTable, Table, TableKey};

use crate::error::ScenarioError;
use crate::model::ModelVariant;
use crate::types::{FuelType, Horizon, ShipType, Year};

/// Identifies one input table, both in configuration and in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableName {
    InitCapacityFleet,
    MinimCapacityFleet,
    FleetAge,
    DemandShipping,
    InvestmentCost,
    OpCost,
    EmissionsFactor,
    ProdCapacity,
    Lifetime,
    Cap,
    CiiDesired,
    FuelCost,
    EtsPrice,
    Co2Cap,
    FuelAvail,
    FuelConsumption,
}

impl TableName {
    pub const ALL: [TableName; 16] = [
        TableName::InitCapacityFleet,
        TableName::MinimCapacityFleet,
        TableName::FleetAge,
        TableName::DemandShipping,
        TableName::InvestmentCost,
        TableName::OpCost,
        TableName::EmissionsFactor,
        TableName::ProdCapacity,
        TableName::Lifetime,
        TableName::Cap,
        TableName::CiiDesired,
        TableName::FuelCost,
        TableName::EtsPrice,
        TableName::Co2Cap,
        TableName::FuelAvail,
        TableName::FuelConsumption,
    ];

    /// Key used for this table in scenario configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            TableName::InitCapacityFleet => "init_capacity_fleet",
            TableName::MinimCapacityFleet => "minim_capacity_fleet",
            TableName::FleetAge => "fleet_age",
            TableName::DemandShipping => "demand_shipping",
            TableName::InvestmentCost => "investment_cost",
            TableName::OpCost => "op_cost",
            TableName::EmissionsFactor => "emissions_factor",
            TableName::ProdCapacity => "prod_capacity",
            TableName::Lifetime => "lifetime",
            TableName::Cap => "cap",
            TableName::CiiDesired => "CII_desired",
            TableName::FuelCost => "fuel_cost",
            TableName::EtsPrice => "ets_price",
            TableName::Co2Cap => "co2_cap",
            TableName::FuelAvail => "fuel_avail",
            TableName::FuelConsumption => "fuel_consumption",
        }
    }

    /// CSV column holding the table's values.
    pub fn value_column(self) -> &'static str {
        match self {
            TableName::InitCapacityFleet | TableName::ProdCapacity | TableName::Cap => "capacity",
            TableName::MinimCapacityFleet => "limit",
            TableName::FleetAge => "avr_age",
            TableName::DemandShipping => "demand",
            TableName::InvestmentCost | TableName::OpCost | TableName::FuelCost => "cost",
            TableName::EmissionsFactor => "factor",
            TableName::Lifetime => "years",
            TableName::CiiDesired => "CII",
            TableName::EtsPrice => "price",
            TableName::Co2Cap => "cap",
            TableName::FuelAvail => "availability",
            TableName::FuelConsumption => "consumption",
        }
    }

    /// Whether a scenario must supply this table under `variant`.
    pub fn is_required(self, variant: &ModelVariant) -> bool {
        match self {
            TableName::FuelAvail => variant.enforce_fuel_availability,
            TableName::MinimCapacityFleet => variant.enforce_minimum_fleet,
            _ => true,
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All numeric inputs of one scenario.
///
/// Built once per scenario (by [`load_parameter_set`] or programmatically
/// with [`ParameterSet::new`] plus table inserts) and only read afterwards.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    pub horizon: Horizon,
    pub ship_types: Vec<ShipType>,
    /// Scenario-local fuel set, in first-appearance order of the fuel-cost table.
    pub fuel_types: Vec<FuelType>,
    pub init_capacity_fleet: Table<ShipType>,
    pub minim_capacity_fleet: Table<ShipType>,
    /// Average fleet age in years; fractional ages are floored by the model.
    pub fleet_age: Table<ShipType>,
    pub lifetime: Table<ShipType>,
    pub investment_cost: Table<ShipType>,
    pub op_cost: Table<ShipType>,
    /// Transport capacity per ship.
    pub cap: Table<ShipType>,
    pub demand_shipping: Table<(Year, ShipType)>,
    pub prod_capacity: Table<(Year, ShipType)>,
    pub emissions_factor: Table<FuelType>,
    pub fuel_cost: FuelCostTable,
    pub fuel_avail: Table<(FuelType, Year)>,
    pub fuel_consumption: Table<(ShipType, FuelType, Year)>,
    pub cii_desired: Table<(ShipType, Year)>,
    pub ets_price: Table<Year>,
    pub co2_cap: Table<Year>,
}

impl ParameterSet {
    /// Creates a parameter set with empty tables.
    ///
    /// # Arguments
    ///
    /// * `horizon` - Planning years
    /// * `ship_types` - Fleet categories modelled
    /// * `fuel_types` - Scenario fuel set
    /// * `fuel_cost_by_year` - Shape of the fuel-cost table
    pub fn new(
        horizon: Horizon,
        ship_types: Vec<ShipType>,
        fuel_types: Vec<FuelType>,
        fuel_cost_by_year: bool,
    ) -> Self {
        Self {
            horizon,
            ship_types,
            fuel_types,
            init_capacity_fleet: Table::new(TableName::InitCapacityFleet),
            minim_capacity_fleet: Table::new(TableName::MinimCapacityFleet),
            fleet_age: Table::new(TableName::FleetAge),
            lifetime: Table::new(TableName::Lifetime),
            investment_cost: Table::new(TableName::InvestmentCost),
            op_cost: Table::new(TableName::OpCost),
            cap: Table::new(TableName::Cap),
            demand_shipping: Table::new(TableName::DemandShipping),
            prod_capacity: Table::new(TableName::ProdCapacity),
            emissions_factor: Table::new(TableName::EmissionsFactor),
            fuel_cost: FuelCostTable::empty(fuel_cost_by_year),
            fuel_avail: Table::new(TableName::FuelAvail),
            fuel_consumption: Table::new(TableName::FuelConsumption),
            cii_desired: Table::new(TableName::CiiDesired),
            ets_price: Table::new(TableName::EtsPrice),
            co2_cap: Table::new(TableName::Co2Cap),
        }
    }

    /// Lists every key the model will look up under `variant` that is absent
    /// from its table.
    pub fn coverage(&self, variant: &ModelVariant) -> CoverageReport {
        let years: Vec<Year> = self.horizon.years().collect();
        let mut report = CoverageReport::default();

        let per_ship = [
            &self.init_capacity_fleet,
            &self.fleet_age,
            &self.lifetime,
            &self.investment_cost,
            &self.op_cost,
            &self.cap,
        ];
        for table in per_ship {
            report.check(table, self.ship_types.iter().copied());
        }
        if variant.enforce_minimum_fleet {
            report.check(&self.minim_capacity_fleet, self.ship_types.iter().copied());
        }

        let year_ship: Vec<(Year, ShipType)> = years
            .iter()
            .flat_map(|&y| self.ship_types.iter().map(move |&s| (y, s)))
            .collect();
        report.check(&self.demand_shipping, year_ship.iter().copied());
        report.check(&self.prod_capacity, year_ship.iter().copied());
        report.check(&self.cii_desired, year_ship.iter().map(|&(y, s)| (s, y)));

        report.check(&self.emissions_factor, self.fuel_types.iter().cloned());
        let fuel_year: Vec<(FuelType, Year)> = self
            .fuel_types
            .iter()
            .flat_map(|f| years.iter().map(move |&y| (f.clone(), y)))
            .collect();
        match &self.fuel_cost {
            FuelCostTable::Flat(t) => report.check(t, self.fuel_types.iter().cloned()),
            FuelCostTable::ByYear(t) => report.check(t, fuel_year.iter().cloned()),
        }
        if variant.enforce_fuel_availability {
            report.check(&self.fuel_avail, fuel_year.iter().cloned());
        }
        report.check(
            &self.fuel_consumption,
            year_ship.iter().flat_map(|&(y, s)| {
                self.fuel_types.iter().map(move |f| (s, f.clone(), y))
            }),
        );

        report.check(&self.ets_price, years.iter().copied());
        report.check(&self.co2_cap, years.iter().copied());
        report
    }

    /// Rejects values the model cannot interpret.
    ///
    /// Every value must be finite. Fleet sizes, ages, lifetimes, capacities,
    /// demand, and production limits must also be nonnegative.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::InvalidParameter`] for the first offending entry.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        check_values(&self.init_capacity_fleet, true)?;
        check_values(&self.minim_capacity_fleet, true)?;
        check_values(&self.fleet_age, true)?;
        check_values(&self.lifetime, true)?;
        check_values(&self.cap, true)?;
        check_values(&self.demand_shipping, true)?;
        check_values(&self.prod_capacity, true)?;
        check_values(&self.investment_cost, false)?;
        check_values(&self.op_cost, false)?;
        check_values(&self.emissions_factor, false)?;
        match &self.fuel_cost {
            FuelCostTable::Flat(t) => check_values(t, false)?,
            FuelCostTable::ByYear(t) => check_values(t, false)?,
        }
        check_values(&self.fuel_avail, false)?;
        check_values(&self.fuel_consumption, false)?;
        check_values(&self.cii_desired, false)?;
        check_values(&self.ets_price, false)?;
        check_values(&self.co2_cap, false)?;
        Ok(())
    }
}

fn check_values<K: TableKey>(table: &Table<K>, nonnegative: bool) -> Result<(), ScenarioError> {
    for (key, value) in table.iter() {
        let message = if !value.is_finite() {
            "value is not finite"
        } else if nonnegative && value < 0.0 {
            "value must be nonnegative"
        } else {
            continue;
        };
        return Err(ScenarioError::InvalidParameter {
            table: table.name(),
            key: key.label(),
            message: format!("{message} (got {value})"),
        });
    }
    Ok(())
}

/// Absent keys of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKeys {
    pub table: TableName,
    pub keys: Vec<String>,
}

/// Result of [`ParameterSet::coverage`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    pub missing: Vec<MissingKeys>,
}

impl CoverageReport {
    /// Number of keys shown per table in log lines and `Display` output.
    const PREVIEW: usize = 5;

    fn check<K: TableKey>(&mut self, table: &Table<K>, expected: impl IntoIterator<Item = K>) {
        let keys: Vec<String> = expected
            .into_iter()
            .filter(|k| !table.contains_key(k))
            .map(|k| k.label())
            .collect();
        if !keys.is_empty() {
            self.missing.push(MissingKeys {
                table: table.name(),
                keys,
            });
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn total_missing(&self) -> usize {
        self.missing.iter().map(|m| m.keys.len()).sum()
    }

    /// Emits one warning per incomplete table.
    pub fn log_warnings(&self, scenario: &str) {
        for m in &self.missing {
            warn!(
                scenario,
                table = %m.table,
                missing = m.keys.len(),
                first = %preview(&m.keys),
                "absent parameter keys default to zero"
            );
        }
    }
}

fn preview(keys: &[String]) -> String {
    let shown = keys
        .iter()
        .take(CoverageReport::PREVIEW)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if keys.len() > CoverageReport::PREVIEW {
        format!("{shown}, ...")
    } else {
        shown
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, m) in self.missing.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {} missing ({})", m.table, m.keys.len(), preview(&m.keys))?;
        }
        Ok(())
    }
}
