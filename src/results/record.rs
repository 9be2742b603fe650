//! Per-year result tables and their totals.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{FuelType, ShipType, Year};

/// One named column of a [`ResultRecord`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Co2Emissions,
    TotalCost,
    InvestmentCost,
    OperationalCost,
    FuelCost,
    ExcessEmissions,
    EtsPenalty,
    TotalCostPerYear,
    NewShips(ShipType),
    StockShips(ShipType),
    FuelDemand(FuelType),
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Co2Emissions => f.write_str("CO2_Emissions"),
            Column::TotalCost => f.write_str("Total_Cost"),
            Column::InvestmentCost => f.write_str("Investment_Cost"),
            Column::OperationalCost => f.write_str("Operational_Cost"),
            Column::FuelCost => f.write_str("Fuel_Cost"),
            Column::ExcessEmissions => f.write_str("Excess_Emissions"),
            Column::EtsPenalty => f.write_str("ETS_Penalty"),
            Column::TotalCostPerYear => f.write_str("Total_Cost_Per_Year"),
            Column::NewShips(s) => write!(f, "New_Ships_{s}"),
            Column::StockShips(s) => write!(f, "Stock_Ships_{s}"),
            Column::FuelDemand(fuel) => write!(f, "Fuel_Demand_{fuel}"),
        }
    }
}

/// Cost, emission, fleet, and fuel figures for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearRow {
    pub year: Year,
    pub co2_emissions: f64,
    /// Scenario objective value, repeated on every row. This is not a
    /// per-year share; use `total_cost_per_year` for that.
    pub total_cost: f64,
    pub investment_cost: f64,
    pub operational_cost: f64,
    /// Fuel cost in reporting units (objective units times the variant's
    /// `fuel_cost_unit_scale`).
    pub fuel_cost: f64,
    pub excess_emissions: f64,
    pub ets_penalty: f64,
    /// Investment + operational + reported fuel cost + ETS penalty.
    pub total_cost_per_year: f64,
    pub new_ships: BTreeMap<ShipType, f64>,
    pub stock_ships: BTreeMap<ShipType, f64>,
    pub fuel_demand: BTreeMap<FuelType, f64>,
}

impl YearRow {
    /// An all-zero row with entries for the given ship types and fuels.
    pub fn zeroed(year: Year, ship_types: &[ShipType], fuel_types: &[FuelType]) -> Self {
        Self {
            year,
            co2_emissions: 0.0,
            total_cost: 0.0,
            investment_cost: 0.0,
            operational_cost: 0.0,
            fuel_cost: 0.0,
            excess_emissions: 0.0,
            ets_penalty: 0.0,
            total_cost_per_year: 0.0,
            new_ships: ship_types.iter().map(|&s| (s, 0.0)).collect(),
            stock_ships: ship_types.iter().map(|&s| (s, 0.0)).collect(),
            fuel_demand: fuel_types.iter().map(|f| (f.clone(), 0.0)).collect(),
        }
    }

    /// Fuel cost converted back to objective units.
    pub fn fuel_cost_in_objective_units(&self, fuel_cost_unit_scale: f64) -> f64 {
        if fuel_cost_unit_scale == 0.0 {
            0.0
        } else {
            self.fuel_cost / fuel_cost_unit_scale
        }
    }

    /// This year's contribution to the objective.
    pub fn objective_contribution(&self, fuel_cost_unit_scale: f64) -> f64 {
        self.investment_cost
            + self.operational_cost
            + self.fuel_cost_in_objective_units(fuel_cost_unit_scale)
            + self.ets_penalty
    }

    /// Value of `column` in this row, `None` for an entity the row lacks.
    pub fn value(&self, column: &Column) -> Option<f64> {
        match column {
            Column::Co2Emissions => Some(self.co2_emissions),
            Column::TotalCost => Some(self.total_cost),
            Column::InvestmentCost => Some(self.investment_cost),
            Column::OperationalCost => Some(self.operational_cost),
            Column::FuelCost => Some(self.fuel_cost),
            Column::ExcessEmissions => Some(self.excess_emissions),
            Column::EtsPenalty => Some(self.ets_penalty),
            Column::TotalCostPerYear => Some(self.total_cost_per_year),
            Column::NewShips(s) => self.new_ships.get(s).copied(),
            Column::StockShips(s) => self.stock_ships.get(s).copied(),
            Column::FuelDemand(f) => self.fuel_demand.get(f).copied(),
        }
    }
}

/// Extracted results of one scenario, one row per horizon year.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub scenario: String,
    pub ship_types: Vec<ShipType>,
    pub fuel_types: Vec<FuelType>,
    pub objective: f64,
    /// Multiplier applied to `YearRow::fuel_cost` relative to objective units.
    pub fuel_cost_unit_scale: f64,
    pub rows: Vec<YearRow>,
}

impl ResultRecord {
    pub fn years(&self) -> Vec<Year> {
        self.rows.iter().map(|r| r.year).collect()
    }

    /// All columns in export order.
    pub fn columns(&self) -> Vec<Column> {
        let mut cols = vec![
            Column::Co2Emissions,
            Column::TotalCost,
            Column::InvestmentCost,
            Column::OperationalCost,
            Column::FuelCost,
            Column::ExcessEmissions,
            Column::EtsPenalty,
            Column::TotalCostPerYear,
        ];
        cols.extend(self.ship_types.iter().map(|&s| Column::NewShips(s)));
        cols.extend(self.ship_types.iter().map(|&s| Column::StockShips(s)));
        cols.extend(self.fuel_types.iter().cloned().map(Column::FuelDemand));
        cols
    }

    pub fn has_column(&self, column: &Column) -> bool {
        match column {
            Column::NewShips(s) | Column::StockShips(s) => self.ship_types.contains(s),
            Column::FuelDemand(f) => self.fuel_types.contains(f),
            _ => true,
        }
    }

    /// Values of `column` for every year, or `None` if the scenario has no
    /// such ship type or fuel.
    pub fn column(&self, column: &Column) -> Option<Vec<f64>> {
        if !self.has_column(column) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|r| r.value(column).unwrap_or(0.0))
                .collect(),
        )
    }

    /// Sum of per-year objective contributions; equals the objective for an
    /// optimal solve.
    pub fn recomputed_objective(&self) -> f64 {
        self.rows
            .iter()
            .map(|r| r.objective_contribution(self.fuel_cost_unit_scale))
            .sum()
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary::from_record(self)
    }
}

/// Horizon totals of a [`ResultRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    pub scenario: String,
    pub objective: f64,
    pub investment_cost: f64,
    pub operational_cost: f64,
    /// Reporting units.
    pub fuel_cost: f64,
    pub ets_penalty: f64,
    pub cumulative_co2: f64,
    pub cumulative_excess: f64,
    /// Year with the highest emissions, if any row exists.
    pub peak_co2: Option<(Year, f64)>,
    pub ships_built: f64,
    /// Stock of all ship types in the last year.
    pub final_fleet: f64,
}

impl RecordSummary {
    pub fn from_record(record: &ResultRecord) -> Self {
        let mut s = Self {
            scenario: record.scenario.clone(),
            objective: record.objective,
            investment_cost: 0.0,
            operational_cost: 0.0,
            fuel_cost: 0.0,
            ets_penalty: 0.0,
            cumulative_co2: 0.0,
            cumulative_excess: 0.0,
            peak_co2: None,
            ships_built: 0.0,
            final_fleet: 0.0,
        };
        for r in &record.rows {
            s.investment_cost += r.investment_cost;
            s.operational_cost += r.operational_cost;
            s.fuel_cost += r.fuel_cost;
            s.ets_penalty += r.ets_penalty;
            s.cumulative_co2 += r.co2_emissions;
            s.cumulative_excess += r.excess_emissions;
            s.ships_built += r.new_ships.values().sum::<f64>();
            if s.peak_co2.is_none_or(|(_, peak)| r.co2_emissions > peak) {
                s.peak_co2 = Some((r.year, r.co2_emissions));
            }
        }
        s.final_fleet = record
            .rows
            .last()
            .map_or(0.0, |r| r.stock_ships.values().sum());
        s
    }
}

impl fmt::Display for RecordSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Scenario {} ---", self.scenario)?;
        writeln!(f, "Objective (total cost):  {:.2}", self.objective)?;
        writeln!(f, "Investment cost:         {:.2}", self.investment_cost)?;
        writeln!(f, "Operational cost:        {:.2}", self.operational_cost)?;
        writeln!(f, "Fuel cost (reported):    {:.2}", self.fuel_cost)?;
        writeln!(f, "ETS penalty:             {:.2}", self.ets_penalty)?;
        writeln!(f, "Cumulative CO2:          {:.3}", self.cumulative_co2)?;
        writeln!(f, "Cumulative excess CO2:   {:.3}", self.cumulative_excess)?;
        if let Some((year, peak)) = self.peak_co2 {
            writeln!(f, "Peak CO2:                {peak:.3} ({year})")?;
        }
        writeln!(f, "Ships built:             {:.0}", self.ships_built)?;
        write!(f, "Final fleet:             {:.0}", self.final_fleet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ResultRecord {
        let ships = [ShipType::Container, ShipType::Tanker];
        let fuels = [FuelType::new("HFO")];
        let mut rows = Vec::new();
        for (i, y) in [2020u16, 2021].into_iter().enumerate() {
            let mut r = YearRow::zeroed(Year(y), &ships, &fuels);
            r.co2_emissions = 10.0 - i as f64;
            r.investment_cost = 5.0;
            r.fuel_cost = 200.0;
            r.ets_penalty = 1.0;
            r.new_ships.insert(ShipType::Container, 1.0 + i as f64);
            r.stock_ships.insert(ShipType::Tanker, 4.0 + i as f64);
            rows.push(r);
        }
        ResultRecord {
            scenario: "base".into(),
            ship_types: ships.to_vec(),
            fuel_types: fuels.to_vec(),
            objective: 16.0,
            fuel_cost_unit_scale: 100.0,
            rows,
        }
    }

    #[test]
    fn column_names_match_export_header() {
        assert_eq!(Column::StockShips(ShipType::Bulk).to_string(), "Stock_Ships_B");
        assert_eq!(Column::FuelDemand(FuelType::new("H2")).to_string(), "Fuel_Demand_H2");
        assert_eq!(Column::EtsPenalty.to_string(), "ETS_Penalty");
    }

    #[test]
    fn columns_list_entities_after_scalars() {
        let cols = record().columns();
        assert_eq!(cols.len(), 8 + 2 + 2 + 1);
        assert_eq!(cols[8], Column::NewShips(ShipType::Container));
        assert_eq!(cols[12], Column::FuelDemand(FuelType::new("HFO")));
    }

    #[test]
    fn absent_entity_column_is_none() {
        let r = record();
        assert_eq!(r.column(&Column::FuelDemand(FuelType::new("H2"))), None);
        assert_eq!(r.column(&Column::StockShips(ShipType::Tanker)), Some(vec![4.0, 5.0]));
    }

    #[test]
    fn recomputed_objective_uses_objective_units() {
        // per year: 5 + 0 + 200/100 + 1 = 8
        assert!((record().recomputed_objective() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn summary_totals() {
        let s = record().summary();
        assert_eq!(s.investment_cost, 10.0);
        assert_eq!(s.cumulative_co2, 19.0);
        assert_eq!(s.peak_co2, Some((Year(2020), 10.0)));
        assert_eq!(s.ships_built, 3.0);
        assert_eq!(s.final_fleet, 5.0);
        let text = s.to_string();
        assert!(text.starts_with("--- Scenario base ---"));
        assert!(text.contains("Final fleet:             5"));
    }
}
