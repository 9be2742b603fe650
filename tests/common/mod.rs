//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use fleet_transition::model::ModelVariant;
use fleet_transition::params::{FuelCostTable, ParameterSet};
use fleet_transition::results::{ResultRecord, YearRow};
use fleet_transition::types::{FuelType, Horizon, ShipType, Year};

pub const SHIPS: [ShipType; 2] = [ShipType::Container, ShipType::Tanker];

pub fn hfo() -> FuelType {
    FuelType::new("HFO")
}

pub fn h2() -> FuelType {
    FuelType::new("H2")
}

/// Three-year horizon, 2020 to 2022.
pub fn short_horizon() -> Horizon {
    Horizon::new(Year(2020), Year(2022))
}

/// Small, fully covered parameter set over [`short_horizon`].
///
/// Containers (4 ships) and tankers (3 ships) burn heavy fuel oil; hydrogen
/// is priced but unused. Demand grows by one ship per type over the horizon.
pub fn small_params() -> ParameterSet {
    let horizon = short_horizon();
    let mut p = ParameterSet::new(horizon, SHIPS.to_vec(), vec![hfo(), h2()], true);
    let years: Vec<Year> = horizon.years().collect();

    for (s, init, inv, op, consumption) in [
        (ShipType::Container, 4.0, 50.0, 2.0, 100.0),
        (ShipType::Tanker, 3.0, 40.0, 1.5, 80.0),
    ] {
        p.init_capacity_fleet.insert(s, init);
        p.minim_capacity_fleet.insert(s, 1.0);
        p.fleet_age.insert(s, 5.0);
        p.lifetime.insert(s, 20.0);
        p.investment_cost.insert(s, inv);
        p.op_cost.insert(s, op);
        p.cap.insert(s, 1.0);
        for (i, &y) in years.iter().enumerate() {
            let growth = if i == 0 { 0.0 } else { 1.0 };
            p.demand_shipping.insert((y, s), init + growth);
            p.prod_capacity.insert((y, s), 3.0);
            p.cii_desired.insert((s, y), 1000.0);
            p.fuel_consumption.insert((s, hfo(), y), consumption);
            p.fuel_consumption.insert((s, h2(), y), 0.0);
        }
    }

    p.emissions_factor.insert(hfo(), 3114.0);
    p.emissions_factor.insert(h2(), 0.0);
    for &y in &years {
        if let FuelCostTable::ByYear(t) = &mut p.fuel_cost {
            t.insert((hfo(), y), 0.5);
            t.insert((h2(), y), 1.5);
        }
        p.fuel_avail.insert((hfo(), y), 1000.0);
        p.fuel_avail.insert((h2(), y), 1000.0);
        p.ets_price.insert(y, 0.1);
        p.co2_cap.insert(y, 100.0);
    }
    p
}

/// [`small_params`] with every demand and initial fleet set to zero.
pub fn zero_demand_params() -> ParameterSet {
    let mut p = small_params();
    for s in SHIPS {
        p.init_capacity_fleet.insert(s, 0.0);
        for y in short_horizon().years() {
            p.demand_shipping.insert((y, s), 0.0);
        }
    }
    p
}

pub fn variant() -> ModelVariant {
    ModelVariant::scenario_analysis()
}

/// Result record with one row per year and the given fuel demand columns.
///
/// Cost and fleet columns are fixed; `fuel_demand` maps fuel to its yearly
/// values.
pub fn record_with_fuels(id: &str, fuel_demand: &[(FuelType, [f64; 3])]) -> ResultRecord {
    let fuels: Vec<FuelType> = fuel_demand.iter().map(|(f, _)| f.clone()).collect();
    let rows = short_horizon()
        .years()
        .enumerate()
        .map(|(i, y)| {
            let mut row = YearRow::zeroed(y, &SHIPS, &fuels);
            row.co2_emissions = 40.0 + i as f64;
            row.total_cost = 500.0;
            row.investment_cost = 100.0;
            row.operational_cost = 10.0 + i as f64;
            row.fuel_cost = 30.0;
            row.excess_emissions = 2.0;
            row.ets_penalty = 0.2;
            row.total_cost_per_year = 140.2 + i as f64;
            row.new_ships.insert(ShipType::Container, 1.0);
            row.stock_ships.insert(ShipType::Container, 5.0 + i as f64);
            row.stock_ships.insert(ShipType::Tanker, 3.0);
            for (f, values) in fuel_demand {
                row.fuel_demand.insert(f.clone(), values[i]);
            }
            row
        })
        .collect();
    ResultRecord {
        scenario: id.to_string(),
        ship_types: SHIPS.to_vec(),
        fuel_types: fuels,
        objective: 500.0,
        fuel_cost_unit_scale: 1.0,
        rows,
    }
}

pub fn records(list: Vec<ResultRecord>) -> BTreeMap<String, ResultRecord> {
    list.into_iter().map(|r| (r.scenario.clone(), r)).collect()
}

/// Path of a file under the crate's `scenarios/` directory.
pub fn scenario_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(relative)
}
