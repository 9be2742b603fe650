//! Rebuilds per-year results from a solved variable assignment.

use thiserror::Error;
use tracing::debug;

use super::record::{ResultRecord, YearRow};
use crate::model::{Entity, ModelVariant, Problem, VarKind, VariableDef};
use crate::oracle::{SolveStatus, SolvedModel};
use crate::params::ParameterSet;

/// Failure to turn a solve outcome into a [`ResultRecord`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("model is not optimal (status: {0})")]
    NotOptimal(SolveStatus),
    #[error("malformed variable identity `{id}`: {reason}")]
    MalformedVariableIdentity { id: String, reason: String },
}

fn malformed(def: &VariableDef, reason: impl Into<String>) -> ExtractError {
    ExtractError::MalformedVariableIdentity {
        id: def.id.to_string(),
        reason: reason.into(),
    }
}

/// Groups solved variable values by year into cost, emission, fleet, and
/// fuel figures.
pub struct ResultExtractor<'a> {
    params: &'a ParameterSet,
    variant: &'a ModelVariant,
}

impl<'a> ResultExtractor<'a> {
    pub fn new(params: &'a ParameterSet, variant: &'a ModelVariant) -> Self {
        Self { params, variant }
    }

    /// Extracts the result table of `scenario`.
    ///
    /// Costs are recomputed from the parameters: investment and operating
    /// cost per ship, fuel cost times the variant's `fuel_cost_unit_scale`,
    /// and the ETS penalty on excess emissions. `total_cost` repeats the
    /// objective on every row.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::NotOptimal`] unless the solve is optimal, and
    /// [`ExtractError::MalformedVariableIdentity`] for a variable whose
    /// identity does not fit this scenario (wrong entity for its kind, year
    /// outside the horizon, unknown ship type or fuel, or a value count that
    /// does not match the variable count).
    pub fn extract(
        &self,
        scenario: &str,
        problem: &Problem,
        solved: &SolvedModel,
    ) -> Result<ResultRecord, ExtractError> {
        let solution = match (solved.status(), solved.solution()) {
            (SolveStatus::Optimal, Some(solution)) => solution,
            (status, _) => return Err(ExtractError::NotOptimal(status)),
        };
        let values = solution.values();
        if values.len() != problem.variables().len() {
            return Err(ExtractError::MalformedVariableIdentity {
                id: "*".to_string(),
                reason: format!(
                    "{} values for {} variables",
                    values.len(),
                    problem.variables().len()
                ),
            });
        }

        let p = self.params;
        let mut rows: Vec<YearRow> = p
            .horizon
            .years()
            .map(|y| YearRow::zeroed(y, &p.ship_types, &p.fuel_types))
            .collect();

        for (def, &value) in problem.variables().iter().zip(values) {
            let year = def.id.year;
            let yi = p
                .horizon
                .index_of(year)
                .ok_or_else(|| malformed(def, "year outside the planning horizon"))?;
            let row = &mut rows[yi];
            match (def.id.kind, &def.id.entity) {
                (VarKind::NewShips, Some(Entity::Ship(s))) => {
                    if !p.ship_types.contains(s) {
                        return Err(malformed(def, "ship type not modelled"));
                    }
                    row.new_ships.insert(*s, value);
                    row.investment_cost += value * p.investment_cost.value_or_zero(s);
                }
                (VarKind::StockShips, Some(Entity::Ship(s))) => {
                    if !p.ship_types.contains(s) {
                        return Err(malformed(def, "ship type not modelled"));
                    }
                    row.stock_ships.insert(*s, value);
                    row.operational_cost += value * p.op_cost.value_or_zero(s);
                }
                (VarKind::FuelDemand, Some(Entity::Fuel(f))) => {
                    if !p.fuel_types.contains(f) {
                        return Err(malformed(def, "fuel not in the scenario fuel set"));
                    }
                    row.fuel_demand.insert(f.clone(), value);
                    row.fuel_cost += value
                        * p.fuel_cost.value_or_zero(f, year)
                        * self.variant.fuel_cost_unit_scale;
                }
                (VarKind::Co2Emissions, None) => row.co2_emissions = value,
                (VarKind::ExcessEmissions, None) => row.excess_emissions = value,
                (kind, entity) => {
                    let reason = match entity {
                        Some(e) => format!("{kind} does not take an entity (got {e})"),
                        None => format!("{kind} requires an entity"),
                    };
                    return Err(malformed(def, reason));
                }
            }
        }

        for row in &mut rows {
            row.ets_penalty = row.excess_emissions * p.ets_price.value_or_zero(&row.year);
            row.total_cost_per_year =
                row.investment_cost + row.operational_cost + row.fuel_cost + row.ets_penalty;
            row.total_cost = solution.objective();
        }
        debug!(scenario, rows = rows.len(), "extracted results");

        Ok(ResultRecord {
            scenario: scenario.to_string(),
            ship_types: p.ship_types.clone(),
            fuel_types: p.fuel_types.clone(),
            objective: solution.objective(),
            fuel_cost_unit_scale: self.variant.fuel_cost_unit_scale,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Domain, VarId};
    use crate::oracle::Solution;
    use crate::types::{FuelType, Horizon, ShipType, Year};

    fn params() -> ParameterSet {
        ParameterSet::new(
            Horizon::new(Year(2020), Year(2021)),
            vec![ShipType::Container],
            vec![FuelType::new("HFO")],
            true,
        )
    }

    #[test]
    fn refuses_non_optimal_models() {
        let p = params();
        let variant = ModelVariant::scenario_analysis();
        let extractor = ResultExtractor::new(&p, &variant);
        let err = extractor
            .extract(
                "base",
                &Problem::new(),
                &SolvedModel::without_solution(SolveStatus::Unbounded),
            )
            .err();
        assert_eq!(err, Some(ExtractError::NotOptimal(SolveStatus::Unbounded)));
    }

    #[test]
    fn rejects_year_outside_horizon() {
        let p = params();
        let variant = ModelVariant::scenario_analysis();
        let mut problem = Problem::new();
        problem.add_variable(VarId::co2_emissions(Year(2035)), Domain::Continuous);
        let solved = SolvedModel::optimal(Solution::new(0.0, vec![1.0]));
        let err = ResultExtractor::new(&p, &variant)
            .extract("base", &problem, &solved)
            .err();
        assert!(matches!(
            err,
            Some(ExtractError::MalformedVariableIdentity { ref id, .. }) if id == "co2_emissions[2035]"
        ));
    }

    #[test]
    fn rejects_entity_on_scalar_kind() {
        let p = params();
        let variant = ModelVariant::scenario_analysis();
        let mut problem = Problem::new();
        problem.add_variable(
            VarId {
                kind: VarKind::Co2Emissions,
                year: Year(2020),
                entity: Some(Entity::Ship(ShipType::Container)),
            },
            Domain::Continuous,
        );
        let solved = SolvedModel::optimal(Solution::new(0.0, vec![1.0]));
        let err = ResultExtractor::new(&p, &variant)
            .extract("base", &problem, &solved)
            .err();
        assert!(matches!(err, Some(ExtractError::MalformedVariableIdentity { .. })));
    }

    #[test]
    fn rejects_unknown_fuel() {
        let p = params();
        let variant = ModelVariant::scenario_analysis();
        let mut problem = Problem::new();
        problem.add_variable(VarId::fuel_demand(Year(2020), FuelType::new("NH3")), Domain::Continuous);
        let solved = SolvedModel::optimal(Solution::new(0.0, vec![1.0]));
        let err = ResultExtractor::new(&p, &variant)
            .extract("base", &problem, &solved)
            .err();
        assert!(matches!(err, Some(ExtractError::MalformedVariableIdentity { .. })));
    }

    #[test]
    fn rejects_value_count_mismatch() {
        let p = params();
        let variant = ModelVariant::scenario_analysis();
        let mut problem = Problem::new();
        problem.add_variable(VarId::co2_emissions(Year(2020)), Domain::Continuous);
        let solved = SolvedModel::optimal(Solution::new(0.0, vec![]));
        assert!(
            ResultExtractor::new(&p, &variant)
                .extract("base", &problem, &solved)
                .is_err()
        );
    }

    #[test]
    fn fuel_cost_is_scaled_for_reporting() {
        let mut p = params();
        let hfo = FuelType::new("HFO");
        if let crate::params::FuelCostTable::ByYear(t) = &mut p.fuel_cost {
            t.insert((hfo.clone(), Year(2020)), 0.5);
        }
        let variant = ModelVariant::scenario_analysis();
        let mut problem = Problem::new();
        problem.add_variable(VarId::fuel_demand(Year(2020), hfo.clone()), Domain::Continuous);
        let solved = SolvedModel::optimal(Solution::new(2.0, vec![4.0]));
        let record = ResultExtractor::new(&p, &variant)
            .extract("base", &problem, &solved)
            .expect("extract");
        assert_eq!(record.rows[0].fuel_cost, 4.0 * 0.5 * 100.0);
        assert_eq!(record.rows[0].fuel_cost_in_objective_units(100.0), 2.0);
        assert_eq!(record.rows[1].total_cost, 2.0);
        assert_eq!(record.rows[1].fuel_demand.get(&hfo), Some(&0.0));
    }
}
