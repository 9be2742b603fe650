//! Fleet-transition MILP formulation.

use thiserror::Error;
use tracing::{debug, info};

use super::problem::{Domain, LinearExpr, Problem, Sense, VarHandle, VarId};
use super::variant::ModelVariant;
use crate::params::ParameterSet;
use crate::types::{FuelType, ShipType, Year};

/// Parameters and variant disagree on structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error(
        "fuel-cost table shape does not match the model variant \
         (variant expects {} prices)",
        if *by_year { "per-year" } else { "flat" }
    )]
    FuelCostShape { by_year: bool },
}

/// Handles of every decision variable, laid out year-major.
struct Layout {
    n_ships: usize,
    n_fuels: usize,
    new_ships: Vec<VarHandle>,
    stock_ships: Vec<VarHandle>,
    fuel_demand: Vec<VarHandle>,
    co2: Vec<VarHandle>,
    excess: Vec<VarHandle>,
}

impl Layout {
    fn new_ship(&self, yi: usize, si: usize) -> VarHandle {
        self.new_ships[yi * self.n_ships + si]
    }

    fn stock(&self, yi: usize, si: usize) -> VarHandle {
        self.stock_ships[yi * self.n_ships + si]
    }

    fn fuel(&self, yi: usize, fi: usize) -> VarHandle {
        self.fuel_demand[yi * self.n_fuels + fi]
    }
}

/// Builds the fleet-transition optimisation problem for one scenario.
///
/// Decision variables per year `y`, ship type `s`, and fuel `f`:
/// `new_ships[y,s]` and `stock_ships[y,s]` (integer), `fuel_demand[y,f]`,
/// `co2_emissions[y]` and `excess_emissions[y]` (continuous), all
/// nonnegative. The objective minimises investment, operating, fuel, and
/// ETS cost over the horizon.
///
/// # Examples
///
/// ```
/// use fleet_transition::model::{FleetTransitionModel, ModelVariant};
/// use fleet_transition::params::ParameterSet;
/// use fleet_transition::types::{FuelType, Horizon, ShipType, Year};
///
/// let params = ParameterSet::new(
///     Horizon::new(Year(2020), Year(2021)),
///     vec![ShipType::Container],
///     vec![FuelType::new("HFO")],
///     true,
/// );
/// let problem = FleetTransitionModel::new(&params, ModelVariant::scenario_analysis())
///     .build()
///     .expect("shapes agree");
/// assert_eq!(problem.variables().len(), 2 * (2 + 1 + 2));
/// ```
pub struct FleetTransitionModel<'a> {
    params: &'a ParameterSet,
    variant: ModelVariant,
}

impl<'a> FleetTransitionModel<'a> {
    pub fn new(params: &'a ParameterSet, variant: ModelVariant) -> Self {
        Self { params, variant }
    }

    pub fn variant(&self) -> &ModelVariant {
        &self.variant
    }

    /// Emits variables, objective, and constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::FuelCostShape`] if the fuel-cost table is flat
    /// while the variant expects per-year prices, or vice versa.
    pub fn build(&self) -> Result<Problem, ModelError> {
        if self.params.fuel_cost.is_by_year() != self.variant.fuel_cost_by_year {
            return Err(ModelError::FuelCostShape {
                by_year: self.variant.fuel_cost_by_year,
            });
        }

        let mut problem = Problem::new();
        let layout = self.declare_variables(&mut problem);
        problem.set_objective(self.objective(&layout));

        self.demand_and_production(&mut problem, &layout);
        self.stock_balance(&mut problem, &layout);
        self.fuel_and_emissions(&mut problem, &layout);
        if self.variant.enforce_minimum_fleet {
            self.minimum_fleet(&mut problem, &layout);
        }

        info!(
            variables = problem.variables().len(),
            integers = problem.num_integer(),
            constraints = problem.constraints().len(),
            "built fleet transition model"
        );
        Ok(problem)
    }

    fn years(&self) -> Vec<Year> {
        self.params.horizon.years().collect()
    }

    fn ships(&self) -> &[ShipType] {
        &self.params.ship_types
    }

    fn fuels(&self) -> &[FuelType] {
        &self.params.fuel_types
    }

    fn declare_variables(&self, problem: &mut Problem) -> Layout {
        let mut layout = Layout {
            n_ships: self.ships().len(),
            n_fuels: self.fuels().len(),
            new_ships: Vec::new(),
            stock_ships: Vec::new(),
            fuel_demand: Vec::new(),
            co2: Vec::new(),
            excess: Vec::new(),
        };
        for y in self.years() {
            for &s in self.ships() {
                layout
                    .new_ships
                    .push(problem.add_variable(VarId::new_ships(y, s), Domain::Integer));
                layout
                    .stock_ships
                    .push(problem.add_variable(VarId::stock_ships(y, s), Domain::Integer));
            }
            for f in self.fuels() {
                layout.fuel_demand.push(
                    problem.add_variable(VarId::fuel_demand(y, f.clone()), Domain::Continuous),
                );
            }
            layout
                .co2
                .push(problem.add_variable(VarId::co2_emissions(y), Domain::Continuous));
            layout
                .excess
                .push(problem.add_variable(VarId::excess_emissions(y), Domain::Continuous));
        }
        layout
    }

    fn objective(&self, layout: &Layout) -> LinearExpr {
        let p = self.params;
        let mut obj = LinearExpr::new();
        for (yi, y) in self.years().into_iter().enumerate() {
            for (si, s) in self.ships().iter().enumerate() {
                obj.add(layout.new_ship(yi, si), p.investment_cost.value_or_zero(s));
                obj.add(layout.stock(yi, si), p.op_cost.value_or_zero(s));
            }
            for (fi, f) in self.fuels().iter().enumerate() {
                obj.add(layout.fuel(yi, fi), p.fuel_cost.value_or_zero(f, y));
            }
            obj.add(layout.excess[yi], p.ets_price.value_or_zero(&y));
        }
        obj
    }

    /// Demand coverage and shipyard production limits.
    fn demand_and_production(&self, problem: &mut Problem, layout: &Layout) {
        let p = self.params;
        for (yi, y) in self.years().into_iter().enumerate() {
            for (si, &s) in self.ships().iter().enumerate() {
                let mut coverage = LinearExpr::new();
                coverage.add(layout.stock(yi, si), p.cap.value_or_zero(&s));
                problem.add_constraint(
                    format!("demand_coverage[{y},{s}]"),
                    coverage,
                    Sense::Ge,
                    p.demand_shipping.value_or_zero(&(y, s)),
                );

                let mut built = LinearExpr::new();
                built.add(layout.new_ship(yi, si), 1.0);
                problem.add_constraint(
                    format!("production_limit[{y},{s}]"),
                    built,
                    Sense::Le,
                    p.prod_capacity.value_or_zero(&(y, s)),
                );
            }
        }
    }

    /// Initial fleet and year-on-year stock balance with vintage retirement.
    fn stock_balance(&self, problem: &mut Problem, layout: &Layout) {
        let p = self.params;
        let first = i64::from(p.horizon.first().value());
        for (yi, y) in self.years().into_iter().enumerate() {
            for (si, &s) in self.ships().iter().enumerate() {
                if yi == 0 {
                    let mut initial = LinearExpr::new();
                    initial.add(layout.stock(0, si), 1.0);
                    problem.add_constraint(
                        format!("initial_fleet[{s}]"),
                        initial,
                        Sense::Eq,
                        p.init_capacity_fleet.value_or_zero(&s),
                    );
                    continue;
                }

                // stock[y] - stock[y-1] - new[y] + retired[y] = 0
                let mut balance = LinearExpr::new();
                balance
                    .add(layout.stock(yi, si), 1.0)
                    .add(layout.stock(yi - 1, si), -1.0)
                    .add(layout.new_ship(yi, si), -1.0);
                let retirement = retirement(
                    first,
                    i64::from(y.value()),
                    p.lifetime.value_or_zero(&s),
                    p.fleet_age.value_or_zero(&s),
                );
                if retirement.window > 0 {
                    debug!(
                        year = %y,
                        ship = %s,
                        window = retirement.window,
                        cohort = retirement.cohort_year,
                        "retirement term"
                    );
                    let cohort = usize::try_from(retirement.cohort_year - first).unwrap_or(0);
                    balance.add(layout.new_ship(cohort, si), retirement.window as f64);
                }
                problem.add_constraint(format!("stock_balance[{y},{s}]"), balance, Sense::Eq, 0.0);
            }
        }
    }

    /// Fuel demand, availability, emissions accounting, and emission caps.
    fn fuel_and_emissions(&self, problem: &mut Problem, layout: &Layout) {
        let p = self.params;
        let v = &self.variant;
        for (yi, y) in self.years().into_iter().enumerate() {
            let mut emissions = LinearExpr::new();
            emissions.add(layout.co2[yi], 1.0);

            for (fi, f) in self.fuels().iter().enumerate() {
                let mut demand = LinearExpr::new();
                demand.add(layout.fuel(yi, fi), 1.0);
                for (si, &s) in self.ships().iter().enumerate() {
                    let per_ship = p.fuel_consumption.value_or_zero(&(s, f.clone(), y));
                    demand.add(layout.stock(yi, si), -per_ship * v.fuel_scale);
                }
                problem.add_constraint(format!("fuel_demand[{y},{f}]"), demand, Sense::Eq, 0.0);

                if v.enforce_fuel_availability {
                    let mut avail = LinearExpr::new();
                    avail.add(layout.fuel(yi, fi), 1.0);
                    problem.add_constraint(
                        format!("fuel_availability[{y},{f}]"),
                        avail,
                        Sense::Le,
                        p.fuel_avail.value_or_zero(&(f.clone(), y)),
                    );
                }

                let factor = p.emissions_factor.value_or_zero(f);
                emissions.add(layout.fuel(yi, fi), -factor * v.emissions_scale);
            }
            problem.add_constraint(format!("emissions[{y}]"), emissions, Sense::Eq, 0.0);

            let mut cap = LinearExpr::new();
            cap.add(layout.co2[yi], 1.0).add(layout.excess[yi], -1.0);
            problem.add_constraint(
                format!("emissions_cap[{y}]"),
                cap,
                Sense::Le,
                p.co2_cap.value_or_zero(&y),
            );

            // One row per ship type; the tightest one binds.
            for &s in self.ships() {
                let mut intensity = LinearExpr::new();
                intensity.add(layout.co2[yi], 1.0);
                problem.add_constraint(
                    format!("cii_cap[{y},{s}]"),
                    intensity,
                    Sense::Le,
                    p.cap.value_or_zero(&s) * p.cii_desired.value_or_zero(&(s, y)),
                );
            }
        }
    }

    fn minimum_fleet(&self, problem: &mut Problem, layout: &Layout) {
        let p = self.params;
        for (yi, y) in self.years().into_iter().enumerate() {
            for (si, &s) in self.ships().iter().enumerate() {
                let mut floor = LinearExpr::new();
                floor.add(layout.stock(yi, si), 1.0);
                problem.add_constraint(
                    format!("minimum_fleet[{y},{s}]"),
                    floor,
                    Sense::Ge,
                    p.minim_capacity_fleet.value_or_zero(&s),
                );
            }
        }
    }
}

/// Retirement term of one stock-balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retirement {
    /// Number of years in `max(first, y - lifetime + 1) .. y`.
    pub window: i64,
    /// The single new-build year whose count is retired `window` times.
    pub cohort_year: i64,
}

/// Computes the retirement term for year `y` (`y > first`).
///
/// The retired count is `window * new_ships[cohort_year]`: the same shifted
/// cohort repeated once per window step, not a sum over distinct vintages.
/// Lifetime and age are floored to whole years; the cohort is clamped to
/// `first..=y`.
pub fn retirement(first: i64, y: i64, lifetime: f64, fleet_age: f64) -> Retirement {
    let lifetime = lifetime.floor() as i64;
    let age = fleet_age.floor() as i64;
    // Float casts saturate; keep the year arithmetic saturating too.
    let shifted = y.saturating_sub(lifetime).saturating_add(1);
    let start = first.max(shifted);
    let window = (y - start).max(0);
    let cohort_year = first.max(shifted.saturating_sub(age)).min(y);
    Retirement {
        window,
        cohort_year,
    }
}
