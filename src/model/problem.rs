//! Solver-agnostic mixed-integer linear program.
//!
//! A [`Problem`] holds named decision variables, a linear objective to
//! minimise, and named linear constraints. Oracles translate it into their
//! own representation; [`Problem::write_lp`] dumps it as CPLEX LP text.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::{self, Write};

use crate::types::{FuelType, ShipType, Year};

/// Family of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VarKind {
    NewShips,
    StockShips,
    FuelDemand,
    Co2Emissions,
    ExcessEmissions,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::NewShips => "new_ships",
            VarKind::StockShips => "stock_ships",
            VarKind::FuelDemand => "fuel_demand",
            VarKind::Co2Emissions => "co2_emissions",
            VarKind::ExcessEmissions => "excess_emissions",
        }
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second index of a decision variable, when it has one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Entity {
    Ship(ShipType),
    Fuel(FuelType),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Ship(s) => write!(f, "{s}"),
            Entity::Fuel(fuel) => write!(f, "{fuel}"),
        }
    }
}

/// Structured identity of a decision variable, e.g. `new_ships[2030,C]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId {
    pub kind: VarKind,
    pub year: Year,
    pub entity: Option<Entity>,
}

impl VarId {
    pub fn new_ships(year: Year, ship: ShipType) -> Self {
        Self {
            kind: VarKind::NewShips,
            year,
            entity: Some(Entity::Ship(ship)),
        }
    }

    pub fn stock_ships(year: Year, ship: ShipType) -> Self {
        Self {
            kind: VarKind::StockShips,
            year,
            entity: Some(Entity::Ship(ship)),
        }
    }

    pub fn fuel_demand(year: Year, fuel: FuelType) -> Self {
        Self {
            kind: VarKind::FuelDemand,
            year,
            entity: Some(Entity::Fuel(fuel)),
        }
    }

    pub fn co2_emissions(year: Year) -> Self {
        Self {
            kind: VarKind::Co2Emissions,
            year,
            entity: None,
        }
    }

    pub fn excess_emissions(year: Year) -> Self {
        Self {
            kind: VarKind::ExcessEmissions,
            year,
            entity: None,
        }
    }

    /// Identifier safe for LP files: `new_ships_2030_C`.
    pub fn lp_name(&self) -> String {
        match &self.entity {
            Some(e) => sanitize(&format!("{}_{}_{}", self.kind, self.year, e)),
            None => sanitize(&format!("{}_{}", self.kind, self.year)),
        }
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entity {
            Some(e) => write!(f, "{}[{},{}]", self.kind, self.year, e),
            None => write!(f, "{}[{}]", self.kind, self.year),
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Integrality of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Integer,
    Continuous,
}

/// Declared variable: identity, domain, and bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub id: VarId,
    pub domain: Domain,
    pub lower: f64,
    /// `f64::INFINITY` when unbounded above.
    pub upper: f64,
}

/// Position of a variable within its [`Problem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarHandle(usize);

impl VarHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Sum of coefficient-weighted variables.
///
/// Adding a term for a variable already present merges the coefficients, so
/// every variable appears at most once. Terms whose merged coefficient is
/// exactly zero are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<VarHandle, f64>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `coeff * var`.
    pub fn add(&mut self, var: VarHandle, coeff: f64) -> &mut Self {
        let merged = self.terms.get(&var).copied().unwrap_or(0.0) + coeff;
        if merged == 0.0 {
            self.terms.remove(&var);
        } else {
            self.terms.insert(var, merged);
        }
        self
    }

    pub fn coefficient(&self, var: VarHandle) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    /// Terms in variable order.
    pub fn terms(&self) -> impl Iterator<Item = (VarHandle, f64)> + '_ {
        self.terms.iter().map(|(v, c)| (*v, *c))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression for a full assignment indexed by handle.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
            .sum()
    }
}

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    fn lp_symbol(self) -> &'static str {
        match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        }
    }
}

/// Named linear constraint `expr (<=|>=|=) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// Whether `values` satisfy the constraint within `tolerance`.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tolerance,
            Sense::Ge => lhs >= self.rhs - tolerance,
            Sense::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// Minimisation MILP built by [`crate::model::FleetTransitionModel`].
#[derive(Debug, Clone, Default)]
pub struct Problem {
    variables: Vec<VariableDef>,
    index: HashMap<VarId, VarHandle>,
    objective: LinearExpr,
    constraints: Vec<Constraint>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a nonnegative variable.
    ///
    /// Declaring the same identity twice returns the existing handle.
    pub fn add_variable(&mut self, id: VarId, domain: Domain) -> VarHandle {
        if let Some(&handle) = self.index.get(&id) {
            return handle;
        }
        let handle = VarHandle(self.variables.len());
        self.index.insert(id.clone(), handle);
        self.variables.push(VariableDef {
            id,
            domain,
            lower: 0.0,
            upper: f64::INFINITY,
        });
        handle
    }

    pub fn handle(&self, id: &VarId) -> Option<VarHandle> {
        self.index.get(id).copied()
    }

    pub fn variable(&self, handle: VarHandle) -> Option<&VariableDef> {
        self.variables.get(handle.0)
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    /// Variables paired with their handles, in declaration order.
    pub fn handles(&self) -> impl Iterator<Item = (VarHandle, &VariableDef)> {
        self.variables
            .iter()
            .enumerate()
            .map(|(i, def)| (VarHandle(i), def))
    }

    pub fn num_integer(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.domain == Domain::Integer)
            .count()
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn add_constraint(&mut self, name: String, expr: LinearExpr, sense: Sense, rhs: f64) {
        self.constraints.push(Constraint {
            name,
            expr,
            sense,
            rhs,
        });
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Looks up a constraint by its exact name.
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Names of constraints violated by `values` beyond `tolerance`.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(values, tolerance))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Writes the problem in CPLEX LP format.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if writing fails.
    pub fn write_lp(&self, mut w: impl Write) -> io::Result<()> {
        let names: Vec<String> = self.variables.iter().map(|v| v.id.lp_name()).collect();
        writeln!(w, "\\ fleet transition model")?;
        writeln!(w, "Minimize")?;
        write!(w, " obj:")?;
        self.write_expr(&mut w, &self.objective, &names)?;
        writeln!(w)?;

        writeln!(w, "Subject To")?;
        for c in &self.constraints {
            write!(w, " {}:", sanitize(&c.name))?;
            self.write_expr(&mut w, &c.expr, &names)?;
            writeln!(w, " {} {}", c.sense.lp_symbol(), c.rhs)?;
        }

        let general: Vec<&str> = self
            .variables
            .iter()
            .zip(&names)
            .filter(|(v, _)| v.domain == Domain::Integer)
            .map(|(_, n)| n.as_str())
            .collect();
        if !general.is_empty() {
            writeln!(w, "General")?;
            for name in general {
                writeln!(w, " {name}")?;
            }
        }
        writeln!(w, "End")
    }

    fn write_expr(&self, w: &mut impl Write, expr: &LinearExpr, names: &[String]) -> io::Result<()> {
        if expr.is_empty() {
            // LP syntax needs at least one term.
            return match names.first() {
                Some(first) => write!(w, " 0 {first}"),
                None => Ok(()),
            };
        }
        for (i, (var, coeff)) in expr.terms().enumerate() {
            let name = &names[var.0];
            match (i, coeff < 0.0) {
                (0, false) => write!(w, " {coeff} {name}")?,
                (0, true) => write!(w, " -{} {name}", -coeff)?,
                (_, false) => write!(w, " + {coeff} {name}")?,
                (_, true) => write!(w, " - {} {name}", -coeff)?,
            }
        }
        Ok(())
    }
}
