//! Pure-Rust oracle: simplex with branch and bound.

use std::panic::{self, AssertUnwindSafe};

use ::microlp::{ComparisonOp, OptimizationDirection, Variable};
use tracing::debug;

use super::{Oracle, OracleError, Solution, SolveStatus, SolvedModel};
use crate::model::{Domain, Problem, Sense};

/// Feasibility slack for rows with no variables.
const EMPTY_ROW_TOLERANCE: f64 = 1e-9;

/// Solves with the `microlp` crate.
///
/// Integer variables are rounded to the nearest integer before values are
/// returned, and the objective is recomputed from the returned values so the
/// two always agree.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrolpOracle;

fn bound_i32(value: f64) -> i32 {
    if value >= f64::from(i32::MAX) {
        i32::MAX
    } else if value <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        value.round() as i32
    }
}

impl Oracle for MicrolpOracle {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, problem: &Problem) -> Result<SolvedModel, OracleError> {
        let mut lp = ::microlp::Problem::new(OptimizationDirection::Minimize);
        let objective = problem.objective();
        let columns: Vec<Variable> = problem
            .handles()
            .map(|(handle, def)| {
                let cost = objective.coefficient(handle);
                match def.domain {
                    Domain::Integer => {
                        lp.add_integer_var(cost, (bound_i32(def.lower), bound_i32(def.upper)))
                    }
                    Domain::Continuous => lp.add_var(cost, (def.lower, def.upper)),
                }
            })
            .collect();

        for c in problem.constraints() {
            if c.expr.is_empty() {
                if !c.is_satisfied(&[], EMPTY_ROW_TOLERANCE) {
                    debug!(constraint = %c.name, rhs = c.rhs, "row without variables is violated");
                    return Ok(SolvedModel::without_solution(SolveStatus::Infeasible));
                }
                continue;
            }
            let op = match c.sense {
                Sense::Le => ComparisonOp::Le,
                Sense::Ge => ComparisonOp::Ge,
                Sense::Eq => ComparisonOp::Eq,
            };
            let terms: Vec<(Variable, f64)> = c
                .expr
                .terms()
                .map(|(var, coeff)| (columns[var.index()], coeff))
                .collect();
            lp.add_constraint(&terms, op, c.rhs);
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| lp.solve())).map_err(|_| {
            OracleError {
                backend: self.name(),
                message: "solver panicked".to_string(),
            }
        })?;

        match outcome {
            Ok(solution) => {
                let values: Vec<f64> = problem
                    .variables()
                    .iter()
                    .zip(&columns)
                    .map(|(def, &col)| {
                        let raw = solution[col];
                        match def.domain {
                            Domain::Integer => raw.round(),
                            Domain::Continuous => raw.max(def.lower),
                        }
                    })
                    .collect();
                let objective = problem.objective().evaluate(&values);
                debug!(objective, reported = solution.objective(), "microlp solve finished");
                Ok(SolvedModel::optimal(Solution::new(objective, values)))
            }
            Err(::microlp::Error::Infeasible) => {
                Ok(SolvedModel::without_solution(SolveStatus::Infeasible))
            }
            Err(::microlp::Error::Unbounded) => {
                Ok(SolvedModel::without_solution(SolveStatus::Unbounded))
            }
            Err(::microlp::Error::InternalError(message)) => Err(OracleError {
                backend: self.name(),
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinearExpr, VarId};
    use crate::types::{ShipType, Year};

    fn two_var_problem() -> (Problem, Vec<crate::model::VarHandle>) {
        let mut p = Problem::new();
        let x = p.add_variable(VarId::stock_ships(Year(2020), ShipType::Container), Domain::Integer);
        let y = p.add_variable(VarId::co2_emissions(Year(2020)), Domain::Continuous);
        let mut obj = LinearExpr::new();
        obj.add(x, 3.0).add(y, 1.0);
        p.set_objective(obj);
        (p, vec![x, y])
    }

    #[test]
    fn solves_small_integer_program() {
        let (mut p, vars) = two_var_problem();
        let mut row = LinearExpr::new();
        row.add(vars[0], 2.0);
        p.add_constraint("cover".into(), row, Sense::Ge, 5.0);
        let mut link = LinearExpr::new();
        link.add(vars[1], 1.0).add(vars[0], -0.5);
        p.add_constraint("link".into(), link, Sense::Eq, 0.0);

        let solved = MicrolpOracle.solve(&p).expect("solver should run");
        assert_eq!(solved.status(), SolveStatus::Optimal);
        let sol = solved.solution().expect("solution");
        assert_eq!(sol.value(vars[0]), Some(3.0));
        assert!((sol.value(vars[1]).unwrap_or(f64::NAN) - 1.5).abs() < 1e-6);
        assert!((sol.objective() - 10.5).abs() < 1e-6);
    }

    #[test]
    fn reports_infeasible_without_values() {
        let (mut p, vars) = two_var_problem();
        let mut row = LinearExpr::new();
        row.add(vars[0], 1.0);
        p.add_constraint("low".into(), row.clone(), Sense::Le, 1.0);
        p.add_constraint("high".into(), row, Sense::Ge, 2.0);
        let solved = MicrolpOracle.solve(&p).expect("solver should run");
        assert_eq!(solved.status(), SolveStatus::Infeasible);
        assert!(solved.solution().is_none());
    }

    #[test]
    fn violated_empty_row_is_infeasible() {
        let (mut p, _) = two_var_problem();
        p.add_constraint("demand".into(), LinearExpr::new(), Sense::Ge, 4.0);
        let solved = MicrolpOracle.solve(&p).expect("solver should run");
        assert_eq!(solved.status(), SolveStatus::Infeasible);
    }

    #[test]
    fn satisfied_empty_row_is_skipped() {
        let (mut p, _) = two_var_problem();
        p.add_constraint("demand".into(), LinearExpr::new(), Sense::Ge, 0.0);
        let solved = MicrolpOracle.solve(&p).expect("solver should run");
        assert_eq!(solved.status(), SolveStatus::Optimal);
        assert_eq!(solved.solution().map(Solution::objective), Some(0.0));
    }
}
