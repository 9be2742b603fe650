//! HiGHS oracle, available with the `highs` cargo feature.

use std::time::Duration;

use ::highs::{Col, HighsModelStatus, RowProblem, Sense as HighsSense};
use tracing::{debug, warn};

use super::{Oracle, OracleError, Solution, SolveStatus, SolvedModel};
use crate::model::{Domain, Problem, Sense};

/// Solves with the HiGHS MILP solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsOracle {
    time_limit: Option<Duration>,
}

impl HighsOracle {
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self { time_limit }
    }
}

impl Oracle for HighsOracle {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, problem: &Problem) -> Result<SolvedModel, OracleError> {
        let mut pb = RowProblem::default();
        let objective = problem.objective();
        let columns: Vec<Col> = problem
            .handles()
            .map(|(handle, def)| {
                let cost = objective.coefficient(handle);
                match def.domain {
                    Domain::Integer => pb.add_integer_column(cost, def.lower..def.upper),
                    Domain::Continuous => pb.add_column(cost, def.lower..def.upper),
                }
            })
            .collect();

        for c in problem.constraints() {
            let terms: Vec<(Col, f64)> = c
                .expr
                .terms()
                .map(|(var, coeff)| (columns[var.index()], coeff))
                .collect();
            match c.sense {
                Sense::Le => pb.add_row(..=c.rhs, &terms),
                Sense::Ge => pb.add_row(c.rhs.., &terms),
                Sense::Eq => pb.add_row(c.rhs..=c.rhs, &terms),
            }
        }

        let mut model = pb.optimise(HighsSense::Minimise);
        model.make_quiet();
        if let Some(limit) = self.time_limit {
            model.set_option("time_limit", limit.as_secs_f64());
        }
        let solved = model.solve();

        let status = match solved.status() {
            HighsModelStatus::Optimal => {
                let values: Vec<f64> = problem
                    .variables()
                    .iter()
                    .zip(solved.get_solution().columns())
                    .map(|(def, &raw)| match def.domain {
                        Domain::Integer => raw.round(),
                        Domain::Continuous => raw.max(def.lower),
                    })
                    .collect();
                if values.len() != problem.variables().len() {
                    return Err(OracleError {
                        backend: self.name(),
                        message: format!(
                            "returned {} column values for {} variables",
                            values.len(),
                            problem.variables().len()
                        ),
                    });
                }
                let objective = problem.objective().evaluate(&values);
                debug!(objective, "highs solve finished");
                return Ok(SolvedModel::optimal(Solution::new(objective, values)));
            }
            HighsModelStatus::Infeasible => SolveStatus::Infeasible,
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                SolveStatus::Unbounded
            }
            other => {
                warn!(status = ?other, "highs stopped without proving optimality");
                SolveStatus::NotSolved
            }
        };
        Ok(SolvedModel::without_solution(status))
    }
}
