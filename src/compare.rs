//! Cross-scenario difference detection.
//!
//! Every non-baseline scenario is compared column by column against the
//! baseline. A category is flagged when any of its columns diverges by more
//! than the threshold in any scenario.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::results::{Column, ResultRecord};
use crate::types::{FuelType, ShipType};

/// Failure to compare a set of scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("baseline scenario `{0}` has no results")]
    UnknownBaseline(String),
    #[error("scenario `{scenario}` covers different years than baseline `{baseline}`")]
    HorizonMismatch { scenario: String, baseline: String },
}

/// Group of related result columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Costs,
    Emissions,
    Fleet,
    FuelMix,
    EtsPenalty,
    ExcessEmissions,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Costs,
        Category::Emissions,
        Category::Fleet,
        Category::FuelMix,
        Category::EtsPenalty,
        Category::ExcessEmissions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Costs => "costs",
            Category::Emissions => "emissions",
            Category::Fleet => "fleet",
            Category::FuelMix => "fuel_mix",
            Category::EtsPenalty => "ets_penalty",
            Category::ExcessEmissions => "excess_emissions",
        }
    }

    /// Columns compared for this category between `baseline` and `other`.
    ///
    /// Fleet and fuel-mix columns cover every ship type and fuel present in
    /// either record.
    pub fn columns(self, baseline: &ResultRecord, other: &ResultRecord) -> Vec<Column> {
        match self {
            Category::Costs => vec![
                Column::TotalCost,
                Column::TotalCostPerYear,
                Column::InvestmentCost,
                Column::OperationalCost,
                Column::FuelCost,
            ],
            Category::Emissions => vec![Column::Co2Emissions],
            Category::EtsPenalty => vec![Column::EtsPenalty],
            Category::ExcessEmissions => vec![Column::ExcessEmissions],
            Category::Fleet => ShipType::ALL
                .into_iter()
                .filter(|s| baseline.ship_types.contains(s) || other.ship_types.contains(s))
                .map(Column::StockShips)
                .collect(),
            Category::FuelMix => {
                let mut fuels: Vec<FuelType> = baseline.fuel_types.clone();
                for f in &other.fuel_types {
                    if !fuels.contains(f) {
                        fuels.push(f.clone());
                    }
                }
                fuels.into_iter().map(Column::FuelDemand).collect()
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of one scenario that diverged beyond the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Divergence {
    pub scenario: String,
    pub category: Category,
    pub column: String,
    pub relative_difference: f64,
}

/// Which result categories differ across scenarios.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioDifferenceReport {
    pub baseline: String,
    pub costs: bool,
    pub emissions: bool,
    pub fleet: bool,
    pub fuel_mix: bool,
    pub ets_penalty: bool,
    pub excess_emissions: bool,
    /// Every (scenario, column) pair above the threshold, in scenario order.
    pub divergences: Vec<Divergence>,
}

impl ScenarioDifferenceReport {
    pub fn flag(&self, category: Category) -> bool {
        match category {
            Category::Costs => self.costs,
            Category::Emissions => self.emissions,
            Category::Fleet => self.fleet,
            Category::FuelMix => self.fuel_mix,
            Category::EtsPenalty => self.ets_penalty,
            Category::ExcessEmissions => self.excess_emissions,
        }
    }

    fn raise(&mut self, category: Category) {
        let flag = match category {
            Category::Costs => &mut self.costs,
            Category::Emissions => &mut self.emissions,
            Category::Fleet => &mut self.fleet,
            Category::FuelMix => &mut self.fuel_mix,
            Category::EtsPenalty => &mut self.ets_penalty,
            Category::ExcessEmissions => &mut self.excess_emissions,
        };
        *flag = true;
    }

    pub fn any(&self) -> bool {
        Category::ALL.into_iter().any(|c| self.flag(c))
    }

    pub fn flagged(&self) -> Vec<Category> {
        Category::ALL.into_iter().filter(|&c| self.flag(c)).collect()
    }

    /// Columns worth charting: every column of each flagged category, taken
    /// from the baseline record.
    pub fn flagged_columns(&self, baseline: &ResultRecord) -> Vec<Column> {
        self.flagged()
            .into_iter()
            .flat_map(|c| c.columns(baseline, baseline))
            .collect()
    }
}

impl fmt::Display for ScenarioDifferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Scenario differences vs {} ---", self.baseline)?;
        for c in Category::ALL {
            let mark = if self.flag(c) { "differs" } else { "same" };
            writeln!(f, "{:<18}{mark}", format!("{c}:"))?;
        }
        write!(f, "Divergent columns:  {}", self.divergences.len())?;
        for d in &self.divergences {
            write!(
                f,
                "\n  {} {} ({}): {:.1}%",
                d.scenario,
                d.column,
                d.category,
                d.relative_difference * 100.0
            )?;
        }
        Ok(())
    }
}

/// `mean(|scenario - baseline|) / (mean(baseline) + epsilon)`.
///
/// Empty columns compare as equal.
pub fn relative_difference(scenario: &[f64], baseline: &[f64], epsilon: f64) -> f64 {
    let n = baseline.len().max(scenario.len());
    if n == 0 {
        return 0.0;
    }
    let at = |xs: &[f64], i: usize| xs.get(i).copied().unwrap_or(0.0);
    let abs_diff: f64 = (0..n).map(|i| (at(scenario, i) - at(baseline, i)).abs()).sum();
    let base: f64 = (0..n).map(|i| at(baseline, i)).sum();
    let n = n as f64;
    (abs_diff / n) / (base / n + epsilon)
}

/// Flags result categories that differ from a baseline scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioComparator {
    /// Relative difference above which a column counts as divergent.
    pub threshold: f64,
    /// Added to the baseline mean to avoid division by zero.
    pub epsilon: f64,
}

impl Default for ScenarioComparator {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            epsilon: 1e-10,
        }
    }
}

impl ScenarioComparator {
    pub fn new(threshold: f64, epsilon: f64) -> Self {
        Self { threshold, epsilon }
    }

    /// Compares every scenario in `results` against `baseline`.
    ///
    /// Columns a scenario lacks (a fuel or ship type outside its set) are
    /// read as zeros. A single scenario holding only the baseline yields an
    /// all-false report.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::UnknownBaseline`] if `baseline` is not in
    /// `results`, and [`CompareError::HorizonMismatch`] if a scenario's years
    /// differ from the baseline's.
    pub fn compare(
        &self,
        results: &BTreeMap<String, ResultRecord>,
        baseline: &str,
    ) -> Result<ScenarioDifferenceReport, CompareError> {
        let base = results
            .get(baseline)
            .ok_or_else(|| CompareError::UnknownBaseline(baseline.to_string()))?;
        let years = base.years();
        let zeros = vec![0.0; years.len()];
        let mut report = ScenarioDifferenceReport {
            baseline: baseline.to_string(),
            ..ScenarioDifferenceReport::default()
        };

        for (id, record) in results.iter().filter(|(id, _)| id.as_str() != baseline) {
            if record.years() != years {
                return Err(CompareError::HorizonMismatch {
                    scenario: id.clone(),
                    baseline: baseline.to_string(),
                });
            }
            for category in Category::ALL {
                for column in category.columns(base, record) {
                    let b = base.column(&column).unwrap_or_else(|| zeros.clone());
                    let s = record.column(&column).unwrap_or_else(|| zeros.clone());
                    let rd = relative_difference(&s, &b, self.epsilon);
                    if rd > self.threshold {
                        debug!(scenario = %id, column = %column, rd, "column diverges");
                        report.raise(category);
                        report.divergences.push(Divergence {
                            scenario: id.clone(),
                            category,
                            column: column.to_string(),
                            relative_difference: rd,
                        });
                    }
                }
            }
        }
        Ok(report)
    }
}
