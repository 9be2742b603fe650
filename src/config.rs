//! TOML scenario registry: horizon, model variant, solver, comparison, and
//! the input files of every scenario.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::compare::ScenarioComparator;
use crate::model::ModelVariant;
use crate::oracle::Backend;
use crate::params::TableName;
use crate::runner::{RunSettings, ScenarioSpec};
use crate::types::{Horizon, ShipType, Year};

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"scenarios.base.fuel_cost"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Top-level registry parsed from TOML.
///
/// Relative data paths resolve against the directory of the TOML file
/// (or the `base_dir` given to [`ScenarioRegistry::from_toml_str`]).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioRegistry {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    /// Files shared by every scenario unless a scenario overrides them.
    #[serde(default)]
    pub tables: TableFiles,
    #[serde(default)]
    pub scenarios: BTreeMap<String, TableFiles>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Horizon, ship types, and model variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub first_year: u16,
    pub last_year: u16,
    /// Ship-type codes to model.
    pub ship_types: Vec<String>,
    /// One of [`ModelVariant::PRESETS`].
    pub preset: String,
    pub fuel_scale: Option<f64>,
    pub emissions_scale: Option<f64>,
    pub enforce_fuel_availability: Option<bool>,
    pub fuel_cost_by_year: Option<bool>,
    pub fuel_cost_unit_scale: Option<f64>,
    pub enforce_minimum_fleet: Option<bool>,
    /// Fail scenarios with absent parameter keys instead of reading zeros.
    pub strict_coverage: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            first_year: Horizon::DEFAULT_FIRST.value(),
            last_year: Horizon::DEFAULT_LAST.value(),
            ship_types: ShipType::ALL.iter().map(|s| s.code().to_string()).collect(),
            preset: "scenario_analysis".to_string(),
            fuel_scale: None,
            emissions_scale: None,
            enforce_fuel_availability: None,
            fuel_cost_by_year: None,
            fuel_cost_unit_scale: None,
            enforce_minimum_fleet: None,
            strict_coverage: false,
        }
    }
}

/// Solver backend and time limit.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// `"microlp"` or `"highs"`.
    pub backend: String,
    /// Per-scenario solve limit in seconds; 0 disables it.
    pub time_limit_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: "microlp".to_string(),
            time_limit_secs: 600,
        }
    }
}

/// Scenario comparison parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparisonConfig {
    pub baseline: String,
    pub threshold: f64,
    pub epsilon: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        let cmp = ScenarioComparator::default();
        Self {
            baseline: "base".to_string(),
            threshold: cmp.threshold,
            epsilon: cmp.epsilon,
        }
    }
}

/// Input file per table, plus the directory they live in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableFiles {
    /// Directory of the files, relative to the registry file.
    pub data_dir: Option<String>,
    pub description: Option<String>,
    pub init_capacity_fleet: Option<String>,
    pub minim_capacity_fleet: Option<String>,
    pub fleet_age: Option<String>,
    pub demand_shipping: Option<String>,
    pub investment_cost: Option<String>,
    pub op_cost: Option<String>,
    pub emissions_factor: Option<String>,
    pub prod_capacity: Option<String>,
    pub lifetime: Option<String>,
    pub cap: Option<String>,
    #[serde(rename = "CII_desired")]
    pub cii_desired: Option<String>,
    pub fuel_cost: Option<String>,
    pub ets_price: Option<String>,
    pub co2_cap: Option<String>,
    pub fuel_avail: Option<String>,
    pub fuel_consumption: Option<String>,
}

impl TableFiles {
    pub fn file(&self, table: TableName) -> Option<&str> {
        let file = match table {
            TableName::InitCapacityFleet => &self.init_capacity_fleet,
            TableName::MinimCapacityFleet => &self.minim_capacity_fleet,
            TableName::FleetAge => &self.fleet_age,
            TableName::DemandShipping => &self.demand_shipping,
            TableName::InvestmentCost => &self.investment_cost,
            TableName::OpCost => &self.op_cost,
            TableName::EmissionsFactor => &self.emissions_factor,
            TableName::ProdCapacity => &self.prod_capacity,
            TableName::Lifetime => &self.lifetime,
            TableName::Cap => &self.cap,
            TableName::CiiDesired => &self.cii_desired,
            TableName::FuelCost => &self.fuel_cost,
            TableName::EtsPrice => &self.ets_price,
            TableName::Co2Cap => &self.co2_cap,
            TableName::FuelAvail => &self.fuel_avail,
            TableName::FuelConsumption => &self.fuel_consumption,
        };
        file.as_deref()
    }
}

impl ScenarioRegistry {
    /// Loads a registry from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml_str(&content, base_dir)
    }

    /// Parses a registry from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str, base_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut registry: Self =
            toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))?;
        registry.base_dir = base_dir.into();
        Ok(registry)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// # Errors
    ///
    /// Returns a `ConfigError` if `first_year > last_year`.
    pub fn horizon(&self) -> Result<Horizon, ConfigError> {
        let m = &self.model;
        if m.first_year > m.last_year {
            return Err(ConfigError::new(
                "model.first_year",
                format!("must be <= model.last_year ({})", m.last_year),
            ));
        }
        Ok(Horizon::new(Year(m.first_year), Year(m.last_year)))
    }

    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown or repeated ship-type code.
    pub fn ship_types(&self) -> Result<Vec<ShipType>, ConfigError> {
        let mut ships = Vec::new();
        for code in &self.model.ship_types {
            let s: ShipType = code
                .parse()
                .map_err(|e| ConfigError::new("model.ship_types", format!("{e}")))?;
            if ships.contains(&s) {
                return Err(ConfigError::new(
                    "model.ship_types",
                    format!("`{code}` listed more than once"),
                ));
            }
            ships.push(s);
        }
        Ok(ships)
    }

    /// The preset named by `model.preset` with any overrides applied.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn variant(&self) -> Result<ModelVariant, ConfigError> {
        let m = &self.model;
        let mut v = ModelVariant::from_preset(&m.preset).ok_or_else(|| {
            ConfigError::new(
                "model.preset",
                format!(
                    "unknown preset \"{}\", expected one of: {}",
                    m.preset,
                    ModelVariant::PRESETS.join(", ")
                ),
            )
        })?;
        if let Some(x) = m.fuel_scale {
            v.fuel_scale = x;
        }
        if let Some(x) = m.emissions_scale {
            v.emissions_scale = x;
        }
        if let Some(x) = m.enforce_fuel_availability {
            v.enforce_fuel_availability = x;
        }
        if let Some(x) = m.fuel_cost_by_year {
            v.fuel_cost_by_year = x;
        }
        if let Some(x) = m.fuel_cost_unit_scale {
            v.fuel_cost_unit_scale = x;
        }
        if let Some(x) = m.enforce_minimum_fleet {
            v.enforce_minimum_fleet = x;
        }
        Ok(v)
    }

    /// # Errors
    ///
    /// Returns a `ConfigError` if the backend name is unknown.
    pub fn backend(&self) -> Result<Backend, ConfigError> {
        self.solver
            .backend
            .parse()
            .map_err(|e: String| ConfigError::new("solver.backend", e))
    }

    pub fn time_limit(&self) -> Option<Duration> {
        (self.solver.time_limit_secs > 0).then(|| Duration::from_secs(self.solver.time_limit_secs))
    }

    pub fn comparator(&self) -> ScenarioComparator {
        ScenarioComparator::new(self.comparison.threshold, self.comparison.epsilon)
    }

    pub fn baseline(&self) -> &str {
        &self.comparison.baseline
    }

    pub fn scenario_ids(&self) -> Vec<&str> {
        self.scenarios.keys().map(String::as_str).collect()
    }

    /// Path of every table configured for scenario `id`, scenario entries
    /// taking precedence over the shared `[tables]` defaults.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `id` is not a registered scenario.
    pub fn resolve_tables(&self, id: &str) -> Result<BTreeMap<TableName, PathBuf>, ConfigError> {
        let scenario = self.scenarios.get(id).ok_or_else(|| {
            ConfigError::new("scenarios", format!("unknown scenario \"{id}\""))
        })?;
        let dir = scenario
            .data_dir
            .as_deref()
            .or(self.tables.data_dir.as_deref())
            .map_or_else(|| self.base_dir.clone(), |d| self.base_dir.join(d));
        Ok(TableName::ALL
            .into_iter()
            .filter_map(|t| {
                scenario
                    .file(t)
                    .or_else(|| self.tables.file(t))
                    .map(|f| (t, dir.join(f)))
            })
            .collect())
    }

    /// Specs for the selected scenario ids, or for every scenario when
    /// `selection` is empty.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown id.
    pub fn scenario_specs(&self, selection: &[String]) -> Result<Vec<ScenarioSpec>, ConfigError> {
        let ids: Vec<&str> = if selection.is_empty() {
            self.scenario_ids()
        } else {
            selection.iter().map(String::as_str).collect()
        };
        ids.into_iter()
            .map(|id| {
                Ok(ScenarioSpec {
                    id: id.to_string(),
                    tables: self.resolve_tables(id)?,
                })
            })
            .collect()
    }

    /// Settings shared by every scenario run.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` among horizon, ship types, and variant.
    pub fn run_settings(&self) -> Result<RunSettings, ConfigError> {
        Ok(RunSettings {
            horizon: self.horizon()?,
            ship_types: self.ship_types()?,
            variant: self.variant()?,
            strict_coverage: self.model.strict_coverage,
            time_limit: self.time_limit(),
        })
    }

    /// Checks the whole registry and returns every problem found.
    ///
    /// Besides value ranges, this verifies that each scenario resolves every
    /// table the variant requires and that every referenced file exists.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Err(e) = self.horizon() {
            errors.push(e);
        }
        match self.ship_types() {
            Ok(ships) if ships.is_empty() => {
                errors.push(ConfigError::new("model.ship_types", "must not be empty"));
            }
            Ok(_) => {}
            Err(e) => errors.push(e),
        }

        let variant = match self.variant() {
            Ok(v) => Some(v),
            Err(e) => {
                errors.push(e);
                None
            }
        };
        if let Some(v) = &variant {
            for (field, value) in [
                ("model.fuel_scale", v.fuel_scale),
                ("model.emissions_scale", v.emissions_scale),
                ("model.fuel_cost_unit_scale", v.fuel_cost_unit_scale),
            ] {
                if !(value.is_finite() && value > 0.0) {
                    errors.push(ConfigError::new(field, format!("must be > 0, got {value}")));
                }
            }
        }

        match self.backend() {
            Ok(b) if !b.is_available() => errors.push(ConfigError::new(
                "solver.backend",
                format!("\"{b}\" requires building with the `{b}` feature"),
            )),
            Ok(_) => {}
            Err(e) => errors.push(e),
        }

        let c = &self.comparison;
        if !(c.threshold.is_finite() && c.threshold >= 0.0) {
            errors.push(ConfigError::new("comparison.threshold", "must be >= 0"));
        }
        if !(c.epsilon.is_finite() && c.epsilon > 0.0) {
            errors.push(ConfigError::new("comparison.epsilon", "must be > 0"));
        }

        if self.scenarios.is_empty() {
            errors.push(ConfigError::new("scenarios", "at least one scenario is required"));
        } else if !self.scenarios.contains_key(&c.baseline) {
            errors.push(ConfigError::new(
                "comparison.baseline",
                format!("\"{}\" is not a registered scenario", c.baseline),
            ));
        }

        for id in self.scenarios.keys() {
            let Ok(files) = self.resolve_tables(id) else {
                continue;
            };
            if let Some(v) = &variant {
                for table in TableName::ALL {
                    if table.is_required(v) && !files.contains_key(&table) {
                        errors.push(ConfigError::new(
                            format!("scenarios.{id}.{table}"),
                            "required table is not configured",
                        ));
                    }
                }
            }
            for (table, path) in &files {
                if !path.is_file() {
                    errors.push(ConfigError::new(
                        format!("scenarios.{id}.{table}"),
                        format!("file \"{}\" does not exist", path.display()),
                    ));
                }
            }
        }
        errors
    }
}
