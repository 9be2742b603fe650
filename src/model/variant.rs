//! Numeric and structural switches that distinguish model variants.

use std::fmt;

/// Scaling constants and optional constraints of the fleet model.
///
/// The presets reproduce the three historical calibrations. Individual
/// fields can be overridden from the scenario registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVariant {
    /// Multiplier from per-ship consumption to fuel-demand units.
    pub fuel_scale: f64,
    /// Multiplier from fuel demand times emission factor to CO2 units.
    pub emissions_scale: f64,
    /// Adds `fuel_availability[y,f]` rows (FuelDemand <= fuel_avail).
    pub enforce_fuel_availability: bool,
    /// Whether fuel prices are keyed by (fuel, year) rather than fuel alone.
    pub fuel_cost_by_year: bool,
    /// Reporting multiplier applied to fuel cost by the result extractor.
    pub fuel_cost_unit_scale: f64,
    /// Adds `minimum_fleet[y,s]` rows (StockShips >= minim_capacity_fleet).
    pub enforce_minimum_fleet: bool,
}

impl ModelVariant {
    /// Names accepted by [`ModelVariant::from_preset`].
    pub const PRESETS: &[&str] = &["legacy", "scenario_comparison", "scenario_analysis"];

    /// Single-scenario calibration with flat fuel prices.
    pub fn legacy() -> Self {
        Self {
            fuel_scale: 1e-4,
            emissions_scale: 1.0,
            enforce_fuel_availability: true,
            fuel_cost_by_year: false,
            fuel_cost_unit_scale: 1.0,
            enforce_minimum_fleet: false,
        }
    }

    /// Multi-scenario calibration with yearly fuel prices and availability limits.
    pub fn scenario_comparison() -> Self {
        Self {
            fuel_scale: 1e-2,
            emissions_scale: 10e-6,
            enforce_fuel_availability: true,
            fuel_cost_by_year: true,
            fuel_cost_unit_scale: 1.0,
            enforce_minimum_fleet: false,
        }
    }

    /// Scenario-analysis calibration; fuel availability is not enforced and
    /// fuel cost is reported in hundredths.
    pub fn scenario_analysis() -> Self {
        Self {
            fuel_scale: 1e-2,
            emissions_scale: 1e-3,
            enforce_fuel_availability: false,
            fuel_cost_by_year: true,
            fuel_cost_unit_scale: 100.0,
            enforce_minimum_fleet: false,
        }
    }

    /// Returns the named preset, or `None` for an unknown name.
    pub fn from_preset(name: &str) -> Option<Self> {
        match name {
            "legacy" => Some(Self::legacy()),
            "scenario_comparison" => Some(Self::scenario_comparison()),
            "scenario_analysis" => Some(Self::scenario_analysis()),
            _ => None,
        }
    }
}

impl Default for ModelVariant {
    fn default() -> Self {
        Self::scenario_analysis()
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fuel_scale={:e} emissions_scale={:e} fuel_availability={} fuel_cost_by_year={} \
             fuel_cost_unit_scale={} minimum_fleet={}",
            self.fuel_scale,
            self.emissions_scale,
            self.enforce_fuel_availability,
            self.fuel_cost_by_year,
            self.fuel_cost_unit_scale,
            self.enforce_minimum_fleet,
        )
    }
}
