//! Integration tests for cross-scenario difference detection.

mod common;

use fleet_transition::compare::{Category, CompareError, ScenarioComparator};
use fleet_transition::results::Column;
use fleet_transition::types::{FuelType, Year};
use proptest::prelude::*;

fn fuels(h2: [f64; 3]) -> Vec<(FuelType, [f64; 3])> {
    vec![(common::hfo(), [20.0, 18.0, 15.0]), (common::h2(), h2)]
}

#[test]
fn identical_scenarios_flag_nothing() {
    let results = common::records(vec![
        common::record_with_fuels("base", &fuels([1.0, 2.0, 4.0])),
        common::record_with_fuels("copy", &fuels([1.0, 2.0, 4.0])),
    ]);
    let report = ScenarioComparator::default()
        .compare(&results, "base")
        .expect("comparison should succeed");
    assert!(!report.any(), "{report}");
    assert!(report.divergences.is_empty());
}

#[test]
fn doubled_hydrogen_flags_only_fuel_mix() {
    let results = common::records(vec![
        common::record_with_fuels("base", &fuels([1.0, 2.0, 4.0])),
        common::record_with_fuels("h2", &fuels([2.0, 4.0, 8.0])),
    ]);
    let report = ScenarioComparator::default()
        .compare(&results, "base")
        .expect("comparison should succeed");
    assert_eq!(report.flagged(), vec![Category::FuelMix]);
    assert_eq!(report.divergences.len(), 1);
    assert_eq!(report.divergences[0].column, "Fuel_Demand_H2");
    assert!((report.divergences[0].relative_difference - 1.0).abs() < 1e-9);

    let base = &results["base"];
    assert_eq!(
        report.flagged_columns(base),
        vec![
            Column::FuelDemand(common::hfo()),
            Column::FuelDemand(common::h2())
        ]
    );
}

#[test]
fn fuel_missing_from_one_scenario_reads_as_zero() {
    let results = common::records(vec![
        common::record_with_fuels("base", &[(common::hfo(), [20.0, 18.0, 15.0])]),
        common::record_with_fuels("h2", &fuels([1.0, 2.0, 4.0])),
    ]);
    let report = ScenarioComparator::default()
        .compare(&results, "base")
        .expect("comparison should succeed");
    assert!(report.fuel_mix);
    assert!(!report.costs);
    assert!(
        report
            .divergences
            .iter()
            .any(|d| d.column == "Fuel_Demand_H2")
    );
}

#[test]
fn horizon_mismatch_is_an_error() {
    let base = common::record_with_fuels("base", &fuels([1.0, 1.0, 1.0]));
    let mut short = common::record_with_fuels("short", &fuels([1.0, 1.0, 1.0]));
    short.rows.retain(|r| r.year != Year(2022));
    let err = ScenarioComparator::default()
        .compare(&common::records(vec![base, short]), "base")
        .err();
    assert_eq!(
        err,
        Some(CompareError::HorizonMismatch {
            scenario: "short".to_string(),
            baseline: "base".to_string(),
        })
    );
}

#[test]
fn threshold_is_strict() {
    // relative difference exactly 0.5
    let results = common::records(vec![
        common::record_with_fuels("base", &fuels([2.0, 2.0, 2.0])),
        common::record_with_fuels("alt", &fuels([3.0, 3.0, 3.0])),
    ]);
    let at_threshold = ScenarioComparator::new(0.5, 0.0)
        .compare(&results, "base")
        .expect("comparison should succeed");
    assert!(!at_threshold.fuel_mix);
    let below = ScenarioComparator::new(0.49, 0.0)
        .compare(&results, "base")
        .expect("comparison should succeed");
    assert!(below.fuel_mix);
}

proptest! {
    #[test]
    fn comparing_twice_gives_the_same_report(
        base in prop::array::uniform3(0.0f64..100.0),
        other in prop::array::uniform3(0.0f64..100.0),
        threshold in 0.0f64..1.0,
    ) {
        let results = common::records(vec![
            common::record_with_fuels("base", &fuels(base)),
            common::record_with_fuels("other", &fuels(other)),
        ]);
        let comparator = ScenarioComparator::new(threshold, 1e-10);
        let first = comparator.compare(&results, "base");
        let second = comparator.compare(&results, "base");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn baseline_alone_flags_nothing(values in prop::array::uniform3(0.0f64..100.0)) {
        let results = common::records(vec![common::record_with_fuels("base", &fuels(values))]);
        let report = ScenarioComparator::default().compare(&results, "base");
        prop_assert!(report.is_ok_and(|r| !r.any()));
    }
}
