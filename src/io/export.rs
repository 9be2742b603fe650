//! File export for result records, difference reports, and built models.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::compare::ScenarioDifferenceReport;
use crate::model::Problem;
use crate::results::ResultRecord;

/// Exports one scenario's results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per horizon year. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `record` - Extracted scenario results
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(record: &ResultRecord, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(record, buf)
}

/// Writes one scenario's results as CSV to any writer.
///
/// The header is `Year` followed by [`ResultRecord::columns`]; fleet columns
/// follow the record's ship types and fuel columns its fuel set.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(record: &ResultRecord, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let columns = record.columns();

    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push("Year".to_string());
    header.extend(columns.iter().map(ToString::to_string));
    wtr.write_record(&header)?;

    for row in &record.rows {
        let mut fields = Vec::with_capacity(columns.len() + 1);
        fields.push(row.year.to_string());
        fields.extend(
            columns
                .iter()
                .map(|c| format!("{:.4}", row.value(c).unwrap_or(0.0))),
        );
        wtr.write_record(&fields)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes a difference report as pretty-printed JSON.
///
/// # Errors
///
/// Returns an `io::Error` if serialisation or writing fails.
pub fn write_report_json(report: &ScenarioDifferenceReport, mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()
}

/// Exports a difference report to a JSON file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_report_json(report: &ScenarioDifferenceReport, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_report_json(report, io::BufWriter::new(file))
}

/// Dumps a built model in CPLEX LP format to the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_lp(problem: &Problem, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut buf = io::BufWriter::new(file);
    problem.write_lp(&mut buf)?;
    buf.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{Category, Divergence};
    use crate::results::YearRow;
    use crate::types::{FuelType, ShipType, Year};

    fn make_record(years: u16) -> ResultRecord {
        let ships = vec![ShipType::Container, ShipType::Tanker];
        let fuels = vec![FuelType::new("HFO"), FuelType::new("H2")];
        let rows = (0..years)
            .map(|i| {
                let mut row = YearRow::zeroed(Year(2020 + i), &ships, &fuels);
                row.co2_emissions = 12.5;
                row.investment_cost = 90.0;
                row.stock_ships.insert(ShipType::Container, 10.0);
                row.fuel_demand.insert(FuelType::new("H2"), 0.25);
                row
            })
            .collect();
        ResultRecord {
            scenario: "base".to_string(),
            ship_types: ships,
            fuel_types: fuels,
            objective: 100.0,
            fuel_cost_unit_scale: 1.0,
            rows,
        }
    }

    #[test]
    fn header_follows_column_order() {
        let mut buf = Vec::new();
        write_csv(&make_record(1), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "Year,CO2_Emissions,Total_Cost,Investment_Cost,Operational_Cost,Fuel_Cost,\
             Excess_Emissions,ETS_Penalty,Total_Cost_Per_Year,New_Ships_C,New_Ships_T,\
             Stock_Ships_C,Stock_Ships_T,Fuel_Demand_HFO,Fuel_Demand_H2"
        );
    }

    #[test]
    fn one_row_per_year() {
        let mut buf = Vec::new();
        write_csv(&make_record(6), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        // 1 header + 6 data rows
        assert_eq!(lines.len(), 7);
        assert!(lines[1].starts_with("2020,12.5000,"));
        assert!(lines[6].starts_with("2025,"));
        assert!(lines[1].ends_with(",0.0000,0.2500"));
    }

    #[test]
    fn deterministic_output() {
        let record = make_record(4);
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&record, &mut buf1).ok();
        write_csv(&record, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn report_json_has_flags_and_divergences() {
        let report = ScenarioDifferenceReport {
            baseline: "base".to_string(),
            fuel_mix: true,
            divergences: vec![Divergence {
                scenario: "h2".to_string(),
                category: Category::FuelMix,
                column: "Fuel_Demand_H2".to_string(),
                relative_difference: 1.0,
            }],
            ..ScenarioDifferenceReport::default()
        };
        let mut buf = Vec::new();
        write_report_json(&report, &mut buf).expect("json should serialise");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("valid json");
        assert_eq!(value["baseline"], "base");
        assert_eq!(value["fuel_mix"], true);
        assert_eq!(value["costs"], false);
        assert_eq!(value["divergences"][0]["category"], "fuel_mix");
    }
}
