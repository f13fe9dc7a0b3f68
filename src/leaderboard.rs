use log::{debug, info, warn};

use reward_metrics::builder::Builder;
use reward_metrics::*;
use snafu::{prelude::*, Snafu};

use std::path::{Path, PathBuf};

use calamine::DataType;

use crate::leaderboard::cleaner::CleaningRules;
use crate::leaderboard::config_reader::*;

pub mod cleaner;
pub mod config_reader;
mod io_common;
mod io_csv;
mod io_hyperlinks;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum LeaderboardError {
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Error reading worksheet {sheet} in {path}"))]
    ReadingSheet {
        source: calamine::XlsxError,
        sheet: String,
        path: String,
    },
    #[snafu(display("Worksheet {sheet} is listed in the workbook but could not be found"))]
    MissingSheet { sheet: String },
    #[snafu(display("Error opening the workbook package {path}"))]
    OpeningPackage {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading {entry} in the workbook package"))]
    ReadingPackage {
        source: zip::result::ZipError,
        entry: String,
    },
    #[snafu(display("Error reading the content of {entry}"))]
    ReadingPackageEntry {
        source: std::io::Error,
        entry: String,
    },
    #[snafu(display("Error parsing the XML of {entry}"))]
    ParsingXml {
        source: quick_xml::Error,
        entry: String,
    },
    #[snafu(display("Error opening the settings file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the settings file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Invalid identifier pattern {pattern}"))]
    InvalidPattern {
        source: regex::Error,
        pattern: String,
    },
    #[snafu(display("Could not find the directory of {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Could not locate the executable"))]
    LocatingExecutable { source: std::io::Error },
    #[snafu(display("Error creating the output directory {path}"))]
    CreatingOutputDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing the report {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error flushing the report {path}"))]
    FlushingCsv {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error computing the metrics"))]
    Metrics { source: MetricErrors },
}

pub type LeaderboardResult<T> = Result<T, LeaderboardError>;
pub type BLeaderboardResult<T> = Result<T, Box<LeaderboardError>>;

/// A row of a worksheet, as read by the loader.
/// This is before any cleaning: every field may still be missing or malformed.
#[derive(PartialEq, Debug, Clone)]
pub struct RawRow {
    /// The line in the worksheet (1-based, as displayed by spreadsheet programs).
    pub lineno: usize,
    pub rank: DataType,
    /// The hyperlink target of the user cell, or its text.
    pub user: Option<String>,
    pub total_rewards: DataType,
    pub balance: DataType,
}

/// One period of the leaderboard.
#[derive(PartialEq, Debug, Clone)]
pub struct LoadedSheet {
    pub name: String,
    pub rows: Vec<RawRow>,
}

/// Runs the whole pipeline: load, clean, compute the metrics and export the reports.
///
/// Returns `None` when no period had any valid row. Nothing is written in this case.
pub fn run_report(settings: &Settings) -> BLeaderboardResult<Option<Vec<Report>>> {
    info!("Attempting to read leaderboard {:?}", settings.input_file);
    let sheets = io_xlsx::read_leaderboard(&settings.input_file, &settings.columns)?;
    let rules = CleaningRules::new(&settings.identifier_pattern, &settings.reward_suffix)?;

    let mut builder = Builder::new();
    for sheet in sheets.iter() {
        let summary = cleaner::clean_sheet(sheet, &rules, &mut builder);
        debug!("run_report: sheet {:?}: {:?}", sheet.name, summary);
    }

    let aggregates = match builder.aggregate() {
        Ok(x) => x,
        Err(MetricErrors::EmptyRun) => {
            warn!("No data collected from any sheets. Exiting.");
            println!("No data collected from any sheets. Nothing to report.");
            return Ok(None);
        }
        Err(source) => return Err(Box::new(LeaderboardError::Metrics { source })),
    };
    info!(
        "Computed metrics for {} participants over {} records",
        aggregates.len(),
        builder.len()
    );

    let reports = build_reports(&aggregates, &settings.thresholds);
    let paths = io_csv::write_reports(&settings.output_directory, &reports)?;
    for p in paths.iter() {
        info!("Wrote report {:?}", p);
    }

    print_summary(&reports, &settings.thresholds, &settings.output_directory);
    Ok(Some(reports))
}

fn print_summary(reports: &[Report], thresholds: &ReportThresholds, output_dir: &Path) {
    println!(
        "--- Top Performers --- (Saved to CSVs in {:?})\n",
        output_dir.display().to_string()
    );
    for report in reports.iter() {
        println!("{}:", report.kind.description(thresholds));
        println!("{}", format_report(report));
    }
}

/// A fixed-width rendering of the main columns of a report.
fn format_report(report: &Report) -> String {
    let mut s = format!(
        "{:>4} {:<44} {:>12} {:>7} {:>11} {:>9} {:>14}\n",
        "", "User", "avg_rate", "months", "top_decile", "avg_rank", "avg_balance"
    );
    if report.rows.is_empty() {
        s.push_str("  (no participant)\n");
    }
    for (idx, a) in report.rows.iter().enumerate() {
        s.push_str(&format!(
            "{:>4} {:<44} {:>12.4} {:>7} {:>11} {:>9.2} {:>14.2}\n",
            idx,
            a.participant,
            a.avg_rate,
            a.months_participated,
            a.top_decile_months,
            a.avg_rank_number,
            a.avg_balance
        ));
    }
    s
}

pub fn output_path(output_dir: &Path, kind: ReportKind) -> PathBuf {
    output_dir.join(format!("{}.csv", kind.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate_named(name: &str) -> ParticipantAggregate {
        ParticipantAggregate {
            participant: name.to_string(),
            avg_rate: 1.5,
            med_rate: 1.5,
            best_rate: 1.5,
            months_participated: 1,
            sum_total_rewards: 1.0,
            avg_total_rewards: 1.0,
            med_total_rewards: 1.0,
            sum_balance: 10.0,
            avg_balance: 10.0,
            med_balance: 10.0,
            top_decile_months: 0,
            avg_rank_number: 1.0,
            med_rank_number: 1.0,
        }
    }

    #[test]
    fn formatted_report_lists_every_row() {
        let report = Report {
            kind: ReportKind::Consistency,
            rows: vec![aggregate_named("0xabc"), aggregate_named("0xdef")],
        };
        let s = format_report(&report);
        assert_eq!(s.lines().count(), 3);
        assert!(s.contains("0xabc"));
        assert!(s.contains("1.5000"));

        let empty = Report {
            kind: ReportKind::Consistency,
            rows: vec![],
        };
        assert!(format_report(&empty).contains("(no participant)"));
    }

    fn settings_in(dir: &Path) -> Settings {
        Settings::defaults_in(dir)
    }

    #[test]
    fn end_to_end_with_hyperlinks() {
        let _ = env_logger::try_init();
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        io_xlsx::tests::write_workbook(&settings.input_file, "vePENDLE Balance");

        let reports = run_report(&settings).unwrap().unwrap();
        assert_eq!(reports.len(), 6);
        let consistency = &reports[1];
        assert_eq!(consistency.kind, ReportKind::Consistency);
        let names: Vec<&str> = consistency
            .rows
            .iter()
            .map(|a| a.participant.as_str())
            .collect();
        // 0xaaa: 0.5 / 1000, 0xbbb: 0.25 / 500, the same efficiency.
        assert_eq!(names, vec!["0xaaa", "0xbbb"]);
        for a in consistency.rows.iter() {
            assert_eq!(a.avg_rank_number, 1.0);
            assert_eq!(a.months_participated, 1);
        }
        for kind in ReportKind::ALL {
            assert!(output_path(&settings.output_directory, kind).exists());
        }
    }

    #[test]
    fn nothing_is_written_without_valid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        io_xlsx::tests::write_workbook(&settings.input_file, "Balance");

        assert_eq!(run_report(&settings).unwrap(), None);
        assert!(!settings.output_directory.exists());
    }

    #[test]
    fn all_rows_dropped_is_an_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        // The rewards are in ETH: no reward parses with another unit.
        settings.reward_suffix = " USDC".to_string();
        io_xlsx::tests::write_workbook(&settings.input_file, "vePENDLE Balance");

        assert_eq!(run_report(&settings).unwrap(), None);
        assert!(!settings.output_directory.exists());
    }

    #[test]
    fn missing_workbook_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let err = run_report(&settings).unwrap_err();
        assert!(matches!(*err, LeaderboardError::OpeningExcel { .. }));
    }

    #[test]
    fn output_files_are_named_after_reports() {
        let p = output_path(Path::new("out"), ReportKind::HighBalanceByAvgRank);
        assert_eq!(p, Path::new("out").join("top_high_vependle_by_avg_rank.csv"));
    }
}
