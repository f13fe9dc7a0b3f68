// Primitives for writing the reports as CSV files.

use serde::Serialize;
use std::fs;

use crate::leaderboard::*;

const HEADER: [&str; 14] = [
    "User",
    "avg_rate",
    "med_rate",
    "best_rate",
    "months_participated",
    "sum_total_rewards",
    "avg_total_rewards",
    "med_total_rewards",
    "sum_vependle_balance",
    "avg_vependle_balance",
    "med_vependle_balance",
    "top_decile_months",
    "avg_monthly_rank_number",
    "median_monthly_rank_number",
];

// The fields must follow the order of HEADER.
#[derive(Serialize, Debug)]
struct AggregateRow<'a> {
    user: &'a str,
    avg_rate: f64,
    med_rate: f64,
    best_rate: f64,
    months_participated: u32,
    sum_total_rewards: f64,
    avg_total_rewards: f64,
    med_total_rewards: f64,
    sum_vependle_balance: f64,
    avg_vependle_balance: f64,
    med_vependle_balance: f64,
    top_decile_months: u32,
    avg_monthly_rank_number: f64,
    median_monthly_rank_number: f64,
}

impl<'a> From<&'a ParticipantAggregate> for AggregateRow<'a> {
    fn from(a: &'a ParticipantAggregate) -> Self {
        AggregateRow {
            user: &a.participant,
            avg_rate: a.avg_rate,
            med_rate: a.med_rate,
            best_rate: a.best_rate,
            months_participated: a.months_participated,
            sum_total_rewards: a.sum_total_rewards,
            avg_total_rewards: a.avg_total_rewards,
            med_total_rewards: a.med_total_rewards,
            sum_vependle_balance: a.sum_balance,
            avg_vependle_balance: a.avg_balance,
            med_vependle_balance: a.med_balance,
            top_decile_months: a.top_decile_months,
            avg_monthly_rank_number: a.avg_rank_number,
            median_monthly_rank_number: a.med_rank_number,
        }
    }
}

/// Writes one report. The header is always written, even for an empty report.
pub fn write_report(path: &Path, report: &Report) -> BLeaderboardResult<()> {
    let path_s = path.display().to_string();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context(WritingCsvSnafu {
            path: path_s.clone(),
        })?;
    wtr.write_record(HEADER).context(WritingCsvSnafu {
        path: path_s.clone(),
    })?;
    for a in report.rows.iter() {
        wtr.serialize(AggregateRow::from(a))
            .context(WritingCsvSnafu {
                path: path_s.clone(),
            })?;
    }
    wtr.flush().context(FlushingCsvSnafu { path: path_s })?;
    Ok(())
}

/// Writes all the reports in the output directory, which is created if needed.
pub fn write_reports(output_dir: &Path, reports: &[Report]) -> BLeaderboardResult<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).context(CreatingOutputDirSnafu {
        path: output_dir.display().to_string(),
    })?;
    let mut res: Vec<PathBuf> = Vec::new();
    for report in reports.iter() {
        let p = output_path(output_dir, report.kind);
        debug!("write_reports: {:?}: {} rows", p, report.rows.len());
        write_report(&p, report)?;
        res.push(p);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reports() -> Vec<Report> {
        let mut builder = reward_metrics::builder::Builder::new();
        builder.add_record("0xa", "P1", 10.0, 1000.0).unwrap();
        builder.add_record("0xb", "P1", 5.0, 1000.0).unwrap();
        let aggregates = builder.aggregate().unwrap();
        build_reports(&aggregates, &ReportThresholds::DEFAULT_THRESHOLDS)
    }

    #[test]
    fn writes_one_file_per_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("output");
        let paths = write_reports(&out, &reports()).unwrap();
        assert_eq!(paths.len(), 6);
        for p in paths.iter() {
            assert!(p.exists(), "{:?}", p);
        }

        let consistency = fs::read_to_string(out.join("top_by_consistency.csv")).unwrap();
        let lines: Vec<&str> = consistency.lines().collect();
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "0xa,10.0,10.0,10.0,1,10.0,10.0,10.0,1000.0,1000.0,1000.0,1,1.0,1.0"
        );
        assert!(lines[2].starts_with("0xb,5.0,"));
    }

    #[test]
    fn empty_reports_keep_the_header() {
        let dir = tempfile::tempdir().unwrap();
        write_reports(dir.path(), &reports()).unwrap();
        // Nobody has 4 periods.
        let content =
            fs::read_to_string(dir.path().join("top_by_average_earn_rate.csv")).unwrap();
        assert_eq!(content.trim_end(), HEADER.join(","));
    }
}
