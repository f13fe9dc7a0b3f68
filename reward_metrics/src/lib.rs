pub mod builder;
mod config;
pub mod manual;

use log::{debug, info};

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

pub use crate::config::*;

/// The efficiency is expressed per 1000 units of balance.
pub const EFFICIENCY_SCALE: f64 = 1_000.0;

/// Percentile rank at or above which a period counts as a top-decile period.
pub const TOP_DECILE: f64 = 0.90;

pub fn efficiency(reward: f64, balance: f64) -> f64 {
    reward / balance * EFFICIENCY_SCALE
}

// **** Ranking within a period ****

/// Ranks every record against the other records of the same period.
///
/// The output is in the same order as the input.
pub fn rank_periods(records: &[PeriodRecord]) -> Vec<RankedRecord> {
    let efficiencies: Vec<f64> = records.iter().map(|r| r.efficiency()).collect();

    // The sorted efficiencies of each period.
    let mut by_period: HashMap<&str, Vec<f64>> = HashMap::new();
    for (r, e) in records.iter().zip(efficiencies.iter()) {
        by_period.entry(r.period.as_str()).or_default().push(*e);
    }
    for values in by_period.values_mut() {
        values.sort_by(|a, b| a.total_cmp(b));
    }
    debug!("rank_periods: {} periods", by_period.len());

    records
        .iter()
        .zip(efficiencies)
        .map(|(r, e)| {
            // Every record contributed to its own period.
            let sorted = &by_period[r.period.as_str()];
            let n = sorted.len();
            let below = sorted.partition_point(|x| *x < e);
            let up_to = sorted.partition_point(|x| *x <= e);
            let ties = up_to - below;
            let above = n - up_to;
            // Average of the 1-based positions below+1 ..= up_to.
            let avg_rank = below as f64 + (ties as f64 + 1.0) / 2.0;
            RankedRecord {
                record: r.clone(),
                efficiency: e,
                percentile_rank: avg_rank / n as f64,
                rank_number: (above + 1) as u32,
            }
        })
        .collect()
}

// **** Aggregation across periods ****

#[derive(Default)]
struct ParticipantSamples {
    rates: Vec<f64>,
    rewards: Vec<f64>,
    balances: Vec<f64>,
    rank_numbers: Vec<f64>,
    top_decile_months: u32,
}

/// Aggregates the ranked records per participant.
///
/// The participants are returned sorted by identifier. Every statistic is computed over
/// sorted samples, so the result does not depend on the order of the records.
pub fn aggregate(ranked: &[RankedRecord]) -> Result<Vec<ParticipantAggregate>, MetricErrors> {
    if ranked.is_empty() {
        return Err(MetricErrors::EmptyRun);
    }

    let mut samples: BTreeMap<&str, ParticipantSamples> = BTreeMap::new();
    for rr in ranked.iter() {
        let s = samples.entry(rr.record.participant.as_str()).or_default();
        s.rates.push(rr.efficiency);
        s.rewards.push(rr.record.reward);
        s.balances.push(rr.record.balance);
        s.rank_numbers.push(rr.rank_number as f64);
        if rr.percentile_rank >= TOP_DECILE {
            s.top_decile_months += 1;
        }
    }

    let res: Vec<ParticipantAggregate> = samples
        .into_iter()
        .map(|(participant, mut s)| {
            for v in [
                &mut s.rates,
                &mut s.rewards,
                &mut s.balances,
                &mut s.rank_numbers,
            ] {
                v.sort_by(|a, b| a.total_cmp(b));
            }
            // A participant never in the top decile keeps a count of zero.
            ParticipantAggregate {
                participant: participant.to_string(),
                avg_rate: mean(&s.rates),
                med_rate: median(&s.rates),
                best_rate: s.rates.last().cloned().unwrap_or(0.0),
                months_participated: s.rates.len() as u32,
                sum_total_rewards: s.rewards.iter().sum(),
                avg_total_rewards: mean(&s.rewards),
                med_total_rewards: median(&s.rewards),
                sum_balance: s.balances.iter().sum(),
                avg_balance: mean(&s.balances),
                med_balance: median(&s.balances),
                top_decile_months: s.top_decile_months,
                avg_rank_number: mean(&s.rank_numbers),
                med_rank_number: median(&s.rank_numbers),
            }
        })
        .collect();
    info!("aggregate: {} participants", res.len());
    Ok(res)
}

/// Runs the ranking and the aggregation on a set of records.
pub fn run_metrics(records: &[PeriodRecord]) -> Result<Vec<ParticipantAggregate>, MetricErrors> {
    info!("Processing {:?} period records", records.len());
    let ranked = rank_periods(records);
    aggregate(&ranked)
}

// Both expect sorted, possibly empty, samples.
fn mean(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.iter().sum::<f64>() / sorted.len() as f64
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

// **** Reports ****

/// Builds all the reports, in the order of [`ReportKind::ALL`].
pub fn build_reports(
    aggregates: &[ParticipantAggregate],
    thresholds: &ReportThresholds,
) -> Vec<Report> {
    ReportKind::ALL
        .iter()
        .map(|kind| build_report(*kind, aggregates, thresholds))
        .collect()
}

/// Filters, sorts and truncates the aggregates for one report.
///
/// The sort is stable: participants with the same key keep their input order.
pub fn build_report(
    kind: ReportKind,
    aggregates: &[ParticipantAggregate],
    thresholds: &ReportThresholds,
) -> Report {
    let regular = |a: &ParticipantAggregate| a.months_participated >= thresholds.min_periods;
    let high_balance = |a: &ParticipantAggregate| a.avg_balance > thresholds.balance_threshold;

    let mut rows: Vec<ParticipantAggregate> = aggregates
        .iter()
        .filter(|a| match kind {
            ReportKind::AverageEarnRate
            | ReportKind::AverageMonthlyRank
            | ReportKind::MedianMonthlyRank => regular(a),
            ReportKind::Consistency => true,
            ReportKind::HighBalanceByAvgRate | ReportKind::HighBalanceByAvgRank => {
                high_balance(a)
            }
        })
        .cloned()
        .collect();

    let descending = |x: f64, y: f64| -> Ordering { y.total_cmp(&x) };
    rows.sort_by(|a, b| match kind {
        ReportKind::AverageEarnRate | ReportKind::HighBalanceByAvgRate => {
            descending(a.avg_rate, b.avg_rate)
        }
        ReportKind::Consistency => b.top_decile_months.cmp(&a.top_decile_months),
        ReportKind::AverageMonthlyRank | ReportKind::HighBalanceByAvgRank => {
            a.avg_rank_number.total_cmp(&b.avg_rank_number)
        }
        ReportKind::MedianMonthlyRank => a.med_rank_number.total_cmp(&b.med_rank_number),
    });
    debug!(
        "build_report: {}: {} eligible participants",
        kind.name(),
        rows.len()
    );
    rows.truncate(thresholds.max_rows);
    Report { kind, rows }
}
