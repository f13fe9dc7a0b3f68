// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One participant in one period, after cleaning.
///
/// In most cases, it is easier to go through the [`crate::builder::Builder`], which
/// checks the invariants of the record before accepting it.
#[derive(PartialEq, Debug, Clone)]
pub struct PeriodRecord {
    pub participant: String,
    /// The name of the period (the sheet of the leaderboard).
    pub period: String,
    pub reward: f64,
    /// Never zero.
    pub balance: f64,
}

impl PeriodRecord {
    pub fn efficiency(&self) -> f64 {
        crate::efficiency(self.reward, self.balance)
    }
}

// ******** Output data structures *********

/// A period record with its position among the other participants of the same period.
#[derive(PartialEq, Debug, Clone)]
pub struct RankedRecord {
    pub record: PeriodRecord,
    pub efficiency: f64,
    /// Percentile rank, ascending by efficiency, in (0, 1]. Ties get the average rank.
    pub percentile_rank: f64,
    /// Competition rank, descending by efficiency: 1 is the best. Ties share the lowest rank.
    pub rank_number: u32,
}

/// The statistics of one participant across all the periods.
#[derive(PartialEq, Debug, Clone)]
pub struct ParticipantAggregate {
    pub participant: String,
    pub avg_rate: f64,
    pub med_rate: f64,
    pub best_rate: f64,
    pub months_participated: u32,
    pub sum_total_rewards: f64,
    pub avg_total_rewards: f64,
    pub med_total_rewards: f64,
    pub sum_balance: f64,
    pub avg_balance: f64,
    pub med_balance: f64,
    pub top_decile_months: u32,
    pub avg_rank_number: f64,
    pub med_rank_number: f64,
}

/// Errors that prevent the metrics from being computed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MetricErrors {
    /// No record at all was provided.
    EmptyRun,
    EmptyParticipant { period: String },
    ZeroBalance { participant: String, period: String },
    NonFiniteValue { participant: String, period: String },
    /// The participant already has a record for this period.
    DuplicateParticipant { participant: String, period: String },
}

impl Error for MetricErrors {}

impl Display for MetricErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricErrors::EmptyRun => write!(f, "no valid record in any period"),
            MetricErrors::EmptyParticipant { period } => {
                write!(f, "empty participant identifier in period {}", period)
            }
            MetricErrors::ZeroBalance {
                participant,
                period,
            } => write!(f, "zero balance for {} in period {}", participant, period),
            MetricErrors::NonFiniteValue {
                participant,
                period,
            } => write!(
                f,
                "non-finite reward or balance for {} in period {}",
                participant, period
            ),
            MetricErrors::DuplicateParticipant {
                participant,
                period,
            } => write!(f, "{} appears more than once in period {}", participant, period),
        }
    }
}

// ********* Reports **********

/// The filters applied before ranking the participants.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ReportThresholds {
    /// Minimum number of periods for the reports restricted to regular participants.
    pub min_periods: u32,
    /// The average balance must be strictly above this value for the high-balance reports.
    pub balance_threshold: f64,
    /// Maximum number of rows in each report.
    pub max_rows: usize,
}

impl ReportThresholds {
    pub const DEFAULT_THRESHOLDS: ReportThresholds = ReportThresholds {
        min_periods: 4,
        balance_threshold: 80_000.0,
        max_rows: 100,
    };
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ReportKind {
    AverageEarnRate,
    Consistency,
    AverageMonthlyRank,
    HighBalanceByAvgRate,
    HighBalanceByAvgRank,
    /// Not one of the five historical extracts: added as the median counterpart of
    /// `AverageMonthlyRank`, which is less sensitive to a single bad period.
    MedianMonthlyRank,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::AverageEarnRate,
        ReportKind::Consistency,
        ReportKind::AverageMonthlyRank,
        ReportKind::HighBalanceByAvgRate,
        ReportKind::HighBalanceByAvgRank,
        ReportKind::MedianMonthlyRank,
    ];

    /// The name of the report, also used as the stem of the exported file.
    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::AverageEarnRate => "top_by_average_earn_rate",
            ReportKind::Consistency => "top_by_consistency",
            ReportKind::AverageMonthlyRank => "top_by_average_monthly_rank",
            ReportKind::HighBalanceByAvgRate => "top_high_vependle_by_avg_rate",
            ReportKind::HighBalanceByAvgRank => "top_high_vependle_by_avg_rank",
            ReportKind::MedianMonthlyRank => "top_by_median_monthly_rank",
        }
    }

    pub fn description(&self, thresholds: &ReportThresholds) -> String {
        match self {
            ReportKind::AverageEarnRate => format!(
                "Top by average earn rate (min {} months participation)",
                thresholds.min_periods
            ),
            ReportKind::Consistency => {
                "Top by consistency (months in top 10% by earn rate percentile)".to_string()
            }
            ReportKind::AverageMonthlyRank => format!(
                "Top by average monthly rank number (min {} months participation, lower is better)",
                thresholds.min_periods
            ),
            ReportKind::HighBalanceByAvgRate => format!(
                "Top by average earn rate (avg balance > {})",
                thresholds.balance_threshold
            ),
            ReportKind::HighBalanceByAvgRank => format!(
                "Top by average monthly rank number (avg balance > {}, lower is better)",
                thresholds.balance_threshold
            ),
            ReportKind::MedianMonthlyRank => format!(
                "Top by median monthly rank number (min {} months participation, lower is better)",
                thresholds.min_periods
            ),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub rows: Vec<ParticipantAggregate>,
}
