use regex::Regex;

use reward_metrics::builder::Builder;

use crate::leaderboard::io_common::cell_number;
use crate::leaderboard::*;

/// How the raw values of a worksheet are turned into period records.
#[derive(Debug, Clone)]
pub struct CleaningRules {
    /// The identifier is the first capture group of this pattern (or the whole match).
    pub identifier: Regex,
    /// Unit label at the end of the rewards, for example " ETH".
    pub reward_suffix: String,
}

impl CleaningRules {
    pub fn new(identifier_pattern: &str, reward_suffix: &str) -> LeaderboardResult<CleaningRules> {
        let identifier = Regex::new(identifier_pattern).context(InvalidPatternSnafu {
            pattern: identifier_pattern,
        })?;
        Ok(CleaningRules {
            identifier,
            reward_suffix: reward_suffix.to_string(),
        })
    }
}

/// What happened to the rows of one worksheet.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SheetSummary {
    pub kept: usize,
    pub missing_identifier: usize,
    pub invalid_reward: usize,
    pub invalid_balance: usize,
    pub zero_balance: usize,
    pub duplicates: usize,
    /// Rows refused by the builder for any other reason.
    pub rejected: usize,
}

impl SheetSummary {
    pub fn dropped(&self) -> usize {
        self.missing_identifier
            + self.invalid_reward
            + self.invalid_balance
            + self.zero_balance
            + self.duplicates
            + self.rejected
    }

    /// Counts a row refused by the builder under the matching reason.
    pub fn count_rejection(&mut self, err: &MetricErrors) {
        match err {
            MetricErrors::EmptyParticipant { .. } => self.missing_identifier += 1,
            MetricErrors::ZeroBalance { .. } => self.zero_balance += 1,
            MetricErrors::DuplicateParticipant { .. } => self.duplicates += 1,
            MetricErrors::NonFiniteValue { .. } | MetricErrors::EmptyRun => self.rejected += 1,
        }
    }
}

pub fn extract_identifier(raw: &str, pattern: &Regex) -> Option<String> {
    let caps = pattern.captures(raw)?;
    let m = caps.get(1).or_else(|| caps.get(0))?;
    if m.as_str().is_empty() {
        None
    } else {
        Some(m.as_str().to_string())
    }
}

/// The reward of a row. Text values may end with the unit suffix.
pub fn parse_reward(cell: &DataType, suffix: &str) -> Option<f64> {
    match cell {
        DataType::String(s) => {
            let t = s.trim();
            let t = t.strip_suffix(suffix).unwrap_or(t);
            cell_number(&DataType::String(t.to_string()))
        }
        _ => cell_number(cell),
    }
}

pub fn parse_balance(cell: &DataType) -> Option<f64> {
    cell_number(cell)
}

/// Validates the rows of a worksheet and adds the valid ones to the builder.
///
/// The identifier, the reward and the balance are checked in this order, and the first
/// failure decides why a row is dropped.
pub fn clean_sheet(sheet: &LoadedSheet, rules: &CleaningRules, builder: &mut Builder) -> SheetSummary {
    let mut summary = SheetSummary::default();
    if sheet.rows.is_empty() {
        info!(
            "Sheet {:?} is empty or was skipped. Skipping processing.",
            sheet.name
        );
        return summary;
    }

    for row in sheet.rows.iter() {
        let participant = match row
            .user
            .as_deref()
            .and_then(|u| extract_identifier(u, &rules.identifier))
        {
            Some(p) => p,
            None => {
                debug!(
                    "clean_sheet: {:?} line {} (rank {:?}): no identifier in {:?}",
                    sheet.name, row.lineno, row.rank, row.user
                );
                summary.missing_identifier += 1;
                continue;
            }
        };
        let reward = match parse_reward(&row.total_rewards, &rules.reward_suffix) {
            Some(x) => x,
            None => {
                debug!(
                    "clean_sheet: {:?} line {}: invalid reward {:?}",
                    sheet.name, row.lineno, row.total_rewards
                );
                summary.invalid_reward += 1;
                continue;
            }
        };
        let balance = match parse_balance(&row.balance) {
            Some(x) => x,
            None => {
                debug!(
                    "clean_sheet: {:?} line {}: invalid balance {:?}",
                    sheet.name, row.lineno, row.balance
                );
                summary.invalid_balance += 1;
                continue;
            }
        };
        match builder.add_record(&participant, &sheet.name, reward, balance) {
            Ok(()) => summary.kept += 1,
            Err(e) => {
                match e {
                    MetricErrors::ZeroBalance { .. } => debug!(
                        "clean_sheet: {:?} line {}: zero balance",
                        sheet.name, row.lineno
                    ),
                    MetricErrors::DuplicateParticipant { .. } => warn!(
                        "Sheet {:?} line {}: {} already appears in this sheet, keeping the first row",
                        sheet.name, row.lineno, participant
                    ),
                    _ => warn!("Sheet {:?} line {}: {}", sheet.name, row.lineno, e),
                }
                summary.count_rejection(&e);
            }
        }
    }

    if summary.kept == 0 {
        warn!(
            "No valid data in sheet {:?} after cleaning: {} rows without identifier, {} invalid rewards, {} invalid balances, {} zero balances, {} other rejections.",
            sheet.name,
            summary.missing_identifier,
            summary.invalid_reward,
            summary.invalid_balance,
            summary.zero_balance,
            summary.duplicates + summary.rejected
        );
    } else {
        info!(
            "Sheet {:?}: {} valid rows, {} dropped",
            sheet.name,
            summary.kept,
            summary.dropped()
        );
    }
    summary
}
