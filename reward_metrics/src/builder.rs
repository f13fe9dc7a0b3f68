use std::collections::HashSet;

use log::debug;

pub use crate::config::*;

/// A builder for collecting the period records of a run.
///
/// This is the place where records are validated: a record that is accepted by the
/// builder can always be ranked and aggregated.
///
/// ```
/// use reward_metrics::builder::Builder;
/// use reward_metrics::{MetricErrors, ReportThresholds};
///
/// let mut builder = Builder::new();
/// builder.add_record("0xabc", "May", 10.0, 1000.0)?;
/// builder.add_record("0xdef", "May", 5.0, 1000.0)?;
///
/// let aggregates = builder.aggregate()?;
/// assert_eq!(aggregates[0].avg_rate, 10.0);
/// # Ok::<(), MetricErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _records: Vec<PeriodRecord>,
    pub(crate) _seen: HashSet<(String, String)>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Adds the reward and the balance of a participant for a period.
    ///
    /// The record is rejected if the participant is empty, if a value is not finite,
    /// if the balance is zero, or if the participant already has a record for this period.
    pub fn add_record(
        &mut self,
        participant: &str,
        period: &str,
        reward: f64,
        balance: f64,
    ) -> Result<(), MetricErrors> {
        if participant.is_empty() {
            return Err(MetricErrors::EmptyParticipant {
                period: period.to_string(),
            });
        }
        if !reward.is_finite() || !balance.is_finite() {
            return Err(MetricErrors::NonFiniteValue {
                participant: participant.to_string(),
                period: period.to_string(),
            });
        }
        if balance == 0.0 {
            return Err(MetricErrors::ZeroBalance {
                participant: participant.to_string(),
                period: period.to_string(),
            });
        }
        let key = (participant.to_string(), period.to_string());
        if self._seen.contains(&key) {
            return Err(MetricErrors::DuplicateParticipant {
                participant: key.0,
                period: key.1,
            });
        }
        debug!(
            "add_record: {} {}: reward {} balance {}",
            participant, period, reward, balance
        );
        self._seen.insert(key);
        self._records.push(PeriodRecord {
            participant: participant.to_string(),
            period: period.to_string(),
            reward,
            balance,
        });
        Ok(())
    }

    pub fn records(&self) -> &[PeriodRecord] {
        &self._records
    }

    pub fn len(&self) -> usize {
        self._records.len()
    }

    pub fn is_empty(&self) -> bool {
        self._records.is_empty()
    }

    pub fn ranked(&self) -> Vec<RankedRecord> {
        crate::rank_periods(&self._records)
    }

    pub fn aggregate(&self) -> Result<Vec<ParticipantAggregate>, MetricErrors> {
        crate::run_metrics(&self._records)
    }
}
