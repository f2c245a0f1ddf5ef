use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use log::{info, warn};

use crate::models::{DaySolution, ScenarioResult};

/// How days of the two scenario results are paired before prices are copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlignmentMode {
    /// Join days by calendar date and report the asymmetries.
    #[default]
    DateJoin,
    /// Pair days by sequence position; a position whose dates differ is
    /// skipped with a warning.
    Positional,
}

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Days whose energy prices were overwritten.
    pub replaced: usize,
    /// Target dates with no counterpart in the baseline.
    pub missing_in_baseline: Vec<NaiveDate>,
    /// Baseline dates no target day consumed.
    pub unused_baseline: Vec<NaiveDate>,
    /// Paired days left untouched: a positional date mismatch, a missing
    /// baseline energy series, or an interval-count difference.
    pub skipped: usize,
}

/// Overwrite `target`'s per-day energy prices with the ones `baseline` was
/// settled against, leaving schedules and reserve prices alone.
///
/// A scenario optimized against rewritten prices must still be settled at the
/// real market price; the baseline result carries that price day by day.
/// Days that cannot be paired stay as they are, recorded in the report.
pub fn overwrite_energy_prices(
    target: &mut ScenarioResult,
    baseline: &ScenarioResult,
    mode: AlignmentMode,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let scenario = target.scenario.clone();

    match mode {
        AlignmentMode::DateJoin => {
            let by_date: HashMap<NaiveDate, &DaySolution> =
                baseline.days.iter().map(|day| (day.date, day)).collect();
            for day in &mut target.days {
                match by_date.get(&day.date) {
                    Some(source) => copy_energy(day, source, &mut report),
                    None => {
                        warn!(
                            "'{}': no '{}' day for {}; prices left as optimized",
                            scenario, baseline.scenario, day.date
                        );
                        report.missing_in_baseline.push(day.date);
                    }
                }
            }
            let target_dates: HashSet<NaiveDate> =
                target.days.iter().map(|day| day.date).collect();
            for day in &baseline.days {
                if !target_dates.contains(&day.date) {
                    report.unused_baseline.push(day.date);
                }
            }
            if !report.unused_baseline.is_empty() {
                warn!(
                    "'{}' solved {} day(s) that '{}' did not",
                    baseline.scenario,
                    report.unused_baseline.len(),
                    scenario
                );
            }
        }
        AlignmentMode::Positional => {
            // days beyond the shorter sequence stay untouched
            for (index, (day, source)) in
                target.days.iter_mut().zip(baseline.days.iter()).enumerate()
            {
                if day.date == source.date {
                    copy_energy(day, source, &mut report);
                } else {
                    warn!(
                        "position {}: dates {} and {} differ; day skipped",
                        index, day.date, source.date
                    );
                    report.skipped += 1;
                }
            }
        }
    }

    info!(
        "reconciled {} of {} '{}' day(s) against '{}'",
        report.replaced,
        target.len(),
        scenario,
        baseline.scenario
    );
    report
}

fn copy_energy(day: &mut DaySolution, source: &DaySolution, report: &mut ReconcileReport) {
    match &source.prices.energy {
        Some(energy) if energy.len() == day.prices.len() => {
            day.prices.energy = Some(energy.clone());
            report.replaced += 1;
        }
        Some(energy) => {
            warn!(
                "{}: interval counts differ ({} vs {}); day skipped",
                day.date,
                day.prices.len(),
                energy.len()
            );
            report.skipped += 1;
        }
        None => {
            warn!("{}: baseline carries no energy prices; day skipped", day.date);
            report.skipped += 1;
        }
    }
}
