use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::{DaySolution, ScenarioResult};

/// Revenue breakdown of one scenario over its whole simulation window.
///
/// `total_revenue` is always the sum of the energy and reserve legs;
/// `equivalent_cycles` is the discharged volume normalized by the usable
/// capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub scenario: String,
    pub total_revenue: f64,
    pub energy_revenue: f64,
    pub reserve_revenue: f64,
    pub discharged_mwh: f64,
    pub equivalent_cycles: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct DayRevenue {
    energy: f64,
    reserve: f64,
    discharged_mwh: f64,
}

fn series_at(series: &Option<Vec<f64>>, i: usize) -> f64 {
    series.as_ref().and_then(|v| v.get(i)).copied().unwrap_or(0.0)
}

/// Settle one day: energy leg on the net flow, reserve leg on the committed
/// capacities. Interval length comes from the day's own timestamps. Absent
/// series count as zero, so partial schemas settle the same way everywhere.
fn day_revenue(day: &DaySolution) -> DayRevenue {
    let dt_hours = match day.prices.step_hours() {
        Some(dt) => dt,
        None => {
            warn!(
                "{}: fewer than two intervals; day contributes zero revenue",
                day.date
            );
            return DayRevenue::default();
        }
    };
    if day.prices.len() != day.schedule.len() {
        warn!(
            "{}: schedule has {} intervals but prices have {}; settling the overlap",
            day.date,
            day.schedule.len(),
            day.prices.len()
        );
    }
    let n = day.prices.len().min(day.schedule.len());

    let mut energy = 0.0;
    let mut reserve = 0.0;
    let mut discharged = 0.0;
    for i in 0..n {
        let discharge = day.schedule.discharge_mw[i];
        let charge = day.schedule.charge_mw[i];
        let activation_up = series_at(&day.schedule.activation_up_mw, i);
        let activation_down = series_at(&day.schedule.activation_down_mw, i);

        let net_flow = discharge - charge + activation_up - activation_down;
        energy += net_flow * series_at(&day.prices.energy, i);
        reserve += series_at(&day.schedule.fcr_mw, i) * series_at(&day.prices.fcr, i)
            + series_at(&day.schedule.afrr_up_mw, i) * series_at(&day.prices.afrr_up, i)
            + series_at(&day.schedule.afrr_down_mw, i) * series_at(&day.prices.afrr_down, i);
        discharged += discharge + activation_up;
    }

    DayRevenue {
        energy: energy * dt_hours,
        reserve: reserve * dt_hours,
        discharged_mwh: discharged * dt_hours,
    }
}

/// Aggregate a scenario result into a financial summary.
///
/// Returns `None` for a result with no solved days; a summary of zeros would
/// read as "ran and earned nothing", which is a different statement.
pub fn calculate_financials(result: &ScenarioResult, e_max_mwh: f64) -> Option<FinancialSummary> {
    if result.is_empty() {
        warn!(
            "scenario '{}' solved no days; no financial summary",
            result.scenario
        );
        return None;
    }

    let mut energy = 0.0;
    let mut reserve = 0.0;
    let mut discharged = 0.0;
    for day in &result.days {
        let revenue = day_revenue(day);
        energy += revenue.energy;
        reserve += revenue.reserve;
        discharged += revenue.discharged_mwh;
    }

    let equivalent_cycles = if e_max_mwh > 0.0 {
        discharged / e_max_mwh
    } else {
        0.0
    };

    Some(FinancialSummary {
        scenario: result.scenario.clone(),
        total_revenue: energy + reserve,
        energy_revenue: energy,
        reserve_revenue: reserve,
        discharged_mwh: discharged,
        equivalent_cycles,
    })
}

/// Per-day net revenue of a scenario, ascending by date. Feeds the PnL chart
/// and any downstream per-day comparison.
pub fn daily_pnl_series(result: &ScenarioResult) -> Vec<(NaiveDate, f64)> {
    let mut series: Vec<(NaiveDate, f64)> = result
        .days
        .iter()
        .map(|day| {
            let revenue = day_revenue(day);
            (day.date, revenue.energy + revenue.reserve)
        })
        .collect();
    series.sort_by_key(|(date, _)| *date);
    series
}
