use anyhow::{bail, Result};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Market-price table covering the whole simulation horizon.
///
/// The raw vendor columns stay in the polars frame; the parsed row timestamps are
/// kept alongside so day slicing never re-parses. Rows are ordered by strictly
/// increasing timestamp (the loader sorts and enforces this).
#[derive(Debug, Clone)]
pub struct PriceTable {
    pub frame: DataFrame,
    pub timestamps: Vec<NaiveDateTime>,
}

impl PriceTable {
    pub fn new(frame: DataFrame, timestamps: Vec<NaiveDateTime>) -> Result<Self> {
        if frame.height() != timestamps.len() {
            bail!(
                "price table has {} rows but {} timestamps",
                frame.height(),
                timestamps.len()
            );
        }
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            bail!("price table timestamps must be strictly increasing");
        }
        Ok(Self { frame, timestamps })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Per-day clearing prices, one entry per settlement interval.
///
/// A product whose column is absent from the input is `None`; downstream
/// computations treat an absent series as an all-zero contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketPrices {
    pub timestamps: Vec<NaiveDateTime>,
    pub energy: Option<Vec<f64>>,
    pub fcr: Option<Vec<f64>>,
    pub afrr_up: Option<Vec<f64>>,
    pub afrr_down: Option<Vec<f64>>,
}

impl MarketPrices {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Interval length in hours, from the first two timestamps (uniform-step
    /// assumption). `None` for days with fewer than two intervals.
    pub fn step_hours(&self) -> Option<f64> {
        if self.timestamps.len() < 2 {
            return None;
        }
        let step = self.timestamps[1] - self.timestamps[0];
        Some(step.num_seconds() as f64 / 3600.0)
    }

    /// Whether all intervals are spaced exactly like the first one.
    pub fn has_uniform_step(&self) -> bool {
        if self.timestamps.len() < 2 {
            return true;
        }
        let step = self.timestamps[1] - self.timestamps[0];
        self.timestamps.windows(2).all(|w| w[1] - w[0] == step)
    }
}

/// One day's dispatch plan, index-aligned with its `MarketPrices`.
///
/// Reserve commitments and realized activations are optional: strategies that do
/// not participate in a product simply carry no series for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchSchedule {
    pub discharge_mw: Vec<f64>,
    pub charge_mw: Vec<f64>,
    pub soc_mwh: Vec<f64>,
    pub fcr_mw: Option<Vec<f64>>,
    pub afrr_up_mw: Option<Vec<f64>>,
    pub afrr_down_mw: Option<Vec<f64>>,
    pub activation_up_mw: Option<Vec<f64>>,
    pub activation_down_mw: Option<Vec<f64>>,
}

impl DispatchSchedule {
    /// All-zero schedule without any reserve participation.
    pub fn idle(intervals: usize) -> Self {
        Self {
            discharge_mw: vec![0.0; intervals],
            charge_mw: vec![0.0; intervals],
            soc_mwh: vec![0.0; intervals],
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.discharge_mw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discharge_mw.is_empty()
    }
}

/// Solved outcome of one simulated day: the prices the optimizer saw and the
/// schedule it produced. The energy-price series may later be replaced by the
/// reconciliation step; nothing else is mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySolution {
    pub date: NaiveDate,
    pub prices: MarketPrices,
    pub schedule: DispatchSchedule,
}

/// Ordered per-day outcomes of one named strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub days: Vec<DaySolution>,
}

impl ScenarioResult {
    pub fn new(scenario: impl Into<String>, days: Vec<DaySolution>) -> Self {
        Self {
            scenario: scenario.into(),
            days,
        }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use polars::prelude::*;

    fn day_timestamps(date: NaiveDate, intervals: usize, step_min: i64) -> Vec<NaiveDateTime> {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap();
        (0..intervals)
            .map(|i| midnight + chrono::Duration::minutes(step_min * i as i64))
            .collect()
    }

    #[test]
    fn test_step_hours_quarter_hourly() {
        let prices = MarketPrices {
            timestamps: day_timestamps(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), 96, 15),
            energy: None,
            fcr: None,
            afrr_up: None,
            afrr_down: None,
        };
        assert_eq!(prices.step_hours(), Some(0.25));
        assert!(prices.has_uniform_step());
    }

    #[test]
    fn test_step_hours_needs_two_intervals() {
        let prices = MarketPrices {
            timestamps: day_timestamps(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), 1, 60),
            energy: Some(vec![42.0]),
            fcr: None,
            afrr_up: None,
            afrr_down: None,
        };
        assert_eq!(prices.step_hours(), None);
    }

    #[test]
    fn test_non_uniform_step_detected() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let mut timestamps = day_timestamps(date, 3, 60);
        timestamps[2] += chrono::Duration::minutes(30);
        let prices = MarketPrices {
            timestamps,
            energy: None,
            fcr: None,
            afrr_up: None,
            afrr_down: None,
        };
        assert!(!prices.has_uniform_step());
    }

    #[test]
    fn test_idle_schedule_has_no_reserve_series() {
        let schedule = DispatchSchedule::idle(24);
        assert_eq!(schedule.len(), 24);
        assert!(schedule.fcr_mw.is_none());
        assert!(schedule.activation_up_mw.is_none());
        assert!(schedule.discharge_mw.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_price_table_rejects_row_mismatch() {
        let frame = DataFrame::new(vec![Series::new("price", vec![1.0, 2.0, 3.0])]).unwrap();
        let timestamps = day_timestamps(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), 2, 60);
        assert!(PriceTable::new(frame, timestamps).is_err());
    }

    #[test]
    fn test_price_table_rejects_unordered_timestamps() {
        let frame = DataFrame::new(vec![Series::new("price", vec![1.0, 2.0])]).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let timestamps = vec![
            date.and_hms_opt(1, 0, 0).unwrap(),
            date.and_hms_opt(0, 0, 0).unwrap(),
        ];
        assert!(PriceTable::new(frame, timestamps).is_err());
    }
}
