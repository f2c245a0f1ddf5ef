use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Closed calendar-date range for one simulation run.
///
/// Validated at configuration load: both bounds must be valid ISO dates and
/// `start_date <= end_date`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        let range = Self {
            start_date,
            end_date,
        };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            bail!(
                "run window start {} is after end {}",
                self.start_date,
                self.end_date
            );
        }
        Ok(())
    }

    /// All dates in the range, ascending, both ends included.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = self.start_date;
        while current <= self.end_date {
            days.push(current);
            current = current + Duration::days(1);
        }
        days
    }

    pub fn num_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Mapping from logical market product to the column name used in the price table.
///
/// Everything past the loading boundary addresses products through this mapping,
/// so the rest of the pipeline stays agnostic of vendor column naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceColumns {
    pub energy: String,
    pub fcr: String,
    pub afrr_up: String,
    pub afrr_down: String,
}

impl PriceColumns {
    /// Column names of the capacity-remunerated reserve products.
    pub fn reserve_names(&self) -> [&str; 3] {
        [&self.fcr, &self.afrr_up, &self.afrr_down]
    }
}

fn default_round_trip_efficiency() -> f64 {
    0.85
}

fn default_initial_soc_frac() -> f64 {
    0.5
}

/// Physical parameters of the storage asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryParams {
    /// Usable capacity in MWh. Zero (or absent) disables the cycle-count metric.
    #[serde(default)]
    pub e_max_mwh: f64,
    /// Symmetric power limit in MW. Defaults to a two-hour asset (e_max / 2).
    #[serde(default)]
    pub p_max_mw: Option<f64>,
    #[serde(default = "default_round_trip_efficiency")]
    pub round_trip_efficiency: f64,
    /// State of charge at the start of every simulated day, as a fraction of e_max.
    #[serde(default = "default_initial_soc_frac")]
    pub initial_soc_frac: f64,
}

impl BatteryParams {
    pub fn power_limit_mw(&self) -> f64 {
        self.p_max_mw.unwrap_or(self.e_max_mwh / 2.0)
    }

    pub fn one_way_efficiency(&self) -> f64 {
        self.round_trip_efficiency.sqrt()
    }

    pub fn initial_soc_mwh(&self) -> f64 {
        self.e_max_mwh * self.initial_soc_frac
    }
}

fn default_price_csv() -> String {
    "data/prices.csv".to_string()
}

fn default_timestamp_column() -> String {
    "timestamp".to_string()
}

/// Location and shape of the market-price input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSection {
    #[serde(default = "default_price_csv")]
    pub price_csv: String,
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            price_csv: default_price_csv(),
            timestamp_column: default_timestamp_column(),
        }
    }
}

fn default_min_spread() -> f64 {
    5.0
}

fn default_activation_rate() -> f64 {
    0.1
}

/// Tuning knobs for the reference dispatch engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineParams {
    /// Minimum daily price spread (EUR/MWh) before the engine arbitrages at all.
    #[serde(default = "default_min_spread")]
    pub min_spread_eur_mwh: f64,
    /// Fraction of committed aFRR capacity assumed to be activated each interval.
    #[serde(default = "default_activation_rate")]
    pub afrr_activation_rate: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            min_spread_eur_mwh: default_min_spread(),
            afrr_activation_rate: default_activation_rate(),
        }
    }
}

/// Immutable run configuration, read once from JSON at startup.
///
/// The `run`, `columns` and `battery` sections are the required surface; `data`
/// and `engine` fall back to defaults so minimal configuration files stay valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub run: DateRange,
    pub columns: PriceColumns,
    pub battery: BatteryParams,
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub engine: EngineParams,
}

impl RunConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration file {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&text).context("parsing run configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.run.validate()?;
        if self.battery.e_max_mwh < 0.0 {
            bail!("battery.e_max_mwh must be non-negative");
        }
        if let Some(p_max) = self.battery.p_max_mw {
            if p_max < 0.0 {
                bail!("battery.p_max_mw must be non-negative");
            }
        }
        if self.battery.round_trip_efficiency <= 0.0 || self.battery.round_trip_efficiency > 1.0 {
            bail!("battery.round_trip_efficiency must be in (0, 1]");
        }
        if self.battery.initial_soc_frac < 0.0 || self.battery.initial_soc_frac > 1.0 {
            bail!("battery.initial_soc_frac must be in [0, 1]");
        }
        if self.engine.afrr_activation_rate < 0.0 || self.engine.afrr_activation_rate > 1.0 {
            bail!("engine.afrr_activation_rate must be in [0, 1]");
        }
        Ok(())
    }
}
