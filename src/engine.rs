use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};

use crate::config::RunConfig;
use crate::data_loader::day_slice;
use crate::models::{DaySolution, DispatchSchedule, MarketPrices, PriceTable};

/// A dispatch optimizer that turns a price table into per-day schedules.
///
/// One engine instance is built per scenario and owns its copy of the horizon
/// price table; scenario modifiers rewrite that copy through
/// `price_table_mut` before `run` is called.
pub trait DispatchEngine {
    fn price_table(&self) -> &PriceTable;

    fn price_table_mut(&mut self) -> &mut PriceTable;

    /// Solve the configured window, one solution per feasible day, ascending
    /// by date. A day the engine cannot solve is skipped with a warning,
    /// never an error.
    fn run(&mut self) -> Result<Vec<DaySolution>>;
}

/// Reference engine: greedy percentile-threshold dispatch.
///
/// Energy arbitrage takes the battery power first (discharge into the top
/// price decile, charge from the bottom one), then the leftover headroom is
/// committed to the single most valuable reserve product of the interval.
/// Committed aFRR capacity realizes activation energy at the configured rate;
/// FCR is treated as energy neutral.
pub struct GreedyDispatchEngine {
    config: RunConfig,
    table: PriceTable,
}

impl GreedyDispatchEngine {
    pub fn new(config: &RunConfig, table: PriceTable) -> Self {
        Self {
            config: config.clone(),
            table,
        }
    }

    fn solve_day(&self, prices: &MarketPrices) -> DispatchSchedule {
        let battery = &self.config.battery;
        let params = &self.config.engine;
        let n = prices.len();
        let dt_hours = prices.step_hours().unwrap_or(1.0);
        let p_max = battery.power_limit_mw();
        let e_max = battery.e_max_mwh;
        let one_way = battery.one_way_efficiency();

        let energy_prices: Vec<f64> = match &prices.energy {
            Some(values) => values.clone(),
            None => vec![0.0; n],
        };

        let mut sorted = energy_prices.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let p10 = sorted[n / 10];
        let p90 = sorted[n * 9 / 10];
        let arbitrage_active = (p90 - p10) >= params.min_spread_eur_mwh;

        let mut discharge = vec![0.0; n];
        let mut charge = vec![0.0; n];
        let mut soc_series = vec![0.0; n];
        let mut fcr = vec![0.0; n];
        let mut afrr_up = vec![0.0; n];
        let mut afrr_down = vec![0.0; n];
        let mut activation_up = vec![0.0; n];
        let mut activation_down = vec![0.0; n];

        let mut soc = battery.initial_soc_mwh().clamp(0.0, e_max);

        for i in 0..n {
            let price = energy_prices[i];

            // Energy arbitrage takes the power first
            if arbitrage_active && price >= p90 && price > p10 && soc > 0.0 {
                let power = p_max.min(soc * one_way / dt_hours);
                discharge[i] = power;
                soc -= power * dt_hours / one_way;
            } else if arbitrage_active && price <= p10 && price < p90 && soc < e_max {
                let power = p_max.min((e_max - soc) / (one_way * dt_hours));
                charge[i] = power;
                soc += power * dt_hours * one_way;
            }

            // Leftover headroom goes to the most valuable reserve product
            let headroom_up = (p_max - discharge[i]).max(0.0);
            let headroom_down = (p_max - charge[i]).max(0.0);
            let symmetric = headroom_up.min(headroom_down);
            let fcr_price = price_at(&prices.fcr, i);
            let up_price = price_at(&prices.afrr_up, i);
            let down_price = price_at(&prices.afrr_down, i);

            if fcr_price > 0.0 && fcr_price >= up_price && fcr_price >= down_price && symmetric > 0.0
            {
                fcr[i] = symmetric;
            } else if up_price > 0.0 && up_price >= down_price && headroom_up > 0.0 && soc > 0.0 {
                afrr_up[i] = headroom_up;
                activation_up[i] = headroom_up * params.afrr_activation_rate;
                soc -= activation_up[i] * dt_hours / one_way;
            } else if down_price > 0.0 && headroom_down > 0.0 && soc < e_max {
                afrr_down[i] = headroom_down;
                activation_down[i] = headroom_down * params.afrr_activation_rate;
                soc += activation_down[i] * dt_hours * one_way;
            }

            soc = soc.clamp(0.0, e_max);
            soc_series[i] = soc;
        }

        let any_reserve = fcr
            .iter()
            .chain(afrr_up.iter())
            .chain(afrr_down.iter())
            .any(|&c| c > 0.0);

        let mut schedule = DispatchSchedule {
            discharge_mw: discharge,
            charge_mw: charge,
            soc_mwh: soc_series,
            ..Default::default()
        };
        if any_reserve {
            schedule.fcr_mw = Some(fcr);
            schedule.afrr_up_mw = Some(afrr_up);
            schedule.afrr_down_mw = Some(afrr_down);
            schedule.activation_up_mw = Some(activation_up);
            schedule.activation_down_mw = Some(activation_down);
        }
        schedule
    }
}

impl DispatchEngine for GreedyDispatchEngine {
    fn price_table(&self) -> &PriceTable {
        &self.table
    }

    fn price_table_mut(&mut self) -> &mut PriceTable {
        &mut self.table
    }

    fn run(&mut self) -> Result<Vec<DaySolution>> {
        let dates = self.config.run.days();
        let pb = ProgressBar::new(dates.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap(),
        );

        let mut solutions = Vec::new();
        for date in dates {
            pb.inc(1);
            let prices = match day_slice(&self.table, &self.config.columns, date)? {
                Some(prices) => prices,
                None => {
                    warn!("no price rows for {}; day skipped", date);
                    continue;
                }
            };
            if prices.len() < 2 {
                warn!("{}: fewer than two settlement intervals; day skipped", date);
                continue;
            }
            if !prices.has_uniform_step() {
                warn!("{}: non-uniform settlement step; day skipped", date);
                continue;
            }
            let schedule = self.solve_day(&prices);
            debug!("{}: solved {} intervals", date, prices.len());
            solutions.push(DaySolution {
                date,
                prices,
                schedule,
            });
        }
        pb.finish();
        Ok(solutions)
    }
}

fn price_at(series: &Option<Vec<f64>>, i: usize) -> f64 {
    series.as_ref().and_then(|v| v.get(i)).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BatteryParams, DataSection, DateRange, EngineParams, PriceColumns};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use polars::prelude::*;

    fn test_config(start: NaiveDate, end: NaiveDate) -> RunConfig {
        RunConfig {
            run: DateRange {
                start_date: start,
                end_date: end,
            },
            columns: PriceColumns {
                energy: "energy".to_string(),
                fcr: "fcr".to_string(),
                afrr_up: "afrr_up".to_string(),
                afrr_down: "afrr_down".to_string(),
            },
            battery: BatteryParams {
                e_max_mwh: 4.0,
                p_max_mw: Some(2.0),
                round_trip_efficiency: 1.0,
                initial_soc_frac: 0.5,
            },
            data: DataSection::default(),
            engine: EngineParams {
                min_spread_eur_mwh: 5.0,
                afrr_activation_rate: 0.1,
            },
        }
    }

    fn hourly_timestamps(date: NaiveDate, hours: usize) -> Vec<NaiveDateTime> {
        let start = date.and_hms_opt(0, 0, 0).unwrap();
        (0..hours).map(|i| start + Duration::hours(i as i64)).collect()
    }

    fn table_of(columns: Vec<Series>, timestamps: Vec<NaiveDateTime>) -> PriceTable {
        PriceTable::new(DataFrame::new(columns).unwrap(), timestamps).unwrap()
    }

    #[test]
    fn test_arbitrage_charges_low_discharges_high() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut energy = vec![10.0; 12];
        energy.extend(vec![100.0; 12]);
        let table = table_of(
            vec![Series::new("energy", energy)],
            hourly_timestamps(date, 24),
        );

        let config = test_config(date, date);
        let mut engine = GreedyDispatchEngine::new(&config, table);
        let days = engine.run().unwrap();

        assert_eq!(days.len(), 1);
        let schedule = &days[0].schedule;
        assert_eq!(schedule.charge_mw[0], 2.0);
        assert_eq!(schedule.discharge_mw[12], 2.0);
        assert_eq!(schedule.discharge_mw.iter().sum::<f64>(), 4.0);
        assert_eq!(schedule.charge_mw.iter().sum::<f64>(), 2.0);
        assert!(schedule.fcr_mw.is_none());
        assert!(schedule
            .soc_mwh
            .iter()
            .all(|&soc| (0.0..=4.0).contains(&soc)));
    }

    #[test]
    fn test_flat_prices_commit_reserve_without_moving_soc() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let table = table_of(
            vec![
                Series::new("energy", vec![0.0; 24]),
                Series::new("fcr", vec![8.0; 24]),
            ],
            hourly_timestamps(date, 24),
        );

        let config = test_config(date, date);
        let mut engine = GreedyDispatchEngine::new(&config, table);
        let days = engine.run().unwrap();

        let schedule = &days[0].schedule;
        assert!(schedule.discharge_mw.iter().all(|&p| p == 0.0));
        assert!(schedule.charge_mw.iter().all(|&p| p == 0.0));
        assert_eq!(schedule.fcr_mw.as_ref().unwrap(), &vec![2.0; 24]);
        assert!(schedule.soc_mwh.iter().all(|&soc| soc == 2.0));
        assert!(schedule
            .activation_up_mw
            .as_ref()
            .unwrap()
            .iter()
            .all(|&a| a == 0.0));
    }

    #[test]
    fn test_afrr_activation_drains_soc_until_empty() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let table = table_of(
            vec![
                Series::new("energy", vec![0.0; 24]),
                Series::new("afrr_up", vec![6.0; 24]),
            ],
            hourly_timestamps(date, 24),
        );

        let mut config = test_config(date, date);
        config.engine.afrr_activation_rate = 0.25;
        let mut engine = GreedyDispatchEngine::new(&config, table);
        let days = engine.run().unwrap();

        // 2 MW committed, 0.5 MW activated each hour, 2 MWh of stock
        let schedule = &days[0].schedule;
        let committed = schedule.afrr_up_mw.as_ref().unwrap();
        assert_eq!(committed[0], 2.0);
        assert_eq!(committed[3], 2.0);
        assert_eq!(committed[4], 0.0);
        assert_eq!(schedule.soc_mwh[0], 1.5);
        assert_eq!(schedule.soc_mwh[3], 0.0);
        assert!(schedule.soc_mwh.iter().all(|&soc| soc >= 0.0));
    }

    #[test]
    fn test_days_without_enough_intervals_are_skipped() {
        let first = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let second = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let mut timestamps = hourly_timestamps(first, 24);
        timestamps.push(second.and_hms_opt(0, 0, 0).unwrap());
        let table = table_of(vec![Series::new("energy", vec![50.0; 25])], timestamps);

        let config = test_config(first, second);
        let mut engine = GreedyDispatchEngine::new(&config, table);
        let days = engine.run().unwrap();

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, first);
    }

    #[test]
    fn test_non_uniform_day_is_skipped() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let start = date.and_hms_opt(0, 0, 0).unwrap();
        let timestamps = vec![
            start,
            start + Duration::hours(1),
            start + Duration::hours(3),
        ];
        let table = table_of(vec![Series::new("energy", vec![50.0; 3])], timestamps);

        let config = test_config(date, date);
        let mut engine = GreedyDispatchEngine::new(&config, table);
        let days = engine.run().unwrap();

        assert!(days.is_empty());
    }

    #[test]
    fn test_window_outside_table_yields_no_days() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let table = table_of(
            vec![Series::new("energy", vec![50.0; 24])],
            hourly_timestamps(date, 24),
        );

        let elsewhere = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let config = test_config(elsewhere, elsewhere);
        let mut engine = GreedyDispatchEngine::new(&config, table);
        let days = engine.run().unwrap();

        assert!(days.is_empty());
    }
}
