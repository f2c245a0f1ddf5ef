use chrono::{Duration, NaiveDate};
use polars::prelude::*;

use bess_scenario_analyzer::config::{
    BatteryParams, DataSection, DateRange, EngineParams, PriceColumns, RunConfig,
};
use bess_scenario_analyzer::financials::calculate_financials;
use bess_scenario_analyzer::models::PriceTable;
use bess_scenario_analyzer::modifiers::ScenarioModifier;
use bess_scenario_analyzer::reconcile::{overwrite_energy_prices, AlignmentMode};
use bess_scenario_analyzer::runner::ScenarioRunner;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

    let config = RunConfig {
        run: DateRange {
            start_date: start,
            end_date: end,
        },
        columns: PriceColumns {
            energy: "energy_eur_mwh".to_string(),
            fcr: "fcr_eur_mw".to_string(),
            afrr_up: "afrr_up_eur_mw".to_string(),
            afrr_down: "afrr_down_eur_mw".to_string(),
        },
        battery: BatteryParams {
            e_max_mwh: 4.0,
            p_max_mw: Some(2.0),
            round_trip_efficiency: 0.9,
            initial_soc_frac: 0.5,
        },
        data: DataSection::default(),
        engine: EngineParams::default(),
    };

    // Three days of hourly prices: cheap nights, expensive evening peaks,
    // a steady reserve market on the side
    let mut timestamps = Vec::new();
    let mut energy = Vec::new();
    let mut fcr = Vec::new();
    for day in 0..3 {
        let midnight = (start + Duration::days(day)).and_hms_opt(0, 0, 0).unwrap();
        for hour in 0..24 {
            timestamps.push(midnight + Duration::hours(hour));
            energy.push(match hour {
                0..=5 | 21..=23 => 20.0,
                18..=20 => 100.0,
                _ => 50.0,
            });
            fcr.push(7.0);
        }
    }
    let frame = DataFrame::new(vec![
        Series::new("energy_eur_mwh", energy),
        Series::new("fcr_eur_mw", fcr),
    ])
    .unwrap();
    let prices = PriceTable::new(frame, timestamps).unwrap();

    let arbitrage = ScenarioRunner::new(
        "Pure Arbitrage",
        &config,
        Some(ScenarioModifier::ArbitrageOnly),
    )
    .run(&prices)
    .unwrap();
    let mut reserve = ScenarioRunner::new(
        "Reserve Only",
        &config,
        Some(ScenarioModifier::ReserveOnly),
    )
    .run(&prices)
    .unwrap();
    let coopt = ScenarioRunner::new("Co-optimization", &config, None)
        .run(&prices)
        .unwrap();

    overwrite_energy_prices(&mut reserve, &coopt, AlignmentMode::DateJoin);

    println!("Strategy Comparison ({} to {})", start, end);
    println!("{}", "=".repeat(72));
    for result in [&arbitrage, &reserve, &coopt] {
        if let Some(summary) = calculate_financials(result, config.battery.e_max_mwh) {
            println!(
                "{:<20} total {:>10.2} EUR  (energy {:>10.2}, reserve {:>8.2}, {:.2} cycles)",
                summary.scenario,
                summary.total_revenue,
                summary.energy_revenue,
                summary.reserve_revenue,
                summary.equivalent_cycles
            );
        }
    }
}
