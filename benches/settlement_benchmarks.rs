use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bess_scenario_analyzer::financials::calculate_financials;
use bess_scenario_analyzer::models::{
    DaySolution, DispatchSchedule, MarketPrices, ScenarioResult,
};
use bess_scenario_analyzer::modifiers::zero_price_columns;
use chrono::{Duration, NaiveDate};
use polars::prelude::*;

fn synthetic_result(days: usize) -> ScenarioResult {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut solutions = Vec::with_capacity(days);
    for offset in 0..days {
        let date = start + Duration::days(offset as i64);
        let midnight = date.and_hms_opt(0, 0, 0).unwrap();
        let timestamps = (0..96).map(|i| midnight + Duration::minutes(15 * i)).collect();

        let energy: Vec<f64> = (0..96).map(|i| 40.0 + 30.0 * ((i % 24) as f64 / 24.0)).collect();
        let discharge: Vec<f64> = (0..96).map(|i| if i % 4 == 0 { 2.0 } else { 0.0 }).collect();
        let charge: Vec<f64> = (0..96).map(|i| if i % 4 == 2 { 2.0 } else { 0.0 }).collect();

        solutions.push(DaySolution {
            date,
            prices: MarketPrices {
                timestamps,
                energy: Some(energy),
                fcr: Some(vec![6.0; 96]),
                afrr_up: Some(vec![8.0; 96]),
                afrr_down: Some(vec![3.0; 96]),
            },
            schedule: DispatchSchedule {
                discharge_mw: discharge,
                charge_mw: charge,
                soc_mwh: vec![2.0; 96],
                fcr_mw: Some(vec![1.0; 96]),
                afrr_up_mw: Some(vec![0.5; 96]),
                afrr_down_mw: Some(vec![0.5; 96]),
                activation_up_mw: Some(vec![0.05; 96]),
                activation_down_mw: Some(vec![0.05; 96]),
            },
        });
    }
    ScenarioResult::new("Co-optimization", solutions)
}

fn benchmark_financial_aggregation(c: &mut Criterion) {
    let result = synthetic_result(365);

    c.bench_function("settle_one_year_quarter_hourly", |b| {
        b.iter(|| {
            let _summary = black_box(calculate_financials(&result, 4.0));
        });
    });
}

fn benchmark_price_zeroing(c: &mut Criterion) {
    let rows = 365 * 96;
    let frame = DataFrame::new(vec![
        Series::new("energy_eur_mwh", (0..rows).map(|i| i as f64 * 0.01).collect::<Vec<f64>>()),
        Series::new("fcr_eur_mw", vec![6.0; rows]),
        Series::new("afrr_up_eur_mw", vec![8.0; rows]),
        Series::new("afrr_down_eur_mw", vec![3.0; rows]),
    ])
    .unwrap();

    c.bench_function("zero_reserve_columns_one_year", |b| {
        b.iter(|| {
            let _zeroed = black_box(zero_price_columns(
                &frame,
                &["fcr_eur_mw", "afrr_up_eur_mw", "afrr_down_eur_mw"],
            ));
        });
    });
}

criterion_group!(
    benches,
    benchmark_financial_aggregation,
    benchmark_price_zeroing
);
criterion_main!(benches);
