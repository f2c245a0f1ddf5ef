use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};

use bess_scenario_analyzer::config::RunConfig;
use bess_scenario_analyzer::data_loader::load_price_table;
use bess_scenario_analyzer::financials::{calculate_financials, daily_pnl_series, FinancialSummary};
use bess_scenario_analyzer::models::DaySolution;
use bess_scenario_analyzer::modifiers::ScenarioModifier;
use bess_scenario_analyzer::reconcile::{overwrite_energy_prices, AlignmentMode};
use bess_scenario_analyzer::report;
use bess_scenario_analyzer::runner::ScenarioRunner;

#[derive(Parser)]
#[command(name = "bess_scenario_analyzer")]
#[command(about = "Compare BESS operating strategies across energy and reserve markets")]
struct Args {
    /// Path to the run configuration JSON
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Directory for the summary CSV and the charts
    #[arg(short, long, default_value = "reports")]
    output_dir: PathBuf,

    /// Override the configured start date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,

    /// Override the configured end date (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,

    /// Pair reconciliation days by sequence position instead of calendar date
    #[arg(long)]
    positional_alignment: bool,

    /// Skip PNG chart rendering
    #[arg(long)]
    skip_charts: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = RunConfig::from_path(&args.config)?;
    if let Some(raw) = &args.start_date {
        config.run.start_date =
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").context("parsing --start-date")?;
    }
    if let Some(raw) = &args.end_date {
        config.run.end_date =
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").context("parsing --end-date")?;
    }
    config.validate()?;

    info!(
        "simulation window {} to {} ({} days)",
        config.run.start_date,
        config.run.end_date,
        config.run.num_days()
    );

    let prices = load_price_table(
        Path::new(&config.data.price_csv),
        &config.columns,
        &config.data.timestamp_column,
    )?;
    info!(
        "loaded {} price rows from {}",
        prices.len(),
        config.data.price_csv
    );

    // each scenario dispatches against its own copy of the price table
    let arbitrage = ScenarioRunner::new(
        "Pure Arbitrage",
        &config,
        Some(ScenarioModifier::ArbitrageOnly),
    )
    .run(&prices)?;
    let mut reserve =
        ScenarioRunner::new("Reserve Only", &config, Some(ScenarioModifier::ReserveOnly))
            .run(&prices)?;
    let coopt = ScenarioRunner::new("Co-optimization", &config, None).run(&prices)?;

    // the reserve-only engine optimized against a zeroed energy price; settle
    // it at the price the co-optimization scenario saw
    let mode = if args.positional_alignment {
        AlignmentMode::Positional
    } else {
        AlignmentMode::DateJoin
    };
    let reconciled = overwrite_energy_prices(&mut reserve, &coopt, mode);
    if reconciled.replaced < reserve.len() {
        warn!(
            "{} of {} reserve-only day(s) kept their optimized prices",
            reserve.len() - reconciled.replaced,
            reserve.len()
        );
    }

    let results = [&arbitrage, &reserve, &coopt];
    let summaries: Vec<FinancialSummary> = results
        .iter()
        .filter_map(|result| calculate_financials(result, config.battery.e_max_mwh))
        .collect();

    report::print_summary_table(&summaries);

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating output directory {}", args.output_dir.display()))?;
    report::write_summary_csv(&summaries, &args.output_dir.join("financial_summary.csv"))?;

    if !args.skip_charts {
        let pnl_series: Vec<(String, Vec<(NaiveDate, f64)>)> = results
            .iter()
            .map(|result| (result.scenario.clone(), daily_pnl_series(result)))
            .collect();
        report::render_daily_pnl_chart(&pnl_series, &args.output_dir.join("daily_pnl.png"))?;

        let first_days: Vec<(&str, &DaySolution)> = results
            .iter()
            .filter_map(|result| {
                result
                    .days
                    .first()
                    .map(|day| (result.scenario.as_str(), day))
            })
            .collect();
        report::render_soc_chart(&first_days, &args.output_dir.join("soc_comparison.png"))?;
    }

    info!("analysis complete");
    Ok(())
}
