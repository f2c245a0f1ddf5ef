use anyhow::Result;
use chrono::{Duration, NaiveDate};
use log::info;
use plotters::prelude::*;
use polars::prelude::*;
use std::path::Path;

use crate::financials::FinancialSummary;
use crate::models::DaySolution;

const PALETTE: [&RGBColor; 5] = [&BLUE, &GREEN, &RED, &MAGENTA, &CYAN];

/// Print the cross-scenario comparison as an aligned table.
pub fn print_summary_table(summaries: &[FinancialSummary]) {
    if summaries.is_empty() {
        println!("No scenario produced a financial summary.");
        return;
    }

    println!("\n💰 Strategy Comparison");
    println!("{}", "=".repeat(100));
    println!(
        "{:<20} {:>14} {:>14} {:>14} {:>16} {:>12}",
        "Scenario", "Total (EUR)", "Energy (EUR)", "Reserve (EUR)", "Discharged (MWh)", "Cycles"
    );
    println!("{}", "-".repeat(100));
    for summary in summaries {
        println!(
            "{:<20} {:>14.2} {:>14.2} {:>14.2} {:>16.2} {:>12.2}",
            summary.scenario,
            summary.total_revenue,
            summary.energy_revenue,
            summary.reserve_revenue,
            summary.discharged_mwh,
            summary.equivalent_cycles
        );
    }
    println!("{}", "=".repeat(100));
}

/// Write the comparison table as CSV next to the charts.
pub fn write_summary_csv(summaries: &[FinancialSummary], path: &Path) -> Result<()> {
    let mut scenarios = Vec::with_capacity(summaries.len());
    let mut totals = Vec::with_capacity(summaries.len());
    let mut energy = Vec::with_capacity(summaries.len());
    let mut reserve = Vec::with_capacity(summaries.len());
    let mut discharged = Vec::with_capacity(summaries.len());
    let mut cycles = Vec::with_capacity(summaries.len());
    for summary in summaries {
        scenarios.push(summary.scenario.clone());
        totals.push(summary.total_revenue);
        energy.push(summary.energy_revenue);
        reserve.push(summary.reserve_revenue);
        discharged.push(summary.discharged_mwh);
        cycles.push(summary.equivalent_cycles);
    }

    let mut df = DataFrame::new(vec![
        Series::new("Scenario", scenarios),
        Series::new("Total_Revenue_EUR", totals),
        Series::new("Energy_Revenue_EUR", energy),
        Series::new("Reserve_Revenue_EUR", reserve),
        Series::new("Discharged_MWh", discharged),
        Series::new("Equivalent_Cycles", cycles),
    ])?;

    CsvWriter::new(std::fs::File::create(path)?).finish(&mut df)?;
    info!("financial summary written to {}", path.display());
    Ok(())
}

/// Daily net revenue over the window, one line per scenario.
pub fn render_daily_pnl_chart(
    series: &[(String, Vec<(NaiveDate, f64)>)],
    path: &Path,
) -> Result<()> {
    let points: Vec<(NaiveDate, f64)> = series
        .iter()
        .flat_map(|(_, daily)| daily.iter().copied())
        .collect();
    if points.is_empty() {
        info!("no daily PnL data; chart skipped");
        return Ok(());
    }

    let min_date = points.iter().map(|(date, _)| *date).min().unwrap();
    let mut max_date = points.iter().map(|(date, _)| *date).max().unwrap();
    if max_date == min_date {
        // a degenerate one-day axis cannot be built
        max_date = max_date + Duration::days(1);
    }
    let min_rev = points.iter().map(|(_, r)| *r).fold(f64::INFINITY, f64::min);
    let max_rev = points
        .iter()
        .map(|(_, r)| *r)
        .fold(f64::NEG_INFINITY, f64::max);
    let pad = ((max_rev - min_rev).abs() * 0.1).max(1.0);

    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Daily Net Revenue by Strategy", ("sans-serif", 36).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(min_date..max_date, (min_rev - pad)..(max_rev + pad))?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Net Revenue (EUR/day)")
        .draw()?;

    for (index, (name, daily)) in series.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        chart
            .draw_series(LineSeries::new(daily.iter().copied(), color))?
            .label(name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    info!("daily PnL chart written to {}", path.display());
    Ok(())
}

/// State-of-charge profile of one day, one line per scenario.
pub fn render_soc_chart(days: &[(&str, &DaySolution)], path: &Path) -> Result<()> {
    let with_data: Vec<&(&str, &DaySolution)> = days
        .iter()
        .filter(|(_, day)| !day.schedule.soc_mwh.is_empty())
        .collect();
    if with_data.is_empty() {
        info!("no state-of-charge data; chart skipped");
        return Ok(());
    }

    let date = with_data[0].1.date;
    let max_hours = with_data
        .iter()
        .map(|(_, day)| {
            day.schedule.soc_mwh.len() as f64 * day.prices.step_hours().unwrap_or(1.0)
        })
        .fold(1.0f64, f64::max);
    let max_soc = with_data
        .iter()
        .flat_map(|(_, day)| day.schedule.soc_mwh.iter().copied())
        .fold(0.0f64, f64::max);

    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            &format!("State of Charge: {}", date),
            ("sans-serif", 36).into_font(),
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..max_hours, 0f64..(max_soc * 1.1).max(1.0))?;

    chart
        .configure_mesh()
        .x_desc("Hour of Day")
        .y_desc("State of Charge (MWh)")
        .draw()?;

    for (index, (name, day)) in with_data.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        let dt_hours = day.prices.step_hours().unwrap_or(1.0);
        chart
            .draw_series(LineSeries::new(
                day.schedule
                    .soc_mwh
                    .iter()
                    .enumerate()
                    .map(|(i, &soc)| (i as f64 * dt_hours, soc)),
                color,
            ))?
            .label(name.to_string())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    info!("state-of-charge chart written to {}", path.display());
    Ok(())
}
