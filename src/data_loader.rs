use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use polars::prelude::*;
use std::path::Path;

use crate::config::PriceColumns;
use crate::models::{MarketPrices, PriceTable};

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Load the horizon market-price table from CSV.
///
/// The timestamp column is parsed up front and rows are sorted by it when the
/// file is not already time-ordered. Configured price columns that are absent
/// from the file are tolerated (the product then contributes zero downstream)
/// but logged once here.
pub fn load_price_table(
    path: &Path,
    columns: &PriceColumns,
    timestamp_column: &str,
) -> Result<PriceTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening price table {}", path.display()))?;
    let frame = CsvReader::new(file)
        .has_header(true)
        .finish()
        .with_context(|| format!("reading price table {}", path.display()))?;

    let raw = frame
        .column(timestamp_column)
        .with_context(|| format!("price table is missing timestamp column '{timestamp_column}'"))?
        .utf8()
        .context("timestamp column must contain text timestamps")?;

    let mut timestamps = Vec::with_capacity(frame.height());
    for i in 0..frame.height() {
        let value = match raw.get(i) {
            Some(value) => value,
            None => bail!("empty timestamp in price table row {i}"),
        };
        match parse_timestamp(value) {
            Some(ts) => timestamps.push(ts),
            None => bail!("unparseable timestamp '{value}' in price table row {i}"),
        }
    }

    for name in [
        columns.energy.as_str(),
        columns.fcr.as_str(),
        columns.afrr_up.as_str(),
        columns.afrr_down.as_str(),
    ] {
        if !frame.get_column_names().contains(&name) {
            warn!("price column '{name}' not found in {}; product will contribute zero", path.display());
        }
    }

    let needs_sort = timestamps.windows(2).any(|w| w[0] >= w[1]);
    let (frame, timestamps) = if needs_sort {
        warn!("price table rows are not time-ordered; sorting by '{timestamp_column}'");
        let millis: Vec<i64> = timestamps
            .iter()
            .map(|t| t.and_utc().timestamp_millis())
            .collect();
        let mut keyed = frame;
        keyed.with_column(Series::new("__row_order", millis))?;
        let sorted = keyed
            .lazy()
            .sort("__row_order", Default::default())
            .collect()
            .context("sorting price table by timestamp")?;
        let sorted_frame = sorted.drop("__row_order")?;
        let mut sorted_ts = timestamps;
        sorted_ts.sort();
        (sorted_frame, sorted_ts)
    } else {
        (frame, timestamps)
    };

    PriceTable::new(frame, timestamps)
}

fn column_slice(
    frame: &DataFrame,
    name: &str,
    offset: usize,
    len: usize,
) -> Result<Option<Vec<f64>>> {
    if !frame.get_column_names().contains(&name) {
        return Ok(None);
    }
    let series = frame
        .column(name)?
        .slice(offset as i64, len)
        .cast(&DataType::Float64)
        .with_context(|| format!("price column '{name}' is not numeric"))?;
    let values = series.f64()?;
    // nulls count as zero, like an absent interval price
    Ok(Some(
        (0..values.len()).map(|i| values.get(i).unwrap_or(0.0)).collect(),
    ))
}

/// Extract one calendar day from the horizon table as typed per-day prices.
/// Returns `Ok(None)` when the table has no rows for the date.
pub fn day_slice(
    table: &PriceTable,
    columns: &PriceColumns,
    date: NaiveDate,
) -> Result<Option<MarketPrices>> {
    let start = table.timestamps.partition_point(|t| t.date() < date);
    let end = table.timestamps.partition_point(|t| t.date() <= date);
    if start == end {
        return Ok(None);
    }

    let len = end - start;
    Ok(Some(MarketPrices {
        timestamps: table.timestamps[start..end].to_vec(),
        energy: column_slice(&table.frame, &columns.energy, start, len)?,
        fcr: column_slice(&table.frame, &columns.fcr, start, len)?,
        afrr_up: column_slice(&table.frame, &columns.afrr_up, start, len)?,
        afrr_down: column_slice(&table.frame, &columns.afrr_down, start, len)?,
    }))
}
