use anyhow::Result;
use polars::prelude::*;

use crate::config::PriceColumns;
use crate::models::PriceTable;

/// Return a copy of `frame` with every listed column overwritten by zeros.
///
/// Names that are not present in the frame are ignored, so the same list can
/// be applied to partial schemas. The input frame is never touched.
pub fn zero_price_columns(frame: &DataFrame, names: &[&str]) -> Result<DataFrame> {
    let mut out = frame.clone();
    for &name in names {
        if out.get_column_names().contains(&name) {
            let zeros = Series::new(name, vec![0.0f64; out.height()]);
            out.with_column(zeros)?;
        }
    }
    Ok(out)
}

/// Counterfactual price rewrites that turn the raw market data into the
/// input of one competing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioModifier {
    /// Zero all reserve capacity prices so the engine can only arbitrage energy.
    ArbitrageOnly,
    /// Zero the energy price so the engine can only sell reserve capacity.
    ReserveOnly,
}

impl ScenarioModifier {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ArbitrageOnly => "arbitrage-only",
            Self::ReserveOnly => "reserve-only",
        }
    }

    /// Produce the rewritten price table for this scenario. `table` stays as
    /// loaded; every scenario works on its own copy.
    pub fn apply(&self, table: &PriceTable, columns: &PriceColumns) -> Result<PriceTable> {
        let frame = match self {
            Self::ArbitrageOnly => zero_price_columns(&table.frame, &columns.reserve_names())?,
            Self::ReserveOnly => zero_price_columns(&table.frame, &[columns.energy.as_str()])?,
        };
        PriceTable::new(frame, table.timestamps.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn column_values(frame: &DataFrame, name: &str) -> Vec<f64> {
        let chunked = frame.column(name).unwrap().f64().unwrap();
        (0..chunked.len()).map(|i| chunked.get(i).unwrap()).collect()
    }

    fn sample_frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("energy_eur_mwh", vec![10.0, 20.0, 30.0]),
            Series::new("fcr_eur_mw", vec![5.0, 5.0, 5.0]),
            Series::new("afrr_up_eur_mw", vec![2.0, 3.0, 4.0]),
        ])
        .unwrap()
    }

    fn sample_table() -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let timestamps = (0..3).map(|i| start + Duration::hours(i)).collect();
        PriceTable::new(sample_frame(), timestamps).unwrap()
    }

    fn test_columns() -> PriceColumns {
        PriceColumns {
            energy: "energy_eur_mwh".to_string(),
            fcr: "fcr_eur_mw".to_string(),
            afrr_up: "afrr_up_eur_mw".to_string(),
            afrr_down: "afrr_down_eur_mw".to_string(),
        }
    }

    #[test]
    fn test_zeroes_only_named_columns() {
        let frame = sample_frame();
        let zeroed = zero_price_columns(&frame, &["fcr_eur_mw", "afrr_up_eur_mw"]).unwrap();

        assert_eq!(column_values(&zeroed, "fcr_eur_mw"), vec![0.0, 0.0, 0.0]);
        assert_eq!(column_values(&zeroed, "afrr_up_eur_mw"), vec![0.0, 0.0, 0.0]);
        assert_eq!(column_values(&zeroed, "energy_eur_mwh"), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_input_frame_is_untouched() {
        let frame = sample_frame();
        let _ = zero_price_columns(&frame, &["energy_eur_mwh"]).unwrap();

        assert_eq!(column_values(&frame, "energy_eur_mwh"), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_absent_columns_are_ignored() {
        let frame = sample_frame();
        let zeroed = zero_price_columns(&frame, &["afrr_down_eur_mw", "energy_eur_mwh"]).unwrap();

        assert_eq!(zeroed.get_column_names(), frame.get_column_names());
        assert_eq!(column_values(&zeroed, "energy_eur_mwh"), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_arbitrage_only_keeps_energy() {
        let table = sample_table();
        let modified = ScenarioModifier::ArbitrageOnly
            .apply(&table, &test_columns())
            .unwrap();

        assert_eq!(
            column_values(&modified.frame, "energy_eur_mwh"),
            vec![10.0, 20.0, 30.0]
        );
        assert_eq!(
            column_values(&modified.frame, "fcr_eur_mw"),
            vec![0.0, 0.0, 0.0]
        );
        assert_eq!(
            column_values(&modified.frame, "afrr_up_eur_mw"),
            vec![0.0, 0.0, 0.0]
        );
        assert_eq!(modified.timestamps, table.timestamps);
    }

    #[test]
    fn test_reserve_only_keeps_reserve() {
        let table = sample_table();
        let modified = ScenarioModifier::ReserveOnly
            .apply(&table, &test_columns())
            .unwrap();

        assert_eq!(
            column_values(&modified.frame, "energy_eur_mwh"),
            vec![0.0, 0.0, 0.0]
        );
        assert_eq!(
            column_values(&modified.frame, "fcr_eur_mw"),
            vec![5.0, 5.0, 5.0]
        );
    }
}
