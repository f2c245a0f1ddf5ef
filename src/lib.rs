pub mod config;
pub mod data_loader;
pub mod engine;
pub mod financials;
pub mod models;
pub mod modifiers;
pub mod reconcile;
pub mod report;
pub mod runner;

pub use config::{BatteryParams, DateRange, PriceColumns, RunConfig};
pub use engine::{DispatchEngine, GreedyDispatchEngine};
pub use financials::{calculate_financials, daily_pnl_series, FinancialSummary};
pub use models::{DaySolution, DispatchSchedule, MarketPrices, PriceTable, ScenarioResult};
pub use modifiers::{zero_price_columns, ScenarioModifier};
pub use reconcile::{overwrite_energy_prices, AlignmentMode, ReconcileReport};
pub use runner::ScenarioRunner;
