use anyhow::Result;
use log::info;

use crate::config::RunConfig;
use crate::engine::{DispatchEngine, GreedyDispatchEngine};
use crate::models::{PriceTable, ScenarioResult};
use crate::modifiers::ScenarioModifier;

/// Drives one named scenario end to end: apply the price modifier, hand the
/// rewritten table to the engine, collect the per-day solutions.
pub struct ScenarioRunner<'a> {
    name: String,
    config: &'a RunConfig,
    modifier: Option<ScenarioModifier>,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(
        name: impl Into<String>,
        config: &'a RunConfig,
        modifier: Option<ScenarioModifier>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            modifier,
        }
    }

    /// Run with the greedy reference engine on an own copy of `prices`.
    pub fn run(&self, prices: &PriceTable) -> Result<ScenarioResult> {
        let mut engine = GreedyDispatchEngine::new(self.config, prices.clone());
        self.run_with_engine(&mut engine)
    }

    /// Run against any engine. The seam used by tests and alternative
    /// optimizers; the engine already owns its price table copy.
    pub fn run_with_engine(&self, engine: &mut dyn DispatchEngine) -> Result<ScenarioResult> {
        info!("--- scenario '{}' ---", self.name);
        if let Some(modifier) = self.modifier {
            info!("applying {} price rewrite", modifier.name());
            let modified = modifier.apply(engine.price_table(), &self.config.columns)?;
            *engine.price_table_mut() = modified;
        }
        let days = engine.run()?;
        info!("scenario '{}': {} days solved", self.name, days.len());
        Ok(ScenarioResult::new(self.name.clone(), days))
    }
}
