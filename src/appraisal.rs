//! Functionality for appraising a battery against settling every imbalance with the grid.
use crate::battery::BatteryConfig;
use crate::cache::DispatchCache;
use crate::dispatch::{OptimisationResult, calculate_baseline_cost};
use crate::finance::{EconomicMetrics, Payback, calculate_economic_metrics_scaled};
use crate::input::{BatterySize, Scenario};
use crate::output::DataWriter;
use crate::units::Money;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;
use std::rc::Rc;

/// The dispatch and economic metrics for one battery
#[derive(Debug, Clone, PartialEq)]
pub struct Appraisal {
    /// The battery which was appraised
    pub config: BatteryConfig,
    /// The optimal dispatch over the horizon
    pub result: Rc<OptimisationResult>,
    /// Investment figures
    pub metrics: EconomicMetrics,
}

/// The appraisal of a scenario's battery and of every size in its sweep
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioAppraisal {
    /// Settlement cost over the horizon with no battery
    pub baseline_cost: Money,
    /// The scenario's own battery
    pub base: Appraisal,
    /// The sweep sizes, in the order given
    pub sweep: Vec<(BatterySize, Appraisal)>,
}

/// Optimise the dispatch of a battery and compute its economic metrics
fn appraise_battery(
    scenario: &Scenario,
    config: &BatteryConfig,
    baseline_cost: Money,
    cache: &mut DispatchCache,
) -> Result<Appraisal> {
    let result = cache.get_or_optimise(
        config,
        &scenario.imbalance,
        &scenario.price_buy,
        &scenario.price_sell,
        scenario.dt_hours,
        &scenario.dispatch,
    )?;
    let metrics = calculate_economic_metrics_scaled(
        &result,
        config,
        baseline_cost,
        scenario.annualisation_factor(),
    );

    if metrics.payback == Payback::Undefined {
        warn!(
            "Battery of {} kWh / {} kW never pays back its investment (annual savings: {:.2} CHF)",
            config.capacity_kwh,
            config.power_kw,
            metrics.annual_savings.value()
        );
    }

    Ok(Appraisal {
        config: config.clone(),
        result,
        metrics,
    })
}

/// Appraise the scenario's battery and every battery size in its sweep
pub fn appraise_scenario(scenario: &Scenario) -> Result<ScenarioAppraisal> {
    let baseline_cost = calculate_baseline_cost(
        &scenario.imbalance,
        &scenario.price_buy,
        &scenario.price_sell,
        scenario.dt_hours,
    )?;
    info!("Baseline settlement cost: {:.2} CHF", baseline_cost.value());

    let mut cache = DispatchCache::default();
    let base = appraise_battery(scenario, &scenario.battery, baseline_cost, &mut cache)
        .context("Failed to appraise battery.")?;
    info!(
        "Optimised cost: {:.2} CHF (settlement {:.2} CHF, degradation {:.2} CHF)",
        base.result.objective_cost().value(),
        base.result.residual_settlement_cost().value(),
        base.result.degradation_cost().value()
    );

    let mut sweep = Vec::with_capacity(scenario.sweep.len());
    for size in &scenario.sweep {
        let config = scenario.battery.resized(size.capacity_kwh, size.power_kw);
        let appraisal = appraise_battery(scenario, &config, baseline_cost, &mut cache)
            .with_context(|| {
                format!(
                    "Failed to appraise battery of {} kWh / {} kW.",
                    size.capacity_kwh, size.power_kw
                )
            })?;
        sweep.push((*size, appraisal));
    }
    if !sweep.is_empty() {
        info!(
            "Appraised {} sweep sizes ({} reused from cache)",
            sweep.len(),
            cache.hits()
        );
    }

    Ok(ScenarioAppraisal {
        baseline_cost,
        base,
        sweep,
    })
}

/// Run an appraisal of the scenario and save the results.
///
/// # Arguments
///
/// * `scenario` - The scenario to appraise
/// * `output_path` - The folder to which output files will be written
pub fn run(scenario: &Scenario, output_path: &Path) -> Result<()> {
    let appraisal = appraise_scenario(scenario)?;

    let metrics = &appraisal.base.metrics;
    info!("Annual savings: {:.2} CHF", metrics.annual_savings.value());
    info!("NPV: {:.2} CHF", metrics.npv.value());
    if let Some(years) = metrics.payback.years() {
        info!("Payback period: {:.1} years", years.value());
    }

    let mut writer = DataWriter::create(output_path, !appraisal.sweep.is_empty())?;
    writer.write_schedule(&appraisal.base.result)?;
    writer.write_sweep(&appraisal.sweep)?;
    writer.flush()?;
    writer.write_summary(scenario, &appraisal)?;

    Ok(())
}
