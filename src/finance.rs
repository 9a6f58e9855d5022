//! General functions related to finance, and the economic appraisal of a battery.
use crate::battery::BatteryConfig;
use crate::dispatch::OptimisationResult;
use crate::units::{Dimensionless, Money, MoneyPerYear, Year};
use serde::Serialize;

/// Calculates the capital recovery factor (CRF) for a given lifetime and discount rate.
///
/// The CRF is used to annualise capital costs over the lifetime of an asset.
pub fn capital_recovery_factor(lifetime: u32, discount_rate: Dimensionless) -> Dimensionless {
    if lifetime == 0 {
        return Dimensionless(0.0);
    }
    if discount_rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(lifetime as f64);
    }
    let factor = (Dimensionless(1.0) + discount_rate).powi(lifetime as i32);
    (discount_rate * factor) / (factor - Dimensionless(1.0))
}

/// Calculates the present value of one unit received at the end of each year of the lifetime
pub fn present_value_factor(lifetime: u32, discount_rate: Dimensionless) -> Dimensionless {
    (1..=lifetime)
        .map(|year| Dimensionless(1.0) / (Dimensionless(1.0) + discount_rate).powi(year as i32))
        .sum()
}

/// Return on investment, as a fraction of the annualised investment cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Roi {
    /// A finite return (negative if the battery loses money)
    Finite(Dimensionless),
    /// The battery saves money and costs nothing
    Unbounded,
}

impl Roi {
    /// The return as a fraction, if it is finite
    pub fn fraction(&self) -> Option<Dimensionless> {
        match self {
            Roi::Finite(fraction) => Some(*fraction),
            Roi::Unbounded => None,
        }
    }
}

/// The time needed for annual savings to recover the investment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Payback {
    /// The investment is recovered after this many years
    Finite(Year),
    /// The battery never breaks even
    Undefined,
}

impl Payback {
    /// The payback period, if there is one
    pub fn years(&self) -> Option<Year> {
        match self {
            Payback::Finite(years) => Some(*years),
            Payback::Undefined => None,
        }
    }
}

/// Investment figures for a battery, relative to settling every imbalance with the grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomicMetrics {
    /// Upfront cost of the battery
    pub investment_cost: Money,
    /// Factor used to annualise the investment cost
    pub capital_recovery_factor: Dimensionless,
    /// Investment cost as a constant yearly charge
    pub annualised_investment_cost: MoneyPerYear,
    /// Yearly saving after paying for operation and the annualised investment
    pub annual_savings: MoneyPerYear,
    /// Net present value of the savings over the lifetime, less the investment
    pub npv: Money,
    /// Return on investment
    pub roi: Roi,
    /// Payback period
    pub payback: Payback,
}

/// Calculate economic metrics from yearly costs with and without the battery
pub fn calculate_metrics_from_annual_costs(
    annual_baseline_cost: MoneyPerYear,
    annual_operating_cost: MoneyPerYear,
    config: &BatteryConfig,
) -> EconomicMetrics {
    let investment_cost = config.investment_cost();
    let crf = capital_recovery_factor(config.lifetime_years, config.discount_rate);
    let annualised_investment_cost = investment_cost * crf / Year(1.0);
    let annual_savings =
        annual_baseline_cost - (annual_operating_cost + annualised_investment_cost);

    let roi = if annualised_investment_cost > MoneyPerYear(0.0) {
        Roi::Finite(annual_savings / annualised_investment_cost)
    } else if annual_savings > MoneyPerYear(0.0) {
        Roi::Unbounded
    } else {
        Roi::Finite(Dimensionless(0.0))
    };

    let payback = if annual_savings > MoneyPerYear(0.0) {
        Payback::Finite(investment_cost / annual_savings)
    } else {
        Payback::Undefined
    };

    let pv_factor = present_value_factor(config.lifetime_years, config.discount_rate);
    let npv = annual_savings * Year(1.0) * pv_factor - investment_cost;

    EconomicMetrics {
        investment_cost,
        capital_recovery_factor: crf,
        annualised_investment_cost,
        annual_savings,
        npv,
        roi,
        payback,
    }
}

/// Calculate economic metrics for a dispatch result.
///
/// The baseline cost and the objective cost of the result are treated as yearly figures.
pub fn calculate_economic_metrics(
    result: &OptimisationResult,
    config: &BatteryConfig,
    baseline_cost: Money,
) -> EconomicMetrics {
    calculate_economic_metrics_scaled(result, config, baseline_cost, Dimensionless(1.0))
}

/// Calculate economic metrics for a dispatch result over a horizon shorter than a year.
///
/// Both horizon costs are multiplied by `annualisation_factor` to give yearly figures.
pub fn calculate_economic_metrics_scaled(
    result: &OptimisationResult,
    config: &BatteryConfig,
    baseline_cost: Money,
    annualisation_factor: Dimensionless,
) -> EconomicMetrics {
    let per_year = |cost: Money| cost * annualisation_factor / Year(1.0);
    calculate_metrics_from_annual_costs(
        per_year(baseline_cost),
        per_year(result.objective_cost()),
        config,
    )
}
