//! The schedule and costs produced by a dispatch optimisation.
use crate::battery::BatteryConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::series::{ImbalanceSeries, PriceSeries};
use crate::units::{Energy, Hours, Money, MoneyPerEnergy, Power};
use serde::Serialize;

/// Charge and discharge powers below this are treated as solver noise and set to zero
pub const CLIP_TOLERANCE: Power = Power(1e-6);

/// The raw solver output for each kind of decision variable
pub(super) struct SolutionColumns<'a> {
    pub charge: &'a [f64],
    pub discharge: &'a [f64],
    pub grid_import: &'a [f64],
    pub grid_export: &'a [f64],
}

/// The dispatch decisions and their costs for a single timestep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimestepDispatch {
    /// The timestep index
    pub timestep: u32,
    /// Power flowing into the battery
    pub charge_kw: Power,
    /// Power flowing out of the battery
    pub discharge_kw: Power,
    /// Stored energy at the end of the timestep
    pub soc_kwh: Energy,
    /// Power bought from the grid
    pub grid_import_kw: Power,
    /// Power sold to the grid
    pub grid_export_kw: Power,
    /// Cost of settling the residual imbalance (negative for net revenue)
    pub settlement_cost: Money,
    /// Wear cost of the battery throughput
    pub degradation_cost: Money,
}

/// The dispatch decisions for every timestep in the horizon
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSchedule(Vec<TimestepDispatch>);

impl DispatchSchedule {
    /// Iterate over the timesteps in order
    pub fn iter(&self) -> impl Iterator<Item = &TimestepDispatch> {
        self.0.iter()
    }

    /// The number of timesteps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the schedule is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total energy moved through the battery, counting both directions
    pub fn throughput(&self, dt: Hours) -> Energy {
        self.iter()
            .map(|step| (step.charge_kw + step.discharge_kw) * dt)
            .sum()
    }
}

/// The outcome of a successful dispatch optimisation
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisationResult {
    schedule: DispatchSchedule,
    objective_cost: Money,
    degradation_cost: Money,
    residual_settlement_cost: Money,
    feasible: bool,
    solver_status: String,
}

/// Split a net grid exchange into import and export.
///
/// A positive exchange is drawn from the grid and a negative one is fed into it.
pub fn split_grid_exchange(exchange: Power) -> (Power, Power) {
    let zero = Power(0.0);
    (exchange.max(zero), (-exchange).max(zero))
}

/// The cost of settling one timestep of grid exchange with the grid operator
pub fn settlement_cost(
    grid_import: Power,
    grid_export: Power,
    price_buy: MoneyPerEnergy,
    price_sell: MoneyPerEnergy,
    dt: Hours,
) -> Money {
    price_buy * (grid_import * dt) - price_sell * (grid_export * dt)
}

/// Zero a power which is below the clipping tolerance and cap it at the rated power
fn clip_power(value: f64, max_power: Power) -> Power {
    let value = Power(value);
    if value < CLIP_TOLERANCE {
        Power(0.0)
    } else {
        value.min(max_power)
    }
}

impl OptimisationResult {
    /// Build a result from the solver output.
    ///
    /// Charge and discharge powers are cleaned of solver noise and every other quantity is derived
    /// from them, so the schedule satisfies the power balance and SOC continuity exactly. Costs use
    /// the real degradation cost and the same settlement accounting as
    /// [`calculate_baseline_cost`](super::calculate_baseline_cost).
    pub(super) fn from_solution(
        config: &BatteryConfig,
        imbalance: &ImbalanceSeries,
        price_buy: &PriceSeries,
        price_sell: &PriceSeries,
        dt: Hours,
        columns: &SolutionColumns,
        solver_status: String,
    ) -> DispatchResult<Self> {
        let eta = config.one_way_efficiency();
        let retention = config.retention(dt);
        let (soc_min, soc_max) = config.soc_limits();
        let degradation_price = config.degradation_cost_per_kwh_throughput;

        let mut soc = config.initial_soc();
        let mut schedule = Vec::with_capacity(imbalance.len());
        for (t, (timestep, imbalance)) in imbalance.iter().enumerate() {
            let charge_kw = clip_power(columns.charge[t], config.power_kw);
            let discharge_kw = clip_power(columns.discharge[t], config.power_kw);
            if charge_kw > Power(0.0) && discharge_kw > Power(0.0) {
                return Err(DispatchError::InfeasibleSolution(format!(
                    "battery charges ({charge_kw} kW) and discharges ({discharge_kw} kW) \
                    simultaneously at timestep {timestep} (solver import {}, export {})",
                    columns.grid_import[t], columns.grid_export[t]
                )));
            }

            soc = (soc * retention + charge_kw * dt * eta - discharge_kw * dt / eta)
                .max(soc_min)
                .min(soc_max);
            let (grid_import_kw, grid_export_kw) =
                split_grid_exchange(imbalance + charge_kw - discharge_kw);

            schedule.push(TimestepDispatch {
                timestep,
                charge_kw,
                discharge_kw,
                soc_kwh: soc,
                grid_import_kw,
                grid_export_kw,
                settlement_cost: settlement_cost(
                    grid_import_kw,
                    grid_export_kw,
                    price_buy.values()[t],
                    price_sell.values()[t],
                    dt,
                ),
                degradation_cost: degradation_price * ((charge_kw + discharge_kw) * dt),
            });
        }

        let residual_settlement_cost = schedule.iter().map(|s| s.settlement_cost).sum();
        let degradation_cost = schedule.iter().map(|s| s.degradation_cost).sum();

        Ok(Self {
            schedule: DispatchSchedule(schedule),
            objective_cost: residual_settlement_cost + degradation_cost,
            degradation_cost,
            residual_settlement_cost,
            feasible: true,
            solver_status,
        })
    }

    /// The optimal schedule
    pub fn schedule(&self) -> &DispatchSchedule {
        &self.schedule
    }

    /// Total cost over the horizon: residual settlement plus degradation
    pub fn objective_cost(&self) -> Money {
        self.objective_cost
    }

    /// Wear cost of the battery throughput over the horizon
    pub fn degradation_cost(&self) -> Money {
        self.degradation_cost
    }

    /// Cost of settling the residual imbalance with the grid operator over the horizon
    pub fn residual_settlement_cost(&self) -> Money {
        self.residual_settlement_cost
    }

    /// Whether the solver found an optimal solution.
    ///
    /// Solver failures are returned as errors, so a result is only ever built from a feasible
    /// solution.
    pub fn feasible(&self) -> bool {
        self.feasible
    }

    /// The status reported by the solver
    pub fn solver_status(&self) -> &str {
        &self.solver_status
    }
}
