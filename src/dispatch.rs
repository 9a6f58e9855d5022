//! Code for performing the battery dispatch optimisation.
//!
//! The dispatch is a linear program over a finite horizon with perfect foresight. For every
//! timestep there are five decision variables (charge power, discharge power, state of charge,
//! grid import and grid export) and the objective is the total cost of settling the residual
//! imbalance with the grid operator plus the wear cost of battery throughput.
//!
//! The problem is always feasible: leaving the battery idle and routing the whole imbalance
//! through the grid is a valid solution. Any other outcome from the solver is therefore treated as
//! a fatal error.
use crate::battery::BatteryConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::series::{ImbalanceSeries, PriceSeries, check_series};
use crate::units::{Hours, Money, MoneyPerEnergy};
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use itertools::{Itertools, MinMaxResult};
use log::{Level, debug, error, log_enabled};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Range;

mod constraints;
use constraints::{
    add_power_balance_constraints, add_soc_constraints, add_terminal_soc_constraint,
};
pub mod result;
pub use result::{DispatchSchedule, OptimisationResult, TimestepDispatch};
use result::{SolutionColumns, settlement_cost, split_grid_exchange};

/// A decision variable in the optimisation
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
pub type Variable = highs::Col;

/// A small cost added to every kWh of battery throughput in the objective.
///
/// This makes simultaneous charging and discharging strictly worse than idling even when both the
/// degradation cost and the round-trip losses are zero, so the optimum is physically sensible. It
/// is not included in any reported cost.
pub const THROUGHPUT_TIE_BREAK: MoneyPerEnergy = MoneyPerEnergy(1e-6);

/// The default cap on solver iterations
pub const DEFAULT_ITERATION_LIMIT: u32 = 1_000_000;

fn default_iteration_limit() -> u32 {
    DEFAULT_ITERATION_LIMIT
}

/// Options controlling the dispatch optimisation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchOptions {
    /// The maximum number of simplex or interior point iterations before giving up
    #[serde(default = "default_iteration_limit")]
    pub iteration_limit: u32,
    /// Whether the battery must end the horizon holding at least its initial charge
    #[serde(default)]
    pub terminal_soc_at_least_initial: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            iteration_limit: DEFAULT_ITERATION_LIMIT,
            terminal_soc_at_least_initial: false,
        }
    }
}

impl DispatchOptions {
    /// Check that the options are usable
    pub fn validate(&self) -> DispatchResult<()> {
        if self.iteration_limit == 0 {
            return Err(DispatchError::Configuration(
                "iteration_limit must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// The kinds of decision variable.
///
/// Each kind occupies a contiguous block of one column per timestep, in the order listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VariableKind {
    Charge,
    Discharge,
    Soc,
    GridImport,
    GridExport,
}

impl VariableKind {
    /// The range of problem columns holding this kind of variable
    fn columns(self, num_timesteps: usize) -> Range<usize> {
        let start = self as usize * num_timesteps;
        start..start + num_timesteps
    }
}

/// The variables of the problem, one per timestep for each kind
struct VariableMap {
    charge: Vec<Variable>,
    discharge: Vec<Variable>,
    soc: Vec<Variable>,
    grid_import: Vec<Variable>,
    grid_export: Vec<Variable>,
}

/// Check that the duration of a timestep is usable
fn check_time_step(dt: Hours) -> DispatchResult<()> {
    if !(dt.is_finite() && dt > Hours(0.0)) {
        return Err(DispatchError::Configuration(format!(
            "dt_hours must be a finite number greater than zero (got {dt})"
        )));
    }

    Ok(())
}

/// Check that the battery can hold the lowest charge it is required to keep.
///
/// With self-discharge, the state of charge can only sit at the SOC floor (or, under the terminal
/// policy, at the initial charge) if the battery can recharge the losses every timestep.
fn check_soc_holdable(
    config: &BatteryConfig,
    options: &DispatchOptions,
    dt: Hours,
) -> DispatchResult<()> {
    let floor = if options.terminal_soc_at_least_initial {
        config.initial_soc()
    } else {
        config.soc_limits().0
    };

    config.check_self_discharge(floor, dt)
}

/// Perform the dispatch optimisation.
///
/// # Arguments
///
/// * `config` - The battery to dispatch
/// * `imbalance` - Facility imbalance for each timestep
/// * `price_buy` - Price paid for energy imported from the grid
/// * `price_sell` - Price received for energy exported to the grid
/// * `dt` - The duration of each timestep
/// * `options` - Solver options
///
/// # Returns
///
/// The cost-minimising schedule with its costs, or an error if the inputs are invalid or the
/// solver fails.
pub fn perform_dispatch_optimisation(
    config: &BatteryConfig,
    imbalance: &ImbalanceSeries,
    price_buy: &PriceSeries,
    price_sell: &PriceSeries,
    dt: Hours,
    options: &DispatchOptions,
) -> DispatchResult<OptimisationResult> {
    config.validate()?;
    options.validate()?;
    check_time_step(dt)?;
    check_soc_holdable(config, options, dt)?;
    let num_timesteps = check_series(imbalance, price_buy, price_sell)?;
    debug!("Performing dispatch optimisation over {num_timesteps} timesteps");

    // Set up problem
    let mut problem = Problem::default();
    let variables = add_variables(&mut problem, config, price_buy, price_sell, dt);

    // Add constraints
    add_power_balance_constraints(&mut problem, &variables, imbalance);
    add_soc_constraints(&mut problem, &variables, config, dt);
    if options.terminal_soc_at_least_initial {
        add_terminal_soc_constraint(&mut problem, &variables, config);
    }

    // Solve model
    let mut highs_model = problem.optimise(Sense::Minimise);
    let iteration_limit = i32::try_from(options.iteration_limit).unwrap_or(i32::MAX);
    highs_model.set_option("simplex_iteration_limit", iteration_limit);
    highs_model.set_option("ipm_iteration_limit", iteration_limit);
    if log_enabled!(Level::Debug) {
        enable_highs_logging(&mut highs_model);
    }

    let solved = highs_model.try_solve().map_err(|status| {
        solver_failure(
            &format!("HiGHS returned an error: {status:?}"),
            config,
            imbalance,
            price_buy,
            price_sell,
            dt,
        )
    })?;
    let status = solved.status();
    if status != HighsModelStatus::Optimal {
        return Err(solver_failure(
            &format!("Could not solve: {status:?}"),
            config,
            imbalance,
            price_buy,
            price_sell,
            dt,
        ));
    }

    let solution = solved.get_solution();
    let columns = solution.columns();
    let solution_columns = SolutionColumns {
        charge: &columns[VariableKind::Charge.columns(num_timesteps)],
        discharge: &columns[VariableKind::Discharge.columns(num_timesteps)],
        grid_import: &columns[VariableKind::GridImport.columns(num_timesteps)],
        grid_export: &columns[VariableKind::GridExport.columns(num_timesteps)],
    };

    let result = OptimisationResult::from_solution(
        config,
        imbalance,
        price_buy,
        price_sell,
        dt,
        &solution_columns,
        format!("{status:?}"),
    )
    .inspect_err(|err| {
        error!("{err}");
        error!(
            "{}",
            describe_inputs(config, imbalance, price_buy, price_sell, dt)
        );
    })?;
    debug!(
        "Dispatch optimisation complete: objective cost {:.4} CHF",
        result.objective_cost().value()
    );

    Ok(result)
}

/// Enable logging for the HiGHS solver
fn enable_highs_logging(model: &mut highs::Model) {
    model.set_option("log_to_console", true);
    model.set_option("output_flag", true);
}

/// Log a solver failure along with the inputs which caused it and wrap it as an error
fn solver_failure(
    message: &str,
    config: &BatteryConfig,
    imbalance: &ImbalanceSeries,
    price_buy: &PriceSeries,
    price_sell: &PriceSeries,
    dt: Hours,
) -> DispatchError {
    error!("Dispatch optimisation failed: {message}");
    error!(
        "{}",
        describe_inputs(config, imbalance, price_buy, price_sell, dt)
    );
    DispatchError::InfeasibleSolution(message.to_string())
}

/// Summarise the optimisation inputs for diagnosing a failure
fn describe_inputs(
    config: &BatteryConfig,
    imbalance: &ImbalanceSeries,
    price_buy: &PriceSeries,
    price_sell: &PriceSeries,
    dt: Hours,
) -> String {
    fn range<T: PartialOrd + Copy + std::fmt::Display>(values: &[T]) -> String {
        match values
            .iter()
            .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        {
            MinMaxResult::NoElements => "empty".into(),
            MinMaxResult::OneElement(x) => format!("{x}"),
            MinMaxResult::MinMax(min, max) => format!("{min} to {max}"),
        }
    }

    format!(
        "Inputs: {} timesteps of {dt} h; imbalance {} kW; price_buy {} CHF/kWh; \
        price_sell {} CHF/kWh; battery {config:?}",
        imbalance.len(),
        range(imbalance.values()),
        range(price_buy.values()),
        range(price_sell.values()),
    )
}

/// Add variables to the optimisation problem.
///
/// Columns are added in blocks, one block per [`VariableKind`], so that the solution can be read
/// back by column range.
fn add_variables(
    problem: &mut Problem,
    config: &BatteryConfig,
    price_buy: &PriceSeries,
    price_sell: &PriceSeries,
    dt: Hours,
) -> VariableMap {
    let num_timesteps = price_buy.len();
    let dt = dt.value();

    // An inert battery can't move any energy
    let max_power = if config.is_inert() {
        0.0
    } else {
        config.power_kw.value()
    };
    let throughput_cost =
        (config.degradation_cost_per_kwh_throughput + THROUGHPUT_TIE_BREAK).value() * dt;
    let (soc_min, soc_max) = config.soc_limits();

    let charge = (0..num_timesteps)
        .map(|_| problem.add_column(throughput_cost, 0.0..=max_power))
        .collect();
    let discharge = (0..num_timesteps)
        .map(|_| problem.add_column(throughput_cost, 0.0..=max_power))
        .collect();
    let soc = (0..num_timesteps)
        .map(|_| problem.add_column(0.0, soc_min.value()..=soc_max.value()))
        .collect();
    let grid_import = price_buy
        .values()
        .iter()
        .map(|price| problem.add_column(price.value() * dt, 0.0..))
        .collect();

    // Export revenue is a negative cost
    let grid_export = price_sell
        .values()
        .iter()
        .map(|price| problem.add_column(-price.value() * dt, 0.0..))
        .collect();

    VariableMap {
        charge,
        discharge,
        soc,
        grid_import,
        grid_export,
    }
}

/// Calculate the cost of settling every imbalance with the grid operator, without a battery.
///
/// This uses the same per-timestep settlement accounting as the optimisation result, so an inert
/// battery reproduces it exactly.
pub fn calculate_baseline_cost(
    imbalance: &ImbalanceSeries,
    price_buy: &PriceSeries,
    price_sell: &PriceSeries,
    dt: Hours,
) -> DispatchResult<Money> {
    check_time_step(dt)?;
    check_series(imbalance, price_buy, price_sell)?;

    let cost = imbalance
        .values()
        .iter()
        .zip(price_buy.values())
        .zip(price_sell.values())
        .map(|((imbalance, buy), sell)| {
            let (grid_import, grid_export) = split_grid_exchange(*imbalance);
            settlement_cost(grid_import, grid_export, *buy, *sell, dt)
        })
        .sum();

    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{alternating_imbalance, battery_config, flat_prices, imbalance, prices};
    use crate::units::{Dimensionless, Energy, Power};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    const TOLERANCE: f64 = 1e-6;

    fn optimise(
        config: &BatteryConfig,
        imbalance: &ImbalanceSeries,
        price_buy: &PriceSeries,
        price_sell: &PriceSeries,
    ) -> OptimisationResult {
        perform_dispatch_optimisation(
            config,
            imbalance,
            price_buy,
            price_sell,
            Hours(1.0),
            &DispatchOptions::default(),
        )
        .unwrap()
    }

    /// A deterministic but irregular two-day profile at hourly resolution
    fn varied_inputs() -> (ImbalanceSeries, PriceSeries, PriceSeries) {
        let imbalance_values: Vec<f64> = (0..48)
            .map(|t| {
                let t = t as f64;
                30.0 * (t * 0.4).sin() + 12.0 * (t * 1.3).cos() - 4.0
            })
            .collect();
        let buy_values: Vec<f64> = (0..48)
            .map(|t| 0.25 + 0.15 * ((t as f64) * 0.26).sin())
            .collect();
        let sell_values: Vec<f64> = buy_values.iter().map(|p| 0.6 * p).collect();

        (
            imbalance(&imbalance_values),
            prices(&buy_values),
            prices(&sell_values),
        )
    }

    #[rstest]
    fn test_alternating_imbalance_flat_prices(
        battery_config: BatteryConfig,
        alternating_imbalance: ImbalanceSeries,
    ) {
        let price = flat_prices(0.2, 4);
        let result = optimise(&battery_config, &alternating_imbalance, &price, &price);
        let baseline =
            calculate_baseline_cost(&alternating_imbalance, &price, &price, Hours(1.0)).unwrap();

        assert!(result.objective_cost() < baseline);
        assert!(result.objective_cost() < Money(4.0));

        // With no value placed on the final charge, everything stored is sold off and charging
        // from surplus never pays back its losses
        let delivered = 50.0 * 0.9_f64.sqrt();
        assert_approx_eq!(
            f64,
            result.objective_cost().value(),
            -0.2 * delivered,
            epsilon = 1e-5
        );
        for step in result.schedule().iter() {
            assert!(step.charge_kw.value() < TOLERANCE);
        }
        let final_soc = result.schedule().iter().last().unwrap().soc_kwh;
        assert_approx_eq!(f64, final_soc.value(), 0.0, epsilon = 1e-5);
    }

    #[rstest]
    fn test_asymmetric_prices_terminal_soc(
        battery_config: BatteryConfig,
        alternating_imbalance: ImbalanceSeries,
    ) {
        let options = DispatchOptions {
            terminal_soc_at_least_initial: true,
            ..DispatchOptions::default()
        };
        let buy = flat_prices(0.3, 4);
        let sell = flat_prices(0.1, 4);
        let result = perform_dispatch_optimisation(
            &battery_config,
            &alternating_imbalance,
            &buy,
            &sell,
            Hours(1.0),
            &options,
        )
        .unwrap();

        // All surplus is stored and 90% of it is returned to cover the deficits
        assert_approx_eq!(f64, result.objective_cost().value(), 0.6, epsilon = 1e-5);
        assert_approx_eq!(
            f64,
            result.schedule().iter().map(|s| s.charge_kw.value()).sum::<f64>(),
            20.0,
            epsilon = 1e-5
        );
        let final_soc = result.schedule().iter().last().unwrap().soc_kwh;
        assert!(final_soc.value() >= 50.0 - 1e-5);
    }

    #[rstest]
    fn test_schedule_invariants(battery_config: BatteryConfig) {
        let (imbalance, buy, sell) = varied_inputs();
        let config = BatteryConfig {
            degradation_cost_per_kwh_throughput: MoneyPerEnergy(0.01),
            ..battery_config
        };
        let result = optimise(&config, &imbalance, &buy, &sell);
        let eta = config.one_way_efficiency().value();

        assert!(result.feasible());
        assert_eq!(result.schedule().len(), imbalance.len());
        let mut previous_soc = config.initial_soc().value();
        for (step, imbalance) in result.schedule().iter().zip(imbalance.values()) {
            let soc = step.soc_kwh.value();
            assert!((0.0..=config.capacity_kwh.value()).contains(&soc));
            assert!(step.charge_kw.min(step.discharge_kw).value() < TOLERANCE);
            assert!(step.charge_kw.value() <= config.power_kw.value() + TOLERANCE);
            assert!(step.discharge_kw.value() <= config.power_kw.value() + TOLERANCE);

            let balance = imbalance.value() + step.charge_kw.value()
                - step.discharge_kw.value()
                - step.grid_import_kw.value()
                + step.grid_export_kw.value();
            assert_approx_eq!(f64, balance, 0.0, epsilon = TOLERANCE);

            let expected_soc = previous_soc + step.charge_kw.value() * eta
                - step.discharge_kw.value() / eta;
            assert_approx_eq!(f64, soc, expected_soc, epsilon = TOLERANCE);
            previous_soc = soc;
        }

        // Costs add up
        let total: Money = result
            .schedule()
            .iter()
            .map(|s| s.settlement_cost + s.degradation_cost)
            .sum();
        assert_approx_eq!(Money, total, result.objective_cost(), epsilon = 1e-9);
        assert_approx_eq!(
            Money,
            result.residual_settlement_cost() + result.degradation_cost(),
            result.objective_cost(),
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_soc_window(battery_config: BatteryConfig) {
        let (imbalance, buy, sell) = varied_inputs();
        let config = BatteryConfig {
            min_soc_fraction: Dimensionless(0.2),
            max_soc_fraction: Dimensionless(0.8),
            ..battery_config
        };
        let result = optimise(&config, &imbalance, &buy, &sell);
        for step in result.schedule().iter() {
            assert!((20.0..=80.0).contains(&step.soc_kwh.value()));
        }
    }

    #[rstest]
    fn test_higher_buy_price_never_lowers_cost(battery_config: BatteryConfig) {
        let (imbalance, buy, sell) = varied_inputs();
        let before = optimise(&battery_config, &imbalance, &buy, &sell);

        for t in [0, 17, 40] {
            let raised = PriceSeries::new(buy.iter().map(|(timestep, price)| {
                if timestep == t {
                    (timestep, price + MoneyPerEnergy(0.5))
                } else {
                    (timestep, price)
                }
            }))
            .unwrap();
            let after = optimise(&battery_config, &imbalance, &raised, &sell);
            assert!(after.objective_cost().value() >= before.objective_cost().value() - 1e-4);
        }
    }

    #[rstest]
    #[case(Energy(100.0), Power(0.0))]
    #[case(Energy(0.0), Power(50.0))]
    fn test_inert_battery_matches_baseline(
        battery_config: BatteryConfig,
        #[case] capacity: Energy,
        #[case] power: Power,
    ) {
        let (imbalance, buy, sell) = varied_inputs();
        let config = battery_config.resized(capacity, power);
        let result = optimise(&config, &imbalance, &buy, &sell);
        let baseline = calculate_baseline_cost(&imbalance, &buy, &sell, Hours(1.0)).unwrap();

        for step in result.schedule().iter() {
            assert_eq!(step.charge_kw, Power(0.0));
            assert_eq!(step.discharge_kw, Power(0.0));
        }
        assert_eq!(result.objective_cost(), baseline);
        assert_eq!(result.degradation_cost(), Money(0.0));
    }

    #[rstest]
    #[case(1)]
    #[case(24)]
    fn test_zero_imbalance_empty_battery(battery_config: BatteryConfig, #[case] len: usize) {
        let config = BatteryConfig {
            initial_soc_fraction: Dimensionless(0.0),
            ..battery_config
        };
        let price = flat_prices(0.2, len);
        let zero = imbalance(&vec![0.0; len]);
        let result = optimise(&config, &zero, &price, &price);

        assert_eq!(result.objective_cost(), Money(0.0));
        for step in result.schedule().iter() {
            assert_eq!(step.soc_kwh, Energy(0.0));
        }
    }

    #[rstest]
    fn test_zero_imbalance_keeps_initial_charge(battery_config: BatteryConfig) {
        let config = battery_config;
        let options = DispatchOptions {
            terminal_soc_at_least_initial: true,
            ..DispatchOptions::default()
        };
        let price = flat_prices(0.2, 12);
        let zero = imbalance(&[0.0; 12]);
        let result =
            perform_dispatch_optimisation(&config, &zero, &price, &price, Hours(1.0), &options)
                .unwrap();

        assert_eq!(result.objective_cost(), Money(0.0));
        for step in result.schedule().iter() {
            assert_eq!(step.soc_kwh, config.initial_soc());
        }
    }

    #[rstest]
    fn test_idle_battery_self_discharges(battery_config: BatteryConfig) {
        // Selling is worthless, so a full battery just sits and loses 1% per hour
        let config = BatteryConfig {
            initial_soc_fraction: Dimensionless(1.0),
            self_discharge_per_hour: Dimensionless(0.01),
            ..battery_config
        };
        let result = optimise(&config, &imbalance(&[0.0]), &prices(&[0.2]), &prices(&[0.0]));

        let step = result.schedule().iter().next().unwrap();
        assert_eq!(step.charge_kw, Power(0.0));
        assert_eq!(step.discharge_kw, Power(0.0));
        assert_approx_eq!(f64, step.soc_kwh.value(), 99.0, epsilon = 1e-9);
        assert_eq!(result.objective_cost(), Money(0.0));
    }

    #[rstest]
    fn test_terminal_soc_replaces_self_discharge(battery_config: BatteryConfig) {
        let config = BatteryConfig {
            self_discharge_per_hour: Dimensionless(0.01),
            ..battery_config
        };
        let options = DispatchOptions {
            terminal_soc_at_least_initial: true,
            ..DispatchOptions::default()
        };
        let zero = imbalance(&[0.0; 3]);
        let result = perform_dispatch_optimisation(
            &config,
            &zero,
            &flat_prices(0.2, 3),
            &flat_prices(0.0, 3),
            Hours(1.0),
            &options,
        )
        .unwrap();

        let final_soc = result.schedule().iter().last().unwrap().soc_kwh;
        assert!(final_soc.value() >= 50.0 - 1e-6);

        // The lost energy has to be bought back from the grid
        let bought: f64 = result
            .schedule()
            .iter()
            .map(|s| s.grid_import_kw.value())
            .sum();
        assert!(bought > 1.0);
        assert_approx_eq!(f64, result.objective_cost().value(), 0.2 * bought, epsilon = 1e-9);
    }

    #[rstest]
    fn test_self_discharge_too_fast_to_hold(
        battery_config: BatteryConfig,
        alternating_imbalance: ImbalanceSeries,
    ) {
        let config = BatteryConfig {
            self_discharge_per_hour: Dimensionless(0.5),
            min_soc_fraction: Dimensionless(0.5),
            ..battery_config
        }
        .resized(Energy(100.0), Power(1.0));
        let price = flat_prices(0.2, 4);
        assert!(matches!(
            perform_dispatch_optimisation(
                &config,
                &alternating_imbalance,
                &price,
                &price,
                Hours(1.0),
                &DispatchOptions::default()
            ),
            Err(DispatchError::Configuration(_))
        ));
    }

    #[rstest]
    fn test_quarter_hour_steps(battery_config: BatteryConfig) {
        // Discharge at full power for one quarter hour to cover a deficit
        let config = BatteryConfig {
            initial_soc_fraction: Dimensionless(1.0),
            round_trip_efficiency: Dimensionless(1.0),
            ..battery_config
        };
        let options = DispatchOptions::default();
        let result = perform_dispatch_optimisation(
            &config,
            &imbalance(&[40.0]),
            &prices(&[0.3]),
            &prices(&[0.0]),
            Hours(0.25),
            &options,
        )
        .unwrap();
        let step = &result.schedule().iter().next().unwrap();
        assert_approx_eq!(f64, step.discharge_kw.value(), 40.0, epsilon = 1e-6);
        assert_approx_eq!(f64, step.soc_kwh.value(), 90.0, epsilon = 1e-6);
        assert_approx_eq!(f64, result.objective_cost().value(), 0.0, epsilon = 1e-6);
    }

    #[rstest]
    fn test_empty_horizon(battery_config: BatteryConfig) {
        let empty = prices(&[]);
        assert!(matches!(
            perform_dispatch_optimisation(
                &battery_config,
                &imbalance(&[]),
                &empty,
                &empty,
                Hours(1.0),
                &DispatchOptions::default()
            ),
            Err(DispatchError::InputAlignment(_))
        ));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    fn test_bad_time_step(
        battery_config: BatteryConfig,
        alternating_imbalance: ImbalanceSeries,
        #[case] dt: f64,
    ) {
        let price = flat_prices(0.2, 4);
        assert!(matches!(
            perform_dispatch_optimisation(
                &battery_config,
                &alternating_imbalance,
                &price,
                &price,
                Hours(dt),
                &DispatchOptions::default()
            ),
            Err(DispatchError::Configuration(_))
        ));
    }

    #[rstest]
    fn test_zero_iteration_limit(
        battery_config: BatteryConfig,
        alternating_imbalance: ImbalanceSeries,
    ) {
        let price = flat_prices(0.2, 4);
        let options = DispatchOptions {
            iteration_limit: 0,
            ..DispatchOptions::default()
        };
        assert!(matches!(
            perform_dispatch_optimisation(
                &battery_config,
                &alternating_imbalance,
                &price,
                &price,
                Hours(1.0),
                &options
            ),
            Err(DispatchError::Configuration(_))
        ));
    }

    #[test]
    fn test_calculate_baseline_cost() {
        let cost = calculate_baseline_cost(
            &imbalance(&[10.0, -10.0, 0.0]),
            &prices(&[0.3, 0.3, 0.3]),
            &prices(&[0.1, 0.1, 0.1]),
            Hours(0.25),
        )
        .unwrap();
        assert_approx_eq!(Money, cost, Money(0.5));
    }

    #[test]
    fn test_variable_kind_columns() {
        assert_eq!(VariableKind::Charge.columns(4), 0..4);
        assert_eq!(VariableKind::Soc.columns(4), 8..12);
        assert_eq!(VariableKind::GridExport.columns(4), 16..20);
    }
}
