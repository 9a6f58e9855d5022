//! Code for adding constraints to the dispatch optimisation problem.
use super::VariableMap;
use crate::battery::BatteryConfig;
use crate::series::ImbalanceSeries;
use crate::units::Hours;
use highs::RowProblem as Problem;

/// Add constraints requiring the facility imbalance to be met in every timestep.
///
/// For each timestep:
///
/// ```text
/// imbalance + charge - discharge - grid_import + grid_export = 0
/// ```
pub fn add_power_balance_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    imbalance: &ImbalanceSeries,
) {
    for (t, imbalance) in imbalance.values().iter().enumerate() {
        let rhs = -imbalance.value();
        problem.add_row(
            rhs..=rhs,
            [
                (variables.charge[t], 1.0),
                (variables.discharge[t], -1.0),
                (variables.grid_import[t], -1.0),
                (variables.grid_export[t], 1.0),
            ],
        );
    }
}

/// Add constraints linking the state of charge in consecutive timesteps.
///
/// Charging losses are applied on the way in and discharging losses on the way out, and the
/// charge carried over from the previous timestep is reduced by self-discharge:
///
/// ```text
/// soc[t] = retention * soc[t-1] + eta * dt * charge[t] - dt / eta * discharge[t]
/// ```
///
/// where `soc[-1]` is the initial state of charge and `retention = (1 - self_discharge)^dt`.
pub fn add_soc_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    config: &BatteryConfig,
    dt: Hours,
) {
    let eta = config.one_way_efficiency().value();
    let retention = config.retention(dt).value();
    let dt = dt.value();
    let initial_soc = config.initial_soc().value();

    for (t, soc) in variables.soc.iter().enumerate() {
        let mut terms = vec![
            (*soc, 1.0),
            (variables.charge[t], -eta * dt),
            (variables.discharge[t], dt / eta),
        ];

        // The initial condition is a constant, so it moves to the right-hand side
        let rhs = if t == 0 {
            retention * initial_soc
        } else {
            terms.push((variables.soc[t - 1], -retention));
            0.0
        };
        problem.add_row(rhs..=rhs, terms);
    }
}

/// Add a constraint requiring the battery to finish with at least its initial charge
pub fn add_terminal_soc_constraint(
    problem: &mut Problem,
    variables: &VariableMap,
    config: &BatteryConfig,
) {
    if let Some(last) = variables.soc.last() {
        problem.add_row(config.initial_soc().value().., [(*last, 1.0)]);
    }
}
