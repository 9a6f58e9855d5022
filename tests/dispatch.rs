//! Integration tests for the dispatch optimisation on the bundled example scenarios.
use battery_appraisal::dispatch::{calculate_baseline_cost, perform_dispatch_optimisation};
use battery_appraisal::finance::calculate_economic_metrics_scaled;
use battery_appraisal::input::{Scenario, load_scenario};
use battery_appraisal::units::{Energy, Power};
use float_cmp::assert_approx_eq;
use std::path::Path;

const TOLERANCE: f64 = 1e-6;

fn scenario(name: &str) -> Scenario {
    load_scenario(&Path::new("demos").join(name)).unwrap()
}

#[test]
fn test_schedule_respects_physics() {
    for name in ["simple", "sweep"] {
        let scenario = scenario(name);
        let config = &scenario.battery;
        let result = perform_dispatch_optimisation(
            config,
            &scenario.imbalance,
            &scenario.price_buy,
            &scenario.price_sell,
            scenario.dt_hours,
            &scenario.dispatch,
        )
        .unwrap();
        let (soc_min, soc_max) = config.soc_limits();
        let eta = config.one_way_efficiency().value();
        let retention = config.retention(scenario.dt_hours).value();
        let dt = scenario.dt_hours.value();

        let mut previous_soc = config.initial_soc().value();
        for (step, imbalance) in result.schedule().iter().zip(scenario.imbalance.values()) {
            assert!(step.soc_kwh >= soc_min && step.soc_kwh <= soc_max);
            assert!(step.charge_kw.min(step.discharge_kw).value() < TOLERANCE);
            assert!(step.grid_import_kw.min(step.grid_export_kw) == Power(0.0));

            let balance = imbalance.value() + step.charge_kw.value()
                - step.discharge_kw.value()
                - step.grid_import_kw.value()
                + step.grid_export_kw.value();
            assert_approx_eq!(f64, balance, 0.0, epsilon = TOLERANCE);

            let expected_soc = previous_soc * retention
                + (step.charge_kw.value() * eta - step.discharge_kw.value() / eta) * dt;
            assert_approx_eq!(f64, step.soc_kwh.value(), expected_soc, epsilon = TOLERANCE);
            previous_soc = step.soc_kwh.value();
        }

        if scenario.dispatch.terminal_soc_at_least_initial {
            assert!(previous_soc >= config.initial_soc().value() - TOLERANCE);
        }

        // The battery can always be left idle, so it never does worse than the baseline
        let baseline = calculate_baseline_cost(
            &scenario.imbalance,
            &scenario.price_buy,
            &scenario.price_sell,
            scenario.dt_hours,
        )
        .unwrap();
        assert!(result.objective_cost().value() <= baseline.value() + TOLERANCE);
    }
}

#[test]
fn test_yearly_savings_do_not_drain_the_battery() {
    // Costs for one week are scaled up to a year, so the week must not end with less charge
    let scenario = scenario("simple");
    assert!(scenario.extrapolate_to_year);
    assert!(scenario.dispatch.terminal_soc_at_least_initial);

    let result = perform_dispatch_optimisation(
        &scenario.battery,
        &scenario.imbalance,
        &scenario.price_buy,
        &scenario.price_sell,
        scenario.dt_hours,
        &scenario.dispatch,
    )
    .unwrap();
    let final_soc = result.schedule().iter().last().unwrap().soc_kwh;
    assert!(final_soc.value() >= scenario.battery.initial_soc().value() - TOLERANCE);
}

#[test]
fn test_inert_battery_has_no_savings() {
    let scenario = scenario("simple");
    let config = scenario.battery.resized(Energy(100.0), Power(0.0));
    let result = perform_dispatch_optimisation(
        &config,
        &scenario.imbalance,
        &scenario.price_buy,
        &scenario.price_sell,
        scenario.dt_hours,
        &scenario.dispatch,
    )
    .unwrap();
    let baseline = calculate_baseline_cost(
        &scenario.imbalance,
        &scenario.price_buy,
        &scenario.price_sell,
        scenario.dt_hours,
    )
    .unwrap();
    assert_eq!(result.objective_cost(), baseline);

    // Only the investment is left, so the savings are exactly minus the annualised investment
    let metrics = calculate_economic_metrics_scaled(
        &result,
        &config,
        baseline,
        scenario.annualisation_factor(),
    );
    assert_approx_eq!(
        f64,
        metrics.annual_savings.value(),
        -metrics.annualised_investment_cost.value(),
        epsilon = 1e-6
    );
    assert!(metrics.payback.years().is_none());
}
