//! Fixtures for tests
use crate::battery::BatteryConfig;
use crate::series::{ImbalanceSeries, PriceSeries};
use crate::units::{Dimensionless, Energy, MoneyPerEnergy, Power};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Create an imbalance series with timesteps starting at zero
pub fn imbalance(values: &[f64]) -> ImbalanceSeries {
    ImbalanceSeries::from_values(values.iter().copied().map(Power))
}

/// Create a price series with timesteps starting at zero
pub fn prices(values: &[f64]) -> PriceSeries {
    PriceSeries::from_values(values.iter().copied().map(MoneyPerEnergy))
}

/// Create a flat price series
pub fn flat_prices(price: f64, len: usize) -> PriceSeries {
    PriceSeries::from_values(std::iter::repeat_n(MoneyPerEnergy(price), len))
}

#[fixture]
pub fn battery_config() -> BatteryConfig {
    BatteryConfig {
        capacity_kwh: Energy(100.0),
        power_kw: Power(50.0),
        round_trip_efficiency: Dimensionless(0.9),
        initial_soc_fraction: Dimensionless(0.5),
        min_soc_fraction: Dimensionless(0.0),
        max_soc_fraction: Dimensionless(1.0),
        self_discharge_per_hour: Dimensionless(0.0),
        investment_cost_per_kwh: MoneyPerEnergy(475.0),
        lifetime_years: 15,
        degradation_cost_per_kwh_throughput: MoneyPerEnergy(0.0),
        discount_rate: Dimensionless(0.05),
    }
}

/// The alternating surplus/deficit imbalance used in several tests
#[fixture]
pub fn alternating_imbalance() -> ImbalanceSeries {
    imbalance(&[10.0, -10.0, 10.0, -10.0])
}
