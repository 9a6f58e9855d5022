//! The physical and economic description of a battery.
use crate::error::{DispatchError, DispatchResult};
use crate::units::{Dimensionless, Energy, Hours, Money, MoneyPerEnergy, Power};
use serde::{Deserialize, Serialize};

fn default_min_soc_fraction() -> Dimensionless {
    Dimensionless(0.0)
}

fn default_max_soc_fraction() -> Dimensionless {
    Dimensionless(1.0)
}

/// Storage limits, initial condition and investment assumptions for a battery.
///
/// A configuration is created once per scenario and is never mutated. Use [`BatteryConfig::resized`]
/// to derive a configuration for a different battery size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatteryConfig {
    /// Usable storage capacity
    pub capacity_kwh: Energy,
    /// Maximum charge and discharge power
    pub power_kw: Power,
    /// Fraction of energy recovered after a full charge and discharge cycle
    pub round_trip_efficiency: Dimensionless,
    /// State of charge at the start of the horizon, as a fraction of capacity
    pub initial_soc_fraction: Dimensionless,
    /// Lowest permitted state of charge, as a fraction of capacity
    #[serde(default = "default_min_soc_fraction")]
    pub min_soc_fraction: Dimensionless,
    /// Highest permitted state of charge, as a fraction of capacity
    #[serde(default = "default_max_soc_fraction")]
    pub max_soc_fraction: Dimensionless,
    /// Fraction of the stored energy lost per hour while the battery sits idle
    #[serde(default)]
    pub self_discharge_per_hour: Dimensionless,
    /// Upfront cost per kWh of capacity
    pub investment_cost_per_kwh: MoneyPerEnergy,
    /// Economic lifetime of the battery
    pub lifetime_years: u32,
    /// Wear cost per kWh charged or discharged
    #[serde(default)]
    pub degradation_cost_per_kwh_throughput: MoneyPerEnergy,
    /// Discount rate used to annualise the investment
    #[serde(default)]
    pub discount_rate: Dimensionless,
}

/// Check that a fraction is finite and between 0 and 1
fn check_fraction(name: &str, value: Dimensionless) -> DispatchResult<()> {
    if !(value.is_finite() && (0.0..=1.0).contains(&value.value())) {
        return Err(DispatchError::Configuration(format!(
            "{name} must be between 0 and 1 (got {value})"
        )));
    }

    Ok(())
}

/// Check that a quantity is finite and not negative
fn check_non_negative(name: &str, value: f64) -> DispatchResult<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(DispatchError::Configuration(format!(
            "{name} must be a finite, non-negative number (got {value})"
        )));
    }

    Ok(())
}

impl BatteryConfig {
    /// Check that all parameters are within their permitted ranges
    pub fn validate(&self) -> DispatchResult<()> {
        check_non_negative("capacity_kwh", self.capacity_kwh.value())?;
        check_non_negative("power_kw", self.power_kw.value())?;

        let efficiency = self.round_trip_efficiency;
        if !(efficiency.is_finite() && efficiency.value() > 0.0 && efficiency.value() <= 1.0) {
            return Err(DispatchError::Configuration(format!(
                "round_trip_efficiency must be in the range (0, 1] (got {efficiency})"
            )));
        }

        check_fraction("initial_soc_fraction", self.initial_soc_fraction)?;
        check_fraction("min_soc_fraction", self.min_soc_fraction)?;
        check_fraction("max_soc_fraction", self.max_soc_fraction)?;
        if !(self.min_soc_fraction <= self.initial_soc_fraction
            && self.initial_soc_fraction <= self.max_soc_fraction)
        {
            return Err(DispatchError::Configuration(format!(
                "SOC fractions must satisfy min <= initial <= max (got {} <= {} <= {})",
                self.min_soc_fraction, self.initial_soc_fraction, self.max_soc_fraction
            )));
        }

        let self_discharge = self.self_discharge_per_hour;
        if !(self_discharge.is_finite() && (0.0..1.0).contains(&self_discharge.value())) {
            return Err(DispatchError::Configuration(format!(
                "self_discharge_per_hour must be in the range [0, 1) (got {self_discharge})"
            )));
        }

        check_non_negative(
            "investment_cost_per_kwh",
            self.investment_cost_per_kwh.value(),
        )?;
        if self.lifetime_years == 0 {
            return Err(DispatchError::Configuration(
                "lifetime_years must be greater than zero".into(),
            ));
        }
        check_non_negative(
            "degradation_cost_per_kwh_throughput",
            self.degradation_cost_per_kwh_throughput.value(),
        )?;
        check_non_negative("discount_rate", self.discount_rate.value())?;

        Ok(())
    }

    /// The efficiency applied to each of the charge and discharge legs.
    ///
    /// The round-trip losses are split evenly between the two legs.
    pub fn one_way_efficiency(&self) -> Dimensionless {
        self.round_trip_efficiency.sqrt()
    }

    /// The fraction of the stored energy kept over a timestep of length `dt`.
    ///
    /// An inert battery is treated as holding its charge, so it stays equivalent to having no
    /// battery at all.
    pub fn retention(&self, dt: Hours) -> Dimensionless {
        if self.is_inert() {
            return Dimensionless(1.0);
        }

        Dimensionless((1.0 - self.self_discharge_per_hour.value()).powf(dt.value()))
    }

    /// Check that the battery can recharge fast enough to make up for self-discharge.
    ///
    /// Starting from `floor`, the energy lost in one timestep must not exceed what the battery can
    /// put back in at full power, otherwise the state of charge cannot be kept at the floor.
    pub fn check_self_discharge(&self, floor: Energy, dt: Hours) -> DispatchResult<()> {
        let loss = floor * (Dimensionless(1.0) - self.retention(dt));
        let recharge = self.power_kw * dt * self.one_way_efficiency();
        if loss > recharge {
            return Err(DispatchError::Configuration(format!(
                "self-discharge loses {loss} kWh per timestep from {floor} kWh, but the battery can \
                only recharge {recharge} kWh"
            )));
        }

        Ok(())
    }

    /// The stored energy at the start of the horizon
    pub fn initial_soc(&self) -> Energy {
        self.capacity_kwh * self.initial_soc_fraction
    }

    /// The lowest and highest permitted stored energy
    pub fn soc_limits(&self) -> (Energy, Energy) {
        (
            self.capacity_kwh * self.min_soc_fraction,
            self.capacity_kwh * self.max_soc_fraction,
        )
    }

    /// Whether the battery can neither store nor move any energy
    pub fn is_inert(&self) -> bool {
        self.capacity_kwh == Energy(0.0) || self.power_kw == Power(0.0)
    }

    /// The upfront cost of buying the battery
    pub fn investment_cost(&self) -> Money {
        self.investment_cost_per_kwh * self.capacity_kwh
    }

    /// A copy of this configuration for a battery of a different size
    pub fn resized(&self, capacity_kwh: Energy, power_kw: Power) -> Self {
        Self {
            capacity_kwh,
            power_kw,
            ..self.clone()
        }
    }
}
