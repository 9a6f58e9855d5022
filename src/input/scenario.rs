//! Code for loading a scenario: the battery, solver options and input series to appraise.
use super::{input_err_msg, read_imbalance, read_prices, read_toml};
use crate::battery::BatteryConfig;
use crate::dispatch::DispatchOptions;
use crate::series::{ImbalanceSeries, PriceSeries, check_series};
use crate::units::{Dimensionless, Energy, Hours, Power};
use anyhow::{Context, Result, ensure};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SCENARIO_FILE_NAME: &str = "scenario.toml";

/// The number of hours in a (non-leap) year
pub const HOURS_PER_YEAR: Hours = Hours(8760.0);

fn default_imbalance_file() -> PathBuf {
    PathBuf::from("imbalance.csv")
}

fn default_prices_file() -> PathBuf {
    PathBuf::from("prices.csv")
}

fn default_extrapolate_to_year() -> bool {
    true
}

/// An alternative battery size to appraise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatterySize {
    /// Usable storage capacity
    pub capacity_kwh: Energy,
    /// Maximum charge and discharge power
    pub power_kw: Power,
}

/// The contents of `scenario.toml`
#[derive(Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    dt_hours: Hours,
    #[serde(default = "default_imbalance_file")]
    imbalance_file: PathBuf,
    #[serde(default = "default_prices_file")]
    prices_file: PathBuf,
    #[serde(default = "default_extrapolate_to_year")]
    extrapolate_to_year: bool,
    battery: BatteryConfig,
    #[serde(default)]
    dispatch: DispatchOptions,
    #[serde(default)]
    sweep: Vec<BatterySize>,
}

impl ScenarioFile {
    /// Check the parameters which don't depend on the input series
    fn validate(&self) -> Result<()> {
        ensure!(
            self.dt_hours.is_finite() && self.dt_hours > Hours(0.0),
            "dt_hours must be greater than zero"
        );
        self.battery.validate()?;
        self.dispatch.validate()?;
        for size in &self.sweep {
            self.battery
                .resized(size.capacity_kwh, size.power_kw)
                .validate()
                .with_context(|| {
                    format!(
                        "Invalid sweep size: {} kWh, {} kW",
                        size.capacity_kwh, size.power_kw
                    )
                })?;
        }

        Ok(())
    }
}

/// A battery, its solver options and the series it is appraised against
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// The duration of each timestep
    pub dt_hours: Hours,
    /// Whether to scale horizon costs up to a full year before computing economic metrics
    pub extrapolate_to_year: bool,
    /// The battery to appraise
    pub battery: BatteryConfig,
    /// Options for the dispatch optimisation
    pub dispatch: DispatchOptions,
    /// Additional battery sizes to appraise
    pub sweep: Vec<BatterySize>,
    /// Facility imbalance
    pub imbalance: ImbalanceSeries,
    /// Price paid for imported energy
    pub price_buy: PriceSeries,
    /// Price received for exported energy
    pub price_sell: PriceSeries,
}

impl Scenario {
    /// The total duration of the optimisation horizon
    pub fn horizon(&self) -> Hours {
        self.dt_hours * Dimensionless(self.imbalance.len() as f64)
    }

    /// The factor converting horizon costs into yearly costs
    pub fn annualisation_factor(&self) -> Dimensionless {
        if self.extrapolate_to_year {
            HOURS_PER_YEAR / self.horizon()
        } else {
            Dimensionless(1.0)
        }
    }
}

/// Load a scenario from the specified directory.
///
/// # Arguments
///
/// * `scenario_dir` - Folder containing `scenario.toml` and the input series
///
/// # Returns
///
/// The validated scenario or an error
pub fn load_scenario(scenario_dir: &Path) -> Result<Scenario> {
    let file_path = scenario_dir.join(SCENARIO_FILE_NAME);
    let file: ScenarioFile = read_toml(&file_path)?;
    file.validate().with_context(|| input_err_msg(&file_path))?;

    let imbalance = read_imbalance(&scenario_dir.join(&file.imbalance_file))?;
    let (price_buy, price_sell) = read_prices(&scenario_dir.join(&file.prices_file))?;
    check_series(&imbalance, &price_buy, &price_sell).with_context(|| {
        format!(
            "{} and {} do not describe the same horizon",
            file.imbalance_file.display(),
            file.prices_file.display()
        )
    })?;
    info!(
        "Loaded {} timesteps of {} h from {}",
        imbalance.len(),
        file.dt_hours,
        scenario_dir.display()
    );

    // A one-off drain of the initial charge must not be counted again for every horizon in a year
    let mut dispatch = file.dispatch;
    if file.extrapolate_to_year && !dispatch.terminal_soc_at_least_initial {
        info!("Costs are extrapolated to a year, so the battery must end with its initial charge");
        dispatch.terminal_soc_at_least_initial = true;
    }

    Ok(Scenario {
        dt_hours: file.dt_hours,
        extrapolate_to_year: file.extrapolate_to_year,
        battery: file.battery,
        dispatch,
        sweep: file.sweep,
        imbalance,
        price_buy,
        price_sell,
    })
}
