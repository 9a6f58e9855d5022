//! The module responsible for writing output data to disk.
use crate::appraisal::{Appraisal, ScenarioAppraisal};
use crate::dispatch::OptimisationResult;
use crate::input::{BatterySize, Scenario};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which scenario-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "battery_appraisal_results";

/// The output file name for the dispatch schedule
const SCHEDULE_FILE_NAME: &str = "schedule.csv";

/// The output file name for the cost and metrics summary
const SUMMARY_FILE_NAME: &str = "summary.toml";

/// The output file name for the battery size sweep
const SWEEP_FILE_NAME: &str = "sweep.csv";

/// Get the default output directory for the specified scenario directory
pub fn get_output_dir(scenario_dir: &Path) -> Result<PathBuf> {
    // Get the scenario name from the dir path. This ends up being convoluted because we need to
    // check for all possible errors. Ugh.
    let scenario_dir = scenario_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to scenario")?;

    let scenario_name = scenario_dir
        .file_name()
        .context("Scenario cannot be in root folder")?
        .to_str()
        .context("Invalid chars in scenario dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, scenario_name].iter().collect())
}

/// Create a new output directory for a scenario, optionally overwriting existing data.
///
/// # Returns
///
/// Whether an existing, non-empty directory was removed.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut entries) = fs::read_dir(output_dir) {
        if entries.next().is_none() {
            // Directory exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass \
            the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the schedule CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ScheduleRow {
    timestep: u32,
    charge_kw: f64,
    discharge_kw: f64,
    soc_kwh: f64,
    grid_import_kw: f64,
    grid_export_kw: f64,
    settlement_cost: f64,
    degradation_cost: f64,
}

/// Represents a row in the sweep CSV file.
///
/// ROI and payback are left empty when they have no finite value.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SweepRow {
    capacity_kwh: f64,
    power_kw: f64,
    objective_cost: f64,
    annualised_investment_cost: f64,
    annual_savings: f64,
    npv: f64,
    roi: Option<f64>,
    payback_years: Option<f64>,
}

impl SweepRow {
    /// Create a new [`SweepRow`]
    fn new(size: &BatterySize, appraisal: &Appraisal) -> Self {
        let metrics = &appraisal.metrics;
        Self {
            capacity_kwh: size.capacity_kwh.value(),
            power_kw: size.power_kw.value(),
            objective_cost: appraisal.result.objective_cost().value(),
            annualised_investment_cost: metrics.annualised_investment_cost.value(),
            annual_savings: metrics.annual_savings.value(),
            npv: metrics.npv.value(),
            roi: metrics.roi.fraction().map(|roi| roi.value()),
            payback_years: metrics.payback.years().map(|years| years.value()),
        }
    }
}

/// The contents of the summary file.
///
/// Undefined payback and unbounded ROI are omitted, and flagged instead.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Summary {
    timesteps: usize,
    dt_hours: f64,
    annualisation_factor: f64,
    solver_status: String,
    baseline_cost: f64,
    objective_cost: f64,
    residual_settlement_cost: f64,
    degradation_cost: f64,
    total_throughput_kwh: f64,
    investment_cost: f64,
    capital_recovery_factor: f64,
    annualised_investment_cost: f64,
    annual_savings: f64,
    npv: f64,
    roi_bounded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    roi: Option<f64>,
    payback_defined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    payback_years: Option<f64>,
}

impl Summary {
    /// Create a new [`Summary`]
    fn new(scenario: &Scenario, appraisal: &ScenarioAppraisal) -> Self {
        let result = &appraisal.base.result;
        let metrics = &appraisal.base.metrics;
        let roi = metrics.roi.fraction().map(|roi| roi.value());
        let payback_years = metrics.payback.years().map(|years| years.value());

        Self {
            timesteps: result.schedule().len(),
            dt_hours: scenario.dt_hours.value(),
            annualisation_factor: scenario.annualisation_factor().value(),
            solver_status: result.solver_status().to_string(),
            baseline_cost: appraisal.baseline_cost.value(),
            objective_cost: result.objective_cost().value(),
            residual_settlement_cost: result.residual_settlement_cost().value(),
            degradation_cost: result.degradation_cost().value(),
            total_throughput_kwh: result.schedule().throughput(scenario.dt_hours).value(),
            investment_cost: metrics.investment_cost.value(),
            capital_recovery_factor: metrics.capital_recovery_factor.value(),
            annualised_investment_cost: metrics.annualised_investment_cost.value(),
            annual_savings: metrics.annual_savings.value(),
            npv: metrics.npv.value(),
            roi_bounded: roi.is_some(),
            roi,
            payback_defined: payback_years.is_some(),
            payback_years,
        }
    }
}

/// An object for writing appraisal results to file
pub struct DataWriter {
    output_path: PathBuf,
    schedule_writer: csv::Writer<File>,
    sweep_writer: Option<csv::Writer<File>>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_sweep` - Whether to create a CSV file for the battery size sweep
    pub fn create(output_path: &Path, save_sweep: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let sweep_writer = if save_sweep {
            Some(new_writer(SWEEP_FILE_NAME)?)
        } else {
            None
        };

        Ok(Self {
            output_path: output_path.to_path_buf(),
            schedule_writer: new_writer(SCHEDULE_FILE_NAME)?,
            sweep_writer,
        })
    }

    /// Write the dispatch schedule to a CSV file
    pub fn write_schedule(&mut self, result: &OptimisationResult) -> Result<()> {
        for step in result.schedule().iter() {
            let row = ScheduleRow {
                timestep: step.timestep,
                charge_kw: step.charge_kw.value(),
                discharge_kw: step.discharge_kw.value(),
                soc_kwh: step.soc_kwh.value(),
                grid_import_kw: step.grid_import_kw.value(),
                grid_export_kw: step.grid_export_kw.value(),
                settlement_cost: step.settlement_cost.value(),
                degradation_cost: step.degradation_cost.value(),
            };
            self.schedule_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the appraisal of each battery size to a CSV file
    pub fn write_sweep(&mut self, sweep: &[(BatterySize, Appraisal)]) -> Result<()> {
        if let Some(ref mut wtr) = self.sweep_writer {
            for (size, appraisal) in sweep {
                wtr.serialize(SweepRow::new(size, appraisal))?;
            }
        }

        Ok(())
    }

    /// Write the costs and economic metrics of the scenario's battery to a TOML file
    pub fn write_summary(&self, scenario: &Scenario, appraisal: &ScenarioAppraisal) -> Result<()> {
        let summary = Summary::new(scenario, appraisal);
        let file_path = self.output_path.join(SUMMARY_FILE_NAME);
        fs::write(&file_path, toml::to_string(&summary)?)
            .with_context(|| format!("Failed to write {}", file_path.display()))?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.schedule_writer.flush()?;
        if let Some(ref mut wtr) = self.sweep_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}
