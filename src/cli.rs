//! The command line interface for the program.
use crate::appraisal;
use crate::input::load_scenario;
use crate::log;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// Appraise whether a battery pays for itself by settling energy imbalances.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Appraise the battery in a scenario.
    Run {
        /// Path to the scenario directory.
        scenario_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example scenarios.
    Example {
        /// The available subcommands for managing example scenarios.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a scenario.
    Validate {
        /// The path to the scenario directory.
        scenario_dir: PathBuf,
    },
    /// Manage program settings.
    Settings {
        /// The subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { scenario_dir, opts } => handle_run_command(&scenario_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { scenario_dir } => handle_validate_command(&scenario_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ battery-appraisal --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Use the settings passed in by the caller, or read them from the settings file
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Handle the `run` command.
pub fn handle_run_command(
    scenario_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = settings_or_load(settings)?;
    let output_path = match &opts.output_dir {
        Some(dir) => dir.clone(),
        None => get_output_dir(scenario_path)?,
    };

    let overwriting = create_output_directory(&output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;
    log::init(&settings.log_level, Some(output_path.as_path()))
        .context("Failed to initialise logging.")?;
    if overwriting {
        // Only now that logging is up
        warn!("Overwriting output folder {}", output_path.display());
    }

    let scenario = load_scenario(scenario_path).context("Failed to load scenario.")?;
    info!(
        "Appraising {} into {}",
        scenario_path.display(),
        output_path.display()
    );
    appraisal::run(&scenario, &output_path)?;
    info!("Appraisal complete!");

    Ok(())
}

/// Handle the `validate` command.
///
/// No log files are written, as there is no output folder.
pub fn handle_validate_command(scenario_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    load_scenario(scenario_path).context("Failed to validate scenario.")?;
    info!("Scenario {} is valid", scenario_path.display());

    Ok(())
}
