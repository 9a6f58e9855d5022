//! Appraise whether a battery is cheaper than settling energy imbalances with the grid operator.
//!
//! The core of the crate is [`dispatch`], which finds the cost-minimising battery schedule for a
//! series of facility imbalances and prices, and [`finance`], which turns the result into
//! investment figures.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod appraisal;
pub mod battery;
pub mod cache;
pub mod cli;
pub mod dispatch;
pub mod error;
pub mod finance;
pub mod input;
pub mod log;
pub mod output;
pub mod series;
pub mod settings;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the directory in which the program's configuration files are stored
pub fn get_config_dir() -> PathBuf {
    let Some(mut dir) = dirs::config_dir() else {
        // No config directory for this platform: use the current directory instead
        return PathBuf::from(".");
    };
    dir.push("battery-appraisal");
    dir
}
