//! Code for reading imbalance and price series from CSV files.
use super::{input_err_msg, read_csv};
use crate::series::{ImbalanceSeries, PriceSeries};
use crate::units::{MoneyPerEnergy, Power};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

/// A row of the imbalance CSV file
#[derive(Debug, PartialEq, Deserialize)]
struct ImbalanceRecord {
    timestep: u32,
    imbalance_kw: f64,
}

/// A row of the prices CSV file
#[derive(Debug, PartialEq, Deserialize)]
struct PriceRecord {
    timestep: u32,
    /// The price paid for energy bought from the grid
    price_positive: f64,
    /// The price received for energy sold to the grid
    price_negative: f64,
}

/// Check that each timestep is one more than the previous one
fn check_contiguous<I>(timesteps: I) -> Result<()>
where
    I: IntoIterator<Item = u32>,
{
    for (prev, next) in timesteps.into_iter().tuple_windows() {
        ensure!(
            prev.checked_add(1) == Some(next),
            "Timesteps must be contiguous, but {next} follows {prev}"
        );
    }

    Ok(())
}

/// Read the facility imbalance series from a CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to a CSV file with `timestep` and `imbalance_kw` columns
pub fn read_imbalance(file_path: &Path) -> Result<ImbalanceSeries> {
    let records = read_csv(file_path)?;
    read_imbalance_from_iter(records).with_context(|| input_err_msg(file_path))
}

fn read_imbalance_from_iter<I>(iter: I) -> Result<ImbalanceSeries>
where
    I: Iterator<Item = ImbalanceRecord>,
{
    let points = iter
        .map(|record| {
            ensure!(
                record.imbalance_kw.is_finite(),
                "Imbalance at timestep {} is not finite",
                record.timestep
            );
            Ok((record.timestep, Power(record.imbalance_kw)))
        })
        .collect::<Result<Vec<_>>>()?;
    check_contiguous(points.iter().map(|(timestep, _)| *timestep))?;

    Ok(ImbalanceSeries::new(points)?)
}

/// Read the buy and sell price series from a CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to a CSV file with `timestep`, `price_positive` (buy) and
///   `price_negative` (sell) columns
///
/// # Returns
///
/// The buy and sell price series
pub fn read_prices(file_path: &Path) -> Result<(PriceSeries, PriceSeries)> {
    let records = read_csv(file_path)?;
    read_prices_from_iter(records).with_context(|| input_err_msg(file_path))
}

fn read_prices_from_iter<I>(iter: I) -> Result<(PriceSeries, PriceSeries)>
where
    I: Iterator<Item = PriceRecord>,
{
    let records: Vec<PriceRecord> = iter.collect();
    check_contiguous(records.iter().map(|record| record.timestep))?;
    for record in &records {
        for price in [record.price_positive, record.price_negative] {
            ensure!(
                price.is_finite() && price >= 0.0,
                "Prices must be finite and non-negative (got {price} at timestep {})",
                record.timestep
            );
        }
    }

    let price_buy = PriceSeries::new(
        records
            .iter()
            .map(|record| (record.timestep, MoneyPerEnergy(record.price_positive))),
    )?;
    let price_sell = PriceSeries::new(
        records
            .iter()
            .map(|record| (record.timestep, MoneyPerEnergy(record.price_negative))),
    )?;

    Ok((price_buy, price_sell))
}
