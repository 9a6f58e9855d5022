//! Time series of imbalances and prices consumed by the dispatch optimisation.
use crate::error::{DispatchError, DispatchResult};
use crate::units::{MoneyPerEnergy, Power};
use itertools::Itertools;

/// An ordered series of values indexed by strictly increasing timesteps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<T> {
    timesteps: Vec<u32>,
    values: Vec<T>,
}

/// Facility power imbalance (positive = deficit, negative = surplus)
pub type ImbalanceSeries = TimeSeries<Power>;

/// Settlement prices
pub type PriceSeries = TimeSeries<MoneyPerEnergy>;

impl<T: Copy> TimeSeries<T> {
    /// Create a new series from `(timestep, value)` pairs.
    ///
    /// Timesteps must be strictly increasing.
    pub fn new<I>(points: I) -> DispatchResult<Self>
    where
        I: IntoIterator<Item = (u32, T)>,
    {
        let (timesteps, values): (Vec<u32>, Vec<T>) = points.into_iter().unzip();
        if let Some((prev, next)) = timesteps.iter().tuple_windows().find(|(a, b)| a >= b) {
            return Err(DispatchError::InputAlignment(format!(
                "timesteps must be strictly increasing (found {next} after {prev})"
            )));
        }

        Ok(Self { timesteps, values })
    }

    /// Create a series with timesteps `0..values.len()`
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let values: Vec<T> = values.into_iter().collect();
        let timesteps = (0..).take(values.len()).collect();
        Self { timesteps, values }
    }

    /// The number of timesteps in the series
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The timestep indices
    pub fn timesteps(&self) -> &[u32] {
        &self.timesteps
    }

    /// The values, in timestep order
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterate over `(timestep, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (u32, T)> + '_ {
        self.timesteps.iter().copied().zip(self.values.iter().copied())
    }
}

/// Check that a series lies on exactly the same timesteps as the imbalance series
fn check_same_timesteps<T>(
    name: &str,
    imbalance: &ImbalanceSeries,
    other: &TimeSeries<T>,
) -> DispatchResult<()> {
    if other.values.len() != imbalance.len() {
        return Err(DispatchError::InputAlignment(format!(
            "{name} has {} timesteps but the imbalance series has {}",
            other.values.len(),
            imbalance.len()
        )));
    }

    if let Some((a, b)) = imbalance
        .timesteps
        .iter()
        .zip(other.timesteps.iter())
        .find(|(a, b)| a != b)
    {
        return Err(DispatchError::InputAlignment(format!(
            "{name} timestep {b} does not match imbalance timestep {a}"
        )));
    }

    Ok(())
}

/// Check that a price series only holds finite, non-negative values
fn check_prices(name: &str, prices: &PriceSeries) -> DispatchResult<()> {
    if let Some((timestep, price)) = prices
        .iter()
        .find(|(_, price)| !(price.is_finite() && *price >= MoneyPerEnergy(0.0)))
    {
        return Err(DispatchError::InvalidSeries(format!(
            "{name} at timestep {timestep} must be finite and non-negative (got {price})"
        )));
    }

    Ok(())
}

/// Check that the three input series describe the same horizon and hold usable values.
///
/// # Returns
///
/// The number of timesteps in the horizon.
pub fn check_series(
    imbalance: &ImbalanceSeries,
    price_buy: &PriceSeries,
    price_sell: &PriceSeries,
) -> DispatchResult<usize> {
    if imbalance.is_empty() {
        return Err(DispatchError::InputAlignment(
            "the optimisation horizon is empty".into(),
        ));
    }
    check_same_timesteps("price_buy", imbalance, price_buy)?;
    check_same_timesteps("price_sell", imbalance, price_sell)?;

    if let Some((timestep, value)) = imbalance.iter().find(|(_, value)| !value.is_finite()) {
        return Err(DispatchError::InvalidSeries(format!(
            "imbalance at timestep {timestep} is not finite (got {value})"
        )));
    }
    check_prices("price_buy", price_buy)?;
    check_prices("price_sell", price_sell)?;

    // Selling above the buying price would let the grid exchange alone make unlimited profit
    if let Some(((timestep, buy), (_, sell))) = price_buy
        .iter()
        .zip(price_sell.iter())
        .find(|((_, buy), (_, sell))| sell > buy)
    {
        return Err(DispatchError::InvalidSeries(format!(
            "price_sell ({sell}) exceeds price_buy ({buy}) at timestep {timestep}"
        )));
    }

    Ok(imbalance.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{imbalance, prices};
    use rstest::rstest;

    #[test]
    fn test_new_strictly_increasing() {
        let series = TimeSeries::new([(0, 1.0), (2, 2.0), (5, 3.0)]).unwrap();
        assert_eq!(series.timesteps(), &[0, 2, 5]);
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
    }

    #[rstest]
    #[case(&[(0, 1.0), (0, 2.0)])]
    #[case(&[(3, 1.0), (2, 2.0)])]
    fn test_new_not_increasing(#[case] points: &[(u32, f64)]) {
        assert!(matches!(
            TimeSeries::new(points.iter().copied()),
            Err(DispatchError::InputAlignment(_))
        ));
    }

    #[test]
    fn test_from_values() {
        let series = TimeSeries::from_values([4.0, 5.0]);
        assert_eq!(series.timesteps(), &[0, 1]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_check_series_ok() {
        let n = check_series(
            &imbalance(&[10.0, -10.0]),
            &prices(&[0.3, 0.3]),
            &prices(&[0.1, 0.3]),
        )
        .unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn test_check_series_empty() {
        assert!(matches!(
            check_series(&imbalance(&[]), &prices(&[]), &prices(&[])),
            Err(DispatchError::InputAlignment(_))
        ));
    }

    #[test]
    fn test_check_series_length_mismatch() {
        assert!(matches!(
            check_series(
                &imbalance(&[1.0, 2.0]),
                &prices(&[0.2]),
                &prices(&[0.1, 0.1])
            ),
            Err(DispatchError::InputAlignment(_))
        ));
    }

    #[test]
    fn test_check_series_timestep_mismatch() {
        let imbalance = ImbalanceSeries::new([(0, Power(1.0)), (1, Power(2.0))]).unwrap();
        let buy = PriceSeries::new([(0, MoneyPerEnergy(0.2)), (2, MoneyPerEnergy(0.2))]).unwrap();
        assert!(matches!(
            check_series(&imbalance, &buy, &prices(&[0.1, 0.1])),
            Err(DispatchError::InputAlignment(_))
        ));
    }

    #[rstest]
    #[case(&[f64::NAN, 1.0], &[0.2, 0.2], &[0.1, 0.1])]
    #[case(&[1.0, 1.0], &[-0.2, 0.2], &[0.0, 0.1])]
    #[case(&[1.0, 1.0], &[0.2, f64::INFINITY], &[0.1, 0.1])]
    #[case(&[1.0, 1.0], &[0.2, 0.2], &[0.1, 0.3])]
    fn test_check_series_invalid_values(
        #[case] imbalance_values: &[f64],
        #[case] buy: &[f64],
        #[case] sell: &[f64],
    ) {
        assert!(matches!(
            check_series(&imbalance(imbalance_values), &prices(buy), &prices(sell)),
            Err(DispatchError::InvalidSeries(_))
        ));
    }
}
