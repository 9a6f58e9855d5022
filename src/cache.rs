//! A content-addressed memo of dispatch optimisation results.
//!
//! The dispatch optimiser itself holds no state, so repeated appraisals of the same battery against
//! the same series (e.g. in a size sweep) go through this cache instead.
use crate::battery::BatteryConfig;
use crate::dispatch::{DispatchOptions, OptimisationResult, perform_dispatch_optimisation};
use crate::error::DispatchResult;
use crate::series::{ImbalanceSeries, PriceSeries};
use crate::units::Hours;
use indexmap::IndexMap;
use log::debug;
use std::rc::Rc;

/// The default maximum number of results held by a [`DispatchCache`]
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Identifies the full set of inputs to one dispatch optimisation.
///
/// Floating-point inputs are stored as their bit patterns, so two keys are equal only if every
/// input is identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScenarioKey {
    config: [u64; 10],
    lifetime_years: u32,
    timesteps: Vec<u32>,
    series: Vec<u64>,
    dt: u64,
    options: DispatchOptions,
}

impl ScenarioKey {
    /// Create a key from the inputs to [`perform_dispatch_optimisation`]
    pub fn new(
        config: &BatteryConfig,
        imbalance: &ImbalanceSeries,
        price_buy: &PriceSeries,
        price_sell: &PriceSeries,
        dt: Hours,
        options: &DispatchOptions,
    ) -> Self {
        let config_bits = [
            config.capacity_kwh.value(),
            config.power_kw.value(),
            config.round_trip_efficiency.value(),
            config.initial_soc_fraction.value(),
            config.min_soc_fraction.value(),
            config.max_soc_fraction.value(),
            config.self_discharge_per_hour.value(),
            config.investment_cost_per_kwh.value(),
            config.degradation_cost_per_kwh_throughput.value(),
            config.discount_rate.value(),
        ]
        .map(f64::to_bits);

        // Price series are stored on the same timesteps as the imbalance series once validated,
        // but a mismatch must still give a different key
        let timesteps = [
            imbalance.timesteps(),
            price_buy.timesteps(),
            price_sell.timesteps(),
        ]
        .concat();
        let series = imbalance
            .values()
            .iter()
            .map(|value| value.value())
            .chain(price_buy.values().iter().map(|value| value.value()))
            .chain(price_sell.values().iter().map(|value| value.value()))
            .map(f64::to_bits)
            .collect();

        Self {
            config: config_bits,
            lifetime_years: config.lifetime_years,
            timesteps,
            series,
            dt: dt.value().to_bits(),
            options: options.clone(),
        }
    }
}

/// A bounded cache of dispatch optimisation results.
///
/// When full, the oldest entry is evicted first. Failed optimisations are never stored.
#[derive(Debug)]
pub struct DispatchCache {
    entries: IndexMap<ScenarioKey, Rc<OptimisationResult>>,
    capacity: usize,
    hits: usize,
}

impl Default for DispatchCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl DispatchCache {
    /// Create an empty cache holding at most `capacity` results
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
            capacity,
            hits: 0,
        }
    }

    /// The number of cached results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of lookups answered from the cache
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Return the cached result for these inputs, or perform the optimisation and cache it
    pub fn get_or_optimise(
        &mut self,
        config: &BatteryConfig,
        imbalance: &ImbalanceSeries,
        price_buy: &PriceSeries,
        price_sell: &PriceSeries,
        dt: Hours,
        options: &DispatchOptions,
    ) -> DispatchResult<Rc<OptimisationResult>> {
        let key = ScenarioKey::new(config, imbalance, price_buy, price_sell, dt, options);
        if let Some(result) = self.entries.get(&key) {
            debug!("Reusing cached dispatch result");
            self.hits += 1;
            return Ok(Rc::clone(result));
        }

        let result = Rc::new(perform_dispatch_optimisation(
            config, imbalance, price_buy, price_sell, dt, options,
        )?);
        if self.capacity > 0 {
            if self.entries.len() >= self.capacity {
                self.entries.shift_remove_index(0);
            }
            self.entries.insert(key, Rc::clone(&result));
        }

        Ok(result)
    }
}
