//! Errors raised by the dispatch optimisation core.
use thiserror::Error;

/// An error which prevents a dispatch optimisation from producing a result.
///
/// All of these are fatal for the call which raised them. Nothing is cached or partially
/// committed when one occurs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    /// A battery or optimisation parameter is out of range
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The input series do not describe the same, non-empty horizon
    #[error("Input series are not aligned: {0}")]
    InputAlignment(String),

    /// A value in one of the input series is unusable
    #[error("Invalid input series: {0}")]
    InvalidSeries(String),

    /// The solver did not return an optimal solution, or the solution it returned breaks one of
    /// the physical postconditions
    #[error("Dispatch optimisation failed: {0}")]
    InfeasibleSolution(String),
}

/// A specialised `Result` for the dispatch core
pub type DispatchResult<T> = Result<T, DispatchError>;
