//! This module defines the unit types used for physical and monetary quantities.
//!
//! Powers are in kW, energies in kWh, durations in hours and money in CHF.
use float_cmp::{ApproxEq, F64Margin};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Div, Mul, Neg};

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Default,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Display,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub const fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// The absolute value
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            /// The larger of two values
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            /// The smaller of two values
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }
        }

        impl Neg for $name {
            type Output = $name;
            fn neg(self) -> $name {
                $name(-self.0)
            }
        }

        impl Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl Div<$name> for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                $name(iter.map(|x| x.0).sum())
            }
        }

        impl ApproxEq for $name {
            type Margin = F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                self.0.approx_eq(other.0, margin)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

/// Represents a dimensionless quantity.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
pub struct Dimensionless(pub f64);

impl Dimensionless {
    /// Creates a new dimensionless value
    pub const fn new(val: f64) -> Self {
        Self(val)
    }

    /// Returns the value as a f64.
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Raise to an integer power
    pub fn powi(self, rhs: i32) -> Self {
        Self(self.0.powi(rhs))
    }

    /// Square root
    pub fn sqrt(self) -> Self {
        Self(self.0.sqrt())
    }

    /// Whether the underlying value is finite
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl Sum for Dimensionless {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Dimensionless(iter.map(|x| x.0).sum())
    }
}

impl ApproxEq for Dimensionless {
    type Margin = F64Margin;

    fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
        self.0.approx_eq(other.0, margin)
    }
}

// Base quantities
unit_struct!(Money);
unit_struct!(Energy);
unit_struct!(Power);
unit_struct!(Hours);
unit_struct!(Year);

// Derived quantities
unit_struct!(MoneyPerEnergy);
unit_struct!(MoneyPerYear);

// Multiplication rules
impl_mul!(Power, Hours, Energy);
impl_mul!(MoneyPerEnergy, Energy, Money);
impl_mul!(MoneyPerYear, Year, Money);

// Division rules
impl_div!(Energy, Hours, Power);
impl_div!(Money, Energy, MoneyPerEnergy);
impl_div!(Money, Year, MoneyPerYear);
impl_div!(Money, MoneyPerYear, Year);
