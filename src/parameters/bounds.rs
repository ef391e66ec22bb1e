//! Inclusive numeric limits of a parameter
//!
//! Either side may be absent. An infinite limit is the same as an absent
//! one, which is how the wire sentinels for infinity come back in.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("lower limit {min} is above upper limit {max}")]
    Inverted { min: f64, max: f64 },

    #[error("{value} is outside [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
}

/// Optional `[min, max]` range; the default accepts everything
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    lower: Option<f64>,
    upper: Option<f64>,
}

fn finite(limit: Option<f64>) -> Option<f64> {
    limit.filter(|v| v.is_finite())
}

impl Bounds {
    /// # Examples
    ///
    /// ```
    /// use rigparams_rs::parameters::Bounds;
    ///
    /// let aperture = Bounds::new(1.0, 22.0).unwrap();
    /// assert!(aperture.check(2.8).is_ok());
    /// assert!(aperture.check(32.0).is_err());
    ///
    /// let distance = Bounds::new(0.0, f64::INFINITY).unwrap();
    /// assert_eq!(distance.max_value(), None);
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        Self::from_limits(Some(min), Some(max))
    }

    /// Bounds from limits that may be missing, as definitions and the wire carry them
    pub fn from_limits(min: Option<f64>, max: Option<f64>) -> Result<Self, BoundsError> {
        let (lower, upper) = (finite(min), finite(max));
        if let (Some(min), Some(max)) = (lower, upper) {
            if min > max {
                return Err(BoundsError::Inverted { min, max });
            }
        }
        Ok(Self { lower, upper })
    }

    pub fn min_value(&self) -> Option<f64> {
        self.lower
    }

    pub fn max_value(&self) -> Option<f64> {
        self.upper
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// Accept `value` if no declared limit excludes it. The infinities pass
    /// a side that has no limit; NaN only passes when there are no limits.
    pub fn check(&self, value: f64) -> Result<(), BoundsError> {
        let below = self.lower.is_some_and(|min| value < min);
        let above = self.upper.is_some_and(|max| value > max);
        let undefined = value.is_nan() && !self.is_unbounded();
        if below || above || undefined {
            return Err(BoundsError::OutOfRange {
                value,
                min: self.lower.unwrap_or(f64::NEG_INFINITY),
                max: self.upper.unwrap_or(f64::INFINITY),
            });
        }
        Ok(())
    }
}
