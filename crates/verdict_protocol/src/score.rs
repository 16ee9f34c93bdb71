//! Spam score newtype.

use serde::Serialize;
use std::fmt;

use crate::error::PipelineError;

/// A spam score in `[0.0, 1.0]`.
///
/// Out-of-range and non-finite values are rejected, never clamped. Scores
/// cross component boundaries through this type so the range check cannot
/// be skipped.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SpamScore(f64);

impl SpamScore {
    pub fn new(value: f64) -> Result<Self, PipelineError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(PipelineError::validation(format!(
                "score {} is outside [0.0, 1.0]",
                value
            )));
        }
        Ok(Self(value))
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for SpamScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_values() {
        assert_eq!(SpamScore::new(0.0).unwrap().value(), 0.0);
        assert_eq!(SpamScore::new(1.0).unwrap().value(), 1.0);
        assert_eq!(SpamScore::new(0.55).unwrap().value(), 0.55);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(SpamScore::new(-0.01).is_err());
        assert!(SpamScore::new(1.01).is_err());
        assert!(SpamScore::new(f64::NAN).is_err());
        assert!(SpamScore::new(f64::INFINITY).is_err());
    }
}
