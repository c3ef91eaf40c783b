//! Exponential thickness calibration.
//!
//! The instrument calibration relates Si counts to film thickness `t` as
//! `counts = a * exp(b * t)`, so `t = ln(counts / a) / b`. A second pair
//! `(a_norm, b_norm)` applies to normalized signal.

use ndarray::Array2;
use serde::Deserialize;

use super::error::{CalibrationError, PipelineError, PipelineResult};

/// Calibration coefficients of one molecule.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CalibrationCoefficients {
    pub a: f64,
    pub b: f64,
    pub a_norm: f64,
    pub b_norm: f64,
}

impl CalibrationCoefficients {
    pub fn new(a: f64, b: f64, a_norm: f64, b_norm: f64) -> Self {
        Self { a, b, a_norm, b_norm }
    }

    /// Reject coefficients that would divide by zero.
    pub fn validate(self) -> Result<Self, CalibrationError> {
        for (name, value) in [
            ("a", self.a),
            ("b", self.b),
            ("a (norm.)", self.a_norm),
            ("b (norm.)", self.b_norm),
        ] {
            if value == 0.0 {
                return Err(CalibrationError::ZeroCoefficient { name });
            }
        }
        Ok(self)
    }

    /// The `(a, b)` pair for raw or normalized signal.
    pub fn pair(&self, normalized: bool) -> (f64, f64) {
        if normalized {
            (self.a_norm, self.b_norm)
        } else {
            (self.a, self.b)
        }
    }
}

/// Manually entered coefficients, exactly as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientInput {
    pub a: String,
    pub b: String,
    pub a_norm: String,
    pub b_norm: String,
}

impl Default for CoefficientInput {
    fn default() -> Self {
        Self {
            a: "1".into(),
            b: "1".into(),
            a_norm: "1".into(),
            b_norm: "1".into(),
        }
    }
}

impl CoefficientInput {
    pub fn parse(&self) -> PipelineResult<CalibrationCoefficients> {
        let field = |text: &str, field: &'static str| {
            text.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or(PipelineError::NonNumericInput { field })
        };
        let coefficients = CalibrationCoefficients {
            a: field(&self.a, "a")?,
            b: field(&self.b, "b")?,
            a_norm: field(&self.a_norm, "a (norm.)")?,
            b_norm: field(&self.b_norm, "b (norm.)")?,
        };
        Ok(coefficients.validate()?)
    }
}

/// Thickness in nm from a signal array and one `(a, b)` pair.
///
/// Fails without output when `a` or `b` is zero or when any cell has a
/// non-positive `signal / a` ratio.
pub fn calibrate(signal: &Array2<f64>, a: f64, b: f64) -> Result<Array2<f64>, CalibrationError> {
    if a == 0.0 {
        return Err(CalibrationError::ZeroCoefficient { name: "a" });
    }
    if b == 0.0 {
        return Err(CalibrationError::ZeroCoefficient { name: "b" });
    }

    let bad = signal
        .iter()
        .filter(|&&s| {
            let ratio = s / a;
            !(ratio.is_finite() && ratio > 0.0)
        })
        .count();
    if bad > 0 {
        return Err(CalibrationError::LogDomain { cells: bad });
    }

    Ok(signal.mapv(|s| (s / a).ln() / b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn follows_log_law() {
        let signal = array![[10.0, 100.0], [1.0, 50.0]];
        let out = calibrate(&signal, 2.0, -0.5).unwrap();
        for (s, t) in signal.iter().zip(out.iter()) {
            assert_relative_eq!(*t, (s / 2.0_f64).ln() / -0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn signal_equal_to_a_gives_zero_for_any_b() {
        let signal = Array2::from_elem((3, 4), 2_000_000.0);
        for b in [-0.998, 0.1, 2.0, 1e6] {
            let out = calibrate(&signal, 2_000_000.0, b).unwrap();
            assert!(out.iter().all(|&t| t == 0.0));
        }
    }

    #[test]
    fn inverts_the_exponential_model() {
        let (a, b) = (0.1373, -0.999);
        let thickness = array![[0.0, 1.5], [3.0, 7.25]];
        let signal = thickness.mapv(|t: f64| a * (b * t).exp());
        let out = calibrate(&signal, a, b).unwrap();
        for (t, got) in thickness.iter().zip(out.iter()) {
            assert_relative_eq!(*t, *got, epsilon = 1e-9);
        }
    }

    #[test]
    fn zero_coefficients_are_rejected() {
        let signal = array![[1.0]];
        assert_eq!(
            calibrate(&signal, 0.0, 1.0),
            Err(CalibrationError::ZeroCoefficient { name: "a" })
        );
        assert_eq!(
            calibrate(&signal, 1.0, 0.0),
            Err(CalibrationError::ZeroCoefficient { name: "b" })
        );
    }

    #[test]
    fn non_positive_ratio_is_rejected_as_a_whole() {
        let signal = array![[1.0, -1.0], [0.0, 5.0]];
        assert_eq!(
            calibrate(&signal, 1.0, 1.0),
            Err(CalibrationError::LogDomain { cells: 2 })
        );
        // a negative a flips every positive cell out of the domain
        assert_eq!(
            calibrate(&array![[1.0, 2.0]], -1.0, 1.0),
            Err(CalibrationError::LogDomain { cells: 2 })
        );
    }

    #[test]
    fn pair_selects_by_normalization() {
        let c = CalibrationCoefficients::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(c.pair(false), (1.0, 2.0));
        assert_eq!(c.pair(true), (3.0, 4.0));
    }

    #[test]
    fn manual_input_defaults_to_ones() {
        let parsed = CoefficientInput::default().parse().unwrap();
        assert_eq!(parsed, CalibrationCoefficients::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn manual_input_errors() {
        let mut input = CoefficientInput::default();
        input.b_norm = "one".into();
        assert_eq!(
            input.parse(),
            Err(PipelineError::NonNumericInput { field: "b (norm.)" })
        );

        let mut input = CoefficientInput::default();
        input.a_norm = "0".into();
        assert_eq!(
            input.parse(),
            Err(PipelineError::Calibration(CalibrationError::ZeroCoefficient {
                name: "a (norm.)"
            }))
        );
    }
}
