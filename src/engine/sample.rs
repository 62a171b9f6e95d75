// src/engine/sample.rs — Preview curve sampling

use serde::Serialize;

use crate::expr::Evaluable;

/// Plot-ready samples of f over [a, b]. Points where evaluation fails are
/// kept as NaN so the x grid stays uniform; serde_json renders them as null.
#[derive(Debug, Clone, Serialize)]
pub struct SampleCurve {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

/// Sample `f` at `points` evenly spaced x values across [a, b] inclusive.
pub fn sample_curve(f: &dyn Evaluable, a: f64, b: f64, points: usize) -> SampleCurve {
    let n = points.max(2);
    let step = (b - a) / (n - 1) as f64;

    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    for i in 0..n {
        // Pin the right endpoint; accumulated steps drift a few ulps.
        let x = if i == n - 1 { b } else { a + i as f64 * step };
        xs.push(x);
        ys.push(f.eval(x).unwrap_or(f64::NAN));
    }

    SampleCurve { xs, ys }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::EvalError;

    #[test]
    fn test_uniform_grid() {
        let f = |x: f64| -> Result<f64, EvalError> { Ok(x) };
        let curve = sample_curve(&f, 0.0, 1.0, 5);

        assert_eq!(curve.xs, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(curve.ys, curve.xs);
    }

    #[test]
    fn test_endpoints_exact() {
        let f = |x: f64| -> Result<f64, EvalError> { Ok(x * x) };
        let curve = sample_curve(&f, -3.0, 7.0, 400);

        assert_eq!(curve.xs.len(), 400);
        assert_eq!(curve.ys.len(), 400);
        assert_eq!(curve.xs[0], -3.0);
        assert_eq!(*curve.xs.last().unwrap(), 7.0);
    }

    #[test]
    fn test_failures_become_nan() {
        let f = |x: f64| -> Result<f64, EvalError> {
            if x < 0.0 {
                Err(EvalError::new("negative"))
            } else {
                Ok(x.sqrt())
            }
        };
        let curve = sample_curve(&f, -1.0, 1.0, 11);

        for (x, y) in curve.xs.iter().zip(&curve.ys) {
            if *x < 0.0 {
                assert!(y.is_nan(), "expected NaN at x={x}");
            } else {
                assert!(y.is_finite(), "expected finite at x={x}");
            }
        }
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let f = |x: f64| -> Result<f64, EvalError> {
            if x == 0.0 {
                Err(EvalError::new("pole"))
            } else {
                Ok(1.0 / x)
            }
        };
        let curve = sample_curve(&f, -1.0, 1.0, 3);

        let json = serde_json::to_value(&curve).unwrap();
        assert!(json["ys"][1].is_null());
        assert!(json["ys"][0].is_f64());
    }

    #[test]
    fn test_minimum_two_points() {
        let f = |x: f64| -> Result<f64, EvalError> { Ok(x) };
        let curve = sample_curve(&f, 2.0, 4.0, 0);

        assert_eq!(curve.xs, vec![2.0, 4.0]);
    }
}
