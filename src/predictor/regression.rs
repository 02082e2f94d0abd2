//! Ordinary least squares linear regression
//!
//! Fits `y = b0 + b·x` over fixed-width feature rows. Features and target
//! are centred first and the centred problem is solved through an SVD
//! pseudo-inverse, so rank-deficient inputs (a single row, collinear
//! columns) still produce the minimum-norm solution instead of an error.

use nalgebra::{DMatrix, DVector, SVD};
use thiserror::Error;

const MAX_SVD_ITERATIONS: usize = 1000;

/// Reasons a fit can fail
#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("cannot fit a model on an empty dataset")]
    EmptyDataset,

    #[error("feature rows ({features}) and targets ({targets}) differ in length")]
    ShapeMismatch { features: usize, targets: usize },

    #[error("dataset contains non-finite values")]
    NonFinite,

    #[error("decomposition failed: {0}")]
    Decomposition(String),
}

/// A fitted linear model over `N` features
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel<const N: usize> {
    intercept: f64,
    coefficients: [f64; N],
    r_squared: f64,
    n_observations: usize,
}

impl<const N: usize> LinearModel<N> {
    /// Fit the model to `features`/`targets` by least squares
    pub fn fit(features: &[[f64; N]], targets: &[f64]) -> Result<Self, FitError> {
        if features.len() != targets.len() {
            return Err(FitError::ShapeMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        if features.is_empty() {
            return Err(FitError::EmptyDataset);
        }
        if features.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let n = features.len();
        let n_f = n as f64;

        let mut x_mean = [0.0; N];
        for row in features {
            for (mean, value) in x_mean.iter_mut().zip(row) {
                *mean += value / n_f;
            }
        }
        let y_mean = targets.iter().sum::<f64>() / n_f;

        let x = DMatrix::from_fn(n, N, |i, j| features[i][j] - x_mean[j]);
        let y = DVector::from_iterator(n, targets.iter().map(|t| t - y_mean));

        let mut coefficients = [0.0; N];

        // Constant features carry no slope; only the intercept is fitted.
        if x.iter().any(|v| *v != 0.0) {
            let svd = SVD::try_new(x, true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
                .ok_or_else(|| FitError::Decomposition("SVD did not converge".to_string()))?;

            let sigma_max = svd.singular_values.iter().cloned().fold(0.0, f64::max);
            let tolerance = f64::EPSILON * n.max(N) as f64 * sigma_max;

            let solution = svd
                .solve(&y, tolerance)
                .map_err(|e| FitError::Decomposition(e.to_string()))?;

            for (c, s) in coefficients.iter_mut().zip(solution.iter()) {
                *c = *s;
            }
        }

        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        // Finite inputs can still overflow the sums above.
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let mut model = Self {
            intercept,
            coefficients,
            r_squared: 0.0,
            n_observations: n,
        };
        model.r_squared = model.score(features, targets);

        Ok(model)
    }

    /// Evaluate the fitted linear function
    pub fn predict(&self, x: &[f64; N]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64; N] {
        &self.coefficients
    }

    /// Coefficient of determination on the training data
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    fn score(&self, features: &[[f64; N]], targets: &[f64]) -> f64 {
        let mean = targets.iter().sum::<f64>() / targets.len() as f64;
        let ss_tot: f64 = targets.iter().map(|y| (y - mean).powi(2)).sum();
        let ss_res: f64 = features
            .iter()
            .zip(targets)
            .map(|(x, y)| (y - self.predict(x)).powi(2))
            .sum();

        if ss_tot > 1e-10 {
            1.0 - ss_res / ss_tot
        } else {
            1.0
        }
    }
}
