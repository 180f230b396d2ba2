//! L2-regularized binary logistic regression.
//!
//! Objective (scikit-learn's `LogisticRegression` with the default `l2`
//! penalty): `0.5 * ||w||^2 + C * sum(logloss)`, with an unpenalized
//! intercept. Minimized with L-BFGS and a backtracking Armijo line search.

use crate::error::{Result, SentimentError};
use crate::vectorizer::FeatureVector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

const LBFGS_MEMORY: usize = 10;
const ARMIJO_C1: f64 = 1e-4;
const MIN_STEP: f64 = 1e-12;

/// Solver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionConfig {
    /// Inverse regularization strength.
    pub c: f64,
    /// Iteration cap for the optimizer.
    pub max_iter: usize,
    /// Convergence threshold on the max-abs gradient.
    pub tol: f64,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

impl LogisticRegressionConfig {
    fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(SentimentError::Config(format!("C must be positive, got {}", self.c)));
        }
        if self.max_iter == 0 {
            return Err(SentimentError::Config("max_iter must be at least 1".to_string()));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(SentimentError::Config(format!("tol must be positive, got {}", self.tol)));
        }
        Ok(())
    }
}

/// Outcome of a fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitReport {
    /// Optimizer iterations performed.
    pub iterations: usize,
    /// True when the gradient threshold was reached.
    pub converged: bool,
    /// Final objective value.
    pub objective: f64,
}

/// Trained binary classifier over fixed-dimension feature vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    /// Builds a model from explicit parameters.
    pub fn from_parameters(weights: Vec<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }

    /// Fits a model on feature vectors and `{0, 1}` labels.
    pub fn fit(
        config: &LogisticRegressionConfig,
        samples: &[FeatureVector],
        labels: &[u8],
    ) -> Result<(Self, FitReport)> {
        config.validate()?;
        if samples.is_empty() {
            return Err(SentimentError::EmptyDataset);
        }
        if samples.len() != labels.len() {
            return Err(SentimentError::DimensionMismatch {
                expected: samples.len(),
                actual: labels.len(),
            });
        }
        let dim = samples[0].dim();
        if let Some(bad) = samples.iter().find(|s| s.dim() != dim) {
            return Err(SentimentError::DimensionMismatch {
                expected: dim,
                actual: bad.dim(),
            });
        }

        let problem = Problem {
            dim,
            c: config.c,
            samples,
            targets: labels.iter().map(|&y| if y == 1 { 1.0 } else { 0.0 }).collect(),
        };
        let (params, report) = minimize_lbfgs(&problem, config);
        if !report.converged {
            warn!(
                iterations = report.iterations,
                "logistic regression did not converge; consider raising max_iter"
            );
        }
        let intercept = params[dim];
        let mut weights = params;
        weights.truncate(dim);
        Ok((Self { weights, intercept }, report))
    }

    /// Number of input features.
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Coefficients in feature-index order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Intercept term.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Signed distance to the decision boundary.
    pub fn decision_function(&self, features: &FeatureVector) -> Result<f64> {
        if features.dim() != self.weights.len() {
            return Err(SentimentError::DimensionMismatch {
                expected: self.weights.len(),
                actual: features.dim(),
            });
        }
        Ok(features.dot(&self.weights) + self.intercept)
    }

    /// Probability of class `1`.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        self.decision_function(features).map(sigmoid)
    }

    /// Predicted class, `1` iff the decision value is positive.
    pub fn predict(&self, features: &FeatureVector) -> Result<u8> {
        Ok(u8::from(self.decision_function(features)? > 0.0))
    }
}

struct Problem<'a> {
    dim: usize,
    c: f64,
    samples: &'a [FeatureVector],
    targets: Vec<f64>,
}

impl Problem<'_> {
    /// Objective value and gradient at `params` (`weights ++ [intercept]`).
    fn evaluate(&self, params: &[f64]) -> (f64, Vec<f64>) {
        let dim = self.dim;
        let (weights, intercept) = (&params[..dim], params[dim]);
        let (loss, mut grad) = self
            .samples
            .par_iter()
            .zip(self.targets.par_iter())
            .fold(
                || (0.0, vec![0.0; dim + 1]),
                |(mut loss, mut grad), (x, &y)| {
                    let z = x.dot(weights) + intercept;
                    loss += softplus(z) - y * z;
                    let residual = sigmoid(z) - y;
                    for (idx, value) in x.iter() {
                        grad[idx] += residual * value;
                    }
                    grad[dim] += residual;
                    (loss, grad)
                },
            )
            .reduce(
                || (0.0, vec![0.0; dim + 1]),
                |(loss_a, mut grad_a), (loss_b, grad_b)| {
                    for (a, b) in grad_a.iter_mut().zip(grad_b) {
                        *a += b;
                    }
                    (loss_a + loss_b, grad_a)
                },
            );

        let mut objective = self.c * loss;
        for g in grad.iter_mut() {
            *g *= self.c;
        }
        for (g, w) in grad.iter_mut().zip(weights) {
            objective += 0.5 * w * w;
            *g += w;
        }
        (objective, grad)
    }
}

fn minimize_lbfgs(problem: &Problem<'_>, config: &LogisticRegressionConfig) -> (Vec<f64>, FitReport) {
    let n = problem.dim + 1;
    let mut x = vec![0.0; n];
    let (mut fx, mut grad) = problem.evaluate(&x);
    let mut history: VecDeque<(Vec<f64>, Vec<f64>, f64)> = VecDeque::with_capacity(LBFGS_MEMORY);
    let mut iterations = 0;
    let mut converged = max_abs(&grad) <= config.tol;

    while !converged && iterations < config.max_iter {
        let mut direction = two_loop_direction(&grad, &history);
        let mut slope = dot(&grad, &direction);
        if slope >= 0.0 {
            history.clear();
            direction = grad.iter().map(|g| -g).collect();
            slope = -dot(&grad, &grad);
        }

        let mut step = 1.0;
        let accepted = loop {
            let candidate: Vec<f64> = x
                .iter()
                .zip(&direction)
                .map(|(xi, di)| xi + step * di)
                .collect();
            let (f_candidate, g_candidate) = problem.evaluate(&candidate);
            if f_candidate <= fx + ARMIJO_C1 * step * slope {
                break Some((candidate, f_candidate, g_candidate));
            }
            step *= 0.5;
            if step < MIN_STEP {
                break None;
            }
        };
        iterations += 1;
        let Some((x_next, f_next, g_next)) = accepted else {
            debug!(iterations, "line search made no progress");
            break;
        };

        let s: Vec<f64> = x_next.iter().zip(&x).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = g_next.iter().zip(&grad).map(|(a, b)| a - b).collect();
        let sy = dot(&s, &y);
        if sy > 1e-10 {
            if history.len() == LBFGS_MEMORY {
                history.pop_front();
            }
            history.push_back((s, y, 1.0 / sy));
        }

        x = x_next;
        fx = f_next;
        grad = g_next;
        converged = max_abs(&grad) <= config.tol;
    }

    (
        x,
        FitReport {
            iterations,
            converged,
            objective: fx,
        },
    )
}

fn two_loop_direction(grad: &[f64], history: &VecDeque<(Vec<f64>, Vec<f64>, f64)>) -> Vec<f64> {
    let mut q = grad.to_vec();
    let mut alphas = Vec::with_capacity(history.len());
    for (s, y, rho) in history.iter().rev() {
        let alpha = rho * dot(s, &q);
        axpy(-alpha, y, &mut q);
        alphas.push(alpha);
    }

    let gamma = match history.back() {
        Some((s, y, _)) => dot(s, y) / dot(y, y),
        None => 1.0 / dot(grad, grad).sqrt().max(1.0),
    };
    for value in q.iter_mut() {
        *value *= gamma;
    }

    for ((s, y, rho), alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = rho * dot(y, &q);
        axpy(alpha - beta, s, &mut q);
    }
    q.iter().map(|v| -v).collect()
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow.
#[inline]
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}
