//! Offline fitting of the scale-then-classify pipeline.
//!
//! The recipe is fixed so that retraining on the same file gives the same
//! artifact:
//! 1. Shuffle with a seeded ChaCha20 stream and hold out a test fraction
//! 2. Fit population mean and standard deviation on the training rows
//! 3. Fit an L2-penalized logistic regression (`C = 1`, intercept not
//!    penalized) on the standardized rows with damped Newton steps
//! 4. Score accuracy on the held-out rows

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use super::model::{LogisticPipeline, ModelError};
use super::patient::{FEATURE_COUNT, FEATURE_NAMES};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
/// Inverse regularization strength.
pub const DEFAULT_C: f64 = 1.0;

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-10;

/// Weights plus intercept.
const PARAMS: usize = FEATURE_COUNT + 1;

/// One labelled row of the training dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledSample {
    /// Raw values in `FEATURE_NAMES` order
    pub features: [f64; FEATURE_COUNT],
    /// 1 = disease present
    pub target: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOptions {
    pub seed: u64,
    pub test_fraction: f64,
    pub c: f64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            c: DEFAULT_C,
        }
    }
}

/// Fitted pipeline and how it was obtained.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Metadata has row counts, seed and accuracy filled in; the caller adds
    /// the timestamp and dataset digest.
    pub pipeline: LogisticPipeline,
    pub iterations: usize,
    pub converged: bool,
}

/// Shuffle `rows` with a seeded generator and split off `ceil(n * fraction)`
/// rows for testing. Returns `(train, test)`.
pub fn split_train_test<T>(mut rows: Vec<T>, test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rows.shuffle(&mut rng);

    let n_test = ((rows.len() as f64) * test_fraction).ceil() as usize;
    let test = rows.split_off(rows.len() - n_test.min(rows.len()));
    (rows, test)
}

/// Population mean and standard deviation per column. A constant column
/// gets scale 1 so it standardizes to zero.
#[must_use]
pub fn fit_standardizer(rows: &[[f64; FEATURE_COUNT]]) -> (Vec<f64>, Vec<f64>) {
    let n = rows.len().max(1) as f64;
    let mut mean = vec![0.0; FEATURE_COUNT];
    for row in rows {
        for (m, x) in mean.iter_mut().zip(row) {
            *m += x;
        }
    }
    for m in &mut mean {
        *m /= n;
    }

    let mut scale = vec![0.0; FEATURE_COUNT];
    for row in rows {
        for ((s, x), m) in scale.iter_mut().zip(row).zip(&mean) {
            let d = x - m;
            *s += d * d;
        }
    }
    for s in &mut scale {
        *s = (*s / n).sqrt();
        if *s <= f64::EPSILON {
            *s = 1.0;
        }
    }
    (mean, scale)
}

fn sigmoid(score: f64) -> f64 {
    1.0 / (1.0 + (-score).exp())
}

/// `ln(1 + e^s)` without overflow.
fn softplus(s: f64) -> f64 {
    s.max(0.0) + (-s.abs()).exp().ln_1p()
}

fn score(theta: &[f64; PARAMS], z: &[f64; FEATURE_COUNT]) -> f64 {
    theta[FEATURE_COUNT]
        + theta[..FEATURE_COUNT]
            .iter()
            .zip(z)
            .map(|(w, zi)| w * zi)
            .sum::<f64>()
}

fn objective(theta: &[f64; PARAMS], z: &[[f64; FEATURE_COUNT]], y: &[f64], c: f64) -> f64 {
    let penalty = 0.5 * theta[..FEATURE_COUNT].iter().map(|w| w * w).sum::<f64>();
    let loss: f64 = z
        .iter()
        .zip(y)
        .map(|(zi, yi)| {
            let s = score(theta, zi);
            softplus(s) - yi * s
        })
        .sum();
    penalty + c * loss
}

/// Solve `a x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: [[f64; PARAMS]; PARAMS], mut b: [f64; PARAMS]) -> Option<[f64; PARAMS]> {
    for col in 0..PARAMS {
        let pivot = (col..PARAMS).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..PARAMS {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..PARAMS {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; PARAMS];
    for row in (0..PARAMS).rev() {
        let tail: f64 = (row + 1..PARAMS).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// Fit weights and intercept on standardized rows.
///
/// Minimizes `0.5 * |w|^2 + c * Σ logloss` with Newton steps, halving the
/// step while the objective does not decrease.
///
/// # Errors
/// Returns `Training` for empty input, a single class, or a singular system.
pub fn fit_logistic(
    z: &[[f64; FEATURE_COUNT]],
    targets: &[u8],
    c: f64,
) -> Result<(Vec<f64>, f64, usize, bool), ModelError> {
    if z.is_empty() || z.len() != targets.len() {
        return Err(ModelError::Training("empty training set".into()));
    }
    if !(c > 0.0 && c.is_finite()) {
        return Err(ModelError::Training(format!("C must be positive, got {c}")));
    }
    let positives = targets.iter().filter(|t| **t == 1).count();
    if positives == 0 || positives == targets.len() {
        return Err(ModelError::Training(
            "training labels contain a single class".into(),
        ));
    }
    let y: Vec<f64> = targets.iter().map(|t| f64::from(*t)).collect();

    let mut theta = [0.0; PARAMS];
    let mut current = objective(&theta, z, &y, c);

    for iteration in 1..=MAX_ITERATIONS {
        let mut grad = [0.0; PARAMS];
        let mut hess = [[0.0; PARAMS]; PARAMS];
        for i in 0..FEATURE_COUNT {
            grad[i] = theta[i];
            hess[i][i] = 1.0;
        }

        for (zi, yi) in z.iter().zip(&y) {
            let p = sigmoid(score(&theta, zi));
            let weight = c * p * (1.0 - p);
            let residual = c * (p - yi);

            let mut x = [1.0; PARAMS];
            x[..FEATURE_COUNT].copy_from_slice(zi);
            for j in 0..PARAMS {
                grad[j] += residual * x[j];
                for k in 0..PARAMS {
                    hess[j][k] += weight * x[j] * x[k];
                }
            }
        }

        let step = solve(hess, grad)
            .ok_or_else(|| ModelError::Training("singular Hessian".into()))?;

        let mut t = 1.0;
        let (candidate, value) = loop {
            let mut candidate = theta;
            for (c_j, s_j) in candidate.iter_mut().zip(&step) {
                *c_j -= t * s_j;
            }
            let value = objective(&candidate, z, &y, c);
            if value <= current || t < 1e-8 {
                break (candidate, value);
            }
            t *= 0.5;
        };

        let moved = step.iter().map(|s| (t * s).abs()).fold(0.0, f64::max);
        theta = candidate;
        current = value;

        if moved < TOLERANCE {
            return Ok((theta[..FEATURE_COUNT].to_vec(), theta[FEATURE_COUNT], iteration, true));
        }
    }

    tracing::warn!("Logistic regression did not converge in {MAX_ITERATIONS} iterations");
    Ok((
        theta[..FEATURE_COUNT].to_vec(),
        theta[FEATURE_COUNT],
        MAX_ITERATIONS,
        false,
    ))
}

/// Share of samples whose predicted label matches the target. 0 for no samples.
#[must_use]
pub fn accuracy(pipeline: &LogisticPipeline, samples: &[LabelledSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let correct = samples
        .iter()
        .filter(|s| {
            pipeline
                .predict_vector(&s.features)
                .is_ok_and(|p| p.label == s.target)
        })
        .count();
    correct as f64 / samples.len() as f64
}

/// Split, standardize, fit and score.
///
/// # Errors
/// Returns `Training` for an unusable dataset or split, or any pipeline
/// validation error.
pub fn train(
    samples: Vec<LabelledSample>,
    options: &TrainingOptions,
) -> Result<TrainingOutcome, ModelError> {
    if !(0.0..1.0).contains(&options.test_fraction) {
        return Err(ModelError::Training(format!(
            "test fraction must be in [0, 1), got {}",
            options.test_fraction
        )));
    }
    if let Some(bad) = samples.iter().find(|s| s.target > 1) {
        return Err(ModelError::Training(format!("target must be 0 or 1, got {}", bad.target)));
    }

    let (train_rows, test_rows) = split_train_test(samples, options.test_fraction, options.seed);
    let raw: Vec<[f64; FEATURE_COUNT]> = train_rows.iter().map(|s| s.features).collect();
    if let Some(i) = raw
        .iter()
        .flat_map(|row| row.iter().enumerate())
        .find_map(|(i, v)| (!v.is_finite()).then_some(i))
    {
        return Err(ModelError::NonFinite(FEATURE_NAMES[i]));
    }

    let (mean, scale) = fit_standardizer(&raw);
    let z: Vec<[f64; FEATURE_COUNT]> = raw
        .iter()
        .map(|row| {
            let mut out = [0.0; FEATURE_COUNT];
            for (i, o) in out.iter_mut().enumerate() {
                *o = (row[i] - mean[i]) / scale[i];
            }
            out
        })
        .collect();
    let targets: Vec<u8> = train_rows.iter().map(|s| s.target).collect();

    let (coefficients, intercept, iterations, converged) = fit_logistic(&z, &targets, options.c)?;
    let mut pipeline = LogisticPipeline::new(mean, scale, coefficients, intercept)?;

    pipeline.metadata.train_rows = train_rows.len();
    pipeline.metadata.test_rows = test_rows.len();
    pipeline.metadata.test_accuracy = accuracy(&pipeline, &test_rows);
    pipeline.metadata.seed = options.seed;

    tracing::info!(
        "Fitted on {} rows in {} iteration(s), held-out accuracy {:.3}",
        train_rows.len(),
        iterations,
        pipeline.metadata.test_accuracy
    );

    Ok(TrainingOutcome {
        pipeline,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cholesterol drives the label with a few flipped rows.
    fn samples(n: usize) -> Vec<LabelledSample> {
        (0..n)
            .map(|i| {
                let chol = 150.0 + 3.0 * i as f64;
                let mut target = u8::from(chol > 300.0);
                if i % 17 == 0 {
                    target = 1 - target;
                }
                let mut features = [1.0; FEATURE_COUNT];
                features[0] = 40.0 + (i % 30) as f64;
                features[4] = chol;
                LabelledSample { features, target }
            })
            .collect()
    }

    #[test]
    fn test_split_sizes_round_test_up() {
        let (train, test) = split_train_test((0..303).collect::<Vec<_>>(), 0.2, 42);
        assert_eq!(test.len(), 61);
        assert_eq!(train.len(), 242);

        let (train, test) = split_train_test((0..10).collect::<Vec<_>>(), 0.2, 42);
        assert_eq!((train.len(), test.len()), (8, 2));
    }

    #[test]
    fn test_split_is_seeded() {
        let a = split_train_test((0..50).collect::<Vec<_>>(), 0.2, 42);
        let b = split_train_test((0..50).collect::<Vec<_>>(), 0.2, 42);
        assert_eq!(a, b);

        let (mut train, test) = a;
        train.extend(test);
        train.sort_unstable();
        assert_eq!(train, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_standardizer_uses_population_std() {
        let mut rows = vec![[5.0; FEATURE_COUNT]; 3];
        rows[0][0] = 1.0;
        rows[1][0] = 2.0;
        rows[2][0] = 3.0;

        let (mean, scale) = fit_standardizer(&rows);
        assert!((mean[0] - 2.0).abs() < 1e-12);
        assert!((scale[0] - (2.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        // Constant column
        assert!((mean[1] - 5.0).abs() < 1e-12);
        assert_eq!(scale[1], 1.0);
    }

    #[test]
    fn test_fit_reaches_stationary_point() {
        let data = samples(120);
        let raw: Vec<[f64; FEATURE_COUNT]> = data.iter().map(|s| s.features).collect();
        let (mean, scale) = fit_standardizer(&raw);
        let z: Vec<[f64; FEATURE_COUNT]> = raw
            .iter()
            .map(|row| {
                let mut out = [0.0; FEATURE_COUNT];
                for i in 0..FEATURE_COUNT {
                    out[i] = (row[i] - mean[i]) / scale[i];
                }
                out
            })
            .collect();
        let targets: Vec<u8> = data.iter().map(|s| s.target).collect();

        let (w, b, _, converged) = fit_logistic(&z, &targets, 1.0).expect("fit");
        assert!(converged);
        assert!(w[4] > 0.0, "cholesterol weight should be positive");
        // Constant columns standardize to zero and stay at zero.
        assert!(w[1].abs() < 1e-12);

        // Gradient of the penalized objective vanishes at the optimum.
        let mut grad = [0.0; PARAMS];
        for (zi, yi) in z.iter().zip(&targets) {
            let s = b + w.iter().zip(zi).map(|(a, x)| a * x).sum::<f64>();
            let r = sigmoid(s) - f64::from(*yi);
            for j in 0..FEATURE_COUNT {
                grad[j] += r * zi[j];
            }
            grad[FEATURE_COUNT] += r;
        }
        for j in 0..FEATURE_COUNT {
            grad[j] += w[j];
        }
        assert!(grad.iter().all(|g| g.abs() < 1e-6), "gradient {grad:?}");
    }

    #[test]
    fn test_single_class_is_rejected() {
        let z = vec![[0.0; FEATURE_COUNT]; 4];
        let err = fit_logistic(&z, &[1, 1, 1, 1], 1.0).unwrap_err();
        assert!(matches!(err, ModelError::Training(_)));
    }

    #[test]
    fn test_train_fills_metadata() {
        let outcome = train(samples(100), &TrainingOptions::default()).expect("train");
        let meta = &outcome.pipeline.metadata;

        assert_eq!(meta.train_rows, 80);
        assert_eq!(meta.test_rows, 20);
        assert_eq!(meta.seed, DEFAULT_SEED);
        assert!(meta.test_accuracy > 0.7, "accuracy {}", meta.test_accuracy);
        assert!(outcome.pipeline.validate().is_ok());
    }

    #[test]
    fn test_train_is_deterministic() {
        let a = train(samples(60), &TrainingOptions::default()).expect("train");
        let b = train(samples(60), &TrainingOptions::default()).expect("train");
        assert_eq!(a.pipeline, b.pipeline);
    }

    #[test]
    fn test_bad_target_is_rejected() {
        let mut data = samples(10);
        data[3].target = 2;
        assert!(matches!(
            train(data, &TrainingOptions::default()),
            Err(ModelError::Training(_))
        ));
    }
}
