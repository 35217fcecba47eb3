//! Classifier head placed on top of the frozen embeddings:
//! flatten → dense (ReLU, bias) → dense (softmax, no bias).

use crate::classifier::optimizer::AdamOptimizer;
use crate::error::GestureError;
use crate::feature_extractor::interface::Embedding;
use crate::label::NUM_CLASSES;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewD, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Clip applied to probabilities before taking the log.
pub const EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Relu,
    Softmax,
}

#[derive(Debug, Clone)]
pub struct Dense {
    /// `[inputs, units]`
    pub kernel: Array2<f32>,
    pub bias: Option<Array1<f32>>,
    pub activation: Activation,
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        units: usize,
        activation: Activation,
        use_bias: bool,
        rng: &mut R,
    ) -> Result<Self, GestureError> {
        Ok(Self {
            kernel: variance_scaling(inputs, units, rng)?,
            bias: use_bias.then(|| Array1::zeros(units)),
            activation,
        })
    }

    pub fn units(&self) -> usize {
        self.kernel.ncols()
    }

    fn pre_activation(&self, x: ArrayView2<f32>) -> Array2<f32> {
        let mut z = x.dot(&self.kernel);
        if let Some(bias) = &self.bias {
            z += bias;
        }
        z
    }

    fn activate(&self, z: &Array2<f32>) -> Array2<f32> {
        match self.activation {
            Activation::Relu => z.mapv(|v| v.max(0.0)),
            Activation::Softmax => softmax_rows(z),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Gradients {
    pub hidden_kernel: Array2<f32>,
    pub hidden_bias: Array1<f32>,
    pub output_kernel: Array2<f32>,
}

struct ForwardCache {
    hidden_pre_activation: Array2<f32>,
    hidden: Array2<f32>,
    probabilities: Array2<f32>,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    input_shape: Vec<usize>,
    hidden: Dense,
    output: Dense,
}

impl Classifier {
    /// Fresh, untrained head for embeddings of `input_shape` (no batch axis).
    pub fn new<R: Rng + ?Sized>(
        input_shape: &[usize],
        dense_units: usize,
        rng: &mut R,
    ) -> Result<Self, GestureError> {
        let features: usize = input_shape.iter().product();
        if features == 0 || dense_units == 0 {
            return Err(GestureError::validation(format!(
                "cannot build a classifier for input {:?} with {} hidden units",
                input_shape, dense_units
            )));
        }

        Ok(Self {
            input_shape: input_shape.to_vec(),
            hidden: Dense::new(features, dense_units, Activation::Relu, true, rng)?,
            output: Dense::new(dense_units, NUM_CLASSES, Activation::Softmax, false, rng)?,
        })
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    pub fn hidden(&self) -> &Dense {
        &self.hidden
    }

    pub fn output(&self) -> &Dense {
        &self.output
    }

    /// Reshapes `[rows, ..input_shape]` into `[rows, features]` without copying.
    pub fn flatten<'a>(&self, xs: ArrayViewD<'a, f32>) -> Result<ArrayView2<'a, f32>, GestureError> {
        if xs.ndim() < 1 || &xs.shape()[1..] != self.input_shape.as_slice() {
            return Err(GestureError::shape(format!(
                "classifier expects examples of shape {:?}, got {:?}",
                self.input_shape,
                xs.shape()
            )));
        }

        let rows = xs.shape()[0];
        let features = self.input_shape.iter().product::<usize>();
        Ok(xs.into_shape((rows, features))?)
    }

    /// Class probabilities, one row per input row.
    pub fn forward(&self, x: ArrayView2<f32>) -> Array2<f32> {
        self.forward_with_cache(x).probabilities
    }

    pub fn predict_probabilities(&self, embedding: &Embedding) -> Result<Array1<f32>, GestureError> {
        let x = self.flatten(embedding.view())?;
        let probabilities = self.forward(x);
        Ok(probabilities.row(0).to_owned())
    }

    fn forward_with_cache(&self, x: ArrayView2<f32>) -> ForwardCache {
        let hidden_pre_activation = self.hidden.pre_activation(x);
        let hidden = self.hidden.activate(&hidden_pre_activation);
        let logits = self.output.pre_activation(hidden.view());
        let probabilities = self.output.activate(&logits);

        ForwardCache {
            hidden_pre_activation,
            hidden,
            probabilities,
        }
    }

    /// Mean categorical cross-entropy of a batch and its gradients.
    pub fn loss_and_gradients(&self, x: ArrayView2<f32>, y: ArrayView2<f32>) -> (f32, Gradients) {
        let batch = x.nrows().max(1) as f32;
        let cache = self.forward_with_cache(x);

        let loss = categorical_cross_entropy(cache.probabilities.view(), y);

        // Softmax and cross-entropy combined.
        let d_logits = (&cache.probabilities - &y) / batch;
        let output_kernel = cache.hidden.t().dot(&d_logits);

        let mut d_hidden = d_logits.dot(&self.output.kernel.t());
        d_hidden.zip_mut_with(&cache.hidden_pre_activation, |d, z| {
            if *z <= 0.0 {
                *d = 0.0;
            }
        });

        let hidden_kernel = x.t().dot(&d_hidden);
        let hidden_bias = d_hidden.sum_axis(Axis(0));

        (
            loss,
            Gradients {
                hidden_kernel,
                hidden_bias,
                output_kernel,
            },
        )
    }

    pub fn apply_gradients(&mut self, gradients: &Gradients, optimizer: &mut AdamOptimizer) {
        optimizer.begin_step();
        optimizer.step("hidden/kernel", &mut self.hidden.kernel, &gradients.hidden_kernel);
        if let Some(bias) = self.hidden.bias.as_mut() {
            optimizer.step("hidden/bias", bias, &gradients.hidden_bias);
        }
        optimizer.step("output/kernel", &mut self.output.kernel, &gradients.output_kernel);
    }
}

pub fn categorical_cross_entropy(probabilities: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
    let rows = probabilities.nrows().max(1) as f32;
    let total: f32 = probabilities
        .iter()
        .zip(y.iter())
        .map(|(p, t)| -t * p.clamp(EPSILON, 1.0 - EPSILON).ln())
        .sum();
    total / rows
}

pub fn softmax_rows(z: &Array2<f32>) -> Array2<f32> {
    let mut out = z.clone();
    for mut row in out.rows_mut() {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Index of the largest value. The first one wins on ties.
pub fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = index;
        }
    }
    best
}

/// Truncated normal with `stddev = sqrt(1 / fan_in)`, resampled beyond two
/// standard deviations.
fn variance_scaling<R: Rng + ?Sized>(
    fan_in: usize,
    units: usize,
    rng: &mut R,
) -> Result<Array2<f32>, GestureError> {
    let stddev = (1.0 / fan_in.max(1) as f32).sqrt();
    let normal = Normal::new(0.0, stddev).map_err(|err| GestureError::validation(err.to_string()))?;

    Ok(Array2::from_shape_simple_fn((fan_in, units), || loop {
        let sample: f32 = normal.sample(&mut *rng);
        if sample.abs() <= 2.0 * stddev {
            break sample;
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, ArrayD, IxDyn};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn classifier() -> Classifier {
        let mut rng = StdRng::seed_from_u64(7);
        Classifier::new(&[2, 2, 3], 10, &mut rng).unwrap()
    }

    #[test]
    fn test_layer_shapes() {
        let classifier = classifier();

        assert_eq!(classifier.hidden().kernel.dim(), (12, 10));
        assert_eq!(classifier.hidden().bias.as_ref().map(|b| b.len()), Some(10));
        assert_eq!(classifier.output().units(), NUM_CLASSES);
        assert!(classifier.output().bias.is_none());
        assert_eq!(classifier.output().activation, Activation::Softmax);
    }

    #[test]
    fn test_initial_weights_are_truncated() {
        let classifier = classifier();
        let bound = 2.0 * (1.0f32 / 12.0).sqrt();

        assert!(classifier.hidden().kernel.iter().all(|w| w.abs() <= bound));
        assert!(classifier.hidden().kernel.iter().any(|w| *w != 0.0));
    }

    #[test]
    fn test_forward_produces_distributions() {
        let classifier = classifier();
        let xs = ArrayD::from_shape_fn(IxDyn(&[3, 2, 2, 3]), |idx| idx[0] as f32 - idx[3] as f32);

        let x = classifier.flatten(xs.view()).unwrap();
        let probabilities = classifier.forward(x);

        assert_eq!(probabilities.dim(), (3, NUM_CLASSES));
        for row in probabilities.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-5);
            assert!(row.iter().all(|p| *p >= 0.0));
        }
    }

    #[test]
    fn test_flatten_rejects_wrong_shape() {
        let classifier = classifier();
        let xs = ArrayD::<f32>::zeros(IxDyn(&[1, 3, 3, 3]));

        assert!(matches!(classifier.flatten(xs.view()), Err(GestureError::Shape(_))));
    }

    #[test]
    fn test_argmax_prefers_first_maximum() {
        assert_eq!(argmax(array![0.1, 0.4, 0.4, 0.1].view()), 1);
        assert_eq!(argmax(array![0.25, 0.25, 0.25, 0.25].view()), 0);
        assert_eq!(argmax(array![0.0, 0.1, 0.2, 0.7].view()), 3);
    }

    #[test]
    fn test_cross_entropy_of_confident_correct_prediction_is_small() {
        let probabilities = array![[0.97, 0.01, 0.01, 0.01]];
        let y = array![[1.0, 0.0, 0.0, 0.0]];

        let loss = categorical_cross_entropy(probabilities.view(), y.view());

        assert!((loss - (-(0.97f32).ln())).abs() < 1e-6);
    }

    #[test]
    fn test_gradients_match_parameter_shapes() {
        let classifier = classifier();
        let x = Array2::from_elem((5, 12), 0.3);
        let y = Array2::from_shape_fn((5, NUM_CLASSES), |(row, class)| {
            if row % NUM_CLASSES == class {
                1.0
            } else {
                0.0
            }
        });

        let (loss, gradients) = classifier.loss_and_gradients(x.view(), y.view());

        assert!(loss.is_finite() && loss > 0.0);
        assert_eq!(gradients.hidden_kernel.dim(), (12, 10));
        assert_eq!(gradients.hidden_bias.len(), 10);
        assert_eq!(gradients.output_kernel.dim(), (10, NUM_CLASSES));
    }
}
