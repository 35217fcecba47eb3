use crate::classifier::network::Classifier;
use crate::classifier::optimizer::AdamOptimizer;
use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::error::GestureError;
use crate::library::channel::Channel;
use crate::library::logger::interface::Logger;
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;

/// Number of examples per gradient step for a dataset of `rows` examples.
pub fn batch_size(rows: usize, batch_size_fraction: f32) -> Result<usize, GestureError> {
    let batch_size = (rows as f32 * batch_size_fraction).floor();
    if batch_size.is_nan() || batch_size < 1.0 {
        return Err(GestureError::validation(format!(
            "non-positive batch size: {} examples with batch size fraction {}",
            rows, batch_size_fraction
        )));
    }
    Ok(batch_size as usize)
}

pub struct ClassifierTrainer {
    logger: Arc<dyn Logger + Send + Sync>,
    training_status: Channel<String>,
}

impl ClassifierTrainer {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, training_status: Channel<String>) -> Self {
        Self {
            logger: logger.with_namespace("trainer"),
            training_status,
        }
    }

    /// Fits a fresh classifier head on the whole dataset.
    ///
    /// The data is reshuffled every epoch. After each batch the loss is
    /// published on the training-status channel as `Loss: x.xxxxx`.
    pub fn train(&self, dataset: &Dataset, config: &TrainingConfig) -> Result<Classifier, GestureError> {
        let (xs, ys) = match (dataset.xs(), dataset.ys()) {
            (Some(xs), Some(ys)) => (xs, ys),
            _ => return Err(GestureError::validation("empty dataset")),
        };

        let rows = dataset.rows();
        let batch_size = batch_size(rows, config.batch_size_fraction)?;
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut classifier = Classifier::new(&xs.shape()[1..], config.dense_units, &mut rng)?;
        let x = classifier.flatten(xs.view())?;
        let mut optimizer = AdamOptimizer::new(config.learning_rate);

        let _ = self.logger.info(&format!(
            "Training on {} examples, batch size {}, {} epochs",
            rows, batch_size, config.epochs
        ));

        let mut indices: Vec<usize> = (0..rows).collect();
        let mut last_loss = f32::NAN;

        for _ in 0..config.epochs {
            indices.shuffle(&mut rng);

            for batch in indices.chunks(batch_size) {
                let batch_x = x.select(Axis(0), batch);
                let batch_y = ys.select(Axis(0), batch);

                let (loss, gradients) = classifier.loss_and_gradients(batch_x.view(), batch_y.view());
                classifier.apply_gradients(&gradients, &mut optimizer);

                last_loss = loss;
                self.training_status.publish(&format!("Loss: {:.5}", loss));
            }
        }

        let _ = self.logger.info(&format!("Training done, final loss {:.5}", last_loss));

        Ok(classifier)
    }
}
