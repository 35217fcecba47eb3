use crate::config::TrainingConfig;
use crate::error::GestureError;
use crate::feature_extractor::interface::Embedding;
use crate::gesture_model::main::GestureModel;
use image::DynamicImage;

impl GestureModel {
    /// Captures a frame, embeds it and stores it under `label`.
    ///
    /// Returns the captured frame so the caller can draw it.
    pub fn add_example(&self, label: usize) -> Result<DynamicImage, GestureError> {
        let frame = self
            .device_camera
            .capture_frame()
            .map_err(|err| GestureError::Device(err.to_string()))?;

        // The forward pass runs outside the dataset lock.
        let embedding = self.feature_extractor.embed(&frame)?;
        self.add_embedding(embedding, label)?;

        Ok(frame)
    }

    pub fn add_embedding(&self, embedding: Embedding, label: usize) -> Result<(), GestureError> {
        let expected = self.feature_extractor.embedding_shape();
        if embedding.example_shape() != expected.as_slice() {
            return Err(GestureError::shape(format!(
                "extractor declares embeddings of {:?}, got {:?}",
                expected,
                embedding.example_shape()
            )));
        }
        self.lock_dataset().add_example(embedding, label)
    }

    /// Trains a new head on the current dataset.
    ///
    /// The previous classifier stays active if training fails.
    pub fn train(&self, config: &TrainingConfig) -> Result<(), GestureError> {
        let dataset = self.lock_dataset();
        let classifier = self.trainer.train(&dataset, config)?;
        self.replace_classifier(classifier);
        drop(dataset);

        let _ = self.logger.info("Classifier replaced");
        Ok(())
    }
}
