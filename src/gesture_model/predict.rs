use crate::classifier::network::argmax;
use crate::error::GestureError;
use crate::gesture_model::main::GestureModel;
use crate::label::Label;
use image::{DynamicImage, RgbImage};

impl GestureModel {
    /// Runs one blank frame through the feature extractor so the first real
    /// frame does not pay for lazy initialization.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn warm_up(&self) {
        let (width, height) = self.feature_extractor.input_size();
        let blank = DynamicImage::ImageRgb8(RgbImage::new(width, height));

        match self.feature_extractor.embed(&blank) {
            Ok(_) => {
                let _ = self.logger.info("Feature extractor warmed up");
            }
            Err(err) => {
                let _ = self.logger.error(&format!("Warm up failed: {}", err));
            }
        }
    }

    /// Classifies the current camera frame.
    pub fn predict(&self) -> Result<Label, GestureError> {
        let classifier = self
            .active_classifier()
            .ok_or_else(|| GestureError::shape("no classifier has been trained"))?;

        let frame = self
            .device_camera
            .capture_frame()
            .map_err(|err| GestureError::Device(err.to_string()))?;
        let embedding = self.feature_extractor.embed(&frame)?;
        let probabilities = classifier.predict_probabilities(&embedding)?;

        let index = argmax(probabilities.view());
        Label::from_index(index).ok_or_else(|| {
            GestureError::shape(format!("classifier produced out-of-range class {}", index))
        })
    }
}
