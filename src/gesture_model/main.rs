use crate::classifier::network::Classifier;
use crate::classifier::trainer::ClassifierTrainer;
use crate::dataset::Dataset;
use crate::device_camera::interface::DeviceCamera;
use crate::error::GestureError;
use crate::feature_extractor::interface::FeatureExtractor;
use crate::label::ExampleCounts;
use crate::library::channel::Channel;
use crate::library::logger::interface::Logger;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Everything the teaching and playing flows share.
///
/// Cloning is cheap and every clone sees the same dataset, classifier and
/// channels. Dataset mutation and training are serialized by the dataset
/// mutex; predictions only ever read a complete classifier.
#[derive(Clone)]
pub struct GestureModel {
    pub(super) logger: Arc<dyn Logger + Send + Sync>,
    pub(super) feature_extractor: Arc<dyn FeatureExtractor + Send + Sync>,
    pub(super) device_camera: Arc<dyn DeviceCamera + Send + Sync>,
    pub(super) dataset: Arc<Mutex<Dataset>>,
    pub(super) classifier: Arc<RwLock<Option<Arc<Classifier>>>>,
    pub(super) trainer: Arc<ClassifierTrainer>,
    training_status: Channel<String>,
    example_counts: Channel<ExampleCounts>,
}

impl GestureModel {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        feature_extractor: Arc<dyn FeatureExtractor + Send + Sync>,
        device_camera: Arc<dyn DeviceCamera + Send + Sync>,
    ) -> Self {
        let training_status = Channel::new();
        let example_counts = Channel::new();

        Self {
            logger: logger.with_namespace("gesture_model"),
            feature_extractor,
            device_camera,
            dataset: Arc::new(Mutex::new(Dataset::new(example_counts.clone()))),
            classifier: Arc::new(RwLock::new(None)),
            trainer: Arc::new(ClassifierTrainer::new(logger, training_status.clone())),
            training_status,
            example_counts,
        }
    }

    /// Carries `Loss: x.xxxxx` messages while training.
    pub fn training_status(&self) -> &Channel<String> {
        &self.training_status
    }

    /// Carries the full per-label counts after every added example.
    pub fn example_count_channel(&self) -> &Channel<ExampleCounts> {
        &self.example_counts
    }

    pub fn setup_camera(&self) -> Result<(), GestureError> {
        self.device_camera.start().map_err(|err| {
            let _ = self.logger.error(&format!("Camera setup failed: {}", err));
            GestureError::Device(err.to_string())
        })
    }

    pub fn stop_camera(&self) -> Result<(), GestureError> {
        self.device_camera
            .stop()
            .map_err(|err| GestureError::Device(err.to_string()))
    }

    pub fn wait_for_frame(&self) -> Result<(), GestureError> {
        self.device_camera
            .wait_for_frame()
            .map_err(|err| GestureError::Device(err.to_string()))
    }

    pub fn example_counts(&self) -> ExampleCounts {
        self.lock_dataset().example_counts().clone()
    }

    pub fn dataset_rows(&self) -> usize {
        self.lock_dataset().rows()
    }

    pub fn is_trained(&self) -> bool {
        self.active_classifier().is_some()
    }

    pub(super) fn active_classifier(&self) -> Option<Arc<Classifier>> {
        self.classifier
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(super) fn replace_classifier(&self, classifier: Classifier) {
        *self.classifier.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(classifier));
    }

    // The dataset is only assigned after every fallible step, so a poisoned
    // lock still guards consistent tensors.
    pub(super) fn lock_dataset(&self) -> MutexGuard<'_, Dataset> {
        self.dataset.lock().unwrap_or_else(|e| e.into_inner())
    }
}
