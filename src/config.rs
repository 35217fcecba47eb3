use crate::error::GestureError;
use std::path::PathBuf;
use std::time::Duration;

pub const LEARNING_RATE_OPTIONS: [f32; 4] = [0.00001, 0.0001, 0.001, 0.003];
pub const BATCH_SIZE_FRACTION_OPTIONS: [f32; 4] = [0.05, 0.1, 0.4, 1.0];
pub const EPOCH_OPTIONS: [usize; 3] = [10, 20, 40];
pub const DENSE_UNIT_OPTIONS: [usize; 3] = [10, 100, 200];

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub dense_units: usize,
    pub learning_rate: f32,
    pub epochs: usize,
    /// Share of the dataset processed per gradient step.
    pub batch_size_fraction: f32,
    /// Fixes weight initialization and shuffling. Random when `None`.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dense_units: DENSE_UNIT_OPTIONS[1],
            learning_rate: LEARNING_RATE_OPTIONS[1],
            epochs: EPOCH_OPTIONS[1],
            batch_size_fraction: BATCH_SIZE_FRACTION_OPTIONS[2],
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        if !(self.learning_rate > 0.0) {
            return Err(GestureError::validation("learning rate must be positive"));
        }
        if !(self.batch_size_fraction > 0.0 && self.batch_size_fraction <= 1.0) {
            return Err(GestureError::validation(
                "batch size fraction must be in (0, 1]",
            ));
        }
        if self.epochs == 0 {
            return Err(GestureError::validation("epochs must be positive"));
        }
        if self.dense_units == 0 {
            return Err(GestureError::validation("dense units must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Filesystem path or `file://` URL of an ONNX graph.
    pub source: String,
    pub output_layer: String,
    /// (width, height)
    pub input_size: (u32, u32),
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            source: "./models/mobilenet_v1_0.25_224.onnx".to_string(),
            output_layer: "conv_pw_13_relu".to_string(),
            input_size: (224, 224),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureExtractorConfig {
    Fake { grid: u32 },
    TractOnnx(ModelConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraConfig {
    Fake,
    ImageDir(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayConfig {
    Console,
    Gui,
    Fake,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub logger_timezone: chrono::FixedOffset,
    pub frame_interval: Duration,
    pub training: TrainingConfig,
    pub feature_extractor: FeatureExtractorConfig,
    pub camera: CameraConfig,
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logger_timezone: mountain_standard_time(),
            frame_interval: Duration::from_millis(33),
            training: TrainingConfig::default(),
            feature_extractor: FeatureExtractorConfig::Fake { grid: 8 },
            camera: CameraConfig::Fake,
            display: DisplayConfig::Console,
        }
    }
}

impl Config {
    /// Defaults, overridden by `GESTURE_MODEL`, `GESTURE_LAYER`,
    /// `GESTURE_FRAMES` and `GESTURE_DISPLAY` when set.
    pub fn from_env() -> Result<Self, GestureError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GestureError> {
        let mut config = Config::default();

        if let Some(source) = lookup("GESTURE_MODEL") {
            let mut model = ModelConfig {
                source,
                ..ModelConfig::default()
            };
            if let Some(layer) = lookup("GESTURE_LAYER") {
                model.output_layer = layer;
            }
            config.feature_extractor = FeatureExtractorConfig::TractOnnx(model);
        }

        if let Some(dir) = lookup("GESTURE_FRAMES") {
            config.camera = CameraConfig::ImageDir(PathBuf::from(dir));
        }

        if let Some(display) = lookup("GESTURE_DISPLAY") {
            config.display = match display.to_ascii_lowercase().as_str() {
                "console" => DisplayConfig::Console,
                "gui" => DisplayConfig::Gui,
                "fake" => DisplayConfig::Fake,
                other => {
                    return Err(GestureError::validation(format!(
                        "unknown display '{}', expected console, gui or fake",
                        other
                    )))
                }
            };
        }

        Ok(config)
    }
}

fn mountain_standard_time() -> chrono::FixedOffset {
    chrono::FixedOffset::west_opt(7 * 3600).unwrap_or_else(utc)
}

fn utc() -> chrono::FixedOffset {
    chrono::FixedOffset::east_opt(0).expect("zero offset is always valid")
}
