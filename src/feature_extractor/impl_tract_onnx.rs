use crate::config::ModelConfig;
use crate::error::GestureError;
use crate::feature_extractor::interface::{Embedding, FeatureExtractor};
use crate::feature_extractor::preprocess::frame_to_tensor;
use crate::library::logger::interface::Logger;
use image::DynamicImage;
use ndarray::{ArrayD, IxDyn};
use std::path::PathBuf;
use std::sync::Arc;
use tract_onnx::prelude::*;

/// Pretrained ONNX network cut at an intermediate layer. The plan is built
/// once and never mutated afterwards.
pub struct FeatureExtractorTractOnnx {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    config: ModelConfig,
    embedding_shape: Vec<usize>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl FeatureExtractorTractOnnx {
    pub fn load_frozen(
        config: ModelConfig,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, GestureError> {
        let logger = logger.with_namespace("feature_extractor").with_namespace("tract");
        let path = resolve_source(&config.source)?;
        if !path.is_file() {
            return Err(GestureError::Load(format!(
                "model source {} does not exist",
                config.source
            )));
        }

        let _ = logger.info(&format!("Loading {}", path.display()));

        let (width, height) = config.input_size;
        let mut model = tract_onnx::onnx()
            .model_for_path(&path)
            .map_err(load_error)?
            .with_input_fact(0, f32::fact([1, height as usize, width as usize, 3]).into())
            .map_err(load_error)?;

        model
            .set_output_names([config.output_layer.as_str()])
            .map_err(|err| {
                GestureError::Load(format!(
                    "layer '{}' not found: {}",
                    config.output_layer, err
                ))
            })?;

        let model = model
            .into_optimized()
            .map_err(load_error)?
            .into_runnable()
            .map_err(load_error)?;

        let output_shape = model
            .model()
            .output_fact(0)
            .map_err(load_error)?
            .shape
            .as_concrete()
            .map(|shape| shape.to_vec())
            .ok_or_else(|| GestureError::Load("embedding shape is not fixed".to_string()))?;

        let embedding_shape = output_shape.get(1..).unwrap_or_default().to_vec();

        let _ = logger.info(&format!(
            "Loaded, '{}' yields {:?}",
            config.output_layer, embedding_shape
        ));

        Ok(Self {
            model,
            config,
            embedding_shape,
            logger,
        })
    }
}

impl FeatureExtractor for FeatureExtractorTractOnnx {
    fn input_size(&self) -> (u32, u32) {
        self.config.input_size
    }

    fn embedding_shape(&self) -> Vec<usize> {
        self.embedding_shape.clone()
    }

    fn embed(&self, frame: &DynamicImage) -> Result<Embedding, GestureError> {
        let (width, height) = self.config.input_size;
        let input = frame_to_tensor(frame, width, height);

        let outputs = self
            .model
            .run(tvec!(input.into_tvalue()))
            .map_err(|err| {
                let _ = self.logger.error(&format!("Forward pass failed: {}", err));
                GestureError::shape(format!("forward pass failed: {}", err))
            })?;

        let activation = outputs[0]
            .to_array_view::<f32>()
            .map_err(|err| GestureError::shape(err.to_string()))?;

        let data = ArrayD::from_shape_vec(
            IxDyn(activation.shape()),
            activation.iter().copied().collect(),
        )?;

        Embedding::new(data)
    }
}

fn resolve_source(source: &str) -> Result<PathBuf, GestureError> {
    if let Some(path) = source.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if let Some((scheme, _)) = source.split_once("://") {
        return Err(GestureError::Load(format!(
            "unsupported model source scheme '{}'",
            scheme
        )));
    }
    Ok(PathBuf::from(source))
}

fn load_error(err: impl std::fmt::Display) -> GestureError {
    GestureError::Load(err.to_string())
}
