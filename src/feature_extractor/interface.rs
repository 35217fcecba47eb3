use crate::error::GestureError;
use image::DynamicImage;
use ndarray::{ArrayD, ArrayViewD};

/// Output of the frozen network for one frame: leading batch axis of 1
/// followed by the per-example shape, e.g. `[1, 7, 7, 256]`.
#[derive(Debug, PartialEq)]
pub struct Embedding {
    data: ArrayD<f32>,
}

impl Embedding {
    pub fn new(data: ArrayD<f32>) -> Result<Self, GestureError> {
        if data.ndim() < 2 || data.shape()[0] != 1 {
            return Err(GestureError::shape(format!(
                "embedding must have a leading batch axis of 1, got {:?}",
                data.shape()
            )));
        }
        Ok(Self { data })
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Shape of a single example, without the batch axis.
    pub fn example_shape(&self) -> &[usize] {
        &self.data.shape()[1..]
    }

    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    pub fn into_array(self) -> ArrayD<f32> {
        self.data
    }
}

pub trait FeatureExtractor: Send + Sync {
    /// (width, height) frames are resized to before the forward pass.
    fn input_size(&self) -> (u32, u32);

    /// Per-example embedding shape, without the batch axis.
    fn embedding_shape(&self) -> Vec<usize>;

    fn embed(&self, frame: &DynamicImage) -> Result<Embedding, GestureError>;
}
