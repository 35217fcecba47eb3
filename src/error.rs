use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GestureError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("failed to load feature extractor: {0}")]
    Load(String),
    #[error("device error: {0}")]
    Device(String),
    #[error("shape error: {0}")]
    Shape(String),
}

impl GestureError {
    pub fn validation(message: impl Into<String>) -> Self {
        GestureError::Validation(message.into())
    }

    pub fn shape(message: impl Into<String>) -> Self {
        GestureError::Shape(message.into())
    }
}

impl From<ndarray::ShapeError> for GestureError {
    fn from(err: ndarray::ShapeError) -> Self {
        GestureError::Shape(err.to_string())
    }
}
