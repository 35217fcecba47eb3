use crate::error::GestureError;
use crate::feature_extractor::interface::{Embedding, FeatureExtractor};
use crate::feature_extractor::preprocess::normalize_channel;
use crate::library::logger::interface::Logger;
use image::{imageops, DynamicImage};
use ndarray::Array4;
use std::sync::Arc;

/// Stand-in for the pretrained network: the frame averaged down to a
/// `grid x grid x 3` patch. Deterministic, and colors stay separable.
pub struct FeatureExtractorFake {
    grid: u32,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl FeatureExtractorFake {
    pub fn new(grid: u32, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            grid: grid.max(1),
            logger: logger.with_namespace("feature_extractor").with_namespace("fake"),
        }
    }
}

impl FeatureExtractor for FeatureExtractorFake {
    fn input_size(&self) -> (u32, u32) {
        (self.grid * 8, self.grid * 8)
    }

    fn embedding_shape(&self) -> Vec<usize> {
        vec![self.grid as usize, self.grid as usize, 3]
    }

    fn embed(&self, frame: &DynamicImage) -> Result<Embedding, GestureError> {
        if frame.width() == 0 || frame.height() == 0 {
            let _ = self.logger.error("Refusing to embed an empty frame");
            return Err(GestureError::shape("frame has no pixels"));
        }

        let grid = self.grid;
        let patch = frame.resize_exact(grid, grid, imageops::FilterType::Triangle).to_rgb8();

        let data = Array4::from_shape_fn(
            (1, grid as usize, grid as usize, 3),
            |(_, y, x, c)| normalize_channel(patch.get_pixel(x as u32, y as u32)[c]),
        );

        Embedding::new(data.into_dyn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::logger::impl_console::LoggerConsole;
    use image::{ImageBuffer, Rgb};

    fn extractor() -> FeatureExtractorFake {
        let logger = Arc::new(LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap()));
        FeatureExtractorFake::new(4, logger)
    }

    fn solid(color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(32, 24, Rgb(color)))
    }

    #[test]
    fn test_embedding_shape() {
        let extractor = extractor();
        let embedding = extractor.embed(&solid([10, 20, 30])).unwrap();

        assert_eq!(embedding.shape(), &[1, 4, 4, 3]);
        assert_eq!(embedding.example_shape(), extractor.embedding_shape().as_slice());
    }

    #[test]
    fn test_embed_is_deterministic() {
        let extractor = extractor();
        let frame = solid([200, 10, 90]);

        assert_eq!(extractor.embed(&frame).unwrap(), extractor.embed(&frame).unwrap());
    }

    #[test]
    fn test_different_colors_give_different_embeddings() {
        let extractor = extractor();
        let red = extractor.embed(&solid([255, 0, 0])).unwrap();
        let blue = extractor.embed(&solid([0, 0, 255])).unwrap();

        assert_ne!(red, blue);
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let extractor = extractor();
        let empty = DynamicImage::new_rgb8(0, 0);

        assert!(matches!(extractor.embed(&empty), Err(GestureError::Shape(_))));
    }
}
