use image::{imageops, DynamicImage};
use tract_onnx::prelude::*;

/// Maps a channel value from `[0, 255]` to `[-1, 1]`.
pub fn normalize_channel(value: u8) -> f32 {
    value as f32 / 127.5 - 1.0
}

/// Letterboxes non-square frames onto a black canvas so the aspect ratio
/// survives the resize.
pub fn resize_image(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == image.height() {
        return image.resize_exact(width, height, imageops::FilterType::Triangle);
    }

    let (w, h) = (image.width() as f32, image.height() as f32);
    let scale = (width as f32 / w).min(height as f32 / h);
    let new_w = ((w * scale) as u32).clamp(1, width);
    let new_h = ((h * scale) as u32).clamp(1, height);

    let scaled = image
        .resize_exact(new_w, new_h, imageops::FilterType::Triangle)
        .to_rgb8();
    let mut padded = DynamicImage::new_rgb8(width, height).to_rgb8();

    let x_offset = (width - new_w) / 2;
    let y_offset = (height - new_h) / 2;
    imageops::replace(&mut padded, &scaled, x_offset as i64, y_offset as i64);

    DynamicImage::from(padded)
}

/// NHWC `[1, height, width, 3]` tensor normalized to `[-1, 1]`.
pub fn frame_to_tensor(frame: &DynamicImage, width: u32, height: u32) -> Tensor {
    let rgb = resize_image(frame, width, height).to_rgb8();

    tract_ndarray::Array4::from_shape_fn(
        (1, height as usize, width as usize, 3),
        |(_, y, x, c)| normalize_channel(rgb.get_pixel(x as u32, y as u32)[c]),
    )
    .into_tensor()
}
