use crate::label::Label;
use image::DynamicImage;
use std::error::Error;

/// A 16x2 character screen with one thumbnail slot per label.
pub trait DeviceDisplay: Send + Sync {
    fn init(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;

    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Write text to a specific line on the display (0-based index).
    /// Text longer than `chars_per_line` is truncated.
    fn write_line(&mut self, line: u8, text: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Show `frame` in the thumbnail slot for `label`.
    fn draw_frame(&mut self, label: Label, frame: &DynamicImage) -> Result<(), Box<dyn Error + Send + Sync>>;

    fn num_lines(&self) -> u8 {
        2
    }

    fn chars_per_line(&self) -> u8 {
        16
    }
}

pub type LineBuffer = [[char; 16]; 2];

pub fn empty_lines() -> LineBuffer {
    [[' '; 16]; 2]
}

pub fn write_into(buffer: &mut LineBuffer, line: u8, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let row = buffer
        .get_mut(line as usize)
        .ok_or("Invalid line number")?;
    *row = [' '; 16];
    for (i, c) in text.chars().take(16).enumerate() {
        row[i] = c;
    }
    Ok(())
}
