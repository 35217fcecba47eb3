use crate::device_display::interface::{empty_lines, write_into, DeviceDisplay, LineBuffer};
use crate::label::Label;
use image::DynamicImage;
use std::collections::BTreeMap;
use std::error::Error;

pub struct DeviceDisplayConsole {
    display_buffer: LineBuffer,
    thumbnails: BTreeMap<Label, (u32, u32)>,
}

impl DeviceDisplayConsole {
    pub fn new() -> Self {
        Self {
            display_buffer: empty_lines(),
            thumbnails: BTreeMap::new(),
        }
    }

    fn render_display(&self) {
        println!("┌────────────────┐");
        for row in &self.display_buffer {
            let text: String = row.iter().collect();
            println!("│{}│", text);
        }
        println!("└────────────────┘");

        if !self.thumbnails.is_empty() {
            let slots: Vec<String> = self
                .thumbnails
                .iter()
                .map(|(label, (width, height))| format!("{} {}x{}", label, width, height))
                .collect();
            println!(" [{}]", slots.join("] ["));
        }
    }
}

impl DeviceDisplay for DeviceDisplayConsole {
    fn init(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.render_display();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.display_buffer = empty_lines();
        Ok(())
    }

    fn write_line(&mut self, line: u8, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        write_into(&mut self.display_buffer, line, text)?;
        // Both lines are written per frame; draw once the last one lands.
        if line + 1 == self.num_lines() {
            self.render_display();
        }
        Ok(())
    }

    fn draw_frame(&mut self, label: Label, frame: &DynamicImage) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.thumbnails
            .insert(label, (frame.width(), frame.height()));
        Ok(())
    }
}
