use crate::device_display::interface::{empty_lines, write_into, DeviceDisplay, LineBuffer};
use crate::label::Label;
use crate::library::logger::interface::Logger;
use image::DynamicImage;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// What a fake display has been told to show. Shared so tests can inspect it.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub lines: LineBuffer,
    pub drawn: Vec<Label>,
}

impl Screen {
    pub fn line(&self, line: usize) -> String {
        self.lines[line].iter().collect::<String>().trim_end().to_string()
    }
}

pub struct DeviceDisplayFake {
    logger: Arc<dyn Logger + Send + Sync>,
    screen: Arc<Mutex<Screen>>,
}

impl DeviceDisplayFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("display").with_namespace("fake"),
            screen: Arc::new(Mutex::new(Screen {
                lines: empty_lines(),
                drawn: Vec::new(),
            })),
        }
    }

    pub fn screen(&self) -> Arc<Mutex<Screen>> {
        self.screen.clone()
    }

    fn with_screen<T>(&self, f: impl FnOnce(&mut Screen) -> T) -> T {
        let mut screen = self.screen.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut screen)
    }
}

impl DeviceDisplay for DeviceDisplayFake {
    fn init(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.logger.info("init()")?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.with_screen(|screen| screen.lines = empty_lines());
        Ok(())
    }

    fn write_line(&mut self, line: u8, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.logger.info(&format!("write_line({}, {})", line, text))?;
        self.with_screen(|screen| write_into(&mut screen.lines, line, text))
    }

    fn draw_frame(&mut self, label: Label, frame: &DynamicImage) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.logger.info(&format!(
            "draw_frame({}, {}x{})",
            label,
            frame.width(),
            frame.height()
        ))?;
        self.with_screen(|screen| screen.drawn.push(label));
        Ok(())
    }
}
