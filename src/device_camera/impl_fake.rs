use crate::device_camera::interface::DeviceCamera;
use crate::library::logger::interface::Logger;
use image::{DynamicImage, ImageBuffer, Rgb};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Produces solid frames of whatever color is currently "in front of" it,
/// optionally with per-pixel noise.
pub struct DeviceCameraFake {
    logger: Arc<dyn Logger + Send + Sync>,
    connected: bool,
    started: AtomicBool,
    color: Mutex<Rgb<u8>>,
    noise: u8,
    frame_size: (u32, u32),
    frame_interval: Duration,
}

impl DeviceCameraFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, frame_interval: Duration) -> Self {
        Self {
            logger: logger.with_namespace("camera").with_namespace("fake"),
            connected: true,
            started: AtomicBool::new(false),
            color: Mutex::new(Rgb([0, 0, 0])),
            noise: 0,
            frame_size: (64, 48),
            frame_interval,
        }
    }

    /// A camera whose `start` always fails.
    pub fn disconnected(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            connected: false,
            ..Self::new(logger, Duration::ZERO)
        }
    }

    pub fn with_noise(mut self, noise: u8) -> Self {
        self.noise = noise;
        self
    }

    pub fn show(&self, color: [u8; 3]) {
        let mut current = self.color.lock().unwrap_or_else(|e| e.into_inner());
        *current = Rgb(color);
    }
}

impl DeviceCamera for DeviceCameraFake {
    fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info("Starting camera...")?;
        if !self.connected {
            return Err("no capture device available".into());
        }
        self.started.store(true, Ordering::SeqCst);
        self.logger.info("Camera started")?;
        Ok(())
    }

    fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.started.store(false, Ordering::SeqCst);
        self.logger.info("Camera stopped")?;
        Ok(())
    }

    fn capture_frame(&self) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>> {
        if !self.started.load(Ordering::SeqCst) {
            return Err("camera is not started".into());
        }

        let Rgb(base) = *self.color.lock().unwrap_or_else(|e| e.into_inner());
        let noise = self.noise as i16;
        let mut rng = rand::rng();
        let (width, height) = self.frame_size;

        let frame = ImageBuffer::from_fn(width, height, |_, _| {
            Rgb(base.map(|channel| {
                let jitter = if noise > 0 { rng.random_range(-noise..=noise) } else { 0 };
                (channel as i16 + jitter).clamp(0, 255) as u8
            }))
        });

        Ok(DynamicImage::ImageRgb8(frame))
    }

    fn wait_for_frame(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(self.frame_interval);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::logger::impl_console::LoggerConsole;

    fn logger() -> Arc<dyn Logger + Send + Sync> {
        Arc::new(LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap()))
    }

    #[test]
    fn test_capture_requires_start() {
        let camera = DeviceCameraFake::new(logger(), Duration::ZERO);
        assert!(camera.capture_frame().is_err());

        camera.start().unwrap();
        assert!(camera.capture_frame().is_ok());
    }

    #[test]
    fn test_frames_follow_shown_color() {
        let camera = DeviceCameraFake::new(logger(), Duration::ZERO);
        camera.start().unwrap();
        camera.show([10, 200, 30]);

        let frame = camera.capture_frame().unwrap().to_rgb8();

        assert!(frame.pixels().all(|pixel| pixel.0 == [10, 200, 30]));
    }

    #[test]
    fn test_noise_stays_in_range() {
        let camera = DeviceCameraFake::new(logger(), Duration::ZERO).with_noise(5);
        camera.start().unwrap();
        camera.show([100, 100, 100]);

        let frame = camera.capture_frame().unwrap().to_rgb8();

        assert!(frame
            .pixels()
            .all(|pixel| pixel.0.iter().all(|c| (95..=105).contains(c))));
    }

    #[test]
    fn test_disconnected_camera_fails_to_start() {
        let camera = DeviceCameraFake::disconnected(logger());
        assert!(camera.start().is_err());
    }
}
