use crate::device_camera::interface::DeviceCamera;
use crate::library::logger::interface::Logger;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Replays the images of a directory in file-name order, looping forever.
pub struct DeviceCameraImageDir {
    logger: Arc<dyn Logger + Send + Sync>,
    dir: PathBuf,
    frames: Mutex<Vec<PathBuf>>,
    cursor: AtomicUsize,
    frame_interval: Duration,
}

impl DeviceCameraImageDir {
    pub fn new(dir: &Path, frame_interval: Duration, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("camera").with_namespace("image_dir"),
            dir: dir.to_path_buf(),
            frames: Mutex::new(Vec::new()),
            cursor: AtomicUsize::new(0),
            frame_interval,
        }
    }
}

impl DeviceCamera for DeviceCameraImageDir {
    fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info(&format!("Scanning {}", self.dir.display()))?;

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(format!("no images found in {}", self.dir.display()).into());
        }

        self.logger.info(&format!("Found {} frames", paths.len()))?;
        *self.frames.lock().unwrap_or_else(|e| e.into_inner()) = paths;
        Ok(())
    }

    fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }

    fn capture_frame(&self) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>> {
        let frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
        if frames.is_empty() {
            return Err("camera is not started".into());
        }
        let index = self.cursor.load(Ordering::SeqCst) % frames.len();
        Ok(image::open(&frames[index])?)
    }

    fn wait_for_frame(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(self.frame_interval);
        self.cursor.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
