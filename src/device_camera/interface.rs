use image::DynamicImage;

pub trait DeviceCamera: Send + Sync {
    /// Fails when no capture device is available.
    fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Most recent frame. Only valid after a successful `start`.
    fn capture_frame(&self) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>>;
    /// Blocks until the next frame is ready.
    fn wait_for_frame(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
