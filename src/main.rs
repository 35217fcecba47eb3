use config::{CameraConfig, Config, DisplayConfig, FeatureExtractorConfig};
use device_camera::{
    impl_fake::DeviceCameraFake, impl_image_dir::DeviceCameraImageDir, interface::DeviceCamera,
};
use device_display::{
    impl_console::DeviceDisplayConsole, impl_fake::DeviceDisplayFake, impl_gui::DeviceDisplayGui,
    interface::DeviceDisplay,
};
use feature_extractor::{
    impl_fake::FeatureExtractorFake, impl_tract_onnx::FeatureExtractorTractOnnx,
    interface::FeatureExtractor,
};
use gesture_model::main::GestureModel;
use library::logger::{impl_console::LoggerConsole, interface::Logger};
use session::run::Session;
use session::run_effect::CommandInput;
use std::io::BufRead;
use std::sync::{Arc, Mutex};

mod classifier;
mod config;
mod dataset;
mod device_camera;
mod device_display;
mod error;
mod feature_extractor;
mod gesture_model;
mod label;
mod library;
mod session;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;

    let logger: Arc<dyn Logger + Send + Sync> = Arc::new(LoggerConsole::new(config.logger_timezone));

    let feature_extractor: Arc<dyn FeatureExtractor + Send + Sync> = match &config.feature_extractor {
        FeatureExtractorConfig::Fake { grid } => Arc::new(FeatureExtractorFake::new(*grid, logger.clone())),
        FeatureExtractorConfig::TractOnnx(model_config) => Arc::new(
            FeatureExtractorTractOnnx::load_frozen(model_config.clone(), logger.clone())?,
        ),
    };

    let device_camera: Arc<dyn DeviceCamera + Send + Sync> = match &config.camera {
        CameraConfig::Fake => Arc::new(DeviceCameraFake::new(logger.clone(), config.frame_interval).with_noise(4)),
        CameraConfig::ImageDir(dir) => Arc::new(DeviceCameraImageDir::new(
            dir,
            config.frame_interval,
            logger.clone(),
        )),
    };

    let device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>> = match config.display {
        DisplayConfig::Console => Arc::new(Mutex::new(DeviceDisplayConsole::new())),
        DisplayConfig::Gui => Arc::new(Mutex::new(DeviceDisplayGui::new())),
        DisplayConfig::Fake => Arc::new(Mutex::new(DeviceDisplayFake::new(logger.clone()))),
    };

    let gesture_model = GestureModel::new(logger.clone(), feature_extractor, device_camera);

    let stdin: Box<dyn BufRead + Send> = Box::new(std::io::BufReader::new(std::io::stdin()));
    let input: CommandInput = Arc::new(Mutex::new(stdin));

    let _ = logger.info(session::command::USAGE);

    let session = Session::new(
        logger,
        config.training.clone(),
        gesture_model,
        device_display,
        input,
    );

    session.run()?;

    Ok(())
}
