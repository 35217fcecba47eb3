use super::fixture::{color_of, quick_training_config, Fixture};
use crate::device_camera::interface::DeviceCamera;
use crate::error::GestureError;
use crate::gesture_model::play_loop::PlayLoop;
use crate::label::Label;
use std::sync::mpsc;
use std::time::{Duration, Instant};

#[test]
fn test_play_requires_trained_classifier() {
    let fixture = Fixture::with_examples(1);

    let result = PlayLoop::start(fixture.gesture_model.clone(), |_| {});

    assert!(matches!(result, Err(GestureError::Shape(_))));
}

#[test]
fn test_play_reports_predictions_until_stopped() {
    let fixture = Fixture::with_examples(3);
    fixture.gesture_model.train(&quick_training_config()).unwrap();
    fixture.device_camera.show(color_of(Label::Rock));

    let (sender, receiver) = mpsc::channel();
    let play_loop = PlayLoop::start(fixture.gesture_model.clone(), move |value| {
        let _ = sender.send(value.to_string());
    })
    .unwrap();

    let first = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(first, "ROCK");
    assert!(play_loop.is_running());

    play_loop.stop().unwrap();

    // The worker is joined, so nothing new arrives after the backlog.
    let _ = receiver.try_iter().count();
    assert!(receiver.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn test_neutral_prediction_shows_blank() {
    let fixture = Fixture::with_examples(3);
    fixture.gesture_model.train(&quick_training_config()).unwrap();
    fixture.device_camera.show(color_of(Label::Neutral));

    let (sender, receiver) = mpsc::channel();
    let play_loop = PlayLoop::start(fixture.gesture_model.clone(), move |value| {
        let _ = sender.send(value.to_string());
    })
    .unwrap();

    assert_eq!(receiver.recv_timeout(Duration::from_secs(5)).unwrap(), "");
    drop(play_loop);
}

#[test]
fn test_camera_failure_ends_loop_with_error() {
    let fixture = Fixture::with_examples(3);
    fixture.gesture_model.train(&quick_training_config()).unwrap();

    let (sender, receiver) = mpsc::channel();
    let play_loop = PlayLoop::start(fixture.gesture_model.clone(), move |value| {
        let _ = sender.send(value.to_string());
    })
    .unwrap();
    receiver.recv_timeout(Duration::from_secs(5)).unwrap();

    fixture.device_camera.stop().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while play_loop.is_running() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(!play_loop.is_running());

    assert!(matches!(play_loop.stop(), Err(GestureError::Device(_))));
}
