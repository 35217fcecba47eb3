use crate::config::TrainingConfig;
use crate::error::GestureError;
use crate::label::Label;
use crate::session::command::Command;
use crate::session::core::{init, is_done, transition, CameraState, Effect, Event, Mode, State, NO_CAMERA};
use crate::session::render::lines;

fn ready() -> State {
    let (state, _) = init(TrainingConfig::default());
    let (state, _) = transition(state, Event::CameraSetupDone(Ok(())));
    state
}

fn trained() -> State {
    let (state, _) = transition(ready(), Event::Command(Command::Train));
    let (state, _) = transition(state, Event::TrainDone(Ok(())));
    state
}

#[test]
fn test_init() {
    let (state, effects) = init(TrainingConfig::default());

    assert_eq!(state.mode, Mode::Teaching);
    assert_eq!(state.camera, CameraState::SettingUp);
    assert!(!state.trained);
    assert!(effects.contains(&Effect::SubscribeToCommands));
    assert!(effects.contains(&Effect::SubscribeToExampleCounts));
    assert!(effects.contains(&Effect::SubscribeToTrainingStatus));
    assert!(effects.contains(&Effect::SetupCamera));
}

#[test]
fn test_camera_setup_warms_up_either_way() {
    let (state, _) = init(TrainingConfig::default());
    let (ok, effects) = transition(state.clone(), Event::CameraSetupDone(Ok(())));
    assert_eq!(ok.camera, CameraState::Ready);
    assert_eq!(effects, vec![Effect::WarmUp]);

    let failure = GestureError::Device("no capture device available".to_string());
    let (failed, effects) = transition(state, Event::CameraSetupDone(Err(failure)));
    assert_eq!(failed.camera, CameraState::Unavailable);
    assert_eq!(failed.message.as_deref(), Some(NO_CAMERA));
    assert_eq!(effects, vec![Effect::WarmUp]);
}

#[test]
fn test_record_needs_camera() {
    let (state, _) = init(TrainingConfig::default());
    let (state, effects) = transition(state, Event::Command(Command::Record(Label::Rock)));

    assert!(effects.is_empty());
    assert_eq!(state.message.as_deref(), Some(NO_CAMERA));

    let (_, effects) = transition(ready(), Event::Command(Command::Record(Label::Rock)));
    assert_eq!(
        effects,
        vec![Effect::AddExample {
            ticket: 1,
            label: Label::Rock
        }]
    );
}

#[test]
fn test_counts_and_failed_examples() {
    let mut counts = Label::empty_counts();
    counts.insert(Label::Rock, 3);

    let (state, _) = transition(ready(), Event::ExampleCountsChanged(counts.clone()));
    assert_eq!(state.example_counts, counts);
    assert_eq!(lines(&state, 16)[1], "N0 P0 R3 S0");

    let failure = GestureError::validation("bad label");
    let (state, _) = transition(state, Event::ExampleAdded(Err(failure)));
    assert_eq!(state.message.as_deref(), Some("validation error: bad label"));
}

#[test]
fn test_training_flow() {
    let config = TrainingConfig {
        epochs: 40,
        ..TrainingConfig::default()
    };
    let (state, _) = init(config.clone());

    let (state, effects) = transition(state, Event::Command(Command::Train));
    assert_eq!(state.mode, Mode::Training);
    assert_eq!(effects, vec![Effect::Train { ticket: 1, config }]);

    let (state, effects) = transition(state, Event::Command(Command::Record(Label::Paper)));
    assert!(effects.is_empty());
    assert_eq!(state.mode, Mode::Training);

    let (state, _) = transition(state, Event::TrainingStatus("Loss: 1.38629".to_string()));
    assert_eq!(lines(&state, 16), ["Training...".to_string(), "Loss: 1.38629".to_string()]);

    let (state, _) = transition(state, Event::TrainDone(Ok(())));
    assert_eq!(state.mode, Mode::Teaching);
    assert!(state.trained);
}

#[test]
fn test_failed_training_reports_error() {
    let (state, _) = transition(ready(), Event::Command(Command::Train));
    let (state, _) = transition(state, Event::TrainDone(Err(GestureError::validation("empty dataset"))));

    assert_eq!(state.mode, Mode::Teaching);
    assert!(!state.trained);
    assert_eq!(state.message.as_deref(), Some("validation error: empty dataset"));
}

#[test]
fn test_play_requires_training() {
    let (state, effects) = transition(ready(), Event::Command(Command::Play));

    assert_eq!(state.mode, Mode::Teaching);
    assert!(effects.is_empty());
    assert!(state.message.is_some());
}

#[test]
fn test_play_and_stop() {
    let (state, effects) = transition(trained(), Event::Command(Command::Play));
    assert_eq!(state.mode, Mode::Playing);
    assert_eq!(effects, vec![Effect::StartPlayLoop(1)]);

    let (state, _) = transition(state, Event::Predicted("ROCK".to_string()));
    assert_eq!(lines(&state, 16), ["Playing".to_string(), "ROCK".to_string()]);

    let (state, effects) = transition(state, Event::Command(Command::Record(Label::Rock)));
    assert!(effects.is_empty());
    assert_eq!(state.mode, Mode::Playing);

    let (state, effects) = transition(state, Event::Command(Command::Stop));
    assert_eq!(state.mode, Mode::Teaching);
    assert_eq!(effects, vec![Effect::StopPlayLoop(1)]);

    // A late prediction from the stopped loop is ignored.
    let (state, _) = transition(state, Event::Predicted("PAPER".to_string()));
    assert_eq!(state.prediction, None);

    let (_, effects) = transition(state, Event::Command(Command::Play));
    assert_eq!(effects, vec![Effect::StartPlayLoop(2)]);
}

#[test]
fn test_play_loop_failure_returns_to_teaching() {
    let (state, _) = transition(trained(), Event::Command(Command::Play));
    let failure = GestureError::Device("camera is not started".to_string());

    let (state, _) = transition(state, Event::PlayLoopStopped(Err(failure)));

    assert_eq!(state.mode, Mode::Teaching);
    assert!(state.message.is_some());
}

#[test]
fn test_hyper_parameters() {
    let (state, _) = transition(ready(), Event::Command(Command::LearningRate(0.003)));
    let (state, _) = transition(state, Event::Command(Command::BatchSizeFraction(1.0)));
    let (state, _) = transition(state, Event::Command(Command::Epochs(10)));
    let (state, _) = transition(state, Event::Command(Command::DenseUnits(200)));

    assert_eq!(state.training_config.learning_rate, 0.003);
    assert_eq!(state.training_config.batch_size_fraction, 1.0);
    assert_eq!(state.training_config.epochs, 10);
    assert_eq!(state.training_config.dense_units, 200);
    assert_eq!(state.message, None);

    let (rejected, _) = transition(state.clone(), Event::Command(Command::BatchSizeFraction(2.0)));
    assert_eq!(rejected.training_config, state.training_config);
    assert!(rejected.message.is_some());
}

#[test]
fn test_quit() {
    let (state, effects) = transition(ready(), Event::Command(Command::Quit));
    assert!(is_done(&state));
    assert!(effects.is_empty());

    let (playing, _) = transition(trained(), Event::Command(Command::Play));
    let (state, effects) = transition(playing, Event::Command(Command::Quit));
    assert!(is_done(&state));
    assert_eq!(effects, vec![Effect::StopPlayLoop(1)]);

    let (state, _) = transition(ready(), Event::InputClosed);
    assert!(is_done(&state));
}

#[test]
fn test_dataset_jobs_are_numbered_in_command_order() {
    let (state, first) = transition(ready(), Event::Command(Command::Record(Label::Rock)));
    let (state, second) = transition(state, Event::Command(Command::Record(Label::Paper)));
    let (_, third) = transition(state, Event::Command(Command::Train));

    let tickets: Vec<u64> = [first, second, third]
        .concat()
        .iter()
        .map(|effect| match effect {
            Effect::AddExample { ticket, .. } | Effect::Train { ticket, .. } => *ticket,
            other => panic!("unexpected effect {:?}", other),
        })
        .collect();
    assert_eq!(tickets, vec![1, 2, 3]);
}

#[test]
fn test_effect_names_leave_out_payloads() {
    let effect = Effect::Train {
        ticket: 4,
        config: TrainingConfig::default(),
    };
    assert_eq!(effect.name(), "Train");
    assert_eq!(Effect::StopPlayLoop(2).name(), "StopPlayLoop");
}
