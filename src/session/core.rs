use crate::config::TrainingConfig;
use crate::error::GestureError;
use crate::label::{ExampleCounts, Label};
use crate::session::command::Command;

pub const NO_CAMERA: &str = "No camera detected.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Teaching,
    Training,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    SettingUp,
    Ready,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub mode: Mode,
    pub camera: CameraState,
    pub trained: bool,
    pub training_config: TrainingConfig,
    pub example_counts: ExampleCounts,
    pub training_status: Option<String>,
    pub prediction: Option<String>,
    pub message: Option<String>,
    /// Incremented every time play starts.
    pub play_run: u64,
    /// Incremented for every dataset job, so jobs apply in command order.
    pub teach_ticket: u64,
    pub quitting: bool,
}

#[derive(Debug)]
pub enum Event {
    CameraSetupDone(Result<(), GestureError>),
    Command(Command),
    CommandRejected(GestureError),
    InputClosed,
    ExampleAdded(Result<Label, GestureError>),
    ExampleCountsChanged(ExampleCounts),
    TrainingStatus(String),
    TrainDone(Result<(), GestureError>),
    Predicted(String),
    PlayLoopStopped(Result<(), GestureError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SetupCamera,
    WarmUp,
    SubscribeToCommands,
    SubscribeToExampleCounts,
    SubscribeToTrainingStatus,
    AddExample { ticket: u64, label: Label },
    Train { ticket: u64, config: TrainingConfig },
    StartPlayLoop(u64),
    StopPlayLoop(u64),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::SetupCamera => "SetupCamera",
            Effect::WarmUp => "WarmUp",
            Effect::SubscribeToCommands => "SubscribeToCommands",
            Effect::SubscribeToExampleCounts => "SubscribeToExampleCounts",
            Effect::SubscribeToTrainingStatus => "SubscribeToTrainingStatus",
            Effect::AddExample { .. } => "AddExample",
            Effect::Train { .. } => "Train",
            Effect::StartPlayLoop(_) => "StartPlayLoop",
            Effect::StopPlayLoop(_) => "StopPlayLoop",
        }
    }
}

pub fn init(training_config: TrainingConfig) -> (State, Vec<Effect>) {
    (
        State {
            mode: Mode::Teaching,
            camera: CameraState::SettingUp,
            trained: false,
            training_config,
            example_counts: Label::empty_counts(),
            training_status: None,
            prediction: None,
            message: None,
            play_run: 0,
            teach_ticket: 0,
            quitting: false,
        },
        vec![
            Effect::SubscribeToCommands,
            Effect::SubscribeToExampleCounts,
            Effect::SubscribeToTrainingStatus,
            Effect::SetupCamera,
        ],
    )
}

pub fn is_done(state: &State) -> bool {
    state.quitting
}

pub fn transition(state: State, event: Event) -> (State, Vec<Effect>) {
    match event {
        Event::CameraSetupDone(Ok(())) => (
            State {
                camera: CameraState::Ready,
                ..state
            },
            vec![Effect::WarmUp],
        ),
        Event::CameraSetupDone(Err(_)) => (
            State {
                camera: CameraState::Unavailable,
                message: Some(NO_CAMERA.to_string()),
                ..state
            },
            vec![Effect::WarmUp],
        ),

        Event::Command(command) => on_command(state, command),
        Event::CommandRejected(err) => (with_message(state, err.to_string()), vec![]),
        Event::InputClosed => (
            State {
                quitting: true,
                ..state
            },
            vec![],
        ),

        Event::ExampleAdded(Ok(_)) => (state, vec![]),
        Event::ExampleAdded(Err(err)) => (with_message(state, err.to_string()), vec![]),
        Event::ExampleCountsChanged(example_counts) => (
            State {
                example_counts,
                ..state
            },
            vec![],
        ),

        Event::TrainingStatus(status) => (
            State {
                training_status: Some(status),
                ..state
            },
            vec![],
        ),
        Event::TrainDone(Ok(())) => (
            State {
                mode: Mode::Teaching,
                trained: true,
                ..state
            },
            vec![],
        ),
        Event::TrainDone(Err(err)) => (
            State {
                mode: Mode::Teaching,
                message: Some(err.to_string()),
                ..state
            },
            vec![],
        ),

        Event::Predicted(value) if state.mode == Mode::Playing => (
            State {
                prediction: Some(value),
                ..state
            },
            vec![],
        ),
        Event::Predicted(_) => (state, vec![]),
        Event::PlayLoopStopped(Ok(())) => (state, vec![]),
        Event::PlayLoopStopped(Err(err)) => {
            let mode = match state.mode {
                Mode::Playing => Mode::Teaching,
                mode => mode,
            };
            (
                State {
                    mode,
                    message: Some(err.to_string()),
                    ..state
                },
                vec![],
            )
        }
    }
}

fn on_command(state: State, command: Command) -> (State, Vec<Effect>) {
    match command {
        Command::Quit => {
            let effects = match state.mode {
                Mode::Playing => vec![Effect::StopPlayLoop(state.play_run)],
                _ => vec![],
            };
            (
                State {
                    quitting: true,
                    ..state
                },
                effects,
            )
        }

        Command::Record(label) => match busy(&state) {
            Some(reason) => (with_message(state, reason), vec![]),
            None if state.camera != CameraState::Ready => (with_message(state, NO_CAMERA), vec![]),
            None => {
                let ticket = state.teach_ticket + 1;
                (
                    State {
                        teach_ticket: ticket,
                        ..clear_message(state)
                    },
                    vec![Effect::AddExample { ticket, label }],
                )
            }
        },

        Command::Train => match busy(&state) {
            Some(reason) => (with_message(state, reason), vec![]),
            None => {
                let config = state.training_config.clone();
                let ticket = state.teach_ticket + 1;
                (
                    State {
                        mode: Mode::Training,
                        training_status: None,
                        message: None,
                        teach_ticket: ticket,
                        ..state
                    },
                    vec![Effect::Train { ticket, config }],
                )
            }
        },

        Command::Play => match busy(&state) {
            Some(reason) => (with_message(state, reason), vec![]),
            None if !state.trained => (with_message(state, "Train first"), vec![]),
            None if state.camera != CameraState::Ready => (with_message(state, NO_CAMERA), vec![]),
            None => {
                let play_run = state.play_run + 1;
                (
                    State {
                        mode: Mode::Playing,
                        prediction: None,
                        message: None,
                        play_run,
                        ..state
                    },
                    vec![Effect::StartPlayLoop(play_run)],
                )
            }
        },

        Command::Stop => match state.mode {
            Mode::Playing => {
                let play_run = state.play_run;
                (
                    State {
                        mode: Mode::Teaching,
                        prediction: None,
                        ..state
                    },
                    vec![Effect::StopPlayLoop(play_run)],
                )
            }
            _ => (state, vec![]),
        },

        Command::LearningRate(learning_rate) => update_config(
            state,
            |config| TrainingConfig {
                learning_rate,
                ..config
            },
        ),
        Command::BatchSizeFraction(batch_size_fraction) => update_config(
            state,
            |config| TrainingConfig {
                batch_size_fraction,
                ..config
            },
        ),
        Command::Epochs(epochs) => update_config(state, |config| TrainingConfig { epochs, ..config }),
        Command::DenseUnits(dense_units) => update_config(
            state,
            |config| TrainingConfig {
                dense_units,
                ..config
            },
        ),
    }
}

fn busy(state: &State) -> Option<&'static str> {
    match state.mode {
        Mode::Teaching => None,
        Mode::Training => Some("Still training"),
        Mode::Playing => Some("Stop playing first"),
    }
}

fn update_config(
    state: State,
    update: impl FnOnce(TrainingConfig) -> TrainingConfig,
) -> (State, Vec<Effect>) {
    let candidate = update(state.training_config.clone());
    match candidate.validate() {
        Ok(()) => (
            State {
                training_config: candidate,
                message: None,
                ..state
            },
            vec![],
        ),
        Err(err) => (with_message(state, err.to_string()), vec![]),
    }
}

fn with_message(state: State, message: impl Into<String>) -> State {
    State {
        message: Some(message.into()),
        ..state
    }
}

fn clear_message(state: State) -> State {
    State {
        message: None,
        ..state
    }
}
