use crate::config::TrainingConfig;
use crate::device_display::interface::DeviceDisplay;
use crate::gesture_model::main::GestureModel;
use crate::library::logger::interface::Logger;
use crate::library::state_machine::StateMachine;
use crate::session::core::{init, is_done, transition, Effect, Event, State};
use crate::session::render::Render;
use crate::session::run_effect::{CommandInput, RunEffect};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

pub struct Session {
    logger: Arc<dyn Logger + Send + Sync>,
    training_config: TrainingConfig,
    gesture_model: GestureModel,
    device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
    input: CommandInput,
}

impl Session {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        training_config: TrainingConfig,
        gesture_model: GestureModel,
        device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
        input: CommandInput,
    ) -> Self {
        Self {
            logger: logger.with_namespace("session"),
            training_config,
            gesture_model,
            device_display,
            input,
        }
    }

    /// Runs until the user quits or input ends, then stops any play loop and
/// the camera.
    pub fn run(&self) -> Result<State, Box<dyn std::error::Error + Send + Sync>> {
        self.device_display
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .init()?;

        let render = Render::new(self.device_display.clone(), self.logger.clone());
        let run_effect = RunEffect::new(
            self.logger.clone(),
            self.gesture_model.clone(),
            self.device_display.clone(),
            self.input.clone(),
        );
        let effect_runner = run_effect.clone();
        let logger = self.logger.clone();

        let state_machine = StateMachine::new(
            init(self.training_config.clone()),
            move |state: State, event: Event| {
                let _ = logger.info(&format!("Processing event: {:?}", event));
                transition(state, event)
            },
            move |state: &State| render.render(state),
            move |effect: Effect, event_sender: Sender<Event>| effect_runner.run_effect(effect, event_sender),
            is_done,
        );

        let final_state = state_machine.run()?;
        run_effect.shutdown();
        if let Err(err) = self.gesture_model.stop_camera() {
            let _ = self.logger.error(&format!("Stopping camera failed: {}", err));
        }

        let _ = self.logger.info("Session ended");
        Ok(final_state)
    }
}
