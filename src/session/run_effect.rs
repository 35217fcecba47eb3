use crate::config::TrainingConfig;
use crate::device_display::interface::DeviceDisplay;
use crate::gesture_model::main::GestureModel;
use crate::gesture_model::play_loop::PlayLoop;
use crate::label::Label;
use crate::library::logger::interface::Logger;
use crate::session::command::Command;
use crate::session::core::{Effect, Event};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type CommandInput = Arc<Mutex<Box<dyn BufRead + Send>>>;

const PLAY_LOOP_POLL: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct RunEffect {
    logger: Arc<dyn Logger + Send + Sync>,
    gesture_model: GestureModel,
    input: CommandInput,
    play_slot: Arc<Mutex<PlaySlot>>,
    teach_sender: Sender<TeachTicket>,
}

/// Dataset work issued by the session. Tickets are numbered in command order
/// and applied by a single worker in that order, whichever effect thread
/// delivers them first.
struct TeachTicket {
    ticket: u64,
    job: TeachJob,
    event_sender: Sender<Event>,
}

enum TeachJob {
    AddExample(Label),
    Train(TrainingConfig),
}

struct TeachWorker {
    logger: Arc<dyn Logger + Send + Sync>,
    gesture_model: GestureModel,
    device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
}

/// Play loops are keyed by the run id the session assigned when play was
/// requested. Start and stop effects race on separate threads, so a stop that
/// arrives before its start cancels that start instead.
#[derive(Default)]
struct PlaySlot {
    latest_started: u64,
    running: Option<(u64, PlayLoop)>,
    cancelled: Vec<u64>,
}

impl RunEffect {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        gesture_model: GestureModel,
        device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
        input: CommandInput,
    ) -> Self {
        let logger = logger.with_namespace("run_effect");
        let (teach_sender, teach_receiver) = mpsc::channel();

        let worker = TeachWorker {
            logger: logger.clone(),
            gesture_model: gesture_model.clone(),
            device_display,
        };
        std::thread::spawn(move || worker.run(teach_receiver));

        Self {
            logger,
            gesture_model,
            input,
            play_slot: Arc::new(Mutex::new(PlaySlot::default())),
            teach_sender,
        }
    }

    pub fn run_effect(&self, effect: Effect, event_sender: Sender<Event>) {
        let _ = self.logger.info(&format!("Running effect: {}", effect.name()));

        match effect {
            Effect::SubscribeToCommands => self.read_commands(&event_sender),
            Effect::SubscribeToExampleCounts => {
                let example_counts = self.gesture_model.example_count_channel().subscribe();
                while let Some(counts) = example_counts.recv() {
                    if event_sender.send(Event::ExampleCountsChanged(counts)).is_err() {
                        break;
                    }
                }
            }
            Effect::SubscribeToTrainingStatus => {
                let training_status = self.gesture_model.training_status().subscribe();
                while let Some(status) = training_status.recv() {
                    if event_sender.send(Event::TrainingStatus(status)).is_err() {
                        break;
                    }
                }
            }
            Effect::SetupCamera => {
                let result = self.gesture_model.setup_camera();
                let _ = event_sender.send(Event::CameraSetupDone(result));
            }
            Effect::WarmUp => self.gesture_model.warm_up(),
            Effect::AddExample { ticket, label } => {
                self.submit(ticket, TeachJob::AddExample(label), event_sender)
            }
            Effect::Train { ticket, config } => {
                self.submit(ticket, TeachJob::Train(config), event_sender)
            }
            Effect::StartPlayLoop(run) => self.start_play_loop(run, event_sender),
            Effect::StopPlayLoop(run) => {
                if let Some(result) = self.take_play_loop(run).map(PlayLoop::stop) {
                    let _ = event_sender.send(Event::PlayLoopStopped(result));
                }
            }
        }
    }

    /// Stops a running play loop, if any.
    pub fn shutdown(&self) {
        let running = self.lock_play_slot().running.take();
        if let Some(Err(err)) = running.map(|(_, play_loop)| play_loop.stop()) {
            let _ = self.logger.error(&format!("Play loop ended with error: {}", err));
        }
    }

    fn read_commands(&self, event_sender: &Sender<Event>) {
        loop {
            let mut line = String::new();
            let read = {
                let mut input = self.input.lock().unwrap_or_else(|e| e.into_inner());
                input.read_line(&mut line)
            };

            let event = match read {
                Ok(0) | Err(_) => {
                    let _ = event_sender.send(Event::InputClosed);
                    return;
                }
                Ok(_) if line.trim().is_empty() => continue,
                Ok(_) => match Command::parse(&line) {
                    Ok(command) => Event::Command(command),
                    Err(err) => Event::CommandRejected(err),
                },
            };

            if event_sender.send(event).is_err() {
                return;
            }
        }
    }

    fn submit(&self, ticket: u64, job: TeachJob, event_sender: Sender<Event>) {
        let ticket = TeachTicket {
            ticket,
            job,
            event_sender,
        };
        if self.teach_sender.send(ticket).is_err() {
            let _ = self.logger.error("Teach worker is gone");
        }
    }

    // Reports a loop that ends on its own. Once the slot no longer holds this
    // run, reporting is left to StopPlayLoop.
    fn start_play_loop(&self, run: u64, event_sender: Sender<Event>) {
        {
            let mut slot = self.lock_play_slot();
            if let Some(position) = slot.cancelled.iter().position(|id| *id == run) {
                slot.cancelled.remove(position);
                return;
            }
            slot.latest_started = run;

            let prediction_sender = event_sender.clone();
            let started = PlayLoop::start(self.gesture_model.clone(), move |value| {
                let _ = prediction_sender.send(Event::Predicted(value.to_string()));
            });

            match started {
                Ok(play_loop) => slot.running = Some((run, play_loop)),
                Err(err) => {
                    let _ = event_sender.send(Event::PlayLoopStopped(Err(err)));
                    return;
                }
            }
        }

        loop {
            std::thread::sleep(PLAY_LOOP_POLL);

            let finished = {
                let mut slot = self.lock_play_slot();
                if !matches!(&slot.running, Some((id, _)) if *id == run) {
                    return;
                }
                let still_running = slot
                    .running
                    .as_ref()
                    .map_or(false, |(_, play_loop)| play_loop.is_running());
                if still_running {
                    None
                } else {
                    slot.running.take()
                }
            };

            if let Some((_, play_loop)) = finished {
                let _ = event_sender.send(Event::PlayLoopStopped(play_loop.stop()));
                return;
            }
        }
    }

    fn take_play_loop(&self, run: u64) -> Option<PlayLoop> {
        let mut slot = self.lock_play_slot();
        match slot.running.take() {
            Some((id, play_loop)) if id == run => Some(play_loop),
            other => {
                slot.running = other;
                if run > slot.latest_started {
                    slot.cancelled.push(run);
                }
                None
            }
        }
    }

    fn lock_play_slot(&self) -> std::sync::MutexGuard<'_, PlaySlot> {
        self.play_slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TeachWorker {
    fn run(&self, tickets: Receiver<TeachTicket>) {
        let mut next = 1;
        let mut waiting = BTreeMap::new();

        for ticket in tickets {
            waiting.insert(ticket.ticket, ticket);
            while let Some(ticket) = waiting.remove(&next) {
                self.apply(ticket);
                next += 1;
            }
        }
    }

    fn apply(&self, ticket: TeachTicket) {
        let event = match ticket.job {
            TeachJob::AddExample(label) => Event::ExampleAdded(
                self.gesture_model
                    .add_example(label.index())
                    .map(|frame| self.draw_frame(label, &frame))
                    .map(|_| label),
            ),
            TeachJob::Train(config) => Event::TrainDone(self.gesture_model.train(&config)),
        };
        let _ = ticket.event_sender.send(event);
    }

    fn draw_frame(&self, label: Label, frame: &image::DynamicImage) {
        let mut device_display = self.device_display.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = device_display.draw_frame(label, frame) {
            let _ = self.logger.error(&format!("Drawing {} failed: {}", label, err));
        }
    }
}
