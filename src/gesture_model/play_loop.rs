use crate::error::GestureError;
use crate::gesture_model::main::GestureModel;
use std::sync::mpsc::{self, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

/// Background worker that classifies one frame per camera tick until stopped.
///
/// A prediction or camera failure ends the loop; the error is returned by
/// [`PlayLoop::stop`]. Dropping the handle stops the loop as well.
pub struct PlayLoop {
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<Result<(), GestureError>>>,
}

impl PlayLoop {
    /// `on_prediction` receives the display value of every prediction, which
    /// is empty for the neutral gesture.
    pub fn start<F>(model: GestureModel, on_prediction: F) -> Result<Self, GestureError>
    where
        F: Fn(&str) + Send + 'static,
    {
        if !model.is_trained() {
            return Err(GestureError::shape("cannot play before a classifier is trained"));
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let _ = model.logger.info("Play loop started");
            loop {
                match shutdown_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                let label = model.predict()?;
                on_prediction(label.display_value());

                model.wait_for_frame()?;
            }
            let _ = model.logger.info("Play loop stopped");
            Ok(())
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Signals the worker and waits for the current cycle to finish.
    pub fn stop(mut self) -> Result<(), GestureError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), GestureError> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| GestureError::Device("play loop panicked".to_string()))?,
            None => Ok(()),
        }
    }
}

impl Drop for PlayLoop {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
