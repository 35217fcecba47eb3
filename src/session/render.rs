use crate::device_display::interface::DeviceDisplay;
use crate::label::Label;
use crate::library::logger::interface::Logger;
use crate::session::core::{CameraState, Mode, State};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Render {
    device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl Render {
    pub fn new(
        device_display: Arc<Mutex<dyn DeviceDisplay + Send + Sync>>,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        Self {
            device_display,
            logger: logger.with_namespace("render"),
        }
    }

    pub fn render(&self, state: &State) {
        if let Err(err) = self.write(state) {
            let _ = self.logger.error(&format!("Render failed: {}", err));
        }
    }

    fn write(&self, state: &State) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut device_display = self.device_display.lock().unwrap_or_else(|e| e.into_inner());
        let [first, second] = lines(state, device_display.chars_per_line() as usize);
        device_display.clear()?;
        device_display.write_line(0, &first)?;
        device_display.write_line(1, &second)?;
        Ok(())
    }
}

/// The two display lines for `state` on a screen `width` characters wide.
pub fn lines(state: &State, width: usize) -> [String; 2] {
    if state.quitting {
        return ["Bye".to_string(), String::new()];
    }

    let title = match (state.mode, state.camera) {
        (Mode::Teaching, CameraState::SettingUp) => "Starting camera".to_string(),
        (Mode::Teaching, _) if state.trained => "Teach (trained)".to_string(),
        (Mode::Teaching, _) => "Teaching".to_string(),
        (Mode::Training, _) => "Training...".to_string(),
        (Mode::Playing, _) => "Playing".to_string(),
    };

    let detail = match state.mode {
        Mode::Teaching => counts_line(state),
        Mode::Training => state.training_status.clone().unwrap_or_default(),
        Mode::Playing => state.prediction.clone().unwrap_or_default(),
    };

    match &state.message {
        Some(message) => {
            let mut wrapped = wrap(message, width);
            let first = wrapped.remove(0);
            let second = wrapped.into_iter().next().unwrap_or(detail);
            [first, second]
        }
        None => [title, detail],
    }
}

fn counts_line(state: &State) -> String {
    Label::ALL
        .iter()
        .map(|label| {
            let initial = label.name().chars().next().unwrap_or('?').to_ascii_uppercase();
            let count = state.example_counts.get(label).copied().unwrap_or(0);
            format!("{}{}", initial, count)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// Greedy word wrap into lines of at most `width` characters. Always returns
// at least one line; words longer than a line are cut.
fn wrap(message: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in message.split_whitespace() {
        let word: String = word.chars().take(width).collect();
        if line.is_empty() {
            line = word;
        } else if line.chars().count() + 1 + word.chars().count() <= width {
            line.push(' ');
            line.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut line, word));
        }
    }
    lines.push(line);
    lines
}
