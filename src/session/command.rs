use crate::error::GestureError;
use crate::label::Label;

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Record(Label),
    Train,
    Play,
    Stop,
    Quit,
    LearningRate(f32),
    BatchSizeFraction(f32),
    Epochs(usize),
    DenseUnits(usize),
}

pub const USAGE: &str = "commands: record <neutral|paper|rock|scissors>, train, play, stop, \
lr <rate>, batch <fraction>, epochs <n>, units <n>, quit";

impl Command {
    pub fn parse(line: &str) -> Result<Command, GestureError> {
        let mut words = line.split_whitespace();
        let name = words
            .next()
            .ok_or_else(|| GestureError::validation("empty command"))?
            .to_ascii_lowercase();
        let argument = words.next();

        if words.next().is_some() {
            return Err(GestureError::validation(format!("too many arguments to '{}'", name)));
        }

        let command = match (name.as_str(), argument) {
            ("record", Some(label)) => Command::Record(
                Label::from_name(label)
                    .ok_or_else(|| GestureError::validation(format!("unknown gesture '{}'", label)))?,
            ),
            ("train", None) => Command::Train,
            ("play", None) => Command::Play,
            ("stop", None) => Command::Stop,
            ("quit", None) | ("exit", None) => Command::Quit,
            ("lr", Some(value)) => Command::LearningRate(number(&name, value)?),
            ("batch", Some(value)) => Command::BatchSizeFraction(number(&name, value)?),
            ("epochs", Some(value)) => Command::Epochs(number(&name, value)?),
            ("units", Some(value)) => Command::DenseUnits(number(&name, value)?),
            _ => {
                return Err(GestureError::validation(format!(
                    "unrecognized '{}'; {}",
                    line.trim(),
                    USAGE
                )))
            }
        };

        Ok(command)
    }
}

fn number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, GestureError> {
    value
        .parse()
        .map_err(|_| GestureError::validation(format!("'{}' is not a valid value for {}", value, name)))
}
