use std::collections::BTreeMap;
use std::fmt;

pub const NUM_CLASSES: usize = 4;

/// Gestures the classifier head can tell apart. The discriminant is the
/// one-hot index and the output unit of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Neutral = 0,
    Paper = 1,
    Rock = 2,
    Scissors = 3,
}

pub type ExampleCounts = BTreeMap<Label, usize>;

impl Label {
    pub const ALL: [Label; NUM_CLASSES] =
        [Label::Neutral, Label::Paper, Label::Rock, Label::Scissors];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Label> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Label::Neutral => "neutral",
            Label::Paper => "paper",
            Label::Rock => "rock",
            Label::Scissors => "scissors",
        }
    }

    pub fn from_name(name: &str) -> Option<Label> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.name().eq_ignore_ascii_case(name))
    }

    /// What the play screen shows. Neutral means "no gesture" and shows nothing.
    pub fn display_value(self) -> &'static str {
        match self {
            Label::Neutral => "",
            Label::Paper => "PAPER",
            Label::Rock => "ROCK",
            Label::Scissors => "SCISSORS",
        }
    }

    pub fn empty_counts() -> ExampleCounts {
        Self::ALL.iter().map(|label| (*label, 0)).collect()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
