//! Domain models: questions, generation parameters, and their shape rules.

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Number of options every generated question must carry.
/// The generation prompt demands exactly four, true/false included.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Difficulty requested from the generation provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Uppercase label used inside the generation prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

/// What kind of quiz is being generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    Mcq,
    TrueFalse,
}

impl QuestionKind {
    pub fn prompt_label(&self) -> &'static str {
        match self {
            QuestionKind::Mcq => "MCQ",
            QuestionKind::TrueFalse => "TRUE-FALSE",
        }
    }
}

/// A single generated question. Produced once by the generation client,
/// read-only afterwards (the session never mutates it).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl Question {
    /// Shape rules every question must satisfy before it reaches a session:
    /// exactly four distinct options and an answer equal to one of them.
    pub fn check_shape(&self) -> Result<(), GenerationError> {
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(GenerationError::BadShape(format!(
                "expected {} options, got {}",
                OPTIONS_PER_QUESTION,
                self.options.len()
            )));
        }
        for (i, opt) in self.options.iter().enumerate() {
            if self.options[..i].contains(opt) {
                return Err(GenerationError::BadShape(format!(
                    "duplicate option '{}'",
                    opt
                )));
            }
        }
        if !self.options.contains(&self.answer) {
            return Err(GenerationError::BadShape(format!(
                "answer '{}' is not one of the options",
                self.answer
            )));
        }
        Ok(())
    }
}

/// Parameters the client sends to `/api/generate`. Sent to the provider once;
/// only `timer` outlives the call (it seeds the session countdown).
#[derive(Clone, Debug, Deserialize)]
pub struct GenerationRequest {
    pub content: String,
    pub count: u32,
    pub level: Difficulty,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub custom: String,
    /// Quiz duration in minutes; 0 means untimed.
    #[serde(default)]
    pub timer: u32,
}
