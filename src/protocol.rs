//! Public request/response DTOs for the HTTP API (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::Question;
use crate::session::QuizSession;

#[derive(Serialize)]
pub struct UploadOut {
    pub text: String,
}

/// `/api/generate` response: the generated questions plus the id of the
/// session that was created for them.
#[derive(Serialize)]
pub struct GenerateOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub index: usize,
    pub answer: String,
}

#[derive(Serialize)]
pub struct SubmitOut {
    pub score: u32,
    pub total: usize,
    #[serde(rename = "autoSubmitted")]
    pub auto_submitted: bool,
}

/// Full session view, mirroring the fields the quiz screen renders.
#[derive(Serialize)]
pub struct SessionOut {
    pub id: String,
    pub questions: Vec<Question>,
    #[serde(rename = "userAnswers")]
    pub user_answers: Vec<Option<String>>,
    #[serde(rename = "timerDurationSeconds")]
    pub timer_duration_seconds: u32,
    #[serde(rename = "timeRemainingSeconds")]
    pub time_remaining_seconds: u32,
    pub submitted: bool,
    #[serde(rename = "autoSubmitted")]
    pub auto_submitted: bool,
    pub score: Option<u32>,
}

impl SessionOut {
    pub fn from_session(s: &QuizSession) -> Self {
        Self {
            id: s.id.clone(),
            questions: s.questions().to_vec(),
            user_answers: s.user_answers().to_vec(),
            timer_duration_seconds: s.timer_duration_secs(),
            time_remaining_seconds: s.time_remaining_secs(),
            submitted: s.is_submitted(),
            auto_submitted: s.auto_submitted(),
            score: s.score(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Display name used in the PDF heading; defaults to "quiz".
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
