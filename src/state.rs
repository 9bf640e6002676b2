//! Application state: the in-memory session store, the generation client,
//! and the per-session ticker tasks.
//!
//! Sessions live behind a single `RwLock`ed map keyed by UUID. Each timed
//! session gets one ticker task that calls `tick()` once a second under the
//! write lock; the task exits as soon as a tick reports anything other than
//! a running countdown. Because every session mutation happens under the same
//! lock, the timer/manual-submit race is decided solely by the session's own
//! `submitted` guard.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::QuizConfig;
use crate::domain::Question;
use crate::error::{ApiError, ValidationError};
use crate::generate::QuizModel;
use crate::session::{QuizSession, Submit, Tick, TimerHandle};

pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, QuizSession>>>,
    pub model: Option<QuizModel>,
    pub config: QuizConfig,
}

impl AppState {
    /// Build state from env: load config and init the generation client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = crate::config::load_from_env();
        let model = QuizModel::from_env();
        if let Some(m) = &model {
            info!(target: "text2quiz_backend", base_url = %m.base_url, model = %m.model, "Generation provider enabled.");
        } else {
            warn!(target: "text2quiz_backend", "Generation provider disabled (no OPENAI_API_KEY); /api/generate will fail.");
        }
        Self::with(config, model)
    }

    pub fn with(config: QuizConfig, model: Option<QuizModel>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            model,
            config,
        }
    }

    /// Create a session for freshly generated questions and arm its timer.
    /// Returns the new session id.
    #[instrument(level = "info", skip(self, questions), fields(count = questions.len(), timer_minutes))]
    pub async fn create_session(
        self: &Arc<Self>,
        questions: Vec<Question>,
        timer_minutes: u32,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let session = QuizSession::new(id.clone(), questions, timer_minutes);
        let timed = session.is_timed();
        self.sessions.write().await.insert(id.clone(), session);
        if timed {
            self.arm_timer(&id).await;
        }
        info!(target: "quiz", %id, timed, "Session created");
        id
    }

    /// Spawn the one-second ticker for a timed session and hand its abort
    /// handle to the session, so any transition out of `Active` cancels it.
    async fn arm_timer(self: &Arc<Self>, id: &str) {
        let state = Arc::clone(self);
        let task_id = id.to_string();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut sessions = state.sessions.write().await;
                let Some(session) = sessions.get_mut(&task_id) else {
                    debug!(target: "quiz", id = %task_id, "Ticker: session gone, stopping");
                    break;
                };
                match session.tick() {
                    Tick::Running(_) => {}
                    Tick::Expired => {
                        info!(target: "quiz", id = %task_id, "Ticker: time expired, quiz auto-submitted");
                        break;
                    }
                    Tick::Idle => break,
                }
            }
        });
        let handle = TimerHandle::new(task.abort_handle());
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.attach_timer(handle);
        } else {
            // Session vanished between insert and arm; nothing to tick.
            handle.cancel();
        }
    }

    /// Record an answer on an active session.
    pub async fn select_answer(
        &self,
        id: &str,
        index: usize,
        answer: String,
    ) -> Result<(), ApiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::UnknownSession(id.to_string()))?;
        session.select_answer(index, answer)?;
        Ok(())
    }

    /// Manual submission. Idempotent: a repeat call (or one racing the timer)
    /// reports the already-recorded outcome instead of re-scoring.
    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn submit(&self, id: &str) -> Result<Submit, ApiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::UnknownSession(id.to_string()))?;
        Ok(session.submit(false))
    }

    /// Replace a submitted session with a fresh attempt and re-arm its timer.
    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn retake(self: &Arc<Self>, id: &str) -> Result<(), ApiError> {
        let timed = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(id)
                .ok_or_else(|| ApiError::UnknownSession(id.to_string()))?;
            let fresh = session.retake()?;
            let timed = fresh.is_timed();
            sessions.insert(id.to_string(), fresh);
            timed
        };
        if timed {
            self.arm_timer(id).await;
        }
        Ok(())
    }

    /// Run a closure against a session under the read lock.
    pub async fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&QuizSession) -> T,
    ) -> Result<T, ApiError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(id)
            .ok_or_else(|| ApiError::UnknownSession(id.to_string()))?;
        Ok(f(session))
    }
}

/// Validation gate in front of the generation client (the rules the original
/// form enforced before any network call).
pub fn validate_generation_request(
    req: &crate::domain::GenerationRequest,
) -> Result<(), ValidationError> {
    if req.content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if req.count < 1 {
        return Err(ValidationError::BadCount);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, GenerationRequest, QuestionKind};

    fn questions() -> Vec<Question> {
        vec![Question {
            question: "2+2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            answer: "4".into(),
        }]
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState::with(QuizConfig::default(), None))
    }

    fn request(content: &str, count: u32) -> GenerationRequest {
        GenerationRequest {
            content: content.into(),
            count,
            level: Difficulty::Easy,
            kind: QuestionKind::Mcq,
            custom: String::new(),
            timer: 0,
        }
    }

    #[test]
    fn validation_rejects_empty_content_and_zero_count() {
        assert!(validate_generation_request(&request("", 3)).is_err());
        assert!(validate_generation_request(&request("text", 0)).is_err());
        assert!(validate_generation_request(&request("text", 3)).is_ok());
    }

    #[tokio::test]
    async fn answer_and_submit_flow() {
        let state = state();
        let id = state.create_session(questions(), 0).await;
        state.select_answer(&id, 0, "4".into()).await.unwrap();
        assert_eq!(state.submit(&id).await.unwrap(), Submit::Scored(1));
        assert_eq!(state.submit(&id).await.unwrap(), Submit::AlreadySubmitted);
    }

    #[tokio::test]
    async fn unknown_session_is_reported() {
        let state = state();
        assert!(matches!(
            state.submit("nope").await,
            Err(ApiError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn retake_replaces_the_session() {
        let state = state();
        let id = state.create_session(questions(), 0).await;
        state.select_answer(&id, 0, "4".into()).await.unwrap();
        state.submit(&id).await.unwrap();
        state.retake(&id).await.unwrap();
        let (submitted, answered) = state
            .with_session(&id, |s| {
                (s.is_submitted(), s.user_answers().iter().any(|a| a.is_some()))
            })
            .await
            .unwrap();
        assert!(!submitted);
        assert!(!answered);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_session_auto_submits_when_time_runs_out() {
        let state = state();
        let id = state.create_session(questions(), 1).await;
        tokio::time::sleep(Duration::from_secs(65)).await;
        let (submitted, auto, remaining) = state
            .with_session(&id, |s| {
                (s.is_submitted(), s.auto_submitted(), s.time_remaining_secs())
            })
            .await
            .unwrap();
        assert!(submitted);
        assert!(auto);
        assert_eq!(remaining, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_stops_the_ticker() {
        let state = state();
        let id = state.create_session(questions(), 1).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        state.submit(&id).await.unwrap();
        let frozen = state
            .with_session(&id, |s| s.time_remaining_secs())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        let (still, auto) = state
            .with_session(&id, |s| (s.time_remaining_secs(), s.auto_submitted()))
            .await
            .unwrap();
        assert_eq!(frozen, still);
        assert!(!auto);
    }

    #[tokio::test(start_paused = true)]
    async fn untimed_session_is_left_alone() {
        let state = state();
        let id = state.create_session(questions(), 0).await;
        tokio::time::sleep(Duration::from_secs(3600)).await;
        let submitted = state.with_session(&id, |s| s.is_submitted()).await.unwrap();
        assert!(!submitted);
    }
}
