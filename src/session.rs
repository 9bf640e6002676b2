//! Quiz session state machine.
//!
//! A session moves `Active -> Submitted` exactly once per attempt; the only
//! way back is `retake()`, which builds a replacement session rather than
//! mutating the submitted one. Submission is a single guarded transition:
//! both the ticker task and a manual submit call funnel through `submit()`,
//! and whichever arrives second observes `submitted` and becomes a no-op.
//! That guard, not locking, is what resolves the timer/submit race.

use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::domain::Question;
use crate::error::SessionError;

/// Handle to the recurring ticker task of a timed session. Owned exclusively
/// by the session and cancelled on any transition out of `Active`.
#[derive(Debug)]
pub struct TimerHandle(AbortHandle);

impl TimerHandle {
    pub fn new(inner: AbortHandle) -> Self {
        Self(inner)
    }

    pub fn cancel(&self) {
        self.0.abort();
    }
}

/// Result of one timer tick.
#[derive(Debug, PartialEq, Eq)]
pub enum Tick {
    /// Countdown still running; carries the remaining seconds.
    Running(u32),
    /// The countdown just hit zero and the session auto-submitted.
    Expired,
    /// Nothing to do: untimed session, or already submitted.
    Idle,
}

/// Result of a submit call.
#[derive(Debug, PartialEq, Eq)]
pub enum Submit {
    /// The transition happened now; carries the computed score.
    Scored(u32),
    /// The session was already submitted; no side effect.
    AlreadySubmitted,
}

/// One in-progress-or-completed attempt at a generated quiz.
pub struct QuizSession {
    pub id: String,
    questions: Vec<Question>,
    user_answers: Vec<Option<String>>,
    timer_duration_secs: u32,
    time_remaining_secs: u32,
    submitted: bool,
    auto_submitted: bool,
    score: Option<u32>,
    timer: Option<TimerHandle>,
}

impl QuizSession {
    /// Fresh `Active` session. `timer_minutes == 0` means untimed.
    pub fn new(id: String, questions: Vec<Question>, timer_minutes: u32) -> Self {
        let duration = timer_minutes.saturating_mul(60);
        let answers = vec![None; questions.len()];
        Self {
            id,
            questions,
            user_answers: answers,
            timer_duration_secs: duration,
            time_remaining_secs: duration,
            submitted: false,
            auto_submitted: false,
            score: None,
            timer: None,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn user_answers(&self) -> &[Option<String>] {
        &self.user_answers
    }

    pub fn timer_duration_secs(&self) -> u32 {
        self.timer_duration_secs
    }

    pub fn time_remaining_secs(&self) -> u32 {
        self.time_remaining_secs
    }

    pub fn is_timed(&self) -> bool {
        self.timer_duration_secs > 0
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn auto_submitted(&self) -> bool {
        self.auto_submitted
    }

    /// Score of the current attempt; `None` while `Active`.
    pub fn score(&self) -> Option<u32> {
        self.score
    }

    /// Attach the ticker task handle. Replaces (and cancels) any previous one.
    pub fn attach_timer(&mut self, handle: TimerHandle) {
        if let Some(old) = self.timer.take() {
            old.cancel();
        }
        self.timer = Some(handle);
    }

    /// Record an answer. Rejected once submitted so a late click can never
    /// overwrite the scored answer set.
    pub fn select_answer(&mut self, index: usize, answer: String) -> Result<(), SessionError> {
        if self.submitted {
            return Err(SessionError::AlreadySubmitted);
        }
        let len = self.questions.len();
        let Some(slot) = self.user_answers.get_mut(index) else {
            return Err(SessionError::IndexOutOfRange { index, len });
        };
        if !self.questions[index].options.contains(&answer) {
            return Err(SessionError::NotAnOption(answer));
        }
        *slot = Some(answer);
        Ok(())
    }

    /// One second of countdown. Invoked by the ticker task while `Active` on
    /// a timed session; hitting zero forces `submit(auto=true)` exactly once.
    pub fn tick(&mut self) -> Tick {
        if self.submitted || self.timer_duration_secs == 0 {
            return Tick::Idle;
        }
        self.time_remaining_secs = self.time_remaining_secs.saturating_sub(1);
        if self.time_remaining_secs == 0 {
            self.submit(true);
            Tick::Expired
        } else {
            Tick::Running(self.time_remaining_secs)
        }
    }

    /// The single `Active -> Submitted` transition. Idempotent: the guard on
    /// `submitted` runs before any scoring side effect, so a second caller
    /// (timer or user, whichever lost the race) changes nothing.
    pub fn submit(&mut self, auto: bool) -> Submit {
        if self.submitted {
            debug!(target: "quiz", id = %self.id, "submit ignored: already submitted");
            return Submit::AlreadySubmitted;
        }
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        let score = self.compute_score();
        self.score = Some(score);
        self.submitted = true;
        self.auto_submitted = auto;
        info!(target: "quiz", id = %self.id, score, total = self.questions.len(), auto, "quiz submitted");
        Submit::Scored(score)
    }

    /// Exact, case-sensitive string equality per question; no partial credit.
    fn compute_score(&self) -> u32 {
        self.questions
            .iter()
            .zip(self.user_answers.iter())
            .filter(|(q, a)| a.as_deref() == Some(q.answer.as_str()))
            .count() as u32
    }

    /// Replacement session for a fresh attempt: same questions and duration,
    /// answers cleared, flags and countdown reset. Only valid once submitted.
    pub fn retake(&self) -> Result<QuizSession, SessionError> {
        if !self.submitted {
            return Err(SessionError::NotSubmitted);
        }
        info!(target: "quiz", id = %self.id, "retake: starting fresh attempt");
        Ok(QuizSession::new(
            self.id.clone(),
            self.questions.clone(),
            self.timer_duration_secs / 60,
        ))
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<Question> {
        vec![
            Question {
                question: "2+2?".into(),
                options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
                answer: "4".into(),
            },
            Question {
                question: "Capital of France?".into(),
                options: vec!["Paris".into(), "Lyon".into(), "Nice".into(), "Lille".into()],
                answer: "Paris".into(),
            },
        ]
    }

    #[test]
    fn answers_length_matches_questions() {
        let s = QuizSession::new("s1".into(), questions(), 0);
        assert_eq!(s.user_answers().len(), s.questions().len());
        assert!(s.user_answers().iter().all(|a| a.is_none()));
    }

    #[test]
    fn scoring_counts_exact_matches_only() {
        let mut s = QuizSession::new("s1".into(), questions(), 0);
        s.select_answer(0, "4".into()).unwrap();
        s.select_answer(1, "Lyon".into()).unwrap();
        assert_eq!(s.submit(false), Submit::Scored(1));

        let mut s = QuizSession::new("s2".into(), questions(), 0);
        s.select_answer(0, "3".into()).unwrap();
        assert_eq!(s.submit(false), Submit::Scored(0));
    }

    #[test]
    fn submit_is_idempotent() {
        let mut s = QuizSession::new("s1".into(), questions(), 0);
        s.select_answer(0, "4".into()).unwrap();
        assert_eq!(s.submit(false), Submit::Scored(1));
        assert_eq!(s.submit(true), Submit::AlreadySubmitted);
        // The losing call must not flip auto_submitted or touch the score.
        assert!(!s.auto_submitted());
        assert_eq!(s.score(), Some(1));
        assert!(s.is_submitted());
    }

    #[test]
    fn answers_are_frozen_after_submit() {
        let mut s = QuizSession::new("s1".into(), questions(), 0);
        s.select_answer(0, "4".into()).unwrap();
        s.submit(false);
        assert_eq!(
            s.select_answer(0, "3".into()),
            Err(SessionError::AlreadySubmitted)
        );
        assert_eq!(s.user_answers()[0].as_deref(), Some("4"));
    }

    #[test]
    fn select_rejects_bad_index_and_unknown_option() {
        let mut s = QuizSession::new("s1".into(), questions(), 0);
        assert_eq!(
            s.select_answer(7, "4".into()),
            Err(SessionError::IndexOutOfRange { index: 7, len: 2 })
        );
        assert_eq!(
            s.select_answer(0, "42".into()),
            Err(SessionError::NotAnOption("42".into()))
        );
    }

    #[test]
    fn selecting_twice_replaces_the_answer() {
        let mut s = QuizSession::new("s1".into(), questions(), 0);
        s.select_answer(0, "3".into()).unwrap();
        s.select_answer(0, "4".into()).unwrap();
        assert_eq!(s.user_answers()[0].as_deref(), Some("4"));
    }

    #[test]
    fn countdown_reaches_zero_and_auto_submits_once() {
        let mut s = QuizSession::new("s1".into(), questions(), 1);
        s.select_answer(0, "4".into()).unwrap();
        for expected in (1..60).rev() {
            assert_eq!(s.tick(), Tick::Running(expected));
        }
        assert_eq!(s.tick(), Tick::Expired);
        assert!(s.is_submitted());
        assert!(s.auto_submitted());
        assert_eq!(s.score(), Some(1));
        assert_eq!(s.time_remaining_secs(), 0);
        // Further ticks are idle and time never goes negative.
        assert_eq!(s.tick(), Tick::Idle);
        assert_eq!(s.time_remaining_secs(), 0);
    }

    #[test]
    fn untimed_session_never_auto_submits() {
        let mut s = QuizSession::new("s1".into(), questions(), 0);
        for _ in 0..10_000 {
            assert_eq!(s.tick(), Tick::Idle);
        }
        assert!(!s.is_submitted());
    }

    #[test]
    fn manual_submit_wins_race_and_timer_becomes_noop() {
        let mut s = QuizSession::new("s1".into(), questions(), 1);
        // Drive the countdown to the brink of expiry.
        for _ in 0..58 {
            s.tick();
        }
        assert_eq!(s.submit(false), Submit::Scored(0));
        assert!(!s.auto_submitted());
        // The timer callback fires after losing the race: pure no-op.
        assert_eq!(s.tick(), Tick::Idle);
        assert!(!s.auto_submitted());
    }

    #[test]
    fn timer_expiry_wins_race_and_manual_submit_becomes_noop() {
        let mut s = QuizSession::new("s1".into(), questions(), 1);
        for _ in 0..59 {
            s.tick();
        }
        assert_eq!(s.tick(), Tick::Expired);
        assert_eq!(s.submit(false), Submit::AlreadySubmitted);
        assert!(s.auto_submitted());
    }

    #[test]
    fn retake_resets_everything_but_questions_and_duration() {
        let mut s = QuizSession::new("s1".into(), questions(), 2);
        s.select_answer(0, "4".into()).unwrap();
        for _ in 0..30 {
            s.tick();
        }
        s.submit(false);

        let fresh = s.retake().unwrap();
        assert_eq!(fresh.id, "s1");
        assert_eq!(fresh.questions().len(), 2);
        assert!(fresh.user_answers().iter().all(|a| a.is_none()));
        assert!(!fresh.is_submitted());
        assert!(!fresh.auto_submitted());
        assert_eq!(fresh.score(), None);
        assert_eq!(fresh.time_remaining_secs(), fresh.timer_duration_secs());
        assert_eq!(fresh.timer_duration_secs(), 120);
    }

    #[test]
    fn retake_requires_submitted_state() {
        let s = QuizSession::new("s1".into(), questions(), 0);
        assert!(matches!(s.retake(), Err(SessionError::NotSubmitted)));
    }
}
