//! Question generation client.
//!
//! One chat.completions call per quiz: the prompt asks for a strict JSON
//! array of question objects, the response is stripped of any markdown fence
//! the model wrapped around it, parsed, and shape-checked. Any failure along
//! that path is a single `GenerationError` — no retry, no partial quiz.
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{GenerationRequest, Question};
use crate::error::GenerationError;
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct QuizModel {
    client: reqwest::Client,
    api_key: String,
    pub base_url: String,
    pub model: String,
}

impl QuizModel {
    /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .ok()?;

        Some(Self { client, api_key, base_url, model })
    }

    /// Generate exactly `request.count` questions or fail.
    #[instrument(
        level = "info",
        skip(self, prompts, request),
        fields(count = request.count, level = ?request.level, kind = ?request.kind, content_len = request.content.len(), model = %self.model)
    )]
    pub async fn generate(
        &self,
        prompts: &Prompts,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, GenerationError> {
        let user = build_user_prompt(prompts, request);

        let start = std::time::Instant::now();
        let raw = self
            .chat_plain(&prompts.generation_system, &user, 0.7)
            .await?;
        let elapsed = start.elapsed();
        info!(?elapsed, response_len = raw.len(), "Model response received");

        let questions = parse_questions(&raw, request.count).map_err(|e| {
            error!(error = %e, raw = %trunc_for_log(&raw, 200), "Rejecting generation response");
            e
        })?;
        info!(returned = questions.len(), "Quiz generated");
        Ok(questions)
    }

    /// Plain-text chat completion against the provider.
    #[instrument(level = "debug", skip(self, system, user))]
    async fn chat_plain(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessageReq { role: "system".into(), content: system.into() },
                ChatMessageReq { role: "user".into(), content: user.into() },
            ],
            temperature,
        };

        let res = self
            .client
            .post(&url)
            .header(USER_AGENT, "text2quiz-backend/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            let msg = extract_provider_error(&body).unwrap_or(body);
            return Err(GenerationError::Provider(format!("HTTP {}: {}", status, msg)));
        }

        let body: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;
        if let Some(usage) = &body.usage {
            info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Provider usage");
        }
        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(text)
    }
}

/// Build the user prompt from the template, uppercasing type/level the way
/// the prompt expects and folding the optional custom instruction in.
fn build_user_prompt(prompts: &Prompts, request: &GenerationRequest) -> String {
    let count = request.count.to_string();
    let custom = if request.custom.trim().is_empty() {
        String::new()
    } else {
        format!("Additional user instruction: {}\n", request.custom.trim())
    };
    fill_template(
        &prompts.generation_user_template,
        &[
            ("count", count.as_str()),
            ("type", request.kind.prompt_label()),
            ("level", request.level.prompt_label()),
            ("content", request.content.as_str()),
            ("custom", custom.as_str()),
        ],
    )
}

/// Strip a markdown code fence (```json ... ``` or ``` ... ```) if the model
/// wrapped its output in one despite instructions.
fn strip_code_fence(raw: &str) -> &str {
    let s = raw.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop the info string ("json") up to the first newline.
    let rest = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the model output into questions and enforce the response contract:
/// exactly `expected` entries, each passing the question shape rules.
fn parse_questions(raw: &str, expected: u32) -> Result<Vec<Question>, GenerationError> {
    let cleaned = strip_code_fence(raw);
    let questions: Vec<Question> = serde_json::from_str(cleaned)
        .map_err(|e| GenerationError::Unparseable(e.to_string()))?;

    if questions.len() != expected as usize {
        return Err(GenerationError::BadShape(format!(
            "requested {} questions, got {}",
            expected,
            questions.len()
        )));
    }
    for q in &questions {
        q.check_shape()?;
    }
    Ok(questions)
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessageReq>,
    temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResp,
}
#[derive(Deserialize)]
struct ChatMessageResp {
    content: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
    #[serde(default)]
    total_tokens: Option<u32>,
}

/// Try to extract a clean error message from a provider error body.
fn extract_provider_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct EWrap {
        error: EObj,
    }
    #[derive(Deserialize)]
    struct EObj {
        message: String,
    }
    serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, QuestionKind};

    const ONE_QUESTION: &str = r#"[{"question":"2+2?","options":["3","4","5","6"],"answer":"4"}]"#;

    fn request(count: u32) -> GenerationRequest {
        GenerationRequest {
            content: "Some chapter text.".into(),
            count,
            level: Difficulty::Hard,
            kind: QuestionKind::Mcq,
            custom: "Focus on chapter 3".into(),
            timer: 0,
        }
    }

    #[test]
    fn fence_stripping_handles_plain_and_fenced_output() {
        assert_eq!(strip_code_fence("[1]"), "[1]");
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  ```json\n[1]\n```  "), "[1]");
    }

    #[test]
    fn parses_a_valid_response() {
        let qs = parse_questions(ONE_QUESTION, 1).unwrap();
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].answer, "4");
    }

    #[test]
    fn parses_a_fenced_response() {
        let fenced = format!("```json\n{}\n```", ONE_QUESTION);
        assert_eq!(parse_questions(&fenced, 1).unwrap().len(), 1);
    }

    #[test]
    fn rejects_wrong_count() {
        assert!(matches!(
            parse_questions(ONE_QUESTION, 3),
            Err(GenerationError::BadShape(_))
        ));
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            parse_questions("Sure! Here are your questions:", 1),
            Err(GenerationError::Unparseable(_))
        ));
    }

    #[test]
    fn rejects_answer_not_among_options() {
        let bad = r#"[{"question":"2+2?","options":["3","4","5","6"],"answer":"7"}]"#;
        assert!(matches!(
            parse_questions(bad, 1),
            Err(GenerationError::BadShape(_))
        ));
    }

    #[test]
    fn user_prompt_carries_all_parameters() {
        let prompts = Prompts::default();
        let p = build_user_prompt(&prompts, &request(5));
        assert!(p.contains("exactly 5 MCQ questions"));
        assert!(p.contains("HARD difficulty"));
        assert!(p.contains("Some chapter text."));
        assert!(p.contains("Additional user instruction: Focus on chapter 3"));
    }

    #[test]
    fn user_prompt_omits_empty_custom_instruction() {
        let prompts = Prompts::default();
        let mut req = request(2);
        req.custom = "  ".into();
        let p = build_user_prompt(&prompts, &req);
        assert!(!p.contains("Additional user instruction"));
    }
}
