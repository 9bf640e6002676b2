//! Runtime configuration: prompt templates and the CORS origin allow-list.
//!
//! Everything has a usable default. A TOML file pointed to by
//! `QUIZ_CONFIG_PATH` may override the prompts; `ALLOWED_ORIGINS` (comma
//! separated) overrides the origin allow-list.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
    #[serde(default)]
    pub prompts: Prompts,
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

/// Prompt templates used by the generation client. The user template supports
/// `{count}`, `{type}`, `{level}`, `{content}` and `{custom}` placeholders.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
    pub generation_system: String,
    pub generation_user_template: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            generation_system:
                "You are an AI that generates quiz questions based on the given content. \
                 Respond ONLY with strict JSON."
                    .into(),
            generation_user_template: "\
Generate exactly {count} {type} questions at {level} difficulty level from the following content:\n\
\n\
{content}\n\
\n\
{custom}\n\
Return your response as a valid JSON array containing exactly {count} objects.\n\
\n\
Each object must have the following keys:\n\
- \"question\": string (the quiz question)\n\
- \"options\": string[] (exactly 4 distinct options)\n\
- \"answer\": string (must match one of the options)\n\
\n\
Strictly return only the JSON array. Do not include explanations, comments, markdown, \
or any additional text. Ensure all strings are properly quoted."
                .into(),
        }
    }
}

/// Origins the original deployment served; overridable via config or env.
fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:5174".into(),
        "https://pdf2quiz-chi.vercel.app".into(),
    ]
}

/// Load config: TOML file (if `QUIZ_CONFIG_PATH` is set and parseable), then
/// the `ALLOWED_ORIGINS` env override on top. Any file error falls back to
/// defaults rather than aborting startup.
pub fn load_from_env() -> QuizConfig {
    let mut cfg = match std::env::var("QUIZ_CONFIG_PATH") {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(s) => match toml::from_str::<QuizConfig>(&s) {
                Ok(cfg) => {
                    info!(target: "text2quiz_backend", %path, "Loaded quiz config (TOML)");
                    cfg
                }
                Err(e) => {
                    error!(target: "text2quiz_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
                    QuizConfig::default()
                }
            },
            Err(e) => {
                error!(target: "text2quiz_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
                QuizConfig::default()
            }
        },
        Err(_) => QuizConfig::default(),
    };

    if cfg.allowed_origins.is_empty() {
        cfg.allowed_origins = default_origins();
    }
    if let Ok(raw) = std::env::var("ALLOWED_ORIGINS") {
        let origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !origins.is_empty() {
            cfg.allowed_origins = origins;
        }
    }
    cfg
}
