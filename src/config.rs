use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::WidgetConfig;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful beauty advisor. Provide personalized skincare advice and product recommendations.";

/// How catalog matches combine with the model's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecommendationStrategy {
    /// Always ask the model and attach any matching products.
    #[default]
    Alongside,
    /// Answer with matching products directly and skip the model.
    Replace,
}

#[derive(Debug, Error)]
#[error("unknown recommendation strategy '{0}' (expected 'alongside' or 'replace')")]
pub struct UnknownStrategy(String);

impl FromStr for RecommendationStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alongside" => Ok(Self::Alongside),
            "replace" => Ok(Self::Replace),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub http_referer: Option<String>,
    pub strategy: RecommendationStrategy,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub chat: ChatSettings,
    pub max_upload_files: usize,
    pub max_upload_bytes: usize,
    /// Parent of the per-request upload directories.
    pub upload_dir: PathBuf,
    pub widget: WidgetConfig,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or_else(|| {
                info!("{key} not set, using default");
                default.to_string()
            })
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = optional("OPENROUTER_API_KEY");
        if api_key.is_none() {
            warn!("OPENROUTER_API_KEY not set, chat requests will fail");
        }

        // An empty CHAT_SYSTEM_PROMPT disables the system turn entirely.
        let system_prompt = match lookup("CHAT_SYSTEM_PROMPT") {
            Some(prompt) if prompt.trim().is_empty() => None,
            Some(prompt) => Some(prompt),
            None => Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        };

        Self {
            port: try_load(&lookup, "PORT", 8000),
            chat: ChatSettings {
                api_key,
                api_url: text("OPENROUTER_API_URL", DEFAULT_API_URL),
                model: text("CHAT_MODEL", DEFAULT_MODEL),
                system_prompt,
                http_referer: optional("CHAT_HTTP_REFERER"),
                strategy: try_load(&lookup, "RECOMMENDATION_STRATEGY", RecommendationStrategy::default()),
            },
            max_upload_files: try_load(&lookup, "MAX_UPLOAD_FILES", 5),
            max_upload_bytes: try_load(&lookup, "MAX_UPLOAD_BYTES", 25 * 1024 * 1024),
            upload_dir: optional("UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(env::temp_dir),
            widget: WidgetConfig {
                api_url: text("WIDGET_API_URL", "/api/chat"),
                primary_color: text("WIDGET_PRIMARY_COLOR", "#FF69B4"),
                position: text("WIDGET_POSITION", "bottom-right"),
                welcome_message: text(
                    "WIDGET_WELCOME_MESSAGE",
                    "Hi! I'm your beauty advisor. Ask me about skincare, or upload a photo for a skin analysis.",
                ),
                widget_title: text("WIDGET_TITLE", "Beauty Advisor"),
                company_logo: optional("WIDGET_COMPANY_LOGO"),
            },
        }
    }
}

fn try_load<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}, using default");
            default
        }),
        None => {
            info!("{key} not set, using default");
            default
        }
    }
}
