use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    catalog::Catalog,
    config::{ChatSettings, RecommendationStrategy},
    models::{ChatMessage, ChatResponse, Role},
};

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 500;

const GREETINGS: [&str; 5] = ["hi", "hello", "hey", "start", "help"];
const GREETING_SYSTEM_PROMPT: &str = "You are a helpful beauty advisor. When a user starts the conversation, ask about their skincare needs and preferences. Do not recommend products yet.";
const PRODUCT_INTRO: &str = "Here are some products that might help with your skin concerns:";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("missing API credentials")]
    MissingCredentials,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("upstream status={status} body={body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Anything that can turn a conversation into the assistant's next reply.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

/// OpenAI-compatible chat-completions client (OpenRouter by default).
pub struct OpenRouterClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    http_referer: Option<String>,
}

impl OpenRouterClient {
    pub fn new(settings: &ChatSettings) -> Self {
        Self {
            client: Client::new(),
            api_key: settings.api_key.clone(),
            api_url: settings.api_url.clone(),
            model: settings.model.clone(),
            http_referer: settings.http_referer.clone(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatCompletion for OpenRouterClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingCredentials)?;

        let body = CompletionRequest { model: &self.model, messages, temperature: TEMPERATURE, max_tokens: MAX_TOKENS };
        info!(model = %self.model, messages = messages.len(), "Calling chat completion API");

        let mut request = self.client.post(&self.api_url).bearer_auth(api_key).json(&body);
        if let Some(referer) = &self.http_referer {
            request = request.header("HTTP-Referer", referer);
        }

        let response = request.send().await.map_err(|e| ChatError::Http(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ChatError::Http(e.to_string()))?;

        if !status.is_success() {
            error!("Chat API error response {}: {}", status, text);
            return Err(ChatError::Status { status: status.as_u16(), body: text });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| ChatError::Malformed(format!("parse error: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ChatError::Malformed("no message content in first choice".into()))
    }
}

pub fn is_greeting(message: &str) -> bool {
    GREETINGS.contains(&message.trim().to_lowercase().as_str())
}

/// Upstream turn list: system prompt, prior history, then the new user turn.
/// A bare greeting drops the history and asks the model to open with questions.
pub fn build_messages(message: &str, history: Vec<ChatMessage>, system_prompt: Option<&str>) -> Vec<ChatMessage> {
    if is_greeting(message) {
        return vec![ChatMessage::new(Role::System, GREETING_SYSTEM_PROMPT), ChatMessage::new(Role::User, message)];
    }

    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(prompt) = system_prompt {
        messages.push(ChatMessage::new(Role::System, prompt));
    }
    messages.extend(history);
    messages.push(ChatMessage::new(Role::User, message));
    messages
}

pub async fn forward_chat(
    client: &dyn ChatCompletion,
    catalog: &Catalog,
    settings: &ChatSettings,
    message: &str,
    history: Vec<ChatMessage>,
) -> Result<ChatResponse, ChatError> {
    let recommendations = catalog.filter_products(message);

    if settings.strategy == RecommendationStrategy::Replace && !recommendations.is_empty() {
        info!(count = recommendations.len(), "Answering from catalog without calling the model");
        return Ok(ChatResponse { reply: PRODUCT_INTRO.to_string(), recommendations });
    }

    let messages = build_messages(message, history, settings.system_prompt.as_deref());
    let reply = client.complete(&messages).await?;
    info!(reply_chars = reply.len(), recommendations = recommendations.len(), "Chat reply received");

    Ok(ChatResponse { reply, recommendations })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records what it was sent and answers with a fixed reply or error.
    pub(crate) struct StubCompletion {
        pub reply: Result<String, String>,
        pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl StubCompletion {
        pub fn replying(reply: &str) -> Self {
            Self { reply: Ok(reply.to_string()), seen: Mutex::new(Vec::new()) }
        }

        pub fn failing(reason: &str) -> Self {
            Self { reply: Err(reason.to_string()), seen: Mutex::new(Vec::new()) }
        }

        pub fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatCompletion for StubCompletion {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.reply.clone().map_err(ChatError::Http)
        }
    }

    fn settings(strategy: RecommendationStrategy) -> ChatSettings {
        ChatSettings {
            api_key: Some("sk-test".into()),
            api_url: "http://localhost:0/unused".into(),
            model: "test-model".into(),
            system_prompt: Some("Be helpful.".into()),
            http_referer: None,
            strategy,
        }
    }

    #[test]
    fn appends_message_after_history() {
        let history = vec![ChatMessage::new(Role::User, "my skin is dry"), ChatMessage::new(Role::Assistant, "noted")];
        let messages = build_messages("what moisturizer?", history, Some("Be helpful."));
        assert_eq!(
            messages,
            vec![
                ChatMessage::new(Role::System, "Be helpful."),
                ChatMessage::new(Role::User, "my skin is dry"),
                ChatMessage::new(Role::Assistant, "noted"),
                ChatMessage::new(Role::User, "what moisturizer?"),
            ]
        );
    }

    #[test]
    fn no_system_prompt_when_disabled() {
        let messages = build_messages("tell me about retinol", Vec::new(), None);
        assert_eq!(messages, vec![ChatMessage::new(Role::User, "tell me about retinol")]);
    }

    #[test]
    fn greeting_skips_history() {
        assert!(is_greeting("  Hello "));
        assert!(!is_greeting("hello, I have acne"));
        let messages = build_messages("hey", vec![ChatMessage::new(Role::User, "old")], Some("Be helpful."));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, GREETING_SYSTEM_PROMPT);
        assert_eq!(messages[1], ChatMessage::new(Role::User, "hey"));
    }

    #[test]
    fn request_body_uses_fixed_generation_params() {
        let messages = vec![ChatMessage::new(Role::User, "hi")];
        let body = CompletionRequest { model: "m", messages: &messages, temperature: TEMPERATURE, max_tokens: MAX_TOKENS };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["max_tokens"], 500);
        assert_eq!(value["messages"][0]["role"], "user");
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn alongside_calls_model_and_attaches_products() {
        let stub = StubCompletion::replying("Try a salicylic acid cleanser.");
        let out = forward_chat(&stub, &Catalog::default(), &settings(RecommendationStrategy::Alongside), "acne help", Vec::new())
            .await
            .unwrap();
        assert_eq!(out.reply, "Try a salicylic acid cleanser.");
        assert_eq!(out.recommendations.len(), 3);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn replace_skips_model_when_products_match() {
        let stub = StubCompletion::replying("unused");
        let out = forward_chat(&stub, &Catalog::default(), &settings(RecommendationStrategy::Replace), "Face wash?", Vec::new())
            .await
            .unwrap();
        assert_eq!(out.reply, PRODUCT_INTRO);
        assert_eq!(out.recommendations.len(), 3);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn replace_falls_through_without_matches() {
        let stub = StubCompletion::replying("Drink water.");
        let out = forward_chat(&stub, &Catalog::default(), &settings(RecommendationStrategy::Replace), "dry lips", Vec::new())
            .await
            .unwrap();
        assert_eq!(out.reply, "Drink water.");
        assert!(out.recommendations.is_empty());
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn upstream_errors_propagate() {
        let stub = StubCompletion::failing("connection refused");
        let err = forward_chat(&stub, &Catalog::default(), &settings(RecommendationStrategy::Alongside), "hello", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Http(_)));
    }

    fn upstream_client(server: &MockServer, referer: Option<&str>) -> OpenRouterClient {
        OpenRouterClient::new(&ChatSettings {
            api_key: Some("sk-test".into()),
            api_url: format!("{}/chat/completions", server.uri()),
            model: "mistralai/mistral-7b-instruct".into(),
            http_referer: referer.map(str::to_string),
            ..settings(RecommendationStrategy::Alongside)
        })
    }

    #[tokio::test]
    async fn client_sends_bearer_referer_and_generation_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("HTTP-Referer", "https://shop.example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Use SPF daily."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = upstream_client(&server, Some("https://shop.example.com"));
        let messages = vec![ChatMessage::new(Role::System, "Be helpful."), ChatMessage::new(Role::User, "sunscreen?")];
        let reply = client.complete(&messages).await.unwrap();
        assert_eq!(reply, "Use SPF daily.");

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = received[0].body_json().unwrap();
        assert_eq!(body["model"], "mistralai/mistral-7b-instruct");
        assert_eq!(body["max_tokens"], 500);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(
            body["messages"],
            json!([
                {"role": "system", "content": "Be helpful."},
                {"role": "user", "content": "sunscreen?"}
            ])
        );
    }

    #[tokio::test]
    async fn client_omits_referer_when_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let client = upstream_client(&server, None);
        client.complete(&[ChatMessage::new(Role::User, "hi")]).await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert!(!received[0].headers.contains_key("http-referer"));
    }

    #[tokio::test]
    async fn client_maps_non_2xx_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = upstream_client(&server, None);
        let err = client.complete(&[ChatMessage::new(Role::User, "hi")]).await.unwrap_err();
        match err {
            ChatError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_rejects_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = upstream_client(&server, None);
        let err = client.complete(&[ChatMessage::new(Role::User, "hi")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Malformed(_)));
    }

    #[tokio::test]
    async fn client_rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let client = upstream_client(&server, None);
        let err = client.complete(&[ChatMessage::new(Role::User, "hi")]).await.unwrap_err();
        assert!(matches!(err, ChatError::Malformed(_)));
    }

    #[tokio::test]
    async fn missing_key_fails_at_request_time() {
        let client = OpenRouterClient::new(&ChatSettings { api_key: None, ..settings(RecommendationStrategy::Alongside) });
        let err = client.complete(&[ChatMessage::new(Role::User, "hi")]).await.unwrap_err();
        assert!(matches!(err, ChatError::MissingCredentials));
    }
}
