use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{TranslationBackend, TranslatorConfig};
use crate::credentials::CredentialSlot;
use crate::error::{RecipeError, RecipeResult};

const SYSTEM_INSTRUCTION: &str = "Translate only Korean to English. Keep formatting.";

/// OpenAI chat-completions translation backend.
///
/// The credential is chosen per call by the caller, so a single client
/// serves every key in the pool.
pub struct OpenAITranslator {
    client: Client,
    model: String,
    base_url: String,
}

impl OpenAITranslator {
    pub fn new(config: &TranslatorConfig) -> Self {
        Self {
            client: Client::new(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn prompt(text: &str) -> String {
        format!(
            "Translate ONLY the Korean parts to plain English. \
             Keep all English words, numbers, units unchanged. \
             Output only the translated text.\n\n{}",
            text
        )
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TranslationBackend for OpenAITranslator {
    async fn translate(&self, credential: &CredentialSlot, text: &str) -> RecipeResult<String> {
        let prompt = Self::prompt(text);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: 500,
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(credential.token())
            .json(&request)
            .send()
            .await
            .map_err(|e| RecipeError::Translation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecipeError::Translation(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| RecipeError::Translation(format!("Malformed response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| RecipeError::Translation("No translation returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialPool;
    use mockito::Matcher;

    fn translator(base_url: String) -> OpenAITranslator {
        OpenAITranslator::new(&TranslatorConfig::default().with_base_url(base_url))
    }

    #[tokio::test]
    async fn test_translate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o-mini",
                "temperature": 0.2
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  2 cloves garlic \n"}}]}"#)
            .create_async()
            .await;

        let pool = CredentialPool::from_keys(["sk-test"]).unwrap();
        let result = translator(server.url())
            .translate(&pool.next(), "마늘 2쪽")
            .await
            .unwrap();

        assert_eq!(result, "2 cloves garlic");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let pool = CredentialPool::from_keys(["sk-test"]).unwrap();
        let err = translator(server.url())
            .translate(&pool.next(), "마늘")
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let pool = CredentialPool::from_keys(["sk-test"]).unwrap();
        let result = translator(server.url()).translate(&pool.next(), "마늘").await;

        assert!(matches!(result, Err(RecipeError::Translation(_))));
    }

    #[test]
    fn test_prompt_carries_source_text() {
        let prompt = OpenAITranslator::prompt("간장 1큰술");
        assert!(prompt.starts_with("Translate ONLY the Korean parts"));
        assert!(prompt.ends_with("\n\n간장 1큰술"));
    }
}
