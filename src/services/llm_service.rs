use crate::api::middleware::AppError;
use crate::config::LlmConfig;
use reqwest::Client as HttpClient;
use serde_json::json;
use url::Url;

pub const MISSING_API_KEY_MESSAGE: &str =
    "GROQ_API_KEY environment variable is not set. Please set it in your .env file.";

/// Anything that can turn a prompt into completion text.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Whether credentials for the remote service are present.
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

/// Chat-completion client for Groq (or any OpenAI-compatible endpoint)
pub struct LlmService {
    api_url: Url,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    http_client: HttpClient,
}

impl LlmService {
    pub fn new(config: &LlmConfig) -> Result<Self, AppError> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| AppError::TranslationConfig(format!("Invalid LLM API URL {}: {}", config.api_url, e)))?;

        Ok(Self {
            api_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            http_client: HttpClient::new(),
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }

    /// Text of the first choice, or an error if the response has none.
    fn extract_content(response: &serde_json::Value) -> Result<String, AppError> {
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                AppError::TranslationUpstream("LLM response does not contain a completion choice".to_string())
            })
    }
}

#[async_trait::async_trait]
impl TextGenerator for LlmService {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AppError::TranslationConfig(MISSING_API_KEY_MESSAGE.to_string()))?;

        tracing::debug!("Calling {} with model {}", self.api_url, self.model);

        let response = self
            .http_client
            .post(self.api_url.clone())
            .bearer_auth(api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| AppError::TranslationUpstream(format!("Failed to call LLM service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::TranslationUpstream(format!(
                "LLM service returned error {}: {}",
                status, error_text
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::TranslationUpstream(format!("Failed to parse LLM response: {}", e)))?;

        Self::extract_content(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: api_key.map(str::to_string),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.1,
            max_tokens: 200,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let service = LlmService::new(&llm_config(Some("key"))).unwrap();
        let body = service.request_body("list users");

        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "list users");
        assert_eq!(body["max_tokens"], 200);
    }

    #[test]
    fn test_extract_content_trims() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": "  SELECT id FROM users LIMIT 100\n" } }]
        });
        assert_eq!(
            LlmService::extract_content(&response).unwrap(),
            "SELECT id FROM users LIMIT 100"
        );
    }

    #[test]
    fn test_extract_content_missing_choice() {
        let response = json!({ "choices": [] });
        assert!(matches!(
            LlmService::extract_content(&response),
            Err(AppError::TranslationUpstream(_))
        ));
    }

    #[test]
    fn test_is_configured_follows_api_key() {
        assert!(LlmService::new(&llm_config(Some("key"))).unwrap().is_configured());
        assert!(!LlmService::new(&llm_config(None)).unwrap().is_configured());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = llm_config(Some("key"));
        config.api_url = "not a url".to_string();
        assert!(matches!(LlmService::new(&config), Err(AppError::TranslationConfig(_))));
    }

    #[tokio::test]
    async fn test_generate_without_key_is_config_error() {
        let service = LlmService::new(&llm_config(None)).unwrap();
        assert!(matches!(
            service.generate("anything").await,
            Err(AppError::TranslationConfig(_))
        ));
    }
}
