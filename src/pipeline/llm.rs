//! Language-model calls: page transcription and JSON classification.
//!
//! Everything above this module talks to [`ModelClient`], whose methods return
//! `Result<String, ModelError>` and never panic or propagate provider-specific
//! errors. [`ProviderClient`] is the production implementation over
//! `edgequake-llm`; tests substitute their own.
//!
//! ## Timeouts
//!
//! Each call is bounded by `api_timeout_secs`. Without a deadline a single
//! stalled connection would hold a request open forever, since nothing in the
//! pipeline retries or cancels. Expiry surfaces as [`ModelError::Timeout`] and
//! is handled like any other call failure.

use crate::config::PipelineConfig;
use crate::error::ModelError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, OpenAIProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The two model operations the pipeline needs.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Ask a vision-capable model to transcribe one page image.
    async fn transcribe(&self, image: ImageData, instruction: &str) -> Result<String, ModelError>;

    /// Send `prompt` and request a JSON object as the answer.
    async fn complete_json(&self, prompt: &str) -> Result<String, ModelError>;
}

/// [`ModelClient`] backed by `edgequake-llm` providers.
///
/// Holds one provider per role so the OCR and classifier models can differ.
/// Either may be absent when no credential was configured; calls then fail
/// with [`ModelError::NotConfigured`].
pub struct ProviderClient {
    ocr: Option<Arc<dyn LLMProvider>>,
    classifier: Option<Arc<dyn LLMProvider>>,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl ProviderClient {
    /// Build providers from the explicit credential or pre-built provider
    /// in `config`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let (ocr, classifier) = match (&config.provider, config.api_key.as_deref()) {
            (Some(provider), _) => (Some(Arc::clone(provider)), Some(Arc::clone(provider))),
            (None, Some(key)) if !key.is_empty() => (
                Some(openai_provider(key, &config.ocr_model)),
                Some(openai_provider(key, &config.classifier_model)),
            ),
            _ => {
                warn!("No model credential configured; every model call will fail");
                (None, None)
            }
        };

        Self {
            ocr,
            classifier,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        }
    }

    fn options(&self, json: bool) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            response_format: json.then(|| "json_object".to_string()),
            ..Default::default()
        }
    }

    async fn chat(
        &self,
        provider: Option<&Arc<dyn LLMProvider>>,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String, ModelError> {
        let provider = provider.ok_or(ModelError::NotConfigured)?;
        let start = Instant::now();

        let call = provider.chat(&messages, Some(&options));
        match tokio::time::timeout(Duration::from_secs(self.timeout_secs), call).await {
            Err(_) => Err(ModelError::Timeout {
                secs: self.timeout_secs,
            }),
            Ok(Err(e)) => Err(ModelError::Api(e.to_string())),
            Ok(Ok(response)) => {
                debug!(
                    "{} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Ok(response.content)
            }
        }
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    async fn transcribe(&self, image: ImageData, instruction: &str) -> Result<String, ModelError> {
        let messages = vec![ChatMessage::user_with_images(instruction, vec![image])];
        self.chat(self.ocr.as_ref(), messages, self.options(false))
            .await
    }

    async fn complete_json(&self, prompt: &str) -> Result<String, ModelError> {
        let messages = vec![ChatMessage::user(prompt)];
        self.chat(self.classifier.as_ref(), messages, self.options(true))
            .await
    }
}

fn openai_provider(api_key: &str, model: &str) -> Arc<dyn LLMProvider> {
    Arc::new(OpenAIProvider::new(api_key).with_model(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_mode_only_for_classification() {
        let client = ProviderClient::from_config(&PipelineConfig::default());
        assert_eq!(client.options(true).response_format.as_deref(), Some("json_object"));
        assert!(client.options(false).response_format.is_none());
        assert_eq!(client.options(false).max_tokens, Some(4096));
    }

    #[tokio::test]
    async fn missing_credential_fails_every_call() {
        let client = ProviderClient::from_config(&PipelineConfig::default());
        let err = client.complete_json("{}").await.unwrap_err();
        assert_eq!(err, ModelError::NotConfigured);

        let image = ImageData::new("AAAA".to_string(), "image/png");
        let err = client.transcribe(image, "read").await.unwrap_err();
        assert_eq!(err, ModelError::NotConfigured);
    }
}
