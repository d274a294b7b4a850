//! OpenAI-backed classification and fact extraction.
//!
//! Both adapters speak strict-JSON prompts at temperature 0 and parse the
//! reply defensively: code fences are stripped, the outermost JSON object is
//! located by brace, and phones coming back from the model are re-run
//! through the same normalization the rule-based path uses. Model output is
//! never trusted as-is.

pub mod classifier;
pub mod extractor;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};

use zakazflow_types::error::ExtractError;

pub use self::classifier::OpenAiClassifier;
pub use self::extractor::OpenAiExtractor;

/// Shared chat-completion plumbing for the classifier and the extractor.
///
/// # API Key Security
///
/// Does NOT derive Debug to prevent accidental exposure of the API key
/// stored inside the `async_openai::Client`.
pub(crate) struct ChatBackend {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ChatBackend {
    pub(crate) fn new(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    /// Run one system+user completion and return the raw reply text.
    pub(crate) async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ExtractError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(
                    system_prompt.to_string(),
                ),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(user_prompt.to_string()),
                name: None,
            }),
        ];

        let request = CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(0.0),
            ..Default::default()
        };

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ExtractError::Malformed("empty completion response".to_string()))
    }
}

/// Map [`OpenAIError`] into [`ExtractError`].
///
/// Quota and rate-limit conditions are distinguished so the circuit breaker
/// can pick the right cooldown.
pub(crate) fn map_openai_error(err: OpenAIError) -> ExtractError {
    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "insufficient_quota"
                || error_type == "insufficient_quota"
                || api_err.message.contains("exceeded your current quota")
            {
                ExtractError::QuotaExhausted
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                ExtractError::RateLimited {
                    retry_after_ms: None,
                }
            } else {
                ExtractError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(429) => ExtractError::RateLimited {
                retry_after_ms: None,
            },
            _ => ExtractError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, _) => ExtractError::Malformed(err.to_string()),
        _ => ExtractError::Provider {
            message: err.to_string(),
        },
    }
}

/// Cut the outermost JSON object out of a model reply.
///
/// Models occasionally wrap the object in a Markdown fence or surround it
/// with prose; everything outside the first `{` .. last `}` span is noise.
pub(crate) fn extract_json_object(reply: &str) -> Result<&str, ExtractError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&reply[start..=end]),
        _ => Err(ExtractError::Malformed(format!(
            "no JSON object in reply: {reply:.120}"
        ))),
    }
}

/// Render the trailing context window as a bulleted block for the prompt.
pub(crate) fn context_block(context: &[String], window: usize) -> String {
    let tail = &context[context.len().saturating_sub(window)..];
    tail.iter()
        .map(|m| format!("- {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_strips_fence() {
        let reply = "```json\n{\"is_order\": true}\n```";
        assert_eq!(extract_json_object(reply).unwrap(), "{\"is_order\": true}");
    }

    #[test]
    fn test_extract_json_object_with_prose() {
        let reply = "Mana natija: {\"role\": \"PRODUCT\"} umid qilamanki foydali.";
        assert_eq!(extract_json_object(reply).unwrap(), "{\"role\": \"PRODUCT\"}");
    }

    #[test]
    fn test_extract_json_object_rejects_braceless() {
        assert!(extract_json_object("no json here").is_err());
    }

    #[test]
    fn test_context_block_keeps_tail() {
        let context: Vec<String> = (1..=7).map(|i| format!("msg {i}")).collect();
        let block = context_block(&context, 5);
        assert!(block.starts_with("- msg 3"));
        assert!(block.ends_with("- msg 7"));
    }

    #[test]
    fn test_context_block_short_context() {
        let context = vec!["only".to_string()];
        assert_eq!(context_block(&context, 5), "- only");
    }
}
