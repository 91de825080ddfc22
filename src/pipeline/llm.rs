//! Vision-model interaction: send the page image with the extraction prompt
//! and turn the answer into records.
//!
//! The model is reached through the [`VisionModel`] trait, which answers with
//! a chat-completions style [`ResponseEnvelope`]: either
//! `{"error": {"message": …}}` or `{"choices": [{"message": {"content": …}}]}`.
//! [`ProviderVisionModel`] adapts any `edgequake_llm` provider to it; tests
//! script envelopes directly.
//!
//! There is no retry here. A failed call is one [`PageError::Generation`] and
//! the pipeline moves on to the next page.

use crate::error::PageError;
use crate::output::PageResult;
use crate::pipeline::parse::parse_content;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Response envelope of a text/image-to-text generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    /// The call failed; only `error.message` is read.
    Failure { error: ErrorBody },
    /// The call succeeded; only the first choice's content is read.
    Completion {
        choices: Vec<Choice>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

/// Token accounting, when the provider reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl ResponseEnvelope {
    /// A successful envelope with a single choice.
    pub fn completion(content: impl Into<String>) -> Self {
        ResponseEnvelope::Completion {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: content.into(),
                },
            }],
            usage: None,
        }
    }

    /// An error envelope.
    pub fn failure(message: impl Into<String>) -> Self {
        ResponseEnvelope::Failure {
            error: ErrorBody {
                message: message.into(),
            },
        }
    }

    /// Content of the first choice, or the error message.
    ///
    /// A completion without any choice counts as an error.
    pub fn content(&self) -> Result<&str, &str> {
        match self {
            ResponseEnvelope::Failure { error } => Err(&error.message),
            ResponseEnvelope::Completion { choices, .. } => choices
                .first()
                .map(|c| c.message.content.as_str())
                .ok_or("response contained no choices"),
        }
    }

    pub fn usage(&self) -> Usage {
        match self {
            ResponseEnvelope::Completion {
                usage: Some(usage), ..
            } => *usage,
            _ => Usage::default(),
        }
    }
}

/// A text/image-to-text generation collaborator.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send `prompt` with `images` (possibly none) as one user turn.
    ///
    /// Failures are reported inside the envelope, never as a panic.
    async fn complete(&self, prompt: &str, images: Vec<ImageData>) -> ResponseEnvelope;
}

/// [`VisionModel`] backed by an `edgequake_llm` provider.
#[derive(Clone)]
pub struct ProviderVisionModel {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderVisionModel {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl VisionModel for ProviderVisionModel {
    async fn complete(&self, prompt: &str, images: Vec<ImageData>) -> ResponseEnvelope {
        let messages = if images.is_empty() {
            vec![ChatMessage::user(prompt)]
        } else {
            vec![ChatMessage::user_with_images(prompt, images)]
        };

        match self.provider.chat(&messages, Some(&self.options())).await {
            Ok(response) => ResponseEnvelope::Completion {
                choices: vec![Choice {
                    message: ChoiceMessage {
                        content: response.content,
                    },
                }],
                usage: Some(Usage {
                    prompt_tokens: response.prompt_tokens,
                    completion_tokens: response.completion_tokens,
                }),
            },
            Err(e) => ResponseEnvelope::failure(e.to_string()),
        }
    }
}

/// Turn one page image into records.
///
/// Always returns a `PageResult`: a generation error, an unparsable response
/// or an invalid object leave `records` empty and set `error`, so one bad page
/// never aborts a multi-page run.
pub async fn summarize_page(
    model: &dyn VisionModel,
    page_num: usize,
    image: ImageData,
    prompt: &str,
) -> PageResult {
    let start = Instant::now();
    let envelope = model.complete(prompt, vec![image]).await;
    let usage = envelope.usage();

    let outcome = match envelope.content() {
        Ok(content) => parse_content(page_num, content),
        Err(message) => Err(PageError::Generation {
            page: page_num,
            message: message.to_string(),
        }),
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(records) => {
            debug!(
                "Page {}: {} records, {} input tokens, {} output tokens, {}ms",
                page_num,
                records.len(),
                usage.prompt_tokens,
                usage.completion_tokens,
                duration_ms
            );
            PageResult {
                page_num,
                records,
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                duration_ms,
                error: None,
            }
        }
        Err(error) => {
            warn!("{}", error);
            PageResult {
                page_num,
                records: Vec::new(),
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                duration_ms,
                error: Some(error),
            }
        }
    }
}
