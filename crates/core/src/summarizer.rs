use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    error::{FrameNotesError, Result},
    format::{format_transcript_plain, format_transcript_with_timestamps},
    provider::GeneratorConfig,
    types::TranscriptSegment,
};

static ACADEMIC_PROMPT: &str = r#"
You are an academic video summarizer. Your job is to:
1. Carefully read the transcript below.
2. Identify and summarize all important concepts in bullet points.
3. For each concept, include the timestamp in [mm:ss] format.
4. Do not miss any key educational content.
5. If a concept is repeated, refer back to the first timestamp.

Here is the transcript with timestamps:
"#;

static BRIEF_PROMPT: &str = "You are a YouTube video summarizer. You will be taking the transcript text \
and summarizing the entire video and providing the important summary in points \
within 250 words. Please provide the summary of the text given here: ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptStyle {
    /// Bulleted concepts, each tagged with a `[mm:ss]` timestamp
    #[default]
    Academic,
    /// Short bulleted summary without timestamps
    Brief,
}

impl PromptStyle {
    pub fn instructions(&self) -> &'static str {
        match self {
            PromptStyle::Academic => ACADEMIC_PROMPT,
            PromptStyle::Brief => BRIEF_PROMPT,
        }
    }
}

/// The generative text service: one prompt in, one response text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    config: GeneratorConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

/// Pull the message text out of a chat completions response body.
pub fn extract_completion_text(response: &serde_json::Value) -> Option<&str> {
    response["choices"][0]["message"]["content"].as_str()
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(
            provider = self.config.provider_name,
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "calling generative service"
        );

        let response = self
            .http
            .post(&self.config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&serde_json::json!({
                "model": self.config.model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
            }))
            .send()
            .await
            .map_err(FrameNotesError::summarization)?;

        let status = response.status();
        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(FrameNotesError::summarization)?;

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            return Err(FrameNotesError::summarization(format!(
                "{} returned {}: {}",
                self.config.provider_name, status, message
            )));
        }

        let content = extract_completion_text(&body).ok_or_else(|| {
            FrameNotesError::summarization(format!("Invalid API response: {:?}", body))
        })?;

        Ok(content.to_string())
    }
}

pub struct Summarizer {
    generator: Box<dyn TextGenerator>,
}

impl Summarizer {
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Instruction prompt followed by the transcript in the style's layout.
    pub fn build_prompt(style: PromptStyle, segments: &[TranscriptSegment]) -> String {
        let body = match style {
            PromptStyle::Academic => format_transcript_with_timestamps(segments),
            PromptStyle::Brief => format_transcript_plain(segments),
        };
        format!("{}{}", style.instructions(), body)
    }

    /// One blocking call; the response is returned verbatim.
    pub async fn summarize(
        &self,
        style: PromptStyle,
        segments: &[TranscriptSegment],
    ) -> Result<String> {
        let prompt = Self::build_prompt(style, segments);
        let summary = self.generator.generate(&prompt).await?;
        info!(
            ?style,
            segments = segments.len(),
            summary_lines = summary.lines().count(),
            "summary generated"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct Echo {
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("- summary [0:00]".to_string())
        }
    }

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, "Intro"),
            TranscriptSegment::new(65.0, "Topic"),
        ]
    }

    #[tokio::test]
    async fn academic_prompt_lists_every_segment_with_timestamp() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let summarizer = Summarizer::new(Box::new(Echo {
            prompts: prompts.clone(),
        }));

        let summary = summarizer
            .summarize(PromptStyle::Academic, &segments())
            .await
            .unwrap();
        assert_eq!(summary, "- summary [0:00]");

        let prompts = prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.starts_with(ACADEMIC_PROMPT));
        let body: Vec<_> = prompt[ACADEMIC_PROMPT.len()..].lines().collect();
        assert_eq!(body, vec!["[0:00] Intro", "[1:05] Topic"]);
    }

    #[test]
    fn brief_prompt_has_no_timestamps() {
        let prompt = Summarizer::build_prompt(PromptStyle::Brief, &segments());
        assert!(prompt.ends_with("given here: Intro Topic"));
        assert!(!prompt.contains("[0:00]"));
    }

    #[test]
    fn completion_text_is_read_from_first_choice() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "- point [0:10]"}}]
        });
        assert_eq!(extract_completion_text(&body), Some("- point [0:10]"));
        assert_eq!(extract_completion_text(&serde_json::json!({"error": {}})), None);
    }
}
