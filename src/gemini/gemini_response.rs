use serde::{Deserialize, Serialize};

use crate::gemini::{GeminiCandidate, GeminiPart, GeminiPromptFeedback, GeminiUsage};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<GeminiUsage>,
    #[serde(rename = "modelVersion")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(rename = "promptFeedback")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(rename = "responseId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl GeminiResponse {
    /// Concatenated non-thought text of the first candidate.
    ///
    /// `None` when there is no candidate, no content or no text part at all.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let mut found = false;
        let mut text = String::new();
        for part in &content.parts {
            if let GeminiPart::Text { text: t, thought } = part {
                if *thought == Some(true) {
                    continue;
                }
                found = true;
                text.push_str(t);
            }
        }
        found.then_some(text)
    }

    /// Human readable reason for an empty answer, for logs only.
    pub fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
        {
            return format!("prompt blocked: {:?}", reason);
        }
        match self.candidates.first() {
            None => "no candidates".to_string(),
            Some(c) => match &c.finish_reason {
                Some(reason) => format!("no text, finish reason {:?}", reason),
                None => "no text".to_string(),
            },
        }
    }
}
