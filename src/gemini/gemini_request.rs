use crate::gemini::{GeminiContent, GeminiGenerationConfig, GeminiPart};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

impl GeminiRequest {
    /// A single user turn made of `parts`.
    pub fn from_parts(parts: Vec<GeminiPart>) -> Self {
        Self {
            contents: vec![GeminiContent::user(parts)],
            system_instruction: None,
            generation_config: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(GeminiContent {
            role: None,
            parts: vec![GeminiPart::text(instruction)],
        });
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.generation_config
            .get_or_insert_with(GeminiGenerationConfig::default)
            .temperature = Some(temperature);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GeminiInlineData;
    use serde_json::json;

    #[test]
    fn test_serializes_parts_in_wire_shape() {
        let request = GeminiRequest::from_parts(vec![
            GeminiPart::text("describe this"),
            GeminiPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: "image/png".to_string(),
                    data: "iVBORw0K".to_string(),
                },
            },
        ]);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "describe this" },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw0K" } }
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_serializes_system_instruction_and_temperature() {
        let request = GeminiRequest {
            contents: vec![],
            system_instruction: None,
            generation_config: None,
        }
        .with_system_instruction("be brief")
        .with_temperature(0.9);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"], json!([]));
        assert_eq!(value["systemInstruction"], json!({ "parts": [{ "text": "be brief" }] }));
        assert_eq!(value["generationConfig"], json!({ "temperature": 0.9 }));
    }
}
