use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: String,
    pub api_base: String,
    pub max_upload_bytes: usize,
    pub prompts: PromptSettings,
    pub chat: ChatSettings,
}

/// Prompts used when a media upload comes without a `prompt` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub image: Option<String>,
    pub audio: String,
    pub document: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub temperature: f64,
    pub system_instruction: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
            prompts: PromptSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            image: None,
            audio: "tolong buatkan transkrip dari rekaman berikut".to_string(),
            document: "tolong buatkan ringkasan dari dokumen berikut".to_string(),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            system_instruction: "Jawab hanya menggunakan bahasa Indonesia.".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Model id without the `models/` path prefix.
    pub fn model_id(&self) -> &str {
        self.model.strip_prefix("models/").unwrap_or(&self.model)
    }
}
