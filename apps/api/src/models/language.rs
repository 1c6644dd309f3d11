use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Interview languages the service can conduct a conversation in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    pub const SUPPORTED: [Language; 2] = [Language::En, Language::ZhTw];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::ZhTw => "zh-TW",
        }
    }

    /// Human-readable name used inside prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::ZhTw => "Traditional Chinese (Taiwan)",
        }
    }

    /// Resolves an optional, possibly invalid language code, falling back to
    /// `fallback` when the code is absent, blank or unsupported.
    pub fn resolve(code: Option<&str>, fallback: Language) -> Language {
        code.and_then(|c| c.parse().ok()).unwrap_or(fallback)
    }

    pub fn supported_list() -> String {
        Self::SUPPORTED
            .iter()
            .map(Language::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language code '{0}'")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "en" => Ok(Language::En),
            "zh-TW" => Ok(Language::ZhTw),
            other => Err(UnsupportedLanguage(other.to_string())),
        }
    }
}
