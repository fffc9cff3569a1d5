//! JSON configuration file. Every section is optional and defaulted.

use std::path::Path;

use anyhow::Context;
use postcraft_ai::{GeminiConfig, OrchestratorConfig};
use postcraft_engine::{EngineConfig, TokenTable};
use postcraft_news::NewsClientConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostcraftConfig {
    pub orchestrator: OrchestratorConfig,
    pub gemini: GeminiConfig,
    pub engine: EngineConfig,
    /// News lookup stays off unless client credentials are present.
    pub news: Option<NewsClientConfig>,
    pub auth: TokenTable,
}

impl PostcraftConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// News config with usable credentials, if any.
    pub fn news_client(&self) -> Option<&NewsClientConfig> {
        self.news
            .as_ref()
            .filter(|n| !n.client_id.trim().is_empty() && !n.client_secret.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = PostcraftConfig::load(None).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.orchestrator.candidates.len(), 4);
        assert!(config.news_client().is_none());
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "engine": {{ "maxAttempts": 2 }},
                "orchestrator": {{ "backoffMs": 0 }},
                "news": {{ "clientId": "id", "clientSecret": "secret" }},
                "auth": {{ "tokens": {{ "t1": "u1" }} }}
            }}"#
        )
        .unwrap();

        let config = PostcraftConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.engine.max_attempts, 2);
        assert_eq!(config.engine.request_deadline_secs, 300);
        assert_eq!(config.orchestrator.backoff_ms, 0);
        assert_eq!(config.orchestrator.call_timeout_secs, 90);
        assert_eq!(config.gemini.max_output_tokens, 8192);
        assert_eq!(config.auth.tokens.get("t1").map(String::as_str), Some("u1"));
        assert!(config.news_client().is_some());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = PostcraftConfig::load(Some(Path::new("/nonexistent/postcraft.json"))).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }
}
