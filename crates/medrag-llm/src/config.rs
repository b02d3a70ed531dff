//! Backend configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

use medrag_core::{Error, GenerationConfig, Result};

/// Default backend priority order
pub const DEFAULT_BACKEND_ORDER: &str = "groq,openrouter,openai,ollama";

/// Supported answer backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Groq,
    OpenRouter,
    OpenAi,
    Ollama,
}

impl BackendKind {
    /// Label used in answers and status reports
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::Groq => "groq",
            BackendKind::OpenRouter => "openrouter",
            BackendKind::OpenAi => "openai",
            BackendKind::Ollama => "ollama",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<BackendKind> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Some(BackendKind::Groq),
            "openrouter" | "open-router" => Some(BackendKind::OpenRouter),
            "openai" | "open-ai" => Some(BackendKind::OpenAi),
            "ollama" | "local" => Some(BackendKind::Ollama),
            _ => None,
        }
    }

    /// Environment variable holding the API key, if the backend needs one
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            BackendKind::Groq => Some("GROQ_API_KEY"),
            BackendKind::OpenRouter => Some("OPENROUTER_API_KEY"),
            BackendKind::OpenAi => Some("OPENAI_API_KEY"),
            BackendKind::Ollama => None,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Endpoint, credentials and model for one backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSpec {
    pub kind: BackendKind,
    pub base_url: String,
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub model: String,
    /// Extra request headers (OpenRouter attribution)
    pub headers: Vec<(String, String)>,
}

/// Ordered backend configuration, loaded once at process start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub backends: Vec<BackendSpec>,
    pub generation: GenerationConfig,
}

impl BackendConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// Hosted backends without an API key are left out of the list.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let order = var("MEDRAG_BACKENDS").unwrap_or_else(|| DEFAULT_BACKEND_ORDER.to_string());
        let mut kinds = Vec::new();
        for name in order.split(',').filter(|n| !n.trim().is_empty()) {
            let kind = BackendKind::parse(name).ok_or_else(|| {
                Error::Configuration(format!("unknown backend '{}' in MEDRAG_BACKENDS", name.trim()))
            })?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }

        let mut backends = Vec::new();
        for kind in kinds {
            let api_key = match kind.api_key_var() {
                Some(key_var) => match var(key_var) {
                    Some(key) => Some(key),
                    None => {
                        warn!(backend = kind.label(), "{} not set, backend disabled", key_var);
                        continue;
                    }
                },
                None => None,
            };

            let spec = match kind {
                BackendKind::Groq => BackendSpec {
                    kind,
                    base_url: var("GROQ_BASE_URL")
                        .unwrap_or_else(|| "https://api.groq.com/openai/v1".to_string()),
                    api_key,
                    model: var("GROQ_MODEL")
                        .unwrap_or_else(|| "llama-3.3-70b-versatile".to_string()),
                    headers: Vec::new(),
                },
                BackendKind::OpenRouter => BackendSpec {
                    kind,
                    base_url: var("OPENROUTER_BASE_URL")
                        .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string()),
                    api_key,
                    model: var("OPENROUTER_MODEL")
                        .unwrap_or_else(|| "meta-llama/llama-3.1-70b-instruct".to_string()),
                    headers: vec![
                        (
                            "HTTP-Referer".to_string(),
                            var("APP_PUBLIC_URL").unwrap_or_else(|| "http://localhost".to_string()),
                        ),
                        (
                            "X-Title".to_string(),
                            var("APP_TITLE").unwrap_or_else(|| "MedGPT".to_string()),
                        ),
                    ],
                },
                BackendKind::OpenAi => BackendSpec {
                    kind,
                    base_url: var("OPENAI_BASE_URL")
                        .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                    api_key,
                    model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
                    headers: Vec::new(),
                },
                BackendKind::Ollama => BackendSpec {
                    kind,
                    base_url: var("OLLAMA_URL")
                        .unwrap_or_else(|| "http://localhost:11434".to_string()),
                    api_key,
                    model: var("OLLAMA_CHAT_MODEL").unwrap_or_else(|| "llama3.1".to_string()),
                    headers: Vec::new(),
                },
            };
            backends.push(spec);
        }

        let mut generation = GenerationConfig::default();
        if let Some(secs) = var("LLM_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Configuration(format!("LLM_TIMEOUT_SECS must be a number, got '{}'", secs))
            })?;
            generation.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            backends,
            generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_hosted_backends_need_keys() {
        let config = BackendConfig::from_lookup(lookup(&[])).unwrap();
        let kinds: Vec<_> = config.backends.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BackendKind::Ollama]);
    }

    #[test]
    fn test_default_order_with_keys() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk"),
            ("OPENROUTER_API_KEY", "or"),
            ("OPENAI_API_KEY", "sk"),
        ]))
        .unwrap();
        let kinds: Vec<_> = config.backends.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BackendKind::Groq,
                BackendKind::OpenRouter,
                BackendKind::OpenAi,
                BackendKind::Ollama
            ]
        );
    }

    #[test]
    fn test_custom_order_and_dedup() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("MEDRAG_BACKENDS", "ollama, groq,ollama"),
            ("GROQ_API_KEY", "gsk"),
        ]))
        .unwrap();
        let kinds: Vec<_> = config.backends.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BackendKind::Ollama, BackendKind::Groq]);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = BackendConfig::from_lookup(lookup(&[("MEDRAG_BACKENDS", "groq,bard")]))
            .unwrap_err();
        assert!(err.to_string().contains("bard"));
    }

    #[test]
    fn test_openrouter_headers() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("MEDRAG_BACKENDS", "openrouter"),
            ("OPENROUTER_API_KEY", "or"),
            ("APP_TITLE", "Ward Assistant"),
        ]))
        .unwrap();
        let spec = &config.backends[0];
        assert_eq!(spec.api_key.as_deref(), Some("or"));
        assert!(spec.headers.contains(&("X-Title".to_string(), "Ward Assistant".to_string())));
        assert!(spec.headers.contains(&("HTTP-Referer".to_string(), "http://localhost".to_string())));
    }

    #[test]
    fn test_timeout_override() {
        let config = BackendConfig::from_lookup(lookup(&[("LLM_TIMEOUT_SECS", "5")])).unwrap();
        assert_eq!(config.generation.timeout, Duration::from_secs(5));

        assert!(BackendConfig::from_lookup(lookup(&[("LLM_TIMEOUT_SECS", "soon")])).is_err());
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(BackendKind::parse("OpenRouter"), Some(BackendKind::OpenRouter));
        assert_eq!(BackendKind::parse("local"), Some(BackendKind::Ollama));
        assert_eq!(BackendKind::parse("gemini"), None);
    }
}
