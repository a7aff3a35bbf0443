use crate::error::{FrameNotesError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

/// Everything the generative client needs, resolved once at startup.
#[derive(Clone)]
pub struct GeneratorConfig {
    pub provider_name: &'static str,
    pub api_url: String,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("provider_name", &self.provider_name)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.0-flash",
                env_var: "GOOGLE_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4o-mini",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
        }
    }

    /// Read the API key from the process environment.
    pub fn load_config(&self, model: Option<String>) -> Result<GeneratorConfig> {
        self.load_config_with(model, |var| std::env::var(var).ok())
    }

    pub fn load_config_with(
        &self,
        model: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<GeneratorConfig> {
        let config = self.config();
        let api_key = lookup(config.env_var)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| FrameNotesError::ConfigurationMissing {
                env_var: config.env_var.to_string(),
            })?;

        Ok(GeneratorConfig {
            provider_name: self.name(),
            api_url: config.api_url.to_string(),
            model: model.unwrap_or_else(|| config.model.to_string()),
            api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = Provider::Gemini
            .load_config_with(None, |_| None)
            .unwrap_err();
        match err {
            FrameNotesError::ConfigurationMissing { env_var } => {
                assert_eq!(env_var, "GOOGLE_API_KEY")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let result = Provider::Openai.load_config_with(None, |_| Some("  ".to_string()));
        assert!(matches!(
            result,
            Err(FrameNotesError::ConfigurationMissing { .. })
        ));
    }

    #[test]
    fn model_override_and_redacted_debug() {
        let config = Provider::Grok
            .load_config_with(Some("grok-3".into()), |var| {
                (var == "XAI_API_KEY").then(|| "secret".to_string())
            })
            .unwrap();

        assert_eq!(config.model, "grok-3");
        assert_eq!(config.api_url, "https://api.x.ai/v1/chat/completions");
        assert!(!format!("{config:?}").contains("secret"));
    }
}
