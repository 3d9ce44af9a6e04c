use secrecy::SecretString;
use serde::Deserialize;

pub const DEMO_CLAIM_URL: &str = "https://submission.covid-alert-demo.cdssandbox.xyz/new-key-claim";
pub const STAGING_CLAIM_URL: &str = "https://submission.wild-samphire.cdssandbox.xyz/new-key-claim";

pub const USAGE_TEXT: &str = "Please enter either *demo* or *staging*";

/// Slash command payload as Slack posts it (form encoded).
#[derive(Debug, Deserialize, Clone)]
pub struct SlashCommand {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub team_domain: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    pub command: String,
    pub text: String,
    #[serde(default)]
    pub response_url: String,
    #[serde(default)]
    pub trigger_id: String,
    #[serde(default)]
    pub api_app_id: String,
}

/// Environments a key can be claimed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Demo,
    Staging,
}

impl Environment {
    const ALL: [Environment; 2] = [Environment::Demo, Environment::Staging];

    /// Pick the environment named anywhere in `text`, ignoring case. Demo is
    /// checked first, so `"demolition staging"` resolves to `Demo`.
    pub fn from_command_text(text: &str) -> Option<Self> {
        let text = text.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|env| text.contains(env.keyword()))
    }

    fn keyword(self) -> &'static str {
        match self {
            Environment::Demo => "demo",
            Environment::Staging => "staging",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Environment::Demo => "Demo",
            Environment::Staging => "Staging",
        }
    }

    pub fn claim_url(self) -> &'static str {
        match self {
            Environment::Demo => DEMO_CLAIM_URL,
            Environment::Staging => STAGING_CLAIM_URL,
        }
    }
}

/// Everything needed to claim a key from one environment.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentTarget<'a> {
    pub environment: Environment,
    pub claim_url: &'a str,
    pub bearer: &'a SecretString,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
