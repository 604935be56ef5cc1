//! Provider identity.

use serde::{Deserialize, Serialize};

/// An interchangeable upstream AI provider.
///
/// The set is closed: routing, circuit breaking, and usage accounting are all
/// keyed by this enum, and configuration referencing an unknown provider is
/// rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Google Gemini API
    Gemini,
    /// OpenRouter aggregation API
    Openrouter,
}

impl ProviderId {
    /// All configured-able providers, in declaration order.
    pub const ALL: [ProviderId; 2] = [ProviderId::Gemini, ProviderId::Openrouter];

    /// Stable lowercase name used in logs, labels, and config files.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::Openrouter => "openrouter",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderId::Gemini),
            "openrouter" => Ok(ProviderId::Openrouter),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}
