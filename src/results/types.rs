//! Result type definitions

use serde::{Deserialize, Serialize};

/// Owner name carried by synthetic results that no provider produced
pub const SYSTEM_PROVIDER: &str = "system";

/// Action tag asking the router to disable the provider named in `value`
pub const ACTION_DISABLE: &str = "system-disable";

/// Action tag asking the router to enable the provider named in `value`
pub const ACTION_ENABLE: &str = "system-enable";

/// Action tag asking the router to sync providers from the distributor
pub const ACTION_SYNC: &str = "system-sync";

/// A single launcher result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    /// Primary display text
    pub title: String,
    /// Secondary display text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Glyph, absolute file path, or a descriptor the client resolves
    pub icon: String,
    /// Tag interpreted by the owning provider (or the router for system results)
    pub action: String,
    /// Opaque payload interpreted according to `action`
    pub value: String,
    /// Inline-completion hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Registry name of the owning provider, stamped by the dispatcher
    pub provider: String,
}

impl SearchResult {
    /// Create a new result with the fields every result needs
    pub fn new(
        title: impl Into<String>,
        action: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            action: action.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Whether this result belongs to the router rather than a provider
    pub fn is_system(&self) -> bool {
        self.provider == SYSTEM_PROVIDER
    }

    /// Offer to disable `provider`
    pub fn disable_toggle(provider: &str) -> Self {
        Self::new(format!("Disable {}", provider), ACTION_DISABLE, provider)
            .with_description(format!("Stop showing results from '{}'", provider))
            .with_icon("🚫")
            .with_provider(SYSTEM_PROVIDER)
    }

    /// Offer to re-enable `provider`
    pub fn enable_toggle(provider: &str) -> Self {
        Self::new(format!("Enable {}", provider), ACTION_ENABLE, provider)
            .with_description(format!("Show results from '{}' again", provider))
            .with_icon("✅")
            .with_provider(SYSTEM_PROVIDER)
    }

    /// Offer to sync providers from the remote distributor
    pub fn sync_request() -> Self {
        Self::new("Sync plugins", ACTION_SYNC, "")
            .with_description("Download the latest providers and reload them")
            .with_icon("🔄")
            .with_provider(SYSTEM_PROVIDER)
    }
}
