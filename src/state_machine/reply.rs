//! Outbound reply values

use serde::{Deserialize, Serialize};

/// A quick-reply button: `value` is sent back verbatim when tapped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub title: String,
    pub value: String,
}

/// One outbound bot message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<SuggestedAction>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggested_actions: Vec::new(),
        }
    }

    pub fn with_actions(text: impl Into<String>, suggested_actions: Vec<SuggestedAction>) -> Self {
        Self {
            text: text.into(),
            suggested_actions,
        }
    }
}
