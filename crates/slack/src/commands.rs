use serde::{Deserialize, Serialize};

use coffeebot_core::domain::user::UserId;

/// Form body Slack posts when a user runs a slash command.
///
/// Only the fields coffeebot reads are kept; Slack sends more.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommandPayload {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub response_url: Option<String>,
}

impl SlashCommandPayload {
    pub fn caller(&self) -> UserId {
        UserId::new(self.user_id.trim())
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    pub fn channel(&self) -> Option<&str> {
        Some(self.channel_id.trim()).filter(|channel| !channel.is_empty())
    }
}
