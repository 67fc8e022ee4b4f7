//! Slack integration for coffeebot.
//!
//! - **Web API client** (`client`) - `chat.postMessage`, `conversations.replies`,
//!   `users.list` and `users.info` behind the [`SlackGateway`] trait
//! - **Slash commands** (`commands`) - the form payload Slack posts to `/coffee/*`
//! - **Wire types** (`types`) - request and response envelopes
//!
//! The bot needs a Bot User OAuth Token (`xoxb-...`) with the `chat:write`,
//! `channels:history` and `users:read` scopes.

pub mod client;
pub mod commands;
pub mod types;

pub use client::{find_user_id_by_name, reply_user_ids, SlackClient, SlackError, SlackGateway};
pub use commands::SlashCommandPayload;
pub use types::{PostedMessage, SlackUser, ThreadMessage};
