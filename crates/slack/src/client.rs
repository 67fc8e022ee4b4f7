//! Slack Web API client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use coffeebot_core::config::SlackConfig;
use coffeebot_core::domain::user::UserId;

use crate::types::{
    ApiEnvelope, PostMessageRequest, PostMessageResponse, PostedMessage, RepliesResponse,
    SlackUser, ThreadMessage, UserInfoResponse, UsersListResponse,
};

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("slack request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("could not parse slack response from `{method}`: {error}")]
    Parse { method: String, body: String, error: serde_json::Error },
    #[error("slack api `{method}` returned error `{error}`")]
    Api { method: String, error: String },
    #[error("slack client misconfigured: {0}")]
    Config(String),
}

/// Calls coffeebot makes against Slack.
#[async_trait]
pub trait SlackGateway: Send + Sync {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage, SlackError>;

    /// Parent message first, then replies in thread order.
    async fn conversation_replies(
        &self,
        channel: &str,
        ts: &str,
    ) -> Result<Vec<ThreadMessage>, SlackError>;

    async fn list_users(&self) -> Result<Vec<SlackUser>, SlackError>;

    async fn user_info(&self, user_id: &UserId) -> Result<SlackUser, SlackError>;
}

pub struct SlackClient {
    http: Client,
    bot_token: SecretString,
    api_base_url: String,
}

impl SlackClient {
    pub fn new(
        bot_token: SecretString,
        api_base_url: impl Into<String>,
    ) -> Result<Self, SlackError> {
        if bot_token.expose_secret().trim().is_empty() {
            return Err(SlackError::Config("bot token is empty".to_string()));
        }

        let api_base_url: String = api_base_url.into();
        let api_base_url = api_base_url.trim().trim_end_matches('/').to_string();
        if api_base_url.is_empty() {
            return Err(SlackError::Config("api base url is empty".to_string()));
        }

        Ok(Self { http: Client::new(), bot_token, api_base_url })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, SlackError> {
        Self::new(config.bot_token.clone(), config.api_base_url.clone())
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base_url)
    }

    async fn get<T>(&self, method: &str, query: &[(&str, &str)]) -> Result<T, SlackError>
    where
        T: DeserializeOwned + ApiEnvelope,
    {
        debug!(event_name = "slack.api.request", method, "calling slack api");
        let response = self
            .http
            .get(self.url(method))
            .bearer_auth(self.bot_token.expose_secret())
            .query(query)
            .send()
            .await?;

        decode(method, response).await
    }

    async fn post_json<B, T>(&self, method: &str, body: &B) -> Result<T, SlackError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned + ApiEnvelope,
    {
        debug!(event_name = "slack.api.request", method, "calling slack api");
        let response = self
            .http
            .post(self.url(method))
            .bearer_auth(self.bot_token.expose_secret())
            .json(body)
            .send()
            .await?;

        decode(method, response).await
    }
}

async fn decode<T>(method: &str, response: reqwest::Response) -> Result<T, SlackError>
where
    T: DeserializeOwned + ApiEnvelope,
{
    let status = response.status();
    let body = response.text().await?;

    let parsed: T = serde_json::from_str(&body).map_err(|error| SlackError::Parse {
        method: method.to_string(),
        body: body.clone(),
        error,
    })?;

    if !parsed.ok() {
        let error = parsed.error().unwrap_or("unknown").to_string();
        warn!(
            event_name = "slack.api.error",
            method,
            status = %status,
            error = %error,
            "slack api returned an error"
        );
        return Err(SlackError::Api { method: method.to_string(), error });
    }

    Ok(parsed)
}

#[async_trait]
impl SlackGateway for SlackClient {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage, SlackError> {
        let request = PostMessageRequest {
            channel: channel.to_string(),
            text: text.to_string(),
            thread_ts: thread_ts.map(str::to_string),
        };

        let response: PostMessageResponse = self.post_json("chat.postMessage", &request).await?;
        let ts = response.ts.ok_or_else(|| SlackError::Api {
            method: "chat.postMessage".to_string(),
            error: "response did not include a message ts".to_string(),
        })?;

        Ok(PostedMessage { channel: response.channel.unwrap_or_else(|| channel.to_string()), ts })
    }

    async fn conversation_replies(
        &self,
        channel: &str,
        ts: &str,
    ) -> Result<Vec<ThreadMessage>, SlackError> {
        let response: RepliesResponse =
            self.get("conversations.replies", &[("channel", channel), ("ts", ts)]).await?;
        Ok(response.messages)
    }

    async fn list_users(&self) -> Result<Vec<SlackUser>, SlackError> {
        let response: UsersListResponse = self.get("users.list", &[]).await?;
        Ok(response.members)
    }

    async fn user_info(&self, user_id: &UserId) -> Result<SlackUser, SlackError> {
        let response: UserInfoResponse =
            self.get("users.info", &[("user", user_id.as_str())]).await?;
        response.user.ok_or_else(|| SlackError::Api {
            method: "users.info".to_string(),
            error: "user_not_found".to_string(),
        })
    }
}

/// Users who replied in a thread, in first-reply order without duplicates.
///
/// Prefers the parent's `reply_users`; falls back to reply authors when Slack
/// omits it. Bot messages never count.
pub fn reply_user_ids(messages: &[ThreadMessage]) -> Vec<UserId> {
    let Some((parent, replies)) = messages.split_first() else {
        return Vec::new();
    };

    let candidates: Vec<&str> = if parent.reply_users.is_empty() {
        replies
            .iter()
            .filter(|message| message.bot_id.is_none())
            .filter_map(|message| message.user.as_deref())
            .collect()
    } else {
        parent.reply_users.iter().map(String::as_str).collect()
    };

    let mut seen = Vec::new();
    for candidate in candidates {
        let candidate = UserId::new(candidate);
        if !candidate.as_str().is_empty() && !seen.contains(&candidate) {
            seen.push(candidate);
        }
    }
    seen
}

/// Matches a username against `name`, then `real_name`, ignoring case.
pub fn find_user_id_by_name(users: &[SlackUser], name: &str) -> Option<UserId> {
    let wanted = name.trim().trim_start_matches('@');
    if wanted.is_empty() {
        return None;
    }

    let active = || users.iter().filter(|user| !user.deleted);
    active()
        .find(|user| user.name.eq_ignore_ascii_case(wanted))
        .or_else(|| {
            active().find(|user| {
                user.real_name.as_deref().is_some_and(|real| real.eq_ignore_ascii_case(wanted))
            })
        })
        .map(|user| UserId::new(user.id.clone()))
}
