use serde::{Deserialize, Serialize};

/// Fields shared by every Web API response.
pub trait ApiEnvelope {
    fn ok(&self) -> bool;
    fn error(&self) -> Option<&str>;
}

macro_rules! api_envelope {
    ($($name:ident),+ $(,)?) => {
        $(impl ApiEnvelope for $name {
            fn ok(&self) -> bool {
                self.ok
            }

            fn error(&self) -> Option<&str> {
                self.error.as_deref()
            }
        })+
    };
}

api_envelope!(PostMessageResponse, RepliesResponse, UsersListResponse, UserInfoResponse);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostMessageRequest {
    pub channel: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RepliesResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub messages: Vec<ThreadMessage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UsersListResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub members: Vec<SlackUser>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserInfoResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub user: Option<SlackUser>,
}

/// Where a posted message landed. `ts` doubles as the thread id for replies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

/// One message of a thread. Only the parent carries `reply_users`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub ts: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub reply_users: Vec<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
}

#[cfg(test)]
mod tests {
    use super::{RepliesResponse, UsersListResponse};

    #[test]
    fn replies_parent_exposes_reply_users() {
        let body = r#"{
            "ok": true,
            "messages": [
                {"ts": "1.0", "user": "U1", "text": "Who wants coffee?", "thread_ts": "1.0",
                 "reply_count": 2, "reply_users": ["U2", "U3"]},
                {"ts": "1.1", "user": "U2", "text": "me!", "thread_ts": "1.0"}
            ],
            "has_more": false
        }"#;

        let parsed: RepliesResponse = serde_json::from_str(body).expect("parse replies");
        assert!(parsed.ok);
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.messages[0].reply_users, vec!["U2", "U3"]);
        assert!(parsed.messages[1].reply_users.is_empty());
    }

    #[test]
    fn error_envelope_parses_without_payload() {
        let parsed: UsersListResponse =
            serde_json::from_str(r#"{"ok": false, "error": "invalid_auth"}"#).expect("parse");
        assert!(!parsed.ok);
        assert_eq!(parsed.error.as_deref(), Some("invalid_auth"));
        assert!(parsed.members.is_empty());
    }
}
