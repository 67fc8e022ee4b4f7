use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use coffeebot_core::domain::user::UserId;
use coffeebot_db::repositories::{
    InMemoryDrinkPreferenceRepository, InMemoryOrderRepository, InMemoryShopPreferenceRepository,
    InMemoryTestUserRepository,
};
use coffeebot_db::{connect_with_settings, migrations, DbPool};
use coffeebot_slack::{PostedMessage, SlackError, SlackGateway, SlackUser, ThreadMessage};

use crate::service::Repositories;

pub fn in_memory_repositories() -> Repositories {
    Repositories {
        drinks: Arc::new(InMemoryDrinkPreferenceRepository::default()),
        shops: Arc::new(InMemoryShopPreferenceRepository::default()),
        orders: Arc::new(InMemoryOrderRepository::default()),
        test_users: Arc::new(InMemoryTestUserRepository::default()),
    }
}

pub async fn migrated_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
    migrations::run_pending(&pool).await.expect("migrations should apply");
    pool
}

/// Slack stand-in that records posts and serves canned replies and users.
#[derive(Default)]
pub struct RecordingSlack {
    pub posts: Mutex<Vec<(String, String, Option<String>)>>,
    pub replies: Mutex<Vec<ThreadMessage>>,
    pub users: Mutex<Vec<SlackUser>>,
    pub fail_posts: Mutex<bool>,
}

#[async_trait]
impl SlackGateway for RecordingSlack {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage, SlackError> {
        if *self.fail_posts.lock().expect("lock") {
            return Err(SlackError::Api {
                method: "chat.postMessage".to_owned(),
                error: "channel_not_found".to_owned(),
            });
        }

        let mut posts = self.posts.lock().expect("lock");
        posts.push((channel.to_owned(), text.to_owned(), thread_ts.map(str::to_owned)));
        Ok(PostedMessage {
            channel: channel.to_owned(),
            ts: format!("1578673200.{:06}", posts.len()),
        })
    }

    async fn conversation_replies(
        &self,
        _channel: &str,
        _ts: &str,
    ) -> Result<Vec<ThreadMessage>, SlackError> {
        Ok(self.replies.lock().expect("lock").clone())
    }

    async fn list_users(&self) -> Result<Vec<SlackUser>, SlackError> {
        Ok(self.users.lock().expect("lock").clone())
    }

    async fn user_info(&self, user_id: &UserId) -> Result<SlackUser, SlackError> {
        self.users
            .lock()
            .expect("lock")
            .iter()
            .find(|user| user.id == user_id.as_str())
            .cloned()
            .ok_or_else(|| SlackError::Api {
                method: "users.info".to_owned(),
                error: "user_not_found".to_owned(),
            })
    }
}
