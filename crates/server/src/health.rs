use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use coffeebot_db::DbPool;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "coffeebot-server accepting slash commands".to_string(),
        },
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM \"order\"").fetch_one(pool).await {
        Ok(orders) => {
            HealthCheck { status: "ready", detail: format!("database reachable, {orders} orders") }
        }
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};

    use crate::health::{health, HealthState};
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn ready_when_coffee_tables_answer() {
        let pool = migrated_pool().await;

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool.clone() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.database.detail, "database reachable, 0 orders");
        assert_eq!(payload.service.status, "ready");

        let body = serde_json::to_value(&payload).expect("health payload serializes");
        assert_eq!(body["database"]["status"], "ready");
        assert!(body["checked_at"].is_string());

        pool.close().await;
    }

    #[tokio::test]
    async fn degraded_when_pool_is_closed() {
        let pool = migrated_pool().await;
        pool.close().await;

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
    }

    #[tokio::test]
    async fn degraded_before_migrations_run() {
        let pool = coffeebot_db::connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("pool should connect");

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(payload.database.detail.starts_with("database query failed"));
    }
}
