use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use tracing::{debug, info};
use uuid::Uuid;

use coffeebot_core::domain::order::OrderId;
use coffeebot_core::domain::user::UserId;
use coffeebot_core::errors::{ApplicationError, DomainError};
use coffeebot_slack::SlashCommandPayload;

use crate::error::RouteError;
use crate::service::CoffeeService;

pub const INDEX_TEXT: &str = "INDEX OF COFFEE API";
const INVALID_INPUT: &str = "INVALID INPUT";

type RouteResult = Result<String, RouteError>;

#[derive(Clone)]
pub struct CoffeeState {
    service: Arc<CoffeeService>,
}

pub fn router(service: Arc<CoffeeService>) -> Router {
    Router::new()
        .route("/coffee", get(index))
        .route("/coffee/", get(index))
        .route("/coffee/preference/save", post(save_preference))
        .route("/coffee/preferences", post(describe_preferences))
        .route("/coffee/preferences/{user_id}", get(preferences_for_user))
        .route("/coffee/shop/save", post(save_shop))
        .route("/coffee/shop/delete", post(delete_shop))
        .route("/coffee/shops", get(list_shops))
        .route("/coffee/order/create", post(create_order))
        .route("/coffee/orders/display", post(display_orders))
        .route("/coffee/order/history", get(order_history))
        .route("/coffee/order/history/{user_id}", get(order_history_for_user))
        .route("/coffee/order/{order_id}", get(order_summary))
        .route("/coffee/order/{order_id}/respond", post(respond_to_order))
        .with_state(CoffeeState { service })
}

/// Logs every inbound request and the status it finished with.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    info!(
        event_name = "http.request.received",
        method = %method,
        path = %path,
        "Received {method} request to {path}"
    );

    let response = next.run(request).await;
    debug!(
        event_name = "http.request.completed",
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        "request completed"
    );
    response
}

/// Turns a service outcome into the route reply, tagging failures with a
/// fresh correlation id.
fn reply(
    route: &'static str,
    fallback: &'static str,
    outcome: Result<String, ApplicationError>,
) -> RouteResult {
    outcome.map_err(|error| {
        let correlation_id = Uuid::new_v4().to_string();
        debug!(
            event_name = "http.route.error",
            route,
            correlation_id = %correlation_id,
            "route failed"
        );
        RouteError::new(error.into_interface(correlation_id), fallback)
    })
}

fn caller(payload: &SlashCommandPayload) -> Result<UserId, ApplicationError> {
    let user_id = payload.caller();
    if user_id.as_str().is_empty() {
        let error = DomainError::InvariantViolation("slash command without user_id".to_owned());
        return Err(error.into());
    }
    Ok(user_id)
}

async fn index() -> &'static str {
    INDEX_TEXT
}

async fn save_preference(
    State(state): State<CoffeeState>,
    Form(payload): Form<SlashCommandPayload>,
) -> RouteResult {
    let outcome = match caller(&payload) {
        Ok(user_id) => state.service.save_drink_preference(&user_id, payload.trimmed_text()).await,
        Err(error) => Err(error),
    };
    reply("/preference/save", INVALID_INPUT, outcome)
}

async fn describe_preferences(
    State(state): State<CoffeeState>,
    Form(payload): Form<SlashCommandPayload>,
) -> RouteResult {
    let outcome = match caller(&payload) {
        Ok(user_id) => state.service.describe_preferences(&user_id, payload.trimmed_text()).await,
        Err(error) => Err(error),
    };
    reply("/preferences", "Error in /preferences route.", outcome)
}

async fn preferences_for_user(
    State(state): State<CoffeeState>,
    Path(user_id): Path<String>,
) -> RouteResult {
    let outcome = state.service.preferences_for(&UserId::new(user_id)).await;
    reply("/preferences/{user_id}", "Error in /preferences route.", outcome)
}

async fn save_shop(
    State(state): State<CoffeeState>,
    Form(payload): Form<SlashCommandPayload>,
) -> RouteResult {
    let outcome = match caller(&payload) {
        Ok(user_id) => state.service.save_shop_preference(&user_id, payload.trimmed_text()).await,
        Err(error) => Err(error),
    };
    reply("/shop/save", INVALID_INPUT, outcome)
}

async fn delete_shop(
    State(state): State<CoffeeState>,
    Form(payload): Form<SlashCommandPayload>,
) -> RouteResult {
    let outcome = match caller(&payload) {
        Ok(user_id) => {
            state.service.delete_shop_preference(&user_id, payload.trimmed_text()).await
        }
        Err(error) => Err(error),
    };
    reply("/shop/delete", INVALID_INPUT, outcome)
}

async fn list_shops(State(state): State<CoffeeState>) -> RouteResult {
    reply("/shops", "Error in /shops route.", state.service.list_shops().await)
}

async fn create_order(
    State(state): State<CoffeeState>,
    Form(payload): Form<SlashCommandPayload>,
) -> RouteResult {
    let outcome = match caller(&payload) {
        Ok(user_id) => state.service.create_order(&user_id, payload.channel()).await,
        Err(error) => Err(error),
    };
    reply("/order/create", "Error in /create-order route.", outcome)
}

async fn display_orders(
    State(state): State<CoffeeState>,
    Form(payload): Form<SlashCommandPayload>,
) -> RouteResult {
    let outcome = state.service.display_order(payload.trimmed_text()).await;
    reply("/orders/display", "Error in /display-orders route.", outcome)
}

async fn order_summary(
    State(state): State<CoffeeState>,
    Path(order_id): Path<i64>,
) -> RouteResult {
    let outcome = state.service.order_summary(OrderId(order_id)).await;
    reply("/order/{order_id}", "Error in /order route.", outcome)
}

async fn respond_to_order(
    State(state): State<CoffeeState>,
    Path(order_id): Path<i64>,
    Form(payload): Form<SlashCommandPayload>,
) -> RouteResult {
    let outcome = match caller(&payload) {
        Ok(user_id) => {
            let text = payload.trimmed_text();
            state.service.respond_to_order(&user_id, OrderId(order_id), text).await
        }
        Err(error) => Err(error),
    };
    reply("/order/{order_id}/respond", INVALID_INPUT, outcome)
}

async fn order_history(State(state): State<CoffeeState>) -> RouteResult {
    reply("/order/history", "Error in /order-history route.", state.service.order_history().await)
}

async fn order_history_for_user(
    State(state): State<CoffeeState>,
    Path(user_id): Path<String>,
) -> RouteResult {
    let outcome = state.service.order_history_for(&UserId::new(user_id)).await;
    reply("/order/history/{user_id}", "Error in /order-history route.", outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use crate::service::{CoffeeService, Repositories};
    use crate::test_support::{migrated_pool, RecordingSlack};

    async fn app() -> (Router, Arc<RecordingSlack>) {
        let slack = Arc::new(RecordingSlack::default());
        let service = CoffeeService::new(Repositories::sql(migrated_pool().await), slack.clone());
        (super::router(Arc::new(service)), slack)
    }

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .expect("request")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, String::from_utf8(body.to_vec()).expect("utf8 body"))
    }

    #[tokio::test]
    async fn index_names_the_api() {
        let (app, _) = app().await;
        assert_eq!(
            send(&app, get("/coffee/")).await,
            (StatusCode::OK, "INDEX OF COFFEE API".to_owned())
        );
        assert_eq!(send(&app, get("/coffee")).await.1, "INDEX OF COFFEE API");
    }

    #[tokio::test]
    async fn saved_preference_shows_up_in_summary() {
        let (app, _) = app().await;

        let (status, body) = send(
            &app,
            form("/coffee/preference/save", "user_id=U1&user_name=bobby&text=large+mocha+testing"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Saved preference:\n Size: large\nType: mocha\nDetails: testing");

        let (status, body) = send(&app, get("/coffee/preferences/U1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<@U1> likes a large mocha (testing).");

        let (_, body) = send(&app, form("/coffee/preferences", "user_id=U1&text=")).await;
        assert_eq!(body, "<@U1> likes a large mocha (testing).");
    }

    #[tokio::test]
    async fn incomplete_preference_is_a_bad_request() {
        let (app, _) = app().await;

        let (status, body) =
            send(&app, form("/coffee/preference/save", "user_id=U1&text=large")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Please give a size and a drink type, e.g. `small tea with milk`.");

        let (status, body) = send(&app, form("/coffee/preference/save", "text=large+mocha")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "INVALID INPUT");
    }

    #[tokio::test]
    async fn preferences_summary_requires_a_caller() {
        let (app, _) = app().await;

        let (status, body) = send(&app, form("/coffee/preferences", "text=")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "Error in /preferences route.");
    }

    #[tokio::test]
    async fn shops_save_list_and_delete() {
        let (app, _) = app().await;

        let (_, body) = send(
            &app,
            form("/coffee/shop/save", "user_id=U2&text=Second+Cup%2C+213+Sesame+St"),
        )
        .await;
        assert_eq!(body, "Saved coffee shop preference: second cup, 213 sesame st");
        send(&app, form("/coffee/shop/save", "user_id=U1&text=Tims")).await;

        let (_, body) = send(&app, get("/coffee/shops")).await;
        assert_eq!(body, "<@U1>: tims\n<@U2>: second cup, 213 sesame st");

        let (_, body) = send(&app, form("/coffee/shop/delete", "user_id=U1&text=tims%2C+null")).await;
        assert_eq!(body, "1 coffee shop deleted");

        let (_, body) = send(&app, form("/coffee/shop/delete", "user_id=U1&text=tims")).await;
        assert_eq!(body, "No coffee shops found");
    }

    #[tokio::test]
    async fn order_lifecycle_through_routes() {
        let (app, slack) = app().await;

        let (status, body) =
            send(&app, form("/coffee/orders/display", "user_id=U1&text=")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "I ran into a problem: There are no orders!");

        let (status, body) =
            send(&app, form("/coffee/order/create", "user_id=U1&channel_id=C1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Created a new coffee order!");
        assert_eq!(slack.posts.lock().expect("lock").len(), 1);

        let (_, body) = send(&app, form("/coffee/order/1/respond", "user_id=U2&text=no")).await;
        assert_eq!(body, "You're out of coffee order #1.");

        let (status, body) = send(&app, get("/coffee/order/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.ends_with("<@U2> doesn't want anything.\n"));

        send(&app, form("/coffee/order/1/respond", "user_id=U1&text=yes")).await;
        let (_, body) = send(&app, get("/coffee/order/1")).await;
        assert!(body.contains("<@U1>: no drink preference saved\n"));
        assert!(body.ends_with("<@U1> is getting the coffee!\n"));

        let (_, body) = send(&app, form("/coffee/orders/display", "user_id=U1&text=")).await;
        assert!(body.starts_with("Coffee Order for "));

        let (_, body) = send(&app, get("/coffee/order/history")).await;
        assert!(body.starts_with("#1 "));
        assert!(body.ends_with("<@U1> got the coffee"));

        let (_, body) = send(&app, get("/coffee/order/history/U9")).await;
        assert_eq!(body, "There are no orders!");
    }

    #[tokio::test]
    async fn display_rejects_malformed_dates() {
        let (app, _) = app().await;

        let (status, body) =
            send(&app, form("/coffee/orders/display", "user_id=U1&text=10-01-2020")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("is not a date"));
    }

    #[tokio::test]
    async fn failing_slack_uses_route_fallback() {
        let (app, slack) = app().await;
        *slack.fail_posts.lock().expect("lock") = true;

        let (status, body) =
            send(&app, form("/coffee/order/create", "user_id=U1&channel_id=C1")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "Error in /create-order route.");
    }

    #[tokio::test]
    async fn responding_to_unknown_order_is_explained() {
        let (app, _) = app().await;

        let (status, body) =
            send(&app, form("/coffee/order/9/respond", "user_id=U2&text=yes")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "I ran into a problem: Order #9 does not exist!");
    }
}
